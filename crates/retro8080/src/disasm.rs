//! Read-only instruction formatter built on the shared decode table.

use std::ops::RangeInclusive;

use crate::decode::{DecodeTable, Entry};
use crate::memory::Memory;

/// Width of the mnemonic column, e.g. `MVI    B,#$42`.
const MNEMONIC_WIDTH: usize = 7;

/// Disassemble the instruction at `address` using the default table.
///
/// Returns the text and the number of bytes the instruction occupies.
pub fn disassemble(memory: &Memory, address: u16) -> (String, usize) {
    disassemble_with(DecodeTable::intel_8080(), memory, address)
}

pub fn disassemble_with(table: &DecodeTable, memory: &Memory, address: u16) -> (String, usize) {
    let entry = table.entry(memory.read_byte(address));
    let lo = memory.read_byte(address.wrapping_add(1));
    let hi = memory.read_byte(address.wrapping_add(2));
    (format_entry(entry, lo, hi), entry.size() as usize)
}

/// Disassemble every instruction starting inside `range`.
///
/// The last instruction may extend past the end of the range; the listing
/// stops rather than wrapping past 0xFFFF.
pub fn listing(memory: &Memory, range: RangeInclusive<u16>) -> Vec<(u16, String)> {
    listing_with(DecodeTable::intel_8080(), memory, range)
}

pub fn listing_with(
    table: &DecodeTable,
    memory: &Memory,
    range: RangeInclusive<u16>,
) -> Vec<(u16, String)> {
    let mut lines = Vec::new();
    let end = *range.end() as u32;
    let mut address = *range.start() as u32;
    while address <= end {
        let (text, len) = disassemble_with(table, memory, address as u16);
        lines.push((address as u16, text));
        address += len as u32;
    }
    lines
}

fn format_entry(entry: &Entry, lo: u8, hi: u8) -> String {
    let operands = match entry.operand_len {
        1 => entry.mnemonic.replace("d8", &format!("#${:02x}", lo)),
        2 => entry
            .mnemonic
            .replace("d16", &format!("#${:02x}{:02x}", hi, lo))
            .replace("a16", &format!("${:02x}{:02x}", hi, lo)),
        _ => entry.mnemonic.clone(),
    };
    match operands.split_once(' ') {
        Some((name, args)) => format!("{:<width$}{}", name, args, width = MNEMONIC_WIDTH),
        None => operands,
    }
}
