//! Opcode decode table shared by the interpreter and the disassembler.
//!
//! The table is built once from the regular bit layout of the 8080
//! instruction set and is total: every byte decodes to an [`Entry`], even
//! when the kind is [`Kind::Unimplemented`].

use lazy_static::lazy_static;

/// 8-bit operand encoded in three opcode bits. `M` is the byte at (HL).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    M,
    A,
}

impl Reg {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Reg::B,
            1 => Reg::C,
            2 => Reg::D,
            3 => Reg::E,
            4 => Reg::H,
            5 => Reg::L,
            6 => Reg::M,
            _ => Reg::A,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reg::B => "B",
            Reg::C => "C",
            Reg::D => "D",
            Reg::E => "E",
            Reg::H => "H",
            Reg::L => "L",
            Reg::M => "M",
            Reg::A => "A",
        }
    }
}

/// Register pair selected by bits 5..4 of LXI/INX/DCX/DAD/LDAX/STAX.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pair {
    BC,
    DE,
    HL,
    SP,
}

impl Pair {
    pub const fn from_bits(bits: u8) -> Self {
        match (bits >> 4) & 0x03 {
            0 => Pair::BC,
            1 => Pair::DE,
            2 => Pair::HL,
            _ => Pair::SP,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Pair::BC => "B",
            Pair::DE => "D",
            Pair::HL => "H",
            Pair::SP => "SP",
        }
    }
}

/// Register pair selected by PUSH/POP, where the SP slot means A + flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPair {
    BC,
    DE,
    HL,
    PSW,
}

impl StackPair {
    pub const fn from_bits(bits: u8) -> Self {
        match (bits >> 4) & 0x03 {
            0 => StackPair::BC,
            1 => StackPair::DE,
            2 => StackPair::HL,
            _ => StackPair::PSW,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StackPair::BC => "B",
            StackPair::DE => "D",
            StackPair::HL => "H",
            StackPair::PSW => "PSW",
        }
    }
}

/// Branch condition in bits 5..3 of conditional jumps, calls and returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    NotZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Plus,
    Minus,
}

impl Condition {
    pub const fn from_bits(bits: u8) -> Self {
        match (bits >> 3) & 0x07 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Plus,
            _ => Condition::Minus,
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Condition::NotZero => "NZ",
            Condition::Zero => "Z",
            Condition::NoCarry => "NC",
            Condition::Carry => "C",
            Condition::ParityOdd => "PO",
            Condition::ParityEven => "PE",
            Condition::Plus => "P",
            Condition::Minus => "M",
        }
    }
}

/// Accumulator operation in bits 5..3 of the 0x80-0xBF block and of the
/// immediate forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

impl AluOp {
    pub const fn from_bits(bits: u8) -> Self {
        match (bits >> 3) & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbb,
            4 => AluOp::Ana,
            5 => AluOp::Xra,
            6 => AluOp::Ora,
            _ => AluOp::Cmp,
        }
    }

    const fn mnemonics(self) -> (&'static str, &'static str) {
        match self {
            AluOp::Add => ("ADD", "ADI"),
            AluOp::Adc => ("ADC", "ACI"),
            AluOp::Sub => ("SUB", "SUI"),
            AluOp::Sbb => ("SBB", "SBI"),
            AluOp::Ana => ("ANA", "ANI"),
            AluOp::Xra => ("XRA", "XRI"),
            AluOp::Ora => ("ORA", "ORI"),
            AluOp::Cmp => ("CMP", "CPI"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotate {
    Rlc,
    Rrc,
    Ral,
    Rar,
}

/// Instruction family; the interpreter dispatches on this tag alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Nop,
    Halt,
    /// MVI r,d8 (including MVI M).
    MoveImmediate(Reg),
    /// MOV dst,src (including the M forms).
    Move { dst: Reg, src: Reg },
    /// LXI rp,d16
    LoadPairImmediate(Pair),
    /// LDAX B / LDAX D
    LoadIndirect(Pair),
    /// STAX B / STAX D
    StoreIndirect(Pair),
    /// LDA a16
    LoadDirect,
    /// STA a16
    StoreDirect,
    /// LHLD a16
    LoadHlDirect,
    /// SHLD a16
    StoreHlDirect,
    IncrementPair(Pair),
    DecrementPair(Pair),
    /// DAD rp
    AddPair(Pair),
    Increment(Reg),
    Decrement(Reg),
    Alu(AluOp, Reg),
    AluImmediate(AluOp),
    Rotate(Rotate),
    DecimalAdjust,
    ComplementAccumulator,
    SetCarry,
    ComplementCarry,
    Push(StackPair),
    Pop(StackPair),
    Jump,
    JumpIf(Condition),
    /// PCHL
    JumpHl,
    Call,
    CallIf(Condition),
    Return,
    ReturnIf(Condition),
    /// RST n, jumping to n * 8.
    Restart(u8),
    /// XCHG
    ExchangeDeHl,
    /// XTHL
    ExchangeStackHl,
    /// SPHL
    LoadSpHl,
    Input,
    Output,
    EnableInterrupts,
    DisableInterrupts,
    Unimplemented,
}

/// One decode table row.
///
/// `mnemonic` carries operand placeholders (`d8`, `d16`, `a16`) that the
/// disassembler fills in from the bytes following the opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub opcode: u8,
    pub mnemonic: String,
    pub operand_len: u8,
    pub kind: Kind,
    /// Documented opcode this byte is an undocumented alias of.
    pub alias_of: Option<u8>,
}

impl Entry {
    /// Total instruction size in bytes, opcode included.
    #[inline]
    pub fn size(&self) -> u16 {
        1 + self.operand_len as u16
    }
}

/// How undocumented opcode bytes decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AliasPolicy {
    /// Decode them as the instruction they behave like on real silicon.
    #[default]
    Decode,
    /// Decode them as [`Kind::Unimplemented`].
    Reject,
}

/// Undocumented bytes and the documented opcode each one mirrors.
fn alias_target(opcode: u8) -> Option<u8> {
    match opcode {
        0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => Some(0x00),
        0xCB => Some(0xC3),
        0xD9 => Some(0xC9),
        0xDD | 0xED | 0xFD => Some(0xCD),
        _ => None,
    }
}

lazy_static! {
    static ref INTEL_8080: DecodeTable = DecodeTable::build(AliasPolicy::Decode);
    static ref STRICT_8080: DecodeTable = DecodeTable::build(AliasPolicy::Reject);
}

pub struct DecodeTable {
    entries: Vec<Entry>,
    policy: AliasPolicy,
}

impl std::fmt::Debug for DecodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeTable")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DecodeTable {
    /// Shared table where undocumented bytes decode as their aliases.
    pub fn intel_8080() -> &'static DecodeTable {
        &INTEL_8080
    }

    /// Shared table where undocumented bytes are unimplemented.
    pub fn strict() -> &'static DecodeTable {
        &STRICT_8080
    }

    pub fn for_policy(policy: AliasPolicy) -> &'static DecodeTable {
        match policy {
            AliasPolicy::Decode => Self::intel_8080(),
            AliasPolicy::Reject => Self::strict(),
        }
    }

    fn build(policy: AliasPolicy) -> Self {
        let entries = (0..=0xFFu8)
            .map(|opcode| match (alias_target(opcode), policy) {
                (Some(target), AliasPolicy::Decode) => {
                    let (mnemonic, operand_len, kind) = decode_documented(target);
                    Entry {
                        opcode,
                        mnemonic,
                        operand_len,
                        kind,
                        alias_of: Some(target),
                    }
                }
                (Some(target), AliasPolicy::Reject) => Entry {
                    opcode,
                    mnemonic: "???".to_string(),
                    operand_len: 0,
                    kind: Kind::Unimplemented,
                    alias_of: Some(target),
                },
                (None, _) => {
                    let (mnemonic, operand_len, kind) = decode_documented(opcode);
                    Entry {
                        opcode,
                        mnemonic,
                        operand_len,
                        kind,
                        alias_of: None,
                    }
                }
            })
            .collect();
        Self { entries, policy }
    }

    #[inline]
    pub fn entry(&self, opcode: u8) -> &Entry {
        &self.entries[opcode as usize]
    }

    pub fn policy(&self) -> AliasPolicy {
        self.policy
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

/// Decode a byte that has a documented 8080 meaning.
fn decode_documented(op: u8) -> (String, u8, Kind) {
    let dst = Reg::from_bits(op >> 3);
    let src = Reg::from_bits(op);
    let pair = Pair::from_bits(op);
    let fixed = |m: &str, kind: Kind| (m.to_string(), 0u8, kind);

    match op {
        0x00 => fixed("NOP", Kind::Nop),
        0x76 => fixed("HLT", Kind::Halt),

        // 00rr0001: LXI
        0x01 | 0x11 | 0x21 | 0x31 => (
            format!("LXI {},d16", pair.name()),
            2,
            Kind::LoadPairImmediate(pair),
        ),
        0x02 | 0x12 => (
            format!("STAX {}", pair.name()),
            0,
            Kind::StoreIndirect(pair),
        ),
        0x0A | 0x1A => (
            format!("LDAX {}", pair.name()),
            0,
            Kind::LoadIndirect(pair),
        ),
        0x22 => ("SHLD a16".to_string(), 2, Kind::StoreHlDirect),
        0x2A => ("LHLD a16".to_string(), 2, Kind::LoadHlDirect),
        0x32 => ("STA a16".to_string(), 2, Kind::StoreDirect),
        0x3A => ("LDA a16".to_string(), 2, Kind::LoadDirect),
        0x03 | 0x13 | 0x23 | 0x33 => (
            format!("INX {}", pair.name()),
            0,
            Kind::IncrementPair(pair),
        ),
        0x0B | 0x1B | 0x2B | 0x3B => (
            format!("DCX {}", pair.name()),
            0,
            Kind::DecrementPair(pair),
        ),
        0x09 | 0x19 | 0x29 | 0x39 => (format!("DAD {}", pair.name()), 0, Kind::AddPair(pair)),

        // 00ddd100 / 00ddd101 / 00ddd110: INR, DCR, MVI
        _ if op & 0xC7 == 0x04 => (format!("INR {}", dst.name()), 0, Kind::Increment(dst)),
        _ if op & 0xC7 == 0x05 => (format!("DCR {}", dst.name()), 0, Kind::Decrement(dst)),
        _ if op & 0xC7 == 0x06 => (
            format!("MVI {},d8", dst.name()),
            1,
            Kind::MoveImmediate(dst),
        ),

        0x07 => fixed("RLC", Kind::Rotate(Rotate::Rlc)),
        0x0F => fixed("RRC", Kind::Rotate(Rotate::Rrc)),
        0x17 => fixed("RAL", Kind::Rotate(Rotate::Ral)),
        0x1F => fixed("RAR", Kind::Rotate(Rotate::Rar)),
        0x27 => fixed("DAA", Kind::DecimalAdjust),
        0x2F => fixed("CMA", Kind::ComplementAccumulator),
        0x37 => fixed("STC", Kind::SetCarry),
        0x3F => fixed("CMC", Kind::ComplementCarry),

        // 01dddsss: MOV (0x76 is HLT, matched above)
        0x40..=0x7F => (
            format!("MOV {},{}", dst.name(), src.name()),
            0,
            Kind::Move { dst, src },
        ),

        // 10aaasss: ALU with register or memory operand
        0x80..=0xBF => {
            let alu = AluOp::from_bits(op);
            (
                format!("{} {}", alu.mnemonics().0, src.name()),
                0,
                Kind::Alu(alu, src),
            )
        }

        // 11aaa110: ALU immediate
        _ if op & 0xC7 == 0xC6 => {
            let alu = AluOp::from_bits(op);
            (
                format!("{} d8", alu.mnemonics().1),
                1,
                Kind::AluImmediate(alu),
            )
        }
        // 11nnn111: RST
        _ if op & 0xC7 == 0xC7 => {
            let n = (op >> 3) & 0x07;
            (format!("RST {}", n), 0, Kind::Restart(n))
        }
        // 11ccc000 / 11ccc010 / 11ccc100: conditional RET, JMP, CALL
        _ if op & 0xC7 == 0xC0 => {
            let cond = Condition::from_bits(op);
            (format!("R{}", cond.suffix()), 0, Kind::ReturnIf(cond))
        }
        _ if op & 0xC7 == 0xC2 => {
            let cond = Condition::from_bits(op);
            (format!("J{} a16", cond.suffix()), 2, Kind::JumpIf(cond))
        }
        _ if op & 0xC7 == 0xC4 => {
            let cond = Condition::from_bits(op);
            (format!("C{} a16", cond.suffix()), 2, Kind::CallIf(cond))
        }
        // 11rr0001 / 11rr0101: POP, PUSH
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let sp = StackPair::from_bits(op);
            (format!("POP {}", sp.name()), 0, Kind::Pop(sp))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            let sp = StackPair::from_bits(op);
            (format!("PUSH {}", sp.name()), 0, Kind::Push(sp))
        }

        0xC3 => ("JMP a16".to_string(), 2, Kind::Jump),
        0xC9 => fixed("RET", Kind::Return),
        0xCD => ("CALL a16".to_string(), 2, Kind::Call),
        0xD3 => ("OUT d8".to_string(), 1, Kind::Output),
        0xDB => ("IN d8".to_string(), 1, Kind::Input),
        0xE3 => fixed("XTHL", Kind::ExchangeStackHl),
        0xE9 => fixed("PCHL", Kind::JumpHl),
        0xEB => fixed("XCHG", Kind::ExchangeDeHl),
        0xF3 => fixed("DI", Kind::DisableInterrupts),
        0xF9 => fixed("SPHL", Kind::LoadSpHl),
        0xFB => fixed("EI", Kind::EnableInterrupts),

        // Only reachable for the alias bytes, which callers map first.
        _ => fixed("???", Kind::Unimplemented),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total_and_ordered() {
        let table = DecodeTable::intel_8080();
        assert_eq!(table.iter().count(), 256);
        for (i, entry) in table.iter().enumerate() {
            assert_eq!(entry.opcode as usize, i);
            assert!(entry.operand_len <= 2);
        }
    }

    #[test]
    fn default_table_has_no_unimplemented_opcodes() {
        let table = DecodeTable::intel_8080();
        assert!(table.iter().all(|e| e.kind != Kind::Unimplemented));
    }

    #[test]
    fn aliases_decode_as_their_documented_opcode() {
        let table = DecodeTable::intel_8080();
        for op in [0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38] {
            assert_eq!(table.entry(op).kind, Kind::Nop);
            assert_eq!(table.entry(op).alias_of, Some(0x00));
        }
        assert_eq!(table.entry(0xCB).kind, Kind::Jump);
        assert_eq!(table.entry(0xCB).operand_len, 2);
        assert_eq!(table.entry(0xD9).kind, Kind::Return);
        for op in [0xDD, 0xED, 0xFD] {
            assert_eq!(table.entry(op).kind, Kind::Call);
            assert_eq!(table.entry(op).mnemonic, "CALL a16");
        }
        assert_eq!(table.entry(0xC3).alias_of, None);
    }

    #[test]
    fn strict_table_rejects_exactly_the_aliases() {
        let strict = DecodeTable::strict();
        let rejected: Vec<u8> = strict
            .iter()
            .filter(|e| e.kind == Kind::Unimplemented)
            .map(|e| e.opcode)
            .collect();
        assert_eq!(
            rejected,
            vec![0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9, 0xDD, 0xED, 0xFD]
        );
        for entry in strict.iter().filter(|e| e.alias_of.is_none()) {
            assert_eq!(entry, DecodeTable::intel_8080().entry(entry.opcode));
        }
    }

    #[test]
    fn spot_check_families() {
        let table = DecodeTable::intel_8080();
        assert_eq!(table.entry(0x06).kind, Kind::MoveImmediate(Reg::B));
        assert_eq!(table.entry(0x06).mnemonic, "MVI B,d8");
        assert_eq!(table.entry(0x36).kind, Kind::MoveImmediate(Reg::M));
        assert_eq!(
            table.entry(0x7E).kind,
            Kind::Move {
                dst: Reg::A,
                src: Reg::M
            }
        );
        assert_eq!(table.entry(0x76).kind, Kind::Halt);
        assert_eq!(table.entry(0x31).kind, Kind::LoadPairImmediate(Pair::SP));
        assert_eq!(table.entry(0x31).mnemonic, "LXI SP,d16");
        assert_eq!(table.entry(0x96).kind, Kind::Alu(AluOp::Sub, Reg::M));
        assert_eq!(table.entry(0xFE).kind, Kind::AluImmediate(AluOp::Cmp));
        assert_eq!(table.entry(0xFE).mnemonic, "CPI d8");
        assert_eq!(table.entry(0xC2).kind, Kind::JumpIf(Condition::NotZero));
        assert_eq!(table.entry(0xFC).kind, Kind::CallIf(Condition::Minus));
        assert_eq!(table.entry(0xE8).kind, Kind::ReturnIf(Condition::ParityEven));
        assert_eq!(table.entry(0xF5).kind, Kind::Push(StackPair::PSW));
        assert_eq!(table.entry(0xD7).kind, Kind::Restart(2));
        assert_eq!(table.entry(0x3C).kind, Kind::Increment(Reg::A));
        assert_eq!(table.entry(0x35).kind, Kind::Decrement(Reg::M));
        assert_eq!(table.entry(0x1F).kind, Kind::Rotate(Rotate::Rar));
    }

    #[test]
    fn operand_lengths_follow_addressing_modes() {
        let table = DecodeTable::intel_8080();
        let mut counts = [0usize; 3];
        for entry in table.iter() {
            counts[entry.operand_len as usize] += 1;
            let placeholder_len = if entry.mnemonic.contains("d16") || entry.mnemonic.contains("a16") {
                2
            } else if entry.mnemonic.contains("d8") {
                1
            } else {
                0
            };
            assert_eq!(placeholder_len, entry.operand_len, "{:02X}", entry.opcode);
        }
        // 8 MVI + 8 ALU immediate + IN + OUT
        assert_eq!(counts[1], 18);
        // 4 LXI + SHLD/LHLD/STA/LDA + JMP/CALL (+4 aliases) + 8 Jcc + 8 Ccc
        assert_eq!(counts[2], 30);
    }
}
