//! Pure flag computations shared by every ALU instruction.
//!
//! Results are passed widened to `u32` so callers can hand in an unmasked
//! sum (e.g. `a as u32 + b as u32`) and let the width decide what counts.

/// Operand width of the instruction that produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Byte = 8,
    Word = 16,
}

impl Width {
    #[inline]
    pub const fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF,
        }
    }
}

#[inline]
pub fn zero_flag(result: u32, width: Width) -> bool {
    result & width.mask() == 0
}

#[inline]
pub fn sign_flag(result: u8) -> bool {
    result & 0x80 != 0
}

/// Even parity over the low `width` bits.
#[inline]
pub fn parity_flag(result: u32, width: Width) -> bool {
    (result & width.mask()).count_ones() % 2 == 0
}

/// Carry out of an unsigned addition.
#[inline]
pub fn carry_flag(result: u32, width: Width) -> bool {
    result > width.mask()
}

/// Borrow of an unsigned subtraction or comparison.
#[inline]
pub fn borrow_flag(minuend: u32, subtrahend: u32) -> bool {
    minuend < subtrahend
}

/// Carry out of bit 3 of `a + b + carry_in`.
///
/// Subtraction goes through the same adder as `aux_carry(a, !b, !borrow)`.
#[inline]
pub fn aux_carry(a: u8, b: u8, carry_in: bool) -> bool {
    (a & 0x0F) + (b & 0x0F) + carry_in as u8 > 0x0F
}
