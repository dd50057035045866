use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::flags::{self, Width};

bitflags! {
    /// Packed flag byte as stored by `PUSH PSW`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Psw: u8 {
        const CARRY = 0b0000_0001;
        /// Always reads back as 1 on the 8080.
        const ONE = 0b0000_0010;
        const PARITY = 0b0000_0100;
        const AUX_CARRY = 0b0001_0000;
        const ZERO = 0b0100_0000;
        const SIGN = 0b1000_0000;
    }
}

/// CPU flags for Intel 8080.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub z: bool,  // zero
    pub s: bool,  // sign
    pub p: bool,  // parity
    pub cy: bool, // carry
    pub ac: bool, // auxiliary carry
}

impl Flags {
    pub fn to_psw(self) -> u8 {
        let mut psw = Psw::ONE;
        psw.set(Psw::SIGN, self.s);
        psw.set(Psw::ZERO, self.z);
        psw.set(Psw::AUX_CARRY, self.ac);
        psw.set(Psw::PARITY, self.p);
        psw.set(Psw::CARRY, self.cy);
        psw.bits()
    }

    pub fn from_psw(value: u8) -> Self {
        let psw = Psw::from_bits_truncate(value);
        Self {
            z: psw.contains(Psw::ZERO),
            s: psw.contains(Psw::SIGN),
            p: psw.contains(Psw::PARITY),
            cy: psw.contains(Psw::CARRY),
            ac: psw.contains(Psw::AUX_CARRY),
        }
    }

    /// Zero, sign and parity of an 8-bit result.
    #[inline]
    pub fn set_zsp(&mut self, value: u8) {
        self.z = flags::zero_flag(value as u32, Width::Byte);
        self.s = flags::sign_flag(value);
        self.p = flags::parity_flag(value as u32, Width::Byte);
    }
}

/// Architectural register file of the 8080.
///
/// Pure data: the interpreter is the only thing that mutates it while a
/// program runs. Pairs are big-endian in the register file (B is the high
/// half of BC).
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorState {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub flags: Flags,
    pub interrupts_enabled: bool,
}

impl ProcessorState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        let [b, c] = value.to_be_bytes();
        self.b = b;
        self.c = c;
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        let [d, e] = value.to_be_bytes();
        self.d = d;
        self.e = e;
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        let [h, l] = value.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    /// Accumulator and packed flags, as pushed by `PUSH PSW`.
    #[inline]
    pub fn psw(&self) -> u16 {
        u16::from_be_bytes([self.a, self.flags.to_psw()])
    }

    #[inline]
    pub fn set_psw(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.flags = Flags::from_psw(f);
    }
}

impl std::fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '.' };
        write!(
            f,
            "A={:02x} BC={:04x} DE={:04x} HL={:04x} PC={:04x} SP={:04x} [{}{}{}{}{}]{}",
            self.a,
            self.bc(),
            self.de(),
            self.hl(),
            self.pc,
            self.sp,
            flag(self.flags.s, 'S'),
            flag(self.flags.z, 'Z'),
            flag(self.flags.ac, 'A'),
            flag(self.flags.p, 'P'),
            flag(self.flags.cy, 'C'),
            if self.interrupts_enabled { " EI" } else { "" },
        )
    }
}
