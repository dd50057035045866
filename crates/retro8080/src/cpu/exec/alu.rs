use crate::cpu::Cpu8080;
use crate::decode::{AluOp, Pair, Reg, Rotate};
use crate::flags::{self, Width};
use crate::memory::Memory;

impl Cpu8080 {
    pub(in crate::cpu) fn alu(&mut self, op: AluOp, value: u8) {
        match op {
            AluOp::Add => self.add(value, false),
            AluOp::Adc => self.add(value, self.state.flags.cy),
            AluOp::Sub => self.state.a = self.sub(value, false),
            AluOp::Sbb => self.state.a = self.sub(value, self.state.flags.cy),
            AluOp::Ana => self.ana(value),
            AluOp::Xra => self.logical(self.state.a ^ value),
            AluOp::Ora => self.logical(self.state.a | value),
            // Compare is a subtraction that discards the result.
            AluOp::Cmp => {
                self.sub(value, false);
            }
        }
    }

    fn add(&mut self, value: u8, carry_in: bool) {
        let a = self.state.a;
        let sum = a as u32 + value as u32 + carry_in as u32;
        let res = sum as u8;
        let f = &mut self.state.flags;
        f.cy = flags::carry_flag(sum, Width::Byte);
        f.ac = flags::aux_carry(a, value, carry_in);
        f.set_zsp(res);
        self.state.a = res;
    }

    /// Flags for `A - value - borrow_in`; the caller decides whether to store.
    fn sub(&mut self, value: u8, borrow_in: bool) -> u8 {
        let a = self.state.a;
        let res = a.wrapping_sub(value).wrapping_sub(borrow_in as u8);
        let f = &mut self.state.flags;
        f.cy = flags::borrow_flag(a as u32, value as u32 + borrow_in as u32);
        f.ac = flags::aux_carry(a, !value, !borrow_in);
        f.set_zsp(res);
        res
    }

    fn ana(&mut self, value: u8) {
        let res = self.state.a & value;
        let f = &mut self.state.flags;
        f.cy = false;
        f.ac = ((self.state.a | value) & 0x08) != 0;
        f.set_zsp(res);
        self.state.a = res;
    }

    /// XRA / ORA: carry and auxiliary carry always clear.
    fn logical(&mut self, res: u8) {
        let f = &mut self.state.flags;
        f.cy = false;
        f.ac = false;
        f.set_zsp(res);
        self.state.a = res;
    }

    pub(in crate::cpu) fn exec_inr(&mut self, memory: &mut Memory, reg: Reg) {
        let value = self.reg(memory, reg);
        let res = value.wrapping_add(1);
        // Carry flag is not affected by INR.
        self.state.flags.ac = flags::aux_carry(value, 1, false);
        self.state.flags.set_zsp(res);
        self.set_reg(memory, reg, res);
    }

    pub(in crate::cpu) fn exec_dcr(&mut self, memory: &mut Memory, reg: Reg) {
        let value = self.reg(memory, reg);
        let res = value.wrapping_sub(1);
        // Carry flag is not affected by DCR.
        self.state.flags.ac = flags::aux_carry(value, !1, true);
        self.state.flags.set_zsp(res);
        self.set_reg(memory, reg, res);
    }

    pub(in crate::cpu) fn exec_inx(&mut self, pair: Pair) {
        let value = self.pair(pair).wrapping_add(1);
        self.set_pair(pair, value);
    }

    pub(in crate::cpu) fn exec_dcx(&mut self, pair: Pair) {
        let value = self.pair(pair).wrapping_sub(1);
        self.set_pair(pair, value);
    }

    /// HL += rp; only carry is affected.
    pub(in crate::cpu) fn exec_dad(&mut self, pair: Pair) {
        let sum = self.state.hl() as u32 + self.pair(pair) as u32;
        self.state.flags.cy = flags::carry_flag(sum, Width::Word);
        self.state.set_hl(sum as u16);
    }

    pub(in crate::cpu) fn exec_rotate(&mut self, rotate: Rotate) {
        let a = self.state.a;
        let cy = self.state.flags.cy;
        let (res, carry_out) = match rotate {
            Rotate::Rlc => (a.rotate_left(1), a & 0x80 != 0),
            Rotate::Rrc => (a.rotate_right(1), a & 0x01 != 0),
            Rotate::Ral => ((a << 1) | cy as u8, a & 0x80 != 0),
            Rotate::Rar => ((a >> 1) | ((cy as u8) << 7), a & 0x01 != 0),
        };
        self.state.a = res;
        self.state.flags.cy = carry_out;
    }

    pub(in crate::cpu) fn exec_daa(&mut self) {
        let a = self.state.a;
        let low = a & 0x0F;
        let high = a >> 4;
        let mut adjust = 0u8;
        let mut carry = self.state.flags.cy;

        if low > 9 || self.state.flags.ac {
            adjust |= 0x06;
        }
        if high > 9 || carry || (high >= 9 && low > 9) {
            adjust |= 0x60;
            carry = true;
        }

        self.add(adjust, false);
        self.state.flags.cy = carry;
    }
}
