use crate::cpu::Cpu8080;
use crate::decode::{Pair, Reg};
use crate::memory::Memory;

impl Cpu8080 {
    pub(in crate::cpu) fn exec_mov(&mut self, memory: &mut Memory, dst: Reg, src: Reg) {
        let value = self.reg(memory, src);
        self.set_reg(memory, dst, value);
    }

    /// LDAX B / LDAX D
    pub(in crate::cpu) fn exec_ldax(&mut self, memory: &Memory, pair: Pair) {
        self.state.a = memory.read_byte(self.pair(pair));
    }

    /// STAX B / STAX D
    pub(in crate::cpu) fn exec_stax(&mut self, memory: &mut Memory, pair: Pair) {
        memory.write_byte(self.pair(pair), self.state.a);
    }

    pub(in crate::cpu) fn exec_lda(&mut self, memory: &Memory, addr: u16) {
        self.state.a = memory.read_byte(addr);
    }

    pub(in crate::cpu) fn exec_sta(&mut self, memory: &mut Memory, addr: u16) {
        memory.write_byte(addr, self.state.a);
    }

    /// L from `addr`, H from `addr + 1`.
    pub(in crate::cpu) fn exec_lhld(&mut self, memory: &Memory, addr: u16) {
        let value = memory.read_word(addr);
        self.state.set_hl(value);
    }

    pub(in crate::cpu) fn exec_shld(&mut self, memory: &mut Memory, addr: u16) {
        memory.write_word(addr, self.state.hl());
    }

    pub(in crate::cpu) fn exec_xchg(&mut self) {
        let s = &mut self.state;
        core::mem::swap(&mut s.d, &mut s.h);
        core::mem::swap(&mut s.e, &mut s.l);
    }
}
