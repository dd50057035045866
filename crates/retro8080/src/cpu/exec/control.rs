use crate::cpu::Cpu8080;
use crate::decode::Condition;
use crate::memory::Memory;

impl Cpu8080 {
    /// Push the return address (already in `pc`) and jump.
    pub(in crate::cpu) fn call(&mut self, memory: &mut Memory, target: u16) {
        let ret = self.state.pc;
        self.push(memory, ret);
        self.state.pc = target;
    }

    pub(in crate::cpu) fn ret(&mut self, memory: &Memory) {
        self.state.pc = self.pop(memory);
    }

    pub(in crate::cpu) fn exec_jump_if(&mut self, cond: Condition, target: u16) {
        if self.condition(cond) {
            self.state.pc = target;
        }
    }

    pub(in crate::cpu) fn exec_call_if(&mut self, memory: &mut Memory, cond: Condition, target: u16) {
        if self.condition(cond) {
            self.call(memory, target);
        }
    }

    pub(in crate::cpu) fn exec_return_if(&mut self, memory: &Memory, cond: Condition) {
        if self.condition(cond) {
            self.ret(memory);
        }
    }
}
