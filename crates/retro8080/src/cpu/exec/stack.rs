use crate::cpu::Cpu8080;
use crate::decode::StackPair;
use crate::memory::Memory;

impl Cpu8080 {
    pub(in crate::cpu) fn exec_push(&mut self, memory: &mut Memory, pair: StackPair) {
        let value = match pair {
            StackPair::BC => self.state.bc(),
            StackPair::DE => self.state.de(),
            StackPair::HL => self.state.hl(),
            StackPair::PSW => self.state.psw(),
        };
        self.push(memory, value);
    }

    pub(in crate::cpu) fn exec_pop(&mut self, memory: &Memory, pair: StackPair) {
        let value = self.pop(memory);
        match pair {
            StackPair::BC => self.state.set_bc(value),
            StackPair::DE => self.state.set_de(value),
            StackPair::HL => self.state.set_hl(value),
            StackPair::PSW => self.state.set_psw(value),
        }
    }

    /// Swap L with (SP) and H with (SP+1).
    pub(in crate::cpu) fn exec_xthl(&mut self, memory: &mut Memory) {
        let sp = self.state.sp;
        let top = memory.read_word(sp);
        memory.write_word(sp, self.state.hl());
        self.state.set_hl(top);
    }
}
