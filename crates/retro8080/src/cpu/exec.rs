mod alu;
mod control;
mod ld;
mod stack;
mod system;

use super::{Cpu8080, Operands};
use crate::decode::Kind;
use crate::memory::Memory;
use crate::ports::PortHandler;

impl Cpu8080 {
    /// Run the semantics of one decoded instruction.
    ///
    /// `pc` already points past the opcode and its operands when this is
    /// called, so only control transfers touch it here.
    pub(super) fn execute<P: PortHandler>(
        &mut self,
        kind: Kind,
        operands: Operands,
        memory: &mut Memory,
        ports: &mut P,
    ) {
        match kind {
            Kind::Nop => {}
            Kind::Halt => self.exec_halt(),

            // Data movement.
            Kind::MoveImmediate(reg) => self.set_reg(memory, reg, operands.byte()),
            Kind::Move { dst, src } => self.exec_mov(memory, dst, src),
            Kind::LoadPairImmediate(pair) => self.set_pair(pair, operands.word()),
            Kind::LoadIndirect(pair) => self.exec_ldax(memory, pair),
            Kind::StoreIndirect(pair) => self.exec_stax(memory, pair),
            Kind::LoadDirect => self.exec_lda(memory, operands.word()),
            Kind::StoreDirect => self.exec_sta(memory, operands.word()),
            Kind::LoadHlDirect => self.exec_lhld(memory, operands.word()),
            Kind::StoreHlDirect => self.exec_shld(memory, operands.word()),
            Kind::ExchangeDeHl => self.exec_xchg(),
            Kind::LoadSpHl => self.state.sp = self.state.hl(),

            // 16-bit pair arithmetic.
            Kind::IncrementPair(pair) => self.exec_inx(pair),
            Kind::DecrementPair(pair) => self.exec_dcx(pair),
            Kind::AddPair(pair) => self.exec_dad(pair),

            // 8-bit arithmetic and logic.
            Kind::Increment(reg) => self.exec_inr(memory, reg),
            Kind::Decrement(reg) => self.exec_dcr(memory, reg),
            Kind::Alu(op, reg) => {
                let value = self.reg(memory, reg);
                self.alu(op, value);
            }
            Kind::AluImmediate(op) => self.alu(op, operands.byte()),
            Kind::Rotate(rotate) => self.exec_rotate(rotate),
            Kind::DecimalAdjust => self.exec_daa(),
            Kind::ComplementAccumulator => self.state.a = !self.state.a,
            Kind::SetCarry => self.state.flags.cy = true,
            Kind::ComplementCarry => self.state.flags.cy = !self.state.flags.cy,

            // Stack.
            Kind::Push(pair) => self.exec_push(memory, pair),
            Kind::Pop(pair) => self.exec_pop(memory, pair),
            Kind::ExchangeStackHl => self.exec_xthl(memory),

            // Control transfer.
            Kind::Jump => self.state.pc = operands.word(),
            Kind::JumpIf(cond) => self.exec_jump_if(cond, operands.word()),
            Kind::JumpHl => self.state.pc = self.state.hl(),
            Kind::Call => self.call(memory, operands.word()),
            Kind::CallIf(cond) => self.exec_call_if(memory, cond, operands.word()),
            Kind::Return => self.ret(memory),
            Kind::ReturnIf(cond) => self.exec_return_if(memory, cond),
            Kind::Restart(n) => self.call(memory, u16::from(n) << 3),

            // I/O and interrupt control.
            Kind::Input => self.exec_in(ports, operands.byte()),
            Kind::Output => self.exec_out(ports, operands.byte()),
            Kind::EnableInterrupts => self.state.interrupts_enabled = true,
            Kind::DisableInterrupts => self.exec_di(),

            // `step` faults on these before dispatching.
            Kind::Unimplemented => {}
        }
    }
}
