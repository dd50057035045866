use crate::cpu::{Cpu8080, CpuStatus};
use crate::ports::PortHandler;

impl Cpu8080 {
    /// HLT stops fetching until an interrupt arrives; `pc` stays past it.
    pub(in crate::cpu) fn exec_halt(&mut self) {
        log::debug!("HLT at {:04x}", self.state.pc.wrapping_sub(1));
        self.status = CpuStatus::Halted;
    }

    pub(in crate::cpu) fn exec_di(&mut self) {
        self.state.interrupts_enabled = false;
        // A request latched before DI is never delivered.
        self.pending_interrupt = None;
    }

    pub(in crate::cpu) fn exec_in<P: PortHandler>(&mut self, ports: &mut P, port: u8) {
        self.state.a = ports.read_port(port);
    }

    pub(in crate::cpu) fn exec_out<P: PortHandler>(&mut self, ports: &mut P, port: u8) {
        ports.write_port(port, self.state.a);
    }
}
