mod exec;


use crate::decode::{Condition, DecodeTable, Kind, Pair, Reg};
use crate::error::{Error, Fault, Result};
use crate::memory::Memory;
use crate::ports::PortHandler;
use crate::state::ProcessorState;

/// Run state of the interpreter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CpuStatus {
    #[default]
    Running,
    Halted,
    Faulted(Fault),
}

/// What a single call to [`Cpu8080::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// One instruction ran to completion.
    Executed { address: u16, opcode: u8 },
    /// A `HLT` at `address` ran; the CPU is now halted.
    Halted { address: u16 },
    /// A pending interrupt was accepted instead of fetching an instruction.
    Interrupted { from: u16, target: u16 },
}

/// Immediate bytes that follow an opcode.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Operands {
    lo: u8,
    hi: u8,
}

impl Operands {
    fn fetch(memory: &Memory, address: u16, len: u8) -> Self {
        let mut operands = Self::default();
        if len >= 1 {
            operands.lo = memory.read_byte(address.wrapping_add(1));
        }
        if len >= 2 {
            operands.hi = memory.read_byte(address.wrapping_add(2));
        }
        operands
    }

    #[inline]
    fn byte(self) -> u8 {
        self.lo
    }

    #[inline]
    fn word(self) -> u16 {
        u16::from_le_bytes([self.lo, self.hi])
    }
}

/// Intel 8080 interpreter.
///
/// Holds the register file and run state; memory and I/O are passed into
/// every [`step`](Cpu8080::step) so that the host keeps ownership of them.
pub struct Cpu8080 {
    pub state: ProcessorState,
    status: CpuStatus,
    table: &'static DecodeTable,
    pending_interrupt: Option<u16>,
}

impl Default for Cpu8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu8080 {
    /// Create a new CPU instance in reset state.
    pub fn new() -> Self {
        Self::with_table(DecodeTable::intel_8080())
    }

    /// Create a CPU that decodes through `table`.
    pub fn with_table(table: &'static DecodeTable) -> Self {
        Self {
            state: ProcessorState::default(),
            status: CpuStatus::Running,
            table,
            pending_interrupt: None,
        }
    }

    /// Reset all registers and the run state to their power-on values.
    pub fn reset(&mut self) {
        self.state = ProcessorState::default();
        self.status = CpuStatus::Running;
        self.pending_interrupt = None;
    }

    pub fn status(&self) -> CpuStatus {
        self.status
    }

    pub fn table(&self) -> &'static DecodeTable {
        self.table
    }

    /// Restore a run state captured earlier, e.g. from a snapshot.
    pub fn set_status(&mut self, status: CpuStatus) {
        self.status = status;
    }

    /// Execute a single instruction.
    ///
    /// A latched interrupt is serviced first and consumes the whole step.
    /// Unimplemented opcodes leave every register untouched, move the CPU to
    /// [`CpuStatus::Faulted`] and are returned as an error.
    pub fn step<P: PortHandler>(&mut self, memory: &mut Memory, ports: &mut P) -> Result<StepOutcome> {
        match self.status {
            CpuStatus::Faulted(fault) => return Err(Error::InvalidStepWhileFaulted(fault)),
            CpuStatus::Halted if !self.interrupt_ready() => {
                return Err(Error::InvalidStepWhileHalted)
            }
            _ => {}
        }

        if let Some(target) = self.pending_interrupt.take() {
            if self.state.interrupts_enabled {
                return Ok(self.service_interrupt(memory, target));
            }
            log::debug!("dropping interrupt to {:04x}: disabled before service", target);
        }

        let table = self.table;
        let address = self.state.pc;
        let opcode = memory.read_byte(address);
        let entry = table.entry(opcode);

        if entry.kind == Kind::Unimplemented {
            let fault = Fault::UnimplementedOpcode { opcode, address };
            log::debug!("{}", fault);
            self.status = CpuStatus::Faulted(fault);
            return Err(fault.into());
        }

        let operands = Operands::fetch(memory, address, entry.operand_len);
        self.state.pc = address.wrapping_add(entry.size());
        self.execute(entry.kind, operands, memory, ports);

        Ok(match self.status {
            CpuStatus::Halted => StepOutcome::Halted { address },
            _ => StepOutcome::Executed { address, opcode },
        })
    }

    /// Latch an interrupt request that jumps to `target`.
    ///
    /// Returns `false` and drops the request when interrupts are disabled.
    /// An accepted request is serviced at the next instruction boundary and
    /// also wakes a halted CPU.
    pub fn request_interrupt(&mut self, target: u16) -> bool {
        if !self.state.interrupts_enabled {
            log::trace!("interrupt to {:04x} ignored: interrupts disabled", target);
            return false;
        }
        self.pending_interrupt = Some(target);
        true
    }

    /// Request the interrupt a device raises by placing `RST n` on the bus.
    pub fn request_restart(&mut self, vector: u8) -> bool {
        self.request_interrupt(u16::from(vector & 0x07) << 3)
    }

    pub fn pending_interrupt(&self) -> Option<u16> {
        self.pending_interrupt
    }

    /// Whether the next step services a latched interrupt.
    pub fn interrupt_ready(&self) -> bool {
        self.pending_interrupt.is_some() && self.state.interrupts_enabled
    }

    pub(crate) fn set_pending_interrupt(&mut self, target: Option<u16>) {
        self.pending_interrupt = target;
    }

    fn service_interrupt(&mut self, memory: &mut Memory, target: u16) -> StepOutcome {
        let from = self.state.pc;
        self.state.interrupts_enabled = false;
        self.push(memory, from);
        self.state.pc = target;
        self.status = CpuStatus::Running;
        StepOutcome::Interrupted { from, target }
    }

    /// Clear a fault and keep executing from the same program counter.
    pub fn resume(&mut self) {
        if let CpuStatus::Faulted(_) = self.status {
            self.status = CpuStatus::Running;
        }
    }

    /// Clear a fault and move past the instruction that raised it.
    ///
    /// Returns the skipped address, or `None` when the CPU was not faulted.
    pub fn skip_fault(&mut self) -> Option<u16> {
        match self.status {
            CpuStatus::Faulted(Fault::UnimplementedOpcode { opcode, address }) => {
                self.state.pc = address.wrapping_add(self.table.entry(opcode).size());
                self.status = CpuStatus::Running;
                Some(address)
            }
            _ => None,
        }
    }

    fn reg(&self, memory: &Memory, reg: Reg) -> u8 {
        let s = &self.state;
        match reg {
            Reg::B => s.b,
            Reg::C => s.c,
            Reg::D => s.d,
            Reg::E => s.e,
            Reg::H => s.h,
            Reg::L => s.l,
            Reg::M => memory.read_byte(s.hl()),
            Reg::A => s.a,
        }
    }

    fn set_reg(&mut self, memory: &mut Memory, reg: Reg, value: u8) {
        let s = &mut self.state;
        match reg {
            Reg::B => s.b = value,
            Reg::C => s.c = value,
            Reg::D => s.d = value,
            Reg::E => s.e = value,
            Reg::H => s.h = value,
            Reg::L => s.l = value,
            Reg::M => memory.write_byte(s.hl(), value),
            Reg::A => s.a = value,
        }
    }

    fn pair(&self, pair: Pair) -> u16 {
        match pair {
            Pair::BC => self.state.bc(),
            Pair::DE => self.state.de(),
            Pair::HL => self.state.hl(),
            Pair::SP => self.state.sp,
        }
    }

    fn set_pair(&mut self, pair: Pair, value: u16) {
        match pair {
            Pair::BC => self.state.set_bc(value),
            Pair::DE => self.state.set_de(value),
            Pair::HL => self.state.set_hl(value),
            Pair::SP => self.state.sp = value,
        }
    }

    /// High byte goes to SP-1 and low byte to SP-2.
    fn push(&mut self, memory: &mut Memory, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        memory.write_byte(self.state.sp.wrapping_sub(1), hi);
        memory.write_byte(self.state.sp.wrapping_sub(2), lo);
        self.state.sp = self.state.sp.wrapping_sub(2);
    }

    fn pop(&mut self, memory: &Memory) -> u16 {
        let value = memory.read_word(self.state.sp);
        self.state.sp = self.state.sp.wrapping_add(2);
        value
    }

    fn condition(&self, condition: Condition) -> bool {
        let f = &self.state.flags;
        match condition {
            Condition::NotZero => !f.z,
            Condition::Zero => f.z,
            Condition::NoCarry => !f.cy,
            Condition::Carry => f.cy,
            Condition::ParityOdd => !f.p,
            Condition::ParityEven => f.p,
            Condition::Plus => !f.s,
            Condition::Minus => f.s,
        }
    }
}
