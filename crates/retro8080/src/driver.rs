use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use typed_builder::TypedBuilder;

use crate::cpu::{Cpu8080, CpuStatus, StepOutcome};
use crate::decode::{AliasPolicy, DecodeTable};
use crate::disasm;
use crate::error::{Error, Fault, Result};
use crate::memory::Memory;
use crate::ports::{NullPorts, PortHandler};
use crate::snapshot::Snapshot;
use crate::state::ProcessorState;
use crate::trace::{LogTracer, Tracer};

/// What [`Emulator::run`] does when an instruction faults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Stop the run and leave the CPU faulted.
    #[default]
    Halt,
    /// Log the fault, step over the offending byte and keep going.
    Skip,
}

#[derive(Clone, Copy, Debug, TypedBuilder)]
pub struct EmulatorConfig {
    #[builder(default)]
    pub alias_policy: AliasPolicy,
    #[builder(default)]
    pub fault_policy: FaultPolicy,
    /// Send every executed instruction to the `log` facade at trace level.
    #[builder(default = false)]
    pub trace: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Cooperative stop flag shared between the host and a running emulator.
///
/// Checked only between instructions.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the token so the next run is not cancelled immediately.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Halted,
    Faulted(Fault),
    BudgetExhausted,
    Cancelled,
}

/// Result of a bounded [`Emulator::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions executed and interrupts serviced.
    pub steps: u64,
    /// Faulting bytes stepped over under [`FaultPolicy::Skip`].
    pub skipped: u64,
    pub stop: StopReason,
}

/// Host-side owner of one 8080 machine: CPU, memory, I/O and tracing.
pub struct Emulator<P: PortHandler = NullPorts> {
    cpu: Cpu8080,
    memory: Memory,
    ports: P,
    tracer: Option<Box<dyn Tracer>>,
    config: EmulatorConfig,
    cancel: CancelToken,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(EmulatorConfig::default())
    }
}

impl Emulator<NullPorts> {
    pub fn new(config: EmulatorConfig) -> Self {
        Self::with_ports(config, NullPorts)
    }
}

impl<P: PortHandler> Emulator<P> {
    pub fn with_ports(config: EmulatorConfig, ports: P) -> Self {
        let tracer: Option<Box<dyn Tracer>> = if config.trace {
            Some(Box::new(LogTracer))
        } else {
            None
        };
        Self {
            cpu: Cpu8080::with_table(DecodeTable::for_policy(config.alias_policy)),
            memory: Memory::new(),
            ports,
            tracer,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Replace the tracer; tracing is enabled from now on.
    pub fn set_tracer(&mut self, tracer: impl Tracer + 'static) {
        self.tracer = Some(Box::new(tracer));
    }

    pub fn clear_tracer(&mut self) {
        self.tracer = None;
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn cpu(&self) -> &Cpu8080 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu8080 {
        &mut self.cpu
    }

    pub fn state(&self) -> &ProcessorState {
        &self.cpu.state
    }

    pub fn status(&self) -> CpuStatus {
        self.cpu.status()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    /// A handle that stops [`run`](Self::run) at the next instruction boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Copy a program image into memory at `offset`.
    pub fn load(&mut self, data: &[u8], offset: usize) -> Result<()> {
        self.memory.load(data, offset)
    }

    /// Zero the registers and the whole address space.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.clear();
    }

    pub fn request_interrupt(&mut self, target: u16) -> bool {
        self.cpu.request_interrupt(target)
    }

    pub fn request_restart(&mut self, vector: u8) -> bool {
        self.cpu.request_restart(vector)
    }

    pub fn disassemble(&self, address: u16) -> (String, usize) {
        disasm::disassemble_with(self.cpu.table(), &self.memory, address)
    }

    /// Execute one instruction.
    ///
    /// Faults are returned as errors whatever the configured policy; only
    /// [`run`](Self::run) applies [`FaultPolicy`].
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Some(tracer) = self.tracer.as_mut() {
            let cpu = &self.cpu;
            if cpu.status() == CpuStatus::Running && !cpu.interrupt_ready() {
                let pc = cpu.state.pc;
                let (text, _) = disasm::disassemble_with(cpu.table(), &self.memory, pc);
                tracer.trace(pc, &text, &cpu.state);
            }
        }
        self.cpu.step(&mut self.memory, &mut self.ports)
    }

    /// Step until the CPU halts or faults, `budget` steps have run, or the
    /// cancel token fires.
    pub fn run(&mut self, budget: u64) -> Result<RunSummary> {
        let mut steps = 0u64;
        let mut skipped = 0u64;

        let stop = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            match self.cpu.status() {
                CpuStatus::Halted if !self.cpu.interrupt_ready() => {
                    break StopReason::Halted
                }
                CpuStatus::Faulted(fault) => break StopReason::Faulted(fault),
                _ => {}
            }
            if steps >= budget {
                break StopReason::BudgetExhausted;
            }

            match self.step() {
                Ok(_) => steps += 1,
                Err(Error::UnimplementedOpcode { opcode, address })
                    if self.config.fault_policy == FaultPolicy::Skip =>
                {
                    log::warn!("skipping unimplemented opcode {:02X} at {:04X}", opcode, address);
                    self.cpu.skip_fault();
                    steps += 1;
                    skipped += 1;
                }
                Err(Error::UnimplementedOpcode { .. }) => {}
                Err(err) => return Err(err),
            }
        };

        log::debug!("run stopped after {} steps: {:?}", steps, stop);
        Ok(RunSummary {
            steps,
            skipped,
            stop,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.cpu, &self.memory)
    }

    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot.restore(&mut self.cpu, &mut self.memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NullTracer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn emulator_with(program: &[u8], config: EmulatorConfig) -> Emulator {
        let mut emulator = Emulator::new(config);
        emulator.load(program, 0).unwrap();
        emulator
    }

    #[test]
    fn runs_to_halt() {
        // MVI A,5 ; INR A ; HLT
        let mut emulator = emulator_with(&[0x3E, 0x05, 0x3C, 0x76], EmulatorConfig::default());
        let summary = emulator.run(100).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                steps: 3,
                skipped: 0,
                stop: StopReason::Halted
            }
        );
        assert_eq!(emulator.state().a, 6);
        assert!(!emulator.state().flags.z);

        // Running again is a no-op.
        assert_eq!(emulator.run(100).unwrap().steps, 0);
    }

    #[test]
    fn budget_bounds_an_infinite_loop() {
        // JMP $0000
        let mut emulator = emulator_with(&[0xC3, 0x00, 0x00], EmulatorConfig::default());
        let summary = emulator.run(1000).unwrap();
        assert_eq!(summary.steps, 1000);
        assert_eq!(summary.stop, StopReason::BudgetExhausted);
        assert_eq!(emulator.status(), CpuStatus::Running);
    }

    #[test]
    fn cancel_stops_before_the_next_instruction() {
        let mut emulator = emulator_with(&[0xC3, 0x00, 0x00], EmulatorConfig::default());
        let token = emulator.cancel_token();
        token.cancel();
        let summary = emulator.run(1000).unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.stop, StopReason::Cancelled);

        token.reset();
        assert_eq!(emulator.run(10).unwrap().stop, StopReason::BudgetExhausted);
    }

    #[test]
    fn cancel_from_another_thread() {
        let mut emulator = emulator_with(&[0xC3, 0x00, 0x00], EmulatorConfig::default());
        let token = emulator.cancel_token();
        let handle = std::thread::spawn(move || token.cancel());
        handle.join().unwrap();
        assert_eq!(emulator.run(u64::MAX).unwrap().stop, StopReason::Cancelled);
    }

    #[test]
    fn strict_table_faults_and_halts_the_run() {
        let config = EmulatorConfig::builder()
            .alias_policy(AliasPolicy::Reject)
            .build();
        // NOP ; <0x08> ; HLT
        let mut emulator = emulator_with(&[0x00, 0x08, 0x76], config);
        let summary = emulator.run(100).unwrap();
        let fault = Fault::UnimplementedOpcode {
            opcode: 0x08,
            address: 0x0001,
        };
        assert_eq!(summary.stop, StopReason::Faulted(fault));
        assert_eq!(summary.steps, 1);
        assert_eq!(emulator.state().pc, 0x0001);
        assert_eq!(emulator.status(), CpuStatus::Faulted(fault));
    }

    #[test]
    fn skip_policy_steps_over_faults() {
        let config = EmulatorConfig::builder()
            .alias_policy(AliasPolicy::Reject)
            .fault_policy(FaultPolicy::Skip)
            .build();
        // NOP ; <0x08> ; <0xD9> ; MVI A,1 ; HLT
        let mut emulator = emulator_with(&[0x00, 0x08, 0xD9, 0x3E, 0x01, 0x76], config);
        let summary = emulator.run(100).unwrap();
        assert_eq!(summary.stop, StopReason::Halted);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.steps, 5);
        assert_eq!(emulator.state().a, 1);
    }

    #[test]
    fn default_table_decodes_aliases() {
        // 0x08 runs as NOP, 0xCB as JMP
        let mut emulator = emulator_with(&[0x08, 0xCB, 0x10, 0x00], EmulatorConfig::default());
        emulator.load(&[0x76], 0x10).unwrap();
        let summary = emulator.run(10).unwrap();
        assert_eq!(summary.stop, StopReason::Halted);
        assert_eq!(emulator.state().pc, 0x0011);
    }

    #[test]
    fn interrupt_wakes_a_halted_run() {
        // EI ; HLT ; with RST 1 handler: MVI A,7 ; HLT
        let mut emulator = emulator_with(&[0xFB, 0x76], EmulatorConfig::default());
        emulator.load(&[0x3E, 0x07, 0x76], 0x08).unwrap();
        emulator.cpu_mut().state.sp = 0x2400;
        assert_eq!(emulator.run(10).unwrap().stop, StopReason::Halted);

        assert!(emulator.request_restart(1));
        let summary = emulator.run(10).unwrap();
        assert_eq!(summary.stop, StopReason::Halted);
        assert_eq!(summary.steps, 3);
        assert_eq!(emulator.state().a, 7);
        assert_eq!(emulator.memory().read_word(0x23FE), 0x0002);
    }

    #[test]
    fn tracer_sees_each_instruction_before_it_runs() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&lines);
        let mut emulator = emulator_with(&[0x3E, 0x05, 0x3C, 0x76], EmulatorConfig::default());
        emulator.set_tracer(move |address: u16, text: &str, state: &ProcessorState| {
            sink.borrow_mut().push((address, text.to_string(), state.a));
        });
        emulator.run(10).unwrap();
        assert_eq!(
            *lines.borrow(),
            vec![
                (0x0000, "MVI    A,#$05".to_string(), 0),
                (0x0002, "INR    A".to_string(), 5),
                (0x0003, "HLT".to_string(), 6),
            ]
        );
    }

    #[test]
    fn null_tracer_leaves_execution_unchanged() {
        let mut emulator = emulator_with(&[0x3E, 0x05, 0x3C, 0x76], EmulatorConfig::default());
        emulator.set_tracer(NullTracer);
        let summary = emulator.run(10).unwrap();
        assert_eq!(summary.stop, StopReason::Halted);
        assert_eq!(summary.steps, 3);
        assert_eq!(emulator.state().a, 6);
    }

    #[test]
    fn halted_run_with_disabled_latch_stops_cleanly() {
        // EI ; HLT
        let mut emulator = emulator_with(&[0xFB, 0x76], EmulatorConfig::default());
        emulator.run(10).unwrap();
        assert!(emulator.request_restart(2));
        emulator.cpu_mut().state.interrupts_enabled = false;

        let summary = emulator.run(10).unwrap();
        assert_eq!(summary.stop, StopReason::Halted);
        assert_eq!(summary.steps, 0);
        assert_eq!(emulator.cpu().pending_interrupt(), Some(0x0010));
    }

    #[test]
    fn step_reports_halted_errors() {
        let mut emulator = emulator_with(&[0x76], EmulatorConfig::default());
        assert_eq!(
            emulator.step().unwrap(),
            StepOutcome::Halted { address: 0 }
        );
        assert!(matches!(emulator.step(), Err(Error::InvalidStepWhileHalted)));
    }

    #[test]
    fn snapshot_round_trip_through_the_driver() {
        let mut emulator = emulator_with(&[0x3E, 0x05, 0x3C, 0x76], EmulatorConfig::default());
        emulator.step().unwrap();
        let snapshot = emulator.snapshot();
        emulator.run(10).unwrap();
        assert_eq!(emulator.state().a, 6);

        emulator.restore(&snapshot).unwrap();
        assert_eq!(emulator.state().a, 5);
        assert_eq!(emulator.state().pc, 2);
        assert_eq!(emulator.status(), CpuStatus::Running);
    }

    #[test]
    fn reset_clears_registers_and_memory() {
        let mut emulator = emulator_with(&[0x3E, 0x05, 0x76], EmulatorConfig::default());
        emulator.run(10).unwrap();
        emulator.reset();
        assert_eq!(*emulator.state(), ProcessorState::default());
        assert_eq!(emulator.status(), CpuStatus::Running);
        assert_eq!(emulator.memory().read_byte(0), 0);
    }

    #[test]
    fn load_rejects_images_past_the_top_of_memory() {
        let mut emulator = Emulator::default();
        assert!(matches!(
            emulator.load(&[0; 4], 0xFFFE),
            Err(Error::OutOfRange { .. })
        ));
    }
}
