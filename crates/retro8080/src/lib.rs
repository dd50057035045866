pub mod cpu;
pub mod decode;
pub mod disasm;
pub mod driver;
pub mod error;
pub mod flags;
pub mod memory;
pub mod ports;
pub mod snapshot;
pub mod state;
pub mod trace;

pub use cpu::{Cpu8080, CpuStatus, StepOutcome};
pub use decode::{AliasPolicy, DecodeTable, Entry, Kind};
pub use disasm::{disassemble, disassemble_with, listing, listing_with};
pub use driver::{CancelToken, Emulator, EmulatorConfig, FaultPolicy, RunSummary, StopReason};
pub use error::{Error, Fault, Result};
pub use memory::Memory;
pub use ports::{NullPorts, PortHandler};
pub use snapshot::Snapshot;
pub use state::{Flags, ProcessorState};
pub use trace::{LogTracer, NullTracer, Tracer};

/// Total addressable memory size (64 KiB).
pub const MEMORY_SIZE: usize = 0x10000;
