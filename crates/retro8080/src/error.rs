use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A condition that stops the interpreter until the host decides what to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Fault {
    /// The decode table has no executable meaning for `opcode`.
    UnimplementedOpcode { opcode: u8, address: u16 },
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::UnimplementedOpcode { opcode, address } => {
                write!(f, "unimplemented opcode {:02X} at {:04X}", opcode, address)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("load of {len} bytes at {offset:#06x} exceeds the 64 KiB address space")]
    OutOfRange { offset: usize, len: usize },
    #[error("memory image is {len} bytes, expected a full 64 KiB image")]
    ImageSize { len: usize },
    #[error("unimplemented opcode {opcode:02X} at {address:04X}")]
    UnimplementedOpcode { opcode: u8, address: u16 },
    #[error("step called while the CPU is halted")]
    InvalidStepWhileHalted,
    #[error("step called while the CPU is faulted ({0})")]
    InvalidStepWhileFaulted(Fault),
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error("snapshot encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::UnimplementedOpcode { opcode, address } => {
                Error::UnimplementedOpcode { opcode, address }
            }
        }
    }
}
