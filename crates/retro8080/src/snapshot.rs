use serde::{Deserialize, Serialize};

use crate::cpu::{Cpu8080, CpuStatus};
use crate::decode::AliasPolicy;
use crate::error::{Error, Result};
use crate::memory::Memory;
use crate::state::ProcessorState;
use crate::MEMORY_SIZE;

/// Complete machine state: registers, run status and the 64 KiB image.
///
/// Restoring needs a CPU that decodes with the recorded alias policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub alias_policy: AliasPolicy,
    pub state: ProcessorState,
    pub status: CpuStatus,
    pub pending_interrupt: Option<u16>,
    pub memory: Vec<u8>,
}

impl Snapshot {
    pub const CURRENT_VERSION: u32 = 2;

    pub fn capture(cpu: &Cpu8080, memory: &Memory) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            alias_policy: cpu.table().policy(),
            state: cpu.state,
            status: cpu.status(),
            pending_interrupt: cpu.pending_interrupt(),
            memory: memory.as_slice().to_vec(),
        }
    }

    /// Overwrite `cpu` and `memory` with the captured state.
    ///
    /// Nothing is modified when the snapshot fails validation or `cpu`
    /// decodes with a different alias policy.
    pub fn restore(&self, cpu: &mut Cpu8080, memory: &mut Memory) -> Result<()> {
        self.validate()?;
        let policy = cpu.table().policy();
        if policy != self.alias_policy {
            return Err(Error::Snapshot(format!(
                "captured with {:?} decoding, cannot restore into {:?}",
                self.alias_policy, policy
            )));
        }
        *memory = Memory::from_image(&self.memory)?;
        cpu.state = self.state;
        cpu.set_status(self.status);
        cpu.set_pending_interrupt(self.pending_interrupt);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        if self.version != Self::CURRENT_VERSION {
            return Err(Error::Snapshot(format!(
                "version {} is not supported (current: {})",
                self.version,
                Self::CURRENT_VERSION
            )));
        }
        if self.memory.len() != MEMORY_SIZE {
            return Err(Error::Snapshot(format!(
                "memory image is {} bytes, expected {}",
                self.memory.len(),
                MEMORY_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeTable;
    use crate::error::Fault;
    use crate::ports::NullPorts;

    fn running_machine() -> (Cpu8080, Memory) {
        let mut cpu = Cpu8080::new();
        let mut memory = Memory::new();
        // LXI SP,$2400 ; MVI A,$42 ; PUSH PSW ; EI
        memory
            .load(&[0x31, 0x00, 0x24, 0x3E, 0x42, 0xF5, 0xFB], 0)
            .unwrap();
        for _ in 0..4 {
            cpu.step(&mut memory, &mut NullPorts).unwrap();
        }
        (cpu, memory)
    }

    #[test]
    fn restores_registers_memory_and_status() {
        let (mut cpu, mut memory) = running_machine();
        cpu.request_restart(1);
        let snapshot = Snapshot::capture(&cpu, &memory);
        let bytes = snapshot.to_bytes().unwrap();

        let mut other_cpu = Cpu8080::new();
        let mut other_memory = Memory::new();
        Snapshot::from_bytes(&bytes)
            .unwrap()
            .restore(&mut other_cpu, &mut other_memory)
            .unwrap();

        assert_eq!(other_cpu.state, cpu.state);
        assert_eq!(other_cpu.status(), CpuStatus::Running);
        assert_eq!(other_cpu.pending_interrupt(), Some(0x08));
        assert_eq!(other_memory.read_word(0x23FE), 0x4202);

        // Both machines continue identically.
        let a = cpu.step(&mut memory, &mut NullPorts).unwrap();
        let b = other_cpu.step(&mut other_memory, &mut NullPorts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn faulted_status_survives_encoding() {
        let mut cpu = Cpu8080::new();
        let fault = Fault::UnimplementedOpcode {
            opcode: 0xCB,
            address: 0x1234,
        };
        cpu.set_status(CpuStatus::Faulted(fault));
        let bytes = Snapshot::capture(&cpu, &Memory::new()).to_bytes().unwrap();
        let snapshot = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(snapshot.status, CpuStatus::Faulted(fault));
    }

    #[test]
    fn rejects_truncated_memory_image() {
        let (mut cpu, mut memory) = running_machine();
        let before = cpu.state;
        let mut snapshot = Snapshot::capture(&cpu, &memory);
        snapshot.memory.truncate(0x100);

        let err = snapshot.restore(&mut cpu, &mut memory).unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
        assert_eq!(cpu.state, before);
        assert_eq!(memory.read_byte(0), 0x31);
    }

    #[test]
    fn rejects_newer_versions() {
        let mut snapshot = Snapshot::capture(&Cpu8080::new(), &Memory::new());
        snapshot.version = Snapshot::CURRENT_VERSION + 1;
        let bytes = snapshot.to_bytes().unwrap();
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(Error::Snapshot(_))
        ));
    }

    #[test]
    fn restore_requires_the_same_alias_policy() {
        // 0xCB faults under the strict table but is JMP under the default one.
        let mut strict = Cpu8080::with_table(DecodeTable::strict());
        let mut memory = Memory::new();
        memory.load(&[0xCB, 0x00, 0x20], 0).unwrap();
        assert!(strict.step(&mut memory, &mut NullPorts).is_err());
        let snapshot = Snapshot::capture(&strict, &memory);
        assert_eq!(snapshot.alias_policy, AliasPolicy::Reject);

        let mut lenient = Cpu8080::new();
        let mut other_memory = Memory::new();
        let err = snapshot
            .restore(&mut lenient, &mut other_memory)
            .unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
        assert_eq!(lenient.status(), CpuStatus::Running);
        assert_eq!(other_memory.read_byte(0), 0x00);

        // Under the matching table the fault skips a single byte.
        let mut restored = Cpu8080::with_table(DecodeTable::strict());
        let bytes = snapshot.to_bytes().unwrap();
        Snapshot::from_bytes(&bytes)
            .unwrap()
            .restore(&mut restored, &mut other_memory)
            .unwrap();
        assert_eq!(restored.skip_fault(), Some(0x0000));
        assert_eq!(restored.state.pc, 0x0001);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            Snapshot::from_bytes(&[1, 2, 3]),
            Err(Error::Bincode(_))
        ));
    }
}
