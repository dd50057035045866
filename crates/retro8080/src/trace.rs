use crate::state::ProcessorState;

/// Observer called once per executed instruction, before it runs.
pub trait Tracer {
    fn trace(&mut self, address: u16, text: &str, registers: &ProcessorState);
}

/// Discards every trace event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn trace(&mut self, _address: u16, _text: &str, _registers: &ProcessorState) {}
}

/// Forwards trace events to the `log` facade at trace level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace(&mut self, address: u16, text: &str, registers: &ProcessorState) {
        log::trace!("{:04x} {:<16} {}", address, text, registers);
    }
}

impl<F> Tracer for F
where
    F: FnMut(u16, &str, &ProcessorState),
{
    fn trace(&mut self, address: u16, text: &str, registers: &ProcessorState) {
        self(address, text, registers)
    }
}
