/// I/O port collaborator for the `IN` and `OUT` instructions.
///
/// The CPU knows nothing about the concrete machine; boards such as Space
/// Invaders implement this to wire up their shift register, inputs and
/// sound latches.
pub trait PortHandler {
    fn read_port(&mut self, port: u8) -> u8;
    fn write_port(&mut self, port: u8, value: u8);
}

/// Ports that read as zero and ignore writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPorts;

impl PortHandler for NullPorts {
    fn read_port(&mut self, _port: u8) -> u8 {
        0
    }

    fn write_port(&mut self, _port: u8, _value: u8) {}
}

impl<P: PortHandler + ?Sized> PortHandler for &mut P {
    fn read_port(&mut self, port: u8) -> u8 {
        (**self).read_port(port)
    }

    fn write_port(&mut self, port: u8, value: u8) {
        (**self).write_port(port, value)
    }
}

impl<P: PortHandler + ?Sized> PortHandler for Box<P> {
    fn read_port(&mut self, port: u8) -> u8 {
        (**self).read_port(port)
    }

    fn write_port(&mut self, port: u8, value: u8) {
        (**self).write_port(port, value)
    }
}
