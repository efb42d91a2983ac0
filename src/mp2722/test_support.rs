//! In-memory MP2722 register file for driver tests.

extern crate std;

use core::cell::RefCell;
use core::fmt;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use log::Level;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use crate::platform::Platform;

pub(crate) struct Registers {
    pub regs: [u8; 256],
    pub writes: Vec<(u8, u8)>,
    pub reads: usize,
    pub fail_reads: bool,
    pub fail_write_to: Option<u8>,
    pointer: u8,
}

/// Bus answering like the device: a write sets the register pointer and stores any
/// following bytes, a read returns bytes from the pointer onwards.
#[derive(Clone)]
pub(crate) struct FakeBus(pub Rc<RefCell<Registers>>);

impl FakeBus {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Registers {
            regs: [0; 256],
            writes: Vec::new(),
            reads: 0,
            fail_reads: false,
            fail_write_to: None,
            pointer: 0,
        })))
    }

    pub fn with_regs(preset: &[(u8, u8)]) -> Self {
        let bus = Self::new();
        for &(reg, value) in preset {
            bus.set(reg, value);
        }
        bus
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.0.borrow().regs[reg as usize]
    }

    pub fn set(&self, reg: u8, value: u8) {
        self.0.borrow_mut().regs[reg as usize] = value;
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.0.borrow().writes.clone()
    }

    pub fn clear_log(&self) {
        let mut inner = self.0.borrow_mut();
        inner.writes.clear();
        inner.reads = 0;
    }

    pub fn reads(&self) -> usize {
        self.0.borrow().reads
    }

    pub fn fail_reads(&self, fail: bool) {
        self.0.borrow_mut().fail_reads = fail;
    }

    pub fn fail_writes_to(&self, reg: Option<u8>) {
        self.0.borrow_mut().fail_write_to = reg;
    }

    fn run(&self, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut inner = self.0.borrow_mut();
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let Some((&reg, data)) = bytes.split_first() else {
                        continue;
                    };
                    if !data.is_empty() && inner.fail_write_to == Some(reg) {
                        return Err(ErrorKind::Other);
                    }
                    inner.pointer = reg;
                    for (offset, &value) in data.iter().enumerate() {
                        let target = reg.wrapping_add(offset as u8);
                        inner.regs[target as usize] = value;
                        inner.writes.push((target, value));
                    }
                }
                Operation::Read(buffer) => {
                    if inner.fail_reads {
                        return Err(ErrorKind::Other);
                    }
                    inner.reads += 1;
                    let start = inner.pointer;
                    for (offset, slot) in buffer.iter_mut().enumerate() {
                        *slot = inner.regs[start.wrapping_add(offset as u8) as usize];
                    }
                }
            }
        }
        Ok(())
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for FakeBus {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

/// Platform handing out one fake bus and the capturing log sink
pub(crate) struct FakePlatform {
    pub bus: Option<FakeBus>,
}

impl Platform for FakePlatform {
    type Bus = FakeBus;

    fn take_bus(&mut self) -> Option<FakeBus> {
        self.bus.take()
    }

    fn log_sink(&self) -> Option<crate::logging::LogSink> {
        Some(capture)
    }
}

std::thread_local! {
    static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Log sink recording messages for the current test thread
pub(crate) fn capture(level: Level, args: fmt::Arguments<'_>) {
    LINES.with(|lines| lines.borrow_mut().push((level, args.to_string())));
}

pub(crate) fn captured() -> Vec<(Level, String)> {
    LINES.with(|lines| lines.borrow_mut().drain(..).collect())
}
