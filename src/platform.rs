//! Default bus and log providers.
//!
//! Board support code can implement [`Platform`] once and build controllers from it
//! with `Mp2722::from_platform`, instead of threading the bus handle and log sink
//! through by hand. Tests implement it with a mock bus.

use crate::logging::LogSink;

pub trait Platform {
    type Bus;

    /// Hands out the bus handle the controller will own, if this platform has one
    fn take_bus(&mut self) -> Option<Self::Bus>;

    /// Log sink to install on new controllers
    fn log_sink(&self) -> Option<LogSink> {
        None
    }
}

/// Platform with no built-in bus or logger.
///
/// A controller built from it has no transport: `init()` fails and every register
/// access is rejected until a real bus is supplied through `new`.
#[derive(Debug)]
pub struct NoPlatform<B> {
    _bus: core::marker::PhantomData<B>,
}

impl<B> NoPlatform<B> {
    pub const fn new() -> Self {
        Self {
            _bus: core::marker::PhantomData,
        }
    }
}

impl<B> Default for NoPlatform<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Platform for NoPlatform<B> {
    type Bus = B;

    fn take_bus(&mut self) -> Option<B> {
        None
    }
}
