//! Which driver serves which PLIC source.

use crate::console::ByteSink;
use crate::hardware::plic::{check_source, PlicError};
use arrayvec::ArrayVec;
use core::fmt;
use log::debug;

/// A driver that can service an external interrupt.
pub trait IrqHandler {
    /// Serve `source`, which the PLIC has just handed out.
    ///
    /// Runs in trap context with interrupts masked. `sink` is where
    /// diagnostics go.
    fn handle(&self, source: u32, sink: &mut dyn ByteSink);
}

pub type HandlerRef<'h> = &'h dyn IrqHandler;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryError {
    InvalidSource(PlicError),
    AlreadyRegistered(u32),
    Full,
}
impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidSource(e) => write!(f, "invalid source: {}", e),
            RegistryError::AlreadyRegistered(source) => {
                write!(f, "source {} already has a handler", source)
            }
            RegistryError::Full => write!(f, "no room for another handler"),
        }
    }
}
impl From<PlicError> for RegistryError {
    fn from(e: PlicError) -> RegistryError {
        RegistryError::InvalidSource(e)
    }
}

/// Fixed-capacity map from source id to handler.
pub struct IrqRegistry<'h, const N: usize> {
    entries: ArrayVec<(u32, HandlerRef<'h>), N>,
}
impl<'h, const N: usize> IrqRegistry<'h, N> {
    pub const fn new() -> IrqRegistry<'h, N> {
        IrqRegistry {
            entries: ArrayVec::new_const(),
        }
    }
    pub fn register(
        &mut self,
        source: usize,
        handler: HandlerRef<'h>,
    ) -> Result<(), RegistryError> {
        let source = check_source(source)? as u32;
        if self.lookup(source).is_some() {
            return Err(RegistryError::AlreadyRegistered(source));
        }
        self.entries
            .try_push((source, handler))
            .map_err(|_| RegistryError::Full)?;
        debug!("irq: source {} registered", source);
        Ok(())
    }
    pub fn lookup(&self, source: u32) -> Option<HandlerRef<'h>> {
        self.entries
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, handler)| *handler)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
impl<'h, const N: usize> Default for IrqRegistry<'h, N> {
    fn default() -> IrqRegistry<'h, N> {
        IrqRegistry::new()
    }
}
