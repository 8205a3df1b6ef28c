//! Trap decoding and dispatch.

pub mod cause;
pub mod dispatch;
pub mod frame;
pub mod registry;

pub use cause::{Exception, Interrupt, Trap, TrapCause};
pub use dispatch::{report_cause, route_trap, DispatcherSlot, Outcome, TrapDispatcher, TrapState};
pub use frame::TrapFrame;
pub use registry::{IrqHandler, IrqRegistry, RegistryError};
