//! The trap dispatch state machine.
//!
//! ```text
//! Idle -> Decoding -> ExceptionFatal    -> Halted
//!                  -> InterruptHandling -> Idle
//! ```
//!
//! Exceptions are not recoverable: once halted, the dispatcher stays halted.
//! Every trap leaves a line on the byte sink, so nothing is dropped silently.

use super::cause::{Trap, TrapCause};
use super::frame::TrapFrame;
use super::registry::IrqRegistry;
use crate::console::{ByteSink, SinkWriter};
use crate::hardware::mmio::Mmio;
use crate::hardware::plic::{Plic, PlicContext};
use core::fmt::Write;
use log::trace;
use spin::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapState {
    /// Not in a trap.
    Idle,
    /// The cause register has been read.
    Decoding,
    /// An exception was taken; the saved frame is dumped here.
    ExceptionFatal,
    InterruptHandling,
    /// Terminal.
    Halted,
}

/// What a trap should do to the interrupted context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Return to the interrupted code.
    Resume,
    /// Stop the hart.
    Halt,
}

/// Report a decoded cause. Returns whether the trap is fatal.
pub fn report_cause(cause: TrapCause, sink: &mut dyn ByteSink) -> Outcome {
    let mut out = SinkWriter(sink);
    let _ = match cause.classify() {
        Trap::Exception(kind) => writeln!(out, "trap: exception: {} (code {})", kind, cause.code),
        Trap::Interrupt(kind) => writeln!(out, "trap: interrupt: {} (code {})", kind, cause.code),
        Trap::Unknown if cause.is_interrupt => {
            writeln!(out, "trap: unknown interrupt (code {:#x})", cause.code)
        }
        Trap::Unknown => writeln!(out, "trap: unknown exception (code {:#x})", cause.code),
    };
    if cause.is_interrupt {
        Outcome::Resume
    } else {
        Outcome::Halt
    }
}

/// Claim whatever `context` has pending and complete it without serving it.
fn complete_unserved<B: Mmio>(plic: &Plic<B>, context: PlicContext, sink: &mut dyn ByteSink) {
    match plic.claim(context) {
        Some(claim) => {
            let _ = writeln!(SinkWriter(sink), "trap: unhandled source {}", claim.source());
            claim.complete();
        }
        None => {
            let _ = writeln!(SinkWriter(sink), "trap: no pending source");
        }
    }
}

/// Where the trap vectors find the dispatcher. Empty until boot installs one.
pub type DispatcherSlot<'a, B, const N: usize> = Mutex<Option<TrapDispatcher<'a, B, N>>>;

/// Run the trap saved in `frame` through the dispatcher in `slot`.
///
/// A slot that is already locked means this trap arrived while another one
/// was being handled: it is reported and the hart halts. An empty slot means
/// no dispatcher yet: the cause is reported, and an external interrupt is
/// claimed from `plic` for `context` and completed unserved. Exceptions halt,
/// interrupts resume.
pub fn route_trap<B: Mmio, const N: usize>(
    slot: &DispatcherSlot<'_, B, N>,
    plic: &Plic<B>,
    context: PlicContext,
    frame: &TrapFrame,
    sink: &mut dyn ByteSink,
) -> Outcome {
    let Some(mut guard) = slot.try_lock() else {
        let _ = writeln!(
            SinkWriter(sink),
            "trap: nested trap (cause {:#x}, epc {:#x})",
            frame.cause,
            frame.epc
        );
        return Outcome::Halt;
    };
    match guard.as_mut() {
        Some(dispatcher) => match dispatcher.handle_trap(frame, sink) {
            TrapState::Halted => Outcome::Halt,
            _ => Outcome::Resume,
        },
        None => {
            let cause = TrapCause::decode(frame.cause);
            let outcome = report_cause(cause, &mut *sink);
            if let Trap::Interrupt(kind) = cause.classify() {
                if kind.is_external() {
                    complete_unserved(plic, context, sink);
                }
            }
            outcome
        }
    }
}

pub struct TrapDispatcher<'a, B: Mmio, const N: usize> {
    plic: &'a Plic<B>,
    context: PlicContext,
    registry: IrqRegistry<'a, N>,
    state: TrapState,
}
impl<'a, B: Mmio, const N: usize> TrapDispatcher<'a, B, N> {
    pub fn new(
        plic: &'a Plic<B>,
        context: PlicContext,
        registry: IrqRegistry<'a, N>,
    ) -> TrapDispatcher<'a, B, N> {
        TrapDispatcher {
            plic,
            context,
            registry,
            state: TrapState::Idle,
        }
    }
    pub fn state(&self) -> TrapState {
        self.state
    }
    pub fn context(&self) -> PlicContext {
        self.context
    }
    pub fn registry(&self) -> &IrqRegistry<'a, N> {
        &self.registry
    }

    fn enter(&mut self, next: TrapState) {
        trace!("trap: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run one trap with cause register value `raw_cause` through the machine.
    ///
    /// Returns the state the trap left behind: `Idle` to return to the
    /// interrupted code, `Halted` to stop.
    pub fn dispatch(&mut self, raw_cause: usize, sink: &mut dyn ByteSink) -> TrapState {
        if self.decode(raw_cause, sink) == TrapState::ExceptionFatal {
            self.enter(TrapState::Halted);
        }
        self.state
    }

    /// Dispatch the trap a vector saved in `frame`.
    ///
    /// Fatal traps also dump the saved registers.
    pub fn handle_trap(&mut self, frame: &TrapFrame, sink: &mut dyn ByteSink) -> TrapState {
        if self.decode(frame.cause, &mut *sink) == TrapState::ExceptionFatal {
            let _ = write!(SinkWriter(sink), "{}", frame);
            self.enter(TrapState::Halted);
        }
        self.state
    }

    /// Everything up to the halt: leaves `Idle`, `ExceptionFatal` or `Halted`.
    fn decode(&mut self, raw_cause: usize, sink: &mut dyn ByteSink) -> TrapState {
        if self.state == TrapState::Halted {
            let _ = writeln!(
                SinkWriter(&mut *sink),
                "trap: halted, ignoring cause {:#x}",
                raw_cause
            );
            return self.state;
        }

        self.enter(TrapState::Decoding);
        let cause = TrapCause::decode(raw_cause);
        match report_cause(cause, &mut *sink) {
            Outcome::Halt => self.enter(TrapState::ExceptionFatal),
            Outcome::Resume => {
                self.enter(TrapState::InterruptHandling);
                if let Trap::Interrupt(kind) = cause.classify() {
                    if kind.is_external() {
                        self.service_external(sink);
                    }
                }
                self.enter(TrapState::Idle);
            }
        }
        self.state
    }

    /// One claim, one service, one completion.
    fn service_external(&mut self, sink: &mut dyn ByteSink) {
        let Some(claim) = self.plic.claim(self.context) else {
            let _ = writeln!(SinkWriter(sink), "trap: no pending source");
            return;
        };
        let source = claim.source();
        let _ = writeln!(SinkWriter(&mut *sink), "trap: source {}", source);
        match self.registry.lookup(source) {
            Some(handler) => handler.handle(source, sink),
            None => {
                let _ = writeln!(SinkWriter(sink), "trap: unhandled source {}", source);
            }
        }
        claim.complete();
    }
}
