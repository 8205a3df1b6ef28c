//! The one-time descent from machine mode.
//!
//! Reset leaves the hart in machine mode. [`configure`] writes a [`BootPlan`]
//! into the CSRs, and `enter` executes the `mret` that lands in the entry
//! point at the planned privilege. Delegation has to be in place before that
//! `mret`: a trap the masks do not delegate lands in the machine vector no
//! matter which mode caused it.

use super::csr::{interrupt_bits, mstatus, pmp, satp, Csr, CsrAccess, Privilege};
use core::fmt;
use log::debug;

/// Memory the lower privilege level may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PmpRegion {
    /// All of physical memory, read, write and execute.
    Full,
    /// `start..end` only, as a top-of-range pair.
    Range { start: usize, end: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootPlan {
    pub target: Privilege,
    /// Where `mret` goes.
    pub entry: usize,
    pub machine_vector: usize,
    pub supervisor_vector: usize,
    /// `medeleg`: exception codes handed to supervisor mode.
    pub exception_delegation: usize,
    /// `mideleg`: interrupt codes handed to supervisor mode.
    pub interrupt_delegation: usize,
    pub pmp: PmpRegion,
    /// Interrupt enable bits for the target level (`sie` or `mie`).
    pub interrupt_enable: usize,
}
impl BootPlan {
    /// Drop to supervisor mode with every trap delegated.
    pub const fn supervisor(
        entry: usize,
        machine_vector: usize,
        supervisor_vector: usize,
    ) -> BootPlan {
        BootPlan {
            target: Privilege::Supervisor,
            entry,
            machine_vector,
            supervisor_vector,
            exception_delegation: 0xffff,
            interrupt_delegation: 0xffff,
            pmp: PmpRegion::Full,
            interrupt_enable: interrupt_bits::SUPERVISOR,
        }
    }
    /// Stay in machine mode and take every trap there.
    pub const fn machine(entry: usize, machine_vector: usize) -> BootPlan {
        BootPlan {
            target: Privilege::Machine,
            entry,
            machine_vector,
            supervisor_vector: 0,
            exception_delegation: 0,
            interrupt_delegation: 0,
            pmp: PmpRegion::Full,
            interrupt_enable: interrupt_bits::MEI,
        }
    }
    pub const fn with_pmp(mut self, pmp: PmpRegion) -> BootPlan {
        self.pmp = pmp;
        self
    }
    pub const fn with_delegation(mut self, exceptions: usize, interrupts: usize) -> BootPlan {
        self.exception_delegation = exceptions;
        self.interrupt_delegation = interrupts;
        self
    }
    pub const fn with_interrupt_enable(mut self, mask: usize) -> BootPlan {
        self.interrupt_enable = mask;
        self
    }

    pub fn validate(&self) -> Result<(), BootError> {
        if self.target == Privilege::User {
            return Err(BootError::UnsupportedTarget(self.target));
        }
        if let PmpRegion::Range { start, end } = self.pmp {
            if pmp::address(start) >= pmp::address(end) {
                return Err(BootError::EmptyRegion { start, end });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootError {
    /// Only supervisor and machine mode can run this crate.
    UnsupportedTarget(Privilege),
    EmptyRegion { start: usize, end: usize },
}
impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::UnsupportedTarget(p) => write!(f, "cannot boot into {:?} mode", p),
            BootError::EmptyRegion { start, end } => {
                write!(f, "pmp region {:#x}..{:#x} is empty", start, end)
            }
        }
    }
}

/// Write `plan` into the machine-level CSRs. Run once, in machine mode.
///
/// Order: translation off, PMP, trap vectors, delegation, interrupt enables,
/// then the previous-privilege field and the entry point.
pub fn configure<C: CsrAccess>(csrs: &C, plan: &BootPlan) -> Result<(), BootError> {
    plan.validate()?;

    // Disable paging for now.
    csrs.write(Csr::Satp, satp::BARE);

    match plan.pmp {
        PmpRegion::Full => {
            csrs.write(Csr::Pmpaddr0, pmp::ALL_MEMORY);
            csrs.write(Csr::Pmpcfg0, pmp::entry(0, pmp::A_TOR | pmp::RWX));
        }
        PmpRegion::Range { start, end } => {
            // Entry 1 matches pmpaddr0 <= a < pmpaddr1.
            csrs.write(Csr::Pmpaddr0, pmp::address(start));
            csrs.write(Csr::Pmpaddr1, pmp::address(end));
            csrs.write(
                Csr::Pmpcfg0,
                pmp::entry(0, pmp::A_OFF) | pmp::entry(1, pmp::A_TOR | pmp::RWX),
            );
        }
    }
    debug!("boot: pmp {:?}", plan.pmp);

    csrs.write(Csr::Mtvec, plan.machine_vector);
    let supervisor = plan.target == Privilege::Supervisor;
    if supervisor {
        csrs.write(Csr::Stvec, plan.supervisor_vector);
        csrs.write(Csr::Medeleg, plan.exception_delegation);
        csrs.write(Csr::Mideleg, plan.interrupt_delegation);
        csrs.set_bits(Csr::Sie, plan.interrupt_enable);
    } else {
        csrs.write(Csr::Medeleg, 0);
        csrs.write(Csr::Mideleg, 0);
        csrs.set_bits(Csr::Mie, plan.interrupt_enable);
    }
    debug!(
        "boot: medeleg {:#x} mideleg {:#x}",
        plan.exception_delegation, plan.interrupt_delegation
    );

    // No machine interrupts until mret; MPIE becomes MIE then.
    let mut status = csrs.read(Csr::Mstatus) & !mstatus::MIE;
    status = mstatus::with_mpp(status, plan.target) | mstatus::MPIE;
    if supervisor {
        status |= mstatus::SIE;
    }
    csrs.write(Csr::Mstatus, status);
    csrs.write(Csr::Mepc, plan.entry);
    debug!("boot: mret to {:#x} in {:?} mode", plan.entry, plan.target);
    Ok(())
}

/// Configure the hart, then `mret` into `plan.entry`.
///
/// # Safety
///
/// Must run once, in machine mode, with `plan.entry` pointing at code that
/// never returns.
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub unsafe fn enter<C: CsrAccess>(
    csrs: &C,
    plan: &BootPlan,
) -> Result<core::convert::Infallible, BootError> {
    configure(csrs, plan)?;
    super::riscv::asm::mret()
}
