//! The instructions behind [`CsrAccess`] and the few others this crate needs.

use crate::arch::csr::{Csr, CsrAccess};
use core::arch::asm;

/// The hart this code is running on.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hart;

macro_rules! csr_instructions {
    (
        read: [$($r:ident => $rname:literal),* $(,)?],
        write: [$($w:ident => $wname:literal),* $(,)?] $(,)?
    ) => {
        #[inline(always)]
        unsafe fn csrr(csr: Csr) -> usize {
            let x: usize;
            match csr {
                $(Csr::$r => asm!(concat!("csrr {}, ", $rname), out(reg) x),)*
            }
            x
        }
        /// Read-only CSRs fall through.
        #[inline(always)]
        unsafe fn csrw(csr: Csr, x: usize) {
            match csr {
                $(Csr::$w => asm!(concat!("csrw ", $wname, ", {}"), in(reg) x),)*
                _ => {}
            }
        }
        #[inline(always)]
        unsafe fn csrs(csr: Csr, mask: usize) {
            match csr {
                $(Csr::$w => asm!(concat!("csrs ", $wname, ", {}"), in(reg) mask),)*
                _ => {}
            }
        }
        #[inline(always)]
        unsafe fn csrc(csr: Csr, mask: usize) {
            match csr {
                $(Csr::$w => asm!(concat!("csrc ", $wname, ", {}"), in(reg) mask),)*
                _ => {}
            }
        }
    };
}

csr_instructions! {
    read: [
        Sstatus => "sstatus", Sie => "sie", Stvec => "stvec", Sscratch => "sscratch",
        Sepc => "sepc", Scause => "scause", Stval => "stval", Sip => "sip", Satp => "satp",
        Mstatus => "mstatus", Medeleg => "medeleg", Mideleg => "mideleg", Mie => "mie",
        Mtvec => "mtvec", Mscratch => "mscratch", Mepc => "mepc", Mcause => "mcause",
        Mtval => "mtval", Mip => "mip", Pmpcfg0 => "pmpcfg0", Pmpaddr0 => "pmpaddr0",
        Pmpaddr1 => "pmpaddr1", Mhartid => "mhartid",
    ],
    write: [
        Sstatus => "sstatus", Sie => "sie", Stvec => "stvec", Sscratch => "sscratch",
        Sepc => "sepc", Scause => "scause", Stval => "stval", Sip => "sip", Satp => "satp",
        Mstatus => "mstatus", Medeleg => "medeleg", Mideleg => "mideleg", Mie => "mie",
        Mtvec => "mtvec", Mscratch => "mscratch", Mepc => "mepc", Mcause => "mcause",
        Mtval => "mtval", Mip => "mip", Pmpcfg0 => "pmpcfg0", Pmpaddr0 => "pmpaddr0",
        Pmpaddr1 => "pmpaddr1",
    ],
}

// A CSR the current privilege level may not touch raises an illegal
// instruction exception, which the dispatcher treats as fatal.
impl CsrAccess for Hart {
    #[inline(always)]
    fn read(&self, csr: Csr) -> usize {
        unsafe { csrr(csr) }
    }
    #[inline(always)]
    fn write(&self, csr: Csr, value: usize) {
        unsafe { csrw(csr, value) }
    }
    #[inline(always)]
    fn set_bits(&self, csr: Csr, mask: usize) {
        unsafe { csrs(csr, mask) }
    }
    #[inline(always)]
    fn clear_bits(&self, csr: Csr, mask: usize) {
        unsafe { csrc(csr, mask) }
    }
}

/// Read tp, the thread pointer, which holds this hart's id.
#[inline(always)]
pub fn r_tp() -> usize {
    let x: usize;
    unsafe { asm!("mv {}, tp", out(reg) x) };
    x
}
#[inline(always)]
pub unsafe fn w_tp(x: usize) {
    asm!("mv tp, {}", in(reg) x);
}

/// Wait for an interrupt.
#[inline(always)]
pub fn wfi() {
    unsafe { asm!("wfi", options(nomem, nostack)) };
}

/// Return from machine mode to `mepc` at privilege `mstatus.MPP`.
#[inline(always)]
pub unsafe fn mret() -> ! {
    asm!("mret", options(noreturn));
}
