//! Trap vectors and the Rust side of trap entry.

use super::asm::{wfi, Hart};
use super::cpu;
use crate::arch::csr::{mstatus, Csr, CsrAccess};
use crate::hardware::mmio::Volatile;
use crate::hardware::plic::PlicContext;
use crate::platform::{MAX_HANDLERS, PLIC, UART0};
use crate::trap::dispatch::{route_trap, DispatcherSlot};
use crate::trap::{Outcome, TrapDispatcher, TrapFrame};
use spin::Mutex;

pub type Dispatcher = TrapDispatcher<'static, Volatile, MAX_HANDLERS>;

/// The dispatcher slot. Only the boot hart takes traps.
pub struct Slot(DispatcherSlot<'static, Volatile, MAX_HANDLERS>);
// Handlers are driver statics; they are only ever used from the boot hart.
unsafe impl Sync for Slot {}

static DISPATCHER: Slot = Slot(Mutex::new(None));

/// Start routing traps through `dispatcher`.
///
/// No device may raise its line until this returns: a trap that finds the
/// slot locked is treated as nested, and nested traps halt.
pub fn install(dispatcher: Dispatcher) {
    *DISPATCHER.0.lock() = Some(dispatcher);
}

// Both vectors save x0, x1 and x3..x31 in frame slot n, the pre-trap sp in slot 2,
// then epc, status, cause and tval in slots 32..35. Only epc and status are
// written back, so a handler can change where and how the trap returns.
macro_rules! trap_vector {
    (
        $name:literal, $handler:literal,
        epc = $epc:literal, status = $status:literal, cause = $cause:literal, tval = $tval:literal,
        ret = $ret:literal, store = $store:literal, load = $load:literal,
        word = $word:literal, frame = $frame:literal $(,)?
    ) => {
        core::arch::global_asm!(
            ".section .text",
            ".align 4",
            concat!(".global ", $name),
            concat!($name, ":"),
            concat!("addi sp, sp, -", $frame),
            ".irp n, 0,1,3,4,5,6,7,8,9,10,11,12,13,14,15,16",
            concat!($store, " x\\n, \\n*", $word, "(sp)"),
            ".endr",
            ".irp n, 17,18,19,20,21,22,23,24,25,26,27,28,29,30,31",
            concat!($store, " x\\n, \\n*", $word, "(sp)"),
            ".endr",
            concat!("addi t0, sp, ", $frame),
            concat!($store, " t0, 2*", $word, "(sp)"),
            concat!("csrr t0, ", $epc),
            concat!($store, " t0, 32*", $word, "(sp)"),
            concat!("csrr t0, ", $status),
            concat!($store, " t0, 33*", $word, "(sp)"),
            concat!("csrr t0, ", $cause),
            concat!($store, " t0, 34*", $word, "(sp)"),
            concat!("csrr t0, ", $tval),
            concat!($store, " t0, 35*", $word, "(sp)"),
            "mv a0, sp",
            concat!("call ", $handler),
            concat!($load, " t0, 32*", $word, "(sp)"),
            concat!("csrw ", $epc, ", t0"),
            concat!($load, " t0, 33*", $word, "(sp)"),
            concat!("csrw ", $status, ", t0"),
            ".irp n, 1,3,4,5,6,7,8,9,10,11,12,13,14,15,16",
            concat!($load, " x\\n, \\n*", $word, "(sp)"),
            ".endr",
            ".irp n, 17,18,19,20,21,22,23,24,25,26,27,28,29,30,31",
            concat!($load, " x\\n, \\n*", $word, "(sp)"),
            ".endr",
            concat!("addi sp, sp, ", $frame),
            $ret,
        );
    };
}

#[cfg(target_arch = "riscv64")]
trap_vector!(
    "machine_trap_vector", "machine_trap_handler",
    epc = "mepc", status = "mstatus", cause = "mcause", tval = "mtval",
    ret = "mret", store = "sd", load = "ld", word = "8", frame = "288",
);
#[cfg(target_arch = "riscv64")]
trap_vector!(
    "supervisor_trap_vector", "supervisor_trap_handler",
    epc = "sepc", status = "sstatus", cause = "scause", tval = "stval",
    ret = "sret", store = "sd", load = "ld", word = "8", frame = "288",
);
#[cfg(target_arch = "riscv32")]
trap_vector!(
    "machine_trap_vector", "machine_trap_handler",
    epc = "mepc", status = "mstatus", cause = "mcause", tval = "mtval",
    ret = "mret", store = "sw", load = "lw", word = "4", frame = "144",
);
#[cfg(target_arch = "riscv32")]
trap_vector!(
    "supervisor_trap_vector", "supervisor_trap_handler",
    epc = "sepc", status = "sstatus", cause = "scause", tval = "stval",
    ret = "sret", store = "sw", load = "lw", word = "4", frame = "144",
);

extern "C" {
    pub fn machine_trap_vector();
    pub fn supervisor_trap_vector();
}

#[no_mangle]
extern "C" fn machine_trap_handler(frame: &mut TrapFrame) {
    if handle(frame, PlicContext::machine(cpu::hart_id())) == Outcome::Halt {
        Hart.clear_bits(Csr::Mstatus, mstatus::MIE);
        halt();
    }
}

#[no_mangle]
extern "C" fn supervisor_trap_handler(frame: &mut TrapFrame) {
    if handle(frame, PlicContext::supervisor(cpu::hart_id())) == Outcome::Halt {
        Hart.clear_bits(Csr::Sstatus, mstatus::SIE);
        halt();
    }
}

fn handle(frame: &TrapFrame, context: PlicContext) -> Outcome {
    let mut sink = &UART0;
    route_trap(&DISPATCHER.0, &PLIC, context, frame, &mut sink)
}

/// Park the hart for good.
pub fn halt() -> ! {
    loop {
        wfi();
    }
}
