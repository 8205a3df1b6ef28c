//! Machine-level trap dispatch for a single RISC-V hart.
//!
//! Boot drops from machine mode to the planned privilege, `main` wires the
//! UART's receive interrupt through the PLIC, and every trap after that goes
//! through the [`trap::TrapDispatcher`]: exceptions halt, interrupts are
//! reported and, when external, claimed, serviced and completed.
//!
//! Everything but the instructions themselves is written against the
//! [`hardware::mmio::Mmio`] and [`arch::csr::CsrAccess`] seams, so it builds
//! and runs on the host against simulated devices.

#![cfg_attr(target_os = "none", no_std)]
#![allow(clippy::missing_safety_doc)]

pub mod arch;
pub mod console;
pub mod hardware;
pub mod platform;
pub mod trap;

#[allow(unused_imports)]
pub(crate) use crate::console::printf::{print, println};
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub(crate) use crate::console::printf::{uprint, uprintln};

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
#[no_mangle]
pub extern "C" fn main() -> ! {
    use crate::arch::csr::{interrupt_bits, mstatus, Csr, CsrAccess};
    use crate::arch::riscv::{asm::wfi, cpu, trap::install, Hart};
    use crate::hardware::plic::{Mode, PlicContext};
    use crate::hardware::uart::InterruptEnable;
    use crate::platform::{BOOT_MODE, BOOT_PRIVILEGE, PLIC, UART0, UART0_IRQ, UART0_PRIORITY};
    use crate::trap::{IrqRegistry, TrapDispatcher};
    use log::{error, info, LevelFilter};

    let hart = Hart;
    let hart_id = cpu::hart_id();

    UART0.init();
    console::init(&UART0);
    if console::logger::init(LevelFilter::Info).is_err() {
        println!("logger already installed");
    }
    println!("");
    info!("rvtrap: hart {} running in {:?} mode", hart_id, BOOT_PRIVILEGE);

    let context = PlicContext::new(hart_id, BOOT_MODE);
    let mut registry = IrqRegistry::new();
    if let Err(e) = registry.register(UART0_IRQ, &UART0) {
        error!("irq: uart: {}", e);
    }
    if let Err(e) = PLIC.configure(context, &[(UART0_IRQ, UART0_PRIORITY)], 0) {
        error!("plic: {}", e);
    }

    // Boot already unmasked interrupts at this level, so the UART may only
    // raise its line once the dispatcher is in the slot.
    install(TrapDispatcher::new(&PLIC, context, registry));
    UART0.set_interrupt_enable(InterruptEnable::RX_AVAILABLE);
    match BOOT_MODE {
        Mode::Supervisor => {
            hart.set_bits(Csr::Sie, interrupt_bits::SEI);
            hart.set_bits(Csr::Sstatus, mstatus::SIE);
        }
        Mode::Machine => {
            hart.set_bits(Csr::Mie, interrupt_bits::MEI);
            hart.set_bits(Csr::Mstatus, mstatus::MIE);
        }
    }
    info!("rvtrap: echoing uart input");

    loop {
        wfi();
    }
}

#[cfg(all(target_os = "none", any(target_arch = "riscv32", target_arch = "riscv64")))]
#[panic_handler]
fn panic_wrapper(panic_info: &core::panic::PanicInfo) -> ! {
    if let Some(location) = panic_info.location() {
        uprint!("rvtrap panic ({}:{}): ", location.file(), location.line());
    } else {
        uprint!("rvtrap panic: ");
    }
    uprintln!("{}", panic_info.message());

    arch::riscv::trap::halt()
}
