/// Print out formatted text to the console.
/// Spins to acquire the console lock.
macro_rules! print {
    ($($arg:tt)*) => {{
        use core::fmt::Write;

        let mut cons = $crate::console::CONSOLE.lock();
        let _ = core::write!(cons, $($arg)*);
    }};
}
pub(crate) use print;

macro_rules! println {
    ($($arg:tt)*) => {{
        use $crate::console::printf::print;
        print!($($arg)*);
        print!("\n");
    }};
}
pub(crate) use println;

/// Print out formatted text straight to the boot UART.
/// Does not use any locks, so it is safe in trap and panic context.
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
macro_rules! uprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write;

        let _ = core::write!($crate::platform::UART0.writer(), $($arg)*);
    }};
}
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub(crate) use uprint;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
macro_rules! uprintln {
    ($($arg:tt)*) => {{
        use $crate::console::printf::uprint;
        uprint!($($arg)*);
        uprint!("\n");
    }};
}
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub(crate) use uprintln;
