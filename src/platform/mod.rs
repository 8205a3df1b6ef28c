//! Board description: where the devices live and how to boot.

#[cfg(feature = "qemu-virt")]
mod qemu_virt;
#[cfg(feature = "qemu-virt")]
pub use qemu_virt::*;

#[cfg(not(feature = "qemu-virt"))]
compile_error!("a platform must be selected");
