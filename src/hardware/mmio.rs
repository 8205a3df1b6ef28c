//! Memory-mapped register access.
//!
//! Device registers change underneath the program, so every access has to be
//! a real load or store in program order. Drivers never touch raw pointers;
//! they go through an [`Mmio`] bus, which on hardware is [`Volatile`].

use core::ptr::{read_volatile, write_volatile};

pub trait Mmio {
    fn read_u8(&self, addr: usize) -> u8;
    fn write_u8(&self, addr: usize, value: u8);
    fn read_u32(&self, addr: usize) -> u32;
    fn write_u32(&self, addr: usize, value: u32);
}
impl<T: Mmio + ?Sized> Mmio for &T {
    fn read_u8(&self, addr: usize) -> u8 {
        (**self).read_u8(addr)
    }
    fn write_u8(&self, addr: usize, value: u8) {
        (**self).write_u8(addr, value)
    }
    fn read_u32(&self, addr: usize) -> u32 {
        (**self).read_u32(addr)
    }
    fn write_u32(&self, addr: usize, value: u32) {
        (**self).write_u32(addr, value)
    }
}

/// The physical register bus.
#[derive(Debug)]
pub struct Volatile {
    _private: (),
}
impl Volatile {
    /// # Safety
    ///
    /// Every address later handed to this bus must be a mapped device
    /// register of the accessed width.
    pub const unsafe fn new() -> Volatile {
        Volatile { _private: () }
    }
}
impl Mmio for Volatile {
    #[inline(always)]
    fn read_u8(&self, addr: usize) -> u8 {
        unsafe { read_volatile(addr as *const u8) }
    }
    #[inline(always)]
    fn write_u8(&self, addr: usize, value: u8) {
        unsafe { write_volatile(addr as *mut u8, value) }
    }
    #[inline(always)]
    fn read_u32(&self, addr: usize) -> u32 {
        unsafe { read_volatile(addr as *const u32) }
    }
    #[inline(always)]
    fn write_u32(&self, addr: usize, value: u32) {
        unsafe { write_volatile(addr as *mut u32, value) }
    }
}
