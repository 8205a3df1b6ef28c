//! Control and status registers.
//!
//! Registers are named by [`Csr`] and accessed through [`CsrAccess`], which
//! is implemented by the hart itself (`arch::riscv::Hart`) and by simulated
//! register files in tests. Field layouts are described with plain masks and
//! shifts; nothing here depends on how a compiler lays out bit fields.
//!
//! Fields of a lower privilege level are visible through the registers of the
//! higher one (`sstatus` is a view of `mstatus`), so only the machine-level
//! layouts are spelled out.

use core::fmt;

/// A control and status register this crate knows how to access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Csr {
    Sstatus = 0x100,
    Sie = 0x104,
    Stvec = 0x105,
    Sscratch = 0x140,
    Sepc = 0x141,
    Scause = 0x142,
    Stval = 0x143,
    Sip = 0x144,
    Satp = 0x180,
    Mstatus = 0x300,
    Medeleg = 0x302,
    Mideleg = 0x303,
    Mie = 0x304,
    Mtvec = 0x305,
    Mscratch = 0x340,
    Mepc = 0x341,
    Mcause = 0x342,
    Mtval = 0x343,
    Mip = 0x344,
    Pmpcfg0 = 0x3a0,
    Pmpaddr0 = 0x3b0,
    Pmpaddr1 = 0x3b1,
    Mhartid = 0xf14,
}
impl Csr {
    /// The 12-bit CSR number.
    pub const fn number(self) -> u16 {
        self as u16
    }
    pub const fn name(self) -> &'static str {
        match self {
            Csr::Sstatus => "sstatus",
            Csr::Sie => "sie",
            Csr::Stvec => "stvec",
            Csr::Sscratch => "sscratch",
            Csr::Sepc => "sepc",
            Csr::Scause => "scause",
            Csr::Stval => "stval",
            Csr::Sip => "sip",
            Csr::Satp => "satp",
            Csr::Mstatus => "mstatus",
            Csr::Medeleg => "medeleg",
            Csr::Mideleg => "mideleg",
            Csr::Mie => "mie",
            Csr::Mtvec => "mtvec",
            Csr::Mscratch => "mscratch",
            Csr::Mepc => "mepc",
            Csr::Mcause => "mcause",
            Csr::Mtval => "mtval",
            Csr::Mip => "mip",
            Csr::Pmpcfg0 => "pmpcfg0",
            Csr::Pmpaddr0 => "pmpaddr0",
            Csr::Pmpaddr1 => "pmpaddr1",
            Csr::Mhartid => "mhartid",
        }
    }
    /// Bits 11:10 of the number are `0b11` for read-only registers.
    pub const fn is_read_only(self) -> bool {
        (self.number() >> 10) & 0b11 == 0b11
    }
    /// Lowest privilege level allowed to touch the register (bits 9:8).
    pub const fn privilege(self) -> Privilege {
        match (self.number() >> 8) & 0b11 {
            0 => Privilege::User,
            1 => Privilege::Supervisor,
            _ => Privilege::Machine,
        }
    }
}
impl fmt::Display for Csr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read, write, set and clear primitives over the current hart's CSRs.
///
/// None of these can fail and none of them suspend. CSRs are hart-local, so
/// the only meaningful caller is code running on that hart.
pub trait CsrAccess {
    fn read(&self, csr: Csr) -> usize;
    fn write(&self, csr: Csr, value: usize);
    /// Set every bit of `mask`, leaving the rest untouched.
    fn set_bits(&self, csr: Csr, mask: usize) {
        self.write(csr, self.read(csr) | mask);
    }
    /// Clear every bit of `mask`, leaving the rest untouched.
    fn clear_bits(&self, csr: Csr, mask: usize) {
        self.write(csr, self.read(csr) & !mask);
    }
}
impl<T: CsrAccess + ?Sized> CsrAccess for &T {
    fn read(&self, csr: Csr) -> usize {
        (**self).read(csr)
    }
    fn write(&self, csr: Csr, value: usize) {
        (**self).write(csr, value)
    }
    fn set_bits(&self, csr: Csr, mask: usize) {
        (**self).set_bits(csr, mask)
    }
    fn clear_bits(&self, csr: Csr, mask: usize) {
        (**self).clear_bits(csr, mask)
    }
}

/// Privilege levels, encoded as in `mstatus.MPP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Privilege {
    User = 0,
    Supervisor = 1,
    Machine = 3,
}
impl Privilege {
    pub const fn from_bits(bits: usize) -> Option<Privilege> {
        match bits {
            0 => Some(Privilege::User),
            1 => Some(Privilege::Supervisor),
            3 => Some(Privilege::Machine),
            _ => None,
        }
    }
}

/// Machine status register (`mstatus`), and its supervisor view.
pub mod mstatus {
    use super::Privilege;

    /// Supervisor interrupt enable.
    pub const SIE: usize = 1 << 1;
    /// Machine interrupt enable.
    pub const MIE: usize = 1 << 3;
    /// Supervisor previous interrupt enable.
    pub const SPIE: usize = 1 << 5;
    /// Machine previous interrupt enable.
    pub const MPIE: usize = 1 << 7;
    /// Supervisor previous privilege: 1 = Supervisor, 0 = User.
    pub const SPP: usize = 1 << 8;
    pub const MPP_SHIFT: usize = 11;
    /// Machine previous privilege.
    pub const MPP_MASK: usize = 0b11 << MPP_SHIFT;

    /// Previous privilege recorded on the last trap into machine mode.
    ///
    /// The encoding `0b10` is reserved; `None` is returned for it.
    pub const fn mpp(value: usize) -> Option<Privilege> {
        Privilege::from_bits((value & MPP_MASK) >> MPP_SHIFT)
    }
    /// `value` with the MPP field replaced.
    pub const fn with_mpp(value: usize, privilege: Privilege) -> usize {
        (value & !MPP_MASK) | ((privilege as usize) << MPP_SHIFT)
    }
}

/// Interrupt enable (`mie`/`sie`) and pending (`mip`/`sip`) bits.
///
/// Bit positions equal the interrupt cause codes.
pub mod interrupt_bits {
    pub const SSI: usize = 1 << 1;
    pub const MSI: usize = 1 << 3;
    pub const STI: usize = 1 << 5;
    pub const MTI: usize = 1 << 7;
    pub const SEI: usize = 1 << 9;
    pub const MEI: usize = 1 << 11;

    /// All supervisor-level interrupts.
    pub const SUPERVISOR: usize = SSI | STI | SEI;
    /// All machine-level interrupts.
    pub const MACHINE: usize = MSI | MTI | MEI;

    /// Whether the bit for interrupt `code` is set in `value`.
    pub const fn is_set(value: usize, code: usize) -> bool {
        code < usize::BITS as usize && value & (1 << code) != 0
    }
}

/// Supervisor address translation and protection (`satp`).
pub mod satp {
    /// No translation or protection.
    pub const BARE: usize = 0;

    #[cfg(target_pointer_width = "32")]
    pub const MODE_SHIFT: usize = 31;
    #[cfg(target_pointer_width = "32")]
    pub const MODE_MASK: usize = 0x1 << MODE_SHIFT;
    #[cfg(target_pointer_width = "32")]
    pub const ASID_MASK: usize = 0x1ff << 22;
    #[cfg(target_pointer_width = "32")]
    pub const PPN_MASK: usize = 0x3f_ffff;

    #[cfg(target_pointer_width = "64")]
    pub const MODE_SHIFT: usize = 60;
    #[cfg(target_pointer_width = "64")]
    pub const MODE_MASK: usize = 0xf << MODE_SHIFT;
    #[cfg(target_pointer_width = "64")]
    pub const ASID_MASK: usize = 0xffff << 44;
    #[cfg(target_pointer_width = "64")]
    pub const PPN_MASK: usize = 0xfff_ffff_ffff;

    pub const fn mode(value: usize) -> usize {
        (value & MODE_MASK) >> MODE_SHIFT
    }
    pub const fn is_bare(value: usize) -> bool {
        mode(value) == BARE
    }
}

/// Physical memory protection configuration bytes (`pmpcfgN`).
pub mod pmp {
    /// Read permitted.
    pub const R: u8 = 1 << 0;
    /// Write permitted.
    pub const W: u8 = 1 << 1;
    /// Execute permitted.
    pub const X: u8 = 1 << 2;
    pub const RWX: u8 = R | W | X;

    pub const A_SHIFT: u8 = 3;
    /// Address-matching mode.
    pub const A_MASK: u8 = 0b11 << A_SHIFT;
    /// Null region (disabled).
    pub const A_OFF: u8 = 0 << A_SHIFT;
    /// Top of range.
    pub const A_TOR: u8 = 1 << A_SHIFT;
    /// Naturally aligned four-byte region.
    pub const A_NA4: u8 = 2 << A_SHIFT;
    /// Naturally aligned power-of-two region, at least 8 bytes.
    pub const A_NAPOT: u8 = 3 << A_SHIFT;
    /// Entry is locked, and enforced in machine mode too.
    pub const L: u8 = 1 << 7;

    /// Place configuration byte `cfg` for entry `index` within a `pmpcfgN` word.
    pub const fn entry(index: usize, cfg: u8) -> usize {
        (cfg as usize) << (index * 8)
    }
    /// A top-of-range address covering all of physical memory.
    #[cfg(target_pointer_width = "64")]
    pub const ALL_MEMORY: usize = 0x3f_ffff_ffff_ffff;
    #[cfg(target_pointer_width = "32")]
    pub const ALL_MEMORY: usize = 0xffff_ffff;

    /// `pmpaddrN` holds bits XLEN+1..2 of a physical address.
    pub const fn address(physical: usize) -> usize {
        physical >> 2
    }
}
