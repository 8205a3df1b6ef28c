//! Register state saved by the trap vectors.

use core::fmt;
use core::mem::{offset_of, size_of};
use static_assertions::const_assert_eq;

pub const GENERAL_REGISTERS: usize = 32;
/// Words in a saved frame: the general registers, then epc, status, cause and tval.
pub const FRAME_WORDS: usize = GENERAL_REGISTERS + 4;

pub const EPC_SLOT: usize = 32;
pub const STATUS_SLOT: usize = 33;
pub const CAUSE_SLOT: usize = 34;
pub const TVAL_SLOT: usize = 35;

/// Everything the interrupted code could observe, as the vector laid it out
/// on the stack. `regs[n]` holds `xn`; `regs[0]` is always zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub regs: [usize; GENERAL_REGISTERS],
    pub epc: usize,
    pub status: usize,
    pub cause: usize,
    pub tval: usize,
}

// The vectors address the frame by slot number.
const_assert_eq!(size_of::<TrapFrame>(), FRAME_WORDS * size_of::<usize>());
const_assert_eq!(offset_of!(TrapFrame, epc), EPC_SLOT * size_of::<usize>());
const_assert_eq!(offset_of!(TrapFrame, status), STATUS_SLOT * size_of::<usize>());
const_assert_eq!(offset_of!(TrapFrame, cause), CAUSE_SLOT * size_of::<usize>());
const_assert_eq!(offset_of!(TrapFrame, tval), TVAL_SLOT * size_of::<usize>());
// The stack stays 16-byte aligned across the call into Rust.
const_assert_eq!(size_of::<TrapFrame>() % 16, 0);

impl TrapFrame {
    pub const RA: usize = 1;
    pub const SP: usize = 2;
    pub const A0: usize = 10;
}

impl fmt::Display for TrapFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "epc={:#x} status={:#x} cause={:#x} tval={:#x}",
            self.epc, self.status, self.cause, self.tval
        )?;
        for (row, regs) in self.regs.chunks(4).enumerate() {
            for (col, value) in regs.iter().enumerate() {
                write!(f, "x{:<2}={:#018x} ", row * 4 + col, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_lists_every_register() {
        let frame = TrapFrame {
            epc: 0x8000_0000,
            ..TrapFrame::default()
        };
        let dump = frame.to_string();
        assert!(dump.starts_with("epc=0x80000000"));
        assert!(dump.contains("x31="));
    }
}
