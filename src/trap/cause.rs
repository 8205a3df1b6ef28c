//! Decoding of the `mcause`/`scause` register.
//!
//! The top bit of the register tells interrupts from exceptions and the
//! remaining bits hold the cause code. Only a handful of codes are defined;
//! everything else classifies as [`Trap::Unknown`].

use core::fmt;

/// The interrupt flag: the most significant bit of the cause register.
pub const INTERRUPT_BIT: usize = 1 << (usize::BITS - 1);
/// Every bit of the cause register except the interrupt flag.
pub const CODE_MASK: usize = !INTERRUPT_BIT;

/// A decoded cause register value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapCause {
    pub code: usize,
    pub is_interrupt: bool,
}
impl TrapCause {
    pub const fn decode(raw: usize) -> TrapCause {
        TrapCause {
            code: raw & CODE_MASK,
            is_interrupt: raw & INTERRUPT_BIT != 0,
        }
    }
    pub const fn interrupt(code: usize) -> TrapCause {
        TrapCause {
            code: code & CODE_MASK,
            is_interrupt: true,
        }
    }
    pub const fn exception(code: usize) -> TrapCause {
        TrapCause {
            code: code & CODE_MASK,
            is_interrupt: false,
        }
    }
    /// Encode back into a cause register value.
    pub const fn raw(self) -> usize {
        let flag = if self.is_interrupt { INTERRUPT_BIT } else { 0 };
        flag | (self.code & CODE_MASK)
    }
    pub fn classify(self) -> Trap {
        if self.is_interrupt {
            match INTERRUPTS.get(self.code) {
                Some(Some(kind)) => Trap::Interrupt(*kind),
                _ => Trap::Unknown,
            }
        } else {
            match EXCEPTIONS.get(self.code) {
                Some(Some(kind)) => Trap::Exception(*kind),
                _ => Trap::Unknown,
            }
        }
    }
}
impl From<usize> for TrapCause {
    fn from(raw: usize) -> TrapCause {
        TrapCause::decode(raw)
    }
}

/// What a trap turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    Exception(Exception),
    Interrupt(Interrupt),
    /// A reserved or implementation-specific code.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exception {
    InstructionAddressMisaligned = 0,
    InstructionAccessFault = 1,
    IllegalInstruction = 2,
    Breakpoint = 3,
    LoadAddressMisaligned = 4,
    LoadAccessFault = 5,
    StoreAddressMisaligned = 6,
    StoreAccessFault = 7,
    UserEnvironmentCall = 8,
    SupervisorEnvironmentCall = 9,
    MachineEnvironmentCall = 11,
    InstructionPageFault = 12,
    LoadPageFault = 13,
    StorePageFault = 15,
}
impl Exception {
    pub const fn code(self) -> usize {
        self as usize
    }
    pub const fn name(self) -> &'static str {
        match self {
            Exception::InstructionAddressMisaligned => "Instruction address misaligned",
            Exception::InstructionAccessFault => "Instruction access fault",
            Exception::IllegalInstruction => "Illegal instruction",
            Exception::Breakpoint => "Breakpoint",
            Exception::LoadAddressMisaligned => "Load address misaligned",
            Exception::LoadAccessFault => "Load access fault",
            Exception::StoreAddressMisaligned => "Store/AMO address misaligned",
            Exception::StoreAccessFault => "Store/AMO access fault",
            Exception::UserEnvironmentCall => "Environment call from U-mode",
            Exception::SupervisorEnvironmentCall => "Environment call from S-mode",
            Exception::MachineEnvironmentCall => "Environment call from M-mode",
            Exception::InstructionPageFault => "Instruction page fault",
            Exception::LoadPageFault => "Load page fault",
            Exception::StorePageFault => "Store/AMO page fault",
        }
    }
}
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    UserSoftware = 0,
    SupervisorSoftware = 1,
    MachineSoftware = 3,
    UserTimer = 4,
    SupervisorTimer = 5,
    MachineTimer = 7,
    UserExternal = 8,
    SupervisorExternal = 9,
    MachineExternal = 11,
    CounterOverflow = 13,
}
impl Interrupt {
    pub const fn code(self) -> usize {
        self as usize
    }
    pub const fn name(self) -> &'static str {
        match self {
            Interrupt::UserSoftware => "User software interrupt",
            Interrupt::SupervisorSoftware => "Supervisor software interrupt",
            Interrupt::MachineSoftware => "Machine software interrupt",
            Interrupt::UserTimer => "User timer interrupt",
            Interrupt::SupervisorTimer => "Supervisor timer interrupt",
            Interrupt::MachineTimer => "Machine timer interrupt",
            Interrupt::UserExternal => "User external interrupt",
            Interrupt::SupervisorExternal => "Supervisor external interrupt",
            Interrupt::MachineExternal => "Machine external interrupt",
            Interrupt::CounterOverflow => "Counter overflow interrupt",
        }
    }
    /// External interrupts are the ones routed through the PLIC.
    pub const fn is_external(self) -> bool {
        matches!(self, Interrupt::SupervisorExternal | Interrupt::MachineExternal)
    }
}
impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const EXCEPTIONS: [Option<Exception>; 16] = [
    Some(Exception::InstructionAddressMisaligned),
    Some(Exception::InstructionAccessFault),
    Some(Exception::IllegalInstruction),
    Some(Exception::Breakpoint),
    Some(Exception::LoadAddressMisaligned),
    Some(Exception::LoadAccessFault),
    Some(Exception::StoreAddressMisaligned),
    Some(Exception::StoreAccessFault),
    Some(Exception::UserEnvironmentCall),
    Some(Exception::SupervisorEnvironmentCall),
    None,
    Some(Exception::MachineEnvironmentCall),
    Some(Exception::InstructionPageFault),
    Some(Exception::LoadPageFault),
    None,
    Some(Exception::StorePageFault),
];

const INTERRUPTS: [Option<Interrupt>; 14] = [
    Some(Interrupt::UserSoftware),
    Some(Interrupt::SupervisorSoftware),
    None,
    Some(Interrupt::MachineSoftware),
    Some(Interrupt::UserTimer),
    Some(Interrupt::SupervisorTimer),
    None,
    Some(Interrupt::MachineTimer),
    Some(Interrupt::UserExternal),
    Some(Interrupt::SupervisorExternal),
    None,
    Some(Interrupt::MachineExternal),
    None,
    Some(Interrupt::CounterOverflow),
];
