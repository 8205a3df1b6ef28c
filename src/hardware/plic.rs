//! The RISC-V Platform Level Interrupt Controller (PLIC).
//!
//! ```text
//! offset     block              unit
//! 0x000000   priority           one word per source
//! 0x001000   pending            one bit per source
//! 0x002000   enable             one bit per source, 0x80 bytes per context
//! 0x200000   threshold          one word, 0x1000 bytes per context
//! 0x200004   claim/complete     one word, 0x1000 bytes per context
//! ```
//!
//! A context is a (hart, privilege mode) pair. Reading a context's
//! claim/complete word claims the highest-priority pending source above the
//! context's threshold, and writing the same id back completes it. Until the
//! completion arrives the gateway will not forward that source again.

use super::mmio::{Mmio, Volatile};
use core::fmt;
use log::trace;

/// Number of interrupt sources the register map has room for.
pub const NUM_SOURCES: usize = 1024;
/// Registers are 32 bits wide.
pub const WORD_SIZE: usize = 4;
pub const WORD_BITS: usize = WORD_SIZE * 8;

/// Blocks with one word per source or per context.
pub const WORD_BLOCK_STRIDE: usize = NUM_SOURCES * WORD_SIZE;
/// Blocks with one bit per source.
pub const BIT_BLOCK_STRIDE: usize = NUM_SOURCES / WORD_BITS * WORD_SIZE;

pub const PRIORITY_OFFSET: usize = 0x0000;
pub const PENDING_OFFSET: usize = 0x1000;
pub const ENABLE_OFFSET: usize = 0x2000;
pub const ENABLE_STRIDE: usize = BIT_BLOCK_STRIDE;
pub const THRESHOLD_OFFSET: usize = 0x20_0000;
pub const THRESHOLD_STRIDE: usize = WORD_BLOCK_STRIDE;
pub const CLAIM_OFFSET: usize = 0x20_0004;
pub const CLAIM_STRIDE: usize = WORD_BLOCK_STRIDE;

/// Privilege mode half of a PLIC context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Machine = 0,
    Supervisor = 1,
}

/// A hart and privilege mode, addressed as one PLIC context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlicContext {
    pub hart: usize,
    pub mode: Mode,
}
impl PlicContext {
    pub const fn new(hart: usize, mode: Mode) -> PlicContext {
        PlicContext { hart, mode }
    }
    pub const fn machine(hart: usize) -> PlicContext {
        PlicContext::new(hart, Mode::Machine)
    }
    pub const fn supervisor(hart: usize) -> PlicContext {
        PlicContext::new(hart, Mode::Supervisor)
    }
    pub const fn index(self) -> usize {
        context_index(self.hart, self.mode)
    }
}

/// Machine and supervisor contexts interleave per hart.
pub const fn context_index(hart: usize, mode: Mode) -> usize {
    (hart << 1) | mode as usize
}

/// Where one register block lives and how far apart its units are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterBlock {
    pub offset: usize,
    pub stride: usize,
}
impl RegisterBlock {
    pub const fn new(offset: usize, stride: usize) -> RegisterBlock {
        RegisterBlock { offset, stride }
    }
    pub const fn unit(&self, base: usize, index: usize) -> usize {
        base + self.offset + index * self.stride
    }
}

/// Offsets and strides of the five PLIC register blocks.
///
/// Priority and pending are indexed by source (pending per word of 32
/// sources); enable, threshold and claim/complete are indexed by context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlicLayout {
    pub priority: RegisterBlock,
    pub pending: RegisterBlock,
    pub enable: RegisterBlock,
    pub threshold: RegisterBlock,
    pub claim_complete: RegisterBlock,
}
impl PlicLayout {
    pub const STANDARD: PlicLayout = PlicLayout {
        priority: RegisterBlock::new(PRIORITY_OFFSET, WORD_SIZE),
        pending: RegisterBlock::new(PENDING_OFFSET, WORD_SIZE),
        enable: RegisterBlock::new(ENABLE_OFFSET, ENABLE_STRIDE),
        threshold: RegisterBlock::new(THRESHOLD_OFFSET, THRESHOLD_STRIDE),
        claim_complete: RegisterBlock::new(CLAIM_OFFSET, CLAIM_STRIDE),
    };

    pub const fn priority_address(&self, base: usize, source: usize) -> usize {
        self.priority.unit(base, source)
    }
    pub const fn pending_bit_address(&self, base: usize, source: usize) -> (usize, u32) {
        (
            self.pending.unit(base, source / WORD_BITS),
            (source % WORD_BITS) as u32,
        )
    }
    pub const fn enable_bit_address(
        &self,
        base: usize,
        context: usize,
        source: usize,
    ) -> (usize, u32) {
        (
            self.enable.unit(base, context) + (source / WORD_BITS) * WORD_SIZE,
            (source % WORD_BITS) as u32,
        )
    }
    pub const fn threshold_address(&self, base: usize, context: usize) -> usize {
        self.threshold.unit(base, context)
    }
    pub const fn claim_complete_address(&self, base: usize, context: usize) -> usize {
        self.claim_complete.unit(base, context)
    }
}
impl Default for PlicLayout {
    fn default() -> PlicLayout {
        PlicLayout::STANDARD
    }
}

pub const fn priority_address(base: usize, source: usize) -> usize {
    PlicLayout::STANDARD.priority_address(base, source)
}
pub const fn pending_bit_address(base: usize, source: usize) -> (usize, u32) {
    PlicLayout::STANDARD.pending_bit_address(base, source)
}
pub const fn enable_bit_address(base: usize, context: usize, source: usize) -> (usize, u32) {
    PlicLayout::STANDARD.enable_bit_address(base, context, source)
}
pub const fn threshold_address(base: usize, context: usize) -> usize {
    PlicLayout::STANDARD.threshold_address(base, context)
}
/// Reads claim, writes complete.
pub const fn claim_complete_address(base: usize, context: usize) -> usize {
    PlicLayout::STANDARD.claim_complete_address(base, context)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlicError {
    /// Source 0 is reserved to mean "nothing pending".
    ReservedSource,
    /// There is no register for this source.
    SourceOutOfRange(usize),
    /// Priority 0 never interrupts.
    ZeroPriority(usize),
}
impl fmt::Display for PlicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlicError::ReservedSource => write!(f, "source 0 is reserved"),
            PlicError::SourceOutOfRange(source) => {
                write!(f, "source {} is beyond the last source {}", source, NUM_SOURCES - 1)
            }
            PlicError::ZeroPriority(source) => {
                write!(f, "source {} would be disabled by priority 0", source)
            }
        }
    }
}

pub fn check_source(source: usize) -> Result<usize, PlicError> {
    match source {
        0 => Err(PlicError::ReservedSource),
        s if s >= NUM_SOURCES => Err(PlicError::SourceOutOfRange(s)),
        s => Ok(s),
    }
}

pub struct Plic<B: Mmio = Volatile> {
    base_address: usize,
    layout: PlicLayout,
    bus: B,
}
impl Plic<Volatile> {
    /// # Safety
    ///
    /// `base_address` must be where a PLIC with the standard layout is mapped.
    pub const unsafe fn new(base_address: usize) -> Plic {
        Plic::with_bus(base_address, Volatile::new())
    }
}
impl<B: Mmio> Plic<B> {
    pub const fn with_bus(base_address: usize, bus: B) -> Plic<B> {
        Plic {
            base_address,
            layout: PlicLayout::STANDARD,
            bus,
        }
    }
    pub fn base_address(&self) -> usize {
        self.base_address
    }
    pub fn layout(&self) -> &PlicLayout {
        &self.layout
    }

    /// Set a source's priority. Priority 0 disables the source.
    pub fn set_priority(&self, source: usize, priority: u32) -> Result<(), PlicError> {
        let source = check_source(source)?;
        let addr = self.layout.priority_address(self.base_address, source);
        self.bus.write_u32(addr, priority);
        trace!("plic: priority[{}] @ {:#x} = {}", source, addr, priority);
        Ok(())
    }
    pub fn priority(&self, source: usize) -> Result<u32, PlicError> {
        let source = check_source(source)?;
        Ok(self
            .bus
            .read_u32(self.layout.priority_address(self.base_address, source)))
    }
    pub fn is_pending(&self, source: usize) -> Result<bool, PlicError> {
        let source = check_source(source)?;
        let (addr, bit) = self.layout.pending_bit_address(self.base_address, source);
        Ok(self.bus.read_u32(addr) & (1 << bit) != 0)
    }

    /// Let `source` interrupt `context`.
    pub fn enable(&self, context: PlicContext, source: usize) -> Result<(), PlicError> {
        let source = check_source(source)?;
        let (addr, bit) = self
            .layout
            .enable_bit_address(self.base_address, context.index(), source);
        let word = self.bus.read_u32(addr) | (1 << bit);
        self.bus.write_u32(addr, word);
        trace!("plic: enable[{}] @ {:#x} bit {}", context.index(), addr, bit);
        Ok(())
    }
    pub fn disable(&self, context: PlicContext, source: usize) -> Result<(), PlicError> {
        let source = check_source(source)?;
        let (addr, bit) = self
            .layout
            .enable_bit_address(self.base_address, context.index(), source);
        let word = self.bus.read_u32(addr) & !(1 << bit);
        self.bus.write_u32(addr, word);
        Ok(())
    }
    pub fn is_enabled(&self, context: PlicContext, source: usize) -> Result<bool, PlicError> {
        let source = check_source(source)?;
        let (addr, bit) = self
            .layout
            .enable_bit_address(self.base_address, context.index(), source);
        Ok(self.bus.read_u32(addr) & (1 << bit) != 0)
    }

    /// Only sources with a priority above the threshold interrupt `context`.
    pub fn set_threshold(&self, context: PlicContext, threshold: u32) {
        let addr = self
            .layout
            .threshold_address(self.base_address, context.index());
        self.bus.write_u32(addr, threshold);
        trace!("plic: threshold[{}] @ {:#x} = {}", context.index(), addr, threshold);
    }
    pub fn threshold(&self, context: PlicContext) -> u32 {
        self.bus.read_u32(
            self.layout
                .threshold_address(self.base_address, context.index()),
        )
    }

    /// Give `source` a non-zero priority and enable it for `context`.
    pub fn enable_source(
        &self,
        context: PlicContext,
        source: usize,
        priority: u32,
    ) -> Result<(), PlicError> {
        let source = check_source(source)?;
        if priority == 0 {
            return Err(PlicError::ZeroPriority(source));
        }
        self.set_priority(source, priority)?;
        self.enable(context, source)
    }
    /// Enable every `(source, priority)` pair for `context`, then set its threshold.
    pub fn configure(
        &self,
        context: PlicContext,
        sources: &[(usize, u32)],
        threshold: u32,
    ) -> Result<(), PlicError> {
        for &(source, priority) in sources {
            self.enable_source(context, source, priority)?;
        }
        self.set_threshold(context, threshold);
        Ok(())
    }

    /// Ask the PLIC which source `context` should serve.
    ///
    /// Returns `None` when nothing is pending. The returned guard writes the
    /// completion when it is completed or dropped.
    pub fn claim(&self, context: PlicContext) -> Option<Claim<'_, B>> {
        let addr = self
            .layout
            .claim_complete_address(self.base_address, context.index());
        match self.bus.read_u32(addr) {
            0 => None,
            source => Some(Claim {
                plic: self,
                context,
                source,
            }),
        }
    }
    /// Tell the PLIC `context` has served `source`.
    ///
    /// `source` has to be the id the matching claim returned. Prefer
    /// [`Claim::complete`], which cannot get that wrong.
    pub fn complete(&self, context: PlicContext, source: u32) {
        let addr = self
            .layout
            .claim_complete_address(self.base_address, context.index());
        self.bus.write_u32(addr, source);
    }
}

/// A claimed interrupt that has not been completed yet.
#[must_use = "dropping a claim completes it immediately"]
pub struct Claim<'p, B: Mmio> {
    plic: &'p Plic<B>,
    context: PlicContext,
    source: u32,
}
impl<'p, B: Mmio> Claim<'p, B> {
    pub fn source(&self) -> u32 {
        self.source
    }
    pub fn context(&self) -> PlicContext {
        self.context
    }
    /// Write the claimed id back, allowing the source to interrupt again.
    pub fn complete(self) {
        // Drop does the write.
    }
}
impl<'p, B: Mmio> Drop for Claim<'p, B> {
    fn drop(&mut self) {
        self.plic.complete(self.context, self.source);
    }
}
impl<'p, B: Mmio> fmt::Debug for Claim<'p, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claim")
            .field("context", &self.context)
            .field("source", &self.source)
            .finish()
    }
}
