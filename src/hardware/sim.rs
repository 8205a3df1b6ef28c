//! Simulated devices and CSRs for host tests.
//!
//! The models are deliberately strict: anything a real device would punish
//! (writing the transmitter while it is busy, completing an id that was never
//! claimed) is recorded as a violation for the test to inspect.

use super::mmio::Mmio;
use super::plic::{
    CLAIM_OFFSET, ENABLE_OFFSET, ENABLE_STRIDE, NUM_SOURCES, PENDING_OFFSET, PRIORITY_OFFSET,
    THRESHOLD_OFFSET, THRESHOLD_STRIDE, WORD_BITS, WORD_SIZE,
};
use super::uart::Register;
use crate::arch::csr::{Csr, CsrAccess};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};

const WORDS: usize = NUM_SOURCES / WORD_BITS;

struct PlicState {
    priority: Vec<u32>,
    pending: Vec<u32>,
    enable: HashMap<usize, Vec<u32>>,
    threshold: HashMap<usize, u32>,
    /// Claimed source -> context that claimed it.
    in_flight: HashMap<usize, usize>,
    violations: Vec<String>,
}
impl PlicState {
    fn is_pending(&self, source: usize) -> bool {
        self.pending[source / WORD_BITS] & (1 << (source % WORD_BITS)) != 0
    }
    fn set_pending(&mut self, source: usize, pending: bool) {
        let bit = 1 << (source % WORD_BITS);
        if pending {
            self.pending[source / WORD_BITS] |= bit;
        } else {
            self.pending[source / WORD_BITS] &= !bit;
        }
    }
    fn is_enabled(&self, context: usize, source: usize) -> bool {
        self.enable
            .get(&context)
            .map(|words| words[source / WORD_BITS] & (1 << (source % WORD_BITS)) != 0)
            .unwrap_or(false)
    }
    fn claim(&mut self, context: usize) -> u32 {
        let threshold = self.threshold.get(&context).copied().unwrap_or(0);
        let mut winner: Option<(usize, u32)> = None;
        for source in 1..NUM_SOURCES {
            if !self.is_pending(source)
                || self.in_flight.contains_key(&source)
                || !self.is_enabled(context, source)
            {
                continue;
            }
            let priority = self.priority[source];
            if priority <= threshold {
                continue;
            }
            // Ties go to the lowest id, which is the first one seen.
            if winner.map_or(true, |(_, best)| priority > best) {
                winner = Some((source, priority));
            }
        }
        match winner {
            Some((source, _)) => {
                self.set_pending(source, false);
                self.in_flight.insert(source, context);
                source as u32
            }
            None => 0,
        }
    }
    fn complete(&mut self, context: usize, source: u32) {
        let source = source as usize;
        match self.in_flight.get(&source) {
            Some(&owner) if owner == context => {
                self.in_flight.remove(&source);
            }
            _ => {
                let outstanding: Vec<usize> = self
                    .in_flight
                    .iter()
                    .filter(|(_, owner)| **owner == context)
                    .map(|(source, _)| *source)
                    .collect();
                self.violations.push(format!(
                    "context {} completed {} while holding {:?}",
                    context, source, outstanding
                ));
            }
        }
    }
}

/// A PLIC with level-triggered or edge-style sources.
pub struct SimPlic<'a> {
    base: usize,
    state: RefCell<PlicState>,
    lines: RefCell<Vec<(usize, Box<dyn Fn() -> bool + 'a>)>>,
}
impl<'a> SimPlic<'a> {
    pub fn new(base: usize) -> SimPlic<'a> {
        SimPlic {
            base,
            state: RefCell::new(PlicState {
                priority: vec![0; NUM_SOURCES],
                pending: vec![0; WORDS],
                enable: HashMap::new(),
                threshold: HashMap::new(),
                in_flight: HashMap::new(),
                violations: Vec::new(),
            }),
            lines: RefCell::new(Vec::new()),
        }
    }
    /// Latch `source` as pending, as an edge would.
    pub fn raise(&self, source: usize) {
        self.state.borrow_mut().set_pending(source, true);
    }
    /// Wire `source` to a level-triggered interrupt line.
    pub fn connect(&self, source: usize, line: impl Fn() -> bool + 'a) {
        self.lines.borrow_mut().push((source, Box::new(line)));
    }
    pub fn violations(&self) -> Vec<String> {
        self.state.borrow().violations.clone()
    }
    pub fn in_flight(&self) -> Vec<usize> {
        let mut sources: Vec<usize> = self.state.borrow().in_flight.keys().copied().collect();
        sources.sort_unstable();
        sources
    }
    /// The gateway samples level lines for every source not in flight.
    fn sample_lines(&self) {
        let lines = self.lines.borrow();
        let mut state = self.state.borrow_mut();
        for (source, line) in lines.iter() {
            if !state.in_flight.contains_key(source) && line() {
                state.set_pending(*source, true);
            }
        }
    }
    fn offset(&self, addr: usize) -> usize {
        assert!(addr >= self.base, "address {:#x} below the PLIC", addr);
        assert_eq!(addr % WORD_SIZE, 0, "unaligned PLIC access at {:#x}", addr);
        addr - self.base
    }
}
impl<'a> Mmio for SimPlic<'a> {
    fn read_u8(&self, addr: usize) -> u8 {
        panic!("byte read from PLIC at {:#x}", addr)
    }
    fn write_u8(&self, addr: usize, _value: u8) {
        panic!("byte write to PLIC at {:#x}", addr)
    }
    fn read_u32(&self, addr: usize) -> u32 {
        let offset = self.offset(addr);
        if offset >= THRESHOLD_OFFSET {
            let context = (offset - THRESHOLD_OFFSET) / THRESHOLD_STRIDE;
            if offset == CLAIM_OFFSET + context * THRESHOLD_STRIDE {
                self.sample_lines();
                return self.state.borrow_mut().claim(context);
            }
            return self.state.borrow().threshold.get(&context).copied().unwrap_or(0);
        }
        if offset >= ENABLE_OFFSET {
            let context = (offset - ENABLE_OFFSET) / ENABLE_STRIDE;
            let word = (offset - ENABLE_OFFSET) % ENABLE_STRIDE / WORD_SIZE;
            return self
                .state
                .borrow()
                .enable
                .get(&context)
                .map(|words| words[word])
                .unwrap_or(0);
        }
        if offset >= PENDING_OFFSET {
            self.sample_lines();
            return self.state.borrow().pending[(offset - PENDING_OFFSET) / WORD_SIZE];
        }
        self.state.borrow().priority[(offset - PRIORITY_OFFSET) / WORD_SIZE]
    }
    fn write_u32(&self, addr: usize, value: u32) {
        let offset = self.offset(addr);
        let mut state = self.state.borrow_mut();
        if offset >= THRESHOLD_OFFSET {
            let context = (offset - THRESHOLD_OFFSET) / THRESHOLD_STRIDE;
            if offset == CLAIM_OFFSET + context * THRESHOLD_STRIDE {
                state.complete(context, value);
            } else {
                state.threshold.insert(context, value);
            }
        } else if offset >= ENABLE_OFFSET {
            let context = (offset - ENABLE_OFFSET) / ENABLE_STRIDE;
            let word = (offset - ENABLE_OFFSET) % ENABLE_STRIDE / WORD_SIZE;
            state.enable.entry(context).or_insert_with(|| vec![0; WORDS])[word] = value;
        } else if offset >= PENDING_OFFSET {
            panic!("pending bits are read-only");
        } else {
            state.priority[(offset - PRIORITY_OFFSET) / WORD_SIZE] = value;
        }
    }
}

#[derive(Default)]
struct UartState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    ier: u8,
    lcr: u8,
    mcr: u8,
    scratch: u8,
    divisor: u16,
    fifo_enabled: bool,
    fcr_writes: Vec<u8>,
    /// Status reads left before the transmitter is free again.
    tx_busy: u32,
    /// The last status read showed the holding register empty.
    cleared_to_send: bool,
    /// The last status read showed data ready.
    cleared_to_read: bool,
    lsr_reads: usize,
    violations: Vec<String>,
}

/// A 16550 with a transmitter that stays busy for a few status polls.
pub struct SimUart {
    base: usize,
    reg_shift: u32,
    tx_latency: Cell<u32>,
    state: RefCell<UartState>,
}
impl SimUart {
    pub fn new(base: usize, reg_shift: u32) -> SimUart {
        SimUart {
            base,
            reg_shift,
            tx_latency: Cell::new(0),
            state: RefCell::new(UartState::default()),
        }
    }
    pub fn with_tx_latency(self, polls: u32) -> SimUart {
        self.tx_latency.set(polls);
        self
    }
    /// Bytes arriving on the wire.
    pub fn receive(&self, bytes: &[u8]) {
        self.state.borrow_mut().rx.extend(bytes.iter().copied());
    }
    pub fn transmitted(&self) -> Vec<u8> {
        self.state.borrow().tx.clone()
    }
    pub fn pending_input(&self) -> usize {
        self.state.borrow().rx.len()
    }
    pub fn violations(&self) -> Vec<String> {
        self.state.borrow().violations.clone()
    }
    pub fn line_status_reads(&self) -> usize {
        self.state.borrow().lsr_reads
    }
    pub fn divisor(&self) -> u16 {
        self.state.borrow().divisor
    }
    pub fn fifo_control_writes(&self) -> Vec<u8> {
        self.state.borrow().fcr_writes.clone()
    }
    /// The level of the UART's interrupt output.
    pub fn irq_line(&self) -> bool {
        let state = self.state.borrow();
        let rx = state.ier & 0x01 != 0 && !state.rx.is_empty();
        let tx = state.ier & 0x02 != 0 && state.tx_busy == 0;
        rx || tx
    }
    /// Read a register's stored value without side effects.
    pub fn peek(&self, register: Register) -> u8 {
        let state = self.state.borrow();
        match register {
            Register::InterruptEnable => state.ier,
            Register::LineControl => state.lcr,
            Register::ModemControl => state.mcr,
            Register::Scratch => state.scratch,
            other => panic!("{:?} has no stored value", other),
        }
    }
    pub fn poke(&self, register: Register, value: u8) {
        let mut state = self.state.borrow_mut();
        match register {
            Register::InterruptEnable => state.ier = value,
            Register::LineControl => state.lcr = value,
            other => panic!("{:?} cannot be poked", other),
        }
    }
    fn index(&self, addr: usize) -> usize {
        assert!(addr >= self.base, "address {:#x} below the UART", addr);
        let offset = addr - self.base;
        assert_eq!(offset % (1 << self.reg_shift), 0, "misaligned UART register {:#x}", addr);
        let index = offset >> self.reg_shift;
        assert!(index < 8, "address {:#x} beyond the UART", addr);
        index
    }
}
impl UartState {
    fn dlab(&self) -> bool {
        self.lcr & 0x80 != 0
    }
    fn line_status(&mut self) -> u8 {
        self.lsr_reads += 1;
        let mut lsr = 0;
        if !self.rx.is_empty() {
            lsr |= 0x01;
        }
        if self.tx_busy == 0 {
            lsr |= 0x20 | 0x40;
        } else {
            self.tx_busy -= 1;
        }
        self.cleared_to_send = lsr & 0x20 != 0;
        self.cleared_to_read = lsr & 0x01 != 0;
        lsr
    }
    fn identification(&self) -> u8 {
        let fifo = if self.fifo_enabled { 0xc0 } else { 0x00 };
        let id = if self.ier & 0x01 != 0 && !self.rx.is_empty() {
            0b010 << 1
        } else if self.ier & 0x02 != 0 && self.tx_busy == 0 {
            0b001 << 1
        } else {
            0x01
        };
        fifo | id
    }
}
impl Mmio for SimUart {
    fn read_u8(&self, addr: usize) -> u8 {
        let index = self.index(addr);
        let mut state = self.state.borrow_mut();
        match index {
            0 if state.dlab() => state.divisor.to_le_bytes()[0],
            0 => {
                if !state.cleared_to_read {
                    state.violations.push("receive buffer read without data ready".into());
                }
                state.cleared_to_read = false;
                state.rx.pop_front().unwrap_or(0)
            }
            1 if state.dlab() => state.divisor.to_le_bytes()[1],
            1 => state.ier,
            2 => state.identification(),
            3 => state.lcr,
            4 => state.mcr,
            5 => state.line_status(),
            6 => 0,
            _ => state.scratch,
        }
    }
    fn write_u8(&self, addr: usize, value: u8) {
        let index = self.index(addr);
        let mut state = self.state.borrow_mut();
        match index {
            0 if state.dlab() => {
                let [_, high] = state.divisor.to_le_bytes();
                state.divisor = u16::from_le_bytes([value, high]);
            }
            0 => {
                if !state.cleared_to_send {
                    state
                        .violations
                        .push(format!("wrote {:#04x} while the transmitter was busy", value));
                }
                state.cleared_to_send = false;
                state.tx.push(value);
                state.tx_busy = self.tx_latency.get();
            }
            1 if state.dlab() => {
                let [low, _] = state.divisor.to_le_bytes();
                state.divisor = u16::from_le_bytes([low, value]);
            }
            1 => state.ier = value,
            2 => {
                state.fcr_writes.push(value);
                state.fifo_enabled = value & 0x01 != 0;
                if value & 0x02 != 0 {
                    state.rx.clear();
                }
            }
            3 => state.lcr = value,
            4 => state.mcr = value,
            5 | 6 => state.violations.push(format!("write to read-only register {}", index)),
            _ => state.scratch = value,
        }
    }
    fn read_u32(&self, addr: usize) -> u32 {
        panic!("word read from UART at {:#x}", addr)
    }
    fn write_u32(&self, addr: usize, _value: u32) {
        panic!("word write to UART at {:#x}", addr)
    }
}

/// One CSR operation, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrOp {
    Read(Csr),
    Write(Csr, usize),
    Set(Csr, usize),
    Clear(Csr, usize),
}
impl CsrOp {
    pub fn csr(&self) -> Csr {
        match *self {
            CsrOp::Read(csr)
            | CsrOp::Write(csr, _)
            | CsrOp::Set(csr, _)
            | CsrOp::Clear(csr, _) => csr,
        }
    }
}

/// A CSR file that remembers every access.
#[derive(Default)]
pub struct SimCsrs {
    values: RefCell<BTreeMap<Csr, usize>>,
    log: RefCell<Vec<CsrOp>>,
}
impl SimCsrs {
    pub fn new() -> SimCsrs {
        SimCsrs::default()
    }
    pub fn with(self, csr: Csr, value: usize) -> SimCsrs {
        self.values.borrow_mut().insert(csr, value);
        self
    }
    pub fn value(&self, csr: Csr) -> usize {
        self.values.borrow().get(&csr).copied().unwrap_or(0)
    }
    pub fn log(&self) -> Vec<CsrOp> {
        self.log.borrow().clone()
    }
    /// Modifying operations only.
    pub fn writes(&self) -> Vec<CsrOp> {
        self.log
            .borrow()
            .iter()
            .copied()
            .filter(|op| !matches!(op, CsrOp::Read(_)))
            .collect()
    }
    /// Position of the first modifying operation on `csr`.
    pub fn first_write(&self, csr: Csr) -> Option<usize> {
        self.writes().iter().position(|op| op.csr() == csr)
    }
    fn store(&self, csr: Csr, value: usize) {
        if !csr.is_read_only() {
            self.values.borrow_mut().insert(csr, value);
        }
    }
}
impl CsrAccess for SimCsrs {
    fn read(&self, csr: Csr) -> usize {
        self.log.borrow_mut().push(CsrOp::Read(csr));
        self.value(csr)
    }
    fn write(&self, csr: Csr, value: usize) {
        self.log.borrow_mut().push(CsrOp::Write(csr, value));
        self.store(csr, value);
    }
    fn set_bits(&self, csr: Csr, mask: usize) {
        self.log.borrow_mut().push(CsrOp::Set(csr, mask));
        self.store(csr, self.value(csr) | mask);
    }
    fn clear_bits(&self, csr: Csr, mask: usize) {
        self.log.borrow_mut().push(CsrOp::Clear(csr, mask));
        self.store(csr, self.value(csr) & !mask);
    }
}
