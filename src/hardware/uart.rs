//! Low-level driver routines for a 16550a UART.
//!
//! Every wait in here is a busy spin on the line status register with no
//! timeout: a device that never becomes ready hangs the caller. Timeouts are
//! the caller's business.

use super::mmio::{Mmio, Volatile};
use crate::console::sink::{ByteSink, SinkWriter};
use crate::trap::registry::IrqHandler;
use bitflags::bitflags;
use core::fmt::Write;

// The UART control registers.
// Some have different meanings for read vs write.
// See http://byterunner.com/16550.html
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    ReceiveBuffer,
    TransmitHolding,
    InterruptEnable,
    InterruptIdentification,
    FifoControl,
    LineControl,
    ModemControl,
    LineStatus,
    ModemStatus,
    Scratch,
    /// Divisor latch, low byte. Only visible while `LineControl::DLAB` is set.
    DivisorLow,
    /// Divisor latch, high byte. Only visible while `LineControl::DLAB` is set.
    DivisorHigh,
}
impl Register {
    /// Register index; multiply by the register stride for a byte offset.
    pub const fn index(&self) -> usize {
        match self {
            Register::ReceiveBuffer => 0,
            Register::TransmitHolding => 0,
            Register::DivisorLow => 0,
            Register::InterruptEnable => 1,
            Register::DivisorHigh => 1,
            Register::InterruptIdentification => 2,
            Register::FifoControl => 2,
            Register::LineControl => 3,
            Register::ModemControl => 4,
            Register::LineStatus => 5,
            Register::ModemStatus => 6,
            Register::Scratch => 7,
        }
    }
}

bitflags! {
    /// Interrupt Enable Register. Only the low nibble is defined.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InterruptEnable: u8 {
        const RX_AVAILABLE = 1 << 0;
        const TX_EMPTY = 1 << 1;
        const RX_LINE_STATUS = 1 << 2;
        const MODEM_STATUS = 1 << 3;
    }
}

bitflags! {
    /// Line Status Register.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LineStatus: u8 {
        /// Input is waiting in the receive buffer.
        const DATA_READY = 1 << 0;
        const OVERRUN_ERROR = 1 << 1;
        const PARITY_ERROR = 1 << 2;
        const FRAMING_ERROR = 1 << 3;
        const BREAK_INTERRUPT = 1 << 4;
        /// The transmit holding register can take another byte.
        const TX_HOLDING_EMPTY = 1 << 5;
        /// Holding register and shift register are both empty.
        const TX_EMPTY = 1 << 6;
        const RX_FIFO_ERROR = 1 << 7;

        const ERRORS = Self::OVERRUN_ERROR.bits()
            | Self::PARITY_ERROR.bits()
            | Self::FRAMING_ERROR.bits()
            | Self::RX_FIFO_ERROR.bits();
    }
}

bitflags! {
    /// FIFO Control Register (write only).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FifoControl: u8 {
        const ENABLE = 1 << 0;
        const CLEAR_RX = 1 << 1;
        const CLEAR_TX = 1 << 2;
        const DMA_MODE = 1 << 3;
        const FIFO64 = 1 << 5;
        const TRIGGER_8_BYTES = 0b10 << 6;
    }
}

bitflags! {
    /// Line Control Register.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LineControl: u8 {
        const WORD_LENGTH_8 = 0b11;
        const TWO_STOP_BITS = 1 << 2;
        const PARITY_ENABLE = 1 << 3;
        const EVEN_PARITY = 1 << 4;
        const STICK_PARITY = 1 << 5;
        const BREAK = 1 << 6;
        /// Divisor latch access, the special mode to set the baud rate.
        const DLAB = 1 << 7;
    }
}

/// Why the UART is interrupting, from bits 3:1 of the identification register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptId {
    ModemStatus,
    TxEmpty,
    RxAvailable,
    LineStatus,
    Timeout,
    Reserved(u8),
}
impl InterruptId {
    pub const fn from_iir(iir: u8) -> InterruptId {
        match (iir >> 1) & 0b111 {
            0b000 => InterruptId::ModemStatus,
            0b001 => InterruptId::TxEmpty,
            0b010 => InterruptId::RxAvailable,
            0b011 => InterruptId::LineStatus,
            0b110 => InterruptId::Timeout,
            other => InterruptId::Reserved(other),
        }
    }
    pub const fn name(&self) -> &'static str {
        match self {
            InterruptId::ModemStatus => "modem status",
            InterruptId::TxEmpty => "transmitter empty",
            InterruptId::RxAvailable => "received data available",
            InterruptId::LineStatus => "receiver line status",
            InterruptId::Timeout => "receive timeout",
            InterruptId::Reserved(_) => "reserved",
        }
    }
}

/// FIFO state, from bits 7:6 of the identification register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FifoState {
    NotAvailable,
    Reserved,
    Broken,
    Enabled,
}
impl FifoState {
    pub const fn from_iir(iir: u8) -> FifoState {
        match (iir >> 6) & 0b11 {
            0b00 => FifoState::NotAvailable,
            0b01 => FifoState::Reserved,
            0b10 => FifoState::Broken,
            _ => FifoState::Enabled,
        }
    }
}

/// Divisor for 38.4K baud from the usual 1.8432 MHz reference clock.
const DIVISOR_38400: u16 = 3;

pub struct Uart<B: Mmio = Volatile> {
    base_address: usize,
    /// log2 of the distance between registers, in bytes.
    reg_shift: u32,
    bus: B,
}
impl Uart<Volatile> {
    /// # Safety
    ///
    /// `base_address` must be where a 16550-compatible UART is mapped,
    /// with registers `1 << reg_shift` bytes apart.
    pub const unsafe fn new(base_address: usize, reg_shift: u32) -> Uart {
        Uart::with_bus(base_address, reg_shift, Volatile::new())
    }
}
impl<B: Mmio> Uart<B> {
    pub const fn with_bus(base_address: usize, reg_shift: u32, bus: B) -> Uart<B> {
        Uart {
            base_address,
            reg_shift,
            bus,
        }
    }
    pub fn base_address(&self) -> usize {
        self.base_address
    }
    fn address(&self, register: Register) -> usize {
        self.base_address + (register.index() << self.reg_shift)
    }
    fn read_register(&self, register: Register) -> u8 {
        self.bus.read_u8(self.address(register))
    }
    fn write_register(&self, register: Register, value: u8) {
        self.bus.write_u8(self.address(register), value)
    }

    /// Initialize the UART: 38.4K baud, 8 data bits, no parity, FIFOs on.
    ///
    /// Leaves every UART interrupt disabled.
    pub fn init(&self) {
        // Disable interrupts.
        self.write_register(Register::InterruptEnable, 0x00);
        // Special mode to set baud rate.
        self.write_register(Register::LineControl, LineControl::DLAB.bits());
        let [low, high] = DIVISOR_38400.to_le_bytes();
        self.write_register(Register::DivisorLow, low);
        self.write_register(Register::DivisorHigh, high);
        // Leave set-baud mode and set
        // word length to 8 bits, no parity.
        self.write_register(Register::LineControl, LineControl::WORD_LENGTH_8.bits());
        self.configure_fifo();
    }
    /// Enable both FIFOs and clear their contents.
    pub fn configure_fifo(&self) {
        let fcr = FifoControl::ENABLE | FifoControl::CLEAR_RX | FifoControl::CLEAR_TX;
        self.write_register(Register::FifoControl, fcr.bits());
    }

    pub fn line_status(&self) -> LineStatus {
        LineStatus::from_bits_retain(self.read_register(Register::LineStatus))
    }
    pub fn can_write_byte(&self) -> bool {
        self.line_status().contains(LineStatus::TX_HOLDING_EMPTY)
    }
    pub fn is_data_ready(&self) -> bool {
        self.line_status().contains(LineStatus::DATA_READY)
    }

    /// Send one byte once the holding register is free. No newline handling.
    pub fn write_raw_byte(&self, byte: u8) {
        while !self.can_write_byte() {
            core::hint::spin_loop();
        }
        self.write_register(Register::TransmitHolding, byte);
    }
    /// Send one byte, turning `\n` into `\r\n`.
    pub fn write_byte(&self, byte: u8) {
        if byte == b'\n' {
            self.write_raw_byte(b'\r');
        }
        self.write_raw_byte(byte);
    }
    pub fn write_slice(&self, bytes: &[u8]) {
        for b in bytes {
            self.write_byte(*b);
        }
    }
    pub fn writer(&self) -> SinkWriter<&Uart<B>> {
        SinkWriter(self)
    }
    /// Wait for a byte and return it, turning `\r` into `\n`.
    pub fn read_byte(&self) -> u8 {
        while !self.is_data_ready() {
            core::hint::spin_loop();
        }
        translate_input(self.read_register(Register::ReceiveBuffer))
    }
    /// Read one byte if one is waiting, turning `\r` into `\n`.
    pub fn try_read_byte(&self) -> Option<u8> {
        if self.is_data_ready() {
            Some(translate_input(self.read_register(Register::ReceiveBuffer)))
        } else {
            None
        }
    }
    /// Wait until the holding and shift registers have drained.
    pub fn flush(&self) {
        while !self.line_status().contains(LineStatus::TX_EMPTY) {
            core::hint::spin_loop();
        }
    }

    pub fn interrupt_enable(&self) -> InterruptEnable {
        InterruptEnable::from_bits_truncate(self.read_register(Register::InterruptEnable))
    }
    pub fn set_interrupt_enable(&self, mask: InterruptEnable) {
        let ier = self.read_register(Register::InterruptEnable) | (mask.bits() & 0x0f);
        self.write_register(Register::InterruptEnable, ier);
    }
    pub fn clear_interrupt_enable(&self, mask: InterruptEnable) {
        let ier = self.read_register(Register::InterruptEnable) & !(mask.bits() & 0x0f);
        self.write_register(Register::InterruptEnable, ier);
    }
    fn interrupt_identification(&self) -> u8 {
        self.read_register(Register::InterruptIdentification)
    }
    /// Bit 0 of the identification register is clear while an interrupt is pending.
    pub fn is_interrupt_pending(&self) -> bool {
        self.interrupt_identification() & 0x01 == 0
    }
    pub fn interrupt_id(&self) -> InterruptId {
        InterruptId::from_iir(self.interrupt_identification())
    }
    pub fn fifo_state(&self) -> FifoState {
        FifoState::from_iir(self.interrupt_identification())
    }
}

impl<B: Mmio> ByteSink for &Uart<B> {
    fn write(&mut self, byte: u8) {
        self.write_byte(byte);
    }
}

/// Echo everything that has arrived back to the sender.
///
/// Draining the receiver drops the UART's interrupt line, so the source can
/// be completed straight after.
impl<B: Mmio> IrqHandler for Uart<B> {
    fn handle(&self, source: u32, sink: &mut dyn ByteSink) {
        let errors = self.line_status() & LineStatus::ERRORS;
        if !errors.is_empty() {
            let _ = writeln!(
                SinkWriter(sink),
                "uart: source {} line errors {:#010b}",
                source,
                errors.bits()
            );
        }
        while let Some(byte) = self.try_read_byte() {
            self.write_byte(byte);
        }
    }
}

fn translate_input(byte: u8) -> u8 {
    if byte == b'\r' {
        b'\n'
    } else {
        byte
    }
}
