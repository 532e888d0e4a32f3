//! Output side channel for `HLT` and `OUT`.

use std::io::{self, Write};

use log::warn;

use crate::memory::{Byte, Cell};

/// Receives the diagnostics the instruction set emits
pub trait Console {
    /// `HLT` executed; `offset` is where its opcode sits in the firmware
    fn halt(&mut self, offset: Byte);

    /// `OUT` executed with the accumulator holding `value`
    fn out(&mut self, value: Cell);
}

impl<C: Console + ?Sized> Console for &mut C {
    fn halt(&mut self, offset: Byte) {
        (**self).halt(offset)
    }

    fn out(&mut self, value: Cell) {
        (**self).out(value)
    }
}

/// Writes one line per diagnostic to any [`Write`] stream
#[derive(Debug)]
pub struct WriteConsole<W: Write> {
    inner: W,
}

impl WriteConsole<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WriteConsole<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.inner, "{}", args) {
            warn!("console write failed: {}", err);
        }
    }
}

impl<W: Write> Console for WriteConsole<W> {
    fn halt(&mut self, offset: Byte) {
        self.line(format_args!("halted at offset 0x{:02x}", offset));
    }

    fn out(&mut self, value: Cell) {
        self.line(format_args!("OUT: {}", value));
    }
}

/// A diagnostic captured by [`Recorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Halt(Byte),
    Out(Cell),
}

/// Keeps every diagnostic in memory, for running headless
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Console for Recorder {
    fn halt(&mut self, offset: Byte) {
        self.events.push(Event::Halt(offset));
    }

    fn out(&mut self, value: Cell) {
        self.events.push(Event::Out(value));
    }
}
