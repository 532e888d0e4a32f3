//! An accumulator CPU with a twelve-instruction set.
//!
//! A program image is loaded into a [`memory::Memory`] bank and a
//! [`memory::Firmware`] buffer, handed to a [`processor::Processor`] and run
//! until it halts. `HLT` and `OUT` report through a [`console::Console`].

pub mod console;
pub mod memory;
pub mod processor;
