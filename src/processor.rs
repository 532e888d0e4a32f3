use std::convert::TryFrom;

use crate::console::Console;
use crate::memory::{Byte, Cell, Firmware, Memory, FIRMWARE_SIZE, MEMORY_SIZE};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;
use thiserror::Error;

/// Processor with the default memory and firmware sizes
pub type StdProcessor = Processor<MEMORY_SIZE, FIRMWARE_SIZE>;

/// Reasons execution stops before a regular halt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// A memory instruction addressed a cell past the end of the bank.
    /// The processor is halted when this is returned.
    #[error("operand 0x{address:02X} of the instruction at offset 0x{offset:02X} is outside the {size}-cell memory bank")]
    Addressing {
        address: Byte,
        offset: Byte,
        size: usize,
    },
    /// [`Processor::run_limited`] ran out of steps
    #[error("program did not halt within {limit} instructions (stopped at offset 0x{offset:02X})")]
    StepLimit { limit: u64, offset: Byte },
}

/// Emulates the accumulator CPU.
///
/// `M` is the number of memory cells, `F` the number of firmware bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Processor<const M: usize, const F: usize> {
    /// Accumulator
    acc: Cell,
    /// Program counter, offset of the next opcode in the firmware
    pc: Byte,
    /// Termination flag. Never cleared once set
    halted: bool,
    /// Number of decoded instructions
    steps: u64,
    memory: Memory<M>,
    firmware: Firmware<F>,
}

impl<const M: usize, const F: usize> Processor<M, F> {
    const ADDRESSABLE: () = assert!(
        F >= 2 && F <= Byte::MAX as usize + 1,
        "firmware must fit an 8-bit program counter"
    );

    /// Initializes a new CPU with a cleared accumulator
    pub fn new(memory: Memory<M>, firmware: Firmware<F>) -> Self {
        Self::with_accumulator(memory, firmware, 0)
    }

    /// Initializes a new CPU with a preset accumulator
    pub fn with_accumulator(memory: Memory<M>, firmware: Firmware<F>, acc: Cell) -> Self {
        let () = Self::ADDRESSABLE;

        Self {
            acc,
            pc: 0,
            halted: false,
            steps: 0,
            memory,
            firmware,
        }
    }

    pub fn accumulator(&self) -> Cell {
        self.acc
    }

    pub fn program_counter(&self) -> Byte {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of instructions decoded so far, including unknown ones
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn memory(&self) -> &Memory<M> {
        &self.memory
    }

    pub fn firmware(&self) -> &Firmware<F> {
        &self.firmware
    }

    /// Gives the memory bank back to the caller
    pub fn into_memory(self) -> Memory<M> {
        self.memory
    }

    /// Runs one fetch-decode-execute cycle.
    ///
    /// Halts without fetching once fewer than three bytes remain past the
    /// program counter. Does nothing when already halted. Unknown opcodes
    /// consume their operand and are otherwise skipped.
    pub fn step<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<(), Fault> {
        if self.halted {
            return Ok(());
        }

        let offset = self.pc;
        if self.at_end() {
            self.halted = true;
            debug!("End of firmware at offset 0x{:02X}", offset);
            return Ok(());
        }

        let opcode = self.fetch();
        let operand = self.fetch();
        self.steps += 1;

        match Instruction::try_from(opcode) {
            Ok(instruction) => self.execute_instruction(instruction, operand, offset, console),
            Err(_) => {
                debug!("0x{:02X}: unknown opcode 0x{:02X}, skipped", offset, opcode);
                Ok(())
            }
        }
    }

    /// Executes a single decoded instruction
    fn execute_instruction<C: Console + ?Sized>(
        &mut self,
        instruction: Instruction,
        operand: Byte,
        offset: Byte,
        console: &mut C,
    ) -> Result<(), Fault> {
        match instruction {
            Instruction::AND => {
                let value = self.load(operand, offset)?;
                self.acc &= value;
            }
            Instruction::OR => {
                let value = self.load(operand, offset)?;
                self.acc |= value;
            }
            Instruction::XOR => {
                let value = self.load(operand, offset)?;
                self.acc ^= value;
            }
            Instruction::NOT => {
                self.acc = !self.acc;
            }
            Instruction::LDA => {
                self.acc = self.load(operand, offset)?;
            }
            Instruction::STA => {
                self.store(operand, offset)?;
            }
            Instruction::HLT => {
                self.halted = true;
                console.halt(offset);
            }
            Instruction::TST => {
                // zeroes on equality, there are no flags
                let value = self.load(operand, offset)?;
                if self.acc == value {
                    self.acc = 0;
                }
            }
            Instruction::JPZ => {
                if self.acc == 0 {
                    self.jump(operand);
                }
            }
            Instruction::ADD => {
                let value = self.load(operand, offset)?;
                self.acc = self.acc.wrapping_add(value);
            }
            Instruction::OUT => {
                console.out(self.acc);
            }
            Instruction::JMP => {
                self.jump(operand);
            }
        }

        debug!(
            "0x{:02X}: {} 0x{:02X} -> acc {}",
            offset, instruction, operand, self.acc
        );

        Ok(())
    }

    /// Run program until a termination condition is met
    pub fn run<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<(), Fault> {
        while !self.halted {
            self.step(console)?;
        }

        info!(
            "Program terminated after {} instructions. Accumulator: 0x{:02X} / {}",
            self.steps, self.acc as Byte, self.acc
        );

        Ok(())
    }

    /// Like [`Processor::run`], but gives up after `max_steps` instructions.
    ///
    /// Returns the number of instructions executed by this call.
    pub fn run_limited<C: Console + ?Sized>(
        &mut self,
        max_steps: u64,
        console: &mut C,
    ) -> Result<u64, Fault> {
        let start = self.steps;

        while !self.halted {
            if self.steps - start >= max_steps && !self.at_end() {
                return Err(Fault::StepLimit {
                    limit: max_steps,
                    offset: self.pc,
                });
            }
            self.step(console)?;
        }

        info!("Program terminated after {} instructions", self.steps - start);

        Ok(self.steps - start)
    }

    /// Fewer than three bytes left past the program counter
    fn at_end(&self) -> bool {
        self.pc as usize + 2 >= F
    }

    /// Targets past the firmware halt, leaving `pc` on the following pair
    fn jump(&mut self, target: Byte) {
        if target as usize >= F {
            self.halted = true;
            debug!("Jump target 0x{:02X} is past the end of firmware", target);
        } else {
            self.pc = target;
        }
    }

    fn fetch(&mut self) -> Byte {
        let byte = self.firmware.data[self.pc as usize];
        self.pc += 1;
        byte
    }

    fn load(&mut self, address: Byte, offset: Byte) -> Result<Cell, Fault> {
        match self.memory.read_cell(address) {
            Some(value) => Ok(value),
            None => Err(self.fault(address, offset)),
        }
    }

    fn store(&mut self, address: Byte, offset: Byte) -> Result<(), Fault> {
        let acc = self.acc;
        if let Some(cell) = self.memory.cell_mut(address) {
            *cell = acc;
            return Ok(());
        }
        Err(self.fault(address, offset))
    }

    fn fault(&mut self, address: Byte, offset: Byte) -> Fault {
        self.halted = true;
        let fault = Fault::Addressing {
            address,
            offset,
            size: M,
        };
        error!("{}", fault);
        fault
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// Defines the instructions.
        /// Every instruction is an opcode byte followed by an operand byte
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    }
}

instructions! {
    /// Bitwise and of the accumulator with a memory cell
    /// @param address The cell to read
    AND = 0x01,
    /// Bitwise or of the accumulator with a memory cell
    /// @param address The cell to read
    OR = 0x02,
    /// Bitwise exclusive or of the accumulator with a memory cell
    /// @param address The cell to read
    XOR = 0x03,
    /// Complements the accumulator, operand ignored
    NOT = 0x04,
    /// Loads a memory cell into the accumulator
    /// @param address The cell to read
    LDA = 0x05,
    /// Stores the accumulator into a memory cell
    /// @param address The cell to write
    STA = 0x06,
    /// Stop the execution of the program, operand ignored
    HLT = 0x07,
    /// Clears the accumulator if it equals a memory cell
    /// @param address The cell to compare with
    TST = 0x08,
    /// Jump if the accumulator is zero
    /// @param offset The firmware offset to jump to
    JPZ = 0x09,
    /// Wrapping add of a memory cell to the accumulator
    /// @param address The cell to read
    ADD = 0x0A,
    /// Prints the accumulator, operand ignored
    OUT = 0x0B,
    /// Jump to a firmware offset
    /// @param offset The firmware offset to jump to
    JMP = 0x0C,
}

impl Instruction {
    /// Older name of [`Instruction::TST`]
    pub const CMP: Self = Self::TST;
}
