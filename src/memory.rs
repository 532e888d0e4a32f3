use std::io::{self, Write};
use std::ops::Deref;

pub mod image;

pub type Byte = u8; // firmware byte, operand, program counter
pub type Cell = i8; // memory bank cell

/// Number of cells in the memory bank
pub const MEMORY_SIZE: usize = 16;
/// Number of bytes in the firmware buffer
pub const FIRMWARE_SIZE: usize = 256;

/// Default memory bank
pub type StdMem = Memory<MEMORY_SIZE>;
/// Default firmware buffer
pub type StdFirmware = Firmware<FIRMWARE_SIZE>;

/// Emulates the data memory bank addressed by instruction operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    pub data: [Cell; S],
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory
    fn default() -> Self {
        Memory { data: [0; S] }
    }
}

impl<const S: usize> From<[Cell; S]> for Memory<S> {
    fn from(data: [Cell; S]) -> Self {
        Memory { data }
    }
}

impl<const S: usize> Deref for Memory<S> {
    type Target = [Cell];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<const S: usize> Memory<S> {
    /// Reads a cell, `None` if `address` is past the end of the bank
    pub fn read_cell(&self, address: Byte) -> Option<Cell> {
        self.data.get(address as usize).copied()
    }

    /// Mutable access to a cell, `None` if `address` is past the end of the bank
    pub fn cell_mut(&mut self, address: Byte) -> Option<&mut Cell> {
        self.data.get_mut(address as usize)
    }

    /// Writes one `index = value` line per cell, both in hex.
    ///
    /// Values are shown as their two's-complement byte, so `-1` prints as `ff`.
    pub fn dump<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (index, cell) in self.data.iter().enumerate() {
            writeln!(out, "{:x} = {:x}", index, *cell as Byte)?;
        }
        Ok(())
    }
}

/// Read-only program buffer holding `(opcode, operand)` pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Firmware<const S: usize> {
    pub data: [Byte; S],
}

impl<const S: usize> Default for Firmware<S> {
    fn default() -> Self {
        Firmware { data: [0; S] }
    }
}

impl<const S: usize> From<[Byte; S]> for Firmware<S> {
    fn from(data: [Byte; S]) -> Self {
        Firmware { data }
    }
}

impl<const S: usize> Deref for Firmware<S> {
    type Target = [Byte];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<const S: usize> Firmware<S> {
    /// Writes an array of bytes to the firmware
    ///
    /// # Panics
    ///
    /// If `data` does not fit between `position` and the end of the firmware.
    pub fn write_array(&mut self, position: usize, data: &[Byte]) {
        self.data[position..position + data.len()].copy_from_slice(data);
    }
}

/// Writes a block of instructions directly into a firmware buffer
#[macro_export]
macro_rules! write_instructions {
    ( $fw:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $fw.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ]);
    };
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_read_cell() -> Result<()> {
        let mut mem = StdMem::default();
        mem.data[0x2] = -12;
        assert_eq!(mem.read_cell(0x2), Some(-12));

        Ok(())
    }

    #[test]
    fn test_read_cell_out_of_bounds() -> Result<()> {
        let mem = StdMem::default();
        assert_eq!(mem.read_cell(MEMORY_SIZE as Byte), None);
        assert_eq!(mem.read_cell(0xFF), None);

        Ok(())
    }

    #[test]
    fn test_cell_mut() -> Result<()> {
        let mut mem = StdMem::default();
        if let Some(cell) = mem.cell_mut(0xF) {
            *cell = 44;
        }
        assert_eq!(mem.data[0xF], 44);
        assert!(mem.cell_mut(0x10).is_none());

        Ok(())
    }

    #[test]
    fn test_dump() -> Result<()> {
        let mut mem = Memory::<3>::from([5, 3, -1]);
        mem.data[1] = 0x1A;

        let mut out = Vec::new();
        mem.dump(&mut out)?;

        assert_eq!(String::from_utf8(out)?, "0 = 5\n1 = 1a\n2 = ff\n");

        Ok(())
    }

    #[test]
    fn test_write_array() -> Result<()> {
        let mut fw = StdFirmware::default();
        fw.write_array(0x44, &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(&fw[0x44..0x48], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(fw[0x48], 0);

        Ok(())
    }

    #[test]
    #[should_panic]
    fn test_write_array_past_end() {
        let mut fw = Firmware::<4>::default();
        fw.write_array(3, &[0x12, 0x34]);
    }

    #[test]
    fn test_write_instructions() -> Result<()> {
        let mut fw = StdFirmware::default();

        fw.write_array(
            0,
            &[
                Instruction::LDA as Byte,
                0,
                Instruction::ADD as Byte,
                1,
                Instruction::HLT as Byte,
                0,
            ],
        );

        let mut fw2 = StdFirmware::default();
        use crate::processor::Instruction::*;
        write_instructions!(fw2 : 0 => LDA, 0, ADD, 1, HLT, 0);

        assert_eq!(fw, fw2);

        Ok(())
    }
}
