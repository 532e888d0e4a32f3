//! Program images.
//!
//! An image is the initial memory bank (one signed byte per cell) immediately
//! followed by the firmware. There is no header; both sizes are fixed by the
//! [`Image`] type parameters.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::{Byte, Cell, Firmware, Memory, FIRMWARE_SIZE, MEMORY_SIZE};
use crate::processor::Processor;

/// Image layout used by the command line tool
pub type StdImage = Image<MEMORY_SIZE, FIRMWARE_SIZE>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open file: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Memory bank and firmware as stored on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image<const M: usize, const F: usize> {
    pub memory: Memory<M>,
    pub firmware: Firmware<F>,
}

impl<const M: usize, const F: usize> Image<M, F> {
    /// Splits raw image bytes into memory and firmware.
    ///
    /// A short image is zero-filled, so opcode `0x00` pads the rest of the
    /// firmware. Bytes past `M + F` are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut memory = Memory::<M>::default();
        let mut firmware = Firmware::<F>::default();

        let (head, tail) = bytes.split_at(bytes.len().min(M));
        for (cell, byte) in memory.data.iter_mut().zip(head) {
            *cell = *byte as Cell;
        }

        let code: &[Byte] = &tail[..tail.len().min(F)];
        firmware.data[..code.len()].copy_from_slice(code);

        if bytes.len() < M + F {
            debug!(
                "image is {} bytes, zero-filling the remaining {}",
                bytes.len(),
                M + F - bytes.len()
            );
        } else if bytes.len() > M + F {
            warn!(
                "ignoring {} trailing bytes past the firmware",
                bytes.len() - (M + F)
            );
        }

        Self { memory, firmware }
    }

    /// Reads an image from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded {} bytes from {}", bytes.len(), path.display());

        Ok(Self::from_bytes(&bytes))
    }

    /// Hands both buffers over to a fresh processor
    pub fn into_processor(self) -> Processor<M, F> {
        Processor::new(self.memory, self.firmware)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn split_memory_and_firmware() -> Result<()> {
        let image = Image::<4, 6>::from_bytes(&[1, 2, 3, 4, 5, 0, 10, 1, 7, 0]);

        assert_eq!(image.memory.data, [1, 2, 3, 4]);
        assert_eq!(image.firmware.data, [5, 0, 10, 1, 7, 0]);

        Ok(())
    }

    #[test]
    fn cells_are_signed() -> Result<()> {
        let image = Image::<2, 2>::from_bytes(&[0xFF, 0x80, 0, 0]);

        assert_eq!(image.memory.data, [-1, -128]);

        Ok(())
    }

    #[test]
    fn short_image_is_zero_filled() -> Result<()> {
        let image = StdImage::from_bytes(&[5, 3]);

        assert_eq!(&image.memory[..3], &[5, 3, 0]);
        assert!(image.firmware.iter().all(|byte| *byte == 0));

        let image = Image::<2, 8>::from_bytes(&[5, 3, 5, 0, 7]);
        assert_eq!(image.firmware.data, [5, 0, 7, 0, 0, 0, 0, 0]);

        Ok(())
    }

    #[test]
    fn trailing_bytes_are_ignored() -> Result<()> {
        let image = Image::<1, 2>::from_bytes(&[9, 7, 0, 0xAA, 0xBB]);

        assert_eq!(image.memory.data, [9]);
        assert_eq!(image.firmware.data, [7, 0]);

        Ok(())
    }

    #[test]
    fn empty_image() -> Result<()> {
        let image = StdImage::from_bytes(&[]);

        assert_eq!(image.memory, Memory::default());
        assert_eq!(image.firmware, Firmware::default());

        Ok(())
    }

    #[test]
    fn load_from_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("accucpu-image-{}.bin", std::process::id()));
        fs::write(&path, [7u8, 8, 6, 1, 7, 0])?;

        let image = Image::<2, 4>::from_file(&path);
        fs::remove_file(&path)?;
        let image = image?;

        assert_eq!(image.memory.data, [7, 8]);
        assert_eq!(image.firmware.data, [6, 1, 7, 0]);

        Ok(())
    }

    #[test]
    fn missing_file() {
        let err = StdImage::from_file("/nonexistent/accucpu/program.bin").unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(
            err.to_string(),
            "could not open file: /nonexistent/accucpu/program.bin"
        );
    }
}
