use std::{io, path::PathBuf};

use thiserror::Error;

use crate::opcode::Opcode;

/// Fatal errors raised while executing instructions.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Invalid memory access '{0}'.")]
    Memory(#[from] MemoryError),
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    InvalidOpcode(Opcode),
    #[error("The program counter {0:#06X?} is not aligned to an opcode boundary.")]
    MisalignedCounter(usize),
    #[error("Pointer location invalid there can not be an opcode at {0:#06X?}.")]
    CounterOutOfBounds(usize),
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum MemoryError {
    #[error("Access of {len} bytes at {address:#06X?} leaves the memory block.")]
    OutOfBounds { address: usize, len: usize },
}

/// Fatal errors raised before the first instruction runs.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Unable to read the rom '{path}'.")]
    RomUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("The rom is too large ({len} bytes at offset {offset:#06X?}).")]
    RomTooLarge { len: usize, offset: usize },
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Advisory errors of the audio backend, these never halt execution.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SoundError {
    #[error("The audio backend failed '{0}'.")]
    Backend(String),
}
