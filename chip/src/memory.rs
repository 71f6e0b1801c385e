//! The memory block, the register file and the call stack.
use tinyvec::ArrayVec;

use crate::{
    definitions::{cpu, memory},
    opcode::{self, Opcode},
    MemoryError, OpcodeError, StackError,
};

/// The addressable memory of the machine.
///
/// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
/// - `0x050-0x0A0` - Used for the built in `4x5` pixel font set (`0-F`)
/// - `0x200-0xFFF` - Program ROM and work RAM
#[derive(Clone)]
pub struct Memory {
    data: Box<[u8; memory::SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            data: Box::new([0; memory::SIZE]),
        }
    }
}

impl Memory {
    /// will create a new zeroed memory block
    pub fn new() -> Self {
        Self::default()
    }

    /// checks that `len` bytes starting at `address` lie inside the block
    fn range(address: usize, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        match address.checked_add(len) {
            Some(end) if end <= memory::SIZE => Ok(address..end),
            _ => Err(MemoryError::OutOfBounds { address, len }),
        }
    }

    /// Will return `len` bytes starting at `address`.
    pub fn read(&self, address: usize, len: usize) -> Result<&[u8], MemoryError> {
        let range = Self::range(address, len)?;
        Ok(&self.data[range])
    }

    /// Will write all of `data` starting at `address`, nothing is written if it
    /// would not fit.
    pub fn write(&mut self, address: usize, data: &[u8]) -> Result<(), MemoryError> {
        let range = Self::range(address, data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }

    /// Will fetch the big-endian opcode at the aligned `pointer`.
    pub fn fetch(&self, pointer: usize) -> Result<Opcode, OpcodeError> {
        opcode::build_opcode(&self.data[..], pointer)
    }

    /// Will return the complete memory block.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

/// The register file.
///
/// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
/// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
/// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
/// pixel collision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    v: [u8; cpu::register::SIZE],
    /// The index register `I`, always confined to the memory width.
    index: usize,
    /// The address of the next instruction to be executed.
    program_counter: usize,
}

impl Registers {
    pub fn new(program_counter: usize) -> Self {
        Self {
            program_counter,
            ..Default::default()
        }
    }

    /// Will return the value of `Vx`.
    #[inline]
    pub fn get(&self, x: usize) -> u8 {
        self.v[x]
    }

    /// Will set `Vx`.
    #[inline]
    pub fn set(&mut self, x: usize, value: u8) {
        self.v[x] = value;
    }

    /// Will return the flag register `VF`.
    #[inline]
    pub fn flag(&self) -> u8 {
        self.v[cpu::register::LAST]
    }

    /// Will set the flag register `VF` to `1` or `0`.
    #[inline]
    pub fn set_flag(&mut self, flag: bool) {
        self.v[cpu::register::LAST] = flag as u8;
    }

    /// Will return `V0` to `Vx` (including `Vx`).
    pub fn range(&self, x: usize) -> &[u8] {
        &self.v[..=x]
    }

    /// Will overwrite `V0` to `V(n-1)` with `values`.
    pub fn set_range(&mut self, values: &[u8]) {
        self.v[..values.len()].copy_from_slice(values);
    }

    /// Will return all the data registers.
    pub fn all(&self) -> &[u8] {
        &self.v
    }

    /// Will return the index register `I`.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Will set the index register, the value is masked to the memory width.
    #[inline]
    pub fn set_index(&mut self, value: usize) {
        self.index = value & memory::ADDRESS_MASK;
    }

    #[inline]
    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    #[inline]
    pub fn set_program_counter(&mut self, value: usize) {
        self.program_counter = value;
    }
}

/// The stack is only used to store return addresses when subroutines are called. The original
/// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
/// `12` levels of nesting; here `16` levels are available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    frames: ArrayVec<[usize; cpu::stack::SIZE]>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will push the return address, fails once all the nesting levels are in use.
    pub fn push(&mut self, pointer: usize) -> Result<(), StackError> {
        self.frames.try_push(pointer).map_or(Ok(()), |_| Err(StackError::Full))
    }

    /// Will pop the last return address.
    pub fn pop(&mut self) -> Result<usize, StackError> {
        self.frames.pop().ok_or(StackError::Empty)
    }

    /// The stack pointer, the amount of frames in use.
    pub fn pointer(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frames, oldest first.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_bounds() {
        let mut memory = Memory::new();
        assert_eq!(Ok(()), memory.write(0xFFD, &[1, 2, 3]));
        assert_eq!(Ok(&[1u8, 2, 3][..]), memory.read(0xFFD, 3));

        let err = MemoryError::OutOfBounds {
            address: 0xFFE,
            len: 3,
        };
        assert_eq!(Err(err), memory.write(0xFFE, &[9, 9, 9]));
        // nothing was written
        assert_eq!(&[2u8, 3][..], memory.read(0xFFE, 2).unwrap());
        assert_eq!(Err(err), memory.read(0xFFE, 3));
        assert!(memory.read(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_fetch() {
        let mut memory = Memory::new();
        memory.write(0x200, &[0x12, 0x34]).unwrap();
        assert_eq!(Ok(0x1234), memory.fetch(0x200));
        assert_eq!(Err(OpcodeError::MisalignedCounter(0x201)), memory.fetch(0x201));
        assert_eq!(
            Err(OpcodeError::CounterOutOfBounds(memory::SIZE)),
            memory.fetch(memory::SIZE)
        );
        assert_eq!(Ok(0), memory.fetch(memory::SIZE - 2));
    }

    #[test]
    fn test_index_is_masked() {
        let mut registers = Registers::new(0x200);
        registers.set_index(0x1FFF);
        assert_eq!(0xFFF, registers.index());
        registers.set_index(0x1000);
        assert_eq!(0, registers.index());
    }

    #[test]
    fn test_flag() {
        let mut registers = Registers::new(0x200);
        registers.set_flag(true);
        assert_eq!(1, registers.get(0xF));
        registers.set_flag(false);
        assert_eq!(0, registers.flag());
    }

    #[test]
    /// testing internal functionality of popping and pushing into the stack
    fn test_push_pop_stack() {
        let mut stack = Stack::new();

        // check empty initial stack
        assert!(stack.is_empty());

        let next_counter = 0x0133 + cpu::PROGRAM_COUNTER;

        for i in 0..cpu::stack::SIZE {
            assert_eq!(Ok(()), stack.push(next_counter + i * 8));
        }
        // check for the correct error message
        assert_eq!(Err(StackError::Full), stack.push(next_counter));

        // check if the stack counter moved as expected
        assert_eq!(cpu::stack::SIZE, stack.pointer());
        for i in (0..cpu::stack::SIZE).rev() {
            assert_eq!(Ok(next_counter + i * 8), stack.pop());
        }
        assert!(stack.is_empty());
        assert_eq!(Err(StackError::Empty), stack.pop());
    }
}
