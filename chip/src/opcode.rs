//! Opcode abstractions, decoding and the dispatch table.
use std::convert::TryFrom;

use crate::{
    definitions::memory,
    OpcodeError, ProcessError,
};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a nibble
const NIBBLE: u16 = 0x4;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up. The pointer has to be aligned to the opcode size.
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # assert_eq!(
/// #    Err(OpcodeError::MisalignedCounter(1)),
/// #    build_opcode(&SPLIT_OPCODE, 1)
/// # );
/// # assert_eq!(
/// #    Err(OpcodeError::CounterOutOfBounds(4)),
/// #    build_opcode(&SPLIT_OPCODE, 4)
/// # );
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    if pointer % memory::opcodes::SIZE != 0 {
        return Err(OpcodeError::MisalignedCounter(pointer));
    }
    match data.get(pointer..pointer + memory::opcodes::SIZE) {
        Some(&[high, low]) => Ok(Opcode::from_be_bytes([high, low])),
        _ => Err(OpcodeError::CounterOutOfBounds(pointer)),
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// the opcode class, the top nibble
    fn t(&self) -> u8;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `T` is the opcode type
    /// - `NNN` is an address
    fn nnn(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TXKK`
    /// - `X` is a register index
    /// - `KK` is a constant
    fn xkk(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `X` is a register index
    /// - `Y` is a register index
    /// - `N` is a nibble
    fn xyn(&self) -> (usize, usize, u8);

    /// the register index `X` in bits 8 to 11
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1);
    /// ```
    fn t(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> (3 * NIBBLE)) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xkk(), (0xE, 0xDA));
    /// ```
    fn xkk(&self) -> (usize, u8) {
        (self.x(), (self & OPCODE_MASK_00FF) as u8)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, u8) {
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        let y = ((self & MASK) >> NIBBLE) as usize;
        let n = (self & OPCODE_MASK_000F) as u8;
        (self.x(), y, n)
    }

    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> (2 * NIBBLE)) as usize
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents the program steps that the chip
/// can take.
pub enum ProgramCounterStep {
    /// Will not change the program counter, the instruction runs again
    None,
    /// Will move to the next instruction
    Next,
    /// Will skip the next instruction
    Skip,
    /// Will move the program counter to the given location (masked to the memory).
    Jump(usize),
    /// Will move the program counter to a popped return address, unmasked.
    Return(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Calculates the program counter following `pointer`.
    ///
    /// Bounds are not checked here, the next fetch rejects a counter
    /// that left the memory block.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next.apply(0x200), 0x202);
    /// assert_eq!(ProgramCounterStep::Skip.apply(0x200), 0x204);
    /// assert_eq!(ProgramCounterStep::None.apply(0x200), 0x200);
    /// assert_eq!(ProgramCounterStep::Jump(0x1234).apply(0x200), 0x234);
    /// assert_eq!(ProgramCounterStep::Return(0x1000).apply(0x200), 0x1000);
    /// ```
    #[inline]
    pub fn apply(&self, pointer: usize) -> usize {
        match *self {
            ProgramCounterStep::None => pointer,
            ProgramCounterStep::Next => pointer + memory::opcodes::SIZE,
            ProgramCounterStep::Skip => pointer + 2 * memory::opcodes::SIZE,
            ProgramCounterStep::Jump(target) => target & memory::ADDRESS_MASK,
            ProgramCounterStep::Return(target) => target,
        }
    }
}

/// The `8XYN` sub operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    /// `8XY0` - `Vx = Vy`
    Load,
    /// `8XY1` - `Vx |= Vy`, clears `VF`
    Or,
    /// `8XY2` - `Vx &= Vy`, clears `VF`
    And,
    /// `8XY3` - `Vx ^= Vy`, clears `VF`
    Xor,
    /// `8XY4` - `Vx += Vy`, `VF` is the carry
    Add,
    /// `8XY5` - `Vx -= Vy`, `VF` is set when there is no borrow
    Sub,
    /// `8XY6` - `Vx = operand >> 1`, `VF` is the popped bit
    ShiftRight,
    /// `8XY7` - `Vx = Vy - Vx`, `VF` is set when there is no borrow
    SubN,
    /// `8XYE` - `Vx = operand << 1`, `VF` is the popped bit
    ShiftLeft,
}

impl TryFrom<u8> for Arithmetic {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let op = match value {
            0x0 => Arithmetic::Load,
            0x1 => Arithmetic::Or,
            0x2 => Arithmetic::And,
            0x3 => Arithmetic::Xor,
            0x4 => Arithmetic::Add,
            0x5 => Arithmetic::Sub,
            0x6 => Arithmetic::ShiftRight,
            0x7 => Arithmetic::SubN,
            0xE => Arithmetic::ShiftLeft,
            _ => return Err(()),
        };
        Ok(op)
    }
}

/// The `EXKK` sub operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    /// `EX9E` - skip if the key in `Vx` is pressed
    Pressed,
    /// `EXA1` - skip if the key in `Vx` is not pressed
    NotPressed,
}

impl TryFrom<u8> for KeyCheck {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x9E => Ok(KeyCheck::Pressed),
            0xA1 => Ok(KeyCheck::NotPressed),
            _ => Err(()),
        }
    }
}

/// The `FXKK` sub operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misc {
    /// `FX07` - `Vx = delay`
    GetDelayTimer,
    /// `FX0A` - `Vx = key`, retried until a new key press happens
    AwaitKeyPress,
    /// `FX15` - `delay = Vx`
    SetDelayTimer,
    /// `FX18` - `sound = Vx`
    SetSoundTimer,
    /// `FX1E` - `I += Vx`, `VF` is the range overflow
    AddToIndex,
    /// `FX29` - `I = font[Vx]`
    FontAddress,
    /// `FX33` - `[I..I+3] = bcd(Vx)`
    StoreBcd,
    /// `FX55` - `[I..=I+x] = V0..=Vx`, `I += x + 1`
    StoreRegisters,
    /// `FX65` - `V0..=Vx = [I..=I+x]`, `I += x + 1`
    LoadRegisters,
}

impl TryFrom<u8> for Misc {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let op = match value {
            0x07 => Misc::GetDelayTimer,
            0x0A => Misc::AwaitKeyPress,
            0x15 => Misc::SetDelayTimer,
            0x18 => Misc::SetSoundTimer,
            0x1E => Misc::AddToIndex,
            0x29 => Misc::FontAddress,
            0x33 => Misc::StoreBcd,
            0x55 => Misc::StoreRegisters,
            0x65 => Misc::LoadRegisters,
            _ => return Err(()),
        };
        Ok(op)
    }
}

/// A fully decoded instruction, the closed set the interpreter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    Clear,
    /// `00EE`
    Return,
    /// `1NNN`
    Jump { nnn: usize },
    /// `2NNN`
    Call { nnn: usize },
    /// `3XKK`
    SkipEqual { x: usize, kk: u8 },
    /// `4XKK`
    SkipNotEqual { x: usize, kk: u8 },
    /// `5XY0`
    SkipEqualRegister { x: usize, y: usize },
    /// `6XKK`
    Load { x: usize, kk: u8 },
    /// `7XKK`
    Add { x: usize, kk: u8 },
    /// `8XYN`
    Arithmetic { op: Arithmetic, x: usize, y: usize },
    /// `9XY0`
    SkipNotEqualRegister { x: usize, y: usize },
    /// `ANNN`
    LoadIndex { nnn: usize },
    /// `BNNN`
    JumpIndexed { nnn: usize },
    /// `CXKK`
    Random { x: usize, kk: u8 },
    /// `DXYN`
    Draw { x: usize, y: usize, n: u8 },
    /// `EX9E`, `EXA1`
    Key { op: KeyCheck, x: usize },
    /// `FXKK`
    Misc { op: Misc, x: usize },
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let invalid = |_| OpcodeError::InvalidOpcode(value);
        let (x, kk) = value.xkk();
        let (_, y, n) = value.xyn();
        let nnn = value.nnn();

        let instruction = match value.t() {
            0x0 => match value {
                0x00E0 => Instruction::Clear,
                0x00EE => Instruction::Return,
                _ => return Err(OpcodeError::InvalidOpcode(value)),
            },
            0x1 => Instruction::Jump { nnn },
            0x2 => Instruction::Call { nnn },
            0x3 => Instruction::SkipEqual { x, kk },
            0x4 => Instruction::SkipNotEqual { x, kk },
            0x5 if n == 0 => Instruction::SkipEqualRegister { x, y },
            0x6 => Instruction::Load { x, kk },
            0x7 => Instruction::Add { x, kk },
            0x8 => Instruction::Arithmetic {
                op: Arithmetic::try_from(n).map_err(invalid)?,
                x,
                y,
            },
            0x9 if n == 0 => Instruction::SkipNotEqualRegister { x, y },
            0xA => Instruction::LoadIndex { nnn },
            0xB => Instruction::JumpIndexed { nnn },
            0xC => Instruction::Random { x, kk },
            0xD => Instruction::Draw { x, y, n },
            0xE => Instruction::Key {
                op: KeyCheck::try_from(kk).map_err(invalid)?,
                x,
            },
            0xF => Instruction::Misc {
                op: Misc::try_from(kk).map_err(invalid)?,
                x,
            },
            _ => return Err(OpcodeError::InvalidOpcode(value)),
        };
        Ok(instruction)
    }
}

/// Represents a step of the program counter
/// this requires the enum ProgramCounterStep
/// to work.
pub trait ProgramCounter {
    /// will move the program counter by a step.
    fn step(&mut self, step: ProgramCounterStep);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents a command from the interpreter up to the presentation layer.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// No new key press was found, the instruction will be retried.
    Wait,
    /// The display buffer changed.
    Draw,
}

/// These are the traits that have to be full filled for a working opcode
/// table.
///
/// The handlers only calculate, they never move the program counter
/// themselves. [`calc`](ChipOpcodes::calc) applies the returned
/// [`ProgramCounterStep`](ProgramCounterStep) once the handler succeeded,
/// so a failing instruction leaves the counter at the failing opcode.
pub trait ChipOpcodes: ProgramCounter {
    /// will decode and execute a single opcode
    fn calc(&mut self, opcode: Opcode) -> Result<Operation, ProcessError> {
        let instruction = Instruction::try_from(opcode)?;
        self.execute(&instruction)
    }

    /// will execute a decoded instruction
    fn execute(&mut self, instruction: &Instruction) -> Result<Operation, ProcessError> {
        let next = |step| (step, Operation::None);

        let (step, operation) = match *instruction {
            Instruction::Clear => self.clear(),
            Instruction::Return => self.ret().map(next)?,
            Instruction::Jump { nnn } => next(ProgramCounterStep::Jump(nnn)),
            Instruction::Call { nnn } => self.call(nnn).map(next)?,
            Instruction::SkipEqual { x, kk } => next(self.skip_const(x, kk, true)),
            Instruction::SkipNotEqual { x, kk } => next(self.skip_const(x, kk, false)),
            Instruction::SkipEqualRegister { x, y } => next(self.skip_register(x, y, true)),
            Instruction::SkipNotEqualRegister { x, y } => next(self.skip_register(x, y, false)),
            Instruction::Load { x, kk } => next(self.load_const(x, kk)),
            Instruction::Add { x, kk } => next(self.add_const(x, kk)),
            Instruction::Arithmetic { op, x, y } => next(self.arithmetic(op, x, y)),
            Instruction::LoadIndex { nnn } => next(self.load_index(nnn)),
            Instruction::JumpIndexed { nnn } => next(self.jump_indexed(nnn)),
            Instruction::Random { x, kk } => next(self.random(x, kk)),
            Instruction::Draw { x, y, n } => self.draw(x, y, n)?,
            Instruction::Key { op, x } => next(self.key(op, x)),
            Instruction::Misc { op, x } => self.misc(op, x)?,
        };

        self.step(step);
        Ok(operation)
    }

    /// - `00E0` - Display  - `disp_clear()`        - Clears the screen.
    fn clear(&mut self) -> (ProgramCounterStep, Operation);

    /// - `00EE` - Flow     - `return;`             - Returns from a subroutine.
    fn ret(&mut self) -> Result<ProgramCounterStep, ProcessError>;

    /// - `2NNN` - Flow     - `*(0xNNN)()`          - Calls subroutine at `NNN`.
    fn call(&mut self, nnn: usize) -> Result<ProgramCounterStep, ProcessError>;

    /// - `3XKK` / `4XKK` - Cond - `if(Vx==KK)` / `if(Vx!=KK)` - Skips the next instruction.
    fn skip_const(&self, x: usize, kk: u8, equal: bool) -> ProgramCounterStep;

    /// - `5XY0` / `9XY0` - Cond - `if(Vx==Vy)` / `if(Vx!=Vy)` - Skips the next instruction.
    fn skip_register(&self, x: usize, y: usize, equal: bool) -> ProgramCounterStep;

    /// - `6XKK` - Const    - `Vx = KK`             - Sets `VX` to `KK`.
    fn load_const(&mut self, x: usize, kk: u8) -> ProgramCounterStep;

    /// - `7XKK` - Const    - `Vx += KK`            - Adds `KK` to `VX`. (Carry flag is not changed)
    fn add_const(&mut self, x: usize, kk: u8) -> ProgramCounterStep;

    /// A mutiuse opcode base for type `8XYT` (T is a sub opcode), see [`Arithmetic`](Arithmetic).
    fn arithmetic(&mut self, op: Arithmetic, x: usize, y: usize) -> ProgramCounterStep;

    /// - `ANNN` - MEM      - `I = NNN`             - Sets `I` to the address `NNN`.
    fn load_index(&mut self, nnn: usize) -> ProgramCounterStep;

    /// - `BNNN` - Flow     - `PC=V0+NNN`           - Jumps to the address `NNN` plus `V0`.
    fn jump_indexed(&self, nnn: usize) -> ProgramCounterStep;

    /// - `CXKK` - Rand     - `Vx=rand()&KK`        - Sets `VX` to a random byte and `KK`.
    fn random(&mut self, x: usize, kk: u8) -> ProgramCounterStep;

    /// - `DXYN` - Disp     - `draw(Vx,Vy,N)`       - Draws an `N` bytes high sprite read from `I`
    /// at `(VX, VY)`, `VF` is set if any pixel was turned off.
    fn draw(&mut self, x: usize, y: usize, n: u8)
        -> Result<(ProgramCounterStep, Operation), ProcessError>;

    /// - `EX9E` / `EXA1` - KeyOp - Skips depending on the key stored in `VX`.
    fn key(&mut self, op: KeyCheck, x: usize) -> ProgramCounterStep;

    /// A multiuse opcode base for type `FXTT` (T is a sub opcode), see [`Misc`](Misc).
    fn misc(&mut self, op: Misc, x: usize)
        -> Result<(ProgramCounterStep, Operation), ProcessError>;
}
