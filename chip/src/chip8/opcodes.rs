use rand::RngCore;

use crate::{
    definitions::{display, memory},
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
    opcode::{Arithmetic, ChipOpcodes, KeyCheck, Misc, Operation, ProgramCounterStep},
    ProcessError,
};

use super::ChipSet;

/// the most significant bit of a register
const MSB: u8 = 0x80;

impl<D, K, S> ChipSet<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    /// the value a shift operates on
    fn shift_operand(&self, x: usize, y: usize) -> u8 {
        if self.legacy_shift {
            self.registers.get(y)
        } else {
            self.registers.get(x)
        }
    }

    /// will advance the index register by `by`, masking it to the memory
    fn advance_index(&mut self, by: usize) {
        let index = self.registers.index();
        self.registers.set_index(index + by);
    }
}

impl<D, K, S> ChipOpcodes for ChipSet<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    fn clear(&mut self) -> (ProgramCounterStep, Operation) {
        // 00E0
        self.display.clear();
        (ProgramCounterStep::Next, Operation::Draw)
    }

    fn ret(&mut self) -> Result<ProgramCounterStep, ProcessError> {
        // 00EE
        // Return from sub routine => pop from stack
        // a call from the last word returns past the memory, the next fetch rejects it
        let pc = self.stack.pop()?;
        Ok(ProgramCounterStep::Return(pc))
    }

    fn call(&mut self, nnn: usize) -> Result<ProgramCounterStep, ProcessError> {
        // 2NNN
        // pushes the address of the opcode following the call
        let pc = ProgramCounterStep::Next.apply(self.registers.program_counter());
        self.stack.push(pc)?;
        Ok(ProgramCounterStep::Jump(nnn))
    }

    fn skip_const(&self, x: usize, kk: u8, equal: bool) -> ProgramCounterStep {
        // 3XKK and 4XKK
        ProgramCounterStep::cond((self.registers.get(x) == kk) == equal)
    }

    fn skip_register(&self, x: usize, y: usize, equal: bool) -> ProgramCounterStep {
        // 5XY0 and 9XY0
        ProgramCounterStep::cond((self.registers.get(x) == self.registers.get(y)) == equal)
    }

    fn load_const(&mut self, x: usize, kk: u8) -> ProgramCounterStep {
        // 6XKK
        self.registers.set(x, kk);
        ProgramCounterStep::Next
    }

    fn add_const(&mut self, x: usize, kk: u8) -> ProgramCounterStep {
        // 7XKK
        // let VX overflow, but ignore carry
        let res = self.registers.get(x).wrapping_add(kk);
        self.registers.set(x, res);
        ProgramCounterStep::Next
    }

    fn arithmetic(&mut self, op: Arithmetic, x: usize, y: usize) -> ProgramCounterStep {
        // 8XYN
        let vx = self.registers.get(x);
        let vy = self.registers.get(y);

        let (res, flag) = match op {
            Arithmetic::Load => (vy, None),
            Arithmetic::Or => (vx | vy, Some(false)),
            Arithmetic::And => (vx & vy, Some(false)),
            Arithmetic::Xor => (vx ^ vy, Some(false)),
            Arithmetic::Add => {
                let (res, carry) = vx.overflowing_add(vy);
                (res, Some(carry))
            }
            Arithmetic::Sub => (vx.wrapping_sub(vy), Some(vx > vy)),
            Arithmetic::SubN => (vy.wrapping_sub(vx), Some(vy > vx)),
            Arithmetic::ShiftRight => {
                let operand = self.shift_operand(x, y);
                (operand >> 1, Some(operand & 1 == 1))
            }
            Arithmetic::ShiftLeft => {
                let operand = self.shift_operand(x, y);
                (operand << 1, Some(operand & MSB == MSB))
            }
        };

        self.registers.set(x, res);
        // in case x is VF the flag overrides the result
        if let Some(flag) = flag {
            self.registers.set_flag(flag);
        }
        ProgramCounterStep::Next
    }

    fn load_index(&mut self, nnn: usize) -> ProgramCounterStep {
        // ANNN
        self.registers.set_index(nnn);
        ProgramCounterStep::Next
    }

    fn jump_indexed(&self, nnn: usize) -> ProgramCounterStep {
        // BNNN
        // the jump step masks the target to the memory width
        ProgramCounterStep::Jump(nnn + self.registers.get(0) as usize)
    }

    fn random(&mut self, x: usize, kk: u8) -> ProgramCounterStep {
        // CXKK
        let byte = self.rng.next_u32() as u8;
        self.registers.set(x, byte & kk);
        ProgramCounterStep::Next
    }

    fn draw(
        &mut self,
        x: usize,
        y: usize,
        n: u8,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        // DXYN
        let sprite = self.memory.read(self.registers.index(), n as usize)?;
        let px = self.registers.get(x) as usize % display::WIDTH;
        let py = self.registers.get(y) as usize % display::HEIGHT;

        let collision = self.display.sprite_blit(px, py, sprite);
        self.registers.set_flag(collision);

        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    fn key(&mut self, op: KeyCheck, x: usize) -> ProgramCounterStep {
        // EX9E and EXA1
        self.keyboard.refresh(&mut self.input);
        let pressed = self.keyboard.is_pressed(self.registers.get(x) as usize);
        ProgramCounterStep::cond(pressed == (op == KeyCheck::Pressed))
    }

    fn misc(&mut self, op: Misc, x: usize) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        // FXKK
        let vx = self.registers.get(x);

        match op {
            Misc::GetDelayTimer => {
                let delay = self.scheduler.delay();
                self.registers.set(x, delay);
            }
            Misc::AwaitKeyPress => match self.keyboard.refresh(&mut self.input) {
                Some(key) => self.registers.set(x, key as u8),
                // retry the same instruction on the next cycle
                None => return Ok((ProgramCounterStep::None, Operation::Wait)),
            },
            Misc::SetDelayTimer => self.scheduler.arm_delay(vx),
            Misc::SetSoundTimer => {
                self.scheduler.arm_sound(vx);
                if vx > 0 {
                    self.start_sound();
                } else {
                    self.stop_sound();
                }
            }
            Misc::AddToIndex => {
                let sum = self.registers.index() + vx as usize;
                self.registers.set_index(sum);
                self.registers.set_flag(sum > memory::ADDRESS_MASK);
            }
            Misc::FontAddress => {
                let glyph = (vx & 0xF) as usize;
                self.registers
                    .set_index(self.font_offset + display::fontset::GLYPH_SIZE * glyph);
            }
            Misc::StoreBcd => {
                let bcd = [vx / 100, (vx / 10) % 10, vx % 10];
                self.memory.write(self.registers.index(), &bcd)?;
            }
            Misc::StoreRegisters => {
                self.memory
                    .write(self.registers.index(), self.registers.range(x))?;
                self.advance_index(x + 1);
            }
            Misc::LoadRegisters => {
                let data = self.memory.read(self.registers.index(), x + 1)?;
                self.registers.set_range(data);
                self.advance_index(x + 1);
            }
        }

        Ok((ProgramCounterStep::Next, Operation::None))
    }
}
