use rand::RngCore;

use crate::{
    config::Settings,
    definitions::{display, memory},
    devices::{DisplayCommands, Keyboard, KeyboardCommands, SoundCommands},
    display::DisplayBuffer,
    memory::{Memory, Registers, Stack},
    opcode::{ChipOpcodes, Opcode, Operation, ProgramCounter, ProgramCounterStep},
    resources::Rom,
    timer::{Clock, Scheduler},
    ProcessError, SetupError,
};

/// The outcome of a single fetch, decode and execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// The instruction ran, with the resulting operation.
    Executed(Operation),
    /// A quit was requested, nothing was executed.
    Quit,
}

/// The outcome of a [`ChipSet::tick`](ChipSet::tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The amount of cycles executed.
    Ran(u64),
    /// A quit was requested, the CPU clock has been disarmed.
    Quit,
}

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
pub struct ChipSet<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    /// name of the loaded rom
    pub(super) name: String,
    /// all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    pub(super) memory: Memory,
    pub(super) registers: Registers,
    pub(super) stack: Stack,
    pub(super) display: DisplayBuffer,
    /// The key snapshot, only refreshed by the key opcodes.
    pub(super) keyboard: Keyboard,
    /// Drives the CPU clock, the delay timer and the sound timer.
    pub(super) scheduler: Scheduler,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
    pub(super) legacy_shift: bool,
    pub(super) lazy_render: bool,
    pub(super) refresh_interval: u64,
    pub(super) font_offset: usize,
    /// The amount of executed cycles.
    pub(super) cycles: u64,
    pub(super) output: D,
    pub(super) input: K,
    pub(super) sound: S,
}

impl<D, K, S> ChipSet<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    /// will create a new chipset object
    pub fn new<C>(
        rom: Rom,
        settings: &Settings,
        output: D,
        input: K,
        sound: S,
        clock: C,
    ) -> Result<Self, SetupError>
    where
        C: Clock + 'static,
    {
        settings.validate()?;

        let data = rom.get_data();
        if data.len() > memory::SIZE - settings.rom_offset {
            return Err(SetupError::RomTooLarge {
                len: data.len(),
                offset: settings.rom_offset,
            });
        }

        // initialize all the memory with 0
        let mut ram = Memory::new();
        // both ranges were checked above
        ram.write(settings.font_offset, &display::fontset::FONTSET)
            .map_err(|err| SetupError::InvalidSetting(err.to_string()))?;
        ram.write(settings.rom_offset, data)
            .map_err(|err| SetupError::InvalidSetting(err.to_string()))?;

        log::debug!(
            "loaded rom '{}' ({} bytes) at {:#06X}",
            rom.get_name(),
            data.len(),
            settings.rom_offset
        );

        Ok(Self {
            name: rom.get_name().to_string(),
            opcode: 0,
            memory: ram,
            registers: Registers::new(settings.rom_offset),
            stack: Stack::new(),
            display: DisplayBuffer::new(),
            keyboard: Keyboard::new(),
            scheduler: Scheduler::new(Box::new(clock), settings.frequency),
            rng: Box::new(rand::rngs::OsRng),
            legacy_shift: settings.legacy_shift,
            lazy_render: settings.lazy_render,
            refresh_interval: settings.refresh_interval as u64,
            font_offset: settings.font_offset,
            cycles: 0,
            output,
            input,
            sound,
        })
    }

    /// Will replace the random number generator used by `CXKK`.
    pub fn with_rng<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Box::new(rng);
        self
    }

    /// will get the next opcode from memory
    pub(super) fn set_opcode(&mut self) -> Result<(), ProcessError> {
        self.opcode = self.memory.fetch(self.registers.program_counter())?;
        Ok(())
    }

    /// will advance the program by a single step
    ///
    /// Pending input is drained first, a requested quit ends the cycle before anything
    /// is executed.
    pub fn next(&mut self) -> Result<Cycle, ProcessError> {
        if self.input.poll_quit() {
            log::debug!("quit requested");
            return Ok(Cycle::Quit);
        }

        self.set_opcode()?;
        log::trace!(
            "{:#06X}: {:#06X}",
            self.registers.program_counter(),
            self.opcode
        );

        let operation = self.calc(self.opcode)?;

        let present = if self.lazy_render {
            operation == Operation::Draw
        } else {
            self.cycles % self.refresh_interval == 0
        };
        if present {
            self.output.present(&self.display);
        }

        self.cycles += 1;
        Ok(Cycle::Executed(operation))
    }

    /// Will run everything the scheduler reports as due.
    ///
    /// An expired sound timer stops the playback before the due cycles run. A quit or a
    /// fatal error shuts the machine down, the error is handed to the caller.
    pub fn tick(&mut self) -> Result<Tick, ProcessError> {
        let due = self.scheduler.poll();

        if due.sound_expired {
            self.stop_sound();
        }

        for _ in 0..due.cycles {
            match self.next() {
                Ok(Cycle::Quit) => {
                    self.shutdown();
                    return Ok(Tick::Quit);
                }
                Ok(Cycle::Executed(_)) => {}
                Err(err) => {
                    self.shutdown();
                    log::error!("{}", err);
                    log::debug!("{}", self);
                    return Err(err);
                }
            }
        }

        Ok(Tick::Ran(due.cycles))
    }

    /// Will arm the CPU clock, the first cycle is due one period from now.
    pub fn arm_cpu(&mut self) {
        log::debug!("CPU clock armed ({:?} period)", self.scheduler.cpu_period());
        self.scheduler.arm_cpu();
    }

    pub fn disarm_cpu(&mut self) {
        log::debug!("CPU clock disarmed");
        self.scheduler.disarm_cpu();
    }

    /// Will disarm every clock and stop a playing tone.
    ///
    /// Calling it again has no further effect on the sound backend.
    pub fn shutdown(&mut self) {
        self.disarm_cpu();
        if self.scheduler.sound_armed() {
            self.scheduler.disarm_sound();
            self.stop_sound();
        }
    }

    pub(super) fn start_sound(&mut self) {
        if let Err(err) = self.sound.start() {
            log::warn!("{}", err);
        }
    }

    pub(super) fn stop_sound(&mut self) {
        if let Err(err) = self.sound.stop() {
            log::warn!("{}", err);
        }
    }

    /// Will return the name of the loaded rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The last fetched opcode.
    pub fn get_opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn get_registers(&self) -> &Registers {
        &self.registers
    }

    pub fn get_memory(&self) -> &Memory {
        &self.memory
    }

    pub fn get_stack(&self) -> &Stack {
        &self.stack
    }

    /// Will return the logical frame buffer.
    pub fn get_display(&self) -> &DisplayBuffer {
        &self.display
    }

    /// Will get the last snapshot of the keyboard
    pub fn get_keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn get_scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.scheduler.delay()
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.scheduler.sound()
    }

    /// The amount of executed cycles.
    pub fn get_cycles(&self) -> u64 {
        self.cycles
    }
}

impl<D, K, S> ProgramCounter for ChipSet<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    fn step(&mut self, step: ProgramCounterStep) {
        let pointer = step.apply(self.registers.program_counter());
        self.registers.set_program_counter(pointer);
    }
}
