//! Runs the chip8 virtual machine in a terminal.
//!
//! The hex keypad is mapped onto the left side of a QWERTY keyboard, `Esc` or `Ctrl-C`
//! quit.
mod definitions;
mod display;
mod input;
mod setup;
mod sound;

use anyhow::Context;
use chip::{
    chip8::ChipSet,
    config::Settings,
    devices::{Mute, SoundCommands},
    resources::Rom,
    timer::{MonotonicClock, TimedWorker, Worker},
    Emulator,
};
use clap::Parser;

use crate::{
    display::{TerminalDisplay, TerminalSession},
    input::TerminalKeyboard,
    setup::Args,
    sound::Buzzer,
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup::setup_logging(args.log_file.as_ref())?;

    let settings = args.settings();
    let rom = Rom::from_file(&args.rom_file)
        .with_context(|| format!("unable to load '{}'", args.rom_file.display()))?;

    if args.mute {
        run(rom, &settings, Mute)
    } else {
        let buzzer = Buzzer::speaker(settings.audio_device.as_deref(), settings.tone_frequency);
        run(rom, &settings, buzzer)
    }
}

fn run<S>(rom: Rom, settings: &Settings, sound: S) -> anyhow::Result<()>
where
    S: SoundCommands + Send + 'static,
{
    let name = rom.get_name().to_string();
    let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);

    let chip = ChipSet::new(
        rom,
        settings,
        TerminalDisplay::new(settings.scale_factor),
        TerminalKeyboard::new(enhanced),
        sound,
        MonotonicClock::new(),
    )
    .with_context(|| format!("unable to set up '{}'", name))?;
    let emulator = Emulator::new(chip);

    let res = {
        let _session = TerminalSession::enter(enhanced).context("unable to set up the terminal")?;
        emulator.run(Worker::new())
    };

    log::info!("'{}' stopped after {} cycles", name, emulator.lock().get_cycles());
    res.with_context(|| format!("'{}' halted", name))
}
