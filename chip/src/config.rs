//! The startup configuration of the machine.
use crate::{
    definitions::{cpu, display, memory, sound},
    SetupError,
};

/// All the settings that are fixed once the machine has been created.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Where the rom is loaded to, also the entry point.
    pub rom_offset: usize,
    /// Where the font table is loaded to.
    pub font_offset: usize,
    /// Opaque to the machine, used by the presentation layer.
    pub scale_factor: u16,
    /// The CPU clock in instructions per second.
    pub frequency: u32,
    /// The amount of cycles between two presents, unless rendering lazily.
    pub refresh_interval: u32,
    /// `8XY6` and `8XYE` shift `Vy` into `Vx` when set, otherwise `Vx` is shifted in place.
    pub legacy_shift: bool,
    /// Present right after `00E0` and `DXYN` instead of on the refresh interval.
    pub lazy_render: bool,
    /// Opaque, forwarded to the audio backend.
    pub audio_device: Option<String>,
    /// Opaque, forwarded to the audio backend.
    pub tone_frequency: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rom_offset: cpu::PROGRAM_COUNTER,
            font_offset: display::fontset::LOCATION,
            scale_factor: display::SCALE_FACTOR,
            frequency: cpu::HERTZ,
            refresh_interval: cpu::REFRESH_INTERVAL,
            legacy_shift: true,
            lazy_render: false,
            audio_device: None,
            tone_frequency: sound::TONE_FREQUENCY,
        }
    }
}

impl Settings {
    /// Will check the settings for values the machine cannot run with.
    pub fn validate(&self) -> Result<(), SetupError> {
        let invalid = |msg: String| Err(SetupError::InvalidSetting(msg));

        if self.frequency == 0 {
            return invalid("the CPU frequency has to be at least 1 Hz".into());
        }
        if self.refresh_interval == 0 {
            return invalid("the refresh interval has to be at least 1 cycle".into());
        }
        if self.scale_factor == 0 {
            return invalid("the scale factor has to be at least 1".into());
        }
        if self.rom_offset % memory::opcodes::SIZE != 0 {
            return invalid(format!(
                "the rom offset {:#06X} is not aligned to an opcode boundary",
                self.rom_offset
            ));
        }
        if self.rom_offset >= memory::SIZE {
            return invalid(format!(
                "the rom offset {:#06X} is outside of the memory",
                self.rom_offset
            ));
        }
        let font_end = self
            .font_offset
            .checked_add(display::fontset::FONTSET.len());
        if !matches!(font_end, Some(end) if end <= memory::SIZE) {
            return invalid(format!(
                "the font table does not fit at {:#06X}",
                self.font_offset
            ));
        }
        if !(self.tone_frequency.is_finite() && self.tone_frequency > 0.0) {
            return invalid(format!(
                "the tone frequency {} is not a positive number",
                self.tone_frequency
            ));
        }
        Ok(())
    }
}
