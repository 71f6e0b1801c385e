use std::{fs::File, path::PathBuf};

use anyhow::Context;
use chip::{
    config::Settings,
    definitions::{cpu, display, sound},
};
use clap::Parser;

/// Runs a chip8 rom in the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The rom to run.
    #[arg(value_name = "ROM_FILE")]
    pub rom_file: PathBuf,

    /// Where the rom is loaded to, also the entry point.
    #[arg(short = 'r', long, default_value_t = cpu::PROGRAM_COUNTER, value_parser = parse_number)]
    pub rom_offset: usize,

    /// Where the font is loaded to.
    #[arg(short = 'f', long, default_value_t = display::fontset::LOCATION, value_parser = parse_number)]
    pub font_offset: usize,

    /// Character columns per pixel.
    #[arg(short = 's', long, default_value_t = display::SCALE_FACTOR)]
    pub scale_factor: u16,

    /// Instructions per second.
    #[arg(short = 'c', long = "cpu-freq", default_value_t = cpu::HERTZ)]
    pub frequency: u32,

    /// Cycles between two display refreshes.
    #[arg(short = 'i', long = "ref-int", default_value_t = cpu::REFRESH_INTERVAL)]
    pub refresh_interval: u32,

    /// Shift Vx in place instead of shifting Vy into Vx.
    #[arg(short = 'n', long)]
    pub new_shift: bool,

    /// Refresh the display only after it changed.
    #[arg(short = 'l', long)]
    pub lazy_render: bool,

    /// The audio device handed to the sound backend.
    #[arg(short = 'a', long)]
    pub audio_device: Option<String>,

    /// The buzzer tone in hertz.
    #[arg(short = 't', long = "tone-freq", default_value_t = sound::TONE_FREQUENCY)]
    pub tone_frequency: f32,

    /// Disable the sound.
    #[arg(long)]
    pub mute: bool,

    /// Write the log to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            rom_offset: self.rom_offset,
            font_offset: self.font_offset,
            scale_factor: self.scale_factor,
            frequency: self.frequency,
            refresh_interval: self.refresh_interval,
            legacy_shift: !self.new_shift,
            lazy_render: self.lazy_render,
            audio_device: self.audio_device.clone(),
            tone_frequency: self.tone_frequency,
        }
    }
}

/// Accepts decimal as well as `0x` prefixed hexadecimal numbers.
fn parse_number(s: &str) -> Result<usize, String> {
    let res = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    res.map_err(|err| format!("'{}' is not a number: {}", s, err))
}

/// Will set up the logger, `RUST_LOG` overrides the default `warn` level.
pub fn setup_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("unable to create the log file '{}'", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("unable to set up the logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(Ok(512), parse_number("512"));
        assert_eq!(Ok(0x200), parse_number("0x200"));
        assert_eq!(Ok(0x50), parse_number("0X50"));
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("-1").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["chip8", "pong.ch8"]).unwrap();

        assert_eq!(PathBuf::from("pong.ch8"), args.rom_file);
        assert!(!args.mute);
        assert!(args.log_file.is_none());
        assert_eq!(Settings::default(), args.settings());
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "chip8", "-r", "0x300", "-f", "0", "-s", "2", "-c", "700", "-i", "5", "-n", "-l",
            "-a", "hw:1", "-t", "880", "--mute", "--log-file", "chip8.log", "game.ch8",
        ])
        .unwrap();

        let settings = args.settings();
        assert_eq!(0x300, settings.rom_offset);
        assert_eq!(0, settings.font_offset);
        assert_eq!(2, settings.scale_factor);
        assert_eq!(700, settings.frequency);
        assert_eq!(5, settings.refresh_interval);
        assert!(!settings.legacy_shift);
        assert!(settings.lazy_render);
        assert_eq!(Some("hw:1".to_string()), settings.audio_device);
        assert_eq!(880.0, settings.tone_frequency);
        assert!(args.mute);
        assert_eq!(Some(PathBuf::from("chip8.log")), args.log_file);
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
