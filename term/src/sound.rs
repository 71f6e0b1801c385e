use std::io::{self, Write};

use chip::{devices::SoundCommands, SoundError};

use crate::definitions::sound;

#[cfg_attr(test, mockall::automock)]
/// A source for a continuous tone.
pub trait Tone {
    /// Will play `hertz` until told otherwise, `0` silences the source.
    fn tone(&mut self, hertz: u16) -> Result<(), SoundError>;
}

/// The PC speaker, driven through the `beep` crate.
#[derive(Debug, Default)]
pub struct Speaker;

impl Tone for Speaker {
    fn tone(&mut self, hertz: u16) -> Result<(), SoundError> {
        beep::beep(hertz).map_err(|err| SoundError::Backend(err.to_string()))
    }
}

/// Will round the configured tone to a pitch the speaker can play.
fn pitch(tone_frequency: f32) -> u16 {
    if tone_frequency.is_nan() {
        return 1;
    }
    tone_frequency.round().clamp(1.0, u16::MAX as f32) as u16
}

fn ring_bell() -> Result<(), SoundError> {
    let mut out = io::stdout();
    out.write_all(sound::BELL.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|err| SoundError::Backend(err.to_string()))
}

/// Plays the buzzer tone while the sound timer is armed.
///
/// Once the tone source fails the buzzer falls back to the terminal bell, which has no
/// pitch and cannot be silenced.
#[derive(Debug)]
pub struct Buzzer<T: Tone> {
    source: T,
    pitch: u16,
    playing: bool,
    bell: bool,
}

impl Buzzer<Speaker> {
    pub fn speaker(device: Option<&str>, tone_frequency: f32) -> Self {
        if let Some(device) = device {
            log::warn!(
                "the speaker has no device selection, ignoring the audio device '{}'",
                device
            );
        }
        Self::new(Speaker, tone_frequency)
    }
}

impl<T: Tone> Buzzer<T> {
    pub fn new(source: T, tone_frequency: f32) -> Self {
        let pitch = pitch(tone_frequency);
        log::debug!("buzzer tone at {} Hz", pitch);
        Self {
            source,
            pitch,
            playing: false,
            bell: false,
        }
    }

    pub fn get_pitch(&self) -> u16 {
        self.pitch
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// `true` once the tone source failed.
    pub fn is_bell(&self) -> bool {
        self.bell
    }
}

impl<T: Tone> SoundCommands for Buzzer<T> {
    fn start(&mut self) -> Result<(), SoundError> {
        self.playing = true;
        if !self.bell {
            match self.source.tone(self.pitch) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    log::warn!("{}, falling back to the terminal bell", err);
                    self.bell = true;
                }
            }
        }
        ring_bell()
    }

    fn stop(&mut self) -> Result<(), SoundError> {
        self.playing = false;
        if self.bell {
            return Ok(());
        }
        self.source.tone(0)
    }
}

#[cfg(test)]
mod tests {
    use mockall::{predicate::eq, Sequence};

    use super::*;

    #[test]
    fn test_pitch() {
        assert_eq!(440, pitch(440.0));
        assert_eq!(262, pitch(261.63));
        assert_eq!(1, pitch(0.0));
        assert_eq!(1, pitch(-20.0));
        assert_eq!(1, pitch(f32::NAN));
        assert_eq!(u16::MAX, pitch(1e9));
    }

    #[test]
    fn test_start_and_stop() {
        let mut source = MockTone::new();
        let mut seq = Sequence::new();
        source
            .expect_tone()
            .with(eq(880))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        source
            .expect_tone()
            .with(eq(0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut buzzer = Buzzer::new(source, 880.0);
        assert_eq!(880, buzzer.get_pitch());
        assert!(!buzzer.is_playing());

        assert_eq!(Ok(()), buzzer.start());
        assert!(buzzer.is_playing());
        assert_eq!(Ok(()), buzzer.stop());
        assert!(!buzzer.is_playing());
        assert!(!buzzer.is_bell());
    }

    #[test]
    fn test_failing_source_falls_back_to_the_bell() {
        let mut source = MockTone::new();
        source
            .expect_tone()
            .times(1)
            .returning(|_| Err(SoundError::Backend("no speaker".into())));

        let mut buzzer = Buzzer::new(source, 440.0);
        // the bell result depends on stdout
        let _ = buzzer.start();
        assert!(buzzer.is_bell());
        assert!(buzzer.is_playing());

        // the source is not asked again
        assert_eq!(Ok(()), buzzer.stop());
        let _ = buzzer.start();
        assert_eq!(Ok(()), buzzer.stop());
        assert!(!buzzer.is_playing());
    }
}
