//! The key state tracker and the contracts of the outside collaborators.
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{definitions::keyboard, display::DisplayBuffer, SoundError};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will redraw the output device from the given buffer, the buffer is
    /// the only source of truth the sink may use.
    fn present(&mut self, buffer: &DisplayBuffer);
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the physical keyboard
pub trait KeyboardCommands {
    /// Will drain the pending host events, returns `true` if a quit was requested.
    /// Called once per cycle.
    fn poll_quit(&mut self) -> bool;

    /// Will return the physical state of the hex keypad, indexed by key code.
    fn keys(&mut self) -> [bool; keyboard::SIZE];
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for the buzzer
pub trait SoundCommands {
    /// Will start the playback of the tone.
    fn start(&mut self) -> Result<(), SoundError>;
    /// Will stop the playback of the tone.
    fn stop(&mut self) -> Result<(), SoundError>;
}

/// Will store the last snapshot of the physical keyboard and represent the internal
/// keyboard as well.
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers. The snapshot is only refreshed by those three opcodes.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
    last: Option<usize>,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Will query the source once and replace the snapshot.
    ///
    /// Returns the lowest key code that is pressed now but was not pressed in the
    /// previous snapshot.
    pub fn refresh<K>(&mut self, source: &mut K) -> Option<usize>
    where
        K: KeyboardCommands + ?Sized,
    {
        let current = source.keys();
        let pressed = self
            .keys
            .iter()
            .zip(current.iter())
            .position(|(&before, &now)| now && !before);

        self.keys = current;
        self.last = pressed;
        pressed
    }

    /// Will return the state of the key according to the last snapshot.
    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys[key & (keyboard::SIZE - 1)]
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }

    /// The key found by the last refresh.
    pub fn get_last(&self) -> Option<usize> {
        self.last
    }
}

/// A display sink that throws every frame away, it only counts them.
#[derive(Debug, Default, Clone)]
pub struct NullDisplay {
    frames: usize,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The amount of presented frames.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl DisplayCommands for NullDisplay {
    fn present(&mut self, _buffer: &DisplayBuffer) {
        self.frames += 1;
    }
}

#[derive(Debug, Default)]
struct KeyState {
    keys: [bool; keyboard::SIZE],
    quit: bool,
}

/// A key state source that can be driven from another thread (or a test), every clone
/// shares the same state.
#[derive(Debug, Default, Clone)]
pub struct SharedKeyboard {
    state: Arc<Mutex<KeyState>>,
}

impl SharedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: usize) {
        self.set_key(key, true);
    }

    pub fn release(&self, key: usize) {
        self.set_key(key, false);
    }

    pub fn set_key(&self, key: usize, to: bool) {
        debug_assert!(key < keyboard::SIZE);
        self.state.lock().keys[key & (keyboard::SIZE - 1)] = to;
    }

    pub fn release_all(&self) {
        self.state.lock().keys = [false; keyboard::SIZE];
    }

    /// The next drain of events will report a quit.
    pub fn request_quit(&self) {
        self.state.lock().quit = true;
    }
}

impl KeyboardCommands for SharedKeyboard {
    fn poll_quit(&mut self) -> bool {
        self.state.lock().quit
    }

    fn keys(&mut self) -> [bool; keyboard::SIZE] {
        self.state.lock().keys
    }
}

/// A buzzer that stays silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mute;

impl SoundCommands for Mute {
    fn start(&mut self) -> Result<(), SoundError> {
        log::debug!("sound muted, ignoring start");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SoundError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pressed: &[usize]) -> [bool; keyboard::SIZE] {
        let mut keys = [false; keyboard::SIZE];
        for &key in pressed {
            keys[key] = true;
        }
        keys
    }

    #[test]
    fn test_refresh_finds_lowest_new_key() {
        let mut source = MockKeyboardCommands::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_keys()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(snapshot(&[0xA, 0x3]));
        source
            .expect_keys()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(snapshot(&[0xA, 0x3, 0xF, 0x7]));
        source
            .expect_keys()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(snapshot(&[0xA, 0x3, 0xF, 0x7]));

        let mut keyboard = Keyboard::new();
        assert_eq!(Some(0x3), keyboard.refresh(&mut source));
        // 0x3 and 0xA are held, so only 0x7 and 0xF are new
        assert_eq!(Some(0x7), keyboard.refresh(&mut source));
        // nothing changed
        assert_eq!(None, keyboard.refresh(&mut source));
        assert!(keyboard.is_pressed(0xF));
        assert!(!keyboard.is_pressed(0x0));
    }

    #[test]
    fn test_release_and_press_again() {
        let mut source = SharedKeyboard::new();
        let mut keyboard = Keyboard::new();

        source.press(0x5);
        assert_eq!(Some(0x5), keyboard.refresh(&mut source));
        assert_eq!(None, keyboard.refresh(&mut source));

        source.release(0x5);
        assert_eq!(None, keyboard.refresh(&mut source));
        assert!(!keyboard.is_pressed(0x5));

        source.press(0x5);
        assert_eq!(Some(0x5), keyboard.refresh(&mut source));
        assert_eq!(Some(0x5), keyboard.get_last());
    }

    #[test]
    fn test_shared_keyboard_clones_share_state() {
        let handle = SharedKeyboard::new();
        let mut source = handle.clone();

        assert!(!source.poll_quit());
        handle.press(0x1);
        handle.request_quit();
        assert!(source.poll_quit());
        assert_eq!(snapshot(&[0x1]), source.keys());

        handle.release_all();
        assert_eq!([false; keyboard::SIZE], source.keys());
    }

    #[test]
    fn test_null_display_counts_frames() {
        let mut display = NullDisplay::new();
        let buffer = DisplayBuffer::new();
        display.present(&buffer);
        display.present(&buffer);
        assert_eq!(2, display.frames());
    }
}
