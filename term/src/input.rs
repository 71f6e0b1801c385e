use std::time::{Duration, Instant};

use chip::{definitions::keyboard as keypad, devices::KeyboardCommands};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::definitions::keyboard;

/// Maps the lower case characters to the hex keypad.
static KEYMAP: Lazy<HashMap<char, usize>> = Lazy::new(|| {
    keyboard::QWERTY
        .iter()
        .flatten()
        .copied()
        .zip(keypad::LAYOUT.iter().flatten().copied())
        .collect()
});

/// What a single key event means to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Press(usize),
    Release(usize),
    Quit,
    Ignore,
}

fn translate(key: &KeyEvent) -> Action {
    if key.code == KeyCode::Esc {
        return Action::Quit;
    }

    let c = match key.code {
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return Action::Ignore,
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return if c == 'c' { Action::Quit } else { Action::Ignore };
    }

    match (KEYMAP.get(&c), key.kind) {
        (Some(&code), KeyEventKind::Press | KeyEventKind::Repeat) => Action::Press(code),
        (Some(&code), KeyEventKind::Release) => Action::Release(code),
        (None, _) => Action::Ignore,
    }
}

/// The physical key state.
#[derive(Debug)]
struct KeyState {
    /// When each key was last pressed, `None` once released.
    pressed: [Option<Instant>; keypad::SIZE],
    /// The terminal reports releases, otherwise a key is held for the hold window.
    releases: bool,
}

impl KeyState {
    fn new(releases: bool) -> Self {
        Self {
            pressed: [None; keypad::SIZE],
            releases,
        }
    }

    fn press(&mut self, key: usize, now: Instant) {
        self.pressed[key] = Some(now);
    }

    fn release(&mut self, key: usize) {
        self.pressed[key] = None;
    }

    fn snapshot(&self, now: Instant) -> [bool; keypad::SIZE] {
        let mut keys = [false; keypad::SIZE];
        for (key, pressed) in keys.iter_mut().zip(self.pressed.iter()) {
            *key = match pressed {
                Some(_) if self.releases => true,
                Some(at) => now.saturating_duration_since(*at) < keyboard::HOLD_WINDOW,
                None => false,
            };
        }
        keys
    }
}

/// Reads the hex keypad from the terminal.
pub struct TerminalKeyboard {
    state: KeyState,
    quit: bool,
}

impl TerminalKeyboard {
    /// `releases` has to be set if the terminal reports key releases.
    pub fn new(releases: bool) -> Self {
        Self {
            state: KeyState::new(releases),
            quit: false,
        }
    }

    fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::Press(key) => self.state.press(key, now),
            Action::Release(key) => self.state.release(key),
            Action::Quit => {
                log::debug!("quit key pressed");
                self.quit = true;
            }
            Action::Ignore => {}
        }
    }

    /// Will drain all the pending terminal events.
    fn drain(&mut self) -> std::io::Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.apply(translate(&key), Instant::now());
            }
        }
        Ok(())
    }
}

impl KeyboardCommands for TerminalKeyboard {
    fn poll_quit(&mut self) -> bool {
        if let Err(err) = self.drain() {
            log::error!("unable to read the terminal events: {}", err);
            self.quit = true;
        }
        self.quit
    }

    fn keys(&mut self) -> [bool; keypad::SIZE] {
        self.state.snapshot(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(c: char) -> KeyEvent {
        key(KeyCode::Char(c), KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn test_keymap() {
        assert_eq!(keypad::SIZE, KEYMAP.len());
        let mut codes: Vec<usize> = KEYMAP.values().copied().collect();
        codes.sort_unstable();
        assert_eq!((0..keypad::SIZE).collect::<Vec<_>>(), codes);
    }

    #[test]
    fn test_translate() {
        assert_eq!(Action::Press(0x1), translate(&press('1')));
        assert_eq!(Action::Press(0xC), translate(&press('4')));
        assert_eq!(Action::Press(0x0), translate(&press('X')));
        assert_eq!(Action::Press(0xF), translate(&press('v')));
        assert_eq!(Action::Ignore, translate(&press('p')));

        let release = key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(Action::Release(0x4), translate(&release));
    }

    #[test]
    fn test_translate_quit() {
        let esc = key(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(Action::Quit, translate(&esc));

        let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(Action::Quit, translate(&ctrl_c));

        let ctrl_a = key(KeyCode::Char('a'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(Action::Ignore, translate(&ctrl_a));
    }

    #[test]
    fn test_hold_window() {
        let mut state = KeyState::new(false);
        let start = Instant::now();

        state.press(0xA, start);
        assert!(state.snapshot(start)[0xA]);
        assert!(state.snapshot(start + keyboard::HOLD_WINDOW / 2)[0xA]);
        assert!(!state.snapshot(start + keyboard::HOLD_WINDOW)[0xA]);

        // a repeated press extends the window
        state.press(0xA, start + keyboard::HOLD_WINDOW);
        assert!(state.snapshot(start + keyboard::HOLD_WINDOW)[0xA]);
    }

    #[test]
    fn test_press_release() {
        let mut state = KeyState::new(true);
        let start = Instant::now();

        state.press(0x3, start);
        assert!(state.snapshot(start + Duration::from_secs(10))[0x3]);

        state.release(0x3);
        assert_eq!([false; keypad::SIZE], state.snapshot(start));
    }

    #[test]
    fn test_quit() {
        let mut keyboard = TerminalKeyboard::new(true);
        let now = Instant::now();

        keyboard.apply(Action::Press(0x2), now);
        assert!(!keyboard.quit);
        keyboard.apply(Action::Quit, now);
        assert!(keyboard.quit);
        assert!(keyboard.state.snapshot(now)[0x2]);
    }
}
