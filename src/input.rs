use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// latch value meaning "no key delivered"
const NO_KEY: u8 = 0xFF;

/// how long a terminal key counts as held after its last repeat; terminals
/// don't report key-up
const KEY_HOLD: Duration = Duration::from_millis(150);

/// left-hand side of a qwerty keyboard, laid out like the COSMAC hex pad:
///   1 2 3 C      1 2 3 4
///   4 5 6 D  ->  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

struct KeypadState {
    held: AtomicU16,
    latch: AtomicU8,
}

/// The 16-key hex pad. Cheap to clone; every clone sees the same state, so an
/// input thread can own one while the interpreter reads another.
#[derive(Clone)]
pub struct Keypad {
    state: Arc<KeypadState>,
}

impl Default for Keypad {
    fn default() -> Self {
        Keypad {
            state: Arc::new(KeypadState {
                held: AtomicU16::new(0),
                latch: AtomicU8::new(NO_KEY),
            }),
        }
    }
}

impl std::fmt::Debug for Keypad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypad({:#06x})", self.state())
    }
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// bit n is set iff key n is held
    pub fn state(&self) -> u16 {
        self.state.held.load(Ordering::Acquire)
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.state() & (1 << (key & 0xF)) != 0
    }

    /// hold `key` down and deliver it to a pending key wait
    pub fn press(&self, key: u8) {
        let key = key & 0xF;
        self.state.held.fetch_or(1 << key, Ordering::AcqRel);
        self.state.latch.store(key, Ordering::Release);
    }

    pub fn release(&self, key: u8) {
        self.state
            .held
            .fetch_and(!(1 << (key & 0xF)), Ordering::AcqRel);
    }

    /// replace the whole bitmask; the lowest newly-pressed key, if any, is
    /// delivered to a pending key wait
    pub fn set_state(&self, mask: u16) {
        let old = self.state.held.swap(mask, Ordering::AcqRel);
        let fresh = mask & !old;
        if fresh != 0 {
            self.state
                .latch
                .store(fresh.trailing_zeros() as u8, Ordering::Release);
        }
    }

    /// take the last delivered key, leaving nothing behind
    pub fn take_delivered(&self) -> Option<u8> {
        match self.state.latch.swap(NO_KEY, Ordering::AcqRel) {
            NO_KEY => None,
            key => Some(key),
        }
    }

    /// forget any delivered key; a new wait only accepts fresh presses
    pub fn clear_delivered(&self) {
        self.state.latch.store(NO_KEY, Ordering::Release);
    }

    /// release everything and drop any delivered key
    pub fn reset(&self) {
        self.state.held.store(0, Ordering::Release);
        self.clear_delivered();
    }
}

/// what the host loop should do after polling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// reads key presses from somewhere and reflects them onto the keypad
pub trait Input {
    fn poll(&mut self, keypad: &Keypad) -> Result<Control, io::Error>;
}

/// keyboard input from the terminal, via crossterm
pub struct TermInput {
    keymap: HashMap<char, u8>,
    last_seen: [Option<Instant>; 16],
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_seen: [None; 16],
        })
    }

    fn map(&self, code: KeyCode) -> Option<u8> {
        match code {
            KeyCode::Char(c) => self.keymap.get(&c.to_ascii_lowercase()).copied(),
            _ => None,
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self, keypad: &Keypad) -> Result<Control, io::Error> {
        let now = Instant::now();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                if evt.code == KeyCode::Esc {
                    return Ok(Control::Quit);
                }
                match self.map(evt.code) {
                    Some(key) => {
                        if self.last_seen[key as usize].is_none() {
                            keypad.press(key);
                        }
                        self.last_seen[key as usize] = Some(now);
                    }
                    None => log::warn!("can't map {:?} to a CHIP-8 key", evt.code),
                }
            }
        }
        for (key, seen) in self.last_seen.iter_mut().enumerate() {
            if matches!(seen, Some(t) if now.duration_since(*t) > KEY_HOLD) {
                *seen = None;
                keypad.release(key as u8);
            }
        }
        Ok(Control::Continue)
    }
}

/// dummy Input implementation for testing: presses each scripted key on
/// successive polls, then asks to quit
pub struct DummyInput {
    keys: Vec<u8>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        let mut keys = Vec::from(keys);
        keys.reverse();
        DummyInput { keys }
    }
}

impl Input for DummyInput {
    fn poll(&mut self, keypad: &Keypad) -> Result<Control, io::Error> {
        match self.keys.pop() {
            Some(key) => {
                keypad.set_state(0);
                keypad.press(key);
                Ok(Control::Continue)
            }
            None => Ok(Control::Quit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let k = Keypad::new();
        k.press(0x3);
        k.press(0xA);
        assert_eq!(k.state(), 0b0000_0100_0000_1000);
        assert!(k.is_pressed(0xA));
        k.release(0x3);
        assert!(!k.is_pressed(0x3));
        assert_eq!(k.state(), 1 << 0xA);
    }

    #[test]
    fn test_clones_share_state() {
        let k = Keypad::new();
        let other = k.clone();
        other.press(0xF);
        assert!(k.is_pressed(0xF));
        assert_eq!(k.take_delivered(), Some(0xF));
        assert_eq!(other.take_delivered(), None);
    }

    #[test]
    fn test_set_state_delivers_lowest_new_key() {
        let k = Keypad::new();
        k.set_state(1 << 2);
        assert_eq!(k.take_delivered(), Some(2));
        // 2 is still held, 5 and 9 are new
        k.set_state(1 << 2 | 1 << 5 | 1 << 9);
        assert_eq!(k.take_delivered(), Some(5));
        // releasing delivers nothing
        k.set_state(0);
        assert_eq!(k.take_delivered(), None);
    }

    #[test]
    fn test_clear_and_reset() {
        let k = Keypad::new();
        k.press(1);
        k.clear_delivered();
        assert_eq!(k.take_delivered(), None);
        assert!(k.is_pressed(1));
        k.press(2);
        k.reset();
        assert_eq!(k.state(), 0);
        assert_eq!(k.take_delivered(), None);
    }

    #[test]
    fn test_keypad_across_threads() {
        let k = Keypad::new();
        let writer = k.clone();
        std::thread::spawn(move || writer.press(7))
            .join()
            .unwrap();
        assert!(k.is_pressed(7));
    }

    #[test]
    fn test_dummy_input_scripts_keys() -> Result<(), io::Error> {
        let k = Keypad::new();
        let mut i = DummyInput::new(&[4, 6]);
        assert_eq!(i.poll(&k)?, Control::Continue);
        assert_eq!(k.state(), 1 << 4);
        assert_eq!(i.poll(&k)?, Control::Continue);
        assert_eq!(k.state(), 1 << 6);
        assert_eq!(i.poll(&k)?, Control::Quit);
        Ok(())
    }

    #[test]
    fn test_keymap_is_complete() {
        let map = HashMap::from(CHIP8_CONVENTIONAL_KEYMAP);
        let mut keys: Vec<u8> = map.values().copied().collect();
        keys.sort();
        assert_eq!(keys, (0..16).collect::<Vec<u8>>());
    }
}
