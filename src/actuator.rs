//! Key injection behind a trait, plus the guard that keeps press/release
//! calls paired.

use crate::error::{PttError, PttResult};
use crate::trigger::KeyEdge;
use enigo::{Enigo, Key, KeyboardControllable};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Key that gets held while speech is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PttKey {
    /// A layout character such as `v`.
    Char(char),
    /// A platform virtual-key code such as `0x56`.
    Raw(u16),
    Named(NamedKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Space,
    Tab,
    CapsLock,
    Shift,
    Control,
    Alt,
    F(u8),
}

impl Default for PttKey {
    fn default() -> Self {
        PttKey::Char('v')
    }
}

impl FromStr for PttKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("key must not be empty".to_string());
        }
        let mut chars = trimmed.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(PttKey::Char(ch));
        }

        let lower = trimmed.to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix("0x") {
            return u16::from_str_radix(hex, 16)
                .map(PttKey::Raw)
                .map_err(|_| format!("invalid hex key code '{trimmed}'"));
        }
        if lower.chars().all(|ch| ch.is_ascii_digit()) {
            return lower
                .parse::<u16>()
                .map(PttKey::Raw)
                .map_err(|_| format!("key code '{trimmed}' does not fit in 16 bits"));
        }
        let named = match lower.as_str() {
            "space" => NamedKey::Space,
            "tab" => NamedKey::Tab,
            "capslock" | "caps" => NamedKey::CapsLock,
            "shift" => NamedKey::Shift,
            "control" | "ctrl" => NamedKey::Control,
            "alt" => NamedKey::Alt,
            other => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => NamedKey::F(n),
                _ => return Err(format!("unknown key '{trimmed}'")),
            },
        };
        Ok(PttKey::Named(named))
    }
}

impl fmt::Display for PttKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PttKey::Char(ch) => write!(f, "{}", ch.to_ascii_uppercase()),
            // Virtual-key codes for digits and letters equal their ASCII value.
            PttKey::Raw(code @ (0x30..=0x39 | 0x41..=0x5A)) => {
                write!(f, "{}", *code as u8 as char)
            }
            PttKey::Raw(code) => write!(f, "0x{code:02X}"),
            PttKey::Named(NamedKey::F(n)) => write!(f, "F{n}"),
            PttKey::Named(NamedKey::Space) => f.write_str("Space"),
            PttKey::Named(NamedKey::Tab) => f.write_str("Tab"),
            PttKey::Named(NamedKey::CapsLock) => f.write_str("CapsLock"),
            PttKey::Named(NamedKey::Shift) => f.write_str("Shift"),
            PttKey::Named(NamedKey::Control) => f.write_str("Control"),
            PttKey::Named(NamedKey::Alt) => f.write_str("Alt"),
        }
    }
}

/// Something that can press and release a key on the host.
///
/// Implementations should be idempotent from the caller's point of view;
/// [`KeyHold`] still guarantees one call per edge.
pub trait KeyActuator {
    fn assert_key(&mut self, key: PttKey) -> PttResult<()>;
    fn release_key(&mut self, key: PttKey) -> PttResult<()>;
    fn name(&self) -> &'static str {
        "unknown_actuator"
    }
}

/// Injects real key events through enigo.
pub struct EnigoActuator {
    enigo: Enigo,
}

impl EnigoActuator {
    pub fn new() -> Self {
        Self {
            enigo: Enigo::new(),
        }
    }
}

impl Default for EnigoActuator {
    fn default() -> Self {
        Self::new()
    }
}

fn enigo_key(key: PttKey) -> PttResult<Key> {
    Ok(match key {
        PttKey::Char(ch) => Key::Layout(ch),
        PttKey::Raw(code) => Key::Raw(code),
        PttKey::Named(NamedKey::Space) => Key::Space,
        PttKey::Named(NamedKey::Tab) => Key::Tab,
        PttKey::Named(NamedKey::CapsLock) => Key::CapsLock,
        PttKey::Named(NamedKey::Shift) => Key::Shift,
        PttKey::Named(NamedKey::Control) => Key::Control,
        PttKey::Named(NamedKey::Alt) => Key::Alt,
        PttKey::Named(NamedKey::F(n)) => match n {
            1 => Key::F1,
            2 => Key::F2,
            3 => Key::F3,
            4 => Key::F4,
            5 => Key::F5,
            6 => Key::F6,
            7 => Key::F7,
            8 => Key::F8,
            9 => Key::F9,
            10 => Key::F10,
            11 => Key::F11,
            12 => Key::F12,
            other => return Err(PttError::Actuator(format!("unsupported key F{other}"))),
        },
    })
}

impl KeyActuator for EnigoActuator {
    fn assert_key(&mut self, key: PttKey) -> PttResult<()> {
        self.enigo.key_down(enigo_key(key)?);
        Ok(())
    }

    fn release_key(&mut self, key: PttKey) -> PttResult<()> {
        self.enigo.key_up(enigo_key(key)?);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "enigo"
    }
}

/// Tracks whether the key is physically held and makes sure it is let go.
///
/// Only the transition between held and not held reaches the actuator, so
/// repeated requests are free. Dropping a `KeyHold` releases a held key,
/// which covers early returns and unwinding panics.
pub struct KeyHold<A: KeyActuator> {
    actuator: A,
    key: PttKey,
    held: bool,
}

impl<A: KeyActuator> KeyHold<A> {
    pub fn new(actuator: A, key: PttKey) -> Self {
        Self {
            actuator,
            key,
            held: false,
        }
    }

    pub fn key(&self) -> PttKey {
        self.key
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Bring the key in line with `hold`.
    ///
    /// With `test_mode` set the key is never pressed, and a key that is
    /// already down is let go so switching test mode on cannot strand it.
    pub fn apply(&mut self, hold: bool, test_mode: bool) -> PttResult<Option<KeyEdge>> {
        let want = hold && !test_mode;
        if want && !self.held {
            self.actuator.assert_key(self.key)?;
            self.held = true;
            debug!(key = %self.key, "key asserted");
            return Ok(Some(KeyEdge::Press));
        }
        if !want && self.held {
            return self.release().map(|released| released.then_some(KeyEdge::Release));
        }
        Ok(None)
    }

    /// Release the key if it is held. Returns whether a release was sent.
    pub fn release(&mut self) -> PttResult<bool> {
        if !self.held {
            return Ok(false);
        }
        // Stay marked as held on failure so the next call retries.
        self.actuator.release_key(self.key)?;
        self.held = false;
        debug!(key = %self.key, "key released");
        Ok(true)
    }
}

impl<A: KeyActuator> Drop for KeyHold<A> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("failed to release {} on shutdown: {err}", self.key);
        }
    }
}
