use std::fmt;
use std::ops::{
    BitOr,
    BitOrAssign,
};

/// Process-unique identity of a registered hotkey, as handed to the OS.
pub type HotkeyId = i32;

pub const WM_QUIT: u32 = 0x0012;
pub const WM_HOTKEY: u32 = 0x0312;
/// Reserved code used to wake a blocked message retrieval.
pub const WM_USER: u32 = 0x0400;

/// Modifier bitmask using the Win32 `MOD_*` bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const ALT: Self = Self(0x0001);
    pub const CTRL: Self = Self(0x0002);
    pub const SHIFT: Self = Self(0x0004);
    pub const WIN: Self = Self(0x0008);
    /// Suppresses auto-repeat notifications. Only ever passed to the OS call.
    pub const NO_REPEAT: Self = Self(0x4000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn has_ctrl(self) -> bool {
        self.contains(Self::CTRL)
    }

    pub fn has_alt(self) -> bool {
        self.contains(Self::ALT)
    }

    pub fn has_shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn has_win(self) -> bool {
        self.contains(Self::WIN)
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Renders as `Ctrl+Alt+Shift+Win+`, each present modifier followed by `+`.
impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, label) in [
            (Self::CTRL, "Ctrl+"),
            (Self::ALT, "Alt+"),
            (Self::SHIFT, "Shift+"),
            (Self::WIN, "Win+"),
        ] {
            if self.contains(flag) {
                f.write_str(label)?;
            }
        }
        Ok(())
    }
}

/// One message pulled from the owner thread's OS queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    pub message: u32,
    pub wparam: usize,
}

impl RawMessage {
    pub fn new(message: u32, wparam: usize) -> Self {
        Self { message, wparam }
    }

    pub fn wake() -> Self {
        Self::new(WM_USER, 0)
    }

    pub fn hotkey(id: HotkeyId) -> Self {
        Self::new(WM_HOTKEY, id as usize)
    }

    pub fn kind(&self) -> MessageKind {
        match self.message {
            WM_USER => MessageKind::Wake,
            WM_HOTKEY => MessageKind::Hotkey(self.wparam as HotkeyId),
            _ => MessageKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Wake,
    Hotkey(HotkeyId),
    Other,
}

pub type HotkeyResult<T> = Result<T, HotkeyError>;

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Only one key allowed: {0}")]
    TooManyKeys(String),

    #[error("No key specified: {0}")]
    MissingKey(String),

    #[error("Could not register hotkey ({spec}): {reason}")]
    RegistrationFailed { spec: String, reason: String },

    #[error("Could not unregister hotkey {id}: {reason}")]
    UnregistrationFailed { id: HotkeyId, reason: String },

    #[error("Error posting message to thread {thread_id}: {reason}")]
    RelayPostFailed { thread_id: u32, reason: String },

    #[error("Hotkey owner thread is not running")]
    RelayClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Platform error: {0}")]
    Platform(String),
}
