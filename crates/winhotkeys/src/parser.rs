use crate::models::{
    HotkeyError,
    HotkeyResult,
    Modifiers,
};

/// A parsed hotkey: modifier mask plus the virtual-key code of the single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub modifiers: Modifiers,
    pub keycode: u32,
}

impl KeySpec {
    pub fn new(modifiers: Modifiers, keycode: u32) -> Self {
        Self { modifiers, keycode }
    }

    /// Parses strings like `"ctrl+shift+z"`.
    ///
    /// Matching is case-insensitive. `lookup` maps the key character to a
    /// virtual-key code, normally through the platform's keyboard layout.
    pub fn parse<F>(keys: &str, lookup: F) -> HotkeyResult<Self>
    where
        F: Fn(char) -> Option<u32>,
    {
        let lowered = keys.to_lowercase();
        let mut modifiers = Modifiers::NONE;
        let mut keycode = None;

        for part in lowered.split('+').map(str::trim) {
            match part {
                "alt" => modifiers |= Modifiers::ALT,
                "ctrl" => modifiers |= Modifiers::CTRL,
                "shift" => modifiers |= Modifiers::SHIFT,
                "win" => modifiers |= Modifiers::WIN,
                key => {
                    if keycode.is_some() {
                        return Err(HotkeyError::TooManyKeys(keys.to_string()));
                    }

                    let mut chars = key.chars();
                    let ch = match (chars.next(), chars.next()) {
                        (Some(ch), None) => ch,
                        _ => return Err(HotkeyError::InvalidKey(key.to_string())),
                    };

                    let code = lookup(ch).ok_or_else(|| HotkeyError::InvalidKey(key.to_string()))?;
                    keycode = Some(code);
                }
            }
        }

        let keycode = keycode.ok_or_else(|| HotkeyError::MissingKey(keys.to_string()))?;
        Ok(Self::new(modifiers, keycode))
    }
}
