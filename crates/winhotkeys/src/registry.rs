use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

use tokio::sync::RwLock;

use crate::models::{
    HotkeyId,
    Modifiers,
};

pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

pub(crate) struct HotkeyEntry {
    id: HotkeyId,
    keycode: u32,
    modifiers: Modifiers,
    callback: Callback,
    // Written only on the owner thread.
    registered: AtomicBool,
}

impl HotkeyEntry {
    pub(crate) fn new(id: HotkeyId, modifiers: Modifiers, keycode: u32, callback: Callback) -> Self {
        Self {
            id,
            keycode,
            modifiers,
            callback,
            registered: AtomicBool::new(false),
        }
    }

    pub(crate) fn id(&self) -> HotkeyId {
        self.id
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        self.registered.store(registered, Ordering::SeqCst);
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }
}

/// Handle to a hotkey returned by a successful registration.
#[derive(Clone)]
pub struct Hotkey {
    entry: Arc<HotkeyEntry>,
}

impl Hotkey {
    pub(crate) fn from_entry(entry: Arc<HotkeyEntry>) -> Self {
        Self { entry }
    }

    pub(crate) fn entry(&self) -> &Arc<HotkeyEntry> {
        &self.entry
    }

    pub fn id(&self) -> HotkeyId {
        self.entry.id
    }

    pub fn keycode(&self) -> u32 {
        self.entry.keycode
    }

    pub fn modifiers(&self) -> Modifiers {
        self.entry.modifiers
    }

    pub fn is_registered(&self) -> bool {
        self.entry.is_registered()
    }

    /// `Hotkey[Id: 1, Ctrl+Shift+Z]`
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = char::from_u32(self.entry.keycode).unwrap_or(char::REPLACEMENT_CHARACTER);
        write!(f, "Hotkey[Id: {}, {}{}]", self.entry.id, self.entry.modifiers, key)
    }
}

impl fmt::Debug for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hotkey")
            .field("id", &self.entry.id)
            .field("modifiers", &self.entry.modifiers)
            .field("keycode", &self.entry.keycode)
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Table of live hotkeys. Mutated only from commands running on the owner
/// thread; the listener takes read snapshots.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    entries: Arc<RwLock<HashMap<HotkeyId, Arc<HotkeyEntry>>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, entry: Arc<HotkeyEntry>) {
        self.entries.blocking_write().insert(entry.id, entry);
    }

    pub(crate) fn remove(&self, id: HotkeyId) -> Option<Arc<HotkeyEntry>> {
        self.entries.blocking_write().remove(&id)
    }

    pub(crate) fn drain(&self) -> Vec<Arc<HotkeyEntry>> {
        self.entries
            .blocking_write()
            .drain()
            .map(|(_, entry)| entry)
            .collect()
    }

    /// Callback of a currently registered entry, cloned out so the lock is
    /// released before it runs.
    pub(crate) fn callback_for(&self, id: HotkeyId) -> Option<Callback> {
        let entries = self.entries.blocking_read();
        entries
            .get(&id)
            .filter(|entry| entry.is_registered())
            .map(|entry| Arc::clone(&entry.callback))
    }

    pub(crate) fn snapshot(&self) -> Vec<Hotkey> {
        let mut hotkeys: Vec<Hotkey> = self
            .entries
            .blocking_read()
            .values()
            .cloned()
            .map(Hotkey::from_entry)
            .collect();
        hotkeys.sort_by_key(Hotkey::id);
        hotkeys
    }
}
