use std::collections::{
    HashMap,
    HashSet,
};
use std::sync::atomic::{
    AtomicU32,
    Ordering,
};
use std::thread::{
    self,
    ThreadId,
};

use log::debug;
use tokio::sync::{
    Mutex,
    mpsc,
};

use super::Platform;
use crate::models::{
    HotkeyError,
    HotkeyId,
    HotkeyResult,
    Modifiers,
    RawMessage,
};

static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(1000);

type Combo = (u32, u32);

fn combo(modifiers: Modifiers, keycode: u32) -> Combo {
    (modifiers.bits() & !Modifiers::NO_REPEAT.bits(), keycode)
}

#[derive(Default)]
struct SimState {
    owner: Option<ThreadId>,
    hotkeys: HashMap<HotkeyId, Combo>,
    reserved: HashSet<Combo>,
    fail_posts: bool,
    fail_unregister: bool,
    failing_messages: usize,
    message_requests: usize,
}

/// In-process stand-in for the Win32 thread message queue.
///
/// Like the real queue it belongs to the thread that primes it: hotkey
/// registration and message retrieval from any other thread are refused.
/// Tests drive it by injecting presses and raw messages.
pub struct SimulatedPlatform {
    thread_id: u32,
    queue_tx: mpsc::UnboundedSender<RawMessage>,
    queue_rx: Mutex<mpsc::UnboundedReceiver<RawMessage>>,
    state: Mutex<SimState>,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            thread_id: NEXT_THREAD_ID.fetch_add(1, Ordering::SeqCst),
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
            state: Mutex::new(SimState::default()),
        }
    }

    /// Marks a combination as owned by some other process.
    pub fn reserve(&self, modifiers: Modifiers, keycode: u32) {
        self.state
            .blocking_lock()
            .reserved
            .insert(combo(modifiers, keycode));
    }

    /// Delivers `WM_HOTKEY` for the hotkey bound to this combination, if any.
    pub fn press(&self, modifiers: Modifiers, keycode: u32) -> Option<HotkeyId> {
        let pressed = combo(modifiers, keycode);
        let id = {
            let state = self.state.blocking_lock();
            state
                .hotkeys
                .iter()
                .find(|(_, bound)| **bound == pressed)
                .map(|(id, _)| *id)
        }?;

        debug!("Simulated press of hotkey {}", id);
        self.inject(RawMessage::hotkey(id));
        Some(id)
    }

    pub fn inject(&self, message: RawMessage) {
        // The receiver lives as long as self.
        let _ = self.queue_tx.send(message);
    }

    pub fn fail_posts(&self, fail: bool) {
        self.state.blocking_lock().fail_posts = fail;
    }

    pub fn fail_unregister(&self, fail: bool) {
        self.state.blocking_lock().fail_unregister = fail;
    }

    /// Makes the next `count` message retrievals fail before touching the queue.
    pub fn fail_next_messages(&self, count: usize) {
        self.state.blocking_lock().failing_messages = count;
    }

    /// Number of message retrievals attempted so far, failed ones included.
    pub fn message_requests(&self) -> usize {
        self.state.blocking_lock().message_requests
    }

    pub fn is_registered(&self, id: HotkeyId) -> bool {
        self.state.blocking_lock().hotkeys.contains_key(&id)
    }

    pub fn registered_ids(&self) -> Vec<HotkeyId> {
        let mut ids: Vec<_> = self
            .state
            .blocking_lock()
            .hotkeys
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }

    fn check_owner(state: &SimState) -> Result<(), String> {
        match state.owner {
            Some(owner) if owner == thread::current().id() => Ok(()),
            Some(_) => Err("called from a thread that does not own the message queue".to_string()),
            None => Err("message queue has not been created".to_string()),
        }
    }
}

impl Platform for SimulatedPlatform {
    fn name(&self) -> &str {
        "simulated"
    }

    fn prime_queue(&self) -> HotkeyResult<()> {
        let mut state = self.state.blocking_lock();
        if state.owner.is_some() {
            return Err(HotkeyError::Platform(
                "message queue already owned by another thread".to_string(),
            ));
        }
        state.owner = Some(thread::current().id());
        Ok(())
    }

    fn current_thread_id(&self) -> u32 {
        self.thread_id
    }

    fn register_hotkey(
        &self, id: HotkeyId, modifiers: Modifiers, keycode: u32,
    ) -> Result<(), String> {
        let mut state = self.state.blocking_lock();
        Self::check_owner(&state)?;

        let wanted = combo(modifiers, keycode);
        if state.reserved.contains(&wanted) || state.hotkeys.values().any(|c| *c == wanted) {
            return Err("Hot key is already registered".to_string());
        }
        if state.hotkeys.contains_key(&id) {
            return Err(format!("Hot key id {id} is already in use"));
        }

        state.hotkeys.insert(id, wanted);
        Ok(())
    }

    fn unregister_hotkey(&self, id: HotkeyId) -> Result<(), String> {
        let mut state = self.state.blocking_lock();
        Self::check_owner(&state)?;

        if state.fail_unregister {
            return Err("simulated unregister failure".to_string());
        }
        state
            .hotkeys
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| "Hot key is not registered".to_string())
    }

    fn next_message(&self) -> HotkeyResult<RawMessage> {
        {
            let mut state = self.state.blocking_lock();
            Self::check_owner(&state).map_err(HotkeyError::Platform)?;
            state.message_requests += 1;
            if state.failing_messages > 0 {
                state.failing_messages -= 1;
                return Err(HotkeyError::Platform(
                    "simulated message retrieval failure".to_string(),
                ));
            }
        }

        self.queue_rx
            .blocking_lock()
            .blocking_recv()
            .ok_or_else(|| HotkeyError::Platform("message queue closed".to_string()))
    }

    fn post_wake(&self, thread_id: u32) -> Result<(), String> {
        let state = self.state.blocking_lock();
        if state.fail_posts {
            return Err("simulated post failure".to_string());
        }
        if thread_id != self.thread_id || state.owner.is_none() {
            return Err("Invalid thread identifier".to_string());
        }
        drop(state);

        self.inject(RawMessage::wake());
        Ok(())
    }

    fn keycode_for(&self, ch: char) -> Option<u32> {
        let code = match ch {
            'a'..='z' | 'A'..='Z' => ch.to_ascii_uppercase() as u32,
            '0'..='9' | ' ' => ch as u32,
            ';' => 0xBA,
            '=' => 0xBB,
            ',' => 0xBC,
            '-' => 0xBD,
            '.' => 0xBE,
            '/' => 0xBF,
            _ => return None,
        };
        Some(code)
    }
}
