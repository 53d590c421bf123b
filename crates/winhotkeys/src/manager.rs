use std::sync::atomic::{
    AtomicBool,
    AtomicI32,
    Ordering,
};
use std::sync::{
    Arc,
    OnceLock,
};
use std::thread::JoinHandle;

use log::{
    debug,
    info,
    warn,
};

use crate::config::ManagerConfig;
use crate::listener::spawn_listener;
use crate::models::{
    HotkeyError,
    HotkeyId,
    HotkeyResult,
    Modifiers,
};
use crate::parser::KeySpec;
use crate::platforms::Platform;
use crate::registry::{
    Hotkey,
    HotkeyEntry,
    Registry,
};
use crate::relay::{
    CommandRelay,
    OwnerThread,
    PendingReply,
};

/// Owns the hotkey owner thread, the command relay, the registry and the
/// listener.
///
/// `register`, `unregister` and `shutdown` block the calling thread until the
/// owner thread has answered, so they must not be called from inside an async
/// runtime worker.
pub struct HotkeyManager<P: Platform> {
    platform: Arc<P>,
    config: ManagerConfig,
    registry: Registry,
    relay: Option<CommandRelay<P>>,
    owner: OwnerThread,
    last_id: AtomicI32,
    listening: AtomicBool,
    closing: Arc<AtomicBool>,
    listener: OnceLock<JoinHandle<()>>,
}

#[cfg(target_os = "windows")]
impl HotkeyManager<crate::platforms::DefaultPlatform> {
    pub fn new() -> HotkeyResult<Self> {
        Self::with_platform(
            crate::platforms::DefaultPlatform::new(),
            ManagerConfig::default(),
        )
    }
}

impl<P: Platform> HotkeyManager<P> {
    pub fn with_platform(platform: P, config: ManagerConfig) -> HotkeyResult<Self> {
        Self::with_shared_platform(Arc::new(platform), config)
    }

    /// Like [`HotkeyManager::with_platform`], keeping a handle to the platform
    /// for the caller.
    pub fn with_shared_platform(platform: Arc<P>, config: ManagerConfig) -> HotkeyResult<Self> {
        config.validate()?;

        let registry = Registry::new();
        let (owner, relay) = OwnerThread::spawn(
            Arc::clone(&platform),
            registry.clone(),
            config.relay_capacity,
            &config.owner_thread_name,
        )?;

        info!(
            "Created hotkey manager with platform: {} (relay capacity {})",
            platform.name(),
            config.relay_capacity
        );

        Ok(Self {
            platform,
            config,
            registry,
            relay: Some(relay),
            owner,
            last_id: AtomicI32::new(0),
            listening: AtomicBool::new(false),
            closing: Arc::new(AtomicBool::new(false)),
            listener: OnceLock::new(),
        })
    }

    /// Starts the listener loop. Calling it again has no effect.
    pub fn start_listening(&self) {
        let Some(relay) = self.relay.as_ref() else {
            return;
        };
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        match spawn_listener(
            relay.clone(),
            self.registry.clone(),
            Arc::clone(&self.closing),
            &self.config.listener_thread_name,
        ) {
            Ok(handle) => {
                let _ = self.listener.set(handle);
            }
            Err(e) => {
                warn!("{}", e);
                self.listening.store(false, Ordering::SeqCst);
            }
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn parse(&self, keys: &str) -> HotkeyResult<KeySpec> {
        KeySpec::parse(keys, |ch| self.platform.keycode_for(ch))
    }

    pub fn register<F>(&self, keys: &str, callback: F) -> HotkeyResult<Hotkey>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let spec = self.parse(keys)?;
        let relay = self.relay()?;

        let id = self.next_id();
        let entry = Arc::new(HotkeyEntry::new(
            id,
            spec.modifiers,
            spec.keycode,
            Arc::new(callback),
        ));

        let os_modifiers = if self.config.no_repeat {
            spec.modifiers | Modifiers::NO_REPEAT
        } else {
            spec.modifiers
        };

        let registry = self.registry.clone();
        let command_entry = Arc::clone(&entry);
        let pending = relay.dispatch(move |platform: &P| -> Result<(), String> {
            platform.register_hotkey(id, os_modifiers, spec.keycode)?;
            command_entry.set_registered(true);
            registry.insert(command_entry);
            Ok(())
        })?;

        self.await_with_wake(pending)?
            .map_err(|reason| HotkeyError::RegistrationFailed {
                spec: keys.to_string(),
                reason,
            })?;

        debug!("Registered hotkey {} ({})", id, keys);
        Ok(Hotkey::from_entry(entry))
    }

    pub fn unregister(&self, hotkey: &Hotkey) -> HotkeyResult<()> {
        if !hotkey.is_registered() {
            return Ok(());
        }
        let relay = self.relay()?;

        let id = hotkey.id();
        let registry = self.registry.clone();
        let entry = Arc::clone(hotkey.entry());
        let pending = relay.dispatch(move |platform: &P| -> Result<(), String> {
            // Already released, e.g. by a concurrent unregister of a cloned handle.
            if !entry.is_registered() {
                return Ok(());
            }
            platform.unregister_hotkey(id)?;
            entry.set_registered(false);
            registry.remove(id);
            Ok(())
        })?;

        self.await_with_wake(pending)?
            .map_err(|reason| HotkeyError::UnregistrationFailed { id, reason })?;

        debug!("Unregistered hotkey {}", id);
        Ok(())
    }

    /// Live hotkeys ordered by id.
    pub fn registered(&self) -> Vec<Hotkey> {
        self.registry.snapshot()
    }

    /// Stops the listener, unregisters every remaining hotkey on the owner
    /// thread and joins both threads.
    pub fn shutdown(mut self) {
        self.close();
        if let Some(listener) = self.listener.take()
            && listener.join().is_err()
        {
            warn!("Hotkey listener thread panicked");
        }
        self.owner.join();
        info!("Hotkey manager shut down");
    }

    fn relay(&self) -> HotkeyResult<&CommandRelay<P>> {
        self.relay.as_ref().ok_or(HotkeyError::RelayClosed)
    }

    fn next_id(&self) -> HotkeyId {
        // Ids are consumed even when registration fails.
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Nudges the listener's blocking retrieval so the owner thread reaches the
    /// queued command, then waits for the reply.
    fn await_with_wake<T>(&self, pending: PendingReply<T>) -> HotkeyResult<T> {
        if !self.is_listening() {
            return pending.wait();
        }

        let thread_id = self.owner.thread_id();
        match self.platform.post_wake(thread_id) {
            Ok(()) => pending.wait(),
            Err(reason) => match pending.withdraw() {
                Ok(()) => Err(HotkeyError::RelayPostFailed { thread_id, reason }),
                // The owner thread already picked the command up.
                Err(pending) => pending.wait(),
            },
        }
    }

    fn close(&mut self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.is_listening()
            && let Err(e) = self.platform.post_wake(self.owner.thread_id())
        {
            warn!("Failed to wake hotkey listener during shutdown: {}", e);
        }
        // Once the listener drops its clone, the owner thread drains and exits.
        self.relay = None;
    }
}

impl<P: Platform> Drop for HotkeyManager<P> {
    fn drop(&mut self) {
        self.close();
    }
}
