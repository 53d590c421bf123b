use std::any::Any;
use std::panic::{
    self,
    AssertUnwindSafe,
};
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::thread::{
    self,
    JoinHandle,
};
use std::time::Duration;

use log::{
    debug,
    error,
    info,
    trace,
    warn,
};

use crate::models::{
    HotkeyError,
    HotkeyId,
    HotkeyResult,
    MessageKind,
};
use crate::platforms::Platform;
use crate::registry::Registry;
use crate::relay::CommandRelay;

// Consecutive retrieval failures tolerated before the listener gives up.
const MAX_RETRIEVAL_FAILURES: u32 = 5;
const RETRIEVAL_BACKOFF: Duration = Duration::from_millis(10);

pub(crate) fn spawn_listener<P: Platform>(
    relay: CommandRelay<P>, registry: Registry, closing: Arc<AtomicBool>, name: &str,
) -> HotkeyResult<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            info!("Hotkey listener started");
            listen(&relay, &registry, &closing);
            info!("Hotkey listener stopped");
        })
        .map_err(|e| HotkeyError::Platform(format!("Failed to spawn listener thread: {e}")))
}

fn listen<P: Platform>(relay: &CommandRelay<P>, registry: &Registry, closing: &AtomicBool) {
    let mut failures = 0u32;

    while !closing.load(Ordering::SeqCst) {
        // Blocks the owner thread in its message pump until a message arrives;
        // register/unregister post a wake so queued commands still get a turn.
        let message = match relay.call(|platform| platform.next_message()) {
            Ok(Ok(message)) => {
                failures = 0;
                message
            }
            Ok(Err(e)) => {
                failures += 1;
                if failures >= MAX_RETRIEVAL_FAILURES {
                    error!(
                        "Giving up on hotkey messages after {} consecutive failures: {}",
                        failures, e
                    );
                    break;
                }
                warn!("Failed to retrieve hotkey message (attempt {}): {}", failures, e);
                thread::sleep(RETRIEVAL_BACKOFF * 2u32.pow(failures - 1));
                continue;
            }
            Err(_) => break,
        };

        if closing.load(Ordering::SeqCst) {
            break;
        }

        match message.kind() {
            MessageKind::Wake => trace!("Listener woken to service queued commands"),
            MessageKind::Hotkey(id) => dispatch(registry, id),
            MessageKind::Other => trace!("Ignoring message {:#06x}", message.message),
        }
    }
}

fn dispatch(registry: &Registry, id: HotkeyId) {
    if id == 0 {
        return;
    }

    // A concurrent unregister may already have removed the entry.
    let Some(callback) = registry.callback_for(id) else {
        debug!("No registered hotkey for id {}", id);
        return;
    };

    debug!("Hotkey {} pressed", id);
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
        error!("Callback for hotkey {} panicked: {}", id, panic_message(payload.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::models::{
        Modifiers,
        RawMessage,
    };
    use crate::platforms::simulated::SimulatedPlatform;
    use crate::registry::HotkeyEntry;
    use crate::relay::OwnerThread;

    fn registered_entry(
        id: HotkeyId, callback: impl Fn() + Send + Sync + 'static,
    ) -> Arc<HotkeyEntry> {
        let entry = Arc::new(HotkeyEntry::new(
            id,
            Modifiers::CTRL,
            'P' as u32,
            Arc::new(callback),
        ));
        entry.set_registered(true);
        entry
    }

    #[test]
    fn test_dispatch_invokes_registered_callback() {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        registry.insert(registered_entry(1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        dispatch(&registry, 1);
        dispatch(&registry, 1);
        dispatch(&registry, 2);
        dispatch(&registry, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispatch_skips_unregistered_entry() {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let entry = registered_entry(4, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.insert(Arc::clone(&entry));
        entry.set_registered(false);

        dispatch(&registry, 4);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_contains_panicking_callback() {
        let registry = Registry::new();
        registry.insert(registered_entry(9, || panic!("boom")));
        dispatch(&registry, 9);

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }

    #[test]
    fn test_listener_stops_after_repeated_retrieval_failures() {
        let _ = env_logger::builder().is_test(true).try_init();
        let platform = Arc::new(SimulatedPlatform::new());
        let registry = Registry::new();
        let (mut owner, relay) =
            OwnerThread::spawn(Arc::clone(&platform), registry.clone(), 4, "test-owner").unwrap();

        platform.fail_next_messages(usize::MAX);
        let closing = AtomicBool::new(false);
        listen(&relay, &registry, &closing);

        assert_eq!(platform.message_requests(), MAX_RETRIEVAL_FAILURES as usize);
        drop(relay);
        owner.join();
    }

    #[test]
    fn test_listener_recovers_from_transient_retrieval_failure() {
        let _ = env_logger::builder().is_test(true).try_init();
        let platform = Arc::new(SimulatedPlatform::new());
        let registry = Registry::new();
        let (mut owner, relay) =
            OwnerThread::spawn(Arc::clone(&platform), registry.clone(), 4, "test-owner").unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        registry.insert(registered_entry(3, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // Fails twice, then a press arrives.
        platform.fail_next_messages(2);
        platform.inject(RawMessage::hotkey(3));

        let closing = Arc::new(AtomicBool::new(false));
        let listener = spawn_listener(
            relay.clone(),
            registry.clone(),
            Arc::clone(&closing),
            "test-listener",
        )
        .unwrap();

        for _ in 0..500 {
            if hits.load(Ordering::SeqCst) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        closing.store(true, Ordering::SeqCst);
        platform.post_wake(platform.thread_id()).unwrap();
        listener.join().unwrap();
        drop(relay);
        owner.join();
    }
}
