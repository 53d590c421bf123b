use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
    mpsc,
};
use std::thread;
use std::time::Duration;

use winhotkeys::{
    HotkeyManager,
    ManagerConfig,
    Modifiers,
    RawMessage,
    SimulatedPlatform,
};

const WAIT: Duration = Duration::from_secs(5);

fn setup(config: ManagerConfig) -> (HotkeyManager<SimulatedPlatform>, Arc<SimulatedPlatform>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let platform = Arc::new(SimulatedPlatform::new());
    let manager = HotkeyManager::with_shared_platform(Arc::clone(&platform), config).unwrap();
    (manager, platform)
}

/// Waits until `tx` has been signalled `n` times.
fn expect_signals(rx: &mpsc::Receiver<()>, n: usize) {
    for _ in 0..n {
        rx.recv_timeout(WAIT).expect("callback did not fire");
    }
}

#[test]
fn test_press_fires_exactly_once_per_event() {
    let (manager, platform) = setup(ManagerConfig::default());
    let hits = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    manager.start_listening();
    let counter = Arc::clone(&hits);
    let hotkey = manager
        .register("ctrl+shift+z", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        })
        .unwrap();
    assert!(hotkey.is_registered());

    let combo = Modifiers::CTRL | Modifiers::SHIFT;
    assert_eq!(platform.press(combo, hotkey.keycode()), Some(hotkey.id()));
    expect_signals(&rx, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Unrelated combinations never reach the callback.
    assert_eq!(platform.press(Modifiers::CTRL, hotkey.keycode()), None);
    assert_eq!(platform.press(combo, 'Y' as u32), None);
    platform.inject(RawMessage::hotkey(0));
    platform.inject(RawMessage::hotkey(hotkey.id() + 100));
    platform.inject(RawMessage::new(0x0100, hotkey.id() as usize));

    platform.press(combo, hotkey.keycode());
    platform.press(combo, hotkey.keycode());
    expect_signals(&rx, 2);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    manager.shutdown();
}

#[test]
fn test_press_for_unregistered_id_is_ignored() {
    let (manager, platform) = setup(ManagerConfig::default());
    let hits = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();
    manager.start_listening();

    let counter = Arc::clone(&hits);
    let stale = manager
        .register("alt+s", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    manager.unregister(&stale).unwrap();

    // Press notification racing the unregister.
    platform.inject(RawMessage::hotkey(stale.id()));

    let probe = manager
        .register("alt+p", move || {
            let _ = tx.send(());
        })
        .unwrap();
    platform.press(Modifiers::ALT, probe.keycode());
    expect_signals(&rx, 1);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(manager.is_listening());
    manager.shutdown();
}

#[test]
fn test_registration_while_listening_from_many_threads() {
    let (manager, platform) = setup(ManagerConfig::default().with_relay_capacity(2));
    let manager = Arc::new(manager);
    manager.start_listening();

    let keys: Vec<char> = ('a'..='x').collect();
    let workers: Vec<_> = keys
        .chunks(6)
        .map(|chunk| {
            let manager = Arc::clone(&manager);
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                chunk
                    .into_iter()
                    .map(|key| manager.register(&format!("ctrl+alt+{key}"), || {}).unwrap())
                    .map(|hotkey| hotkey.id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<_> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids.len(), keys.len());
    assert_eq!(platform.registered_ids(), ids);
    assert_eq!(manager.registered().len(), keys.len());

    let manager = Arc::into_inner(manager).expect("workers finished");
    manager.shutdown();
    assert!(platform.registered_ids().is_empty());
}

#[test]
fn test_ids_strictly_increase_per_submitter() {
    let (manager, _platform) = setup(ManagerConfig::default());
    manager.start_listening();

    let mut last = 0;
    for key in ['1', '2', '3', '4', '5'] {
        let hotkey = manager.register(&format!("shift+win+{key}"), || {}).unwrap();
        assert!(hotkey.id() > last);
        last = hotkey.id();
        if key == '3' {
            manager.unregister(&hotkey).unwrap();
        }
    }
    manager.shutdown();
}

#[test]
fn test_panicking_callback_does_not_stop_listener() {
    let (manager, platform) = setup(ManagerConfig::default());
    let (tx, rx) = mpsc::channel();
    manager.start_listening();

    let faulty = manager.register("ctrl+f", || panic!("faulty callback")).unwrap();
    let healthy = manager
        .register("ctrl+h", move || {
            let _ = tx.send(());
        })
        .unwrap();

    platform.press(Modifiers::CTRL, faulty.keycode());
    platform.press(Modifiers::CTRL, healthy.keycode());
    expect_signals(&rx, 1);

    platform.press(Modifiers::CTRL, faulty.keycode());
    platform.press(Modifiers::CTRL, healthy.keycode());
    expect_signals(&rx, 1);
    manager.shutdown();
}

#[test]
fn test_callback_can_register_more_hotkeys() {
    let (manager, platform) = setup(ManagerConfig::default());
    let manager = Arc::new(manager);
    let registered = Arc::new(Mutex::new(None));
    let (tx, rx) = mpsc::channel();
    manager.start_listening();

    let inner_manager = Arc::downgrade(&manager);
    let slot = Arc::clone(&registered);
    let outer = manager
        .register("ctrl+o", move || {
            let Some(manager) = inner_manager.upgrade() else {
                return;
            };
            let tx = tx.clone();
            let hotkey = manager.register("ctrl+i", move || {
                let _ = tx.send(());
            });
            *slot.lock().unwrap() = Some(hotkey.map(|h| h.id()));
        })
        .unwrap();

    platform.press(Modifiers::CTRL, outer.keycode());
    let mut inner_id = None;
    for _ in 0..500 {
        if let Some(result) = registered.lock().unwrap().take() {
            inner_id = Some(result.unwrap());
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    let inner_id = inner_id.expect("nested registration finished");

    assert_eq!(platform.press(Modifiers::CTRL, 'I' as u32), Some(inner_id));
    expect_signals(&rx, 1);

    let manager = Arc::into_inner(manager).expect("only the test holds the manager");
    manager.shutdown();
}
