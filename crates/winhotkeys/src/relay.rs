use std::sync::Arc;
use std::sync::atomic::{
    AtomicU8,
    Ordering,
};
use std::thread::{
    self,
    JoinHandle,
};

use log::{
    debug,
    info,
    warn,
};
use tokio::sync::{
    mpsc,
    oneshot,
};

use crate::models::{
    HotkeyError,
    HotkeyResult,
};
use crate::platforms::Platform;
use crate::registry::Registry;

type Command<P> = Box<dyn FnOnce(&P) + Send + 'static>;

const QUEUED: u8 = 0;
const STARTED: u8 = 1;
const WITHDRAWN: u8 = 2;

/// Sending half of the bounded FIFO that feeds the owner thread.
pub(crate) struct CommandRelay<P: Platform> {
    sender: mpsc::Sender<Command<P>>,
}

impl<P: Platform> Clone for CommandRelay<P> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<P: Platform> CommandRelay<P> {
    /// Queues `work` for the owner thread, blocking while the relay is full.
    pub(crate) fn dispatch<T, F>(&self, work: F) -> HotkeyResult<PendingReply<T>>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let state = Arc::new(AtomicU8::new(QUEUED));
        let command_state = Arc::clone(&state);

        let command: Command<P> = Box::new(move |platform| {
            if command_state
                .compare_exchange(QUEUED, STARTED, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
            // The submitter may have stopped waiting; the work is done either way.
            let _ = reply_tx.send(work(platform));
        });

        self.sender
            .blocking_send(command)
            .map_err(|_| HotkeyError::RelayClosed)?;

        Ok(PendingReply {
            state,
            reply: reply_rx,
        })
    }

    /// Runs `work` on the owner thread and waits for its result.
    pub(crate) fn call<T, F>(&self, work: F) -> HotkeyResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> T + Send + 'static,
    {
        self.dispatch(work)?.wait()
    }
}

/// Single-use reply channel for one dispatched command.
pub(crate) struct PendingReply<T> {
    state: Arc<AtomicU8>,
    reply: oneshot::Receiver<T>,
}

impl<T> PendingReply<T> {
    pub(crate) fn wait(self) -> HotkeyResult<T> {
        self.reply
            .blocking_recv()
            .map_err(|_| HotkeyError::RelayClosed)
    }

    /// Cancels the command if the owner thread has not picked it up yet.
    /// Hands the reply back when the command is already running or done.
    pub(crate) fn withdraw(self) -> Result<(), Self> {
        match self
            .state
            .compare_exchange(QUEUED, WITHDRAWN, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(_) => Err(self),
        }
    }
}

/// The thread that owns the OS message queue.
pub(crate) struct OwnerThread {
    thread_id: u32,
    handle: Option<JoinHandle<()>>,
}

impl OwnerThread {
    pub(crate) fn spawn<P: Platform>(
        platform: Arc<P>, registry: Registry, capacity: usize, name: &str,
    ) -> HotkeyResult<(Self, CommandRelay<P>)> {
        let (sender, mut receiver) = mpsc::channel::<Command<P>>(capacity);
        let (ready_tx, ready_rx) = oneshot::channel::<HotkeyResult<u32>>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                // Must precede anything else so the OS creates this thread's queue.
                if let Err(e) = platform.prime_queue() {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                let thread_id = platform.current_thread_id();
                if ready_tx.send(Ok(thread_id)).is_err() {
                    return;
                }
                info!(
                    "Hotkey owner thread {} started on {} platform",
                    thread_id,
                    platform.name()
                );

                while let Some(command) = receiver.blocking_recv() {
                    command(platform.as_ref());
                }

                release_all(platform.as_ref(), &registry);
                info!("Hotkey owner thread {} stopped", thread_id);
            })
            .map_err(|e| HotkeyError::Platform(format!("Failed to spawn owner thread: {e}")))?;

        let thread_id = match ready_rx.blocking_recv() {
            Ok(Ok(thread_id)) => thread_id,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(HotkeyError::Platform(
                    "Owner thread exited during startup".to_string(),
                ));
            }
        };

        Ok((
            Self {
                thread_id,
                handle: Some(handle),
            },
            CommandRelay { sender },
        ))
    }

    pub(crate) fn thread_id(&self) -> u32 {
        self.thread_id
    }

    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Hotkey owner thread panicked");
        }
    }
}

// Runs on the owner thread once the relay has closed.
fn release_all<P: Platform>(platform: &P, registry: &Registry) {
    for entry in registry.drain() {
        let id = entry.id();
        if let Err(e) = platform.unregister_hotkey(id) {
            warn!("Failed to unregister hotkey {} during shutdown: {}", id, e);
        }
        entry.set_registered(false);
        debug!("Released hotkey {}", id);
    }
}
