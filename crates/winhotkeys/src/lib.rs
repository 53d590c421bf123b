//! Global hotkeys served by a single owner thread.
//!
//! The OS delivers hotkey notifications to the message queue of the thread
//! that registered them, so every registration and every message retrieval is
//! marshaled onto one dedicated thread through a bounded command relay. A
//! separate listener thread keeps asking that thread for the next message and
//! runs the matching callback.

pub mod config;
mod listener;
pub mod manager;
pub mod models;
pub mod parser;
pub mod platforms;
pub mod registry;
mod relay;

pub use config::ManagerConfig;
pub use manager::HotkeyManager;
pub use models::{
    HotkeyError,
    HotkeyId,
    HotkeyResult,
    MessageKind,
    Modifiers,
    RawMessage,
};
pub use parser::KeySpec;
#[cfg(target_os = "windows")]
pub use platforms::DefaultPlatform;
pub use platforms::Platform;
pub use platforms::simulated::SimulatedPlatform;
pub use registry::Hotkey;
