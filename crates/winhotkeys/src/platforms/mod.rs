#[cfg(target_os = "windows")]
pub mod windows;

pub mod simulated;

use crate::models::{
    HotkeyId,
    HotkeyResult,
    Modifiers,
    RawMessage,
};

/// OS primitives behind global hotkeys.
///
/// Everything except [`Platform::post_wake`] and [`Platform::keycode_for`] is
/// thread-affine: it must run on the thread that called
/// [`Platform::prime_queue`]. The manager guarantees this by calling those
/// methods only from commands executed on its owner thread.
pub trait Platform: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Forces the OS to allocate a message queue for the calling thread.
    fn prime_queue(&self) -> HotkeyResult<()>;

    fn current_thread_id(&self) -> u32;

    fn register_hotkey(
        &self, id: HotkeyId, modifiers: Modifiers, keycode: u32,
    ) -> Result<(), String>;

    fn unregister_hotkey(&self, id: HotkeyId) -> Result<(), String>;

    /// Blocks until the next message arrives on the calling thread's queue.
    fn next_message(&self) -> HotkeyResult<RawMessage>;

    /// Posts the reserved wake message to `thread_id`'s queue. Callable from any thread.
    fn post_wake(&self, thread_id: u32) -> Result<(), String>;

    fn keycode_for(&self, ch: char) -> Option<u32>;
}

#[cfg(target_os = "windows")]
pub type DefaultPlatform = windows::WindowsPlatform;

/// Maps a `VkKeyScanW` result to a virtual-key code. `-1` means the active
/// layout has no key for the character; the high byte carries shift state and
/// is dropped.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn vk_from_scan(scan: i16) -> Option<u32> {
    if scan == -1 {
        return None;
    }
    Some(u32::from(scan as u16 & 0x00FF))
}
