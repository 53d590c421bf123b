use windows::Win32::Foundation::{
    LPARAM,
    WPARAM,
};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS,
    RegisterHotKey,
    UnregisterHotKey,
    VkKeyScanW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetMessageW,
    MSG,
    PM_NOREMOVE,
    PeekMessageW,
    PostThreadMessageW,
};

use super::{
    Platform,
    vk_from_scan,
};
use crate::models::{
    HotkeyError,
    HotkeyId,
    HotkeyResult,
    Modifiers,
    RawMessage,
    WM_USER,
};

/// Win32 backend. Hotkeys are registered without a window, so `WM_HOTKEY`
/// lands in the thread queue of whichever thread registered them.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for WindowsPlatform {
    fn name(&self) -> &str {
        "windows"
    }

    fn prime_queue(&self) -> HotkeyResult<()> {
        let mut msg = MSG::default();
        // The return value only says whether a message was waiting.
        let _ = unsafe { PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE) };
        Ok(())
    }

    fn current_thread_id(&self) -> u32 {
        unsafe { GetCurrentThreadId() }
    }

    fn register_hotkey(
        &self, id: HotkeyId, modifiers: Modifiers, keycode: u32,
    ) -> Result<(), String> {
        unsafe { RegisterHotKey(None, id, HOT_KEY_MODIFIERS(modifiers.bits()), keycode) }
            .map_err(|e| e.to_string())
    }

    fn unregister_hotkey(&self, id: HotkeyId) -> Result<(), String> {
        unsafe { UnregisterHotKey(None, id) }.map_err(|e| e.to_string())
    }

    fn next_message(&self) -> HotkeyResult<RawMessage> {
        let mut msg = MSG::default();
        let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if result.0 == -1 {
            return Err(HotkeyError::Platform(format!(
                "GetMessageW failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(RawMessage::new(msg.message, msg.wParam.0))
    }

    fn post_wake(&self, thread_id: u32) -> Result<(), String> {
        unsafe { PostThreadMessageW(thread_id, WM_USER, WPARAM(0), LPARAM(0)) }
            .map_err(|e| e.to_string())
    }

    fn keycode_for(&self, ch: char) -> Option<u32> {
        let unit = u16::try_from(u32::from(ch)).ok()?;
        vk_from_scan(unsafe { VkKeyScanW(unit) })
    }
}
