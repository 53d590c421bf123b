#![no_main]

use libfuzzer_sys::fuzz_target;
use winhotkeys::{
    HotkeyError,
    KeySpec,
};

fn lookup(c: char) -> Option<u32> {
    c.is_ascii_alphanumeric()
        .then(|| c.to_ascii_uppercase() as u32)
}

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        match KeySpec::parse(s, lookup) {
            Ok(spec) => assert_ne!(spec.keycode, 0),
            Err(HotkeyError::InvalidKey(_))
            | Err(HotkeyError::TooManyKeys(_))
            | Err(HotkeyError::MissingKey(_)) => {}
            Err(e) => panic!("unexpected parse error: {e}"),
        }
    }
});
