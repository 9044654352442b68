#![no_main]

use janus::Key;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (r, s) = text.split_once(',').unwrap_or((text.as_ref(), ""));
    let previous = Key::new(1, 1);
    let (key, error) = Key::parse_or(previous, r, s);
    if error.is_some() {
        assert_eq!(key, previous);
    }
});
