#![no_main]

use janus::scramble::transform;
use janus::{Frame, Key, ScrambleDirection};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let r = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let s = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let width = (data[8] as usize % 8) + 1;
    let channels = (data[9] as usize % 4) + 1;
    let pixels = &data[10..];
    let stride = width * channels;
    let height = pixels.len() / stride;

    let Ok(frame) = Frame::from_raw(height, width, channels, pixels[..height * stride].to_vec())
    else {
        return;
    };
    let key = Key::new(r, s);

    let scrambled = transform(&frame, key, ScrambleDirection::Forward);
    assert_eq!(transform(&scrambled, key, ScrambleDirection::Inverse), frame);
});
