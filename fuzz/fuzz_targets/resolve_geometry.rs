#![no_main]

use arbitrary::Arbitrary;
use image_batch::engine::resolve_dimensions;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    orig_w: u32,
    orig_h: u32,
    target_w: u32,
    target_h: u32,
    preserve_aspect: bool,
}

fuzz_target!(|input: Input| {
    let (w, h) = resolve_dimensions(
        input.orig_w,
        input.orig_h,
        input.target_w,
        input.target_h,
        input.preserve_aspect,
    );

    if input.orig_w > 0 && input.orig_h > 0 {
        assert!(w >= 1 && h >= 1);
    }
    if input.preserve_aspect && input.target_w > 0 && input.target_h > 0 && input.orig_w > 0 && input.orig_h > 0 {
        assert!(w <= input.target_w && h <= input.target_h);
    }
});
