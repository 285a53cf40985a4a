#![no_main]

use image_batch::engine::{ConvertTask, Limits, SourceImage};
use image_batch::ops::{ConversionRequest, OutputFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let source = SourceImage::new("fuzz.bin", "image/png", data.to_vec());
    let task = ConvertTask::new(
        source,
        ConversionRequest::new(OutputFormat::Png).with_size(64, 64),
        "fuzz.png".to_string(),
    )
    .with_limits(Limits::strict());

    let _ = task.process();
});
