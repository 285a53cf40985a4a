// tests/integration_tests.rs
//
// Integration tests for the public API.
// These tests drive the full flow: add files -> run a batch -> download results.

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use image_batch::{
    BatchRunner, BatchState, ConversionRequest, ConvertError, Limits, OutputFormat, SourceImage,
    WorkingSet, ARCHIVE_NAME,
};
use std::io::{Cursor, Read};
use zip::ZipArchive;

// Helper to create an encoded test image
fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

fn mixed_inputs() -> Vec<SourceImage> {
    vec![
        SourceImage::new("one.png", "image/png", create_test_image(100, 100, ImageFormat::Png)),
        SourceImage::new("two.jpg", "image/jpeg", create_test_image(120, 60, ImageFormat::Jpeg)),
        SourceImage::new("notes.txt", "text/plain", b"hello".to_vec()),
        SourceImage::new("three.bmp", "image/bmp", create_test_image(40, 80, ImageFormat::Bmp)),
    ]
}

#[tokio::test]
async fn test_full_flow_to_archive() {
    let mut set = WorkingSet::new();
    let mut runner = BatchRunner::new(ConversionRequest::new(OutputFormat::WebP).with_size(50, 50))
        .with_limits(Limits::default());

    let added = runner.add_files(&mut set, mixed_inputs()).unwrap();
    assert_eq!(added.accepted, 3);
    assert_eq!(set.counter_text(), "3 images");

    let mut progress = Vec::new();
    let report = runner
        .run(&mut set, |p| progress.push((p.completed, p.total, p.percent())))
        .await
        .unwrap();

    assert_eq!(report.converted, 3);
    assert_eq!(progress, vec![(0, 3, 0), (1, 3, 33), (2, 3, 67), (3, 3, 100)]);
    assert_eq!(runner.state().to_string(), "Images converted successfully!");

    assert_eq!(set.converted(0).unwrap().dimensions(), (50, 50));
    assert_eq!(set.converted(1).unwrap().dimensions(), (50, 25));
    assert_eq!(set.converted(2).unwrap().dimensions(), (25, 50));

    let single = set.download(1).unwrap();
    assert_eq!(single.name, "two.webp");

    let bundle = set.download_all_async().await.unwrap().unwrap();
    assert_eq!(bundle.name, ARCHIVE_NAME);

    let mut zip = ZipArchive::new(Cursor::new(bundle.bytes)).unwrap();
    assert_eq!(zip.len(), 3);
    for (i, slot) in set.slots().iter().enumerate() {
        let converted = slot.converted.as_ref().unwrap();
        let mut file = zip.by_name(converted.name()).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, converted.bytes(), "entry {i}");
    }
}

#[tokio::test]
async fn test_batch_abort_leaves_positional_results() {
    let mut set = WorkingSet::new();
    set.add(vec![
        SourceImage::new("a.png", "image/png", create_test_image(10, 10, ImageFormat::Png)),
        SourceImage::new("b.png", "image/png", vec![0x89, b'P', b'N', b'G', 0, 0]),
        SourceImage::new("c.png", "image/png", create_test_image(10, 10, ImageFormat::Png)),
    ])
    .unwrap();
    let mut runner = BatchRunner::new(ConversionRequest::default());

    let err = runner.run(&mut set, |_| {}).await.unwrap_err();

    assert!(err.is_item_error());
    assert_eq!(runner.state(), &BatchState::Failed);
    assert_eq!(runner.state().to_string(), "Error during conversion");
    assert_eq!(set.converted(0).unwrap().name(), "a.jpg");
    assert!(set.converted(1).is_none());
    assert!(set.converted(2).is_none());

    // The archive still carries what was converted before the failure
    let bundle = set.download_all().unwrap().unwrap();
    let zip = ZipArchive::new(Cursor::new(bundle.bytes)).unwrap();
    assert_eq!(zip.len(), 1);
}

#[tokio::test]
async fn test_only_unsupported_files() {
    let mut set = WorkingSet::new();
    let mut runner = BatchRunner::new(ConversionRequest::default());
    let err = runner
        .add_files(&mut set, vec![SourceImage::new("a.tiff", "image/tiff", vec![1])])
        .unwrap_err();
    assert_eq!(err, ConvertError::NoSupportedFiles);
    assert!(set.is_empty());
    assert!(set.download_all().unwrap().is_none());
}

#[tokio::test]
async fn test_timeout_counts_as_item_failure() {
    let mut set = WorkingSet::new();
    set.add(vec![SourceImage::new(
        "huge.png",
        "image/png",
        create_test_image(3000, 3000, ImageFormat::Png),
    )])
    .unwrap();
    let mut runner = BatchRunner::new(ConversionRequest::new(OutputFormat::Png))
        .with_limits(Limits::custom().with_timeout_ms(1));

    let err = runner.run(&mut set, |_| {}).await.unwrap_err();

    assert!(matches!(err, ConvertError::Timeout { .. }));
    assert_eq!(runner.state(), &BatchState::Failed);
    assert!(set.converted(0).is_none());
}
