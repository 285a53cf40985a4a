// tests/edge_cases.rs
//
// Edge case tests for image-batch
// Tests boundary values, invalid inputs, and error handling

use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage, Rgba, RgbaImage};
use image_batch::engine::{
    check_dimensions, encode_jpeg, encode_png, resolve_dimensions, ConvertTask, Limits,
    OutputNamer, SourceImage, MAX_DIMENSION,
};
use image_batch::error::{ConvertError, ErrorCategory};
use image_batch::ops::{ConversionRequest, NamingPolicy, OutputFormat};
use std::io::Cursor;

// Helper function to create test images
fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

// Helper to create valid JPEG of specified size
fn create_valid_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = create_test_image(width, height);
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let pixels = rgb.into_raw();

    use mozjpeg::ColorSpace;
    use mozjpeg::Compress;

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(w as usize, h as usize);
    comp.set_quality(80.0);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));

    let mut output = Vec::new();
    {
        let mut writer = comp.start_compress(&mut output).unwrap();
        let stride = w as usize * 3;
        for row in pixels.chunks(stride) {
            writer.write_scanlines(row).unwrap();
        }
        writer.finish().unwrap();
    }
    output
}

fn encode_with(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn run(source: SourceImage, request: ConversionRequest) -> Result<image_batch::ConvertedImage, ConvertError> {
    let name = OutputNamer::with_stamp(42).name_for(&source, 0, &request);
    ConvertTask::new(source, request, name)
        .with_limits(Limits::disabled())
        .process()
}

mod minimal_image_tests {
    use super::*;

    #[test]
    fn test_1x1_every_format() {
        let png = encode_with(&create_test_image(1, 1), ImageFormat::Png);
        for format in OutputFormat::ALL {
            let out = run(
                SourceImage::new("dot.png", "image/png", png.clone()),
                ConversionRequest::new(format),
            )
            .unwrap();
            assert_eq!(out.dimensions(), (1, 1), "{format:?}");
        }
    }

    #[test]
    fn test_1x1_upscale_to_box() {
        let png = encode_with(&create_test_image(1, 1), ImageFormat::Png);
        let out = run(
            SourceImage::new("dot.png", "image/png", png),
            ConversionRequest::new(OutputFormat::Png).with_size(100, 50),
        )
        .unwrap();
        assert_eq!(out.dimensions(), (50, 50));
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(resolve_dimensions(1000, 1, 10, 10, true), (10, 1));
        assert_eq!(resolve_dimensions(1, 1000, 10, 10, true), (1, 10));
    }
}

mod invalid_input_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let err = run(
            SourceImage::new("empty.png", "image/png", Vec::new()),
            ConversionRequest::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::DecodeFailed { .. }));
        assert_eq!(err.category(), ErrorCategory::CodecError);
    }

    #[test]
    fn test_truncated_jpeg() {
        let mut jpeg = create_valid_jpeg(64, 64);
        jpeg.truncate(jpeg.len() / 2);
        let err = run(
            SourceImage::new("cut.jpg", "image/jpeg", jpeg),
            ConversionRequest::new(OutputFormat::Png),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::DecodeFailed { ref name, .. } if name == "cut.jpg"));
    }

    #[test]
    fn test_corrupt_jpeg_body_keeps_source_name() {
        let mut jpeg = create_valid_jpeg(64, 64);
        for byte in &mut jpeg[20..220] {
            *byte = 0xFF;
        }
        let err = run(
            SourceImage::new("bad.jpg", "image/jpeg", jpeg),
            ConversionRequest::new(OutputFormat::Png),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::DecodeFailed { ref name, .. } if name == "bad.jpg"));
        assert_eq!(err.category(), ErrorCategory::CodecError);
        assert!(err.is_item_error());
    }

    #[test]
    fn test_random_bytes() {
        let err = run(
            SourceImage::new("noise.webp", "image/webp", vec![0xAB; 512]),
            ConversionRequest::default(),
        )
        .unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.is_item_error());
    }

    #[test]
    fn test_content_wins_over_declared_mime() {
        let jpeg = create_valid_jpeg(20, 10);
        let out = run(
            SourceImage::new("liar.png", "image/png", jpeg),
            ConversionRequest::new(OutputFormat::Bmp),
        )
        .unwrap();
        assert_eq!(out.dimensions(), (20, 10));
    }

    #[test]
    fn test_output_dimension_limit() {
        assert!(check_dimensions(MAX_DIMENSION, 1).is_ok());
        let png = encode_with(&create_test_image(4, 4), ImageFormat::Png);
        let err = run(
            SourceImage::new("a.png", "image/png", png),
            ConversionRequest::new(OutputFormat::Png)
                .with_size(MAX_DIMENSION + 1, 1)
                .with_preserve_aspect(false),
        )
        .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ResourceLimit);
    }

    #[test]
    fn test_pixel_limit_on_decoded_source() {
        let png = encode_with(&create_test_image(8, 8), ImageFormat::Png);
        let source = SourceImage::new("a.png", "image/png", png);
        let request = ConversionRequest::new(OutputFormat::Png);
        let name = OutputNamer::with_stamp(1).name_for(&source, 0, &request);
        let mut limits = Limits::custom();
        limits.max_pixels = Some(32);
        let err = ConvertTask::new(source, request, name)
            .with_limits(limits)
            .process()
            .unwrap_err();
        assert!(matches!(err, ConvertError::PixelCountExceedsLimit { .. }));
    }
}

mod naming_tests {
    use super::*;

    #[test]
    fn test_name_without_extension() {
        let png = encode_with(&create_test_image(2, 2), ImageFormat::Png);
        let out = run(
            SourceImage::new("README", "image/png", png),
            ConversionRequest::new(OutputFormat::WebP),
        )
        .unwrap();
        assert_eq!(out.name(), "README.webp");
    }

    #[test]
    fn test_multi_dot_name() {
        let png = encode_with(&create_test_image(2, 2), ImageFormat::Png);
        let out = run(
            SourceImage::new("scan.2024.01.png", "image/png", png),
            ConversionRequest::new(OutputFormat::Jpeg),
        )
        .unwrap();
        assert_eq!(out.name(), "scan.2024.01.jpg");
    }

    #[test]
    fn test_synthetic_name() {
        let png = encode_with(&create_test_image(2, 2), ImageFormat::Png);
        let out = run(
            SourceImage::new("a.png", "image/png", png),
            ConversionRequest::new(OutputFormat::Gif).with_naming(NamingPolicy::Synthetic),
        )
        .unwrap();
        assert_eq!(out.name(), "image_42_1.gif");
    }
}

mod quality_tests {
    use super::*;

    fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let b = state.to_le_bytes();
            image::Rgb([b[0], b[1], b[2]])
        });
        encode_with(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    fn size_at(format: OutputFormat, quality: f32) -> usize {
        run(
            SourceImage::new("noise.png", "image/png", noisy_png(128, 128)),
            ConversionRequest::new(format).with_quality(quality),
        )
        .unwrap()
        .bytes()
        .len()
    }

    #[test]
    fn test_jpeg_quality_reaches_encoder() {
        assert!(size_at(OutputFormat::Jpeg, 0.2) < size_at(OutputFormat::Jpeg, 0.95));
    }

    #[test]
    fn test_webp_quality_reaches_encoder() {
        assert!(size_at(OutputFormat::WebP, 0.2) < size_at(OutputFormat::WebP, 0.95));
    }

    #[test]
    fn test_jpeg_quality_zero_still_encodes() {
        let img = create_test_image(32, 32);
        let bytes = encode_jpeg(&img, 0).unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (32, 32));
    }

    #[test]
    fn test_quality_ignored_for_lossless() {
        let png = encode_with(&create_test_image(16, 16), ImageFormat::Png);
        let low = run(
            SourceImage::new("a.png", "image/png", png.clone()),
            ConversionRequest::new(OutputFormat::Png).with_quality(0.1),
        )
        .unwrap();
        let high = run(
            SourceImage::new("a.png", "image/png", png),
            ConversionRequest::new(OutputFormat::Png).with_quality(0.95),
        )
        .unwrap();
        assert_eq!(low.bytes(), high.bytes());
    }

    #[test]
    fn test_png_roundtrip_is_exact() {
        let img = create_test_image(10, 7);
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.as_raw(), img.to_rgb8().as_raw());
    }

    #[test]
    fn test_webp_keeps_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0])));
        let png = encode_with(&img, ImageFormat::Png);
        let out = run(
            SourceImage::new("clear.png", "image/png", png),
            ConversionRequest::new(OutputFormat::WebP),
        )
        .unwrap();
        let decoded = image::load_from_memory(out.bytes()).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.to_rgba8().get_pixel(4, 4).0[3], 0);
    }

    #[test]
    fn test_bmp_drops_alpha_onto_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let png = encode_with(&img, ImageFormat::Png);
        let out = run(
            SourceImage::new("clear.png", "image/png", png),
            ConversionRequest::new(OutputFormat::Bmp),
        )
        .unwrap();
        let decoded = image::load_from_memory(out.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 255, 255]);
    }
}
