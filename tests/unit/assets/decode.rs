use std::io::Cursor;

use super::*;

fn encode(img: image::RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

fn png(w: u32, h: u32) -> Vec<u8> {
    encode(
        image::RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 7, 255])),
        ImageFormat::Png,
    )
}

#[test]
fn decode_upload_keeps_natural_size_and_premultiplies() {
    let bytes = encode(
        image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap(),
        ImageFormat::Png,
    );
    let decoded = decode_upload(&bytes, &UploadLimits::default(), 64).unwrap();
    assert_eq!(decoded.format, ImageFormat::Png);
    assert_eq!(decoded.content_type(), "image/png");
    assert_eq!((decoded.pixels.width, decoded.pixels.height), (1, 1));
    assert_eq!(
        decoded.pixels.pixel(0, 0),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
    assert_eq!(decoded.source_bytes.as_slice(), bytes.as_slice());
}

#[test]
fn thumbnail_is_downscaled_but_pixels_are_not() {
    let decoded = decode_upload(&png(800, 600), &UploadLimits::default(), 200).unwrap();
    assert_eq!((decoded.pixels.width, decoded.pixels.height), (800, 600));
    assert_eq!((decoded.thumbnail.width, decoded.thumbnail.height), (200, 150));
}

#[test]
fn byte_ceiling_is_checked_first() {
    let bytes = png(16, 16);
    let limits = UploadLimits {
        max_bytes: bytes.len() - 1,
        ..UploadLimits::default()
    };
    assert!(matches!(
        decode_upload(&bytes, &limits, 64),
        Err(KitcardError::TooLarge(_))
    ));
}

#[test]
fn pixel_area_ceiling_rejects_before_decode() {
    let limits = UploadLimits {
        max_pixels: 100,
        ..UploadLimits::default()
    };
    assert!(matches!(
        decode_upload(&png(11, 10), &limits, 64),
        Err(KitcardError::TooLarge(_))
    ));
    assert!(decode_upload(&png(10, 10), &limits, 64).is_ok());
}

#[test]
fn garbage_and_unaccepted_formats_are_invalid() {
    assert!(matches!(
        decode_upload(b"definitely not an image", &UploadLimits::default(), 64),
        Err(KitcardError::InvalidFormat(_))
    ));

    let bmp = encode(image::RgbaImage::new(2, 2), ImageFormat::Bmp);
    assert!(matches!(
        decode_upload(&bmp, &UploadLimits::default(), 64),
        Err(KitcardError::InvalidFormat(_))
    ));

    let mut truncated = png(8, 8);
    truncated.truncate(40);
    assert!(matches!(
        decode_upload(&truncated, &UploadLimits::default(), 64),
        Err(KitcardError::InvalidFormat(_))
    ));
}

#[test]
fn thumbnail_size_never_upscales() {
    assert_eq!(thumbnail_size(100, 50, 256), (100, 50));
    assert_eq!(thumbnail_size(1000, 10, 100), (100, 1));
    assert_eq!(thumbnail_size(600, 800, 80), (60, 80));
}

#[test]
fn unpremultiply_inverts_opaque_and_clears_transparent() {
    let mut px = vec![10u8, 20, 30, 255, 9, 9, 9, 0];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![10, 20, 30, 255, 0, 0, 0, 0]);

    let mut half = vec![64u8, 0, 128, 128];
    unpremultiply_rgba8_in_place(&mut half);
    assert_eq!(half, vec![128, 0, 255, 128]);
}
