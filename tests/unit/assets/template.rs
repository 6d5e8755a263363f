use std::io::Cursor;

use super::*;
use crate::remote::memory::MemoryStore;

fn png_solid(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn raster_art_must_match_canvas() {
    let art = TemplateArt::Raster(PreparedImage::from_rgba_straight(image::RgbaImage::new(
        4, 4,
    )));
    assert!(BaseCardTemplate::new("t", Canvas::new(4, 5).unwrap(), art.clone()).is_err());
    assert!(BaseCardTemplate::new("t", Canvas::new(4, 4).unwrap(), art).is_ok());
    assert!(
        BaseCardTemplate::new("", Canvas::new(4, 4).unwrap(), TemplateArt::Transparent).is_err()
    );
}

#[test]
fn catalog_lookup_reports_not_found() {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(
        BaseCardTemplate::new("gold", Canvas::new(10, 10).unwrap(), TemplateArt::Transparent)
            .unwrap(),
    );
    assert_eq!(catalog.get("gold").unwrap().canvas.width, 10);
    assert!(matches!(
        catalog.get("silver"),
        Err(KitcardError::NotFound(_))
    ));
    assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["gold"]);
}

#[test]
fn load_scopes_failures_to_their_template() {
    let store = MemoryStore::new();
    store
        .insert("art/frame.png", png_solid(6, 8, [0, 0, 255, 255]), "image/png")
        .unwrap();

    let json = br#"[
        {"id": "frame", "width": 6, "height": 8, "slots": [{"x": 1, "y": 1, "width": 4, "height": 3}],
         "art": {"kind": "image", "storage_ref": "art/frame.png"}},
        {"id": "plain", "width": 6, "height": 8, "art": {"kind": "solid", "rgba": [255, 0, 0, 255]}},
        {"id": "broken", "width": 6, "height": 8, "art": {"kind": "image", "storage_ref": "art/missing.png"}}
    ]"#;
    let specs = TemplateCatalog::parse_specs(json).unwrap();

    let mut catalog = TemplateCatalog::new();
    let load = catalog.load(&specs, &store);
    assert_eq!(load.loaded, vec!["frame".to_string(), "plain".to_string()]);
    assert_eq!(load.failed.len(), 1);
    assert_eq!(load.failed[0].0, "broken");
    assert!(matches!(load.failed[0].1, KitcardError::Fetch(_)));

    let frame = catalog.get("frame").unwrap();
    assert_eq!(frame.slots, vec![Rect::new(1.0, 1.0, 5.0, 4.0)]);
    let TemplateArt::Raster(img) = &frame.art else {
        panic!("expected raster art");
    };
    assert_eq!(img.pixel(0, 0), [0, 0, 255, 255]);

    let plain = catalog.get("plain").unwrap();
    assert_eq!(
        plain.art,
        TemplateArt::Solid(Rgba8Premul::from_straight_rgba(255, 0, 0, 255))
    );
}

#[test]
fn malformed_catalog_json_is_serde_error() {
    assert!(matches!(
        TemplateCatalog::parse_specs(b"{not json"),
        Err(KitcardError::Serde(_))
    ));
}
