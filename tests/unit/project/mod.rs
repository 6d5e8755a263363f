use std::io::Cursor;

use super::restore::restore_project;
use super::*;
use crate::assets::template::{BaseCardTemplate, TemplateArt, TemplateCatalog};
use crate::document::model::UploadMeta;
use crate::foundation::config::SessionOpts;
use crate::foundation::core::Canvas;
use crate::remote::memory::MemoryStore;
use crate::render::cpu::render_canvas;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 3, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn catalog() -> TemplateCatalog {
    let mut c = TemplateCatalog::new();
    c.insert(
        BaseCardTemplate::new("card", Canvas::new(60, 80).unwrap(), TemplateArt::Transparent)
            .unwrap(),
    );
    c
}

fn saved_document(store: &MemoryStore) -> CardDocument {
    store.insert("src/a.png", png(40, 30), "image/png").unwrap();
    let mut doc = CardDocument::new();
    doc.select_base_card(&catalog(), "card").unwrap();
    let id = doc
        .add_upload(
            &png(40, 30),
            UploadMeta {
                name: "a.png".into(),
                storage_ref: Some("src/a.png".into()),
            },
            &SessionOpts::default(),
        )
        .unwrap()
        .id;
    doc.add_cutout(id, Rect::new(0.0, 0.0, 20.0, 20.0), CutoutTransform::at(5.0, 5.0))
        .unwrap();
    let hidden = doc
        .add_cutout(
            id,
            Rect::new(10.0, 5.0, 30.0, 25.0),
            CutoutTransform::at(30.0, 40.0).with_rotation(45.0),
        )
        .unwrap()
        .id;
    doc.set_cutout_visible(hidden, false).unwrap();
    doc
}

#[test]
fn json_uses_camel_case_schema() {
    let store = MemoryStore::new();
    let project = saved_document(&store).to_project().unwrap();
    let value: serde_json::Value = serde_json::from_str(&project.to_json().unwrap()).unwrap();

    assert_eq!(value["baseCardId"], "card");
    assert_eq!(value["images"][0]["storageRef"], "src/a.png");
    assert_eq!(value["images"][0]["width"], 40);
    let c = &value["cutouts"][1];
    assert_eq!(c["zIndex"], 1);
    assert_eq!(c["visible"], false);
    assert_eq!(c["cropRect"]["width"], 20.0);
    assert_eq!(c["transform"]["rotation"], 45.0);
    assert_eq!(c["sourceImageRef"], value["images"][0]["id"]);
}

#[test]
fn json_round_trip_preserves_description() {
    let store = MemoryStore::new();
    let project = saved_document(&store).to_project().unwrap();
    let json = project.to_json().unwrap();
    assert_eq!(ProjectDescription::from_json(json.as_bytes()).unwrap(), project);
}

#[test]
fn to_project_requires_storage_refs() {
    let mut doc = CardDocument::new();
    doc.add_upload(&png(4, 4), UploadMeta::named("x"), &SessionOpts::default())
        .unwrap();
    assert!(matches!(doc.to_project(), Err(KitcardError::Serde(_))));
}

#[test]
fn validation_rejects_broken_references() {
    let dangling = br#"{"cutouts":[{"sourceImageRef":9,"cropRect":{"x":0,"y":0,"width":1,"height":1},"transform":{"x":0,"y":0,"scale":1},"zIndex":0}]}"#;
    assert!(matches!(
        ProjectDescription::from_json(dangling),
        Err(KitcardError::Serde(_))
    ));

    let bad_crop = br#"{"images":[{"id":1,"storageRef":"a.png","width":4,"height":4}],
        "cutouts":[{"sourceImageRef":1,"cropRect":{"x":2,"y":0,"width":3,"height":1},"transform":{"x":0,"y":0,"scale":1},"zIndex":0}]}"#;
    assert!(matches!(
        ProjectDescription::from_json(bad_crop),
        Err(KitcardError::InvalidCrop(_))
    ));

    assert!(matches!(
        ProjectDescription::from_json(b"{not json"),
        Err(KitcardError::Serde(_))
    ));
}

#[test]
fn restore_renders_identically() {
    let store = MemoryStore::new();
    let doc = saved_document(&store);
    let project = doc.to_project().unwrap();

    let restored =
        restore_project(&project, &catalog(), &store, &SessionOpts::default()).unwrap();
    assert!(restored.failed.is_empty());
    assert!(restored.out_of_bounds.is_empty());
    assert_eq!(
        render_canvas(&restored.document).unwrap(),
        render_canvas(&doc).unwrap()
    );
    assert_eq!(restored.document.to_project().unwrap(), project);
}

#[test]
fn restore_scopes_fetch_failures_to_their_slot() {
    let store = MemoryStore::new();
    let project = saved_document(&store).to_project().unwrap();
    store.remove("src/a.png").unwrap();

    let restored =
        restore_project(&project, &catalog(), &store, &SessionOpts::default()).unwrap();
    assert_eq!(restored.failed.len(), 1);
    assert_eq!(restored.document.cutouts().len(), 2);
    assert!(!restored.document.has_ready_image());
    // The base card still renders; the unloaded cutouts are skipped.
    let frame = render_canvas(&restored.document).unwrap();
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn restore_requires_known_template() {
    let store = MemoryStore::new();
    let project = saved_document(&store).to_project().unwrap();
    let err = restore_project(
        &project,
        &TemplateCatalog::new(),
        &store,
        &SessionOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, KitcardError::NotFound(_)));
}

#[test]
fn restore_orders_cutouts_by_z_index() {
    let store = MemoryStore::new();
    let mut project = saved_document(&store).to_project().unwrap();
    project.cutouts.reverse();
    project.cutouts[0].z_index = 7;
    project.cutouts[1].z_index = 3;

    let restored =
        restore_project(&project, &catalog(), &store, &SessionOpts::default()).unwrap();
    let cutouts = restored.document.cutouts();
    assert_eq!(cutouts[0].crop, Rect::new(0.0, 0.0, 20.0, 20.0));
    assert_eq!(cutouts[1].crop, Rect::new(10.0, 5.0, 30.0, 25.0));
    assert_eq!(
        cutouts.iter().map(|c| c.z_index).collect::<Vec<_>>(),
        vec![0, 1]
    );
}
