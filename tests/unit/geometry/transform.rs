use super::*;
use crate::foundation::core::Point;

fn approx(a: Rect, b: Rect) -> bool {
    (a.x0 - b.x0).abs() < 1e-9
        && (a.y0 - b.y0).abs() < 1e-9
        && (a.x1 - b.x1).abs() < 1e-9
        && (a.y1 - b.y1).abs() < 1e-9
}

#[test]
fn identity_placement_is_a_pure_translation() {
    let crop = Rect::new(0.0, 0.0, 400.0, 400.0);
    let t = CutoutTransform::at(100.0, 100.0);
    assert_eq!(
        t.to_affine(crop.size()),
        Affine::translate(Vec2::new(100.0, 100.0))
    );
    assert_eq!(apply_transform(crop, t), Rect::new(100.0, 100.0, 500.0, 500.0));
}

#[test]
fn source_to_canvas_subtracts_crop_origin() {
    let crop = Rect::new(30.0, 40.0, 50.0, 60.0);
    let m = CutoutTransform::at(5.0, 6.0).source_to_canvas(crop);
    assert_eq!(m * Point::new(30.0, 40.0), Point::new(5.0, 6.0));
    assert_eq!(m * Point::new(50.0, 60.0), Point::new(25.0, 26.0));
}

#[test]
fn rotation_is_about_the_footprint_center() {
    let crop = Rect::new(0.0, 0.0, 100.0, 50.0);
    let t = CutoutTransform::at(0.0, 0.0).with_rotation(90.0);
    // A 100x50 footprint centered at (50, 25) becomes 50x100 around the same center.
    let bbox = apply_transform(crop, t);
    assert!(approx(bbox, Rect::new(25.0, -25.0, 75.0, 75.0)), "{bbox:?}");
}

#[test]
fn scale_grows_footprint_from_top_left() {
    let crop = Rect::new(10.0, 10.0, 30.0, 20.0);
    let t = CutoutTransform::at(1.0, 2.0).with_scale_xy(2.0, 3.0);
    assert_eq!(t.scale_y, Some(3.0));
    assert_eq!(apply_transform(crop, t), Rect::new(1.0, 2.0, 41.0, 32.0));
    assert_eq!(CutoutTransform::default().with_scale_xy(2.0, 2.0).scale_y, None);
}

#[test]
fn validated_normalizes_rotation_and_rejects_bad_scale() {
    let t = CutoutTransform::at(0.0, 0.0)
        .with_rotation(-45.0)
        .validated()
        .unwrap();
    assert_eq!(t.rotation, 315.0);

    for bad in [
        CutoutTransform::default().with_scale(0.0),
        CutoutTransform::default().with_scale(-1.0),
        CutoutTransform::default().with_scale_xy(1.0, f64::NAN),
        CutoutTransform::default().with_scale(1e-8),
        CutoutTransform::default().with_scale_xy(1e-9, 2.0),
        CutoutTransform::at(f64::INFINITY, 0.0),
        CutoutTransform::default().with_rotation(f64::NAN),
    ] {
        assert!(matches!(
            bad.validated(),
            Err(KitcardError::InvalidTransform(_))
        ));
    }
}

#[test]
fn clamp_pulls_placement_inside_canvas() {
    let canvas = Canvas::new(100, 100).unwrap();
    let crop = Rect::new(0.0, 0.0, 20.0, 20.0);

    let t = clamp_to_canvas(CutoutTransform::at(90.0, -5.0), crop, canvas);
    assert_eq!((t.x, t.y), (80.0, 0.0));

    let inside = CutoutTransform::at(10.0, 10.0);
    assert_eq!(clamp_to_canvas(inside, crop, canvas), inside);

    let huge = CutoutTransform::at(-3.0, 7.0).with_scale(10.0);
    let t = clamp_to_canvas(huge, crop, canvas);
    assert_eq!((t.x, t.y), (-50.0, -50.0));
    assert_eq!(t.scale, 10.0);
}

#[test]
fn slot_fit_covers_and_centers() {
    let crop = Rect::new(0.0, 0.0, 200.0, 100.0);
    let slot = Rect::new(10.0, 10.0, 110.0, 110.0);
    let t = transform_for_slot(crop, slot).unwrap();
    assert_eq!(t.scale, 1.0);
    let bbox = apply_transform(crop, t);
    assert_eq!(bbox, Rect::new(-40.0, 10.0, 160.0, 110.0));

    assert!(transform_for_slot(Rect::new(0.0, 0.0, 0.0, 5.0), slot).is_err());
}

#[test]
fn crop_validation_covers_edges() {
    assert!(validate_crop(Rect::new(0.0, 0.0, 800.0, 600.0), 800, 600).is_ok());
    assert!(validate_crop(Rect::new(0.0, 0.0, 800.5, 600.0), 800, 600).is_err());
    assert!(validate_crop(Rect::new(-1.0, 0.0, 10.0, 10.0), 800, 600).is_err());
    assert!(validate_crop(Rect::new(5.0, 5.0, 5.0, 10.0), 800, 600).is_err());
    assert!(validate_crop(Rect::new(10.0, 10.0, 5.0, 20.0), 800, 600).is_err());
    assert!(validate_crop(Rect::new(0.0, 0.0, f64::NAN, 10.0), 800, 600).is_err());
}

#[test]
fn within_canvas_tolerates_rounding_noise() {
    let canvas = Canvas::new(100, 100).unwrap();
    assert!(is_within_canvas(Rect::new(-1e-12, 0.0, 100.0, 100.0), canvas));
    assert!(!is_within_canvas(Rect::new(0.0, 0.0, 100.5, 100.0), canvas));
}
