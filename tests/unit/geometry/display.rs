use super::*;

#[test]
fn fit_letterboxes_tall_canvas_in_wide_viewport() {
    let m = DisplayMapping::fit(Canvas::new(600, 800).unwrap(), Size::new(800.0, 400.0)).unwrap();
    assert_eq!(m.scale, 0.5);
    assert_eq!(m.offset, Vec2::new(250.0, 0.0));
    assert_eq!(m.canvas_to_display(Point::new(600.0, 800.0)), Point::new(550.0, 400.0));
}

#[test]
fn display_to_canvas_inverts_canvas_to_display() {
    let m = DisplayMapping::new(0.25, Vec2::new(12.0, -3.0)).unwrap();
    for p in [
        Point::new(0.0, 0.0),
        Point::new(100.0, 40.0),
        Point::new(599.0, 799.0),
    ] {
        assert_eq!(m.display_to_canvas(m.canvas_to_display(p)), p);
    }
    assert_eq!(
        display_to_canvas(Point::new(37.0, 7.0), 0.25, Vec2::new(12.0, -3.0)),
        Point::new(100.0, 40.0)
    );
}

#[test]
fn drag_deltas_ignore_offset() {
    let m = DisplayMapping::new(0.5, Vec2::new(99.0, 99.0)).unwrap();
    assert_eq!(
        m.display_delta_to_canvas(Vec2::new(10.0, -4.0)),
        Vec2::new(20.0, -8.0)
    );
}

#[test]
fn degenerate_mappings_are_rejected() {
    assert!(DisplayMapping::new(0.0, Vec2::ZERO).is_err());
    assert!(DisplayMapping::new(f64::NAN, Vec2::ZERO).is_err());
    assert!(DisplayMapping::fit(Canvas::new(10, 10).unwrap(), Size::new(0.0, 10.0)).is_err());
}
