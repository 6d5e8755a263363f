use super::*;

#[test]
fn fnv_seeded_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"kitcard");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_u8(b'k');
    b.write_bytes(b"itcard");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_distinguishes_signed_zero() {
    let mut a = Fnv1a64::new_default();
    a.write_f64(0.0);
    let mut b = Fnv1a64::new_default();
    b.write_f64(-0.0);
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn quantize_rounds_half_to_even_and_saturates() {
    assert_eq!(quantize_u8(0.5), 0);
    assert_eq!(quantize_u8(1.5), 2);
    assert_eq!(quantize_u8(2.5), 2);
    assert_eq!(quantize_u8(254.6), 255);
    assert_eq!(quantize_u8(300.0), 255);
    assert_eq!(quantize_u8(-4.0), 0);
    assert_eq!(quantize_u8(f64::NAN), 0);
}

#[test]
fn degrees_normalize_into_half_open_turn() {
    assert_eq!(normalize_degrees(0.0), 0.0);
    assert_eq!(normalize_degrees(360.0), 0.0);
    assert_eq!(normalize_degrees(-90.0), 270.0);
    assert_eq!(normalize_degrees(725.0), 5.0);
    let tiny = normalize_degrees(-1e-14);
    assert!((0.0..360.0).contains(&tiny));
}
