use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [0, 0, 0, 0]), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let src = [255, 0, 0, 255];
    assert_eq!(over([0, 0, 0, 255], src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let src = [100, 110, 120, 200];
    assert_eq!(over([0, 0, 0, 0], src), src);
}

#[test]
fn over_half_alpha_on_opaque() {
    // 50% white over opaque black stays opaque and lands mid-grey.
    let out = over([0, 0, 0, 255], [128, 128, 128, 128]);
    assert_eq!(out, [128, 128, 128, 255]);
}

#[test]
fn fill_writes_every_pixel() {
    let mut buf = vec![0u8; 12];
    fill(&mut buf, [1, 2, 3, 4]);
    assert_eq!(buf, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
}
