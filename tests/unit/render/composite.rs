use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [0, 0, 0, 0]), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let src = [100, 110, 120, 200];
    assert_eq!(over([0, 0, 0, 0], src), src);
}

#[test]
fn premultiply_round_trips_opaque_and_clears_transparent() {
    assert_eq!(premultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(unpremultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(premultiply([10, 20, 30, 0]), [0, 0, 0, 0]);
    assert_eq!(unpremultiply([0, 0, 0, 0]), [0, 0, 0, 0]);
}

#[test]
fn layer_over_straight_keeps_untouched_pixels() {
    let mut dst = vec![100, 50, 200, 128, 1, 2, 3, 4];
    let layer = vec![0, 0, 0, 0, 0, 0, 255, 255];
    layer_over_straight_in_place(&mut dst, &layer).unwrap();
    assert_eq!(&dst[..4], &[100, 50, 200, 128]);
    assert_eq!(&dst[4..], &[0, 0, 255, 255]);
}

#[test]
fn layer_over_straight_blends_half_alpha() {
    let mut dst = vec![255, 255, 255, 255];
    // Black at 50% coverage, premultiplied.
    let layer = vec![0, 0, 0, 128];
    layer_over_straight_in_place(&mut dst, &layer).unwrap();
    assert_eq!(dst[3], 255);
    assert!((126..=128).contains(&dst[0]));
}

#[test]
fn mismatched_lengths_error() {
    let mut dst = vec![0u8; 8];
    assert!(layer_over_straight_in_place(&mut dst, &[0u8; 4]).is_err());
}
