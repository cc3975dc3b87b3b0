use super::*;

#[test]
fn flatten_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_premul_half_red_over_black() {
    let src = vec![128u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg(&mut dst, &[0u8; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn fingerprint_tracks_content() {
    let a = FrameRGBA::new(2, 2);
    let mut b = a.clone();
    assert_eq!(a.fingerprint(), b.fingerprint());
    b.data[5] = 1;
    assert_ne!(a.fingerprint(), b.fingerprint());

    let c = FrameRGBA::new(1, 4);
    assert_ne!(a.fingerprint(), c.fingerprint());
}
