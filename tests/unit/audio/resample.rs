use super::*;

#[test]
fn same_rate_is_a_no_op() {
    let audio = DecodedAudio::from_planes(48_000, vec![vec![0.25; 480]]).unwrap();
    let out = resample(&audio, 48_000).unwrap();
    assert!(out.shares_storage_with(&audio));
}

#[test]
fn upsampling_scales_length_and_keeps_channels() {
    let audio = DecodedAudio::from_planes(24_000, vec![vec![0.5; 24_000], vec![-0.5; 24_000]])
        .unwrap();
    let out = resample(&audio, 48_000).unwrap();
    assert_eq!(out.sample_rate(), 48_000);
    assert_eq!(out.number_of_channels(), 2);
    assert_eq!(out.len(), 48_000);
    assert!(out.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    assert!(out.channel(1).iter().all(|&s| (s + 0.5).abs() < 1e-6));
    // input untouched
    assert_eq!(audio.sample_rate(), 24_000);
    assert_eq!(audio.len(), 24_000);
}

#[test]
fn output_length_is_ceil_of_duration_times_rate() {
    let audio = DecodedAudio::from_planes(44_100, vec![vec![0.0; 44_101]]).unwrap();
    let out = resample(&audio, 48_000).unwrap();
    // 44_101 * 48_000 / 44_100 = 48_001.088...
    assert_eq!(out.len(), 48_002);
}

#[test]
fn linear_interpolation_between_samples() {
    let audio = DecodedAudio::from_planes(2, vec![vec![0.0, 1.0]]).unwrap();
    let out = resample(&audio, 4).unwrap();
    assert_eq!(out.len(), 4);
    let s = out.channel(0);
    assert!((s[0] - 0.0).abs() < 1e-6);
    assert!((s[1] - 0.5).abs() < 1e-6);
    assert!((s[2] - 1.0).abs() < 1e-6);
    assert!((s[3] - 1.0).abs() < 1e-6);
}

#[test]
fn downsampling_halves_length() {
    let ramp: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
    let audio = DecodedAudio::from_planes(100, vec![ramp]).unwrap();
    let out = resample(&audio, 50).unwrap();
    assert_eq!(out.len(), 50);
    assert!((out.channel(0)[10] - 0.2).abs() < 1e-6);
}

#[test]
fn zero_target_rate_is_rejected() {
    let audio = DecodedAudio::from_planes(8, vec![vec![0.0; 8]]).unwrap();
    assert!(resample(&audio, 0).is_err());
}
