use super::*;

#[test]
fn interleaved_roundtrip_preserves_layout() {
    let audio = DecodedAudio::from_interleaved(4, 2, &[0.1, -0.1, 0.2, -0.2, 0.3, -0.3]).unwrap();
    assert_eq!(audio.len(), 3);
    assert_eq!(audio.number_of_channels(), 2);
    assert_eq!(audio.channel(0), &[0.1, 0.2, 0.3]);
    assert_eq!(audio.channel(1), &[-0.1, -0.2, -0.3]);
    assert_eq!(audio.interleaved(), vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    assert!((audio.duration_secs() - 0.75).abs() < 1e-12);
}

#[test]
fn rejects_ragged_or_empty_layouts() {
    assert!(DecodedAudio::from_planes(48_000, vec![]).is_err());
    assert!(DecodedAudio::from_planes(48_000, vec![vec![0.0; 3], vec![0.0; 2]]).is_err());
    assert!(DecodedAudio::from_planes(0, vec![vec![0.0]]).is_err());
    assert!(DecodedAudio::from_interleaved(48_000, 2, &[0.0; 3]).is_err());
}

#[test]
fn clones_share_storage() {
    let a = DecodedAudio::from_planes(8, vec![vec![0.5; 8]]).unwrap();
    let b = a.clone();
    assert!(a.shares_storage_with(&b));
}

#[test]
fn f32le_file_is_interleaved_little_endian() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mix.f32le");
    let audio = DecodedAudio::from_planes(2, vec![vec![1.0, 0.5], vec![-1.0, 0.25]]).unwrap();
    write_f32le_file(&audio, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16);
    let samples: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(samples, vec![1.0, -1.0, 0.5, 0.25]);
}
