use super::*;

fn ramp(h: usize, w: usize, c: usize) -> FeatureMap {
    let mut m = FeatureMap::new(h, w, c);
    for (i, v) in m.data.iter_mut().enumerate() {
        // Non-smooth pattern so every detail band is populated.
        *v = ((i * 37 % 101) as f32 - 50.0) * 0.73 + (i as f32).sqrt();
    }
    m
}

#[test]
fn pool_then_unpool_reconstructs_input() {
    let x = ramp(8, 6, 5);
    let (ll, skip) = haar_pool(&x).unwrap();
    assert_eq!(ll.shape(), (4, 3, 5));
    assert_eq!(skip.hh.shape(), (4, 3, 5));
    let back = haar_unpool(&ll, &skip).unwrap();
    assert_eq!(back.shape(), x.shape());
    for (a, b) in back.data.iter().zip(&x.data) {
        let rel = (a - b).abs() / b.abs().max(1.0);
        assert!(rel < 1e-5, "reconstruction error {rel} ({a} vs {b})");
    }
}

#[test]
fn constant_map_has_no_detail() {
    let x = FeatureMap::filled(4, 4, &[3.0, -1.0]);
    let (ll, skip) = haar_pool(&x).unwrap();
    for band in skip.bands() {
        assert!(band.data.iter().all(|v| v.abs() < 1e-6));
    }
    // Orthonormal LL scales a flat block by 2.
    assert!(ll.data.chunks(2).all(|px| (px[0] - 6.0).abs() < 1e-5 && (px[1] + 2.0).abs() < 1e-5));
}

#[test]
fn replaced_low_band_keeps_original_detail() {
    let x = ramp(4, 4, 1);
    let (ll, skip) = haar_pool(&x).unwrap();
    let flat = FeatureMap::new(ll.h, ll.w, ll.c);
    let merged = haar_unpool(&flat, &skip).unwrap();
    let (ll_again, skip_again) = haar_pool(&merged).unwrap();
    assert!(ll_again.data.iter().all(|v| v.abs() < 1e-5));
    assert!(skip_again.hh.max_abs_diff(&skip.hh) < 1e-4);
    assert!(ll.data.iter().any(|v| v.abs() > 1e-3));
}

#[test]
fn odd_dimensions_are_rejected() {
    let x = FeatureMap::new(5, 4, 2);
    assert!(matches!(
        haar_pool(&x),
        Err(TransferError::OddDimensions { height: 5, width: 4 })
    ));
}

#[test]
fn unpool_rejects_mismatched_low_band() {
    let (_, skip) = haar_pool(&ramp(4, 4, 2)).unwrap();
    let wrong = FeatureMap::new(3, 2, 2);
    assert!(haar_unpool(&wrong, &skip).is_err());
    let wrong_channels = FeatureMap::new(2, 2, 3);
    assert!(matches!(
        haar_unpool(&wrong_channels, &skip),
        Err(TransferError::ChannelMismatch { .. })
    ));
}

#[test]
fn detail_keeps_only_the_pre_pool_size() {
    let x = ramp(8, 6, 3);
    let (ll, mut skip) = haar_pool(&x).unwrap();
    assert_eq!(skip.original_size, (8, 6));
    skip.original_size = (8, 8);
    assert!(matches!(
        haar_unpool(&ll, &skip),
        Err(TransferError::ShapeMismatch { ref stage, .. }) if stage == "unpool/original"
    ));
}
