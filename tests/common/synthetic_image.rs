use wct_transfer::FeatureMap;

/// Smoothly varying RGB pattern around `base` with per-channel amplitude
/// `amp`. Channels use different frequencies so their covariance has full
/// rank.
pub fn textured_rgb(height: usize, width: usize, base: [f32; 3], amp: f32) -> FeatureMap {
    assert!(height > 0 && width > 0, "image dimensions must be positive");
    let mut img = FeatureMap::new(height, width, 3);
    for y in 0..height {
        for x in 0..width {
            let (fx, fy) = (x as f32, y as f32);
            let waves = [
                (0.37 * fx + 0.11 * fy).sin(),
                (0.23 * fy - 0.05 * fx).cos(),
                (0.17 * (fx + fy)).sin() * (0.29 * fx).cos(),
            ];
            for ch in 0..3 {
                img.set(y, x, ch, base[ch] + amp * waves[ch]);
            }
        }
    }
    img
}

/// High-contrast checkerboard alternating between two colours.
pub fn checkerboard_rgb(height: usize, width: usize, cell: usize, a: [f32; 3], b: [f32; 3]) -> FeatureMap {
    assert!(cell > 0, "cell size must be positive");
    let mut img = FeatureMap::new(height, width, 3);
    for y in 0..height {
        for x in 0..width {
            let colour = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            for ch in 0..3 {
                img.set(y, x, ch, colour[ch]);
            }
        }
    }
    img
}

/// Euclidean distance between the channel means of two maps.
pub fn mean_colour_distance(a: &FeatureMap, b: &FeatureMap) -> f32 {
    a.channel_means()
        .iter()
        .zip(b.channel_means())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
