//! Voxel-grid downsampling and upsampling with replacement.
//!
//! Raw human recordings dwell in some poses much longer than others.
//! Collapsing each occupied voxel to its centroid removes that density
//! bias; drawing with replacement then restores a fixed point count.

use hashbrown::HashMap;
use rand::Rng;
use retarget_types::KeypointSample;

type VoxelKey = (i64, i64, i64);

#[allow(clippy::cast_possible_truncation)]
fn voxel_key(p: &KeypointSample, inv_voxel: f64) -> VoxelKey {
    (
        (f64::from(p[0]) * inv_voxel).floor() as i64,
        (f64::from(p[1]) * inv_voxel).floor() as i64,
        (f64::from(p[2]) * inv_voxel).floor() as i64,
    )
}

/// Replaces all points sharing a voxel of edge `voxel` by their centroid.
///
/// Output order follows the first point seen in each voxel. A non-positive
/// or non-finite `voxel` returns the input unchanged.
///
/// # Example
///
/// ```
/// use retarget_dataset::voxel_downsample;
///
/// let points = [[0.0001, 0.0, 0.0], [0.0003, 0.0, 0.0], [0.5, 0.0, 0.0]];
/// let down = voxel_downsample(&points, 0.001);
/// assert_eq!(down.len(), 2);
/// assert!((down[0][0] - 0.0002).abs() < 1e-7);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn voxel_downsample(points: &[KeypointSample], voxel: f32) -> Vec<KeypointSample> {
    if !(voxel.is_finite() && voxel > 0.0) {
        return points.to_vec();
    }
    let inv_voxel = 1.0 / f64::from(voxel);
    let mut slots: HashMap<VoxelKey, usize> = HashMap::with_capacity(points.len());
    let mut sums: Vec<([f64; 3], usize)> = Vec::new();

    for p in points {
        let slot = *slots.entry(voxel_key(p, inv_voxel)).or_insert_with(|| {
            sums.push(([0.0; 3], 0));
            sums.len() - 1
        });
        let (sum, count) = &mut sums[slot];
        for axis in 0..3 {
            sum[axis] += f64::from(p[axis]);
        }
        *count += 1;
    }

    sums.into_iter()
        .map(|(sum, count)| {
            let n = count as f64;
            [
                (sum[0] / n) as f32,
                (sum[1] / n) as f32,
                (sum[2] / n) as f32,
            ]
        })
        .collect()
}

/// Draws `k` points uniformly with replacement.
///
/// Returns an empty vector for empty input.
#[must_use]
pub fn upsample<R: Rng + ?Sized>(
    points: &[KeypointSample],
    k: usize,
    rng: &mut R,
) -> Vec<KeypointSample> {
    if points.is_empty() {
        return Vec::new();
    }
    (0..k).map(|_| points[rng.gen_range(0..points.len())]).collect()
}

/// Voxel downsample followed by upsampling to exactly `k` points.
///
/// Returns an empty vector for empty input.
#[must_use]
pub fn resample<R: Rng + ?Sized>(
    points: &[KeypointSample],
    k: usize,
    voxel: f32,
    rng: &mut R,
) -> Vec<KeypointSample> {
    upsample(&voxel_downsample(points, voxel), k, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn dense_cluster_collapses() {
        let mut points = vec![[0.0005, 0.0005, 0.0005]; 1000];
        points.push([0.1, 0.1, 0.1]);
        let down = voxel_downsample(&points, 0.001);
        assert_eq!(down.len(), 2);
    }

    #[test]
    fn negative_coordinates_floor() {
        let points = [[-0.0001, 0.0, 0.0], [0.0001, 0.0, 0.0]];
        assert_eq!(voxel_downsample(&points, 0.001).len(), 2);
    }

    #[test]
    fn zero_voxel_is_identity() {
        let points = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        assert_eq!(voxel_downsample(&points, 0.0), points.to_vec());
    }

    #[test]
    fn resample_returns_exactly_k() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let large: Vec<KeypointSample> = (0..5000)
            .map(|i| {
                let t = i as f32 * 1e-4;
                [t, t * 0.5, 0.0]
            })
            .collect();
        for k in [1, 10, 100, 20_000] {
            assert_eq!(resample(&large, k, 0.001, &mut rng).len(), k);
        }
        let small = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let out = resample(&small, 50, 0.001, &mut rng);
        assert_eq!(out.len(), 50);
        assert!(out.iter().all(|p| small.contains(p)));
    }

    #[test]
    fn single_point_repeats() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = upsample(&[[0.3, 0.2, 0.1]], 8, &mut rng);
        assert_eq!(out, vec![[0.3, 0.2, 0.1]; 8]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(resample(&[], 8, 0.001, &mut rng).is_empty());
    }
}
