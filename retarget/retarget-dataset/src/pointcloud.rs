//! Fixed-size per-finger human point clouds.

use rand::Rng;
use rand::seq::SliceRandom;
use retarget_types::KeypointSample;
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::human::HumanMotion;
use crate::resample::{upsample, voxel_downsample};

/// Human fingertip points, exactly `len()` per finger.
///
/// Sample `i` is the `i`-th point of every finger; fingers are resampled
/// independently, so a sample does not correspond to a recorded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanPointCloud {
    points: Vec<Vec<KeypointSample>>,
}

/// A batch of samples flattened as `[batch][finger][xyz]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBatch {
    indices: Vec<usize>,
    fingers: usize,
    data: Vec<f32>,
}

impl PointBatch {
    /// Number of samples in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true for an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of fingers per sample.
    #[must_use]
    pub const fn fingers(&self) -> usize {
        self.fingers
    }

    /// Source sample indices.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Flattened coordinates.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the batch, returning the flattened coordinates.
    #[must_use]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Point of finger `f` in sample `b`.
    #[must_use]
    pub fn point(&self, b: usize, f: usize) -> KeypointSample {
        let i = (b * self.fingers + f) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

impl HumanPointCloud {
    /// Resamples raw per-finger points to exactly `k` points per finger.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::EmptyBatch`] for `k == 0` or no fingers and
    /// [`DatasetError::EmptyPointCloud`] if a finger has no points.
    pub fn from_points<R: Rng + ?Sized>(
        finger_points: &[Vec<KeypointSample>],
        k: usize,
        voxel: f32,
        rng: &mut R,
    ) -> Result<Self> {
        if k == 0 {
            return Err(DatasetError::empty_batch("point cloud size is zero"));
        }
        if finger_points.is_empty() {
            return Err(DatasetError::empty_batch("no fingers"));
        }
        let mut points = Vec::with_capacity(finger_points.len());
        for (finger, raw) in finger_points.iter().enumerate() {
            if raw.is_empty() {
                return Err(DatasetError::EmptyPointCloud(finger));
            }
            let down = voxel_downsample(raw, voxel);
            debug!(finger, raw = raw.len(), downsampled = down.len(), k, "Resampled finger");
            points.push(upsample(&down, k, rng));
        }
        Ok(Self { points })
    }

    /// Resamples the trajectories of the given skeleton ids.
    ///
    /// # Errors
    ///
    /// As [`HumanMotion::finger_points`] and [`Self::from_points`].
    pub fn from_motion<R: Rng + ?Sized>(
        motion: &HumanMotion,
        human_ids: &[usize],
        k: usize,
        voxel: f32,
        rng: &mut R,
    ) -> Result<Self> {
        Self::from_points(&motion.finger_points(human_ids)?, k, voxel, rng)
    }

    /// Wraps points that already have equal length per finger.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShapeMismatch`] for ragged input and
    /// [`DatasetError::EmptyBatch`] for empty input.
    pub fn from_resampled(points: Vec<Vec<KeypointSample>>) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(DatasetError::empty_batch("no fingers"));
        };
        let k = first.len();
        if k == 0 {
            return Err(DatasetError::EmptyPointCloud(0));
        }
        if let Some(row) = points.iter().find(|p| p.len() != k) {
            return Err(DatasetError::shape_mismatch(
                "points per finger",
                k.to_string(),
                row.len().to_string(),
            ));
        }
        Ok(Self { points })
    }

    /// Number of fingers.
    #[must_use]
    pub fn num_fingers(&self) -> usize {
        self.points.len()
    }

    /// Points per finger.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }

    /// Returns true when there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All points of one finger.
    #[must_use]
    pub fn finger(&self, f: usize) -> &[KeypointSample] {
        &self.points[f]
    }

    /// Sample `i` across all fingers.
    #[must_use]
    pub fn sample(&self, i: usize) -> Vec<KeypointSample> {
        self.points.iter().map(|finger| finger[i]).collect()
    }

    /// Gathers the given samples into one batch.
    #[must_use]
    pub fn gather(&self, indices: &[usize]) -> PointBatch {
        let fingers = self.num_fingers();
        let mut data = Vec::with_capacity(indices.len() * fingers * 3);
        for &i in indices {
            for finger in &self.points {
                data.extend_from_slice(&finger[i]);
            }
        }
        PointBatch {
            indices: indices.to_vec(),
            fingers,
            data,
        }
    }

    /// Splits all samples into batches; the final batch may be smaller.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::EmptyBatch`] for `batch_size == 0`.
    pub fn batches<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<Vec<PointBatch>> {
        if batch_size == 0 {
            return Err(DatasetError::empty_batch("batch size is zero"));
        }
        let mut order: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }
        Ok(order.chunks(batch_size).map(|c| self.gather(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn raw(n: usize, offset: f32) -> Vec<KeypointSample> {
        (0..n).map(|i| [offset + i as f32 * 0.01, 0.0, 0.0]).collect()
    }

    #[test]
    fn every_finger_has_k_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for n in [1, 5, 300] {
            let cloud =
                HumanPointCloud::from_points(&[raw(n, 0.0), raw(n / 2 + 1, 1.0)], 64, 0.001, &mut rng)
                    .unwrap();
            assert_eq!(cloud.num_fingers(), 2);
            assert_eq!(cloud.finger(0).len(), 64);
            assert_eq!(cloud.finger(1).len(), 64);
        }
    }

    #[test]
    fn empty_finger_is_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err =
            HumanPointCloud::from_points(&[raw(3, 0.0), Vec::new()], 8, 0.001, &mut rng).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyPointCloud(1)));
    }

    #[test]
    fn batches_cover_every_sample() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let cloud = HumanPointCloud::from_points(&[raw(50, 0.0), raw(50, 2.0)], 10, 0.001, &mut rng)
            .unwrap();
        let batches = cloud.batches(4, true, &mut rng).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 2);
        let mut seen: Vec<usize> = batches.iter().flat_map(|b| b.indices().to_vec()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        let b = &batches[0];
        let i = b.indices()[1];
        assert_eq!(b.point(1, 0), cloud.finger(0)[i]);
        assert_eq!(b.point(1, 1), cloud.finger(1)[i]);
        assert_eq!(b.data().len(), 4 * 2 * 3);
    }

    #[test]
    fn zero_batch_size_is_error() {
        let cloud = HumanPointCloud::from_resampled(vec![raw(4, 0.0)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(cloud.batches(0, false, &mut rng).is_err());
    }

    #[test]
    fn ragged_input_is_rejected() {
        assert!(HumanPointCloud::from_resampled(vec![raw(4, 0.0), raw(3, 0.0)]).is_err());
    }
}
