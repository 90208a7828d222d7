//! Synthetic robot kinematics dataset.
//!
//! Joint configurations are drawn i.i.d. uniform per joint over the clipped
//! limit box and labelled with exact fingertip keypoints from the
//! kinematics adapter.
//!
//! # Cache Format
//!
//! 1. **Magic bytes**: `RKD1` (4 bytes)
//! 2. **Version**: `u32` little-endian (4 bytes)
//! 3. **Flags**: `u32` little-endian (4 bytes), reserved
//! 4. **Payload**: bincode-encoded [`RobotKinematicsDataset`]

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rand::Rng;
use retarget_kinematics::{KinematicsAdapter, KinematicsEngine};
use retarget_types::KeypointSample;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DatasetError, Result};

/// Magic bytes identifying a dataset cache file.
pub const RKD_MAGIC: [u8; 4] = *b"RKD1";

/// Current cache format version.
pub const RKD_VERSION: u32 = 1;

/// Header size in bytes (magic + version + flags).
pub const RKD_HEADER_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RkdHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
}

impl RkdHeader {
    const fn new() -> Self {
        Self {
            magic: RKD_MAGIC,
            version: RKD_VERSION,
            flags: 0,
        }
    }

    fn write_to<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())
    }

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; RKD_HEADER_SIZE];
        reader.read_exact(&mut bytes)?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[4..8]);
        let version = u32::from_le_bytes(word);
        word.copy_from_slice(&bytes[8..12]);
        let flags = u32::from_le_bytes(word);
        Ok(Self {
            magic,
            version,
            flags,
        })
    }

    fn validate(self) -> Result<()> {
        if self.magic != RKD_MAGIC {
            return Err(DatasetError::InvalidMagic(self.magic));
        }
        if self.version != RKD_VERSION {
            return Err(DatasetError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Paired joint configurations and fingertip keypoints.
///
/// `qpos[i]` has one entry per joint in user order; `keypoints[i]` has one
/// sample per fingertip in [`Self::keypoint_names`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotKinematicsDataset {
    robot: String,
    joint_names: Vec<String>,
    keypoint_names: Vec<String>,
    qpos: Vec<Vec<f64>>,
    keypoints: Vec<Vec<KeypointSample>>,
}

impl RobotKinematicsDataset {
    /// Builds a dataset from already computed samples.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShapeMismatch`] if row counts or row widths
    /// are inconsistent.
    pub fn from_parts(
        robot: impl Into<String>,
        joint_names: Vec<String>,
        keypoint_names: Vec<String>,
        qpos: Vec<Vec<f64>>,
        keypoints: Vec<Vec<KeypointSample>>,
    ) -> Result<Self> {
        if qpos.len() != keypoints.len() {
            return Err(DatasetError::shape_mismatch(
                "sample count",
                qpos.len().to_string(),
                keypoints.len().to_string(),
            ));
        }
        if let Some(row) = qpos.iter().find(|q| q.len() != joint_names.len()) {
            return Err(DatasetError::shape_mismatch(
                "qpos row",
                joint_names.len().to_string(),
                row.len().to_string(),
            ));
        }
        if let Some(row) = keypoints.iter().find(|k| k.len() != keypoint_names.len()) {
            return Err(DatasetError::shape_mismatch(
                "keypoint row",
                keypoint_names.len().to_string(),
                row.len().to_string(),
            ));
        }
        Ok(Self {
            robot: robot.into(),
            joint_names,
            keypoint_names,
            qpos,
            keypoints,
        })
    }

    /// Samples `n` configurations uniformly over the adapter's joint limits.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Kinematics`] if forward kinematics fails.
    pub fn generate<E: KinematicsEngine, R: Rng + ?Sized>(
        adapter: &KinematicsAdapter<E>,
        n: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let robot = adapter.config().name.clone();
        info!(robot = %robot, n_samples = n, dof = adapter.dof(), "Generating kinematics dataset");

        let limits = adapter.joint_limits();
        let mut qpos = Vec::with_capacity(n);
        let mut keypoints = Vec::with_capacity(n);
        for _ in 0..n {
            let q: Vec<f64> = limits
                .iter()
                .map(|l| rng.gen_range(l.lower..l.upper))
                .collect();
            keypoints.push(adapter.keypoint_vector(&q)?);
            qpos.push(q);
        }

        info!(robot = %robot, n_samples = n, "Kinematics dataset generated");
        Ok(Self {
            robot,
            joint_names: adapter.config().joint_order.clone(),
            keypoint_names: adapter.keypoint_names(),
            qpos,
            keypoints,
        })
    }

    /// Loads the cache at `path`, or generates and saves it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownKeypoint`] if a cached dataset does not
    /// carry the adapter's fingertips, otherwise any error from
    /// [`Self::load`], [`Self::generate`] or [`Self::save`].
    pub fn load_or_generate<E: KinematicsEngine, R: Rng + ?Sized>(
        path: impl AsRef<Path>,
        adapter: &KinematicsAdapter<E>,
        n: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "Dataset cache hit");
            let dataset = Self::load(path)?;
            for name in adapter.keypoint_names() {
                if !dataset.keypoint_names.contains(&name) {
                    return Err(DatasetError::UnknownKeypoint(name));
                }
            }
            if dataset.joint_names != adapter.config().joint_order {
                return Err(DatasetError::shape_mismatch(
                    "cached joint order",
                    adapter.config().joint_order.join(","),
                    dataset.joint_names.join(","),
                ));
            }
            return Ok(dataset);
        }
        let dataset = Self::generate(adapter, n, rng)?;
        dataset.save(path)?;
        Ok(dataset)
    }

    /// Writes the dataset to `path`, replacing any existing file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] or [`DatasetError::Corrupt`] on failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = path.with_file_name(format!(".{file_name}.partial"));
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            self.save_to_writer(&mut writer)?;
            writer.flush()?;
        }
        fs::rename(&staging, path)?;
        debug!(path = %path.display(), n_samples = self.len(), "Dataset saved");
        Ok(())
    }

    /// Writes header and payload to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or encoding fails.
    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        RkdHeader::new().write_to(writer)?;
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Reads a dataset cache file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::CacheNotFound`] if the file is missing,
    /// [`DatasetError::InvalidMagic`] / [`DatasetError::UnsupportedVersion`]
    /// for a foreign file and [`DatasetError::Corrupt`] for a bad payload.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::CacheNotFound(path.display().to_string()));
        }
        let mut reader = BufReader::new(File::open(path)?);
        Self::load_from_reader(&mut reader)
    }

    /// Reads header and payload from a reader.
    ///
    /// # Errors
    ///
    /// As [`Self::load`], minus the missing-file case.
    pub fn load_from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let header = RkdHeader::read_from(reader)
            .map_err(|e| DatasetError::Corrupt(format!("truncated header: {e}")))?;
        header.validate()?;
        let dataset: Self = bincode::deserialize_from(reader)?;
        Self::from_parts(
            dataset.robot,
            dataset.joint_names,
            dataset.keypoint_names,
            dataset.qpos,
            dataset.keypoints,
        )
    }

    /// Robot name.
    #[must_use]
    pub fn robot(&self) -> &str {
        &self.robot
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.qpos.len()
    }

    /// Returns true if the dataset has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.qpos.is_empty()
    }

    /// Number of joints per configuration.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.joint_names.len()
    }

    /// Joint names in user order.
    #[must_use]
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    /// Fingertip names in keypoint column order.
    #[must_use]
    pub fn keypoint_names(&self) -> &[String] {
        &self.keypoint_names
    }

    /// All joint configurations.
    #[must_use]
    pub fn qpos(&self) -> &[Vec<f64>] {
        &self.qpos
    }

    /// All keypoint rows.
    #[must_use]
    pub fn keypoints(&self) -> &[Vec<KeypointSample>] {
        &self.keypoints
    }

    /// One `(qpos, keypoints)` pair.
    #[must_use]
    pub fn sample(&self, index: usize) -> Option<(&[f64], &[KeypointSample])> {
        Some((self.qpos.get(index)?, self.keypoints.get(index)?))
    }

    /// Column index of each requested fingertip.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownKeypoint`] for a missing name.
    pub fn keypoint_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.keypoint_names
                    .iter()
                    .position(|k| k == name.as_ref())
                    .ok_or_else(|| DatasetError::UnknownKeypoint(name.as_ref().to_string()))
            })
            .collect()
    }

    /// Keypoints grouped per fingertip, shape `[names.len()][N]`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownKeypoint`] for a missing name.
    pub fn export_robot_pointcloud<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Vec<KeypointSample>>> {
        let columns = self.keypoint_columns(names)?;
        Ok(columns
            .into_iter()
            .map(|c| self.keypoints.iter().map(|row| row[c]).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny() -> RobotKinematicsDataset {
        RobotKinematicsDataset::from_parts(
            "toy",
            vec!["j0".into(), "j1".into()],
            vec!["a".into(), "b".into()],
            vec![vec![0.0, 0.1], vec![0.2, 0.3], vec![0.4, 0.5]],
            vec![
                vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
                vec![[0.1, 0.0, 0.0], [1.1, 1.0, 1.0]],
                vec![[0.2, 0.0, 0.0], [1.2, 1.0, 1.0]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn writer_round_trip() {
        let dataset = tiny();
        let mut bytes = Vec::new();
        dataset.save_to_writer(&mut bytes).unwrap();
        assert_eq!(&bytes[0..4], b"RKD1");
        let back = RobotKinematicsDataset::load_from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = Vec::new();
        tiny().save_to_writer(&mut bytes).unwrap();
        bytes[0] = b'X';
        let err = RobotKinematicsDataset::load_from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidMagic(_)));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = Vec::new();
        tiny().save_to_writer(&mut bytes).unwrap();
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        let err = RobotKinematicsDataset::load_from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedVersion(7)));
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let mut bytes = Vec::new();
        tiny().save_to_writer(&mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);
        let err = RobotKinematicsDataset::load_from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DatasetError::Corrupt(_)));
    }

    #[test]
    fn missing_file_is_cache_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = RobotKinematicsDataset::load(dir.path().join("none.rkd")).unwrap_err();
        assert!(matches!(err, DatasetError::CacheNotFound(_)));
    }

    #[test]
    fn export_groups_by_finger() {
        let cloud = tiny().export_robot_pointcloud(&["b", "a"]).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0].len(), 3);
        assert_eq!(cloud[0][2], [1.2, 1.0, 1.0]);
        assert_eq!(cloud[1][1], [0.1, 0.0, 0.0]);
    }

    #[test]
    fn export_unknown_name_fails() {
        let err = tiny().export_robot_pointcloud(&["zzz"]).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownKeypoint(ref n) if n == "zzz"));
    }

    #[test]
    fn from_parts_checks_widths() {
        let err = RobotKinematicsDataset::from_parts(
            "toy",
            vec!["j0".into()],
            vec!["a".into()],
            vec![vec![0.0, 1.0]],
            vec![vec![[0.0; 3]]],
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { .. }));
    }
}
