//! Feature sets produced by the external extractor, and their loader.
//!
//! A feature file carries `descriptors`, and optionally `keypoints` and
//! `image_shape`. Only descriptors are consumed by the matcher; the rest is
//! validated for consistency and carried through untouched.

use crate::{config::MatcherConfig, error::MatchError};
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

pub mod descriptor;

pub use descriptor::Descriptor;
use descriptor::DescriptorJson;

/// `((x, y), size, angle, response, octave, class_id)` as written by the
/// extractor.
type KeypointTuple = ((f32, f32), f32, f32, f32, i32, i32);

/// Point-of-interest metadata for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeypointTuple", into = "KeypointTuple")]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub angle: f32,
    pub response: f32,
    pub octave: i32,
    pub class_id: i32,
}

impl From<KeypointTuple> for Keypoint {
    fn from(((x, y), size, angle, response, octave, class_id): KeypointTuple) -> Self {
        Self {
            x,
            y,
            size,
            angle,
            response,
            octave,
            class_id,
        }
    }
}

impl From<Keypoint> for KeypointTuple {
    fn from(kp: Keypoint) -> Self {
        (
            (kp.x, kp.y),
            kp.size,
            kp.angle,
            kp.response,
            kp.octave,
            kp.class_id,
        )
    }
}

/// Descriptors extracted from one biometric sample. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub descriptors: Vec<Descriptor>,
    #[serde(default)]
    pub keypoints: Option<Vec<Keypoint>>,
    #[serde(default)]
    pub image_shape: Option<Vec<usize>>,
}

/// On-disk JSON shape; every field is optional so that a missing
/// `descriptors` surfaces as a corrupt file rather than a parse error.
#[derive(Deserialize)]
struct FeatureSetJson {
    descriptors: Option<Vec<DescriptorJson>>,
    #[serde(default)]
    keypoints: Option<Vec<Keypoint>>,
    #[serde(default)]
    image_shape: Option<Vec<usize>>,
}

impl FeatureSet {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        Self {
            descriptors,
            keypoints: None,
            image_shape: None,
        }
    }

    /// `count` uniformly random descriptors of `width_bytes` bytes.
    pub fn random_rng<R: Rng>(rng: &mut R, count: usize, width_bytes: usize) -> Self {
        Self::new(
            (0..count)
                .map(|_| Descriptor::random_rng(rng, width_bytes))
                .collect(),
        )
    }

    /// A second capture of the same sample: every descriptor is kept, in
    /// order, with each bit flipped with probability `flip_probability`.
    pub fn get_similar_set<R: Rng>(&self, rng: &mut R, flip_probability: f64) -> Self {
        Self {
            descriptors: self
                .descriptors
                .iter()
                .map(|d| d.get_similar_descriptor(rng, flip_probability))
                .collect(),
            keypoints: self.keypoints.clone(),
            image_shape: self.image_shape.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Width in bytes shared by every descriptor, `None` for an empty set.
    pub fn descriptor_width(&self) -> Option<usize> {
        self.descriptors.first().map(Descriptor::len_bytes)
    }

    /// Checks the structural invariants of a loaded set. `path` is only used
    /// for error reporting.
    pub fn validate(&self, path: &Path) -> Result<(), MatchError> {
        if let Some(keypoints) = &self.keypoints {
            if keypoints.len() != self.descriptors.len() {
                return Err(MatchError::corrupt(
                    path,
                    format!(
                        "{} keypoints for {} descriptors",
                        keypoints.len(),
                        self.descriptors.len()
                    ),
                ));
            }
        }
        let widths = self
            .descriptors
            .iter()
            .map(Descriptor::len_bytes)
            .unique()
            .collect::<Vec<_>>();
        match widths.as_slice() {
            [] => Ok(()),
            [0] => Err(MatchError::corrupt(path, "descriptors are empty vectors")),
            [_] => Ok(()),
            _ => Err(MatchError::corrupt(
                path,
                format!("mixed descriptor widths {widths:?}"),
            )),
        }
    }

    pub fn from_json_slice(bytes: &[u8], path: &Path) -> Result<Self, MatchError> {
        let raw: FeatureSetJson =
            serde_json::from_slice(bytes).map_err(|e| MatchError::corrupt(path, e))?;
        let descriptors = raw
            .descriptors
            .ok_or_else(|| MatchError::corrupt(path, "missing `descriptors` field"))?
            .into_iter()
            .map(Descriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let set = Self {
            descriptors,
            keypoints: raw.keypoints,
            image_shape: raw.image_shape,
        };
        set.validate(path)?;
        Ok(set)
    }

    pub fn from_bincode_slice(bytes: &[u8], path: &Path) -> Result<Self, MatchError> {
        let set: Self = bincode::deserialize(bytes).map_err(|e| MatchError::corrupt(path, e))?;
        set.validate(path)?;
        Ok(set)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, MatchError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_bincode_vec(&self) -> Result<Vec<u8>, MatchError> {
        bincode::serialize(self).map_err(|e| MatchError::Other(e.to_string()))
    }

    /// Writes the set in the encoding implied by the file extension.
    pub fn write_to(&self, path: &Path) -> Result<(), MatchError> {
        let bytes = match FeatureFileFormat::from_path(path) {
            FeatureFileFormat::Json => self.to_json_vec()?,
            FeatureFileFormat::Bincode => self.to_bincode_vec()?,
        };
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureFileFormat {
    Json,
    Bincode,
}

impl FeatureFileFormat {
    /// `.bin` and `.bincode` files are bincode, anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") | Some("bincode") => Self::Bincode,
            _ => Self::Json,
        }
    }
}

/// Reads feature files, retrying transient I/O errors with exponential
/// backoff. Corrupt content is never retried.
#[derive(Debug, Clone)]
pub struct FeatureSetLoader {
    max_retries: usize,
    initial_backoff: Duration,
}

impl FeatureSetLoader {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            max_retries: config.load_max_retries,
            initial_backoff: Duration::from_millis(config.load_initial_backoff_ms),
        }
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<FeatureSet, MatchError> {
        let path = path.as_ref();
        let bytes = self.read_with_retry(path)?;
        let set = match FeatureFileFormat::from_path(path) {
            FeatureFileFormat::Json => FeatureSet::from_json_slice(&bytes, path)?,
            FeatureFileFormat::Bincode => FeatureSet::from_bincode_slice(&bytes, path)?,
        };
        tracing::info!(
            path = %path.display(),
            descriptors = set.len(),
            keypoints = set.keypoints.as_ref().map_or(0, Vec::len),
            "Loaded feature set"
        );
        Ok(set)
    }

    fn read_with_retry(&self, path: &Path) -> Result<Vec<u8>, MatchError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;
        loop {
            match fs::read(path) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        path = %path.display(),
                        attempt,
                        "Transient error reading feature file: {}. Retrying in {:?}",
                        e,
                        backoff
                    );
                    thread::sleep(backoff);
                    backoff *= 2;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(MatchError::corrupt(PathBuf::from(path), e));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
