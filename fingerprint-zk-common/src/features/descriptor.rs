use crate::error::MatchError;
use base64::{prelude::BASE64_STANDARD, Engine};
use rand::{
    distributions::{Bernoulli, Distribution},
    Rng,
};
use serde::{Deserialize, Serialize};

/// A binary feature descriptor, compared bitwise.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(pub Vec<u8>);

impl Descriptor {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode from a base64 string.
    pub fn from_base64(s: &str) -> Result<Self, MatchError> {
        BASE64_STANDARD
            .decode(s)
            .map(Self)
            .map_err(|e| MatchError::DescriptorShapeMismatch(format!("invalid base64: {e}")))
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }

    pub fn len_bytes(&self) -> usize {
        self.0.len()
    }

    /// Largest possible distance to a descriptor of the same width.
    pub fn max_distance(&self) -> u32 {
        (self.0.len() * 8) as u32
    }

    #[inline]
    pub fn flip_bit(&mut self, i: usize) {
        self.0[i / 8] ^= 1u8 << (i % 8);
    }

    /// Number of differing bits. Both descriptors must have the same width.
    #[inline]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        debug_assert_eq!(self.0.len(), other.0.len());
        let (lhs_words, lhs_tail) = split_words(&self.0);
        let (rhs_words, rhs_tail) = split_words(&other.0);

        let words: u32 = lhs_words
            .chunks_exact(8)
            .zip(rhs_words.chunks_exact(8))
            .map(|(l, r)| (read_u64(l) ^ read_u64(r)).count_ones())
            .sum();
        let tail: u32 = lhs_tail
            .iter()
            .zip(rhs_tail)
            .map(|(l, r)| (l ^ r).count_ones())
            .sum();
        words + tail
    }

    pub fn random_rng<R: Rng>(rng: &mut R, width_bytes: usize) -> Self {
        let mut bytes = vec![0u8; width_bytes];
        rng.fill(bytes.as_mut_slice());
        Self(bytes)
    }

    /// Returns a copy with every bit flipped with probability `flip_probability`.
    pub fn get_similar_descriptor<R: Rng>(&self, rng: &mut R, flip_probability: f64) -> Self {
        let mut res = self.clone();
        let dist = Bernoulli::new(flip_probability.clamp(0.0, 1.0))
            .expect("probability is clamped to [0, 1]");
        for i in 0..self.max_distance() as usize {
            if dist.sample(rng) {
                res.flip_bit(i);
            }
        }
        res
    }
}

fn split_words(bytes: &[u8]) -> (&[u8], &[u8]) {
    bytes.split_at(bytes.len() - bytes.len() % 8)
}

#[inline]
fn read_u64(chunk: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(chunk);
    u64::from_le_bytes(arr)
}

/// Descriptor encodings accepted in JSON feature files: a list of byte
/// values, or a base64 string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum DescriptorJson {
    Values(Vec<i64>),
    Base64(String),
}

impl TryFrom<DescriptorJson> for Descriptor {
    type Error = MatchError;

    fn try_from(value: DescriptorJson) -> Result<Self, Self::Error> {
        match value {
            DescriptorJson::Values(values) => values
                .into_iter()
                .map(|v| {
                    u8::try_from(v).map_err(|_| {
                        MatchError::DescriptorShapeMismatch(format!(
                            "descriptor value {v} is not a byte"
                        ))
                    })
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Descriptor),
            DescriptorJson::Base64(s) => Descriptor::from_base64(&s),
        }
    }
}
