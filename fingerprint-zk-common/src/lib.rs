pub mod batch;
pub mod circuit;
pub mod config;
pub mod error;
pub mod features;
pub mod helpers;
pub mod matcher;
pub mod report;
pub mod tracing;

/// Width of an ORB descriptor in bytes.
pub const DESCRIPTOR_SIZE_BYTES: usize = 32;
/// Hamming distance between two complementary ORB descriptors.
pub const MAX_DISTANCE: u32 = (DESCRIPTOR_SIZE_BYTES * 8) as u32;
/// Neighbors returned per query descriptor.
pub const KNN_K: usize = 2;
/// Number of `(best, second_best)` pairs the circuit accepts.
pub const MAX_PAIRS: usize = 100;
/// Length of the flattened `distances` circuit signal.
pub const CIRCUIT_DISTANCES_LENGTH: usize = 2 * MAX_PAIRS;

pub use circuit::CircuitInputPayload;
pub use config::MatcherConfig;
pub use error::MatchError;
pub use features::{Descriptor, FeatureSet};
pub use matcher::{CandidatePair, MatchResult};
