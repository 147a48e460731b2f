//! Parallel verification of independent feature-set pairs.

use crate::{
    circuit::CircuitInputPayload,
    error::MatchError,
    matcher::{MatchResult, Matcher},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// One (query, reference) comparison. When `output` is set the circuit input
/// for the pair is written there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    pub query: PathBuf,
    pub reference: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub job: BatchJob,
    pub result: Result<BatchSuccess, MatchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSuccess {
    pub result: MatchResult,
    pub payload_digest: String,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reads a JSON array of [`BatchJob`]s.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<BatchJob>, MatchError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| MatchError::corrupt(path, e))
}

/// Runs every job on the rayon pool. A failing job is reported in its own
/// outcome and does not affect the others. Outcomes are in job order.
pub fn verify_batch(matcher: &Matcher, jobs: &[BatchJob]) -> Vec<BatchOutcome> {
    let outcomes: Vec<BatchOutcome> = jobs
        .par_iter()
        .map(|job| BatchOutcome {
            job: job.clone(),
            result: run_job(matcher, job),
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    metrics::counter!("batch.failed_jobs").increment(failed as u64);
    tracing::info!(jobs = jobs.len(), failed, "Batch verification finished");
    outcomes
}

fn run_job(matcher: &Matcher, job: &BatchJob) -> Result<BatchSuccess, MatchError> {
    let result = matcher
        .match_files(&job.query, &job.reference)
        .inspect_err(|e| {
            tracing::error!(
                query = %job.query.display(),
                reference = %job.reference.display(),
                "Batch job failed: {}",
                e
            )
        })?;
    let payload = CircuitInputPayload::from_match_result(&result, matcher.config());
    if let Some(output) = &job.output {
        payload.write_to(output)?;
    }
    Ok(BatchSuccess {
        payload_digest: payload.digest()?,
        result,
    })
}
