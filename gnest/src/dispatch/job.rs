use polynest::entities::{PlacementJob, PlacementResult};
use polynest::error::Result;
use polynest::io::wire::{self, JobKind};
use polynest::nfp::{PairJob, PairResult, pair_nfp};

use crate::placement::place_parts;

/// Unit of work handed to a worker.
#[derive(Debug, Clone)]
pub enum Job {
    Pair(PairJob),
    Placement(PlacementJob),
}

#[derive(Debug, Clone)]
pub enum JobOutput {
    Pair(PairResult),
    Placement(PlacementResult),
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Pair(_) => JobKind::Pair,
            Job::Placement(_) => JobKind::Placement,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Job::Pair(j) => Ok(wire::encode_pair_job(j)),
            Job::Placement(j) => wire::encode_placement_job(j),
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Job> {
        match wire::job_kind(buf)? {
            JobKind::Pair => wire::decode_pair_job(buf).map(Job::Pair),
            JobKind::Placement => wire::decode_placement_job(buf).map(Job::Placement),
        }
    }

    pub fn run(&self) -> Result<JobOutput> {
        match self {
            Job::Pair(j) => Ok(JobOutput::Pair(pair_nfp(j))),
            Job::Placement(j) => place_parts(j).map(JobOutput::Placement),
        }
    }
}

impl JobOutput {
    /// Fails when an NFP is too large for the 16 bit loop offsets of the pair format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            JobOutput::Pair(r) => wire::encode_pair_result(r),
            JobOutput::Placement(r) => Ok(wire::encode_placement_result(r)),
        }
    }

    /// Decodes the output of a job of the given kind.
    pub fn decode(kind: JobKind, buf: &[u8]) -> Result<JobOutput> {
        match kind {
            JobKind::Pair => wire::decode_pair_result(buf).map(JobOutput::Pair),
            JobKind::Placement => wire::decode_placement_result(buf).map(JobOutput::Placement),
        }
    }
}

/// Worker entry point: decodes a job, runs it and encodes its output.
pub fn run_encoded(buf: &[u8]) -> Result<Vec<u8>> {
    Job::decode(buf)?.run()?.encode()
}
