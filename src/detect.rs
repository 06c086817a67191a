//! The detection driver: stages the image set and runs the classifier once per
//! job.

use classifier::Classifier;
use errors::*;
use job::JobSpec;
use staging;
use std::path::{Path, PathBuf};

/// Counts for one detection batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetectionSummary {
    /// Path of the staged working copy.
    pub working: PathBuf,

    /// Number of jobs the classifier was run for.
    pub jobs: usize,

    /// Jobs whose classifier run failed or could not be launched.
    pub failed: Vec<JobSpec>,
}

/// Runs the classifier once for `job` against its freshly prepared
/// directories. A failed run is logged and reported as `false`; only staging
/// errors are returned.
pub fn run_job<C: Classifier + ?Sized>(
    classifier: &C,
    working: &Path,
    job: &JobSpec,
) -> Result<bool> {
    let (image_dir, relocation_dir) = staging::prepare_job_directories(working, job)?;
    match classifier.classify(&image_dir, &relocation_dir, job) {
        Ok(ref exit) if exit.success() => Ok(true),
        Ok(exit) => {
            warn!("{}", exit);
            Ok(false)
        }
        Err(e) => {
            warn!("classifier for {} did not run: {}", job, e);
            Ok(false)
        }
    }
}

/// Stages a working copy of `basepath` and runs every job in order. Classifier
/// failures do not stop the batch; file-system errors do.
pub fn run_detection<C, I>(classifier: &C, basepath: &Path, jobs: I) -> Result<DetectionSummary>
where
    C: Classifier + ?Sized,
    I: IntoIterator<Item = JobSpec>,
{
    let working = staging::stage_working_copy(basepath)?;
    info!("working copy at {}", working.display());

    let mut summary = DetectionSummary {
        working: working.clone(),
        ..Default::default()
    };
    for job in jobs {
        summary.jobs += 1;
        if !run_job(classifier, &working, &job)? {
            summary.failed.push(job);
        }
    }

    info!(
        "detection finished: {} jobs, {} classifier failures",
        summary.jobs,
        summary.failed.len()
    );
    Ok(summary)
}
