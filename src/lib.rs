//! Batch evaluation of an external image-outlier classifier.
//!
//! The classifier is run over a grid of clustering methods and pollution
//! percentages (`detect`), then each run's inlier/outlier directories are
//! scored against a labeled ground truth (`evaluate`). The two steps share
//! nothing but the directory naming convention of [`JobSpec`].
//!
//! [`JobSpec`]: struct.JobSpec.html
#![recursion_limit = "1024"]

extern crate csv;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

#[cfg(test)]
extern crate tempfile;

pub mod errors;

mod job;
pub use job::{default_methods, default_pollutions, enumerate_jobs, JobSpec, Method};
pub use job::{DEFAULT_MAX_POLLUTION, MAX_POLLUTION, OUTLIER_SUFFIX};

mod setting;
pub use setting::{parse_methods, parse_pollutions, Setting};

mod staging;
pub use staging::{prepare_job_directories, stage_working_copy};

mod classifier;
pub use classifier::{Classifier, ClassifierExit, ScriptClassifier};

mod detect;
pub use detect::{run_detection, run_job, DetectionSummary};

mod acc;
pub use acc::{best_by_f1, detail_rows, evaluate_each, load_label_set, load_predicted_set};
pub use acc::{run_evaluation, score, score_sets, ConfusionRow, DetailRow, FileSet, Scored};
pub use acc::{f1, precision, recall};

mod report;
pub use report::{Report, DETAIL_HEADER, REPORT_HEADER};
