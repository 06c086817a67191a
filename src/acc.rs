//! Accuracy of the classifier against the ground truth.
//!
//! Labels and predictions are both directories, read as sets of filenames.
//! For each job the predicted inliers ("yes") and outliers ("no") are
//! intersected with the labeled "yes" and "no" sets:
//!
//! ```text
//!                 predict no   predict yes
//!   actual no         TN           FP
//!   actual yes        FN           TP
//! ```
//!
//! A predicted file outside both labeled sets is simply not counted.

use csv;
use errors::*;
use job::{JobSpec, Method};
use std::borrow::Cow;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

/// A set of filenames (directory entries). Names are kept as the OS returns
/// them, so names that are not valid UTF-8 stay distinct.
pub type FileSet = HashSet<OsString>;

/// Confusion counts of one job.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ConfusionRow {
    /// The job these counts belong to.
    pub job: JobSpec,
    /// Labeled no, predicted outlier.
    pub true_negative: usize,
    /// Labeled no, predicted inlier.
    pub false_positive: usize,
    /// Labeled yes, predicted outlier.
    pub false_negative: usize,
    /// Labeled yes, predicted inlier.
    pub true_positive: usize,
}

impl ConfusionRow {
    /// Converts the row to a report record `(method, pollution, TN, FP, FN, TP)`.
    pub fn to_tuple(&self) -> (Method, u32, usize, usize, usize, usize) {
        (
            self.job.method,
            self.job.pollution,
            self.true_negative,
            self.false_positive,
            self.false_negative,
            self.true_positive,
        )
    }

    /// TP / (TP + FP); NaN when nothing was predicted yes.
    pub fn precision(&self) -> f64 {
        precision(self.true_positive, self.false_positive)
    }

    /// TP / (TP + FN); NaN when nothing is labeled yes.
    pub fn recall(&self) -> f64 {
        recall(self.true_positive, self.false_negative)
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        f1(self.precision(), self.recall())
    }
}

/// A false positive: a file labeled "no" that the classifier kept.
#[derive(Debug, PartialEq, Eq, Clone, PartialOrd, Ord)]
pub struct DetailRow {
    /// The job that kept the file.
    pub job: JobSpec,
    /// The file name.
    pub filename: OsString,
}

impl DetailRow {
    /// Converts the row to a detail record `method,pollution,filename`. On
    /// unix the filename goes out as its raw bytes.
    pub fn to_record(&self) -> csv::ByteRecord {
        let mut record = csv::ByteRecord::new();
        record.push_field(self.job.method.as_str().as_bytes());
        record.push_field(self.job.pollution.to_string().as_bytes());
        record.push_field(&filename_bytes(&self.filename));
        record
    }
}

#[cfg(unix)]
fn filename_bytes(name: &OsStr) -> Cow<[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

#[cfg(not(unix))]
fn filename_bytes(name: &OsStr) -> Cow<[u8]> {
    match name.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

/// The counts of one job together with the false positives behind them.
#[derive(Debug, Clone)]
pub struct Scored {
    /// The confusion counts.
    pub row: ConfusionRow,
    /// Files labeled "no" that were predicted "yes".
    pub false_positives: FileSet,
}

impl Scored {
    /// One detail row per false positive, in set order.
    pub fn detail_rows(&self) -> Vec<DetailRow> {
        detail_rows(&self.row.job, &self.false_positives)
    }
}

fn list_dir(path: &Path) -> io::Result<FileSet> {
    let mut set = FileSet::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        set.insert(entry.file_name());
    }
    Ok(set)
}

/// Loads a ground-truth directory. A missing directory is an error.
pub fn load_label_set<P: AsRef<Path>>(path: P) -> Result<FileSet> {
    let path = path.as_ref();
    list_dir(path).chain_err(|| ErrorKind::MissingLabelSet(path.display().to_string()))
}

/// Loads a predicted directory. A missing directory reads as an empty set, so
/// it cannot be told apart from a classifier that put nothing there; the
/// absence is logged.
pub fn load_predicted_set<P: AsRef<Path>>(path: P) -> Result<FileSet> {
    let path = path.as_ref();
    match list_dir(path) {
        Ok(set) => Ok(set),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("predicted directory {} is absent, reading it as empty", path.display());
            Ok(FileSet::new())
        }
        Err(e) => Err(e).chain_err(|| format!("failed to list {}", path.display())),
    }
}

/// Scores `job` from in-memory sets.
pub fn score_sets(
    job: &JobSpec,
    actual_yes: &FileSet,
    actual_no: &FileSet,
    predict_yes: &FileSet,
    predict_no: &FileSet,
) -> Scored {
    let false_positives = actual_no
        .intersection(predict_yes)
        .cloned()
        .collect::<FileSet>();
    let row = ConfusionRow {
        job: *job,
        true_negative: actual_no.intersection(predict_no).count(),
        false_positive: false_positives.len(),
        false_negative: actual_yes.intersection(predict_no).count(),
        true_positive: actual_yes.intersection(predict_yes).count(),
    };
    Scored {
        row: row,
        false_positives: false_positives,
    }
}

/// Scores `job` against the predicted directories derived from `base`.
pub fn score<P: AsRef<Path>>(
    base: P,
    job: &JobSpec,
    actual_yes: &FileSet,
    actual_no: &FileSet,
) -> Result<Scored> {
    let base = base.as_ref();
    let predict_yes = load_predicted_set(job.derive_inlier_dir(base))?;
    let predict_no = load_predicted_set(job.derive_outlier_dir(base))?;
    let scored = score_sets(job, actual_yes, actual_no, &predict_yes, &predict_no);
    trace!("{} fp: {:?}", job, scored.false_positives);
    Ok(scored)
}

/// One detail row per filename in `fp`, in set order.
pub fn detail_rows(job: &JobSpec, fp: &FileSet) -> Vec<DetailRow> {
    fp.iter()
        .map(|f| DetailRow {
            job: *job,
            filename: f.clone(),
        })
        .collect()
}

/// Scores every job, in order, and hands each result to `sink`. A missing
/// predicted directory never stops the run.
pub fn evaluate_each<P, I, F>(
    base: P,
    jobs: I,
    actual_yes: &FileSet,
    actual_no: &FileSet,
    mut sink: F,
) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = JobSpec>,
    F: FnMut(Scored) -> Result<()>,
{
    let base = base.as_ref();
    for job in jobs {
        let scored = score(base, &job, actual_yes, actual_no)?;
        let r = &scored.row;
        info!(
            "{}: TN {} FP {} FN {} TP {} (precision {:.3}, recall {:.3}, f1 {:.3})",
            job,
            r.true_negative,
            r.false_positive,
            r.false_negative,
            r.true_positive,
            r.precision(),
            r.recall(),
            r.f1()
        );
        sink(scored)?;
    }
    Ok(())
}

/// Scores every job and collects the report and detail rows.
pub fn run_evaluation<P, I>(
    base: P,
    jobs: I,
    actual_yes: &FileSet,
    actual_no: &FileSet,
) -> Result<(Vec<ConfusionRow>, Vec<DetailRow>)>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = JobSpec>,
{
    let mut rows = Vec::new();
    let mut details = Vec::new();
    evaluate_each(base, jobs, actual_yes, actual_no, |scored| {
        details.extend(scored.detail_rows());
        rows.push(scored.row);
        Ok(())
    })?;
    Ok((rows, details))
}

/// The row with the highest F1 score, ignoring undefined scores.
pub fn best_by_f1(rows: &[ConfusionRow]) -> Option<&ConfusionRow> {
    rows.iter()
        .filter(|r| !r.f1().is_nan())
        .fold(None, |best: Option<&ConfusionRow>, r| match best {
            Some(b) if b.f1() >= r.f1() => Some(b),
            _ => Some(r),
        })
}

/// Precision from raw counts.
pub fn precision(tp: usize, fp: usize) -> f64 {
    1.0 * (tp as f64) / ((tp + fp) as f64)
}

/// Recall from raw counts.
pub fn recall(tp: usize, fnn: usize) -> f64 {
    1.0 * (tp as f64) / ((tp + fnn) as f64)
}

/// F1 score from precision and recall.
pub fn f1(precision: f64, recall: f64) -> f64 {
    2.0 * precision * recall / (precision + recall)
}
