//! The external outlier classifier.
//!
//! A classifier partitions an image directory: images it considers outliers
//! are moved into the relocation directory, inliers stay where they are. The
//! driver only looks at the exit status and never retries a failed run.

use errors::*;
use job::JobSpec;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// Outcome of one classifier run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierExit {
    /// Printable form of what was run, for logging.
    pub command: String,

    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,

    /// Captured error stream, trimmed.
    pub stderr: String,
}

impl ClassifierExit {
    /// A successful run of `command`.
    pub fn ok<S: Into<String>>(command: S) -> Self {
        ClassifierExit {
            command: command.into(),
            code: Some(0),
            stderr: String::new(),
        }
    }

    /// Whether the classifier reported success.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ClassifierExit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = match self.code {
            Some(c) => c.to_string(),
            None => "killed by signal".to_string(),
        };
        write!(f, "{} \n {}. \nCode: {}", self.command, self.stderr, code)
    }
}

/// The core trait of anything that can split an image directory into inliers
/// and outliers for a given job.
pub trait Classifier {
    /// Runs the classifier for `job` on `input_dir`, relocating outliers into
    /// `output_dir`. An `Err` means the classifier could not be run at all.
    fn classify(&self, input_dir: &Path, output_dir: &Path, job: &JobSpec) -> Result<ClassifierExit>;
}

/// Runs a classifier script as a child process, e.g.
///
/// ```text
/// python image_set_cleaner.py --processing=move --image_dir=... \
///     --relocation_dir=... --clustering_method=kmeans --pollution_percent=5
/// ```
#[derive(Debug, Clone)]
pub struct ScriptClassifier {
    program: String,
    script: Option<String>,
}

impl ScriptClassifier {
    /// Creates a classifier that runs `script` with `program`.
    pub fn new<S: Into<String>>(program: S, script: S) -> Self {
        ScriptClassifier {
            program: program.into(),
            script: Some(script.into()),
        }
    }

    /// Creates a classifier that runs `program` directly, without a script
    /// argument.
    pub fn executable<S: Into<String>>(program: S) -> Self {
        ScriptClassifier {
            program: program.into(),
            script: None,
        }
    }

    /// The argument list passed to the program.
    pub fn args(&self, input_dir: &Path, output_dir: &Path, job: &JobSpec) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref script) = self.script {
            args.push(script.clone());
        }
        args.push("--processing=move".to_string());
        args.push(format!("--image_dir={}", input_dir.display()));
        args.push(format!("--relocation_dir={}", output_dir.display()));
        args.push(format!("--clustering_method={}", job.method));
        args.push(format!("--pollution_percent={}", job.pollution));
        args
    }
}

impl Classifier for ScriptClassifier {
    fn classify(&self, input_dir: &Path, output_dir: &Path, job: &JobSpec) -> Result<ClassifierExit> {
        let args = self.args(input_dir, output_dir, job);
        let command = ::std::iter::once(self.program.as_str())
            .chain(args.iter().map(|s| s.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        info!("{}", command);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .chain_err(|| format!("failed to launch {}", self.program))?;
        trace!("stdout of {}: {}", job, String::from_utf8_lossy(&output.stdout));

        Ok(ClassifierExit {
            command: command,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
