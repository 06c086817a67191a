//! Command line entry point: `detect` runs the classifier over the grid,
//! `evaluate` scores the runs against the labeled ground truth.

extern crate chrono;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate outlier_eval;
extern crate structopt;

use outlier_eval::errors::*;
use outlier_eval::*;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "outlier-eval")]
#[structopt(about = "Sweep an image outlier classifier and score it against labels.")]
struct Opt {
    /// TOML file with the classifier command and the default grid.
    #[structopt(short = "s", long = "setting", parse(from_os_str))]
    setting: Option<PathBuf>,

    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt, Debug)]
enum Cmd {
    /// Stage a working copy and run the classifier for every
    /// (method, pollution) pair.
    #[structopt(name = "detect")]
    Detect {
        /// Directory with the images to clean.
        #[structopt(parse(from_os_str))]
        basepath: PathBuf,

        /// Clustering methods, e.g. "['kmeans', 'birch']".
        #[structopt(short = "m", long = "methods")]
        methods: Option<String>,

        /// Pollution percentages, e.g. "[0, 5, 10]" or "0..=40".
        #[structopt(short = "p", long = "pollutions")]
        pollutions: Option<String>,

        /// Program that runs the classifier (default: python).
        #[structopt(long = "program")]
        program: Option<String>,

        /// Classifier script; empty to run the program directly.
        #[structopt(long = "script")]
        script: Option<String>,
    },

    /// Score every (method, pollution) run and write the report and detail
    /// CSV files.
    #[structopt(name = "evaluate")]
    Evaluate {
        /// The staged working copy the runs were derived from.
        #[structopt(parse(from_os_str))]
        source_path: PathBuf,

        /// Directory of images labeled as belonging to the set.
        #[structopt(parse(from_os_str))]
        yes_path: PathBuf,

        /// Directory of images labeled as outliers.
        #[structopt(parse(from_os_str))]
        no_path: PathBuf,

        /// Clustering methods, e.g. "['kmeans', 'birch']".
        #[structopt(short = "m", long = "methods")]
        methods: Option<String>,

        /// Pollution percentages, e.g. "[0, 5, 10]" or "0..=40".
        #[structopt(short = "p", long = "pollutions")]
        pollutions: Option<String>,

        /// Report CSV, `report.csv` next to the source path if empty.
        #[structopt(long = "report-path", parse(from_os_str))]
        report_path: Option<PathBuf>,

        /// Detail CSV, `detail.csv` next to the source path if empty.
        #[structopt(long = "detail-path", parse(from_os_str))]
        detail_path: Option<PathBuf>,
    },
}

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder.format(|buf, record| {
        let t = chrono::Utc::now();
        writeln!(
            buf,
            "{} {}:{}: {}",
            t.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or("-"),
            record.args()
        )
    });
    match env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.filter_level(log::LevelFilter::Info),
    };
    builder.init();
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ErrorKind::InvalidConfig(format!("{} is not a directory", path.display())).into())
    }
}

fn detect(
    setting: &Setting,
    basepath: &Path,
    methods: Option<&str>,
    pollutions: Option<&str>,
    program: Option<&str>,
    script: Option<&str>,
) -> Result<()> {
    let methods = setting.resolve_methods(methods)?;
    let pollutions = setting.resolve_pollutions(pollutions)?;
    require_dir(basepath)?;

    let program = program.unwrap_or_else(|| setting.program());
    let classifier = match script.unwrap_or_else(|| setting.script()) {
        "" => ScriptClassifier::executable(program),
        script => ScriptClassifier::new(program, script),
    };

    run_detection(&classifier, basepath, enumerate_jobs(&methods, &pollutions))?;
    Ok(())
}

fn evaluate(
    setting: &Setting,
    source_path: &Path,
    yes_path: &Path,
    no_path: &Path,
    methods: Option<&str>,
    pollutions: Option<&str>,
    report_path: Option<PathBuf>,
    detail_path: Option<PathBuf>,
) -> Result<()> {
    let methods = setting.resolve_methods(methods)?;
    let pollutions = setting.resolve_pollutions(pollutions)?;
    require_dir(source_path)?;

    // ground truth first: a missing label set must fail before any output
    let actual_yes = load_label_set(yes_path)?;
    let actual_no = load_label_set(no_path)?;
    info!(
        "ground truth: {} yes, {} no",
        actual_yes.len(),
        actual_no.len()
    );

    let source_path = source_path.components().as_path();
    let workspace = source_path.parent().unwrap_or_else(|| Path::new(""));
    let report_path = report_path.unwrap_or_else(|| workspace.join("report.csv"));
    let detail_path = detail_path.unwrap_or_else(|| workspace.join("detail.csv"));

    let mut report = Report::create(&report_path, &detail_path)?;
    let mut rows = Vec::new();
    evaluate_each(
        source_path,
        enumerate_jobs(&methods, &pollutions),
        &actual_yes,
        &actual_no,
        |scored| {
            rows.push(scored.row);
            report.append(&scored)
        },
    )?;
    let (n_rows, n_details) = report.finish()?;
    info!(
        "wrote {} rows to {} and {} rows to {}",
        n_rows,
        report_path.display(),
        n_details,
        detail_path.display()
    );

    if let Some(best) = best_by_f1(&rows) {
        info!(
            "best f1 {:.3} with {} (precision {:.3}, recall {:.3})",
            best.f1(),
            best.job,
            best.precision(),
            best.recall()
        );
    }
    Ok(())
}

fn run() -> Result<()> {
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    let setting = match opt.setting {
        Some(ref path) => Setting::init(path)?,
        None => Setting::default(),
    };

    match opt.cmd {
        Cmd::Detect {
            ref basepath,
            ref methods,
            ref pollutions,
            ref program,
            ref script,
        } => detect(
            &setting,
            basepath,
            methods.as_ref().map(|s| s.as_str()),
            pollutions.as_ref().map(|s| s.as_str()),
            program.as_ref().map(|s| s.as_str()),
            script.as_ref().map(|s| s.as_str()),
        ),
        Cmd::Evaluate {
            ref source_path,
            ref yes_path,
            ref no_path,
            ref methods,
            ref pollutions,
            ref report_path,
            ref detail_path,
        } => evaluate(
            &setting,
            source_path,
            yes_path,
            no_path,
            methods.as_ref().map(|s| s.as_str()),
            pollutions.as_ref().map(|s| s.as_str()),
            report_path.clone(),
            detail_path.clone(),
        ),
    }
}

fn main() {
    init_logger();

    if let Err(ref e) = run() {
        let mut msg = format!("error: {}", e);
        for cause in e.iter().skip(1) {
            msg.push_str(&format!("\ncaused by: {}", cause));
        }
        error!("{}", msg);
        eprintln!("{}", msg);
        ::std::process::exit(1);
    }
}
