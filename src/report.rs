//! CSV output of an evaluation: the confusion report (one row per job) and
//! the false-positive detail (one row per file).

use acc::{ConfusionRow, DetailRow, Scored};
use csv;
use errors::*;
use std::fs::File;
use std::path::Path;

/// Header of the report file.
pub const REPORT_HEADER: (&str, &str, &str, &str, &str, &str) =
    ("method", "pollution", "TN", "FP", "FN", "TP");

/// Header of the detail file.
pub const DETAIL_HEADER: (&str, &str, &str) = ("method", "pollution", "filename");

/// Both output files, open for the duration of a run. Rows are appended in
/// job order; nothing is guaranteed on disk until `finish`.
pub struct Report {
    report: csv::Writer<File>,
    detail: csv::Writer<File>,
    rows: usize,
    details: usize,
}

impl Report {
    /// Creates (truncating) both files and writes their headers.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(report_path: P, detail_path: Q) -> Result<Report> {
        let mut report = open(report_path.as_ref())?;
        report.serialize(REPORT_HEADER)?;
        let mut detail = open(detail_path.as_ref())?;
        detail.serialize(DETAIL_HEADER)?;
        Ok(Report {
            report: report,
            detail: detail,
            rows: 0,
            details: 0,
        })
    }

    /// Appends one report row.
    pub fn write_row(&mut self, row: &ConfusionRow) -> Result<()> {
        self.report.serialize(row.to_tuple())?;
        self.rows += 1;
        Ok(())
    }

    /// Appends detail rows.
    pub fn write_details(&mut self, details: &[DetailRow]) -> Result<()> {
        for d in details {
            self.detail.write_byte_record(&d.to_record())?;
            self.details += 1;
        }
        Ok(())
    }

    /// Appends a scored job: its report row and one detail row per false
    /// positive.
    pub fn append(&mut self, scored: &Scored) -> Result<()> {
        self.write_row(&scored.row)?;
        self.write_details(&scored.detail_rows())
    }

    /// Flushes and closes both files, returning the number of report and
    /// detail rows written.
    pub fn finish(mut self) -> Result<(usize, usize)> {
        self.report.flush()?;
        self.detail.flush()?;
        Ok((self.rows, self.details))
    }
}

fn open(path: &Path) -> Result<csv::Writer<File>> {
    let writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .chain_err(|| format!("failed to open {}", path.display()))?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acc::score_sets;
    use job::{JobSpec, Method};
    use std::fs;
    use tempfile::TempDir;

    fn set(names: &[&str]) -> ::acc::FileSet {
        names.iter().map(|s| ::std::ffi::OsString::from(s)).collect()
    }

    #[test]
    fn headers_only() {
        let tmp = TempDir::new().unwrap();
        let (r, d) = (tmp.path().join("report.csv"), tmp.path().join("detail.csv"));
        let counts = Report::create(&r, &d).unwrap().finish().unwrap();
        assert_eq!(counts, (0, 0));
        assert_eq!(fs::read_to_string(&r).unwrap(), "method,pollution,TN,FP,FN,TP\n");
        assert_eq!(fs::read_to_string(&d).unwrap(), "method,pollution,filename\n");
    }

    #[test]
    fn rows_and_quoting() {
        let tmp = TempDir::new().unwrap();
        let (r, d) = (tmp.path().join("report.csv"), tmp.path().join("detail.csv"));
        let mut report = Report::create(&r, &d).unwrap();

        let job = JobSpec::new(Method::GaussianMixture, 12);
        let scored = score_sets(
            &job,
            &set(&["x"]),
            &set(&["a,b.jpg"]),
            &set(&["x", "a,b.jpg"]),
            &set(&[]),
        );
        report.append(&scored).unwrap();
        assert_eq!(report.finish().unwrap(), (1, 1));

        assert_eq!(
            fs::read_to_string(&r).unwrap(),
            "method,pollution,TN,FP,FN,TP\ngaussian_mixture,12,0,1,0,1\n"
        );
        assert_eq!(
            fs::read_to_string(&d).unwrap(),
            "method,pollution,filename\ngaussian_mixture,12,\"a,b.jpg\"\n"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn raw_filename_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let (r, d) = (tmp.path().join("report.csv"), tmp.path().join("detail.csv"));
        let mut report = Report::create(&r, &d).unwrap();

        let job = JobSpec::new(Method::KMeans, 0);
        let ff = OsStr::from_bytes(b"\xff.jpg").to_os_string();
        let fe = OsStr::from_bytes(b"\xfe.jpg").to_os_string();
        let no = vec![ff.clone(), fe.clone()].into_iter().collect();
        let yes = vec![ff, fe].into_iter().collect();
        let scored = score_sets(&job, &set(&[]), &no, &yes, &set(&[]));
        report.append(&scored).unwrap();
        assert_eq!(report.finish().unwrap(), (1, 2));

        let mut lines = fs::read(&d)
            .unwrap()
            .split(|&b| b == b'\n')
            .map(|l| l.to_vec())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                b"kmeans,0,\xfe.jpg".to_vec(),
                b"kmeans,0,\xff.jpg".to_vec(),
                b"method,pollution,filename".to_vec(),
            ]
        );
    }
}
