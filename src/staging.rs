//! Staging of image directories on disk: the working copy of the input set and
//! the per-job image/relocation directory pair.
//!
//! None of these operations is transactional. A crash between removing and
//! recreating a directory leaves it absent, which evaluation reads as an empty
//! set.

use errors::*;
use job::JobSpec;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of the directory that holds the working copy.
pub const SET_PREFIX: &str = "set-";

/// Copies `source` (`<parent>/<name>`) to `<parent>/set-<name>/<name>` and
/// returns the copy's path. Any previous copy is removed first, so running
/// this twice leaves no stale files behind.
pub fn stage_working_copy<P: AsRef<Path>>(source: P) -> Result<PathBuf> {
    let source = source.as_ref().components().as_path();
    let name = source
        .file_name()
        .ok_or_else(|| Error::from_kind(ErrorKind::Staging(format!(
            "{} has no directory name",
            source.display()
        ))))?;

    let mut set_name = ::std::ffi::OsString::from(SET_PREFIX);
    set_name.push(name);
    let set_path = match source.parent() {
        Some(parent) => parent.join(set_name),
        None => PathBuf::from(set_name),
    };
    fs::create_dir_all(&set_path)
        .chain_err(|| format!("failed to create {}", set_path.display()))?;

    let working = set_path.join(name);
    replace_with_copy(source, &working)?;
    debug!("staged {} as {}", source.display(), working.display());
    Ok(working)
}

/// Creates a fresh copy of the working set for `job` and an empty directory
/// for the classifier to move outliers into. Returns `(image_dir,
/// relocation_dir)`.
pub fn prepare_job_directories<P: AsRef<Path>>(
    working: P,
    job: &JobSpec,
) -> Result<(PathBuf, PathBuf)> {
    let working = working.as_ref();
    let image_dir = job.derive_inlier_dir(working);
    replace_with_copy(working, &image_dir)?;

    let relocation_dir = job.derive_outlier_dir(working);
    remove_dir_if_exists(&relocation_dir)?;
    fs::create_dir_all(&relocation_dir)
        .chain_err(|| format!("failed to create {}", relocation_dir.display()))?;

    debug!(
        "prepared {} and {} for {}",
        image_dir.display(),
        relocation_dir.display(),
        job
    );
    Ok((image_dir, relocation_dir))
}

fn replace_with_copy(from: &Path, to: &Path) -> Result<()> {
    remove_dir_if_exists(to)?;
    copy_dir(from, to).chain_err(|| {
        ErrorKind::Staging(format!("failed to copy {} to {}", from.display(), to.display()))
    })
}

/// Removes a directory tree; a missing directory is not an error.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).chain_err(|| format!("failed to remove {}", path.display())),
    }
}

/// Recursively copies the directory `from` to `to`. `to` must not exist.
pub fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            trace!("copy {:?} -> {:?}", entry.path(), target);
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use job::Method;
    use std::collections::BTreeSet;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path, contents: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    fn list(path: &Path) -> BTreeSet<String> {
        fs::read_dir(path)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect()
    }

    fn image_set(root: &Path) -> PathBuf {
        let src = root.join("cats");
        fs::create_dir(&src).unwrap();
        touch(&src.join("a.jpg"), "a");
        touch(&src.join("b.jpg"), "b");
        fs::create_dir(src.join("nested")).unwrap();
        touch(&src.join("nested").join("c.jpg"), "c");
        src
    }

    #[test]
    fn working_copy_layout() {
        let tmp = TempDir::new().unwrap();
        let src = image_set(tmp.path());

        let working = stage_working_copy(&src).unwrap();
        assert_eq!(working, tmp.path().join("set-cats").join("cats"));
        assert_eq!(list(&working), list(&src));
        assert_eq!(fs::read_to_string(working.join("nested/c.jpg")).unwrap(), "c");
    }

    #[test]
    fn staging_twice_drops_stale_files() {
        let tmp = TempDir::new().unwrap();
        let src = image_set(tmp.path());

        let first = stage_working_copy(&src).unwrap();
        touch(&first.join("stale.jpg"), "old");
        touch(&first.join("a.jpg"), "modified");

        let second = stage_working_copy(&src).unwrap();
        assert_eq!(first, second);
        assert_eq!(list(&second), list(&src));
        assert_eq!(fs::read_to_string(second.join("a.jpg")).unwrap(), "a");
    }

    #[test]
    fn staging_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(stage_working_copy(tmp.path().join("nope")).is_err());
    }

    #[test]
    fn job_directories_are_fresh() {
        let tmp = TempDir::new().unwrap();
        let src = image_set(tmp.path());
        let working = stage_working_copy(&src).unwrap();
        let job = JobSpec::new(Method::Birch, 15);

        let (image_dir, relocation_dir) = prepare_job_directories(&working, &job).unwrap();
        assert_eq!(image_dir, tmp.path().join("set-cats").join("cats-birch-15"));
        assert_eq!(
            relocation_dir,
            tmp.path().join("set-cats").join("cats-birch-15-outlier")
        );

        // simulate a classifier run, then prepare again
        fs::rename(image_dir.join("a.jpg"), relocation_dir.join("a.jpg")).unwrap();
        let (image_dir, relocation_dir) = prepare_job_directories(&working, &job).unwrap();
        assert_eq!(list(&image_dir), list(&src));
        assert!(list(&relocation_dir).is_empty());
    }
}
