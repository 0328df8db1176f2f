use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::sync::LazyLock;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use console::Style;
use indicatif::ProgressStyle;

use crate::error::{CleanError, ScanError};

const ANSI_BLUE: Style = Style::new().blue();

/// Hidden files are only matched by patterns that name them explicitly.
const GLOB_OPTS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

pub(crate) static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("Error setting progress bar template")
        .progress_chars("#>-")
});

pub fn as_overhead(s: Instant) -> impl Display {
    let e = Instant::now();
    let f = format!("(+{}ms)", e.duration_since(s).as_millis());
    ANSI_BLUE.apply_to(f)
}

/// Delete the directory recursively. A directory that doesn't exist is
/// already clean.
pub fn clean(dir: &Utf8Path) -> Result<(), CleanError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CleanError(e)),
    }
}

/// Write the file, creating any missing parent directories.
pub fn write(path: &Utf8Path, data: impl AsRef<[u8]>) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    fs::write(path, data)
}

/// Copy the file, creating any missing parent directories.
pub fn copy(src: &Utf8Path, dst: &Utf8Path) -> std::io::Result<()> {
    if let Some(dir) = dst.parent() {
        fs::create_dir_all(dir)?;
    }

    fs::copy(src, dst).map(|_| ())
}

/// Copy a directory tree, returns the number of copied files. Hidden
/// entries are skipped.
pub fn copy_rec(src: &Utf8Path, dst: &Utf8Path) -> std::io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut count = 0;

    for entry in src.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_name().starts_with('.') {
            continue;
        }
        let filetype = entry.file_type()?;
        if filetype.is_dir() {
            count += copy_rec(entry.path(), &dst.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
            count += 1;
        }
    }

    Ok(count)
}

/// Collect regular files matching `pattern` under `base`. Special characters
/// in `base` itself are escaped, only `pattern` is interpreted as a glob.
/// Hidden files and directories don't match wildcards.
pub fn glob_files(base: &Utf8Path, pattern: &str) -> Result<Vec<Utf8PathBuf>, ScanError> {
    let glob = format!("{}/{pattern}", glob::Pattern::escape(base.as_str()));
    let mut files = Vec::new();

    for entry in glob::glob_with(&glob, GLOB_OPTS)? {
        let path = Utf8PathBuf::try_from(entry?)?;
        if path.is_file() {
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_twice_never_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let dist = root.join("dist");

        write(&dist.join("a/b/c.txt"), "stale").unwrap();

        clean(&dist).unwrap();
        assert!(!dist.exists());
        clean(&dist).unwrap();
    }

    #[test]
    fn copy_rec_preserves_structure() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        write(&root.join("src/a.woff"), "a").unwrap();
        write(&root.join("src/nested/b.woff2"), "b").unwrap();

        let count = copy_rec(&root.join("src"), &root.join("dst")).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(root.join("dst/nested/b.woff2")).unwrap(), "b");
    }

    #[test]
    fn glob_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        write(&root.join("x/one.png"), "1").unwrap();
        write(&root.join("x/deep/two.png"), "2").unwrap();

        let mut files = glob_files(&root.join("x"), "**/*").unwrap();
        files.sort();

        assert_eq!(files, vec![root.join("x/deep/two.png"), root.join("x/one.png")]);
    }

    #[test]
    fn hidden_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        write(&root.join("x/one.woff"), "1").unwrap();
        write(&root.join("x/.DS_Store"), "junk").unwrap();
        write(&root.join("x/deep/.gitkeep"), "").unwrap();

        let files = glob_files(&root.join("x"), "**/*").unwrap();
        assert_eq!(files, vec![root.join("x/one.woff")]);

        let count = copy_rec(&root.join("x"), &root.join("y")).unwrap();
        assert_eq!(count, 1);
        assert!(!root.join("y/.DS_Store").exists());
        assert!(!root.join("y/deep/.gitkeep").exists());
    }
}
