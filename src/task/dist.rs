use camino::Utf8PathBuf;
use thiserror::Error;

use crate::error::ScanError;
use crate::layout::Layout;

/// Errors that can occur when assembling the distribution directory.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A compiled artifact the distribution can't do without is missing.
    #[error("Missing compiled asset '{0}', run the development build first")]
    Missing(Utf8PathBuf),
}

/// Copies the compiled stylesheet, the script bundle, fonts and markup from
/// the source root into the distribution root, preserving their paths
/// relative to the source root. Returns the number of copied files.
pub fn copy(layout: &Layout) -> Result<usize, CopyError> {
    let app = layout.app();
    let dist = layout.dist();

    let mut files = Vec::new();

    for required in [layout.style_output(), layout.script_output()] {
        if !required.is_file() {
            return Err(CopyError::Missing(required));
        }
        files.push(required);
    }

    files.extend(crate::io::glob_files(&app, "*.html")?);

    for path in &files {
        let relative = path.strip_prefix(&app).map_err(ScanError::from)?;
        crate::io::copy(path, &dist.join(relative))?;
    }

    let mut count = files.len();

    let fonts = layout.fonts_dir();
    if fonts.is_dir() {
        let relative = fonts.strip_prefix(&app).map_err(ScanError::from)?;
        count += crate::io::copy_rec(&fonts, &dist.join(relative))?;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn refuses_incomplete_distribution() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = Layout::rooted(root);

        crate::io::write(&layout.style_output(), "a{}").unwrap();

        let err = copy(&layout).unwrap_err();

        assert!(matches!(err, CopyError::Missing(ref path) if *path == layout.script_output()));
        assert!(!layout.dist().exists());
    }

    #[test]
    fn copies_markup_and_compiled_assets() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = Layout::rooted(root);
        let app = layout.app();

        crate::io::write(&layout.style_output(), "a{}").unwrap();
        crate::io::write(&layout.script_output(), "go()").unwrap();
        crate::io::write(&app.join("index.html"), "<p>hi</p>").unwrap();
        crate::io::write(&app.join("fonts/Inter.woff2"), "font").unwrap();
        crate::io::write(&app.join("js/main.js"), "source").unwrap();

        let count = copy(&layout).unwrap();

        assert_eq!(count, 4);
        let dist = layout.dist();
        assert_eq!(fs::read_to_string(dist.join("index.html")).unwrap(), "<p>hi</p>");
        assert!(dist.join("css/style.min.css").is_file());
        assert!(dist.join("js/main.min.js").is_file());
        assert!(dist.join("fonts/Inter.woff2").is_file());
        assert!(!dist.join("js/main.js").exists());
    }
}
