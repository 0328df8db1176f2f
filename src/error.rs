use std::path::StripPrefixError;

use camino::Utf8PathBuf;
use thiserror::Error;

pub use crate::task::dist::CopyError;
pub use crate::task::images::ImageError;
pub use crate::task::scripts::ScriptError;
pub use crate::task::styles::StyleError;
pub use crate::task::templates::TemplateError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Task '{0}':\n{1}")]
    Task(&'static str, TaskError),
}

/// Failure of a single leaf task, carrying the collaborator error verbatim.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error("Error while clearing the dist directory:\n{0}")]
    Clean(#[from] CleanError),
}

/// Errors from selecting input files by pattern.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Couldn't compile glob pattern.\n{0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Couldn't run glob.\n{0}")]
    Glob(#[from] glob::GlobError),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),

    #[error("Path is outside of the scanned directory.\n{0}")]
    Prefix(#[from] StripPrefixError),
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Couldn't read bundle source '{0}'.\n{1}")]
    Read(Utf8PathBuf, std::io::Error),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct CleanError(#[from] pub std::io::Error);
