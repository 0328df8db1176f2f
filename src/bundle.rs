use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::BundleError;

/// An ordered list of source files that get concatenated into one output.
///
/// Input order equals output order: [`Bundle::concat_with`] reads the
/// sources strictly in the order they were given, no matter how the files
/// are laid out on disk. Bundled libraries rely on this, dependencies must
/// come before their consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    sources: Vec<Utf8PathBuf>,
}

impl Bundle {
    pub fn new<P>(sources: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<Utf8PathBuf>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sources(&self) -> &[Utf8PathBuf] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Reads every source in order and folds it into a single buffer using
    /// `join`, which receives the accumulator and the text of the next file.
    ///
    /// A missing or unreadable source aborts the whole bundle.
    pub fn concat_with<F>(&self, mut join: F) -> Result<String, BundleError>
    where
        F: FnMut(&mut String, &Utf8Path, &str),
    {
        let mut buffer = String::new();

        for path in &self.sources {
            let text =
                fs::read_to_string(path).map_err(|e| BundleError::Read(path.clone(), e))?;
            join(&mut buffer, path, &text);
        }

        Ok(buffer)
    }
}
