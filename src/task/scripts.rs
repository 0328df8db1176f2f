use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::error::BundleError;
use crate::layout::Layout;
use crate::reload::Reload;

/// Errors that can occur when bundling JavaScript files.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// An I/O error occurred during process execution.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One of the bundled scripts couldn't be read.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// The Esbuild process returned a non-zero exit code.
    #[error("Esbuild execution failed: {0}")]
    Esbuild(String),

    /// Failed to parse Esbuild output as UTF-8.
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Minifier applied to the concatenated script bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScriptMinifier {
    /// Pipe the bundle through `esbuild --minify`, which must be available
    /// in the system PATH.
    #[default]
    Esbuild,
    /// Write the concatenated bundle as is.
    Passthrough,
}

impl ScriptMinifier {
    pub fn minify(self, source: String) -> Result<String, ScriptError> {
        match self {
            ScriptMinifier::Esbuild => minify_esbuild(&source),
            ScriptMinifier::Passthrough => Ok(source),
        }
    }
}

/// Concatenates vendor scripts and the application entry script, in that
/// order, minifies the result and writes a single bundle.
pub fn bundle(
    layout: &Layout,
    minifier: ScriptMinifier,
    reload: &Reload,
) -> Result<(), ScriptError> {
    let source = layout.scripts().concat_with(|acc, _, text| {
        acc.push_str(text);
        if !text.ends_with('\n') {
            acc.push('\n');
        }
        // Keeps the last statement of one file from running into the
        // first statement of the next one.
        if !text.trim_end().ends_with(';') {
            acc.push_str(";\n");
        }
    })?;

    let code = minifier.minify(source)?;
    crate::io::write(&layout.script_output(), code)?;

    reload.notify();
    Ok(())
}

fn minify_esbuild(source: &str) -> Result<String, ScriptError> {
    let mut child = Command::new("esbuild")
        .arg("--minify")
        .arg("--loader=js")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // esbuild consumes the whole input before it writes anything, dropping
    // stdin afterwards signals the end of the input.
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes())?;
    }

    let output = child.wait_with_output()?;

    if !output.status.success() {
        return Err(ScriptError::Esbuild(String::from_utf8(output.stderr)?));
    }

    Ok(String::from_utf8(output.stdout)?)
}
