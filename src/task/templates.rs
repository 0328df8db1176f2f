use camino::Utf8Path;
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::error::ScanError;
use crate::layout::{Layout, TEMPLATE_EXT};

/// Errors that can occur when rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An I/O error occurred while writing the markup.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template sources couldn't be listed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The template failed to parse or render.
    #[error("Template '{0}': {1:#}")]
    Render(String, minijinja::Error),
}

/// Data available to every template.
#[derive(Debug, Serialize)]
struct Page<'a> {
    /// Stem of the template being rendered, e.g. `index`.
    page: &'a str,
}

/// Renders every template in the source root into a markup file next to it.
///
/// Templates whose file name starts with `_` are partials, they are only
/// rendered through `include` or `extends`. Returns the number of rendered
/// pages.
pub fn render_all(layout: &Layout) -> Result<usize, TemplateError> {
    let root = layout.app();
    let env = environment(&root);
    let mut count = 0;

    for path in crate::io::glob_files(&root, &format!("*.{TEMPLATE_EXT}"))? {
        let (Some(name), Some(stem)) = (path.file_name(), path.file_stem()) else {
            continue;
        };

        if name.starts_with('_') {
            continue;
        }

        let html = env
            .get_template(name)
            .and_then(|template| template.render(Page { page: stem }))
            .map_err(|e| TemplateError::Render(name.to_string(), e))?;

        crate::io::write(&path.with_extension("html"), html)?;
        count += 1;
    }

    Ok(count)
}

fn environment(root: &Utf8Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(root));
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env
}
