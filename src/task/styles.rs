use camino::Utf8Path;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use thiserror::Error;

use crate::error::BundleError;
use crate::layout::Layout;
use crate::reload::Reload;

/// Browser support range used for vendor prefixing.
pub const BROWSERSLIST: &str = "last 10 versions";

/// Errors that can occur when compiling Stylesheets.
#[derive(Debug, Error)]
pub enum StyleError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One of the vendor stylesheets couldn't be read.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// A Sass compilation error occurred.
    #[error("Sass compilation error: {0}")]
    Sass(#[from] Box<grass::Error>),

    /// The browser support query was rejected.
    #[error("Invalid browserslist query '{BROWSERSLIST}': {0}")]
    Browsers(String),

    /// The stylesheet couldn't be parsed or printed for prefixing.
    #[error("CSS error in '{0}': {1}")]
    Css(String, String),
}

/// Concatenates the vendor stylesheets into a single partial importable
/// from the application styles. The output is prefixed but not minified.
pub fn bundle_vendor(layout: &Layout, reload: &Reload) -> Result<(), StyleError> {
    let css = layout.vendor_styles().concat_with(|acc, _, text| {
        acc.push_str(text);
        if !text.ends_with('\n') {
            acc.push('\n');
        }
    })?;

    let output = layout.libs_output();
    let css = autoprefix(&output, &css, false)?;
    crate::io::write(&output, css)?;

    reload.notify();
    Ok(())
}

/// Compiles the entry stylesheet into compressed, prefixed CSS.
pub fn compile(layout: &Layout, reload: &Reload) -> Result<(), StyleError> {
    let opts = grass::Options::default().style(grass::OutputStyle::Compressed);
    let css = grass::from_path(layout.style_entry(), &opts)?;

    let output = layout.style_output();
    let css = autoprefix(&output, &css, true)?;
    crate::io::write(&output, css)?;

    reload.notify();
    Ok(())
}

fn targets() -> Result<Targets, StyleError> {
    let browsers = Browsers::from_browserslist([BROWSERSLIST])
        .map_err(|e| StyleError::Browsers(e.to_string()))?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Adds vendor prefixes required by [`BROWSERSLIST`], optionally printing
/// the result minified.
pub fn autoprefix(name: &Utf8Path, css: &str, minify: bool) -> Result<String, StyleError> {
    let targets = targets()?;
    let css_error = |e: String| StyleError::Css(name.to_string(), e);

    let options = ParserOptions {
        filename: name.to_string(),
        ..ParserOptions::default()
    };

    let mut sheet = StyleSheet::parse(css, options).map_err(|e| css_error(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    Ok(printed.code)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;

    use super::*;
    use crate::layout::VENDOR_STYLES;

    fn project() -> (tempfile::TempDir, Layout) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, Layout::rooted(root))
    }

    #[test]
    fn vendor_bundle_keeps_declared_order() {
        let (_dir, layout) = project();
        let rules = [
            ".vendor-one{color:red}",
            ".vendor-two{margin:1px}",
            ".vendor-three{padding:2px}",
            ".vendor-four{width:3px}",
            ".vendor-five{height:4px}",
        ];

        for (path, rule) in VENDOR_STYLES.iter().zip(rules) {
            crate::io::write(&layout.node_modules().join(path), rule).unwrap();
        }

        let (reload, rx) = Reload::channel();
        bundle_vendor(&layout, &reload).unwrap();

        let css = fs::read_to_string(layout.libs_output()).unwrap();
        let positions: Vec<_> = [".vendor-one", ".vendor-two", ".vendor-three", ".vendor-four", ".vendor-five"]
            .iter()
            .map(|class| css.find(class).expect("every vendor rule is bundled"))
            .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{css}");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn missing_vendor_style_aborts() {
        let (_dir, layout) = project();

        let err = bundle_vendor(&layout, &Reload::disabled()).unwrap_err();

        assert!(matches!(err, StyleError::Bundle(_)));
        assert!(!layout.libs_output().exists());
    }

    #[test]
    fn compiles_entry_with_partials() {
        let (_dir, layout) = project();
        let scss = layout.scss_dir();

        crate::io::write(&scss.join("_libs.scss"), ".a{color:red}\n").unwrap();
        crate::io::write(
            &scss.join("style.scss"),
            "@import \"libs\";\n.b {\n  .c { margin: 0; }\n}\n",
        )
        .unwrap();

        let (reload, rx) = Reload::channel();
        compile(&layout, &reload).unwrap();

        let css = fs::read_to_string(layout.style_output()).unwrap();
        assert!(css.contains(".a{"), "{css}");
        assert!(css.contains(".b .c{margin:0}"), "{css}");
        assert!(!css.contains('\n'), "{css}");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn sass_error_is_surfaced() {
        let (_dir, layout) = project();
        crate::io::write(&layout.style_entry(), ".a { color: red; ").unwrap();

        let err = compile(&layout, &Reload::disabled()).unwrap_err();

        assert!(matches!(err, StyleError::Sass(_)));
    }

    #[test]
    fn prefixes_for_old_browsers() {
        let css = autoprefix(Utf8Path::new("test.css"), ".a{user-select:none}", true).unwrap();

        assert!(css.contains("-webkit-user-select:none"), "{css}");
        assert!(css.contains("user-select:none"), "{css}");
    }

    #[test]
    fn grid_keeps_standard_syntax() {
        let source = ".g{display:grid;grid-template-columns:1fr 2fr}";
        let css = autoprefix(Utf8Path::new("test.css"), source, true).unwrap();

        assert!(css.contains("display:grid"), "{css}");
        assert!(css.contains("grid-template-columns:1fr 2fr"), "{css}");
        assert!(!css.contains("-ms-grid"), "{css}");
    }
}
