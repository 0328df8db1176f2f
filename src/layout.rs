//! The fixed filesystem layout of a project.
//!
//! Every path the pipeline reads or writes is derived from a single root
//! directory. The directory names themselves are not configurable, they
//! form the contract between the pipeline and the project it builds.

use camino::{Utf8Path, Utf8PathBuf};

use crate::bundle::Bundle;

/// Source root, also served by the development server.
pub const APP: &str = "app";
/// Distribution output root.
pub const DIST: &str = "dist";
/// Third-party packages providing vendor styles and scripts.
pub const NODE_MODULES: &str = "node_modules";

pub const SCSS: &str = "scss";
pub const CSS: &str = "css";
pub const JS: &str = "js";
pub const IMAGES: &str = "images";
pub const FONTS: &str = "fonts";

pub const STYLE_ENTRY: &str = "style.scss";
pub const STYLE_OUTPUT: &str = "style.min.css";
pub const LIBS_OUTPUT: &str = "_libs.scss";
pub const SCRIPT_ENTRY: &str = "main.js";
pub const SCRIPT_OUTPUT: &str = "main.min.js";

/// Template files are compiled into markup with the same stem.
pub const TEMPLATE_EXT: &str = "jinja";

/// Vendor stylesheets, relative to `node_modules`, in concatenation order.
pub const VENDOR_STYLES: [&str; 5] = [
    "normalize.css/normalize.css",
    "slick-carousel/slick/slick.css",
    "slick-carousel/slick/slick-theme.css",
    "animate.css/animate.css",
    "fullpage.js/dist/fullpage.css",
];

/// Vendor scripts, relative to `node_modules`, in concatenation order. The
/// application entry script is always appended after these.
pub const VENDOR_SCRIPTS: [&str; 5] = [
    "jquery/dist/jquery.js",
    "slick-carousel/slick/slick.js",
    "wow.js/dist/wow.js",
    "fullpage.js/dist/fullpage.js",
    "fullpage.js/vendors/scrolloverflow.js",
];

/// Resolves the layout contract against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Default for Layout {
    /// Layout rooted at the current working directory.
    fn default() -> Self {
        Self::rooted(".")
    }
}

impl Layout {
    pub fn rooted(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn app(&self) -> Utf8PathBuf {
        self.root.join(APP)
    }

    pub fn dist(&self) -> Utf8PathBuf {
        self.root.join(DIST)
    }

    pub fn node_modules(&self) -> Utf8PathBuf {
        self.root.join(NODE_MODULES)
    }

    pub fn scss_dir(&self) -> Utf8PathBuf {
        self.app().join(SCSS)
    }

    pub fn css_dir(&self) -> Utf8PathBuf {
        self.app().join(CSS)
    }

    pub fn js_dir(&self) -> Utf8PathBuf {
        self.app().join(JS)
    }

    pub fn images_dir(&self) -> Utf8PathBuf {
        self.app().join(IMAGES)
    }

    pub fn fonts_dir(&self) -> Utf8PathBuf {
        self.app().join(FONTS)
    }

    pub fn dist_images(&self) -> Utf8PathBuf {
        self.dist().join(IMAGES)
    }

    pub fn style_entry(&self) -> Utf8PathBuf {
        self.scss_dir().join(STYLE_ENTRY)
    }

    pub fn style_output(&self) -> Utf8PathBuf {
        self.css_dir().join(STYLE_OUTPUT)
    }

    pub fn libs_output(&self) -> Utf8PathBuf {
        self.scss_dir().join(LIBS_OUTPUT)
    }

    pub fn script_entry(&self) -> Utf8PathBuf {
        self.js_dir().join(SCRIPT_ENTRY)
    }

    pub fn script_output(&self) -> Utf8PathBuf {
        self.js_dir().join(SCRIPT_OUTPUT)
    }

    /// Vendor stylesheets concatenated by the style bundler.
    pub fn vendor_styles(&self) -> Bundle {
        let base = self.node_modules();
        Bundle::new(VENDOR_STYLES.iter().map(|path| base.join(path)))
    }

    /// Vendor scripts followed by the application entry script.
    pub fn scripts(&self) -> Bundle {
        let base = self.node_modules();
        Bundle::new(
            VENDOR_SCRIPTS
                .iter()
                .map(|path| base.join(path))
                .chain([self.script_entry()]),
        )
    }
}
