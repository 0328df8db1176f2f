#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod bundle;
pub mod dispatch;
mod error;
mod io;
pub mod layout;
#[cfg(feature = "live")]
mod live;
mod reload;
#[cfg(feature = "server")]
pub mod server;
pub mod task;
#[cfg(feature = "live")]
mod watch;

use std::time::Instant;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::info;

pub use crate::bundle::Bundle;
pub use crate::error::*;
pub use crate::layout::Layout;
pub use crate::reload::Reload;
pub use crate::task::scripts::ScriptMinifier;

/// A leaf task of the pipeline. Composite tasks are built out of these by
/// [`Pipeline::build`] and [`Pipeline::compile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    /// Render templates into markup in the source root.
    Templates,
    /// Concatenate vendor stylesheets into the `_libs` partial.
    Libs,
    /// Compile the entry stylesheet.
    Styles,
    /// Concatenate and minify scripts.
    Scripts,
    /// Compress images into the distribution directory.
    Images,
    /// Remove the distribution directory.
    Clean,
    /// Copy compiled assets and markup into the distribution directory.
    Copy,
}

impl Task {
    pub fn name(self) -> &'static str {
        match self {
            Task::Templates => "templates",
            Task::Libs => "libs",
            Task::Styles => "styles",
            Task::Scripts => "scripts",
            Task::Images => "images",
            Task::Clean => "clean",
            Task::Copy => "copy",
        }
    }
}

/// Branches of the development build. Branches run in parallel, tasks
/// within a branch run in order: the style compiler imports the vendor
/// bundle, so it has to wait for it.
const COMPILE: [&[Task]; 3] = [
    &[Task::Libs, Task::Styles],
    &[Task::Scripts],
    &[Task::Templates],
];

/// Production build, strictly sequential.
const BUILD: [Task; 3] = [Task::Clean, Task::Images, Task::Copy];

/// Runs tasks against a project [`Layout`].
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    layout: Layout,
    minifier: ScriptMinifier,
}

impl Pipeline {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            minifier: ScriptMinifier::default(),
        }
    }

    pub fn with_minifier(mut self, minifier: ScriptMinifier) -> Self {
        self.minifier = minifier;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Runs a single leaf task.
    pub fn run(&self, task: Task, reload: &Reload) -> Result<(), PipelineError> {
        let s = Instant::now();
        let name = task.name();
        let layout = &self.layout;

        let result: Result<String, TaskError> = match task {
            Task::Templates => crate::task::templates::render_all(layout)
                .map(|n| format!("rendered {n} templates"))
                .map_err(Into::into),
            Task::Libs => crate::task::styles::bundle_vendor(layout, reload)
                .map(|()| format!("bundled {}", layout.libs_output()))
                .map_err(Into::into),
            Task::Styles => crate::task::styles::compile(layout, reload)
                .map(|()| format!("compiled {}", layout.style_output()))
                .map_err(Into::into),
            Task::Scripts => crate::task::scripts::bundle(layout, self.minifier, reload)
                .map(|()| format!("bundled {}", layout.script_output()))
                .map_err(Into::into),
            Task::Images => crate::task::images::optimize_all(layout)
                .map(|n| format!("optimized {n} images"))
                .map_err(Into::into),
            Task::Clean => crate::io::clean(&layout.dist())
                .map(|()| format!("removed {}", layout.dist()))
                .map_err(Into::into),
            Task::Copy => crate::task::dist::copy(layout)
                .map(|n| format!("copied {n} files"))
                .map_err(Into::into),
        };

        let message = result.map_err(|e| PipelineError::Task(name, e))?;
        info!(task = name, "{message} {}", crate::io::as_overhead(s));

        Ok(())
    }

    /// Builds every development asset: vendor styles, styles, scripts and
    /// templates, in parallel where they don't depend on each other.
    pub fn compile(&self, reload: &Reload) -> Result<(), PipelineError> {
        COMPILE.par_iter().try_for_each(|branch| {
            branch
                .iter()
                .try_for_each(|&task| self.run(task, reload))
        })
    }

    /// Assembles a deployable distribution directory from scratch.
    pub fn build(&self) -> Result<(), PipelineError> {
        let s = Instant::now();
        let reload = Reload::disabled();

        for task in BUILD {
            self.run(task, &reload)?;
        }

        info!("production build finished {}", crate::io::as_overhead(s));
        Ok(())
    }

    /// Watches the source tree and re-runs tasks affected by each change.
    /// Never returns unless watching fails.
    #[cfg(feature = "live")]
    pub fn watch(&self, reload: &Reload) -> anyhow::Result<()> {
        watch::watch(self, reload)
    }

    /// Starts the live-reload channel, returning its handle and port.
    #[cfg(feature = "live")]
    pub fn live_reload(&self) -> std::io::Result<(Reload, u16)> {
        live::start()
    }

    /// Development mode: compiles every asset, serves the source root with
    /// live-reload and rebuilds on changes until the process is interrupted.
    #[cfg(all(feature = "live", feature = "server"))]
    pub fn develop(&self) -> anyhow::Result<()> {
        let (reload, port) = live::start()?;

        self.compile(&reload)?;

        let _http = server::start(self.layout.app(), Some(port));

        self.watch(&reload)
    }
}
