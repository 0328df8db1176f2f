//! Maps filesystem changes to the tasks they invalidate.
//!
//! The watcher only produces batches of changed paths. Deciding what to do
//! about them happens here, on plain paths relative to the project root, so
//! the rules can be exercised without a real filesystem watcher.

use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};

use crate::layout::{APP, JS, SCRIPT_OUTPUT, SCSS, TEMPLATE_EXT};
use crate::{Pipeline, Reload, Task};

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Reaction to a change, ordered by the sequence in which a batch runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Run(Task),
    /// Tell browsers to refresh without rebuilding anything.
    Reload,
}

struct Rule {
    include: Pattern,
    exclude: Option<Pattern>,
    action: Action,
}

impl Rule {
    fn new(include: &str, exclude: Option<&str>, action: Action) -> Result<Self, glob::PatternError> {
        Ok(Self {
            include: Pattern::new(include)?,
            exclude: exclude.map(Pattern::new).transpose()?,
            action,
        })
    }

    fn matches(&self, path: &Utf8Path) -> bool {
        self.include.matches_with(path.as_str(), MATCH)
            && !self
                .exclude
                .as_ref()
                .is_some_and(|exclude| exclude.matches_with(path.as_str(), MATCH))
    }
}

pub struct Dispatcher {
    rules: Vec<Rule>,
}

impl Dispatcher {
    pub fn new() -> Result<Self, glob::PatternError> {
        let bundle = format!("{APP}/{JS}/{SCRIPT_OUTPUT}");

        let rules = vec![
            Rule::new(
                &format!("{APP}/{SCSS}/**/*.scss"),
                None,
                Action::Run(Task::Styles),
            )?,
            Rule::new(
                &format!("{APP}/{JS}/**/*.js"),
                Some(bundle.as_str()),
                Action::Run(Task::Scripts),
            )?,
            Rule::new(
                &format!("{APP}/*.{TEMPLATE_EXT}"),
                None,
                Action::Run(Task::Templates),
            )?,
            Rule::new(&format!("{APP}/*.html"), None, Action::Reload)?,
        ];

        Ok(Self { rules })
    }

    /// Deduplicated actions triggered by a batch of changed paths.
    pub fn actions<'a>(&self, paths: impl IntoIterator<Item = &'a Utf8Path>) -> BTreeSet<Action> {
        let mut actions = BTreeSet::new();

        for path in paths {
            for rule in &self.rules {
                if rule.matches(path) {
                    actions.insert(rule.action);
                }
            }
        }

        actions
    }
}

/// Consumes batches of changed paths until the channel closes, running the
/// triggered tasks for each batch. A failing task is reported and the loop
/// keeps going.
pub fn run(
    pipeline: &Pipeline,
    reload: &Reload,
    batches: Receiver<Vec<Utf8PathBuf>>,
) -> Result<(), glob::PatternError> {
    let dispatcher = Dispatcher::new()?;

    for batch in batches {
        let actions = dispatcher.actions(batch.iter().map(Utf8PathBuf::as_path));
        if actions.is_empty() {
            continue;
        }

        tracing::debug!(?batch, ?actions, "change detected");
        let s = Instant::now();

        for action in actions {
            match action {
                Action::Run(task) => {
                    if let Err(e) = pipeline.run(task, reload) {
                        tracing::error!("{e}");
                    }
                }
                Action::Reload => reload.notify(),
            }
        }

        tracing::info!("refreshed {}", crate::io::as_overhead(s));
    }

    Ok(())
}
