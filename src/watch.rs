//! Watch mode bridges the filesystem watcher into the dispatch loop.
//!
//! `notify` reports absolute paths in debounced batches. They get turned
//! into paths relative to the project root and forwarded over a channel to
//! [`dispatch::run`](crate::dispatch::run), which decides what to rebuild.

use std::collections::BTreeSet;
use std::sync::mpsc::Sender;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, DebouncedEvent, new_debouncer};

use crate::{Pipeline, Reload};

pub fn watch(pipeline: &Pipeline, reload: &Reload) -> anyhow::Result<()> {
    let root = pipeline.layout().root().canonicalize_utf8()?;
    let app = pipeline.layout().app().canonicalize_utf8()?;

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(250), None, {
        let root = root.clone();
        move |result: DebounceEventResult| forward(&root, result, &tx)
    })?;

    tracing::info!("watching {}", app);
    debouncer.watch(&app, RecursiveMode::Recursive)?;

    crate::dispatch::run(pipeline, reload, rx)?;

    Ok(())
}

fn forward(root: &Utf8Path, result: DebounceEventResult, tx: &Sender<Vec<Utf8PathBuf>>) {
    match result {
        Ok(events) => {
            let batch = relativize(root, &events);
            if !batch.is_empty() && tx.send(batch).is_err() {
                tracing::debug!("dispatch loop is gone");
            }
        }
        Err(errors) => {
            for e in errors {
                tracing::error!("watch error: {:?}", e);
            }
        }
    }
}

/// Changed paths relative to `root`, deduplicated. Access events and paths
/// outside of the root are dropped.
fn relativize(root: &Utf8Path, events: &[DebouncedEvent]) -> Vec<Utf8PathBuf> {
    events
        .iter()
        .filter(|de| {
            matches!(
                de.event.kind,
                EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
            )
        })
        .flat_map(|de| &de.event.paths)
        .filter_map(|path| Utf8Path::from_path(path))
        .filter_map(|path| path.strip_prefix(root).ok())
        .map(Utf8Path::to_path_buf)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
