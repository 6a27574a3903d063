//! File watcher: builds the index on startup, then keeps it current as documents change.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crossbeam_channel::RecvTimeoutError;
use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::Config;
use crate::context::Context;
use crate::corpus::FsCorpus;
use crate::error;
use crate::events;
use crate::index::IndexDelta;

/// Create a filesystem watcher that sends changed paths on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<PathBuf>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
        {
            for path in event.paths {
                let _ = tx.send(path);
            }
        }
    })
    .map_err(|e| {
        return error::Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Print what one rebuild changed.
fn print_delta(context: &Context, delta: &IndexDelta) {
    for id in &delta.removed {
        println!("- {id}");
    }
    for id in &delta.added {
        match context.index().get(id) {
            None => println!("+ {id}"),
            Some(entry) => println!("+ {id}  {}", commands::describe(&entry.backlink)),
        }
    }
}

/// Entry point for the watch command.
///
/// Indexes the vault, then recomputes each markdown document after it
/// settles and prints the backlinks that appeared or disappeared.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup.
pub fn run() -> Result<(), error::Error> {
    let root = Path::new(".").canonicalize()?;
    let config = Config::load(&root)?;
    let corpus = FsCorpus::new(&root, &config);
    let mut context = Context::load(config.clone(), Instant::now());

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| {
            return error::Error::Watch {
                reason: format!("cannot watch {}: {e}", root.display()),
            };
        })?;
    eprintln!("watch: monitoring {}, press Ctrl+C to stop", root.display());

    loop {
        let now = Instant::now();
        match context.tick(&corpus, now) {
            Err(e) => eprintln!("error: {e}"),
            Ok(delta) => print_delta(&context, &delta),
        }

        let changed = match context.next_deadline(now) {
            None => match rx.recv() {
                Err(_) => break,
                Ok(path) => path,
            },
            Some(wait) => match rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(path) => path,
            },
        };

        if let Some(path) = corpus.vault_path(&changed) {
            tracing::debug!(path, "document changed");
            events::document_changed(&mut context, &path, Instant::now());
        }
    }

    return Ok(());
}
