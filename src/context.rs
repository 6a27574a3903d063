//! Everything one loaded instance owns: configuration, sessions, and the index.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::controller::SessionController;
use crate::corpus::Corpus;
use crate::error::Error;
use crate::host::{EditorSurface, Workspace};
use crate::index::{BacklinkIndex, IndexDelta};
use crate::schedule::{RebuildJob, RebuildScheduler};

/// Shared state handed to event dispatch. Created on load, torn down on unload.
#[derive(Debug, Clone)]
pub struct Context {
    /// Settings the instance was loaded with.
    pub(crate) config: Config,
    /// Preview sessions.
    pub(crate) controller: SessionController,
    /// Backlinks across the vault.
    pub(crate) index: BacklinkIndex,
    /// Pending rebuilds.
    pub(crate) scheduler: RebuildScheduler,
}

impl Context {
    /// Fresh context with an initial full rebuild scheduled.
    pub fn load(config: Config, now: Instant) -> Self {
        let mut scheduler =
            RebuildScheduler::new(config.full_rebuild_debounce, config.file_recompute_debounce);
        scheduler.request_full(now);
        return Self {
            controller: SessionController::new(config.temporary_view_opacity),
            config,
            index: BacklinkIndex::default(),
            scheduler,
        };
    }

    /// Loaded configuration.
    pub const fn config(&self) -> &Config {
        return &self.config;
    }

    /// Session controller, for inspecting which previews are running.
    pub const fn controller(&self) -> &SessionController {
        return &self.controller;
    }

    /// Current backlink index.
    pub const fn index(&self) -> &BacklinkIndex {
        return &self.index;
    }

    /// Time until the next rebuild is due, if any is pending.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        return self.scheduler.next_deadline(now);
    }

    /// Schedule a recompute of one document.
    pub fn request_file(&mut self, path: &str, now: Instant) {
        self.scheduler.request_file(path, now);
    }

    /// Schedule a full rebuild.
    pub fn request_full(&mut self, now: Instant) {
        self.scheduler.request_full(now);
    }

    /// Run every rebuild that has settled and report what changed.
    ///
    /// # Errors
    ///
    /// Returns the first corpus error; jobs after it are dropped and the
    /// index keeps whatever the earlier jobs produced.
    pub fn tick(&mut self, corpus: &dyn Corpus, now: Instant) -> Result<IndexDelta, Error> {
        let mut delta = IndexDelta::default();
        for job in self.scheduler.take_due(now) {
            let step = match &job {
                RebuildJob::File(path) => self.index.recompute_file(corpus, path, &self.config)?,
                RebuildJob::Full => self.index.rebuild_all(corpus, &self.config)?,
            };
            tracing::debug!(?job, added = step.added.len(), removed = step.removed.len(), "rebuild ran");
            delta.merge(step);
        }
        return Ok(delta);
    }

    /// End every session and drop the index and pending work.
    ///
    /// # Errors
    ///
    /// Returns the first error from ending a session; the rest of the
    /// teardown still happens.
    pub fn unload<H>(&mut self, host: &mut H) -> Result<(), Error>
    where
        H: Workspace + EditorSurface,
    {
        let ended = self.controller.end_all(host);
        self.index.clear();
        self.scheduler.clear();
        return ended;
    }
}
