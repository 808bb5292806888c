/*
 * Copyright 2020 Nikhil Marathe <nsm.nikhil@gmail.com>
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::{path::PathBuf, rc::Rc};

use redo_metrics::scoped_metric;

use crate::{
    db::BuildDb,
    error::BuildError,
    handler::{Builder, Handler, NullHandler},
    stamp::Target,
};

/// Orchestrates handler resolution, the recursive staleness decision, atomic
/// rebuilds, and the `BuildDb`'s on-disk lifecycle. See `spec.md` §4.4.
///
/// `BuildSystem` is strictly single-threaded and synchronous (`spec.md`
/// §5): `build` and `rebuild` recurse and complete before returning, there
/// is no cancellation, and the `BuildDb` is held exclusively for the
/// duration of every call. Running two `BuildSystem`s against the same
/// database path concurrently is undefined behavior; callers that need
/// mutual exclusion must arrange it themselves (e.g. a lock file).
#[derive(Debug)]
pub struct BuildSystem {
    db_path: PathBuf,
    handlers: Vec<Rc<dyn Handler>>,
    null_handler: Rc<dyn Handler>,
    db: BuildDb,
}

impl BuildSystem {
    /// Creates an orchestrator with an empty handler chain, loading (or, if
    /// absent/malformed, lazily starting) the `BuildDb` at `db_path`.
    /// Install handlers with `with_handler`/`register_handler` before the
    /// first `build` call; the chain must not change afterward (`spec.md`
    /// §6).
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        let db_path = db_path.into();
        let db = BuildDb::load(&db_path);
        BuildSystem {
            db_path,
            handlers: Vec::new(),
            null_handler: Rc::new(NullHandler),
            db,
        }
    }

    /// Builder-style handler registration: `BuildSystem::new(path)
    /// .with_handler(SourceHandler).with_handler(FileHandler)`. Order is
    /// priority: the first handler whose `can_handle` accepts a target
    /// wins.
    pub fn with_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.register_handler(handler);
        self
    }

    /// Appends `handler` to the end of the chain.
    pub fn register_handler(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Rc::new(handler));
    }

    /// Read-only access to the underlying database, mainly useful for
    /// tests and diagnostics.
    pub fn db(&self) -> &BuildDb {
        &self.db
    }

    /// Decides whether `target` is up-to-date and rebuilds it (and any
    /// stale recorded dependencies) if not. See `spec.md` §4.4.4.
    pub fn build(&mut self, target: impl AsRef<str>) -> Result<(), BuildError> {
        self.build_at_depth(target.as_ref(), 0)
    }

    /// Unconditionally rebuilds `target`, bypassing the staleness check.
    /// Exposed for callers (and tests) that need to force a rebuild;
    /// `build` calls this internally whenever it detects staleness.
    pub fn rebuild(&mut self, target: impl AsRef<str>) -> Result<(), BuildError> {
        self.rebuild_at_depth(target.as_ref(), 0)
    }

    pub(crate) fn build_at_depth(&mut self, target: &str, depth: usize) -> Result<(), BuildError> {
        scoped_metric!("build");
        tracing::debug!(target = %target, depth, "build");
        let handler = self.get_handler(target);
        let old_stamp = self.db.target_stamp(target).cloned();
        let current_stamp = handler.stamp(target);

        let stale = match &old_stamp {
            None => true,
            Some(old) => !handler.stamps_match(old, &current_stamp),
        };
        if stale {
            tracing::trace!(target = %target, "own stamp stale or target unknown");
            return self.rebuild_at_depth(target, depth + 1);
        }

        // Snapshot the recorded dependencies before recursing: the
        // recursive `build`/`rebuild` calls below mutate `self.db`, so we
        // can't hold a borrow of `self.db.dependencies_of` across them.
        let deps: Vec<(Target, String)> = self
            .db
            .dependencies_of(target)
            .map(|(d, s)| (d.clone(), s.clone()))
            .collect();

        for (dep, old_dep_stamp) in deps {
            if self.db.is_known_target(&dep) {
                self.build_at_depth(&dep, depth + 1)?;
            }
            let dep_handler = self.get_handler(&dep);
            let current_dep_stamp = dep_handler.stamp(&dep);
            if !dep_handler.stamps_match(&old_dep_stamp, &current_dep_stamp) {
                tracing::trace!(target = %target, dependency = %dep, "dependency stale");
                return self.rebuild_at_depth(target, depth + 1);
            }
        }

        Ok(())
    }

    pub(crate) fn rebuild_at_depth(
        &mut self,
        target: &str,
        depth: usize,
    ) -> Result<(), BuildError> {
        scoped_metric!("rebuild");
        tracing::debug!(target = %target, depth, "rebuild");
        let handler = self.get_handler(target);
        if Rc::ptr_eq(&handler, &self.null_handler) {
            tracing::warn!(target = %target, "no handler accepts this target; falling back to null handler");
        }

        // The dependency set is the transcript of *this* rebuild, not an
        // accumulated history: erase whatever was recorded before.
        self.db.clear_dependencies(target);

        {
            let mut builder = Builder {
                system: &mut *self,
                target: target.to_owned(),
                depth: depth + 1,
            };
            handler.rebuild_impl(target, &mut builder)?;
        }

        let new_stamp = handler.stamp(target);
        self.db.set_target_stamp(target.to_owned(), new_stamp);
        self.save()?;
        Ok(())
    }

    pub(crate) fn register_dependency(&mut self, target: &str, dep: Target) {
        let dep_handler = self.get_handler(&dep);
        let stamp = dep_handler.stamp(&dep);
        tracing::trace!(target = %target, dependency = %dep, "register_dependency");
        self.db.record_dependency(target.to_owned(), dep, stamp);
    }

    fn get_handler(&self, target: &str) -> Rc<dyn Handler> {
        self.handlers
            .iter()
            .find(|h| h.can_handle(target))
            .cloned()
            .unwrap_or_else(|| self.null_handler.clone())
    }

    fn save(&self) -> Result<(), BuildError> {
        self.db.save(&self.db_path)?;
        Ok(())
    }
}
