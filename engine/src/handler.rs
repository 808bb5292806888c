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

use std::fmt::Debug;

use crate::{
    error::BuildError,
    stamp::{stamps_match, Stamp, Target},
    system::BuildSystem,
};

/// Errors a handler's `rebuild_impl` may fail with. The engine does not
/// mandate a concrete error type for handler-specific failures (`spec.md`
/// §7); `anyhow::Error` is the boundary type, matching how the teacher's own
/// binary crate collects heterogeneous errors.
pub type HandlerError = anyhow::Error;

/// A strategy that recognizes, stamps, compares, and rebuilds one kind of
/// target. See `spec.md` §4.3.
///
/// Handler chains are assembled by the host once, before the first `build`
/// call, and are never mutated afterward (`spec.md` §6) — this is what lets
/// `BuildSystem` hand out cheap, detached `Rc<dyn Handler>` clones instead of
/// borrowing the chain on every lookup.
pub trait Handler: Debug {
    /// Whether this handler recognizes `target`. The first handler in the
    /// chain whose `can_handle` returns true handles the target.
    fn can_handle(&self, target: &str) -> bool;

    /// Computes the current fingerprint of `target`. Must be a pure
    /// function of externally observable state, and must return the empty
    /// sentinel if `target`'s underlying resource is absent or unreadable.
    fn stamp(&self, target: &str) -> Stamp;

    /// Whether two stamps should be considered equal for staleness
    /// purposes. The default preserves the empty-sentinel rule (`spec.md`
    /// §4.2); handlers that override this must preserve it too.
    fn stamps_match(&self, a: &str, b: &str) -> bool {
        stamps_match(a, b)
    }

    /// Performs the side effects that (re)produce `target`, registering
    /// dependencies and/or sub-builds via `builder` as it goes.
    fn rebuild_impl(&self, target: &str, builder: &mut Builder<'_>) -> Result<(), HandlerError>;
}

/// The fallback handler installed implicitly at the end of every chain.
/// Accepts nothing, stamps everything as absent, and refuses to rebuild.
///
/// Because no handler in the chain ever claims an unrecognized target, the
/// orchestrator falls back to this one, which makes unrecognized targets
/// perpetually-stale leaf sources — they force re-evaluation on every
/// `build`, but never actually get rebuilt unless some other handler claims
/// them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandler;

impl Handler for NullHandler {
    fn can_handle(&self, _target: &str) -> bool {
        false
    }

    fn stamp(&self, _target: &str) -> Stamp {
        String::new()
    }

    fn rebuild_impl(&self, target: &str, _builder: &mut Builder<'_>) -> Result<(), HandlerError> {
        Err(anyhow::anyhow!("{:?} cannot build {:?}", self, target))
    }
}

/// The callback interface passed to `Handler::rebuild_impl`, bound to the
/// target currently being rebuilt. See `spec.md` §6.
pub struct Builder<'a> {
    pub(crate) system: &'a mut BuildSystem,
    pub(crate) target: Target,
    pub(crate) depth: usize,
}

impl<'a> Builder<'a> {
    /// Recursively builds `sub_target` to completion, then registers it as
    /// a dependency of the target being rebuilt. Use this for derived
    /// targets the current rebuild consumes.
    pub fn build(&mut self, sub_target: impl Into<Target>) -> Result<(), BuildError> {
        let dep = sub_target.into();
        self.system.build_at_depth(&dep, self.depth)?;
        self.system.register_dependency(&self.target, dep);
        Ok(())
    }

    /// Registers `source_target` as a dependency without attempting to
    /// build it. Use this for pure source/leaf files.
    pub fn add_source(&mut self, source_target: impl Into<Target>) {
        self.system.register_dependency(&self.target, source_target.into());
    }

    /// The target currently being rebuilt.
    pub fn target(&self) -> &str {
        &self.target
    }
}
