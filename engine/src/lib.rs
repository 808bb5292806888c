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

//! A small, self-stamping, dependency-tracking incremental build engine.
//!
//! Unlike a build system with a statically declared DAG, dependencies here
//! are *discovered* while a target rebuilds: a [`Handler::rebuild_impl`]
//! calls back into its [`Builder`] as it goes, and whatever it touches
//! becomes that target's recorded dependency set for next time. Staleness is
//! decided by comparing a `Handler`-defined stamp of each target and
//! dependency against what was recorded at the last successful rebuild, not
//! by walking a fixed graph.
//!
//! The typical caller assembles a [`BuildSystem`] with one handler per kind
//! of target it knows how to produce, falling back implicitly to whichever
//! handler accepts everything (usually a [`FileHandler`] last in the chain),
//! and calls [`BuildSystem::build`] on whatever it wants up to date.

mod db;
mod error;
mod file_handler;
mod handler;
mod stamp;
mod system;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod property_tests;

pub use db::BuildDb;
pub use error::{BuildError, DbError};
pub use file_handler::FileHandler;
pub use handler::{Builder, Handler, HandlerError, NullHandler};
pub use stamp::{stamps_match, Stamp, Target};
pub use system::BuildSystem;
