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

use std::path::PathBuf;
use thiserror::Error;

/// Errors from persisting a [`crate::BuildDb`]. Loading never fails (see
/// `BuildDb::load`); only saving can.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to write build database to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize build database: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from `BuildSystem::build`/`rebuild`.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Db(#[from] DbError),
    /// A handler's `rebuild_impl` failed, including the fallback null
    /// handler's "cannot build" error for targets no installed handler
    /// recognizes.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}
