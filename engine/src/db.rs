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

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use indexmap::IndexMap;
use redo_metrics::scoped_metric;
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::DbError,
    stamp::{Stamp, Target},
};

/// Persistent mapping of target -> stamp, plus target -> (dependency ->
/// stamp-at-registration-time). See `spec.md` §3/§4.1 for the full contract.
///
/// `targets` is a `BTreeMap` so the saved document has a stable, readable
/// ordering; `dependencies` preserves each target's own insertion order via
/// `IndexMap`, which is part of the observable contract (rebuild order is
/// deterministic across save/load).
#[derive(Debug, Default, Serialize)]
pub struct BuildDb {
    targets: BTreeMap<Target, Stamp>,
    dependencies: IndexMap<Target, IndexMap<Target, Stamp>>,
}

impl BuildDb {
    /// Loads the database at `path`. Never fails: a missing, unreadable,
    /// malformed, or non-map document all degrade to an empty database.
    /// Unrecognized top-level keys are ignored; a `targets` or
    /// `dependencies` value of the wrong shape is treated as absent.
    pub fn load(path: &Path) -> Self {
        scoped_metric!("build_db_load");
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        let Ok(Value::Object(root)) = serde_json::from_str::<Value>(&contents) else {
            return Self::default();
        };

        let targets = root
            .get("targets")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_owned())))
                    .collect()
            })
            .unwrap_or_default();

        let dependencies = root
            .get("dependencies")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(target, deps)| {
                        let inner = deps.as_object()?;
                        let inner: IndexMap<Target, Stamp> = inner
                            .iter()
                            .filter_map(|(dep, stamp)| {
                                stamp.as_str().map(|s| (dep.clone(), s.to_owned()))
                            })
                            .collect();
                        Some((target.clone(), inner))
                    })
                    .collect()
            })
            .unwrap_or_default();

        BuildDb {
            targets,
            dependencies,
        }
    }

    /// Writes the database to `path` as a single indented JSON document.
    /// The write is total: a temp file in the same directory is written and
    /// fsynced first, then renamed into place, so a crash never leaves a
    /// partially-written `path` behind.
    pub fn save(&self, path: &Path) -> Result<(), DbError> {
        scoped_metric!("build_db_save");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| DbError::Io {
                    path: path.to_owned(),
                    source,
                })?;
            }
        }

        let tmp_path = tmp_path_for(path);
        let file = File::create(&tmp_path).map_err(|source| DbError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n").map_err(|source| DbError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        writer.flush().map_err(|source| DbError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        writer.get_ref().sync_all().map_err(|source| DbError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|source| DbError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(())
    }

    pub fn target_stamp(&self, target: &str) -> Option<&Stamp> {
        self.targets.get(target)
    }

    pub fn set_target_stamp(&mut self, target: Target, stamp: Stamp) {
        self.targets.insert(target, stamp);
    }

    /// Whether `target` has ever been recorded as the output of a rebuild.
    /// Dependencies not present here are leaf sources (§4.4.4).
    pub fn is_known_target(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }

    /// The dependencies recorded for `target` at its last rebuild, in
    /// registration order. A target with no recorded rebuild (or one that
    /// registered no dependencies) yields an empty iterator, mirroring the
    /// Python original's `defaultdict(dict)` default.
    pub fn dependencies_of(&self, target: &str) -> impl Iterator<Item = (&Target, &Stamp)> {
        static EMPTY: OnceLock<IndexMap<Target, Stamp>> = OnceLock::new();
        self.dependencies
            .get(target)
            .unwrap_or_else(|| EMPTY.get_or_init(IndexMap::new))
            .iter()
    }

    /// Erases any prior dependency record for `target`. Called at the start
    /// of every rebuild: dependency sets are the transcript of the *current*
    /// build, not an accumulated set (§3 invariant, §4.4.3 step 2).
    pub fn clear_dependencies(&mut self, target: &str) {
        self.dependencies.swap_remove(target);
    }

    /// Records (or overwrites) the stamp `dep` had under `target` at the
    /// moment it was registered.
    pub fn record_dependency(&mut self, target: Target, dep: Target, stamp: Stamp) {
        self.dependencies.entry(target).or_default().insert(dep, stamp);
    }
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
