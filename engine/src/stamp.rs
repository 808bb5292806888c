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

/// An opaque target identifier. Equality is exact string equality.
pub type Target = String;

/// An opaque fingerprint. The empty string is reserved to mean "no stamp
/// available" and must never be treated as matching anything, including
/// another empty string.
pub type Stamp = String;

/// The default staleness predicate: both operands must be non-empty and
/// byte-equal. This is what makes a missing target (empty stamp) always
/// stale, even against another missing target.
///
/// Handlers may override `Handler::stamps_match`, but any override must
/// preserve this empty-sentinel rule.
pub fn stamps_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && a == b
}
