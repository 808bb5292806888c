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

use proptest::prelude::*;

use crate::stamp::stamps_match;

proptest! {
    #[test]
    fn empty_never_matches_anything(s in ".*") {
        prop_assert!(!stamps_match("", &s));
        prop_assert!(!stamps_match(&s, ""));
    }

    #[test]
    fn reflexive_for_nonempty(s in "[^\\x00]+") {
        prop_assert!(stamps_match(&s, &s));
    }

    #[test]
    fn symmetric(a in ".*", b in ".*") {
        prop_assert_eq!(stamps_match(&a, &b), stamps_match(&b, &a));
    }

    #[test]
    fn distinct_nonempty_strings_never_match(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        prop_assume!(a != b);
        prop_assert!(!stamps_match(&a, &b));
    }
}
