// Licensed to Elasticsearch B.V. under one or more contributor
// license agreements. See the NOTICE file distributed with
// this work for additional information regarding copyright
// ownership. Elasticsearch B.V. licenses this file to you under
// the Apache License, Version 2.0 (the "License"); you may
// not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::hash::Hash;

use indexmap::IndexSet;
use serde_json::Value;

/// Union of `existing` and `new` with duplicates collapsed.
///
/// First-seen order is kept, so existing items come first.
pub fn merge_unique<T, I, J>(existing: I, new: J) -> Vec<T>
where
    T: Hash + Eq,
    I: IntoIterator<Item = T>,
    J: IntoIterator<Item = T>,
{
    existing
        .into_iter()
        .chain(new)
        .collect::<IndexSet<T>>()
        .into_iter()
        .collect()
}

/// Collects the string items of a JSON array, skipping anything else.
pub fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Splits a comma separated flag value, dropping empty items.
pub fn split_words(words: &str) -> Vec<String> {
    words
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_merge_collapses_duplicates() {
        let merged = merge_unique(["a", "b"], ["b", "c"]);
        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged.into_iter().collect::<HashSet<_>>(),
            HashSet::from(["a", "b", "c"])
        );
    }

    #[test]
    fn test_merge_with_empty_sides() {
        assert_eq!(merge_unique(Vec::<&str>::new(), ["x", "x"]), vec!["x"]);
        assert_eq!(merge_unique(["x"], Vec::<&str>::new()), vec!["x"]);
    }

    #[test]
    fn test_strings_ignores_non_strings() {
        let value = json!(["superuser", 1, null, "kibana_admin"]);
        assert_eq!(strings(Some(&value)), vec!["superuser", "kibana_admin"]);
        assert!(strings(None).is_empty());
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("api, kpi,,test"), vec!["api", "kpi", "test"]);
        assert!(split_words("").is_empty());
    }
}
