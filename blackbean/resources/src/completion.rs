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

//! Candidate providers for dynamic shell completion.
//!
//! Providers run while the shell asks for completions, before any flag is
//! parsed, so the config file and cluster come from `BLACKBEAN_CONFIG` and
//! `BLACKBEAN_CLUSTER` only. A provider never fails: a missing config, an
//! unreachable cluster or an unexpected response all yield no candidates.
use std::future::Future;
use std::path::PathBuf;

use clap_complete::engine::CompletionCandidate;
use elasticsearch::Elasticsearch;
use elasticsearch::indices::{IndicesGetAliasParts, IndicesGetParts, IndicesGetTemplateParts};
use elasticsearch::nodes::NodesInfoParts;
use elasticsearch::security::{SecurityGetRoleParts, SecurityGetUserParts};
use elasticsearch::snapshot::{SnapshotGetParts, SnapshotGetRepositoryParts};
use serde_json::Value;

use crate::client::build_client;
use crate::config::ConfigFile;
use crate::error::BeanError;

pub const CONFIG_ENV: &str = "BLACKBEAN_CONFIG";
pub const CLUSTER_ENV: &str = "BLACKBEAN_CLUSTER";

fn config_file() -> Result<ConfigFile, BeanError> {
    let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    Ok(ConfigFile::load(path.as_deref())?)
}

fn candidates(values: Vec<String>) -> Vec<CompletionCandidate> {
    values.into_iter().map(CompletionCandidate::new).collect()
}

/// Cluster names from the config file.
pub fn clusters() -> Vec<CompletionCandidate> {
    config_file()
        .map(|file| candidates(file.cluster_names("")))
        .unwrap_or_default()
}

fn fetch<F, Fut>(request: F) -> Vec<CompletionCandidate>
where
    F: FnOnce(Elasticsearch) -> Fut,
    Fut: Future<Output = Result<Vec<String>, BeanError>>,
{
    let result = config_file()
        .and_then(|file| {
            let cluster = std::env::var(CLUSTER_ENV).ok();
            Ok(file.profile(cluster.as_deref())?)
        })
        .and_then(|profile| build_client(&profile, None))
        .and_then(|client| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(request(client))
        });

    match result {
        Ok(values) => candidates(values),
        Err(err) => {
            tracing::debug!("no completion candidates: {err}");
            Vec::new()
        }
    }
}

async fn get_json(res: elasticsearch::http::response::Response) -> Result<Value, BeanError> {
    Ok(res.error_for_status_code()?.json::<Value>().await?)
}

fn keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

pub fn indices() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .indices()
            .get(IndicesGetParts::Index(&["_all"]))
            .send()
            .await?;
        Ok::<_, BeanError>(keys(&get_json(res).await?))
    })
}

pub fn aliases() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .indices()
            .get_alias(IndicesGetAliasParts::None)
            .send()
            .await?;
        Ok::<_, BeanError>(alias_names(&get_json(res).await?))
    })
}

/// Indices followed by aliases, for commands that take either.
pub fn indices_and_aliases() -> Vec<CompletionCandidate> {
    let mut all = indices();
    all.extend(aliases());
    all
}

fn alias_names(value: &Value) -> Vec<String> {
    let mut names: Vec<String> = value
        .as_object()
        .into_iter()
        .flat_map(|indices| indices.values())
        .flat_map(|index| keys(&index["aliases"]))
        .collect();
    names.sort();
    names.dedup();
    names
}

pub fn repositories() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .snapshot()
            .get_repository(SnapshotGetRepositoryParts::None)
            .send()
            .await?;
        Ok::<_, BeanError>(keys(&get_json(res).await?))
    })
}

pub fn snapshots() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .snapshot()
            .get(SnapshotGetParts::RepositorySnapshot("_all", &["_all"]))
            .send()
            .await?;
        Ok::<_, BeanError>(snapshot_names(&get_json(res).await?))
    })
}

fn snapshot_names(value: &Value) -> Vec<String> {
    value["snapshots"]
        .as_array()
        .map(|snapshots| {
            snapshots
                .iter()
                .filter_map(|s| s["snapshot"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn roles() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .security()
            .get_role(SecurityGetRoleParts::None)
            .send()
            .await?;
        Ok::<_, BeanError>(keys(&get_json(res).await?))
    })
}

pub fn users() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .security()
            .get_user(SecurityGetUserParts::None)
            .send()
            .await?;
        Ok::<_, BeanError>(keys(&get_json(res).await?))
    })
}

pub fn templates() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client
            .indices()
            .get_template(IndicesGetTemplateParts::None)
            .send()
            .await?;
        Ok::<_, BeanError>(keys(&get_json(res).await?))
    })
}

pub fn nodes() -> Vec<CompletionCandidate> {
    fetch(|client| async move {
        let res = client.nodes().info(NodesInfoParts::None).send().await?;
        Ok::<_, BeanError>(node_names(&get_json(res).await?))
    })
}

fn node_names(value: &Value) -> Vec<String> {
    value["nodes"]
        .as_object()
        .map(|nodes| {
            nodes
                .values()
                .filter_map(|node| node["name"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn builtin_privileges(kind: &'static str) -> Vec<CompletionCandidate> {
    fetch(move |client| async move {
        let res = client.security().get_builtin_privileges().send().await?;
        Ok::<_, BeanError>(crate::merge::strings(get_json(res).await?.get(kind)))
    })
}

pub fn cluster_privileges() -> Vec<CompletionCandidate> {
    builtin_privileges("cluster")
}

pub fn index_privileges() -> Vec<CompletionCandidate> {
    builtin_privileges("index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_names() {
        let value = json!({
            "logs-1": {"aliases": {"logs": {}, "current": {}}},
            "logs-2": {"aliases": {"logs": {}}},
            "metrics": {"aliases": {}}
        });
        assert_eq!(alias_names(&value), vec!["current", "logs"]);
    }

    #[test]
    fn test_snapshot_and_node_names() {
        let snapshots = json!({"snapshots": [{"snapshot": "daily-1"}, {"snapshot": "daily-2"}]});
        assert_eq!(snapshot_names(&snapshots), vec!["daily-1", "daily-2"]);
        assert!(snapshot_names(&json!({})).is_empty());

        let nodes = json!({"nodes": {"abc": {"name": "es-data-0"}}});
        assert_eq!(node_names(&nodes), vec!["es-data-0"]);
    }

    #[test]
    fn test_keys_of_non_object() {
        assert!(keys(&json!([1, 2])).is_empty());
    }
}
