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

//! Persistent cluster settings and the `apply` namespace.
//!
//! [`SettingsPatch`] mirrors the part of the `_cluster/settings` document
//! this tool knows how to change. Every branch is optional and only created
//! when a setter has something to put in it, so the serialized patch only
//! touches the settings the user asked for.
use clap::{ArgMatches, Command, CommandFactory, Parser, builder::PossibleValuesParser};
use elasticsearch::http::response::Response;
use elasticsearch::indices::{IndicesClearCacheParts, IndicesFlushParts};
use serde::Serialize;
use serde_json::Value;

use crate::body::RawBody;
use crate::error::BeanError;
use crate::{Context, Executor, run};

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct SettingsPatch {
    pub persistent: Persistent,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Persistent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Cluster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<Indices>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Cluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_shards_per_node: Option<String>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Routing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<Allocation>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Allocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_concurrent_rebalance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_concurrent_recoveries: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_initial_primaries_recoveries: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<Disk>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Disk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Watermark {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Script {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_compilations_rate: Option<String>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Indices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaker: Option<Breaker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Breaker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fielddata: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Limit>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Limit {
    pub limit: String,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Recovery {
    pub max_bytes_per_sec: String,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn cluster_mut(&mut self) -> &mut Cluster {
        self.persistent.cluster.get_or_insert_with(Default::default)
    }

    fn allocation_mut(&mut self) -> &mut Allocation {
        self.cluster_mut()
            .routing
            .get_or_insert_with(Default::default)
            .allocation
            .get_or_insert_with(Default::default)
    }

    fn breaker_mut(&mut self) -> &mut Breaker {
        self.persistent
            .indices
            .get_or_insert_with(Default::default)
            .breaker
            .get_or_insert_with(Default::default)
    }

    /// Sets the four shard allocation leaves.
    ///
    /// Empty values clear their leaf unless all four are empty, in which
    /// case nothing changes. The disk watermark branch is left alone.
    pub fn with_allocation(
        &mut self,
        cluster_concurrent_rebalance: &str,
        node_concurrent_recoveries: &str,
        node_initial_primaries_recoveries: &str,
        enable: &str,
    ) -> &mut Self {
        let values = [
            cluster_concurrent_rebalance,
            node_concurrent_recoveries,
            node_initial_primaries_recoveries,
            enable,
        ];
        if values.iter().all(|v| v.is_empty()) {
            return self;
        }

        let allocation = self.allocation_mut();
        allocation.cluster_concurrent_rebalance = non_empty(cluster_concurrent_rebalance);
        allocation.node_concurrent_recoveries = non_empty(node_concurrent_recoveries);
        allocation.node_initial_primaries_recoveries = non_empty(node_initial_primaries_recoveries);
        allocation.enable = non_empty(enable);
        self
    }

    pub fn with_watermark(&mut self, high: &str, low: &str) -> &mut Self {
        if high.is_empty() && low.is_empty() {
            return self;
        }

        self.allocation_mut().disk = Some(Disk {
            watermark: Some(Watermark {
                high: non_empty(high),
                low: non_empty(low),
            }),
        });
        self
    }

    pub fn with_breaker_fielddata(&mut self, limit: &str) -> &mut Self {
        if let Some(limit) = non_empty(limit) {
            self.breaker_mut().fielddata = Some(Limit { limit });
        }
        self
    }

    pub fn with_breaker_request(&mut self, limit: &str) -> &mut Self {
        if let Some(limit) = non_empty(limit) {
            self.breaker_mut().request = Some(Limit { limit });
        }
        self
    }

    pub fn with_breaker_total(&mut self, limit: &str) -> &mut Self {
        if let Some(limit) = non_empty(limit) {
            self.breaker_mut().total = Some(Limit { limit });
        }
        self
    }

    pub fn with_recovery(&mut self, max_bytes_per_sec: &str) -> &mut Self {
        if let Some(max_bytes_per_sec) = non_empty(max_bytes_per_sec) {
            self.persistent
                .indices
                .get_or_insert_with(Default::default)
                .recovery = Some(Recovery { max_bytes_per_sec });
        }
        self
    }

    pub fn with_max_shards_per_node(&mut self, max_shards_per_node: &str) -> &mut Self {
        if let Some(max_shards_per_node) = non_empty(max_shards_per_node) {
            self.cluster_mut().max_shards_per_node = Some(max_shards_per_node);
        }
        self
    }

    pub fn with_max_compilations_rate(&mut self, rate: &str) -> &mut Self {
        if let Some(rate) = non_empty(rate) {
            self.persistent.script = Some(Script {
                max_compilations_rate: Some(rate),
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.persistent == Persistent::default()
    }
}

#[derive(Parser, Debug)]
pub struct ApplySettings {
    #[arg(
        short = 'a',
        long,
        default_value = "",
        hide_default_value = true,
        help = "cluster.routing.allocation.cluster_concurrent_rebalance, such as 10"
    )]
    cluster_concurrent_rebalance: String,
    #[arg(
        short = 'n',
        long,
        default_value = "",
        hide_default_value = true,
        help = "cluster.routing.allocation.node_concurrent_recoveries, such as 10"
    )]
    node_concurrent_recoveries: String,
    #[arg(
        short = 'i',
        long,
        default_value = "",
        hide_default_value = true,
        help = "cluster.routing.allocation.node_initial_primaries_recoveries, such as 10"
    )]
    node_initial_primaries_recoveries: String,
    #[arg(
        short = 'e',
        long,
        default_value = "",
        hide_default_value = true,
        value_parser = PossibleValuesParser::new(["", "all", "primaries", "new_primaries", "none"]),
        help = "cluster.routing.allocation.enable"
    )]
    allocation_enable: String,
    #[arg(
        short = 'k',
        long,
        default_value = "",
        hide_default_value = true,
        help = "indices.breaker.fielddata.limit, such as 60%"
    )]
    breaker_fielddata: String,
    #[arg(
        short = 'r',
        long,
        default_value = "",
        hide_default_value = true,
        help = "indices.breaker.request.limit, such as 60%"
    )]
    breaker_request: String,
    #[arg(
        short = 't',
        long,
        default_value = "",
        hide_default_value = true,
        help = "indices.breaker.total.limit, such as 70%"
    )]
    breaker_total: String,
    #[arg(
        short = 'w',
        long,
        default_value = "",
        hide_default_value = true,
        help = "cluster.routing.allocation.disk.watermark.high, such as 90%"
    )]
    watermark_high: String,
    #[arg(
        short = 'l',
        long,
        default_value = "",
        hide_default_value = true,
        help = "cluster.routing.allocation.disk.watermark.low, such as 85%"
    )]
    watermark_low: String,
    #[arg(
        short = 'm',
        long,
        default_value = "",
        hide_default_value = true,
        help = "script.max_compilations_rate, such as 75/5m"
    )]
    max_compilations_rate: String,
    #[arg(
        short = 's',
        long,
        default_value = "",
        hide_default_value = true,
        help = "cluster.max_shards_per_node, such as 1000"
    )]
    max_shards_per_node: String,
    #[arg(
        short = 'b',
        long,
        default_value = "",
        hide_default_value = true,
        help = "indices.recovery.max_bytes_per_sec, such as 40mb"
    )]
    max_bytes_per_sec: String,
    #[command(flatten)]
    body: RawBody,
}

impl ApplySettings {
    pub fn new_command() -> Command {
        Self::command()
            .name("settings")
            .about("Apply persistent cluster settings")
    }

    pub fn patch(&self) -> SettingsPatch {
        let mut patch = SettingsPatch::new();
        patch
            .with_allocation(
                &self.cluster_concurrent_rebalance,
                &self.node_concurrent_recoveries,
                &self.node_initial_primaries_recoveries,
                &self.allocation_enable,
            )
            .with_breaker_fielddata(&self.breaker_fielddata)
            .with_breaker_request(&self.breaker_request)
            .with_breaker_total(&self.breaker_total)
            .with_watermark(&self.watermark_high, &self.watermark_low)
            .with_recovery(&self.max_bytes_per_sec)
            .with_max_shards_per_node(&self.max_shards_per_node)
            .with_max_compilations_rate(&self.max_compilations_rate);
        patch
    }
}

#[async_trait::async_trait]
impl Executor for ApplySettings {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let body: Value = match self.body.json().await? {
            Some(raw) => raw,
            None => {
                let patch = self.patch();
                if patch.is_empty() {
                    return Err(BeanError::command(
                        "at least one flag should be specified to change cluster settings",
                    ));
                }
                serde_json::to_value(patch)?
            }
        };
        tracing::debug!(%body, "putting cluster settings");

        Ok(ctx
            .client
            .cluster()
            .put_settings()
            .body(body)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct Flush {}

impl Flush {
    pub fn new_command() -> Command {
        Self::command().name("flush").about("Flush all indices")
    }
}

#[async_trait::async_trait]
impl Executor for Flush {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .indices()
            .flush(IndicesFlushParts::None)
            .ignore_unavailable(true)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct ClearCache {}

impl ClearCache {
    pub fn new_command() -> Command {
        Self::command()
            .name("clear-cache")
            .about("Clear the caches of all indices")
    }
}

#[async_trait::async_trait]
impl Executor for ClearCache {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .indices()
            .clear_cache(IndicesClearCacheParts::None)
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("apply")
        .about("Apply cluster changes")
        .subcommand_required(true)
        .subcommands([
            ApplySettings::new_command(),
            Flush::new_command(),
            ClearCache::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("settings", m)) => run::<ApplySettings>(m, ctx).await,
        Some(("flush", m)) => run::<Flush>(m, ctx).await,
        Some(("clear-cache", m)) => run::<ClearCache>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("apply")),
    }
}
