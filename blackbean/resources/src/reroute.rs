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

//! Manual shard allocation through `_cluster/reroute`.
//!
//! `move`, `cancel` and `allocate-replica` build a single reroute command
//! from their flags. A raw body replaces that command entirely, so the flags
//! are only required when no body is given.
use clap::{ArgMatches, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::response::Response;
use serde_json::{Value, json};

use crate::body::RawBody;
use crate::completion;
use crate::error::BeanError;
use crate::{Context, Executor, run};

fn required<'a, T>(value: &'a Option<T>, flag: &str) -> Result<&'a T, BeanError> {
    value
        .as_ref()
        .ok_or_else(|| BeanError::command(format!("--{flag} is required without a request body")))
}

async fn reroute(ctx: &Context, body: Value) -> Result<Response, BeanError> {
    tracing::debug!(%body, "sending reroute commands");
    Ok(ctx
        .client
        .cluster()
        .reroute()
        .body(body)
        .pretty(true)
        .send()
        .await?)
}

#[derive(Parser, Debug)]
pub struct Move {
    #[arg(help = "Index of the shard to move", add = ArgValueCandidates::new(completion::indices))]
    index: String,
    #[arg(long, help = "Shard number")]
    shard: Option<u32>,
    #[arg(
        long,
        help = "Node the shard currently lives on",
        add = ArgValueCandidates::new(completion::nodes)
    )]
    from_node: Option<String>,
    #[arg(
        long,
        help = "Node to move the shard to",
        add = ArgValueCandidates::new(completion::nodes)
    )]
    to_node: Option<String>,
    #[command(flatten)]
    body: RawBody,
}

impl Move {
    pub fn new_command() -> Command {
        Self::command()
            .name("move")
            .about("Move a started shard from one node to another")
    }

    fn commands(&self) -> Result<Value, BeanError> {
        Ok(json!({
            "commands": [{
                "move": {
                    "index": self.index,
                    "shard": required(&self.shard, "shard")?,
                    "from_node": required(&self.from_node, "from-node")?,
                    "to_node": required(&self.to_node, "to-node")?
                }
            }]
        }))
    }
}

#[async_trait::async_trait]
impl Executor for Move {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let body = match self.body.json().await? {
            Some(raw) => raw,
            None => self.commands()?,
        };
        reroute(ctx, body).await
    }
}

/// Shared flags of the single-node reroute commands.
#[derive(Parser, Debug)]
pub struct NodeCommand {
    #[arg(help = "Index of the shard", add = ArgValueCandidates::new(completion::indices))]
    index: String,
    #[arg(long, help = "Shard number")]
    shard: Option<u32>,
    #[arg(long, help = "Node name", add = ArgValueCandidates::new(completion::nodes))]
    node: Option<String>,
    #[command(flatten)]
    body: RawBody,
}

impl NodeCommand {
    fn commands(&self, action: &str) -> Result<Value, BeanError> {
        Ok(json!({
            "commands": [{
                action: {
                    "index": self.index,
                    "shard": required(&self.shard, "shard")?,
                    "node": required(&self.node, "node")?
                }
            }]
        }))
    }

    async fn send(&self, ctx: &Context, action: &str) -> Result<Response, BeanError> {
        let body = match self.body.json().await? {
            Some(raw) => raw,
            None => self.commands(action)?,
        };
        reroute(ctx, body).await
    }
}

#[derive(Parser, Debug)]
pub struct Cancel {
    #[command(flatten)]
    target: NodeCommand,
}

impl Cancel {
    pub fn new_command() -> Command {
        Self::command()
            .name("cancel")
            .about("Cancel the allocation or recovery of a shard")
    }
}

#[async_trait::async_trait]
impl Executor for Cancel {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        self.target.send(ctx, "cancel").await
    }
}

#[derive(Parser, Debug)]
pub struct AllocateReplica {
    #[command(flatten)]
    target: NodeCommand,
}

impl AllocateReplica {
    pub fn new_command() -> Command {
        Self::command()
            .name("allocate-replica")
            .about("Allocate an unassigned replica shard to a node")
    }
}

#[async_trait::async_trait]
impl Executor for AllocateReplica {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        self.target.send(ctx, "allocate_replica").await
    }
}

#[derive(Parser, Debug)]
pub struct Failed {}

impl Failed {
    pub fn new_command() -> Command {
        Self::command()
            .name("failed")
            .about("Retry the allocation of shards that failed too many times")
    }
}

#[async_trait::async_trait]
impl Executor for Failed {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .cluster()
            .reroute()
            .retry_failed(true)
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("reroute")
        .about("Shard allocation commands")
        .subcommand_required(true)
        .subcommands([
            Move::new_command(),
            Cancel::new_command(),
            AllocateReplica::new_command(),
            Failed::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("move", m)) => run::<Move>(m, ctx).await,
        Some(("cancel", m)) => run::<Cancel>(m, ctx).await,
        Some(("allocate-replica", m)) => run::<AllocateReplica>(m, ctx).await,
        Some(("failed", m)) => run::<Failed>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("reroute")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_move_template() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("POST"))
            .and(path("/_cluster/reroute"))
            .and(body_json(json!({"commands": [{"move": {
                "index": "logs", "shard": 0, "from_node": "es-0", "to_node": "es-1"
            }}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        Move::try_parse_from(["move", "logs", "--shard", "0", "--from-node", "es-0", "--to-node", "es-1"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_move_without_flags_or_body_fails() {
        let (server, ctx) = testing::context().await;
        let cmd = Move::try_parse_from(["move", "logs", "--shard", "0"]).unwrap();
        let err = cmd.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("--from-node"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_raw_body_replaces_flags() {
        let (server, ctx) = testing::context().await;
        let raw = json!({"commands": [{"allocate_stale_primary": {
            "index": "logs", "shard": 1, "node": "es-2", "accept_data_loss": true
        }}]});
        Mock::given(method("POST"))
            .and(path("/_cluster/reroute"))
            .and(body_json(raw.clone()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Cancel::try_parse_from(["cancel", "ignored", "-d", &raw.to_string()])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_allocate_replica_template() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("POST"))
            .and(path("/_cluster/reroute"))
            .and(body_json(json!({"commands": [{"allocate_replica": {
                "index": "logs", "shard": 2, "node": "es-3"
            }}]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        AllocateReplica::try_parse_from(["allocate-replica", "logs", "--shard", "2", "--node", "es-3"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_retry_failed() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("POST"))
            .and(path("/_cluster/reroute"))
            .and(query_param("retry_failed", "true"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Failed {}.execute(&ctx).await.unwrap();
    }
}
