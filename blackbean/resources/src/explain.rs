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

use clap::{Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::response::Response;
use serde::Serialize;

use crate::completion;
use crate::error::BeanError;
use crate::{Context, Executor};

/// Explains why a shard is unassigned or where it is allocated.
///
/// Without an index the cluster picks the first unassigned shard it finds.
#[derive(Parser, Debug)]
pub struct Explain {
    #[arg(
        help = "Index of the shard to explain",
        add = ArgValueCandidates::new(completion::indices)
    )]
    index: Option<String>,
    #[arg(long, help = "Shard number, required with an index")]
    shard: Option<u32>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Explain the primary copy rather than a replica, required with an index"
    )]
    primary: Option<bool>,
    #[arg(
        long,
        help = "Only explain the copy on this node",
        add = ArgValueCandidates::new(completion::nodes)
    )]
    current_node: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
struct ExplainBody<'a> {
    index: &'a str,
    shard: u32,
    primary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_node: Option<&'a str>,
}

impl Explain {
    pub fn new_command() -> Command {
        Self::command()
            .name("explain")
            .about("Explain shard allocation decisions")
    }

    fn body(&self) -> Result<Option<ExplainBody<'_>>, BeanError> {
        let Some(index) = &self.index else {
            return Ok(None);
        };
        match (self.shard, self.primary) {
            (Some(shard), Some(primary)) => Ok(Some(ExplainBody {
                index,
                shard,
                primary,
                current_node: self.current_node.as_deref(),
            })),
            _ => Err(BeanError::command(
                "--shard and --primary are required when an index is given",
            )),
        }
    }
}

#[async_trait::async_trait]
impl Executor for Explain {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let cluster = ctx.client.cluster();
        let explain = cluster.allocation_explain().pretty(true);
        let res = match self.body()? {
            Some(body) => explain.body(body).send().await?,
            None => explain.send().await?,
        };
        Ok(res)
    }
}
