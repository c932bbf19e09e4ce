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

//! Index level commands: CRUD, search, reindex and bulk style requests.
use clap::{ArgMatches, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::response::Response;
use elasticsearch::indices::{IndicesCreateParts, IndicesDeleteParts, IndicesGetParts};
use elasticsearch::{BulkParts, IndexParts, MsearchParts, SearchParts};
use serde_json::{Value, json};

use crate::body::RawBody;
use crate::completion;
use crate::error::BeanError;
use crate::{Context, Executor, as_strs, run};

const NO_RAW_BODY: &str = "one of --data and --filename should be specified";

#[derive(Parser, Debug)]
pub struct GetIndex {
    #[arg(
        required = true,
        value_delimiter = ',',
        help = "Indices to get, comma separated",
        add = ArgValueCandidates::new(completion::indices)
    )]
    indices: Vec<String>,
}

impl GetIndex {
    pub fn new_command() -> Command {
        Self::command().name("get").about("Get indices from the cluster")
    }
}

#[async_trait::async_trait]
impl Executor for GetIndex {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let indices = as_strs(&self.indices);
        Ok(ctx
            .client
            .indices()
            .get(IndicesGetParts::Index(&indices))
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct SearchIndex {
    #[arg(help = "Index to search", add = ArgValueCandidates::new(completion::indices))]
    index: String,
    #[command(flatten)]
    body: RawBody,
}

impl SearchIndex {
    pub fn new_command() -> Command {
        Self::command()
            .name("search")
            .about("Search an index, with a match_all query unless a body is given")
    }
}

#[async_trait::async_trait]
impl Executor for SearchIndex {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let body = self
            .body
            .json()
            .await?
            .unwrap_or_else(|| json!({"query": {"match_all": {}}}));
        Ok(ctx
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(body)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct CreateIndex {
    #[arg(help = "Name of the index to create")]
    index: String,
    #[command(flatten)]
    body: RawBody,
}

impl CreateIndex {
    pub fn new_command() -> Command {
        Self::command()
            .name("create")
            .about("Create an index, with settings and mappings from the body if given")
    }
}

#[async_trait::async_trait]
impl Executor for CreateIndex {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let indices = ctx.client.indices();
        let create = indices
            .create(IndicesCreateParts::Index(&self.index))
            .pretty(true);
        let res = match self.body.json().await? {
            Some(body) => create.body(body).send().await?,
            None => create.send().await?,
        };
        Ok(res)
    }
}

#[derive(Parser, Debug)]
pub struct DeleteIndex {
    #[arg(
        required = true,
        value_delimiter = ',',
        help = "Indices to delete, comma separated",
        add = ArgValueCandidates::new(completion::indices)
    )]
    indices: Vec<String>,
}

impl DeleteIndex {
    pub fn new_command() -> Command {
        Self::command()
            .name("delete")
            .about("Delete indices, ignoring the ones that do not exist")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteIndex {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let indices = as_strs(&self.indices);
        Ok(ctx
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&indices))
            .ignore_unavailable(true)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct Reindex {
    #[arg(help = "Source index", add = ArgValueCandidates::new(completion::indices))]
    source: String,
    #[arg(help = "Destination index", add = ArgValueCandidates::new(completion::indices))]
    dest: String,
    #[command(flatten)]
    body: RawBody,
}

impl Reindex {
    pub fn new_command() -> Command {
        Self::command()
            .name("reindex")
            .about("Copy documents from one index to another, in the background")
    }

    fn default_body(&self) -> Value {
        json!({
            "source": {"index": self.source},
            "dest": {"index": self.dest}
        })
    }
}

#[async_trait::async_trait]
impl Executor for Reindex {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let body = match self.body.json().await? {
            Some(body) => body,
            None => self.default_body(),
        };
        Ok(ctx
            .client
            .reindex()
            .body(body)
            .wait_for_completion(false)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct WriteIndex {
    #[arg(help = "Index to write to", add = ArgValueCandidates::new(completion::indices))]
    index: String,
    #[command(flatten)]
    body: RawBody,
}

impl WriteIndex {
    pub fn new_command() -> Command {
        Self::command()
            .name("write")
            .about("Index a single document read from the body")
    }
}

#[async_trait::async_trait]
impl Executor for WriteIndex {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let Some(document) = self.body.json().await? else {
            return Err(BeanError::command(NO_RAW_BODY));
        };
        Ok(ctx
            .client
            .index(IndexParts::Index(&self.index))
            .body(document)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct Bulk {
    #[arg(
        help = "Default index for actions without one",
        add = ArgValueCandidates::new(completion::indices)
    )]
    index: Option<String>,
    #[arg(long, help = "ID of the pipeline used to preprocess incoming documents")]
    pipeline: Option<String>,
    #[arg(long, help = "Reject actions that do not target an index alias")]
    require_alias: bool,
    #[command(flatten)]
    body: RawBody,
}

impl Bulk {
    pub fn new_command() -> Command {
        Self::command()
            .name("bulk")
            .about("Send an NDJSON bulk request")
    }
}

#[async_trait::async_trait]
impl Executor for Bulk {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let Some(lines) = self.body.lines().await? else {
            return Err(BeanError::command(NO_RAW_BODY));
        };
        tracing::debug!(lines = lines.len(), "sending bulk request");

        let parts = match &self.index {
            Some(index) => BulkParts::Index(index),
            None => BulkParts::None,
        };
        let mut bulk = ctx.client.bulk(parts).body(lines).pretty(true);
        if let Some(pipeline) = &self.pipeline {
            bulk = bulk.pipeline(pipeline);
        }
        if self.require_alias {
            bulk = bulk.require_alias(true);
        }
        Ok(bulk.send().await?)
    }
}

#[derive(Parser, Debug)]
pub struct Msearch {
    #[arg(
        help = "Default index for searches without one",
        add = ArgValueCandidates::new(completion::indices)
    )]
    index: Option<String>,
    #[arg(long, help = "Maximum number of searches run concurrently")]
    max_concurrent_searches: Option<i64>,
    #[arg(long, help = "Maximum number of concurrent shard requests per search")]
    max_concurrent_shard_requests: Option<i64>,
    #[command(flatten)]
    body: RawBody,
}

impl Msearch {
    pub fn new_command() -> Command {
        Self::command()
            .name("msearch")
            .about("Send an NDJSON multi search request")
    }
}

#[async_trait::async_trait]
impl Executor for Msearch {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let Some(lines) = self.body.lines().await? else {
            return Err(BeanError::command(NO_RAW_BODY));
        };

        let index;
        let parts = match &self.index {
            Some(name) => {
                index = [name.as_str()];
                MsearchParts::Index(&index)
            }
            None => MsearchParts::None,
        };
        let mut msearch = ctx.client.msearch(parts).body(lines).pretty(true);
        if let Some(max) = self.max_concurrent_searches {
            msearch = msearch.max_concurrent_searches(max);
        }
        if let Some(max) = self.max_concurrent_shard_requests {
            msearch = msearch.max_concurrent_shard_requests(max);
        }
        Ok(msearch.send().await?)
    }
}

pub fn command() -> Command {
    Command::new("index")
        .about("Index operations")
        .subcommand_required(true)
        .subcommands([
            GetIndex::new_command(),
            SearchIndex::new_command(),
            CreateIndex::new_command(),
            DeleteIndex::new_command(),
            Reindex::new_command(),
            WriteIndex::new_command(),
            Bulk::new_command(),
            Msearch::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("get", m)) => run::<GetIndex>(m, ctx).await,
        Some(("search", m)) => run::<SearchIndex>(m, ctx).await,
        Some(("create", m)) => run::<CreateIndex>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteIndex>(m, ctx).await,
        Some(("reindex", m)) => run::<Reindex>(m, ctx).await,
        Some(("write", m)) => run::<WriteIndex>(m, ctx).await,
        Some(("bulk", m)) => run::<Bulk>(m, ctx).await,
        Some(("msearch", m)) => run::<Msearch>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("index")),
    }
}
