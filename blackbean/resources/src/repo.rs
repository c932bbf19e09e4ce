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

//! Snapshot repository commands.
use clap::{ArgMatches, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::response::Response;
use elasticsearch::snapshot::{
    SnapshotCreateRepositoryParts, SnapshotDeleteRepositoryParts, SnapshotGetParts,
};
use serde_json::{Value, json};

use crate::completion;
use crate::error::BeanError;
use crate::{Context, Executor, as_strs, run};

#[derive(Parser, Debug)]
pub struct GetRepo {
    #[arg(help = "Repository name", add = ArgValueCandidates::new(completion::repositories))]
    repository: String,
    #[arg(
        short,
        long = "snapshot",
        value_delimiter = ',',
        default_value = "_all",
        help = "Snapshots to list, comma separated",
        add = ArgValueCandidates::new(completion::snapshots)
    )]
    snapshots: Vec<String>,
}

impl GetRepo {
    pub fn new_command() -> Command {
        Self::command()
            .name("get")
            .about("List the snapshots stored in a repository")
    }
}

#[async_trait::async_trait]
impl Executor for GetRepo {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let snapshots = as_strs(&self.snapshots);
        Ok(ctx
            .client
            .snapshot()
            .get(SnapshotGetParts::RepositorySnapshot(&self.repository, &snapshots))
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct CreateRepo {
    #[arg(help = "Repository name")]
    repository: String,
    #[arg(short = 'e', long = "type", help = "Repository type, such as azure or s3")]
    kind: String,
    #[arg(short, long, help = "Container or bucket holding the snapshots")]
    container: String,
    #[arg(short, long, help = "Base path inside the container")]
    path: String,
}

impl CreateRepo {
    pub fn new_command() -> Command {
        Self::command()
            .name("create")
            .about("Register a snapshot repository")
    }

    fn body(&self) -> Value {
        json!({
            "type": self.kind,
            "settings": {
                "container": self.container,
                "base_path": self.path,
                "chunk_size": "32m",
                "compress": true,
                "max_snapshot_bytes_per_sec": "50mb",
                "max_restore_bytes_per_sec": "50mb"
            }
        })
    }
}

#[async_trait::async_trait]
impl Executor for CreateRepo {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .snapshot()
            .create_repository(SnapshotCreateRepositoryParts::Repository(&self.repository))
            .body(self.body())
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct DeleteRepo {
    #[arg(
        required = true,
        value_delimiter = ',',
        help = "Repositories to remove, comma separated",
        add = ArgValueCandidates::new(completion::repositories)
    )]
    repositories: Vec<String>,
}

impl DeleteRepo {
    pub fn new_command() -> Command {
        Self::command()
            .name("delete")
            .about("Unregister snapshot repositories")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteRepo {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let repositories = as_strs(&self.repositories);
        Ok(ctx
            .client
            .snapshot()
            .delete_repository(SnapshotDeleteRepositoryParts::Repository(&repositories))
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("repo")
        .about("Snapshot repository operations")
        .subcommand_required(true)
        .subcommands([
            GetRepo::new_command(),
            CreateRepo::new_command(),
            DeleteRepo::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("get", m)) => run::<GetRepo>(m, ctx).await,
        Some(("create", m)) => run::<CreateRepo>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteRepo>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("repo")),
    }
}
