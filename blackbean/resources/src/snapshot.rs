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

use clap::{ArgMatches, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::response::Response;
use elasticsearch::snapshot::{
    SnapshotCreateParts, SnapshotDeleteParts, SnapshotGetParts, SnapshotRestoreParts,
};
use serde_json::{Value, json};

use crate::completion;
use crate::error::BeanError;
use crate::{Context, Executor, as_strs, run};

#[derive(Parser, Debug)]
pub struct CreateSnapshot {
    #[arg(help = "Snapshot name")]
    snapshot: String,
    #[arg(
        short,
        long,
        help = "Repository to store the snapshot in",
        add = ArgValueCandidates::new(completion::repositories)
    )]
    repo: String,
}

impl CreateSnapshot {
    pub fn new_command() -> Command {
        Self::command().name("create").about("Take a snapshot of the cluster")
    }
}

#[async_trait::async_trait]
impl Executor for CreateSnapshot {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .snapshot()
            .create(SnapshotCreateParts::RepositorySnapshot(&self.repo, &self.snapshot))
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct GetSnapshot {
    #[arg(
        required = true,
        value_delimiter = ',',
        help = "Snapshots to get, comma separated",
        add = ArgValueCandidates::new(completion::snapshots)
    )]
    snapshots: Vec<String>,
    #[arg(
        short,
        long,
        help = "Repository holding the snapshots",
        add = ArgValueCandidates::new(completion::repositories)
    )]
    repo: String,
}

impl GetSnapshot {
    pub fn new_command() -> Command {
        Self::command().name("get").about("Get snapshot details")
    }
}

#[async_trait::async_trait]
impl Executor for GetSnapshot {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let snapshots = as_strs(&self.snapshots);
        Ok(ctx
            .client
            .snapshot()
            .get(SnapshotGetParts::RepositorySnapshot(&self.repo, &snapshots))
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct DeleteSnapshot {
    #[arg(help = "Snapshot to delete", add = ArgValueCandidates::new(completion::snapshots))]
    snapshot: String,
    #[arg(
        short,
        long,
        help = "Repository holding the snapshot",
        add = ArgValueCandidates::new(completion::repositories)
    )]
    repo: String,
}

impl DeleteSnapshot {
    pub fn new_command() -> Command {
        Self::command().name("delete").about("Delete a snapshot")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteSnapshot {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .snapshot()
            .delete(SnapshotDeleteParts::RepositorySnapshot(&self.repo, &[self.snapshot.as_str()]))
            .pretty(true)
            .send()
            .await?)
    }
}

/// Restores indices from a snapshot under new names.
#[derive(Parser, Debug)]
pub struct RestoreSnapshot {
    #[arg(
        help = "Repository holding the snapshot",
        add = ArgValueCandidates::new(completion::repositories)
    )]
    repository: String,
    #[arg(
        short,
        long,
        help = "Snapshot to restore from",
        add = ArgValueCandidates::new(completion::snapshots)
    )]
    snapshot: String,
    #[arg(short, long, help = "Indices to restore, comma separated or a pattern")]
    index: String,
    #[arg(short = 'p', long, help = "Regular expression matched against the restored index names")]
    rename_pattern: String,
    #[arg(short = 'r', long, help = "Replacement for the matched names, such as restored_$1")]
    rename_replacement: String,
}

impl RestoreSnapshot {
    pub fn new_command() -> Command {
        Self::command()
            .name("restore")
            .about("Restore indices from a snapshot")
    }

    fn body(&self) -> Value {
        json!({
            "indices": self.index,
            "include_global_state": true,
            "rename_pattern": self.rename_pattern,
            "rename_replacement": self.rename_replacement,
            "include_aliases": false
        })
    }
}

#[async_trait::async_trait]
impl Executor for RestoreSnapshot {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .snapshot()
            .restore(SnapshotRestoreParts::RepositorySnapshot(&self.repository, &self.snapshot))
            .body(self.body())
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("snapshot")
        .about("Snapshot operations")
        .subcommand_required(true)
        .subcommands([
            CreateSnapshot::new_command(),
            GetSnapshot::new_command(),
            DeleteSnapshot::new_command(),
            RestoreSnapshot::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("create", m)) => run::<CreateSnapshot>(m, ctx).await,
        Some(("get", m)) => run::<GetSnapshot>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteSnapshot>(m, ctx).await,
        Some(("restore", m)) => run::<RestoreSnapshot>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("snapshot")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_create_in_repository() {
        let (server, ctx) = testing::context().await;
        Mock::given(path("/_snapshot/backup/nightly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
            .expect(1)
            .mount(&server)
            .await;

        CreateSnapshot::try_parse_from(["create", "nightly", "--repo", "backup"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[test]
    fn test_repo_is_required() {
        assert!(CreateSnapshot::try_parse_from(["create", "nightly"]).is_err());
        assert!(GetSnapshot::try_parse_from(["get", "nightly"]).is_err());
        assert!(DeleteSnapshot::try_parse_from(["delete", "nightly"]).is_err());
    }

    #[tokio::test]
    async fn test_get_many() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_snapshot/backup/a,b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshots": []})))
            .expect(1)
            .mount(&server)
            .await;

        GetSnapshot::try_parse_from(["get", "a,b", "-r", "backup"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_restore_template() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("POST"))
            .and(path("/_snapshot/backup/nightly/_restore"))
            .and(body_json(json!({
                "indices": "logs-*",
                "include_global_state": true,
                "rename_pattern": "logs-(.+)",
                "rename_replacement": "restored-logs-$1",
                "include_aliases": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
            .expect(1)
            .mount(&server)
            .await;

        RestoreSnapshot::try_parse_from([
            "restore",
            "backup",
            "-s",
            "nightly",
            "-i",
            "logs-*",
            "-p",
            "logs-(.+)",
            "-r",
            "restored-logs-$1",
        ])
        .unwrap()
        .execute(&ctx)
        .await
        .unwrap();
    }

    #[test]
    fn test_restore_requires_snapshot() {
        let parsed = RestoreSnapshot::try_parse_from([
            "restore", "backup", "-i", "logs-*", "-p", "(.+)", "-r", "r-$1",
        ]);
        assert!(parsed.is_err());
    }
}
