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

mod alias;
pub mod body;
mod cat;
pub mod client;
pub mod completion;
pub mod config;
pub mod error;
mod explain;
mod index;
pub mod merge;
pub mod prompt;
mod repo;
mod reroute;
mod role;
pub mod settings;
mod snapshot;
mod template;
mod user;
mod watcher;

use clap::{ArgMatches, Command, FromArgMatches};
use elasticsearch::Elasticsearch;
use elasticsearch::http::response::Response;

pub use crate::error::BeanError;
use crate::prompt::PasswordPrompt;

/// Everything a command needs to talk to the cluster.
pub struct Context {
    pub client: Elasticsearch,
    pub prompt: Box<dyn PasswordPrompt>,
}

impl Context {
    pub fn new(client: Elasticsearch, prompt: Box<dyn PasswordPrompt>) -> Self {
        Context { client, prompt }
    }
}

/// A parsed subcommand that sends its request through the context client.
#[async_trait::async_trait]
pub trait Executor {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError>;
}

pub(crate) async fn run<E>(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError>
where
    E: Executor + FromArgMatches,
{
    E::from_arg_matches(matches)?.execute(ctx).await
}

pub(crate) fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

pub fn commands() -> [Command; 12] {
    [
        index::command(),
        alias::command(),
        repo::command(),
        snapshot::command(),
        role::command(),
        user::command(),
        template::command(),
        watcher::command(),
        reroute::command(),
        explain::Explain::new_command(),
        cat::command(),
        settings::command(),
    ]
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("index", m)) => index::run_command(m, ctx).await,
        Some(("alias", m)) => alias::run_command(m, ctx).await,
        Some(("repo", m)) => repo::run_command(m, ctx).await,
        Some(("snapshot", m)) => snapshot::run_command(m, ctx).await,
        Some(("role", m)) => role::run_command(m, ctx).await,
        Some(("user", m)) => user::run_command(m, ctx).await,
        Some(("template", m)) => template::run_command(m, ctx).await,
        Some(("watcher", m)) => watcher::run_command(m, ctx).await,
        Some(("reroute", m)) => reroute::run_command(m, ctx).await,
        Some(("explain", m)) => run::<explain::Explain>(m, ctx).await,
        Some(("get", m)) => run::<cat::Cat>(m, ctx).await,
        Some(("apply", m)) => settings::run_command(m, ctx).await,
        Some((name, _)) => Err(BeanError::command(format!("unrecognized subcommand '{name}'"))),
        None => Err(BeanError::command("no subcommand provided")),
    }
}
