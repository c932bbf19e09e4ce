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
use elasticsearch::http::response::Response;
use elasticsearch::watcher::WatcherStatsParts;

use crate::error::BeanError;
use crate::{Context, Executor, run};

#[derive(Parser, Debug)]
pub struct Start {}

impl Start {
    pub fn new_command() -> Command {
        Self::command().name("start").about("Start the watcher service")
    }
}

#[async_trait::async_trait]
impl Executor for Start {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx.client.watcher().start().pretty(true).send().await?)
    }
}

#[derive(Parser, Debug)]
pub struct Stop {}

impl Stop {
    pub fn new_command() -> Command {
        Self::command().name("stop").about("Stop the watcher service")
    }
}

#[async_trait::async_trait]
impl Executor for Stop {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx.client.watcher().stop().pretty(true).send().await?)
    }
}

#[derive(Parser, Debug)]
pub struct Stats {}

impl Stats {
    pub fn new_command() -> Command {
        Self::command().name("stats").about("Show watcher statistics")
    }
}

#[async_trait::async_trait]
impl Executor for Stats {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .watcher()
            .stats(WatcherStatsParts::None)
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("watcher")
        .about("Watcher service control")
        .subcommand_required(true)
        .subcommands([Start::new_command(), Stop::new_command(), Stats::new_command()])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("start", m)) => run::<Start>(m, ctx).await,
        Some(("stop", m)) => run::<Stop>(m, ctx).await,
        Some(("stats", m)) => run::<Stats>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("watcher")),
    }
}
