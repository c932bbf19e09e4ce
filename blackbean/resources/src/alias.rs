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
use elasticsearch::indices::{IndicesDeleteAliasParts, IndicesGetAliasParts, IndicesPutAliasParts};

use crate::body::RawBody;
use crate::completion;
use crate::error::BeanError;
use crate::merge::split_words;
use crate::{Context, Executor, as_strs, run};

#[derive(Parser, Debug)]
pub struct CreateAlias {
    #[arg(
        help = "Indices to alias, comma separated",
        add = ArgValueCandidates::new(completion::indices)
    )]
    indices: String,
    #[arg(help = "Alias name")]
    alias: String,
    #[command(flatten)]
    body: RawBody,
}

impl CreateAlias {
    pub fn new_command() -> Command {
        Self::command()
            .name("create")
            .about("Add an alias to indices, with filter or routing from the body if given")
    }
}

#[async_trait::async_trait]
impl Executor for CreateAlias {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let indices = split_words(&self.indices);
        let indices = as_strs(&indices);
        let namespace = ctx.client.indices();
        let put = namespace
            .put_alias(IndicesPutAliasParts::IndexName(&indices, &self.alias))
            .pretty(true);
        let res = match self.body.json().await? {
            Some(body) => put.body(body).send().await?,
            None => put.send().await?,
        };
        Ok(res)
    }
}

#[derive(Parser, Debug)]
pub struct GetAlias {
    #[arg(
        value_delimiter = ',',
        required = true,
        help = "Indices, or aliases with --is-alias, comma separated",
        add = ArgValueCandidates::new(completion::indices_and_aliases)
    )]
    names: Vec<String>,
    #[arg(long, help = "Treat the names as aliases instead of indices")]
    is_alias: bool,
}

impl GetAlias {
    pub fn new_command() -> Command {
        Self::command()
            .name("get")
            .about("Get the aliases of indices, or the indices behind aliases")
    }
}

#[async_trait::async_trait]
impl Executor for GetAlias {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let names = as_strs(&self.names);
        let parts = if self.is_alias {
            IndicesGetAliasParts::Name(&names)
        } else {
            IndicesGetAliasParts::Index(&names)
        };
        Ok(ctx
            .client
            .indices()
            .get_alias(parts)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct DeleteAlias {
    #[arg(
        help = "Indices, comma separated",
        add = ArgValueCandidates::new(completion::indices)
    )]
    indices: String,
    #[arg(
        help = "Aliases to remove, comma separated",
        add = ArgValueCandidates::new(completion::aliases)
    )]
    aliases: String,
}

impl DeleteAlias {
    pub fn new_command() -> Command {
        Self::command()
            .name("delete")
            .about("Remove aliases from indices")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteAlias {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let (indices, aliases) = (split_words(&self.indices), split_words(&self.aliases));
        let (indices, aliases) = (as_strs(&indices), as_strs(&aliases));
        Ok(ctx
            .client
            .indices()
            .delete_alias(IndicesDeleteAliasParts::IndexName(&indices, &aliases))
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("alias")
        .about("Alias operations")
        .subcommand_required(true)
        .subcommands([
            CreateAlias::new_command(),
            GetAlias::new_command(),
            DeleteAlias::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("create", m)) => run::<CreateAlias>(m, ctx).await,
        Some(("get", m)) => run::<GetAlias>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteAlias>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("alias")),
    }
}
