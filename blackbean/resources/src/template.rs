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

//! Legacy index template commands.
use clap::{ArgMatches, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::response::Response;
use elasticsearch::indices::{
    IndicesDeleteTemplateParts, IndicesGetTemplateParts, IndicesPutTemplateParts,
};

use crate::body::RawBody;
use crate::completion;
use crate::error::BeanError;
use crate::{Context, Executor, run};

#[derive(Parser, Debug)]
pub struct GetTemplate {
    #[arg(
        help = "Template name, all templates when omitted",
        add = ArgValueCandidates::new(completion::templates)
    )]
    name: Option<String>,
}

impl GetTemplate {
    pub fn new_command() -> Command {
        Self::command().name("get").about("Get index templates")
    }
}

#[async_trait::async_trait]
impl Executor for GetTemplate {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let names;
        let parts = match &self.name {
            Some(name) => {
                names = [name.as_str()];
                IndicesGetTemplateParts::Name(&names)
            }
            None => IndicesGetTemplateParts::None,
        };
        Ok(ctx
            .client
            .indices()
            .get_template(parts)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct ApplyTemplate {
    #[arg(help = "Template name", add = ArgValueCandidates::new(completion::templates))]
    name: String,
    #[command(flatten)]
    body: RawBody,
}

impl ApplyTemplate {
    pub fn new_command() -> Command {
        Self::command()
            .name("apply")
            .about("Create or replace an index template from the body")
    }
}

#[async_trait::async_trait]
impl Executor for ApplyTemplate {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let Some(body) = self.body.json().await? else {
            return Err(BeanError::command(
                "one of --data and --filename should be specified",
            ));
        };
        Ok(ctx
            .client
            .indices()
            .put_template(IndicesPutTemplateParts::Name(&self.name))
            .body(body)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct DeleteTemplate {
    #[arg(help = "Template name", add = ArgValueCandidates::new(completion::templates))]
    name: String,
}

impl DeleteTemplate {
    pub fn new_command() -> Command {
        Self::command().name("delete").about("Delete an index template")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteTemplate {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .indices()
            .delete_template(IndicesDeleteTemplateParts::Name(&self.name))
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("template")
        .about("Index template operations")
        .subcommand_required(true)
        .subcommands([
            GetTemplate::new_command(),
            ApplyTemplate::new_command(),
            DeleteTemplate::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("get", m)) => run::<GetTemplate>(m, ctx).await,
        Some(("apply", m)) => run::<ApplyTemplate>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteTemplate>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("template")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_get_all_templates() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_template"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        GetTemplate::try_parse_from(["get"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_apply_from_yaml_file() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("PUT"))
            .and(path("/_template/logs"))
            .and(body_json(json!({
                "index_patterns": ["logs-*"],
                "settings": {"number_of_shards": 1}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "index_patterns:\n  - logs-*\nsettings:\n  number_of_shards: 1\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        ApplyTemplate::try_parse_from(["apply", "logs", "-f", &path])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_apply_requires_body() {
        let (server, ctx) = testing::context().await;
        let cmd = ApplyTemplate::try_parse_from(["apply", "logs"]).unwrap();
        assert!(matches!(cmd.execute(&ctx).await, Err(BeanError::Command(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_template() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("DELETE"))
            .and(path("/_template/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        DeleteTemplate::try_parse_from(["delete", "logs"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }
}
