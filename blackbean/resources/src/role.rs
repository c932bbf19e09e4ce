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

//! Security role commands.
//!
//! `update` merges with the stored role by default: cluster privileges are
//! unioned and the existing index privilege entries are kept after the new
//! one. `--add-only=false` replaces the role with what the flags describe.
use clap::{ArgAction, ArgMatches, Args, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::StatusCode;
use elasticsearch::http::response::Response;
use elasticsearch::security::{SecurityDeleteRoleParts, SecurityGetRoleParts, SecurityPutRoleParts};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::body::RawBody;
use crate::completion;
use crate::error::BeanError;
use crate::merge::{merge_unique, split_words, strings};
use crate::{Context, Executor, as_strs, run};

#[derive(Serialize, Debug, Default, PartialEq)]
struct RoleBody {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cluster: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    indices: Vec<Value>,
}

/// Fetches roles by name, returning an empty map when none exist.
async fn fetch_roles(ctx: &Context, names: &[&str]) -> Result<Map<String, Value>, BeanError> {
    let res = ctx
        .client
        .security()
        .get_role(SecurityGetRoleParts::Name(names))
        .send()
        .await?;
    if res.status_code() == StatusCode::NOT_FOUND {
        return Ok(Map::new());
    }
    match res.error_for_status_code()?.json::<Value>().await? {
        Value::Object(roles) => Ok(roles),
        other => Err(BeanError::Execution(format!("unexpected roles response: {other}"))),
    }
}

/// Keeps the requested roles that exist on the cluster.
///
/// Fails when none of them exist and warns about the missing ones otherwise.
pub(crate) async fn existing_roles(
    ctx: &Context,
    requested: &[String],
) -> Result<Vec<String>, BeanError> {
    let roles = fetch_roles(ctx, &as_strs(requested)).await?;
    let (exist, missing): (Vec<String>, Vec<String>) = requested
        .iter()
        .cloned()
        .partition(|role| roles.contains_key(role));

    if exist.is_empty() {
        return Err(BeanError::NotFound(format!(
            "role: {} does not exist",
            missing.join(",")
        )));
    }
    if !missing.is_empty() {
        tracing::warn!("role: {} does not exist", missing.join(","));
    }
    Ok(exist)
}

#[derive(Args, Debug)]
pub struct Privileges {
    #[arg(
        long,
        value_name = "PRIVILEGES",
        help = "Cluster privileges, comma separated",
        add = ArgValueCandidates::new(completion::cluster_privileges)
    )]
    cluster_privilege: Option<String>,
    #[arg(
        long,
        value_name = "INDICES",
        help = "Indices the index privileges apply to, comma separated",
        add = ArgValueCandidates::new(completion::indices)
    )]
    indices: Option<String>,
    #[arg(
        long,
        value_name = "PRIVILEGES",
        default_value = "read",
        help = "Index privileges, comma separated",
        add = ArgValueCandidates::new(completion::index_privileges)
    )]
    indices_privilege: String,
}

impl Privileges {
    fn check(&self) -> Result<(), BeanError> {
        if self.cluster_privilege.is_none() && self.indices.is_none() {
            return Err(BeanError::command(
                "at least one of --cluster-privilege and --indices should be specified",
            ));
        }
        Ok(())
    }

    fn cluster(&self) -> Vec<String> {
        self.cluster_privilege
            .as_deref()
            .map(split_words)
            .unwrap_or_default()
    }

    fn index_entry(&self) -> Option<Value> {
        self.indices.as_deref().map(|indices| {
            json!({
                "names": split_words(indices),
                "privileges": split_words(&self.indices_privilege)
            })
        })
    }

    fn body(&self) -> RoleBody {
        RoleBody {
            cluster: self.cluster(),
            indices: self.index_entry().into_iter().collect(),
        }
    }

    fn merged_body(&self, existing: &Value) -> RoleBody {
        let mut indices: Vec<Value> = self.index_entry().into_iter().collect();
        if let Some(entries) = existing.get("indices").and_then(Value::as_array) {
            indices.extend(entries.iter().cloned());
        }
        RoleBody {
            cluster: merge_unique(strings(existing.get("cluster")), self.cluster()),
            indices,
        }
    }
}

async fn put_role(ctx: &Context, name: &str, body: Value) -> Result<Response, BeanError> {
    tracing::debug!(role = name, %body, "putting role");
    Ok(ctx
        .client
        .security()
        .put_role(SecurityPutRoleParts::Name(name))
        .body(body)
        .pretty(true)
        .send()
        .await?)
}

#[derive(Parser, Debug)]
pub struct GetRole {
    #[arg(
        value_delimiter = ',',
        help = "Roles to get, comma separated, all roles when omitted",
        add = ArgValueCandidates::new(completion::roles)
    )]
    roles: Vec<String>,
}

impl GetRole {
    pub fn new_command() -> Command {
        Self::command().name("get").about("Get roles")
    }
}

#[async_trait::async_trait]
impl Executor for GetRole {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let roles = as_strs(&self.roles);
        let parts = if roles.is_empty() {
            SecurityGetRoleParts::None
        } else {
            SecurityGetRoleParts::Name(&roles)
        };
        Ok(ctx
            .client
            .security()
            .get_role(parts)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct CreateRole {
    #[arg(help = "Role name")]
    role: String,
    #[command(flatten)]
    privileges: Privileges,
    #[command(flatten)]
    body: RawBody,
}

impl CreateRole {
    pub fn new_command() -> Command {
        Self::command()
            .name("create")
            .about("Create a role from privilege flags or a body")
    }
}

#[async_trait::async_trait]
impl Executor for CreateRole {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let body = match self.body.json().await? {
            Some(raw) => raw,
            None => {
                self.privileges.check()?;
                serde_json::to_value(self.privileges.body())?
            }
        };
        put_role(ctx, &self.role, body).await
    }
}

#[derive(Parser, Debug)]
pub struct UpdateRole {
    #[arg(help = "Role name", add = ArgValueCandidates::new(completion::roles))]
    role: String,
    #[command(flatten)]
    privileges: Privileges,
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        help = "Merge with the existing role instead of replacing it"
    )]
    add_only: bool,
    #[command(flatten)]
    body: RawBody,
}

impl UpdateRole {
    pub fn new_command() -> Command {
        Self::command()
            .name("update")
            .about("Add privileges to a role, or replace them with --add-only=false")
    }
}

#[async_trait::async_trait]
impl Executor for UpdateRole {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        if let Some(raw) = self.body.json().await? {
            return put_role(ctx, &self.role, raw).await;
        }
        self.privileges.check()?;

        let existing = fetch_roles(ctx, &[self.role.as_str()])
            .await?
            .remove(&self.role)
            .ok_or_else(|| BeanError::NotFound(format!("cluster has no such role {}", self.role)))?;

        let body = if self.add_only {
            self.privileges.merged_body(&existing)
        } else {
            self.privileges.body()
        };
        put_role(ctx, &self.role, serde_json::to_value(body)?).await
    }
}

#[derive(Parser, Debug)]
pub struct DeleteRole {
    #[arg(help = "Role name", add = ArgValueCandidates::new(completion::roles))]
    role: String,
}

impl DeleteRole {
    pub fn new_command() -> Command {
        Self::command().name("delete").about("Delete a role")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteRole {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .security()
            .delete_role(SecurityDeleteRoleParts::Name(&self.role))
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("role")
        .about("Role operations")
        .subcommand_required(true)
        .subcommands([
            GetRole::new_command(),
            CreateRole::new_command(),
            UpdateRole::new_command(),
            DeleteRole::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("get", m)) => run::<GetRole>(m, ctx).await,
        Some(("create", m)) => run::<CreateRole>(m, ctx).await,
        Some(("update", m)) => run::<UpdateRole>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteRole>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("role")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_role(server: &MockServer, name: &str, role: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/_security/role/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ name: role })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_all_roles() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_security/role"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        GetRole::try_parse_from(["get"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_from_flags() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("PUT"))
            .and(path("/_security/role/reader"))
            .and(body_json(json!({
                "cluster": ["monitor"],
                "indices": [{"names": ["logs-*", "metrics-*"], "privileges": ["read"]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": {"created": true}})))
            .expect(1)
            .mount(&server)
            .await;

        CreateRole::try_parse_from([
            "create",
            "reader",
            "--cluster-privilege",
            "monitor",
            "--indices",
            "logs-*,metrics-*",
        ])
        .unwrap()
        .execute(&ctx)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_requires_privileges() {
        let (server, ctx) = testing::context().await;
        let cmd = CreateRole::try_parse_from(["create", "reader"]).unwrap();
        assert!(matches!(cmd.execute(&ctx).await, Err(BeanError::Command(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_with_existing() {
        let (server, ctx) = testing::context().await;
        mount_role(
            &server,
            "ops",
            json!({
                "cluster": ["monitor", "manage"],
                "indices": [{"names": ["logs-*"], "privileges": ["read"]}]
            }),
        )
        .await;
        Mock::given(method("PUT"))
            .and(path("/_security/role/ops"))
            .and(body_json(json!({
                "cluster": ["monitor", "manage", "manage_ilm"],
                "indices": [
                    {"names": ["audit"], "privileges": ["read", "write"]},
                    {"names": ["logs-*"], "privileges": ["read"]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        UpdateRole::try_parse_from([
            "update",
            "ops",
            "--cluster-privilege",
            "monitor,manage_ilm",
            "--indices",
            "audit",
            "--indices-privilege",
            "read,write",
        ])
        .unwrap()
        .execute(&ctx)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_replaces_without_add_only() {
        let (server, ctx) = testing::context().await;
        mount_role(&server, "ops", json!({"cluster": ["all"], "indices": []})).await;
        Mock::given(method("PUT"))
            .and(path("/_security/role/ops"))
            .and(body_json(json!({"cluster": ["monitor"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        UpdateRole::try_parse_from(["update", "ops", "--cluster-privilege", "monitor", "--add-only=false"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_role() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_security/role/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cmd = UpdateRole::try_parse_from(["update", "ghost", "--indices", "logs"]).unwrap();
        assert!(matches!(cmd.execute(&ctx).await, Err(BeanError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_existing_roles_partial() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_security/role/viewer,ghost"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"viewer": {}})))
            .mount(&server)
            .await;

        let exist = existing_roles(&ctx, &["viewer".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(exist, vec!["viewer"]);
    }

    #[tokio::test]
    async fn test_existing_roles_none() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_security/role/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = existing_roles(&ctx, &["ghost".to_string()]).await.unwrap_err();
        assert_eq!(err.to_string(), "role: ghost does not exist");
    }
}
