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

//! Security user commands.
use clap::{ArgAction, ArgMatches, Command, CommandFactory, Parser};
use clap_complete::engine::ArgValueCandidates;
use elasticsearch::http::StatusCode;
use elasticsearch::http::response::Response;
use elasticsearch::security::{SecurityDeleteUserParts, SecurityGetUserParts, SecurityPutUserParts};
use serde::Serialize;
use serde_json::Value;

use crate::body::RawBody;
use crate::completion;
use crate::error::BeanError;
use crate::merge::{merge_unique, split_words, strings};
use crate::role::existing_roles;
use crate::{Context, Executor, as_strs, run};

#[derive(Serialize, Debug, PartialEq)]
struct UserBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

async fn put_user<B>(ctx: &Context, name: &str, body: B) -> Result<Response, BeanError>
where
    B: Serialize + Send,
{
    Ok(ctx
        .client
        .security()
        .put_user(SecurityPutUserParts::Username(name))
        .body(body)
        .pretty(true)
        .send()
        .await?)
}

/// Fetches a single user, `None` when it does not exist.
async fn fetch_user(ctx: &Context, name: &str) -> Result<Option<Value>, BeanError> {
    let res = ctx
        .client
        .security()
        .get_user(SecurityGetUserParts::Username(&[name]))
        .send()
        .await?;
    if res.status_code() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let mut users = res.error_for_status_code()?.json::<Value>().await?;
    Ok(users.get_mut(name).map(Value::take))
}

fn stored(user: &Value, field: &str) -> Option<String> {
    user.get(field).and_then(Value::as_str).map(str::to_string)
}

#[derive(Parser, Debug)]
pub struct GetUser {
    #[arg(
        value_delimiter = ',',
        help = "Users to get, comma separated, all users when omitted",
        add = ArgValueCandidates::new(completion::users)
    )]
    users: Vec<String>,
}

impl GetUser {
    pub fn new_command() -> Command {
        Self::command().name("get").about("Get users")
    }
}

#[async_trait::async_trait]
impl Executor for GetUser {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let users = as_strs(&self.users);
        let parts = if users.is_empty() {
            SecurityGetUserParts::None
        } else {
            SecurityGetUserParts::Username(&users)
        };
        Ok(ctx
            .client
            .security()
            .get_user(parts)
            .pretty(true)
            .send()
            .await?)
    }
}

#[derive(Parser, Debug)]
pub struct CreateUser {
    #[arg(help = "Username")]
    username: String,
    #[arg(
        long,
        help = "Roles to assign, comma separated",
        add = ArgValueCandidates::new(completion::roles)
    )]
    roles: Option<String>,
    #[arg(long, help = "Email address")]
    email: Option<String>,
    #[arg(long, help = "Full name")]
    full_name: Option<String>,
    #[command(flatten)]
    body: RawBody,
}

impl CreateUser {
    pub fn new_command() -> Command {
        Self::command()
            .name("create")
            .about("Create a user, prompting for its password")
    }
}

#[async_trait::async_trait]
impl Executor for CreateUser {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        if let Some(raw) = self.body.json().await? {
            return put_user(ctx, &self.username, raw).await;
        }
        let Some(roles) = &self.roles else {
            return Err(BeanError::command("--roles is required without a request body"));
        };

        let roles = existing_roles(ctx, &split_words(roles)).await?;
        let password = ctx.prompt.password(&self.username)?;
        let body = UserBody {
            password: Some(password),
            roles,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        };
        put_user(ctx, &self.username, body).await
    }
}

#[derive(Parser, Debug)]
pub struct UpdateUser {
    #[arg(help = "Username", add = ArgValueCandidates::new(completion::users))]
    username: String,
    #[arg(
        long,
        help = "Roles to assign, comma separated",
        add = ArgValueCandidates::new(completion::roles)
    )]
    roles: Option<String>,
    #[arg(long, help = "Prompt for a new password")]
    change_password: bool,
    #[arg(long, help = "Email address, the stored one is kept when omitted")]
    email: Option<String>,
    #[arg(long, help = "Full name, the stored one is kept when omitted")]
    full_name: Option<String>,
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        help = "Add the roles to the existing ones instead of replacing them"
    )]
    add_only: bool,
    #[command(flatten)]
    body: RawBody,
}

impl UpdateUser {
    pub fn new_command() -> Command {
        Self::command()
            .name("update")
            .about("Change the roles or password of a user")
    }
}

#[async_trait::async_trait]
impl Executor for UpdateUser {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        if let Some(raw) = self.body.json().await? {
            return put_user(ctx, &self.username, raw).await;
        }
        if self.roles.is_none() && !self.change_password {
            return Err(BeanError::command(
                "at least one of --roles and --change-password should be specified",
            ));
        }

        let user = fetch_user(ctx, &self.username)
            .await?
            .ok_or_else(|| BeanError::NotFound(format!("User: {} does not exist", self.username)))?;
        let current = strings(user.get("roles"));

        let roles = match &self.roles {
            Some(requested) => {
                let requested = existing_roles(ctx, &split_words(requested)).await?;
                if self.add_only {
                    merge_unique(current, requested)
                } else {
                    requested
                }
            }
            None => current,
        };
        let password = if self.change_password {
            Some(ctx.prompt.password(&self.username)?)
        } else {
            None
        };

        let body = UserBody {
            password,
            roles,
            full_name: self.full_name.clone().or_else(|| stored(&user, "full_name")),
            email: self.email.clone().or_else(|| stored(&user, "email")),
        };
        put_user(ctx, &self.username, body).await
    }
}

#[derive(Parser, Debug)]
pub struct DeleteUser {
    #[arg(help = "Username", add = ArgValueCandidates::new(completion::users))]
    username: String,
}

impl DeleteUser {
    pub fn new_command() -> Command {
        Self::command().name("delete").about("Delete a user")
    }
}

#[async_trait::async_trait]
impl Executor for DeleteUser {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        Ok(ctx
            .client
            .security()
            .delete_user(SecurityDeleteUserParts::Username(&self.username))
            .pretty(true)
            .send()
            .await?)
    }
}

pub fn command() -> Command {
    Command::new("user")
        .about("User operations")
        .subcommand_required(true)
        .subcommands([
            GetUser::new_command(),
            CreateUser::new_command(),
            UpdateUser::new_command(),
            DeleteUser::new_command(),
        ])
}

pub async fn run_command(matches: &ArgMatches, ctx: &Context) -> Result<Response, BeanError> {
    match matches.subcommand() {
        Some(("get", m)) => run::<GetUser>(m, ctx).await,
        Some(("create", m)) => run::<CreateUser>(m, ctx).await,
        Some(("update", m)) => run::<UpdateUser>(m, ctx).await,
        Some(("delete", m)) => run::<DeleteUser>(m, ctx).await,
        _ => Err(BeanError::unknown_subcommand("user")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, PASSWORD};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_roles(server: &MockServer, names: &str, found: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/_security/role/{names}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(found))
            .mount(server)
            .await;
    }

    async fn mount_user(server: &MockServer, name: &str, user: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/_security/user/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ name: user })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_keeps_existing_roles_only() {
        let (server, ctx) = testing::context().await;
        mount_roles(&server, "viewer,ghost", json!({"viewer": {}})).await;
        Mock::given(method("PUT"))
            .and(path("/_security/user/jacky"))
            .and(body_json(json!({
                "password": PASSWORD,
                "roles": ["viewer"],
                "email": "jacky@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"created": true})))
            .expect(1)
            .mount(&server)
            .await;

        CreateUser::try_parse_from([
            "create",
            "jacky",
            "--roles",
            "viewer,ghost",
            "--email",
            "jacky@example.com",
        ])
        .unwrap()
        .execute(&ctx)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_fails_when_no_role_exists() {
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

        let cmd = CreateUser::try_parse_from(["create", "jacky", "--roles", "ghost"]).unwrap();
        let err = cmd.execute(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "role: ghost does not exist");
    }

    #[tokio::test]
    async fn test_create_requires_roles() {
        let (server, ctx) = testing::context().await;
        let cmd = CreateUser::try_parse_from(["create", "jacky"]).unwrap();
        assert!(matches!(cmd.execute(&ctx).await, Err(BeanError::Command(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_roles_and_keeps_profile() {
        let (server, ctx) = testing::context().await;
        mount_user(
            &server,
            "jacky",
            json!({"roles": ["viewer"], "full_name": "Jacky Chan", "email": "jacky@example.com"}),
        )
        .await;
        mount_roles(&server, "editor", json!({"editor": {}})).await;
        Mock::given(method("PUT"))
            .and(path("/_security/user/jacky"))
            .and(body_json(json!({
                "roles": ["viewer", "editor"],
                "full_name": "Jacky Chan",
                "email": "jacky@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"created": false})))
            .expect(1)
            .mount(&server)
            .await;

        UpdateUser::try_parse_from(["update", "jacky", "--roles", "editor"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_password_keeps_roles() {
        let (server, ctx) = testing::context().await;
        mount_user(&server, "jacky", json!({"roles": ["viewer"]})).await;
        Mock::given(method("PUT"))
            .and(path("/_security/user/jacky"))
            .and(body_json(json!({"password": PASSWORD, "roles": ["viewer"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        UpdateUser::try_parse_from(["update", "jacky", "--change-password"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_replaces_roles() {
        let (server, ctx) = testing::context().await;
        mount_user(&server, "jacky", json!({"roles": ["viewer"]})).await;
        mount_roles(&server, "editor", json!({"editor": {}})).await;
        Mock::given(method("PUT"))
            .and(path("/_security/user/jacky"))
            .and(body_json(json!({"roles": ["editor"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        UpdateUser::try_parse_from(["update", "jacky", "--roles", "editor", "--add-only", "false"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_security/user/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let cmd = UpdateUser::try_parse_from(["update", "ghost", "--change-password"]).unwrap();
        assert!(matches!(cmd.execute(&ctx).await, Err(BeanError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_requires_a_change() {
        let (server, ctx) = testing::context().await;
        let cmd = UpdateUser::try_parse_from(["update", "jacky", "--email", "a@b.c"]).unwrap();
        assert!(matches!(cmd.execute(&ctx).await, Err(BeanError::Command(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
