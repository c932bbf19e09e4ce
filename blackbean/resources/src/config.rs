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

//! Cluster configuration file handling.
//!
//! The config file is a YAML document naming the active cluster and the
//! connection details of every known cluster:
//!
//! ```yaml
//! current: prod
//! cluster:
//!   prod:
//!     url: https://es.example.com:9200
//!     username: elastic
//!     password: changeme
//! ```
//!
//! Resolution walks `current`, then `cluster[current]`, then the three
//! connection fields, and stops at the first missing or mistyped entry.
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

pub const CURRENT_KEY: &str = "current";
pub const CLUSTER_KEY: &str = "cluster";
pub const CONFIG_FILE_NAME: &str = ".blackbean.yaml";

const URL_KEY: &str = "url";
const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("can not read 'current' from config file")]
    NoCurrent,
    #[error("bad 'current' type from config file, want string")]
    BadCurrentType,
    #[error("can not read 'cluster' from config file")]
    NoCluster,
    #[error("wrong 'cluster' type from config file, want map")]
    BadClusterType,
    #[error("no such env {0:?} in 'cluster'")]
    NoSuchEnv(String),
    #[error("wrong type for cluster {0:?}, want map")]
    BadEntryType(String),
    #[error("can not find '{field}' for cluster {cluster:?}")]
    MissingField { cluster: String, field: &'static str },
    #[error("bad '{field}' type for cluster {cluster:?}, want string")]
    BadFieldType { cluster: String, field: &'static str },
    #[error("can not determine the home directory")]
    NoHome,
    #[error("can not read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("can not parse config file: {0}")]
    Parse(String),
    #[error("can not write config file {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Connection details of the selected cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Resolves a connection profile from a parsed config document.
///
/// `cluster` overrides the `current` entry when given, but the `current`
/// entry is still type-checked so a broken file is reported either way.
pub fn resolve(raw: &Value, cluster: Option<&str>) -> Result<Profile, ConfigError> {
    let current = match raw.get(CURRENT_KEY) {
        None | Some(Value::Null) if cluster.is_none() => return Err(ConfigError::NoCurrent),
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_str().ok_or(ConfigError::BadCurrentType)?),
    };
    let name = cluster.or(current).ok_or(ConfigError::NoCurrent)?;

    let entry = clusters(raw)?
        .get(name)
        .ok_or_else(|| ConfigError::NoSuchEnv(name.to_string()))?;
    let entry = entry
        .as_mapping()
        .ok_or_else(|| ConfigError::BadEntryType(name.to_string()))?;

    Ok(Profile {
        url: field(entry, name, URL_KEY)?,
        username: field(entry, name, USERNAME_KEY)?,
        password: field(entry, name, PASSWORD_KEY)?,
    })
}

fn clusters(raw: &Value) -> Result<&Mapping, ConfigError> {
    match raw.get(CLUSTER_KEY) {
        None | Some(Value::Null) => Err(ConfigError::NoCluster),
        Some(value) => value.as_mapping().ok_or(ConfigError::BadClusterType),
    }
}

fn field(entry: &Mapping, cluster: &str, name: &'static str) -> Result<String, ConfigError> {
    let value = entry.get(name).ok_or_else(|| ConfigError::MissingField {
        cluster: cluster.to_string(),
        field: name,
    })?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::BadFieldType {
            cluster: cluster.to_string(),
            field: name,
        })
}

/// The config file on disk together with its parsed content.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    text: String,
    raw: Value,
}

impl ConfigFile {
    /// Returns `$HOME/.blackbean.yaml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoHome)
    }

    /// Loads the given file, or the default one when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let raw = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(ConfigFile {
            path,
            text: content,
            raw,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profile(&self, cluster: Option<&str>) -> Result<Profile, ConfigError> {
        resolve(&self.raw, cluster)
    }

    pub fn current(&self) -> Option<&str> {
        self.raw.get(CURRENT_KEY).and_then(Value::as_str)
    }

    /// Lists the configured cluster names starting with `prefix`.
    pub fn cluster_names(&self, prefix: &str) -> Vec<String> {
        clusters(&self.raw)
            .map(|clusters| {
                clusters
                    .keys()
                    .filter_map(Value::as_str)
                    .filter(|name| name.starts_with(prefix))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Points `current` at `cluster` and writes the file back.
    ///
    /// Only the top-level `current:` line is replaced, so comments and
    /// layout survive. A document where that line can not be edited in
    /// place is re-serialized instead, which keeps values but not comments.
    pub fn use_cluster(&mut self, cluster: &str) -> Result<(), ConfigError> {
        if !clusters(&self.raw)?.contains_key(cluster) {
            return Err(ConfigError::NoSuchEnv(cluster.to_string()));
        }

        let document = match &mut self.raw {
            Value::Mapping(mapping) => mapping,
            _ => return Err(ConfigError::BadClusterType),
        };
        document.insert(
            Value::String(CURRENT_KEY.to_string()),
            Value::String(cluster.to_string()),
        );

        let edited = replace_current(&self.text, cluster)
            .filter(|edited| serde_yaml::from_str::<Value>(edited).ok().as_ref() == Some(&self.raw));
        let content = match edited {
            Some(edited) => edited,
            None => {
                serde_yaml::to_string(&self.raw).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };
        fs::write(&self.path, &content).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.text = content;
        Ok(())
    }
}

/// Rewrites the top-level `current:` line of `text`, or prepends one.
///
/// Indented lines following the old entry belong to its value and are
/// dropped with it.
fn replace_current(text: &str, cluster: &str) -> Option<String> {
    let value = serde_yaml::to_string(&Value::String(cluster.to_string())).ok()?;
    let line = format!("{CURRENT_KEY}: {}\n", value.trim_end());

    let mut out = String::with_capacity(text.len() + line.len());
    let mut replaced = false;
    let mut in_old_value = false;
    for row in text.split_inclusive('\n') {
        if in_old_value && row.starts_with([' ', '\t']) {
            continue;
        }
        in_old_value = false;
        if !replaced && row.starts_with(&format!("{CURRENT_KEY}:")) {
            out.push_str(&line);
            replaced = true;
            in_old_value = true;
        } else {
            out.push_str(row);
        }
    }
    if !replaced {
        out.insert_str(0, &line);
    }
    Some(out)
}
