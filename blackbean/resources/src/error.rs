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

use std::error::Error as _;

use thiserror::Error;

use crate::config::ConfigError;

/// Represents errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum BeanError {
    /// The config file could not be resolved into a profile.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// The transport could not be built from the profile.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Invalid flags or arguments, detected before any request is sent.
    #[error("{0}")]
    Command(String),
    /// The request failed on the wire or the cluster rejected it.
    #[error("{0}")]
    Execution(String),
    /// A raw request body could not be read or decoded.
    #[error("malformed request body: {0}")]
    Body(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),
    /// The resource a command wants to modify does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl BeanError {
    pub fn command(msg: impl Into<String>) -> Self {
        BeanError::Command(msg.into())
    }

    pub fn unknown_subcommand(namespace: &str) -> Self {
        BeanError::Command(format!("unrecognized subcommand for '{namespace}'"))
    }
}

impl From<elasticsearch::http::transport::BuildError> for BeanError {
    fn from(err: elasticsearch::http::transport::BuildError) -> Self {
        BeanError::Transport(err.to_string())
    }
}

impl From<clap::error::Error> for BeanError {
    fn from(value: clap::error::Error) -> Self {
        BeanError::Command(format!("Command error: {value}"))
    }
}

impl From<serde_json::Error> for BeanError {
    fn from(value: serde_json::Error) -> Self {
        BeanError::Body(value.to_string())
    }
}

impl From<serde_yaml::Error> for BeanError {
    fn from(value: serde_yaml::Error) -> Self {
        BeanError::Body(value.to_string())
    }
}

/// Unwraps the reqwest cause so connection failures read as such.
impl From<elasticsearch::Error> for BeanError {
    fn from(value: elasticsearch::Error) -> Self {
        if let Some(source) = value.source() {
            if let Some(reqwest_error) = source.downcast_ref::<reqwest::Error>() {
                let mut s = format!("Error executing request: {reqwest_error}");
                if let Some(source) = reqwest_error.source() {
                    s.push_str(&format!(", caused by: {source}"));
                }
                return BeanError::Execution(s);
            }
        }

        BeanError::Execution(format!("Error executing request: {value}"))
    }
}
