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

//! Raw request bodies supplied on the command line.
use std::path::PathBuf;

use clap::Args;
use serde_json::Value;
use tokio::fs;
use tokio::io::{self, AsyncReadExt};

use crate::error::BeanError;

/// `-f/--filename` and `-d/--data`, shared by every command that accepts
/// a hand-written request body. The file wins when both are given.
#[derive(Args, Debug, Clone, Default)]
pub struct RawBody {
    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        help = "Request body file (JSON or YAML), '-' for stdin"
    )]
    pub filename: Option<PathBuf>,
    #[arg(
        short = 'd',
        long,
        value_name = "DATA",
        help = "Request body as a literal JSON or YAML string"
    )]
    pub data: Option<String>,
}

impl RawBody {
    pub fn is_set(&self) -> bool {
        self.filename.is_some() || self.data.is_some()
    }

    /// Returns the body text exactly as given.
    pub async fn text(&self) -> Result<Option<String>, BeanError> {
        match (&self.filename, &self.data) {
            (Some(path), _) if path.as_os_str() == "-" => {
                let mut body = String::new();
                io::stdin().read_to_string(&mut body).await?;
                Ok(Some(body))
            }
            (Some(path), _) => fs::read_to_string(path).await.map(Some).map_err(|e| {
                BeanError::Body(format!("can not read {}: {e}", path.display()))
            }),
            (None, Some(data)) => Ok(Some(data.clone())),
            (None, None) => Ok(None),
        }
    }

    /// Returns the body decoded as a JSON document.
    ///
    /// YAML is accepted too, for bodies that are not JSON.
    pub async fn json(&self) -> Result<Option<Value>, BeanError> {
        match self.text().await? {
            Some(text) => decode(&text).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the body as NDJSON lines, for bulk style endpoints.
    pub async fn lines(&self) -> Result<Option<Vec<String>>, BeanError> {
        Ok(self.text().await?.map(|text| {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        }))
    }
}

/// Decodes a body as JSON, falling back to YAML.
///
/// JSON goes first so escapes YAML rejects, like UTF-16 surrogate pairs,
/// still decode.
pub fn decode(text: &str) -> Result<Value, BeanError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => serde_yaml::from_str::<Value>(text)?,
    };
    match value {
        Value::Null => Err(BeanError::Body("empty request body".to_string())),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"from\": \"file\"}}").unwrap();
        let body = RawBody {
            filename: Some(file.path().to_path_buf()),
            data: Some("{\"from\": \"data\"}".to_string()),
        };
        assert_eq!(body.json().await.unwrap(), Some(json!({"from": "file"})));
    }

    #[tokio::test]
    async fn test_yaml_file_is_converted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "settings:\n  number_of_shards: 3\n").unwrap();
        let body = RawBody {
            filename: Some(file.path().to_path_buf()),
            data: None,
        };
        assert_eq!(
            body.json().await.unwrap(),
            Some(json!({"settings": {"number_of_shards": 3}}))
        );
    }

    #[test]
    fn test_json_surrogate_pair_escape() {
        assert_eq!(
            decode(r#"{"msg": "\ud83d\ude00"}"#).unwrap(),
            json!({"msg": "\u{1F600}"})
        );
    }

    #[test]
    fn test_null_body_is_rejected() {
        assert!(matches!(decode("null"), Err(BeanError::Body(_))));
        assert!(matches!(decode(""), Err(BeanError::Body(_))));
    }

    #[tokio::test]
    async fn test_unset_body() {
        let body = RawBody::default();
        assert!(!body.is_set());
        assert_eq!(body.json().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_a_body_error() {
        let body = RawBody {
            filename: Some(PathBuf::from("/definitely/not/here.json")),
            data: None,
        };
        assert!(matches!(body.json().await, Err(BeanError::Body(_))));
    }

    #[test]
    fn test_malformed_and_empty_data() {
        assert!(matches!(decode("{\"a\": "), Err(BeanError::Body(_))));
        assert!(matches!(decode("   "), Err(BeanError::Body(_))));
    }

    #[tokio::test]
    async fn test_ndjson_lines() {
        let body = RawBody {
            filename: None,
            data: Some("{\"index\":{}}\n{\"a\":1}\n\n".to_string()),
        };
        assert_eq!(
            body.lines().await.unwrap(),
            Some(vec!["{\"index\":{}}".to_string(), "{\"a\":1}".to_string()])
        );
    }
}
