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

use std::time::Duration;

use elasticsearch::Elasticsearch;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::Url;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};

use crate::config::Profile;
use crate::error::BeanError;

/// Builds a client for the cluster described by `profile`.
///
/// Certificate validation is off since most clusters behind this tool run
/// with self-signed certificates. Basic auth is only set when the profile
/// carries a username.
pub fn build_client(
    profile: &Profile,
    timeout: Option<Duration>,
) -> Result<Elasticsearch, BeanError> {
    let url = Url::parse(&profile.url)
        .map_err(|e| BeanError::Transport(format!("invalid url {:?}: {e}", profile.url)))?;

    let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(url))
        .cert_validation(CertificateValidation::None);
    if !profile.username.is_empty() {
        builder = builder.auth(Credentials::Basic(
            profile.username.clone(),
            profile.password.clone(),
        ));
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(Elasticsearch::new(builder.build()?))
}
