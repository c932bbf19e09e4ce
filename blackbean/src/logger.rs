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

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BLACKBEAN_LOG";

fn level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs a stderr subscriber. `BLACKBEAN_LOG` overrides the level
/// derived from the number of `-v` flags.
pub fn init_logger(verbose: u8) {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => {
            let level = level(verbose).as_str().to_lowercase();
            EnvFilter::new(format!("{level},hyper=off,rustls=off"))
        }
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(0), Level::WARN);
        assert_eq!(level(1), Level::DEBUG);
        assert_eq!(level(4), Level::TRACE);
    }
}
