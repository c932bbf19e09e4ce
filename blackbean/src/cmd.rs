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

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Command, CommandFactory, Parser};
use clap_complete::Shell;
use clap_complete::engine::ArgValueCandidates;
use resources::completion;
use resources::config::{ConfigError, ConfigFile};

/// Global options, available on every subcommand.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(
        long,
        global = true,
        env = "BLACKBEAN_CONFIG",
        value_name = "FILE",
        help = "Config file, defaults to ~/.blackbean.yaml"
    )]
    pub config: Option<PathBuf>,

    #[clap(
        long,
        global = true,
        env = "BLACKBEAN_CLUSTER",
        value_name = "NAME",
        help = "Cluster to use instead of the current one",
        add = ArgValueCandidates::new(completion::clusters)
    )]
    pub cluster: Option<String>,

    #[clap(
        long,
        global = true,
        env = "BLACKBEAN_TIMEOUT",
        value_name = "SECONDS",
        help = "Request timeout in seconds",
        value_parser = |s: &str| s.parse().map(Duration::from_secs)
    )]
    pub timeout: Option<Duration>,

    #[clap(short, long, global = true, action = ArgAction::Count, help = "Log requests to stderr")]
    pub verbose: u8,
}

#[derive(Parser, Debug)]
pub struct UseCluster {
    #[arg(
        help = "Cluster name from the config file",
        add = ArgValueCandidates::new(completion::clusters)
    )]
    cluster: String,
}

impl UseCluster {
    pub fn new_command() -> Command {
        Self::command()
            .name("use")
            .about("Switch the current cluster")
    }

    pub fn execute(&self, config: &Config) -> Result<String, ConfigError> {
        let mut file = ConfigFile::load(config.config.as_deref())?;
        file.use_cluster(&self.cluster)?;
        Ok(format!("change to cluster: {}", self.cluster))
    }
}

#[derive(Parser, Debug)]
pub struct Current {}

impl Current {
    pub fn new_command() -> Command {
        Self::command()
            .name("current")
            .visible_alias("current-es")
            .about("Show the current cluster")
    }

    pub fn execute(&self, config: &Config) -> Result<String, ConfigError> {
        let file = ConfigFile::load(config.config.as_deref())?;
        let current = file.current().ok_or(ConfigError::NoCurrent)?;
        Ok(format!("current using cluster: {current}"))
    }
}

#[derive(Parser, Debug)]
pub struct Completion {
    #[arg(value_enum, help = "Shell to generate the script for")]
    shell: Shell,
}

impl Completion {
    pub fn new_command() -> Command {
        Self::command()
            .name("completion")
            .about("Print a static completion script")
            .long_about(
                r#"
            Print a static completion script for the given shell.

            Static scripts complete commands and flags only. For cluster,
            index, role and other names, source the dynamic script instead:

                source <(COMPLETE=bash blackbean)
            "#,
            )
    }

    pub fn execute(&self) {
        clap_complete::generate(self.shell, &mut command(), "blackbean", &mut io::stdout());
    }
}

pub fn command() -> Command {
    let after_help_heading: &str =
        color_print::cstr!(r#"<underline><bold>Examples:</bold></underline>"#);
    let after_help: String = format!(
        "{}{}",
        after_help_heading,
        r#"
  blackbean use prod
  blackbean get health
  blackbean index search logs-* -d '{"query": {"match": {"level": "error"}}}'
  blackbean apply settings --watermark-high 90% --watermark-low 85%
  blackbean --cluster backup snapshot create nightly --repo azure
"#
    );

    Config::command()
        .name("blackbean")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Elasticsearch administration from the command line")
        .subcommand_required(true)
        .after_help(after_help)
        .subcommands([
            UseCluster::new_command(),
            Current::new_command(),
            Completion::new_command(),
        ])
        .subcommands(resources::commands())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_global_flags_reach_subcommands() {
        let matches = command()
            .try_get_matches_from(["blackbean", "get", "health", "--cluster", "backup", "--timeout", "5"])
            .unwrap();
        let config = <Config as clap::FromArgMatches>::from_arg_matches(&matches).unwrap();
        assert_eq!(config.cluster.as_deref(), Some("backup"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
