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

mod cmd;
mod logger;

use std::process::ExitCode;

use clap::{ArgMatches, FromArgMatches as _};
use dotenv::dotenv;
use resources::config::ConfigFile;
use resources::prompt::TerminalPrompt;
use resources::{BeanError, Context, client};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::cmd::{Completion, Config, Current, UseCluster};

fn main() -> ExitCode {
    // Completion providers start their own runtime, so this must run first.
    clap_complete::CompleteEnv::with_factory(cmd::command).complete();
    dotenv().ok();

    let matches = cmd::command().get_matches();
    let config = match Config::from_arg_matches(&matches) {
        Ok(config) => config,
        Err(err) => err.exit(),
    };
    logger::init_logger(config.verbose);

    match run(&matches, &config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches, config: &Config) -> Result<ExitCode, BeanError> {
    let message = match matches.subcommand() {
        Some(("use", m)) => UseCluster::from_arg_matches(m)?.execute(config)?,
        Some(("current", m)) => Current::from_arg_matches(m)?.execute(config)?,
        Some(("completion", m)) => {
            Completion::from_arg_matches(m)?.execute();
            return Ok(ExitCode::SUCCESS);
        }
        _ => return send(matches, config),
    };
    println!("{message}");
    Ok(ExitCode::SUCCESS)
}

fn send(matches: &ArgMatches, config: &Config) -> Result<ExitCode, BeanError> {
    let file = ConfigFile::load(config.config.as_deref())?;
    let profile = file.profile(config.cluster.as_deref())?;
    tracing::debug!(url = %profile.url, username = %profile.username, "resolved cluster profile");

    let client = client::build_client(&profile, config.timeout)?;
    let ctx = Context::new(client, Box::new(TerminalPrompt));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let res = resources::run_command(matches, &ctx).await?;
        let status = res.status_code();
        let body = res.text().await?;
        print_body(&mut tokio::io::stdout(), body).await?;

        if !status.is_success() {
            tracing::debug!(%status, "cluster rejected the request");
            return Ok(ExitCode::FAILURE);
        }
        Ok::<_, BeanError>(ExitCode::SUCCESS)
    })
}

/// Writes a response body followed by a newline. A closed pipe is not an
/// error, so output can be cut short with `head`.
async fn print_body<W>(out: &mut W, mut body: String) -> Result<(), BeanError>
where
    W: AsyncWrite + Unpin,
{
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    let written = match out.write_all(body.as_bytes()).await {
        Ok(()) => out.flush().await,
        Err(err) => Err(err),
    };
    match written {
        Err(err) if err.kind() != std::io::ErrorKind::BrokenPipe => Err(BeanError::Io(err)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts every write and fails every flush.
    struct FailingFlush(io::ErrorKind);

    impl AsyncWrite for FailingFlush {
        fn poll_write(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::from(self.0)))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_body_gets_trailing_newline() {
        let mut out = Vec::new();
        print_body(&mut out, "green".to_string()).await.unwrap();
        print_body(&mut out, "yellow\n".to_string()).await.unwrap();
        assert_eq!(out, b"green\nyellow\n");
    }

    #[tokio::test]
    async fn test_flush_broken_pipe_is_ignored() {
        let mut out = FailingFlush(io::ErrorKind::BrokenPipe);
        assert!(print_body(&mut out, "green".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_flush_failure_is_reported() {
        let mut out = FailingFlush(io::ErrorKind::Other);
        assert!(matches!(
            print_body(&mut out, "green".to_string()).await,
            Err(BeanError::Io(_))
        ));
    }
}
