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

//! Cluster diagnostics through the `_cat` APIs.
use clap::{Command, CommandFactory, Parser, ValueEnum};
use elasticsearch::cat::{CatAllocationParts, CatIndicesParts, CatThreadPoolParts};
use elasticsearch::http::response::Response;
use elasticsearch::params::Bytes;

use crate::error::BeanError;
use crate::{Context, Executor};

const CACHE_MEMORY_COLUMNS: [&str; 6] = [
    "name",
    "queryCacheMemory",
    "queryCacheEvictions",
    "requestCacheMemory",
    "requestCacheHitCount",
    "request_cache.miss_count",
];

const SEGMENT_MEMORY_COLUMNS: [&str; 6] = [
    "name",
    "segments.memory",
    "segments.index_writer_memory",
    "fielddata.memory_size",
    "query_cache.memory_size",
    "request_cache.memory_size",
];

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Cluster health
    Health,
    /// Node list
    Nodes,
    /// Shard allocation and disk usage per node
    Allocations,
    /// Thread pool usage per node
    Threadpool,
    /// Query and request cache memory per node
    Cachemem,
    /// Segment, fielddata and cache memory per node
    Segmem,
    /// Indices ordered by store size, in gigabytes
    Largeindices,
}

#[derive(Parser, Debug)]
pub struct Cat {
    #[arg(value_enum, help = "Resource to show")]
    resource: Resource,
}

impl Cat {
    pub fn new_command() -> Command {
        Self::command()
            .name("get")
            .about("Show cluster health, node, allocation, thread pool, memory or index size tables")
    }
}

#[async_trait::async_trait]
impl Executor for Cat {
    async fn execute(&self, ctx: &Context) -> Result<Response, BeanError> {
        let cat = ctx.client.cat();
        let res = match self.resource {
            Resource::Health => cat.health().v(true).send().await?,
            Resource::Nodes => cat.nodes().v(true).send().await?,
            Resource::Allocations => {
                cat.allocation(CatAllocationParts::None)
                    .v(true)
                    .send()
                    .await?
            }
            Resource::Threadpool => {
                cat.thread_pool(CatThreadPoolParts::None)
                    .v(true)
                    .send()
                    .await?
            }
            Resource::Cachemem => {
                cat.nodes()
                    .v(true)
                    .h(&CACHE_MEMORY_COLUMNS)
                    .send()
                    .await?
            }
            Resource::Segmem => {
                cat.nodes()
                    .v(true)
                    .h(&SEGMENT_MEMORY_COLUMNS)
                    .send()
                    .await?
            }
            Resource::Largeindices => {
                cat.indices(CatIndicesParts::None)
                    .v(true)
                    .h(&["store.size", "index"])
                    .s(&["store.size:desc"])
                    .bytes(Bytes::Gb)
                    .send()
                    .await?
            }
        };
        Ok(res)
    }
}

pub fn command() -> Command {
    Cat::new_command()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_health() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_cat/health"))
            .and(query_param("v", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string("epoch status\n1 green\n"))
            .expect(1)
            .mount(&server)
            .await;

        let cmd = Cat::try_parse_from(["get", "health"]).unwrap();
        let res = cmd.execute(&ctx).await.unwrap();
        assert_eq!(res.text().await.unwrap(), "epoch status\n1 green\n");
    }

    #[tokio::test]
    async fn test_cache_memory_columns() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_cat/nodes"))
            .and(query_param("h", CACHE_MEMORY_COLUMNS.join(",")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Cat::try_parse_from(["get", "cachemem"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_large_indices_in_gigabytes() {
        let (server, ctx) = testing::context().await;
        Mock::given(method("GET"))
            .and(path("/_cat/indices"))
            .and(query_param("bytes", "gb"))
            .and(query_param("h", "store.size,index"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Cat::try_parse_from(["get", "largeindices"])
            .unwrap()
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[test]
    fn test_unknown_resource_is_rejected() {
        assert!(Cat::try_parse_from(["get", "shards"]).is_err());
    }
}
