// Copyright 2022 Zinc Labs Inc. and Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use shelterobserve::common::{file, logger};
use shelterobserve::handler::{http, tcp_udp};
use shelterobserve::infra::config::CONFIG;
use shelterobserve::infra::{db, ider};
use shelterobserve::meta;
use shelterobserve::service::supplies;
use shelterobserve::{cli, job};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let (tcp_port, udp_port) = cli::args()?;
    logger::init();
    log::info!("Server started");

    for dir in [
        &CONFIG.image.input_dir,
        &CONFIG.image.zip_dir,
        &CONFIG.image.output_dir,
    ] {
        file::ensure_dir(dir)?;
    }

    // boot-time store state: aggregates, id counters, last event
    supplies::bootstrap().await?;
    ider::init().await?;
    db::DEFAULT
        .put(meta::LAST_EVENT_KEY, Bytes::from_static(b"Server just started"))
        .await?;

    let shutdown = CancellationToken::new();
    http::init()?;
    // the dispatcher owns the FIFO read end and the emergency socket, so it
    // must be bound before the producers start
    let dispatcher = tcp_udp::Dispatcher::bind(tcp_port, udp_port, shutdown.clone()).await?;
    job::init(shutdown.clone()).await?;

    dispatcher.run().await?;
    log::info!("Server turned off");
    Ok(())
}
