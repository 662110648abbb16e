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

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;

use super::StreamClient;
use crate::common::json;
use crate::infra::config::CONFIG;
use crate::infra::db;
use crate::infra::errors::{Error, Result};
use crate::meta;
use crate::meta::protocol::{Request, Response};
use crate::meta::supplies::SuppliesDelta;
use crate::service::{alerts, images, supplies};

async fn note_last_event(line: &str) {
    if let Err(e) = db::DEFAULT
        .put(meta::LAST_EVENT_KEY, Bytes::from(line.to_string()))
        .await
    {
        log::error!("Error writing last event to store: {e}");
    }
}

/// Stream-carrier request dispatch. Responses go back on the session's own
/// descriptor, in request order.
pub async fn handle_stream_request(client: &mut StreamClient, request: Request) -> Result<()> {
    match request {
        Request::Authenticate { hostname } => {
            let ip = client.display_ip();
            if hostname == CONFIG.common.admin_user {
                client.authenticated = true;
                log::info!("TCP client {ip} authenticated successfully");
                client.send(&Response::AuthSuccess).await
            } else {
                log::info!("TCP client {ip} authentication failed: invalid hostname");
                client.send(&Response::AuthFailure).await
            }
        }
        Request::Status => {
            let line = format!("Status request from TCP client {}", client.display_ip());
            log::info!("{line}");
            let snapshot = supplies::read().await?;
            note_last_event(&line).await;
            client
                .send(&Response::Supplies {
                    food: snapshot.food,
                    medicine: snapshot.medicine,
                })
                .await
        }
        Request::Update { food, medicine, .. } => {
            if !client.authenticated {
                log::warn!(
                    "Rejected update from TCP client {}: {}",
                    client.display_ip(),
                    Error::AuthRequired
                );
                return Ok(());
            }
            let line = format!(
                "Update request from authenticated TCP client {}",
                client.display_ip()
            );
            log::info!("{line}");
            let snapshot = supplies::apply(&SuppliesDelta { food, medicine }).await?;
            supplies::record_update(&snapshot, &line).await?;
            Ok(())
        }
        Request::Summary => {
            log::info!("Summary request from TCP client {}", client.display_ip());
            let summary = alerts::summary().await?;
            client.send(&summary).await
        }
        Request::RequestAvailableImages => {
            log::info!("Request for available images received from TCP client");
            let images = images::list()?;
            client.send(&Response::ImageList { images }).await
        }
        Request::ImageSelection { image } => {
            log::info!("Client selected image: {image}");
            let (path, size) = match images::prepare_archive(&image) {
                Ok(ret) => ret,
                Err(e) => {
                    // the announcement pair is withheld so the client times
                    // out instead of waiting on a body that never comes
                    log::error!("[IMAGE] {e}");
                    return Ok(());
                }
            };
            client.send(&Response::FileSize { size }).await?;
            client.send(&Response::ZipReady).await?;
            // give slow clients a moment to switch to the raw byte phase
            tokio::time::sleep(Duration::from_secs(1)).await;
            let body = tokio::fs::read(&path).await?;
            client.send_raw(&body).await
        }
    }
}

/// Datagram-carrier request dispatch. There is no session state; `update`
/// authenticates per message via its `hostname` field.
pub async fn handle_datagram_request(
    udp: &UdpSocket,
    peer: SocketAddr,
    request: Request,
) -> Result<()> {
    let ip = super::display_ip(&peer);
    match request {
        Request::Update {
            food,
            medicine,
            hostname,
        } => {
            if hostname.as_deref() == Some(CONFIG.common.admin_user.as_str()) {
                let line = format!("Update request from authenticated UDP client {ip}");
                log::info!("{line}");
                let snapshot = supplies::apply(&SuppliesDelta { food, medicine }).await?;
                supplies::record_update(&snapshot, &line).await?;
            } else {
                log::warn!("Update request from not authenticated UDP client {ip}");
            }
            Ok(())
        }
        Request::Status => {
            let line = format!("Status request from UDP client {ip}");
            log::info!("{line}");
            let snapshot = supplies::read().await?;
            note_last_event(&line).await;
            // the datagram status reply is the bare snapshot, no message tag
            udp.send_to(&json::to_vec(&snapshot)?, peer).await?;
            Ok(())
        }
        Request::Summary => {
            log::info!("Summary request from UDP client {ip}");
            let summary = alerts::summary().await?;
            udp.send_to(&json::to_vec(&summary)?, peer).await?;
            Ok(())
        }
        Request::Authenticate { .. }
        | Request::RequestAvailableImages
        | Request::ImageSelection { .. } => {
            log::warn!("Invalid request received from UDP client {ip}");
            Ok(())
        }
    }
}
