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

use actix_web::http::header::ContentType;
use actix_web::{get, web, HttpRequest, HttpResponse};
use std::io::Error;

use crate::common::json;
use crate::infra::db;
use crate::meta;

fn query_params(req: &HttpRequest) -> Vec<(String, String)> {
    web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_default()
}

/// Only the `id` parameter is accepted, and at most once.
fn reject_unknown_params(params: &[(String, String)]) -> Option<HttpResponse> {
    if params.len() > 1 || (params.len() == 1 && params[0].0 != "id") {
        return Some(
            HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body("Only 'id' parameter is accepted"),
        );
    }
    None
}

fn remote_ip(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/** GetAlerts */
#[get("/alerts")]
pub async fn alerts(req: HttpRequest) -> Result<HttpResponse, Error> {
    let params = query_params(&req);
    if let Some(rejected) = reject_unknown_params(&params) {
        return Ok(rejected);
    }
    log::info!(
        "Received request through API for alerts data from {}",
        remote_ip(&req)
    );

    let id = params.first().map(|(_, value)| value.clone());
    let mut needles = vec![meta::ALERT_KEY_PREFIX.to_string()];
    if let Some(id) = &id {
        needles.push(format!("_{id}_"));
    }
    let rows = match db::DEFAULT.scan_keys_containing_all(&needles).await {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Error scanning alerts: {e}");
            return Ok(HttpResponse::InternalServerError()
                .content_type(ContentType::plaintext())
                .body("store unavailable"));
        }
    };
    if id.is_some() && rows.is_empty() {
        return Ok(HttpResponse::NotFound()
            .content_type(ContentType::plaintext())
            .body("ID not found"));
    }

    let mut body = String::new();
    for (key, value) in rows {
        let mut record = json::Map::new();
        record.insert(
            key,
            json::Value::String(String::from_utf8_lossy(value.as_ref()).to_string()),
        );
        body.push_str(&json::Value::Object(record).to_string());
        body.push('\n');
    }
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/** GetSupplies */
#[get("/supplies")]
pub async fn supplies(req: HttpRequest) -> Result<HttpResponse, Error> {
    let params = query_params(&req);
    if let Some(rejected) = reject_unknown_params(&params) {
        return Ok(rejected);
    }
    log::info!(
        "Received request through API for supplies data from {}",
        remote_ip(&req)
    );

    let id = params.first().map(|(_, value)| value.clone());
    match id.as_deref() {
        None => {
            let rows = match db::DEFAULT
                .scan_keys_containing_all(&[meta::SUPPLIES_KEY_PREFIX.to_string()])
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    log::error!("Error scanning supplies: {e}");
                    return Ok(HttpResponse::InternalServerError()
                        .content_type(ContentType::plaintext())
                        .body("store unavailable"));
                }
            };
            if rows.is_empty() {
                return Ok(HttpResponse::NotFound()
                    .content_type(ContentType::json())
                    .body("No supplies found"));
            }
            Ok(HttpResponse::Ok()
                .content_type(ContentType::json())
                .body(parsed_values(&rows).to_string()))
        }
        Some("latest") => match db::DEFAULT.get(meta::LATEST_SUPPLIES_KEY).await {
            Ok(Some(value)) => {
                let parsed: json::Value = match json::from_slice(value.as_ref()) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        log::error!("Error parsing latest supplies: {e}");
                        return Ok(HttpResponse::InternalServerError()
                            .content_type(ContentType::plaintext())
                            .body("corrupt record"));
                    }
                };
                Ok(HttpResponse::Ok()
                    .content_type(ContentType::json())
                    .body(parsed.to_string()))
            }
            Ok(None) => Ok(HttpResponse::NotFound()
                .content_type(ContentType::json())
                .body("Latest supplies not found")),
            Err(e) => {
                log::error!("Error reading latest supplies: {e}");
                Ok(HttpResponse::InternalServerError()
                    .content_type(ContentType::plaintext())
                    .body("store unavailable"))
            }
        },
        Some(id) => {
            // the needle keeps the doubled underscore of the legacy API,
            // which matches no `supplies_<id>_<timestamp>` key
            let needles = vec![format!("{}_{id}_", meta::SUPPLIES_KEY_PREFIX)];
            let rows = match db::DEFAULT.scan_keys_containing_all(&needles).await {
                Ok(rows) => rows,
                Err(e) => {
                    log::error!("Error scanning supplies: {e}");
                    return Ok(HttpResponse::InternalServerError()
                        .content_type(ContentType::plaintext())
                        .body("store unavailable"));
                }
            };
            if rows.is_empty() {
                return Ok(HttpResponse::NotFound()
                    .content_type(ContentType::json())
                    .body("ID not found"));
            }
            Ok(HttpResponse::Ok()
                .content_type(ContentType::json())
                .body(parsed_values(&rows).to_string()))
        }
    }
}

fn parsed_values(rows: &[(String, bytes::Bytes)]) -> json::Value {
    json::Value::Array(
        rows.iter()
            .filter_map(|(_, value)| json::from_slice(value.as_ref()).ok())
            .collect(),
    )
}
