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

use std::sync::Once;

use actix_web::{test, App};

use shelterobserve::common::json;
use shelterobserve::handler::http::router::get_service_routes;
use shelterobserve::infra::ider;
use shelterobserve::meta::supplies::SuppliesDelta;
use shelterobserve::service::{alerts, supplies};

static START: Once = Once::new();

fn setup() {
    START.call_once(|| {
        std::env::set_var("SO_DATA_DIR", "./data/http/");
        let _ = std::fs::remove_dir_all("./data/http");
        log::info!("setup Invoked");
    });
}

#[actix_web::test]
async fn http_api_test() {
    setup();
    supplies::bootstrap().await.unwrap();
    ider::init().await.unwrap();

    let app = test::init_service(App::new().configure(get_service_routes)).await;

    // empty store: no history yet, no latest pointer
    let req = test::TestRequest::get().uri("/supplies").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(body, "No supplies found");

    let req = test::TestRequest::get()
        .uri("/supplies?id=latest")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get().uri("/alerts").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(test::read_body(resp).await.is_empty());

    // seed two alerts and one supplies update
    alerts::save("NORTH ENTRY, ALERT, 39.2°C ").await.unwrap();
    alerts::save("EAST ENTRY, ALERT, 40.0°C ").await.unwrap();
    let delta: SuppliesDelta =
        json::from_str(r#"{"food":{"meat":3},"medicine":{"bandages":1}}"#).unwrap();
    let snapshot = supplies::apply(&delta).await.unwrap();
    let supplies_id = supplies::record_update(&snapshot, "Update request from test")
        .await
        .unwrap();
    assert_eq!(supplies_id, "00001");

    // all alerts, one {key: value} object per line
    let req = test::TestRequest::get().uri("/alerts").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    let lines: Vec<&str> = body.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let record: json::Value = json::from_str(line).unwrap();
        let (key, value) = record.as_object().unwrap().iter().next().unwrap();
        assert!(key.starts_with("alert_"));
        assert!(value.as_str().unwrap().contains("ALERT"));
    }

    // alerts filtered by id
    let req = test::TestRequest::get()
        .uri("/alerts?id=00001")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("alert_00001_"));
    assert!(!body.contains("alert_00002_"));

    let req = test::TestRequest::get()
        .uri("/alerts?id=99999")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(body, "ID not found");

    // unknown parameters are rejected on every route
    for uri in ["/alerts?foo=1", "/alerts?id=1&foo=2", "/supplies?foo=1"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "expected 400 for {uri}");
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert_eq!(body, "Only 'id' parameter is accepted");
    }

    // all supplies updates as a parsed array
    let req = test::TestRequest::get().uri("/supplies").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: json::Value = json::from_slice(&test::read_body(resp).await).unwrap();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["food"]["meat"], 3);
    assert_eq!(rows[0]["medicine"]["bandages"], 1);

    // latest pointer
    let req = test::TestRequest::get()
        .uri("/supplies?id=latest")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: json::Value = json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["food"]["meat"], 3);
    assert_eq!(body["food"]["water"], 0);

    // the id filter carries a doubled underscore and can never match a
    // stored key; this pins that behavior until the API owner resolves it
    let req = test::TestRequest::get()
        .uri("/supplies?id=00001")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(body, "ID not found");

    log::info!("Tear Down Invoked");
    std::fs::remove_dir_all("./data/http").unwrap();
}
