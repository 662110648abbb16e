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

use bytes::Bytes;

use shelterobserve::common::json;
use shelterobserve::infra::db;
use shelterobserve::infra::errors::{DbError, Error};
use shelterobserve::infra::ider::{self, IdFamily};
use shelterobserve::meta;
use shelterobserve::meta::supplies::SuppliesDelta;
use shelterobserve::service::supplies;

static START: Once = Once::new();

fn setup() {
    START.call_once(|| {
        std::env::set_var("SO_DATA_DIR", "./data/store/");
        let _ = std::fs::remove_dir_all("./data/store");
        log::info!("setup Invoked");
    });
}

#[tokio::test]
async fn store_test() {
    setup();

    put_get_delete().await;
    scan_is_ordered().await;
    value_and_key_scans().await;
    bootstrap_is_idempotent().await;
    apply_saturates_through_the_store().await;
    rehydration_resumes_after_the_last_id().await;

    log::info!("Tear Down Invoked");
    std::fs::remove_dir_all("./data/store").unwrap();
}

async fn put_get_delete() {
    db::DEFAULT.put("probe", Bytes::from_static(b"one")).await.unwrap();
    assert_eq!(
        db::DEFAULT.get("probe").await.unwrap().unwrap().as_ref(),
        b"one"
    );

    // a missing key is not an error on reads
    assert!(db::DEFAULT.get("absent").await.unwrap().is_none());

    db::DEFAULT.delete("probe").await.unwrap();
    assert!(db::DEFAULT.get("probe").await.unwrap().is_none());
    let err = db::DEFAULT.delete("probe").await.unwrap_err();
    assert!(matches!(err, Error::Db(DbError::KeyNotExists(_))));
}

async fn scan_is_ordered() {
    for key in ["row_b", "row_c", "row_a"] {
        db::DEFAULT
            .put(key, Bytes::from(key.to_string()))
            .await
            .unwrap();
    }
    let rows = db::DEFAULT.scan("row_").await.unwrap();
    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["row_a", "row_b", "row_c"]);
}

async fn value_and_key_scans() {
    db::DEFAULT
        .put("scan_1_x", Bytes::from_static(b"GATE OPEN"))
        .await
        .unwrap();
    db::DEFAULT
        .put("scan_2_y", Bytes::from_static(b"GATE CLOSED"))
        .await
        .unwrap();
    db::DEFAULT
        .put("other_3_x", Bytes::from_static(b"GATE OPEN"))
        .await
        .unwrap();

    assert_eq!(db::DEFAULT.count_values_containing("GATE").await.unwrap(), 3);
    assert_eq!(db::DEFAULT.count_values_containing("OPEN").await.unwrap(), 2);
    assert_eq!(db::DEFAULT.count_values_containing("FOG").await.unwrap(), 0);

    let rows = db::DEFAULT
        .scan_keys_containing_all(&["scan_".to_string(), "_x".to_string()])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "scan_1_x");

    let rows = db::DEFAULT
        .scan_keys_containing_all(&["nothing_like_this".to_string()])
        .await
        .unwrap();
    assert!(rows.is_empty());
}

async fn bootstrap_is_idempotent() {
    supplies::bootstrap().await.unwrap();
    let zeros = supplies::read().await.unwrap();
    assert_eq!(zeros.food.meat, 0);
    assert_eq!(zeros.medicine.bandages, 0);

    let delta: SuppliesDelta = json::from_str(r#"{"food":{"meat":5}}"#).unwrap();
    supplies::apply(&delta).await.unwrap();

    // a second bootstrap must not reset existing aggregates
    supplies::bootstrap().await.unwrap();
    assert_eq!(supplies::read().await.unwrap().food.meat, 5);
}

async fn apply_saturates_through_the_store() {
    let delta: SuppliesDelta =
        json::from_str(r#"{"food":{"meat":-50,"water":2},"medicine":{"analgesics":1}}"#).unwrap();
    let snapshot = supplies::apply(&delta).await.unwrap();
    assert_eq!(snapshot.food.meat, 0);
    assert_eq!(snapshot.food.water, 2);
    assert_eq!(snapshot.medicine.analgesics, 1);

    // the rewritten aggregates are what the next read sees
    let reread = supplies::read().await.unwrap();
    assert_eq!(reread, snapshot);
}

async fn rehydration_resumes_after_the_last_id() {
    db::DEFAULT
        .put(meta::LAST_ALERT_ID_KEY, Bytes::from_static(b"00007"))
        .await
        .unwrap();
    ider::init().await.unwrap();
    assert_eq!(ider::next(IdFamily::Alerts), "00008");
    assert_eq!(ider::next(IdFamily::Alerts), "00009");

    // families missing from the store get seeded and start at 1
    assert_eq!(
        db::DEFAULT
            .get(meta::LAST_NOTIF_ID_KEY)
            .await
            .unwrap()
            .unwrap()
            .as_ref(),
        b"0"
    );
    assert_eq!(ider::next(IdFamily::Notifications), "00001");
}
