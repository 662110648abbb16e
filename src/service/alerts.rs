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

use super::supplies;
use crate::common::time;
use crate::infra::db;
use crate::infra::errors::Result;
use crate::infra::ider::{self, IdFamily};
use crate::meta;
use crate::meta::alerts::{Entry, EntrySummary};
use crate::meta::protocol::{LastKeepalived, Response};

/// Appends one alert record and bumps `last_alert`. `lastEvent` gets a
/// direction-free line so the per-entry counts keep matching the number of
/// alert records.
pub async fn save(line: &str) -> Result<String> {
    let id = ider::next(IdFamily::Alerts);
    let key = format!("{}{}_{}", meta::ALERT_KEY_PREFIX, id, time::timestamp());
    db::DEFAULT.put(&key, Bytes::from(line.to_string())).await?;
    db::DEFAULT
        .put(meta::LAST_ALERT_ID_KEY, Bytes::from(id))
        .await?;
    db::DEFAULT
        .put(
            meta::LAST_EVENT_KEY,
            Bytes::from_static(b"Sent alert notification to all connected clients"),
        )
        .await?;
    Ok(key)
}

/// Counts values containing each direction word over the whole store.
pub async fn entry_counts() -> Result<EntrySummary> {
    let mut summary = EntrySummary::default();
    for entry in Entry::ALL {
        let count = db::DEFAULT.count_values_containing(entry.needle()).await?;
        match entry {
            Entry::North => summary.north_entry = count,
            Entry::South => summary.south_entry = count,
            Entry::East => summary.east_entry = count,
            Entry::West => summary.west_entry = count,
        }
    }
    Ok(summary)
}

pub async fn last_event() -> Result<String> {
    Ok(db::DEFAULT
        .get(meta::LAST_EVENT_KEY)
        .await?
        .map(|v| String::from_utf8_lossy(v.as_ref()).to_string())
        .unwrap_or_default())
}

pub async fn summary() -> Result<Response> {
    Ok(Response::Summary {
        alerts: entry_counts().await?,
        supplies: supplies::read().await?,
        last_keepalived: LastKeepalived {
            last_event: last_event().await?,
        },
    })
}
