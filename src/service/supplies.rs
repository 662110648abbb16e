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

use crate::common::{json, time};
use crate::infra::db;
use crate::infra::errors::Result;
use crate::infra::ider::{self, IdFamily};
use crate::meta;
use crate::meta::supplies::{FoodSupply, MedicineSupply, SuppliesDelta, SuppliesSnapshot};

/// Writes the all-zero aggregates on first start so `food` and `medicine`
/// always exist.
pub async fn bootstrap() -> Result<()> {
    if db::DEFAULT.get(meta::FOOD_KEY).await?.is_none() {
        let zero = json::to_vec(&FoodSupply::default())?;
        db::DEFAULT.put(meta::FOOD_KEY, Bytes::from(zero)).await?;
    }
    if db::DEFAULT.get(meta::MEDICINE_KEY).await?.is_none() {
        let zero = json::to_vec(&MedicineSupply::default())?;
        db::DEFAULT
            .put(meta::MEDICINE_KEY, Bytes::from(zero))
            .await?;
    }
    Ok(())
}

pub async fn read() -> Result<SuppliesSnapshot> {
    let food = match db::DEFAULT.get(meta::FOOD_KEY).await? {
        Some(v) => json::from_slice(v.as_ref())?,
        None => FoodSupply::default(),
    };
    let medicine = match db::DEFAULT.get(meta::MEDICINE_KEY).await? {
        Some(v) => json::from_slice(v.as_ref())?,
        None => MedicineSupply::default(),
    };
    Ok(SuppliesSnapshot { food, medicine })
}

/// Read-modify-write of both aggregates. Deltas saturate at zero on the
/// negative side; the rewritten snapshot is returned for the caller to
/// persist with [`record_update`].
pub async fn apply(delta: &SuppliesDelta) -> Result<SuppliesSnapshot> {
    let mut snapshot = read().await?;
    snapshot.apply(delta);
    db::DEFAULT
        .put(
            meta::FOOD_KEY,
            Bytes::from(json::to_vec(&snapshot.food)?),
        )
        .await?;
    db::DEFAULT
        .put(
            meta::MEDICINE_KEY,
            Bytes::from(json::to_vec(&snapshot.medicine)?),
        )
        .await?;
    Ok(snapshot)
}

/// Appends the snapshot to the supplies history and refreshes the
/// `latestSupplies` / `last_supplies` / `lastEvent` pointers. Returns the id
/// assigned to the history record.
pub async fn record_update(snapshot: &SuppliesSnapshot, event: &str) -> Result<String> {
    let id = ider::next(IdFamily::Supplies);
    let key = format!("{}{}_{}", meta::SUPPLIES_KEY_PREFIX, id, time::timestamp());
    let serialized = json::to_string(snapshot)?;
    db::DEFAULT
        .put(&key, Bytes::from(serialized.clone()))
        .await?;
    db::DEFAULT
        .put(meta::LATEST_SUPPLIES_KEY, Bytes::from(serialized))
        .await?;
    db::DEFAULT
        .put(meta::LAST_SUPPLIES_ID_KEY, Bytes::from(id.clone()))
        .await?;
    db::DEFAULT
        .put(meta::LAST_EVENT_KEY, Bytes::from(event.to_string()))
        .await?;
    log::info!("Supplies update written to store with key: {key}");
    Ok(id)
}
