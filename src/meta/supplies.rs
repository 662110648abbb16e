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

use serde::{Deserialize, Deserializer, Serialize};

use crate::common::json;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodSupply {
    pub meat: u64,
    pub vegetables: u64,
    pub fruits: u64,
    pub water: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineSupply {
    pub antibiotics: u64,
    pub analgesics: u64,
    pub bandages: u64,
}

/// Both aggregates at an instant; serialized form is the
/// SuppliesSnapshotRecord stored under `supplies_<id>_<timestamp>` and
/// `latestSupplies`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppliesSnapshot {
    pub food: FoodSupply,
    pub medicine: MedicineSupply,
}

/// Partial update document. Unknown field names are ignored by construction;
/// a field carrying anything but a JSON integer deserializes to `None` and
/// is ignored as well.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuppliesDelta {
    #[serde(default)]
    pub food: Option<FoodDelta>,
    #[serde(default)]
    pub medicine: Option<MedicineDelta>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FoodDelta {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub meat: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub vegetables: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub fruits: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub water: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MedicineDelta {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub antibiotics: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub analgesics: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub bandages: Option<i64>,
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(json::Value::deserialize(deserializer)?.as_i64())
}

impl SuppliesSnapshot {
    /// Applies the delta field by field, clamping at zero on the negative
    /// side only.
    pub fn apply(&mut self, delta: &SuppliesDelta) {
        if let Some(food) = &delta.food {
            apply_field(&mut self.food.meat, food.meat);
            apply_field(&mut self.food.vegetables, food.vegetables);
            apply_field(&mut self.food.fruits, food.fruits);
            apply_field(&mut self.food.water, food.water);
        }
        if let Some(medicine) = &delta.medicine {
            apply_field(&mut self.medicine.antibiotics, medicine.antibiotics);
            apply_field(&mut self.medicine.analgesics, medicine.analgesics);
            apply_field(&mut self.medicine.bandages, medicine.bandages);
        }
    }
}

fn apply_field(current: &mut u64, delta: Option<i64>) {
    if let Some(delta) = delta {
        *current = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as u64)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_saturates_at_zero() {
        let mut snapshot = SuppliesSnapshot::default();
        let delta: SuppliesDelta =
            json::from_str(r#"{"food":{"meat":3,"water":-2}}"#).unwrap();
        snapshot.apply(&delta);
        assert_eq!(snapshot.food.meat, 3);
        assert_eq!(snapshot.food.water, 0);
        assert_eq!(snapshot.food.vegetables, 0);
        assert_eq!(snapshot.medicine.antibiotics, 0);

        let delta: SuppliesDelta =
            json::from_str(r#"{"food":{"meat":-1},"medicine":{"bandages":7}}"#).unwrap();
        snapshot.apply(&delta);
        assert_eq!(snapshot.food.meat, 2);
        assert_eq!(snapshot.medicine.bandages, 7);
    }

    #[test]
    fn test_delta_ignores_unknown_and_non_integer_fields() {
        let delta: SuppliesDelta = json::from_str(
            r#"{"food":{"meat":"plenty","caviar":9,"water":1.5},"message":"update"}"#,
        )
        .unwrap();
        let mut snapshot = SuppliesSnapshot::default();
        snapshot.food.meat = 5;
        snapshot.apply(&delta);
        assert_eq!(snapshot.food.meat, 5);
        assert_eq!(snapshot.food.water, 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = SuppliesSnapshot {
            food: FoodSupply {
                meat: 1,
                vegetables: 2,
                fruits: 3,
                water: 4,
            },
            medicine: MedicineSupply {
                antibiotics: 5,
                analgesics: 6,
                bandages: 7,
            },
        };
        let text = json::to_string(&snapshot).unwrap();
        assert_eq!(json::from_str::<SuppliesSnapshot>(&text).unwrap(), snapshot);
    }
}
