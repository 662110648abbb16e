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

pub mod alerts;
pub mod protocol;
pub mod supplies;

// key schema of the embedded store
pub const FOOD_KEY: &str = "food";
pub const MEDICINE_KEY: &str = "medicine";
pub const ALERT_KEY_PREFIX: &str = "alert_";
pub const SUPPLIES_KEY_PREFIX: &str = "supplies_";
pub const EMERGENCY_NOTIF_KEY_PREFIX: &str = "emergencyNotification_";
pub const LAST_ALERT_ID_KEY: &str = "last_alert";
pub const LAST_SUPPLIES_ID_KEY: &str = "last_supplies";
pub const LAST_NOTIF_ID_KEY: &str = "last_notif";
pub const LAST_EVENT_KEY: &str = "lastEvent";
pub const LATEST_SUPPLIES_KEY: &str = "latestSupplies";
