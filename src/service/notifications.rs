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

use crate::common::time;
use crate::infra::db;
use crate::infra::errors::Result;
use crate::infra::ider::{self, IdFamily};
use crate::meta;

/// Appends one emergency-notification record and bumps `last_notif`.
pub async fn save(line: &str) -> Result<String> {
    let id = ider::next(IdFamily::Notifications);
    let key = format!(
        "{}{}_{}",
        meta::EMERGENCY_NOTIF_KEY_PREFIX,
        id,
        time::timestamp()
    );
    db::DEFAULT.put(&key, Bytes::from(line.to_string())).await?;
    db::DEFAULT
        .put(meta::LAST_NOTIF_ID_KEY, Bytes::from(id))
        .await?;
    db::DEFAULT
        .put(meta::LAST_EVENT_KEY, Bytes::from(line.to_string()))
        .await?;
    Ok(key)
}
