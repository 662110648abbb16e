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

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use super::db;
use super::errors::Result;
use crate::meta;

/// Record families with their own monotonic id sequence.
#[derive(Clone, Copy, Debug)]
pub enum IdFamily {
    Supplies,
    Alerts,
    Notifications,
}

impl IdFamily {
    pub fn last_id_key(&self) -> &'static str {
        match self {
            IdFamily::Supplies => meta::LAST_SUPPLIES_ID_KEY,
            IdFamily::Alerts => meta::LAST_ALERT_ID_KEY,
            IdFamily::Notifications => meta::LAST_NOTIF_ID_KEY,
        }
    }

    fn index(&self) -> usize {
        match self {
            IdFamily::Supplies => 0,
            IdFamily::Alerts => 1,
            IdFamily::Notifications => 2,
        }
    }
}

static COUNTERS: [AtomicU64; 3] = [
    AtomicU64::new(1),
    AtomicU64::new(1),
    AtomicU64::new(1),
];

/// Rehydrates every family counter from its persisted `last_*` key. A family
/// whose key is missing gets the key seeded with `0` so a later restart sees
/// the same shape. Counters resume at `last + 1`, keeping ids monotonic
/// across restarts.
pub async fn init() -> Result<()> {
    for family in [IdFamily::Supplies, IdFamily::Alerts, IdFamily::Notifications] {
        let last = match db::DEFAULT.get(family.last_id_key()).await? {
            Some(v) => String::from_utf8_lossy(v.as_ref())
                .trim()
                .parse::<u64>()
                .unwrap_or(0),
            None => {
                db::DEFAULT
                    .put(family.last_id_key(), Bytes::from_static(b"0"))
                    .await?;
                0
            }
        };
        COUNTERS[family.index()].store(last + 1, Ordering::SeqCst);
    }
    Ok(())
}

/// Returns the current id for the family as a zero-padded decimal string and
/// advances the counter.
pub fn next(family: IdFamily) -> String {
    format!("{:05}", COUNTERS[family.index()].fetch_add(1, Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_is_monotonic_and_padded() {
        let first = next(IdFamily::Alerts);
        let second = next(IdFamily::Alerts);
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        assert!(second.parse::<u64>().unwrap() > first.parse::<u64>().unwrap());
    }

    #[test]
    fn test_families_are_independent() {
        let supplies = next(IdFamily::Supplies).parse::<u64>().unwrap();
        next(IdFamily::Notifications);
        next(IdFamily::Notifications);
        assert_eq!(
            next(IdFamily::Supplies).parse::<u64>().unwrap(),
            supplies + 1
        );
    }
}
