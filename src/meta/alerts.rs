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

use serde::{Deserialize, Serialize};

/// Shelter entry point, derived from a substring match on an alert record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    North,
    South,
    East,
    West,
}

impl Entry {
    pub const ALL: [Entry; 4] = [Entry::North, Entry::South, Entry::East, Entry::West];

    pub fn detect(message: &str) -> Option<Entry> {
        Entry::ALL
            .into_iter()
            .find(|entry| message.contains(entry.needle()))
    }

    /// The direction word carried by alert records for this entry.
    pub fn needle(&self) -> &'static str {
        match self {
            Entry::North => "NORTH",
            Entry::South => "SOUTH",
            Entry::East => "EAST",
            Entry::West => "WEST",
        }
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.needle())
    }
}

/// Per-entry alert counts carried in the summary response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub north_entry: usize,
    pub south_entry: usize,
    pub east_entry: usize,
    pub west_entry: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_entry() {
        assert_eq!(
            Entry::detect("NORTH ENTRY, ALERT, 39.2°C "),
            Some(Entry::North)
        );
        assert_eq!(
            Entry::detect("WEST ENTRY, ALERT, 40.0°C "),
            Some(Entry::West)
        );
        assert_eq!(Entry::detect("no direction here"), None);
    }
}
