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

/// Bracketed local timestamp used in record keys and log lines.
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("[%Y-%m-%d %H:%M:%S]")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 21);
        assert!(ts.starts_with('['));
        assert!(ts.ends_with(']'));
        assert_eq!(&ts[5..6], "-");
        assert_eq!(&ts[11..12], " ");
    }
}
