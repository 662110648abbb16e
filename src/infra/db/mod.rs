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

use async_trait::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;

use super::errors::Result;

pub mod sled;

pub use self::sled::SLED_CLIENT;

lazy_static! {
    pub static ref DEFAULT: Box<dyn Db> = default();
}

pub fn default() -> Box<dyn Db> {
    Box::<sled::SledDb>::default()
}

/// The embedded ordered key/value store. One long-lived handle is shared by
/// the dispatcher, the services, and the HTTP query task; iteration order is
/// always lexicographic on the key bytes.
#[async_trait]
pub trait Db: Send + Sync + 'static {
    /// Durable before returning.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;
    /// A missing key is not an error.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Bytes)>>;
    /// Number of values (over the whole store) containing `needle`.
    async fn count_values_containing(&self, needle: &str) -> Result<usize>;
    /// Entries whose key contains every one of `substrings`.
    async fn scan_keys_containing_all(&self, substrings: &[String])
        -> Result<Vec<(String, Bytes)>>;
}
