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

use crate::infra::config::CONFIG;
use crate::infra::errors::*;

lazy_static! {
    pub static ref SLED_CLIENT: ::sled::Db = connect_sled();
}

pub struct SledDb {
    prefix: String,
}

impl SledDb {
    pub fn new(prefix: &str) -> SledDb {
        let prefix = prefix.trim_end_matches('/');
        SledDb {
            prefix: prefix.to_string(),
        }
    }

    fn strip(&self, key: String) -> String {
        match key.strip_prefix(&self.prefix) {
            Some(stripped) => stripped.to_string(),
            None => key,
        }
    }
}

impl Default for SledDb {
    fn default() -> Self {
        Self::new(&CONFIG.sled.prefix)
    }
}

#[async_trait]
impl super::Db for SledDb {
    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        let key = format!("{}{}", self.prefix, key);
        let client = SLED_CLIENT.clone();
        client.insert(key.as_str(), value.to_vec())?;
        client.flush_async().await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let key = format!("{}{}", self.prefix, key);
        let ret = SLED_CLIENT.get(&key)?;
        Ok(ret.map(|v| Bytes::from(v.as_ref().to_vec())))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = format!("{}{}", self.prefix, key);
        let client = SLED_CLIENT.clone();
        if client.remove(&key)?.is_none() {
            return Err(Error::from(DbError::KeyNotExists(key)));
        }
        client.flush_async().await?;
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Bytes)>> {
        let key = format!("{}{}", self.prefix, prefix);
        let mut result = Vec::new();
        for item in SLED_CLIENT.scan_prefix(key) {
            let (k, v) = item?;
            let item_key = self.strip(String::from_utf8_lossy(k.as_ref()).to_string());
            result.push((item_key, Bytes::from(v.as_ref().to_vec())));
        }
        Ok(result)
    }

    async fn count_values_containing(&self, needle: &str) -> Result<usize> {
        let mut count = 0;
        for item in SLED_CLIENT.iter() {
            let (_k, v) = item?;
            if String::from_utf8_lossy(v.as_ref()).contains(needle) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn scan_keys_containing_all(
        &self,
        substrings: &[String],
    ) -> Result<Vec<(String, Bytes)>> {
        let mut result = Vec::new();
        for item in SLED_CLIENT.iter() {
            let (k, v) = item?;
            let item_key = self.strip(String::from_utf8_lossy(k.as_ref()).to_string());
            if substrings.iter().all(|s| item_key.contains(s.as_str())) {
                result.push((item_key, Bytes::from(v.as_ref().to_vec())));
            }
        }
        Ok(result)
    }
}

pub fn connect_sled() -> ::sled::Db {
    ::sled::open(&CONFIG.sled.data_dir).expect("sled db dir create failed")
}
