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

use tokio_util::sync::CancellationToken;

pub mod alerts;
pub mod power;

/// Spawns the long-lived producer tasks. They talk to the dispatcher only
/// through the filesystem (the alert FIFO and the emergency socket) and stop
/// when the token is cancelled.
pub async fn init(shutdown: CancellationToken) -> Result<(), anyhow::Error> {
    tokio::task::spawn(alerts::run(shutdown.clone()));
    tokio::task::spawn(power::run(shutdown));
    Ok(())
}
