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

use rand::Rng;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::infra::config::CONFIG;

pub const FAILURE_MESSAGE: &str = "Electricity failure. Disconnecting all clients.";

/// Power outage simulation: after a random 5-10 minute interval, connects to
/// the emergency socket and delivers the shutdown notice; repeats until
/// cancelled.
pub async fn run(shutdown: CancellationToken) -> Result<(), anyhow::Error> {
    loop {
        let minutes = random_failure_minutes();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = time::sleep(time::Duration::from_secs(minutes * 60)) => {}
        }
        match UnixStream::connect(&CONFIG.emergency.socket_path).await {
            Ok(mut stream) => {
                if let Err(e) = stream.write_all(FAILURE_MESSAGE.as_bytes()).await {
                    log::error!("[POWER] cannot send failure message: {e}");
                }
            }
            Err(e) => log::error!("[POWER] cannot reach emergency socket: {e}"),
        }
    }
    Ok(())
}

fn random_failure_minutes() -> u64 {
    rand::rng().random_range(CONFIG.emergency.min_delay_mins..=CONFIG.emergency.max_delay_mins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_interval_bounds() {
        for _ in 0..100 {
            let minutes = random_failure_minutes();
            assert!((5..=10).contains(&minutes));
        }
    }
}
