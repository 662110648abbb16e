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
use tokio::net::unix::pipe;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::infra::config::CONFIG;

const SENSOR_NAMES: [&str; 4] = ["NORTH ENTRY", "SOUTH ENTRY", "WEST ENTRY", "EAST ENTRY"];

const THRESHOLD_CELSIUS: f32 = 38.0;

// roughly one spike per sensor every couple of hours
const SPIKE_PROBABILITY: f32 = 0.001;

/// Temperature sensor simulation: samples every entry sensor on a fixed
/// interval and pushes a record into the alert FIFO whenever a reading
/// crosses the threshold.
pub async fn run(shutdown: CancellationToken) -> Result<(), anyhow::Error> {
    ensure_fifo(&CONFIG.alert.fifo_path)?;
    let mut interval = time::interval(time::Duration::from_secs(CONFIG.alert.interval_secs));
    interval.tick().await; // trigger the first run
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }
        for name in SENSOR_NAMES {
            let temperature = sample_temperature();
            if temperature > THRESHOLD_CELSIUS {
                if let Err(e) = send_alert(name, temperature).await {
                    log::error!("[ALERTS] cannot write alert to FIFO: {e}");
                }
            }
        }
    }
    Ok(())
}

/// Idempotent FIFO creation, mode 0666.
fn ensure_fifo(path: &str) -> Result<(), anyhow::Error> {
    match nix::unistd::mkfifo(path, nix::sys::stat::Mode::from_bits_truncate(0o666)) {
        Ok(()) | Err(nix::errno::Errno::EEXIST) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn sample_temperature() -> f32 {
    let mut rng = rand::rng();
    if rng.random::<f32>() < SPIKE_PROBABILITY {
        rng.random_range(38.0..=43.0)
    } else {
        rng.random_range(35.0..38.0)
    }
}

async fn send_alert(sensor_name: &str, temperature: f32) -> Result<(), anyhow::Error> {
    let mut sender = pipe::OpenOptions::new().open_sender(&CONFIG.alert.fifo_path)?;
    let record = format!("{sensor_name}, ALERT, {temperature:.1}°C ");
    sender.write_all(record.as_bytes()).await?;
    Ok(())
}
