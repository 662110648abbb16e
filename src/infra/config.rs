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

use dotenv_config::EnvConfig;
use dotenvy::dotenv_override;
use lazy_static::lazy_static;

pub static DEFAULT_PORT: u16 = 5005;

lazy_static! {
    pub static ref CONFIG: Config = init();
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Config {
    pub common: Common,
    pub net: Net,
    pub http: Http,
    pub sled: Sled,
    pub image: Image,
    pub alert: Alert,
    pub emergency: Emergency,
    pub log: Log,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Common {
    #[env_config(name = "SO_DATA_DIR", default = "./data/")]
    pub data_dir: String,
    #[env_config(name = "SO_ADMIN_USER", default = "ubuntu")]
    pub admin_user: String,
    #[env_config(name = "SO_MAX_TCP_CLIENTS", default = 10)]
    pub max_tcp_clients: usize,
    #[env_config(name = "SO_MAX_UDP_PEERS", default = 10)]
    pub max_udp_peers: usize,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Net {
    // CLI `-p tcp <port>` / `-p udp <port>` takes precedence over these
    #[env_config(name = "SO_TCP_PORT", default = 5005)]
    pub tcp_port: u16,
    #[env_config(name = "SO_UDP_PORT", default = 5005)]
    pub udp_port: u16,
    #[env_config(name = "SO_TCP_BACKLOG", default = 10)]
    pub backlog: i32,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Http {
    #[env_config(name = "SO_HTTP_PORT", default = 8011)]
    pub port: u16,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Sled {
    #[env_config(name = "SO_SLED_DATA_DIR", default = "")]
    pub data_dir: String,
    #[env_config(name = "SO_SLED_PREFIX", default = "")]
    pub prefix: String,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Image {
    #[env_config(name = "SO_IMAGE_INPUT_DIR", default = "../img/inputImg/")]
    pub input_dir: String,
    #[env_config(name = "SO_IMAGE_ZIP_DIR", default = "../img/zipFiles/")]
    pub zip_dir: String,
    #[env_config(name = "SO_IMAGE_OUTPUT_DIR", default = "../img/outputImg/")]
    pub output_dir: String,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Alert {
    #[env_config(name = "SO_ALERT_FIFO", default = "/tmp/alerts_fifo2")]
    pub fifo_path: String,
    #[env_config(name = "SO_ALERT_INTERVAL", default = 30)]
    pub interval_secs: u64,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Emergency {
    #[env_config(name = "SO_EMERGENCY_SOCKET", default = "/tmp/refugie_unix_socket")]
    pub socket_path: String,
    #[env_config(name = "SO_EMERGENCY_MIN_DELAY_MINS", default = 5)]
    pub min_delay_mins: u64,
    #[env_config(name = "SO_EMERGENCY_MAX_DELAY_MINS", default = 10)]
    pub max_delay_mins: u64,
}

#[derive(Clone, Debug, EnvConfig)]
pub struct Log {
    #[env_config(name = "SO_LOG_LEVEL", default = "info")]
    pub level: String,
    // empty means `$HOME/.refuge/`, resolved in init()
    #[env_config(name = "SO_LOG_DIR", default = "")]
    pub dir: String,
    #[env_config(name = "SO_LOG_FILE_NAME", default = "refuge_lab2.log")]
    pub file_name: String,
}

pub fn init() -> Config {
    dotenv_override().ok();
    let mut cfg = Config::init().unwrap();

    if let Err(e) = check_path_config(&mut cfg) {
        panic!("data path config error: {}", e);
    }
    if cfg.emergency.min_delay_mins > cfg.emergency.max_delay_mins {
        panic!("emergency delay config error: min delay greater than max delay");
    }
    cfg
}

fn check_path_config(cfg: &mut Config) -> Result<(), anyhow::Error> {
    if cfg.common.data_dir.is_empty() {
        cfg.common.data_dir = "./data/".to_string();
    }
    if !cfg.common.data_dir.ends_with('/') {
        cfg.common.data_dir = format!("{}/", cfg.common.data_dir);
    }
    if cfg.sled.data_dir.is_empty() {
        cfg.sled.data_dir = format!("{}database/", cfg.common.data_dir);
    }
    if !cfg.sled.data_dir.ends_with('/') {
        cfg.sled.data_dir = format!("{}/", cfg.sled.data_dir);
    }
    for dir in [
        &mut cfg.image.input_dir,
        &mut cfg.image.zip_dir,
        &mut cfg.image.output_dir,
    ] {
        if !dir.ends_with('/') {
            dir.push('/');
        }
    }
    if cfg.log.dir.is_empty() {
        if let Ok(home) = std::env::var("HOME") {
            cfg.log.dir = format!("{home}/.refuge/");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = init();
        assert_eq!(cfg.http.port, 8011);
        assert_eq!(cfg.common.admin_user, "ubuntu");
        assert_eq!(cfg.common.max_tcp_clients, 10);
        assert!(cfg.common.data_dir.ends_with('/'));
        assert!(cfg.sled.data_dir.ends_with('/'));
        assert!(cfg.emergency.min_delay_mins <= cfg.emergency.max_delay_mins);
    }
}
