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

use actix_web::{App, HttpServer};

use crate::infra::config::CONFIG;

pub mod request;
pub mod router;

/// Starts the read-only query API on its own thread with its own runtime so
/// it keeps answering while the dispatcher task is busy.
pub fn init() -> std::io::Result<std::thread::JoinHandle<std::io::Result<()>>> {
    std::thread::Builder::new()
        .name("http-query".to_string())
        .spawn(|| {
            actix_web::rt::System::new().block_on(async {
                log::info!(
                    "Listening on port {} for REST API requests",
                    CONFIG.http.port
                );
                HttpServer::new(|| App::new().configure(router::get_service_routes))
                    .bind(("0.0.0.0", CONFIG.http.port))?
                    .disable_signals()
                    .run()
                    .await
            })
        })
}
