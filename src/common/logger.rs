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

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::infra::config::CONFIG;

/// Mirrors every log line to stderr while appending it to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = std::io::stderr().write_all(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = std::io::stderr().flush();
        self.file.flush()
    }
}

/// Initializes the global logger. Lines go to `<log.dir>/<log.file_name>` in
/// `[YYYY-MM-DD HH:MM:SS] <message>` form; when the log directory cannot be
/// resolved (no HOME) the logger degrades to stderr only.
pub fn init() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::new().default_filter_or(&CONFIG.log.level));
    builder.format(|buf, record| {
        writeln!(buf, "{} {}", crate::common::time::timestamp(), record.args())
    });
    match open_log_file() {
        Ok(Some(file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
        }
        Ok(None) => {
            eprintln!("log directory not resolvable (HOME unset), logging to stderr only");
        }
        Err(e) => {
            eprintln!("cannot open log file, logging to stderr only: {e}");
        }
    }
    let _ = builder.try_init();
}

fn open_log_file() -> std::io::Result<Option<File>> {
    if CONFIG.log.dir.is_empty() {
        return Ok(None);
    }
    std::fs::create_dir_all(&CONFIG.log.dir)?;
    let path = Path::new(&CONFIG.log.dir).join(&CONFIG.log.file_name);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Some(file))
}
