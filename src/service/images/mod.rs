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

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::common::file;
use crate::infra::config::CONFIG;
use crate::infra::errors::{Error, Result};

pub mod canny;

pub const CANNY_RESULT: &str = "canny.png";

pub fn list() -> Result<Vec<String>> {
    file::list_files(&CONFIG.image.input_dir).map_err(|e| Error::Pipeline(e.to_string()))
}

/// Returns the archive path and byte length for the requested source image.
/// An archive already present under the same stem is reused; otherwise the
/// source is run through edge detection and the result compressed.
pub fn prepare_archive(image_name: &str) -> Result<(PathBuf, u64)> {
    let stem = image_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(image_name);
    let zip_path = Path::new(&CONFIG.image.zip_dir).join(format!("{stem}.zip"));
    if zip_path.is_file() {
        log::info!("[IMAGE] reusing cached archive for {image_name}");
    } else {
        let src = Path::new(&CONFIG.image.input_dir).join(image_name);
        let detector = canny::EdgeDetection::new(40.0, 80.0, 1.0);
        let edges = detector.detect(&src, Path::new(&CONFIG.image.output_dir))?;
        compress(&edges, &zip_path)?;
    }
    let size = file::file_size(&zip_path).map_err(|e| Error::Pipeline(e.to_string()))?;
    Ok((zip_path, size))
}

/// Gzip-compresses one file into `dst` as a single stream.
pub fn compress(src: &Path, dst: &Path) -> Result<()> {
    let mut data = Vec::new();
    File::open(src)
        .and_then(|mut f| f.read_to_end(&mut data))
        .map_err(|e| Error::Pipeline(format!("read {}: {e}", src.display())))?;
    let out = File::create(dst)
        .map_err(|e| Error::Pipeline(format!("create {}: {e}", dst.display())))?;
    let mut encoder = GzEncoder::new(out, Compression::default());
    encoder
        .write_all(&data)
        .map_err(|e| Error::Pipeline(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| Error::Pipeline(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    #[test]
    fn test_compress_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("plain.bin");
        let dst = dir.path().join("plain.zip");
        let payload = b"shelter archive payload".repeat(64);
        std::fs::write(&src, &payload).unwrap();

        compress(&src, &dst).unwrap();

        let mut decoder = GzDecoder::new(File::open(&dst).unwrap());
        let mut restored = Vec::new();
        decoder.read_to_end(&mut restored).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn test_compress_missing_source_is_a_pipeline_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compress(&dir.path().join("nope.png"), &dir.path().join("nope.zip"))
            .unwrap_err();
        assert!(matches!(err, Error::Pipeline(_)));
    }
}
