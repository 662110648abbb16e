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

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

use crate::infra::errors::{Error, Result};

const KERNEL_SIZE: usize = 3;

/// Canny edge detector, collaborator of the image pipeline. The contract is
/// `detect(src, out_dir)` leaving a single-channel result at
/// `<out_dir>/canny.png`.
pub struct EdgeDetection {
    low_threshold: f32,
    high_threshold: f32,
    sigma: f32,
}

impl EdgeDetection {
    pub fn new(low_threshold: f32, high_threshold: f32, sigma: f32) -> EdgeDetection {
        EdgeDetection {
            low_threshold,
            high_threshold,
            sigma,
        }
    }

    pub fn detect(&self, src: &Path, out_dir: &Path) -> Result<PathBuf> {
        let gray = image::open(src)
            .map_err(|e| Error::Pipeline(format!("load {}: {e}", src.display())))?
            .to_luma8();
        let blurred = self.gaussian_blur(&gray);
        let (magnitude, direction) = sobel(&blurred);
        let (width, height) = blurred.dimensions();
        let thinned = non_maximum_suppression(&magnitude, &direction, width, height);
        let edges = self.hysteresis(&thinned, width, height);

        let out = out_dir.join(super::CANNY_RESULT);
        edges
            .save(&out)
            .map_err(|e| Error::Pipeline(format!("save {}: {e}", out.display())))?;
        Ok(out)
    }

    fn gaussian_blur(&self, img: &GrayImage) -> GrayImage {
        let mut kernel = [[0f32; KERNEL_SIZE]; KERNEL_SIZE];
        let mean = (KERNEL_SIZE / 2) as f32;
        let mut accum = 0f32;
        for (x, row) in kernel.iter_mut().enumerate() {
            for (y, cell) in row.iter_mut().enumerate() {
                let dx = (x as f32 - mean) / self.sigma;
                let dy = (y as f32 - mean) / self.sigma;
                *cell = (-0.5 * (dx * dx + dy * dy)).exp()
                    / (2.0 * std::f32::consts::PI * self.sigma * self.sigma);
                accum += *cell;
            }
        }
        for row in kernel.iter_mut() {
            for cell in row.iter_mut() {
                *cell /= accum;
            }
        }

        let (width, height) = img.dimensions();
        let half = (KERNEL_SIZE / 2) as i64;
        let mut out = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0f32;
                for (ky, row) in kernel.iter().enumerate() {
                    for (kx, weight) in row.iter().enumerate() {
                        let px = (x as i64 + kx as i64 - half).clamp(0, width as i64 - 1);
                        let py = (y as i64 + ky as i64 - half).clamp(0, height as i64 - 1);
                        acc += img.get_pixel(px as u32, py as u32).0[0] as f32 * weight;
                    }
                }
                out.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
            }
        }
        out
    }

    /// Double threshold plus edge linking: pixels at or above the high
    /// threshold seed the result, weak pixels survive only when connected to
    /// a seed through their 8-neighborhood.
    fn hysteresis(&self, magnitude: &[f32], width: u32, height: u32) -> GrayImage {
        let idx = |x: u32, y: u32| (y * width + x) as usize;
        let mut edges = GrayImage::new(width, height);
        let mut stack = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if magnitude[idx(x, y)] >= self.high_threshold {
                    edges.put_pixel(x, y, Luma([255]));
                    stack.push((x, y));
                }
            }
        }
        while let Some((x, y)) = stack.pop() {
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    let (nx, ny) = (nx as u32, ny as u32);
                    if edges.get_pixel(nx, ny).0[0] == 0
                        && magnitude[idx(nx, ny)] >= self.low_threshold
                    {
                        edges.put_pixel(nx, ny, Luma([255]));
                        stack.push((nx, ny));
                    }
                }
            }
        }
        edges
    }
}

/// Gradient magnitude and direction via the 3x3 Sobel kernels; the one-pixel
/// border stays zero.
fn sobel(img: &GrayImage) -> (Vec<f32>, Vec<f32>) {
    const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    const SOBEL_Y: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];

    let (width, height) = img.dimensions();
    let mut magnitude = vec![0f32; (width * height) as usize];
    let mut direction = vec![0f32; (width * height) as usize];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut gx = 0f32;
            let mut gy = 0f32;
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let value = img.get_pixel(x + kx - 1, y + ky - 1).0[0] as f32;
                    gx += value * SOBEL_X[ky as usize][kx as usize];
                    gy += value * SOBEL_Y[ky as usize][kx as usize];
                }
            }
            let i = (y * width + x) as usize;
            magnitude[i] = (gx * gx + gy * gy).sqrt();
            direction[i] = gy.atan2(gx);
        }
    }
    (magnitude, direction)
}

/// Keeps a pixel only when it is the local maximum along its gradient
/// direction, quantized to four sectors.
fn non_maximum_suppression(
    magnitude: &[f32],
    direction: &[f32],
    width: u32,
    height: u32,
) -> Vec<f32> {
    let idx = |x: u32, y: u32| (y * width + x) as usize;
    let mut thinned = vec![0f32; magnitude.len()];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut angle = direction[idx(x, y)].to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            let (q, r) = if !(22.5..157.5).contains(&angle) {
                (magnitude[idx(x + 1, y)], magnitude[idx(x - 1, y)])
            } else if angle < 67.5 {
                (magnitude[idx(x - 1, y + 1)], magnitude[idx(x + 1, y - 1)])
            } else if angle < 112.5 {
                (magnitude[idx(x, y + 1)], magnitude[idx(x, y - 1)])
            } else {
                (magnitude[idx(x - 1, y - 1)], magnitude[idx(x + 1, y + 1)])
            };
            let central = magnitude[idx(x, y)];
            if central >= q && central >= r {
                thinned[idx(x, y)] = central;
            }
        }
    }
    thinned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_finds_a_vertical_edge() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("halves.png");
        let mut img = GrayImage::new(32, 32);
        for y in 0..32 {
            for x in 16..32 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img.save(&src).unwrap();

        let detector = EdgeDetection::new(40.0, 80.0, 1.0);
        let out = detector.detect(&src, dir.path()).unwrap();
        assert_eq!(out.file_name().unwrap(), "canny.png");

        let edges = image::open(&out).unwrap().to_luma8();
        let lit = edges.pixels().filter(|p| p.0[0] > 0).count();
        assert!(lit > 0, "expected edge pixels along the brightness step");
        // the flat halves must stay dark
        assert_eq!(edges.get_pixel(2, 16).0[0], 0);
        assert_eq!(edges.get_pixel(30, 16).0[0], 0);
    }

    #[test]
    fn test_detect_missing_file_is_a_pipeline_error() {
        let dir = tempfile::tempdir().unwrap();
        let detector = EdgeDetection::new(40.0, 80.0, 1.0);
        let err = detector
            .detect(&dir.path().join("absent.png"), dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::Pipeline(_)));
    }
}
