/**
 * Ridge Field Engine
 * Built-in backend: block orientation field templates compared by
 * coherence-weighted orientation agreement
 */

use super::{ExtractionError, FingerprintEngine};
use crate::decoder::FingerprintImage;

const DEFAULT_BLOCK_SIZE: u32 = 16;
const DEFAULT_MIN_CONTRAST: f64 = 8.0;
const DEFAULT_MIN_FOREGROUND_BLOCKS: usize = 4;

// Keeps flat-but-foreground blocks from dropping out of the weighting.
const WEIGHT_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct RidgeBlock {
    /// Doubled ridge angle, radians.
    angle2: f64,
    /// Orientation coherence in [0, 1].
    coherence: f64,
}

/// Orientation field over a fixed block grid. Background blocks are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeTemplate {
    cols: u32,
    rows: u32,
    blocks: Vec<Option<RidgeBlock>>,
}

impl RidgeTemplate {
    fn block(&self, col: u32, row: u32) -> Option<&RidgeBlock> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.blocks
            .get((row * self.cols + col) as usize)
            .and_then(Option::as_ref)
    }

    pub fn foreground_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }
}

pub struct RidgeFieldEngine {
    block_size: u32,
    min_contrast: f64,
    min_foreground_blocks: usize,
}

impl Default for RidgeFieldEngine {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            min_contrast: DEFAULT_MIN_CONTRAST,
            min_foreground_blocks: DEFAULT_MIN_FOREGROUND_BLOCKS,
        }
    }
}

impl RidgeFieldEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_foreground_blocks(mut self, blocks: usize) -> Self {
        self.min_foreground_blocks = blocks.max(1);
        self
    }

    fn analyse_block(&self, image: &FingerprintImage, col: u32, row: u32) -> Option<RidgeBlock> {
        let x0 = col * self.block_size;
        let y0 = row * self.block_size;
        let (w, h) = (image.width(), image.height());

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut gxx = 0.0;
        let mut gxy = 0.0;
        let mut energy = 0.0;
        let mut count = 0.0;

        for y in y0..y0 + self.block_size {
            for x in x0..x0 + self.block_size {
                let v = f64::from(image.at(x, y));
                sum += v;
                sum_sq += v * v;
                count += 1.0;

                // Central differences; border pixels contribute intensity only.
                if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
                    continue;
                }
                let gx = f64::from(image.at(x + 1, y)) - f64::from(image.at(x - 1, y));
                let gy = f64::from(image.at(x, y + 1)) - f64::from(image.at(x, y - 1));
                gxx += gx * gx - gy * gy;
                gxy += 2.0 * gx * gy;
                energy += gx * gx + gy * gy;
            }
        }

        let mean = sum / count;
        let variance = (sum_sq / count - mean * mean).max(0.0);
        if variance.sqrt() < self.min_contrast || energy <= 0.0 {
            return None;
        }

        Some(RidgeBlock {
            angle2: gxy.atan2(gxx),
            coherence: (gxx.hypot(gxy) / energy).clamp(0.0, 1.0),
        })
    }
}

impl FingerprintEngine for RidgeFieldEngine {
    type Template = RidgeTemplate;

    fn extract(&self, image: &FingerprintImage) -> Result<RidgeTemplate, ExtractionError> {
        let cols = image.width() / self.block_size;
        let rows = image.height() / self.block_size;
        if cols == 0 || rows == 0 {
            return Err(ExtractionError::TooSmall {
                width: image.width(),
                height: image.height(),
            });
        }

        let blocks: Vec<Option<RidgeBlock>> = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (col, row)))
            .map(|(col, row)| self.analyse_block(image, col, row))
            .collect();

        let template = RidgeTemplate { cols, rows, blocks };
        let found = template.foreground_blocks();
        if found < self.min_foreground_blocks {
            return Err(ExtractionError::NoRidgeStructure {
                found,
                required: self.min_foreground_blocks,
            });
        }

        Ok(template)
    }

    fn compare(&self, probe: &RidgeTemplate, candidate: &RidgeTemplate) -> f64 {
        let mut agreement = 0.0;
        let mut total_weight = 0.0;

        for row in 0..probe.rows {
            for col in 0..probe.cols {
                let Some(p) = probe.block(col, row) else {
                    continue;
                };
                let weight = WEIGHT_FLOOR + p.coherence;
                total_weight += weight;

                // Candidate background counts as no agreement.
                if let Some(c) = candidate.block(col, row) {
                    agreement += weight * (p.angle2 - c.angle2).cos();
                }
            }
        }

        if total_weight <= 0.0 {
            return 0.0;
        }
        (100.0 * agreement / total_weight).max(0.0)
    }
}
