#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::Arc;

use fingermatch::biometric::BiometricService;
use fingermatch::decoder::{encode_png_data_url, FingerprintImage};
use fingermatch::engine::RidgeFieldEngine;
use fingermatch::routes::{router, AppState};

pub const THRESHOLD: u32 = 35;

/// Synthetic print: parallel sinusoidal ridges at `angle` radians.
pub fn print(angle: f64) -> String {
    let (width, height, period) = (96u32, 96u32, 9.0);
    let (s, c) = angle.sin_cos();
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let t = (f64::from(x) * c + f64::from(y) * s) * 2.0 * PI / period;
            (128.0 + 100.0 * t.sin()) as u8
        })
        .collect();
    let image = FingerprintImage::new(width, height, pixels).unwrap();
    encode_png_data_url(&image).unwrap()
}

pub fn blank() -> String {
    let image = FingerprintImage::new(64, 64, vec![255; 64 * 64]).unwrap();
    encode_png_data_url(&image).unwrap()
}

pub fn app() -> axum::Router {
    let state = AppState {
        biometric: Arc::new(BiometricService::new(RidgeFieldEngine::new(), THRESHOLD)),
    };
    router(state, 16 * 1024 * 1024)
}
