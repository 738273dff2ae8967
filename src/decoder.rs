/**
 * Image Decoder
 * Turns base64 / data-URL PNG payloads into grayscale fingerprint images
 */

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{DecodeStage, VerifyError};

pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// 8-bit grayscale pixel buffer, row-major, `width * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FingerprintImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, VerifyError> {
        if width == 0 || height == 0 {
            return Err(VerifyError::InvalidInput("image has zero area"));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(VerifyError::InvalidInput(
                "pixel buffer does not match image dimensions",
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(x, y)`; callers stay inside the image.
    pub fn at(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

static DATA_URL_RE: OnceLock<Regex> = OnceLock::new();

fn data_url_regex() -> &'static Regex {
    DATA_URL_RE.get_or_init(|| {
        Regex::new(r"(?s)^data:image/png;base64,(.*)$")
            .unwrap_or_else(|error| panic!("data url regex failed to compile: {error}"))
    })
}

/// Strips an optional `data:image/png;base64,` prefix and base64-decodes the rest.
pub fn decode_payload(input: &str) -> Result<Vec<u8>, VerifyError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VerifyError::InvalidInput("empty image"));
    }

    let payload = data_url_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    // Wrapped base64 (MIME line breaks, pasted spaces) is accepted
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD.decode(&compact).map_err(|e| VerifyError::Decode {
        stage: DecodeStage::Base64,
        reason: format!("{} chars of payload rejected ({e})", compact.len()),
    })
}

/// Decodes PNG bytes and collapses them to grayscale using NTSC weights.
pub fn png_to_grayscale(png: &[u8]) -> Result<FingerprintImage, VerifyError> {
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png).map_err(|e| {
        VerifyError::Decode {
            stage: DecodeStage::Png,
            reason: format!("{} bytes are not a valid png ({e})", png.len()),
        }
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    // Integer form of R*0.30 + G*0.59 + B*0.11, truncated; alpha ignored.
    let pixels = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            ((u32::from(r) * 30 + u32::from(g) * 59 + u32::from(b) * 11) / 100) as u8
        })
        .collect();

    FingerprintImage::new(width, height, pixels)
}

/// Full decode: payload string to grayscale image.
pub fn decode_image(input: &str) -> Result<FingerprintImage, VerifyError> {
    let bytes = decode_payload(input)?;
    png_to_grayscale(&bytes)
}

/// Encodes a grayscale image as a `data:image/png;base64,...` URL.
pub fn encode_png_data_url(image: &FingerprintImage) -> Result<String, image::ImageError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        image.pixels(),
        image.width(),
        image.height(),
        ExtendedColorType::L8,
    )?;
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&png)))
}

/// Short content digest for correlating log lines without logging the image.
pub fn payload_digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.trim().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use rstest::rstest;

    fn gradient(width: u32, height: u32) -> FingerprintImage {
        let pixels = (0..width * height).map(|i| (i * 7 % 256) as u8).collect();
        FingerprintImage::new(width, height, pixels).unwrap()
    }

    fn rgba_png(pixel: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 1, Rgba(pixel));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(img.as_raw(), 2, 1, ExtendedColorType::Rgba8)
            .unwrap();
        png
    }

    #[test]
    fn data_url_round_trip_preserves_pixels() {
        let original = gradient(13, 9);
        let url = encode_png_data_url(&original).unwrap();
        assert!(url.starts_with(DATA_URL_PREFIX));

        let decoded = decode_image(&url).unwrap();
        assert_eq!(decoded.width(), 13);
        assert_eq!(decoded.height(), 9);
        assert_eq!(decoded.pixels(), original.pixels());
    }

    #[test]
    fn bare_base64_is_accepted() {
        let original = gradient(4, 4);
        let url = encode_png_data_url(&original).unwrap();
        let bare = url.trim_start_matches(DATA_URL_PREFIX);
        assert_eq!(decode_image(bare).unwrap(), original);
    }

    #[test]
    fn line_wrapped_base64_is_accepted() {
        let original = gradient(6, 5);
        let url = encode_png_data_url(&original).unwrap();
        let body = url.trim_start_matches(DATA_URL_PREFIX);

        let wrapped: Vec<String> = body
            .as_bytes()
            .chunks(16)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        let input = format!("{DATA_URL_PREFIX}\r\n{}", wrapped.join("\n "));

        assert_eq!(decode_image(&input).unwrap(), original);
        assert_eq!(decode_image(&wrapped.join("\t")).unwrap(), original);
    }

    #[rstest]
    #[case::white([255, 255, 255, 255], 255)]
    #[case::red([255, 0, 0, 255], 76)]
    #[case::green([0, 255, 0, 255], 150)]
    #[case::blue([0, 0, 255, 255], 28)]
    #[case::alpha_ignored([100, 100, 100, 0], 100)]
    fn grayscale_uses_ntsc_weights(#[case] pixel: [u8; 4], #[case] expected: u8) {
        let gray = png_to_grayscale(&rgba_png(pixel)).unwrap();
        assert_eq!(gray.pixels(), &[expected, expected]);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn empty_input_is_invalid(#[case] input: &str) {
        assert!(matches!(
            decode_image(input),
            Err(VerifyError::InvalidInput(_))
        ));
    }

    #[test]
    fn bad_base64_names_stage() {
        let err = decode_image("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Decode {
                stage: DecodeStage::Base64,
                ..
            }
        ));
    }

    #[test]
    fn non_png_bytes_name_stage() {
        let payload = STANDARD.encode(b"definitely not a png");
        let err = decode_image(&payload).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Decode {
                stage: DecodeStage::Png,
                ..
            }
        ));
        assert!(!err.to_string().contains("definitely"));
    }

    #[test]
    fn buffer_must_match_dimensions() {
        assert!(FingerprintImage::new(3, 3, vec![0; 8]).is_err());
        assert!(FingerprintImage::new(0, 3, Vec::new()).is_err());
    }

    #[test]
    fn digest_is_stable_and_short() {
        assert_eq!(payload_digest("abc"), payload_digest(" abc "));
        assert_eq!(payload_digest("abc").len(), 12);
    }
}
