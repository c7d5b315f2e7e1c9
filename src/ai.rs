// ============================================================================
// AI OPERATIONS — remote image-generation service integration
// ============================================================================
//
// A thin collaborator around an HTTP generation endpoint: POST a free-text
// prompt, get back a base64-encoded image, resample it to the project size
// and binarize alpha the same way the import path does.  The result replaces
// the current frame's pixels only — never a new frame.

use std::time::Duration;

use base64::Engine;
use image::RgbaImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::grid::{Color, PixelGrid, Point, Size};

/// Hard deadline on the whole generation round-trip.  A stalled service must
/// surface as an error instead of pinning the worker thread forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How the service image is resampled down/up to the project size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleMode {
    /// Hard pixel edges — the right default for pixel art.
    #[default]
    Nearest,
    /// Linear (triangle) filtering for photographic sources.
    Linear,
}

impl ResampleMode {
    pub fn label(&self) -> &'static str {
        match self {
            ResampleMode::Nearest => "Nearest",
            ResampleMode::Linear => "Linear",
        }
    }

    pub fn all() -> &'static [ResampleMode] {
        &[ResampleMode::Nearest, ResampleMode::Linear]
    }

    fn filter(&self) -> FilterType {
        match self {
            ResampleMode::Nearest => FilterType::Nearest,
            ResampleMode::Linear => FilterType::Triangle,
        }
    }
}

/// Connection settings for the generation service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub api_key: String,
    pub resample: ResampleMode,
}

/// Errors from the generation pipeline.
#[derive(Debug)]
pub enum GenError {
    MissingEndpoint,
    Request(String),
    Service(String),
    BadResponse(String),
    Decode(String),
}

impl std::fmt::Display for GenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenError::MissingEndpoint => write!(f, "No generation endpoint configured"),
            GenError::Request(e) => write!(f, "Generation request failed: {}", e),
            GenError::Service(e) => write!(f, "Generation service error: {}", e),
            GenError::BadResponse(e) => write!(f, "Unexpected service response: {}", e),
            GenError::Decode(e) => write!(f, "Failed to decode generated image: {}", e),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    /// Base64-encoded image bytes (PNG or JPEG).
    image: Option<String>,
    error: Option<String>,
}

/// Call the generation service and post-process the result into frame
/// pixels.  Blocking — run on a worker thread, not the UI thread.
pub fn generate_frame_pixels(
    prompt: &str,
    size: Size,
    settings: &GenerationSettings,
) -> Result<PixelGrid, GenError> {
    if settings.endpoint.is_empty() {
        return Err(GenError::MissingEndpoint);
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| GenError::Request(e.to_string()))?;
    let mut request = client.post(&settings.endpoint).json(&GenerateRequest {
        prompt,
        width: size.width,
        height: size.height,
    });
    if !settings.api_key.is_empty() {
        request = request.bearer_auth(&settings.api_key);
    }

    let response = request
        .send()
        .map_err(|e| GenError::Request(e.to_string()))?;
    if !response.status().is_success() {
        return Err(GenError::Service(format!("HTTP {}", response.status())));
    }
    let body: GenerateResponse = response
        .json()
        .map_err(|e| GenError::BadResponse(e.to_string()))?;

    if let Some(err) = body.error {
        return Err(GenError::Service(err));
    }
    let b64 = body
        .image
        .ok_or_else(|| GenError::BadResponse("response carried no image".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| GenError::Decode(e.to_string()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| GenError::Decode(e.to_string()))?
        .to_rgba8();

    Ok(pixels_from_image(&img, size, settings.resample))
}

/// Resample a decoded service image to the project size and binarize it at
/// the import alpha threshold.  Pure — separated from the HTTP call so the
/// pipeline is testable offline.
pub fn pixels_from_image(img: &RgbaImage, size: Size, resample: ResampleMode) -> PixelGrid {
    let resized = if img.dimensions() == (size.width, size.height) {
        img.clone()
    } else {
        image::imageops::resize(img, size.width, size.height, resample.filter())
    };

    let mut grid = PixelGrid::new(size);
    for (x, y, p) in resized.enumerate_pixels() {
        grid.set(
            Point::new(x as i32, y as i32),
            Color::from_rgba_thresholded(*p),
        );
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn nearest_resample_keeps_hard_edges() {
        // 2×2 source scaled to 4×4: each source pixel becomes a 2×2 block.
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 255, 255]));
        let grid = pixels_from_image(&img, Size::new(4, 4), ResampleMode::Nearest);
        assert_eq!(grid.get(Point::new(0, 0)), Color::rgb(255, 0, 0));
        assert_eq!(grid.get(Point::new(1, 1)), Color::rgb(255, 0, 0));
        assert_eq!(grid.get(Point::new(3, 3)), Color::rgb(0, 0, 255));
        assert_eq!(grid.get(Point::new(3, 0)), Color::Transparent);
    }

    #[test]
    fn generated_pixels_are_binarized() {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba([50, 50, 50, 100])); // below threshold
        let grid = pixels_from_image(&img, Size::new(1, 1), ResampleMode::Nearest);
        assert_eq!(grid.get(Point::new(0, 0)), Color::Transparent);
    }

    #[test]
    fn missing_endpoint_fails_fast() {
        let settings = GenerationSettings::default();
        let err = generate_frame_pixels("a cat", Size::new(8, 8), &settings);
        assert!(matches!(err, Err(GenError::MissingEndpoint)));
    }

    #[test]
    fn unreachable_endpoint_surfaces_a_request_error() {
        // Port 9 (discard) refuses the connection; the deadline on the
        // client guarantees the call returns instead of hanging.
        let settings = GenerationSettings {
            endpoint: "http://127.0.0.1:9/generate".to_string(),
            ..Default::default()
        };
        let err = generate_frame_pixels("a cat", Size::new(8, 8), &settings);
        assert!(matches!(err, Err(GenError::Request(_))));
    }

    #[test]
    fn settings_roundtrip_through_storage_format() {
        let settings = GenerationSettings {
            endpoint: "http://localhost:8188/generate".to_string(),
            api_key: "secret".to_string(),
            resample: ResampleMode::Linear,
        };
        let encoded = serde_json::to_string(&settings).unwrap();
        let back: GenerationSettings = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back.endpoint, settings.endpoint);
        assert_eq!(back.api_key, settings.api_key);
        assert_eq!(back.resample, ResampleMode::Linear);
    }
}
