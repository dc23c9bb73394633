use crate::error::{GateError, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use qrcode::QrCode;

/// Square grayscale bitmap handed to the presenter's image slot.
pub type QrRaster = GrayImage;

/// Encodes a payment-request string into a raster QR code.
///
/// The output is deterministic for a fixed `(text, pixels)` pair.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, text: &str, pixels: u32) -> Result<QrRaster>;
}

#[derive(Debug, Default, Clone)]
pub struct ImageQrEncoder;

impl QrEncoder for ImageQrEncoder {
    fn encode(&self, text: &str, pixels: u32) -> Result<QrRaster> {
        if pixels == 0 {
            return Err(GateError::encoding("Raster side length must be positive"));
        }

        tracing::debug!("Generating {}x{} QR for payment request", pixels, pixels);

        let code = QrCode::new(text.as_bytes())
            .map_err(|e| GateError::encoding(format!("Payload does not fit a QR code: {}", e)))?;

        let rendered: GrayImage = code
            .render::<Luma<u8>>()
            .max_dimensions(pixels, pixels)
            .build();

        // The module renderer rounds down to a whole multiple of the code
        // width; resize with nearest-neighbour to the exact square so the
        // modules stay crisp.
        Ok(imageops::resize(&rendered, pixels, pixels, FilterType::Nearest))
    }
}
