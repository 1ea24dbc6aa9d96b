//! QR credential encoding
//!
//! Encodes the admin verification link for a registration as a PNG. Any
//! encoding failure yields `None`; registration never depends on the image.

use std::io::Cursor;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use tracing::warn;
use crate::config::settings::Settings;

/// Encoded QR image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub png: Vec<u8>,
}

impl QrImage {
    /// Base64 form returned to the browser
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }
}

#[derive(Debug, Clone)]
pub struct QrService {
    base_url: String,
    enabled: bool,
}

impl QrService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_url: settings.server.public_base_url.trim_end_matches('/').to_string(),
            enabled: settings.features.qr_codes,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Link door staff open after scanning
    pub fn verification_url(&self, event_id: Option<i64>, credential: &str, email: &str) -> String {
        let mut url = format!(
            "{}/admin/verify-entry?regid={}&email={}",
            self.base_url,
            urlencoding::encode(credential),
            urlencoding::encode(email)
        );
        if let Some(id) = event_id {
            url.push_str(&format!("&event_id={}", id));
        }
        url
    }

    /// QR for one registration's credential
    pub fn credential_qr(&self, event_id: Option<i64>, credential: &str, email: &str) -> Option<QrImage> {
        if !self.enabled {
            return None;
        }
        render_png(&self.verification_url(event_id, credential, email))
    }
}

/// Render `data` as a PNG QR code
pub fn render_png(data: &str) -> Option<QrImage> {
    let code = match QrCode::new(data.as_bytes()) {
        Ok(code) => code,
        Err(e) => {
            warn!(error = %e, "QR encoding failed");
            return None;
        }
    };

    let image = code.render::<Luma<u8>>().min_dimensions(240, 240).build();
    let mut png = Vec::new();
    if let Err(e) = DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
        warn!(error = %e, "QR PNG encoding failed");
        return None;
    }
    Some(QrImage { png })
}
