//! Signature Capture
//!
//! The drawing surface hands over a data URL when a stroke ends. Only the
//! base64 body is stored in the field's value slot.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::FormError;
use crate::surface::SurfaceHandle;

pub struct SignaturePad {
    slot: SurfaceHandle,
    enabled: bool,
}

impl SignaturePad {
    pub fn new(slot: SurfaceHandle) -> Self {
        Self { slot, enabled: true }
    }

    /// A disabled pad keeps whatever the slot already holds.
    pub fn disabled(slot: SurfaceHandle) -> Self {
        Self { slot, enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// End-of-stroke callback.
    pub fn on_end(&self, data_url: &str) -> Result<(), FormError> {
        if !self.enabled {
            return Ok(());
        }
        let body = data_url_body(data_url)?;
        STANDARD
            .decode(body)
            .map_err(|e| FormError::Signature(format!("invalid image data: {}", e)))?;
        self.slot.set_value(body);
        Ok(())
    }

    pub fn clear(&self) {
        if self.enabled {
            self.slot.set_value("");
        }
    }

    /// Decoded image bytes for redrawing, or None when nothing is stored.
    pub fn image(&self) -> Result<Option<Vec<u8>>, FormError> {
        let stored = self.slot.value();
        if stored.is_empty() {
            return Ok(None);
        }
        STANDARD
            .decode(stored.as_bytes())
            .map(Some)
            .map_err(|e| FormError::Signature(format!("stored signature is not base64: {}", e)))
    }
}

fn data_url_body(data_url: &str) -> Result<&str, FormError> {
    match data_url.split_once(',') {
        Some((header, body)) if header.starts_with("data:") && header.ends_with(";base64") => Ok(body),
        _ => Err(FormError::Signature("expected a base64 data URL".to_string())),
    }
}
