//! Raster mask payloads.
//!
//! A mask is carried in exactly one of three encodings, enforced by the
//! enum itself: a reference to an externally hosted instance image plus
//! the RGB color that selects the instance, a run-length encoding, or
//! raw PNG bytes.

use crate::error::LabelwireError;

/// The raster payload of a mask annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum Mask {
    /// An externally hosted instance image; `color` selects the instance.
    Instance { uri: String, color: [u8; 3] },
    /// Run-length encoded raster with its (height, width) extent.
    Rle { counts: Vec<u32>, size: (u32, u32) },
    /// Raw PNG bytes; base64 on the wire.
    Png { bytes: Vec<u8> },
}

impl Mask {
    /// A mask referencing a hosted instance image.
    pub fn instance(uri: impl Into<String>, color: [u8; 3]) -> Result<Self, LabelwireError> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(LabelwireError::invalid(
                "mask.instance_uri",
                "instance URI must be non-empty",
            ));
        }
        Ok(Mask::Instance { uri, color })
    }

    /// A run-length encoded mask. The size is (height, width).
    pub fn rle(counts: Vec<u32>, size: (u32, u32)) -> Result<Self, LabelwireError> {
        if counts.is_empty() {
            return Err(LabelwireError::invalid(
                "mask.rle.counts",
                "RLE counts must be non-empty",
            ));
        }
        if size.0 == 0 || size.1 == 0 {
            return Err(LabelwireError::invalid(
                "mask.rle.size",
                format!("RLE size must be positive; got {}x{}", size.0, size.1),
            ));
        }
        Ok(Mask::Rle { counts, size })
    }

    /// A mask carried as PNG bytes.
    pub fn png(bytes: Vec<u8>) -> Result<Self, LabelwireError> {
        if bytes.is_empty() {
            return Err(LabelwireError::invalid(
                "mask.png",
                "PNG payload must be non-empty",
            ));
        }
        Ok(Mask::Png { bytes })
    }

    /// The instance color, when this mask is the instance-URI form.
    pub fn instance_color(&self) -> Option<[u8; 3]> {
        match self {
            Mask::Instance { color, .. } => Some(*color),
            _ => None,
        }
    }
}
