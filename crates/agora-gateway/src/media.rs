use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

/// Default cap on decoded voice note and image size.
pub const DEFAULT_MAX_BLOB_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("The attachment is empty.")]
    Empty,
    #[error("The attachment could not be read.")]
    NotBase64,
    #[error("The attachment is too large ({size} bytes, limit {limit}).")]
    TooLarge { size: usize, limit: usize },
}

/// Validate a base64 blob, optionally wrapped in a `data:<mime>;base64,`
/// URL. Returns the decoded size.
pub fn validate_blob(raw: &str, limit: usize) -> Result<usize, MediaError> {
    let encoded = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(MediaError::Empty);
    }

    // reject oversized blobs before decoding them
    let estimate = encoded.len() / 4 * 3;
    if estimate > limit + 3 {
        return Err(MediaError::TooLarge {
            size: estimate,
            limit,
        });
    }

    let size = B64
        .decode(encoded)
        .map_err(|_| MediaError::NotBase64)?
        .len();
    if size > limit {
        return Err(MediaError::TooLarge { size, limit });
    }
    Ok(size)
}
