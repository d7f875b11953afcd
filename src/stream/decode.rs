use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;

use crate::error::DecodeError;
use crate::perception::Frame;

/// Base64 image payload → RGB frame at the given size.
///
/// A `data:<mime>;base64,` prefix is accepted and ignored.
pub fn decode_frame(
    payload: &str,
    width: u32,
    height: u32,
    seq: u64,
    ts_ms: u64,
) -> Result<Frame, DecodeError> {
    let encoded = strip_data_url(payload).trim();
    if encoded.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD.decode(encoded)?;
    let image = image::load_from_memory(&bytes)?;
    let image = image.resize_exact(width, height, FilterType::Triangle).into_rgb8();

    Ok(Frame { seq, ts_ms, image })
}

/// [`decode_frame`] on the blocking pool.
pub async fn decode_frame_blocking(
    payload: String,
    width: u32,
    height: u32,
    seq: u64,
    ts_ms: u64,
) -> Result<Frame, DecodeError> {
    tokio::task::spawn_blocking(move || decode_frame(&payload, width, height, seq, ts_ms))
        .await
        .map_err(|e| DecodeError::TaskFailed(e.to_string()))?
}

fn strip_data_url(payload: &str) -> &str {
    match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or("", |(_, data)| data),
        None => payload,
    }
}
