// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::ConvertError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run a codec call and turn a panic inside it into `InternalPanic`.
///
/// Codec crates occasionally panic on malformed input instead of returning an
/// error. Every encoder entry point goes through here.
pub fn run_with_panic_policy<T, F>(label: &'static str, f: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError>,
{
    catch_codec_panic(label, f, |detail| {
        ConvertError::internal_panic(format!("{label}: {detail}"))
    })
}

/// Decoder variant: a panic means the input was malformed, so it becomes
/// `DecodeFailed` for `name`.
pub fn run_decode_with_panic_policy<T, F>(
    name: &str,
    label: &'static str,
    f: F,
) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError>,
{
    catch_codec_panic(label, f, |detail| {
        ConvertError::decode_failed(name.to_string(), format!("{label}: {detail}"))
    })
}

fn catch_codec_panic<T, F, M>(label: &'static str, f: F, on_panic: M) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError>,
    M: FnOnce(String) -> ConvertError,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            tracing::warn!(stage = label, "codec panicked: {detail}");
            Err(on_panic(detail))
        }
    }
}
