//! Conversion of native record fragments into owned values.
//!
//! Every raw pointer handed over by the capture engine is read here and
//! nowhere else. The functions copy out of foreign memory and never free
//! or mutate it; the buffer stays owned by the native call that produced it.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::str::Utf8Error;

use thiserror::Error;

/// Error type for foreign data conversion
#[derive(Debug, Error)]
pub enum MarshalError {
    /// Returned when a native string is not valid UTF-8.
    ///
    /// Invalid text is rejected rather than replaced, so a record with a
    /// mangled field is skipped instead of being relayed with altered data.
    #[error("invalid text encoding: {source}")]
    InvalidEncoding {
        #[source]
        source: Utf8Error,
    },

    /// Returned when a required pointer is null
    #[error("null pointer for {0}")]
    NullPointer(&'static str),

    /// Returned when the native layer reports a negative length or count
    #[error("invalid native length {0}")]
    InvalidLength(i64),
}

/// Decodes a null-terminated native string into an owned `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated buffer that stays valid
/// for the duration of the call.
pub unsafe fn decode_text(ptr: *const c_char) -> Result<String, MarshalError> {
    if ptr.is_null() {
        return Err(MarshalError::NullPointer("text"));
    }

    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|source| MarshalError::InvalidEncoding { source })
}

/// Copies exactly `length` bytes out of a native buffer.
///
/// The buffer is binary data: zero bytes are copied like any other and the
/// length is never inferred from content. A null buffer is accepted only
/// with a length of zero, which is how the engine reports "no payload".
///
/// # Safety
///
/// If `length > 0`, `ptr` must point to at least `length` readable bytes
/// that stay valid for the duration of the call.
pub unsafe fn decode_bytes(ptr: *const u8, length: c_int) -> Result<Vec<u8>, MarshalError> {
    let length = checked_len(length)?;
    if length == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(MarshalError::NullPointer("byte buffer"));
    }

    Ok(std::slice::from_raw_parts(ptr, length).to_vec())
}

/// Decodes a native array of `count` strings, preserving order.
///
/// # Safety
///
/// If `count > 0`, `ptr` must point to `count` valid string pointers, each
/// satisfying the contract of [`decode_text`].
pub unsafe fn decode_string_array(
    ptr: *const *const c_char,
    count: c_int,
) -> Result<Vec<String>, MarshalError> {
    let count = checked_len(count)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(MarshalError::NullPointer("string array"));
    }

    std::slice::from_raw_parts(ptr, count)
        .iter()
        .map(|&item| decode_text(item))
        .collect()
}

fn checked_len(length: c_int) -> Result<usize, MarshalError> {
    usize::try_from(length).map_err(|_| MarshalError::InvalidLength(i64::from(length)))
}
