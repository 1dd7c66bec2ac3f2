//! Low-level fixed-width field decoding for LD records.
//!
//! Every scalar in the LD format is little-endian; every string field is a
//! fixed-width ASCII region padded with NULs and spaces. Reserved byte
//! ranges in real captures routinely hold garbage, so string decoding is
//! deliberately non-fatal: a field that fails to decode degrades to an empty
//! string with a diagnostic, never an error.

use crate::{LdError, Result};
use tracing::warn;

/// Slice exactly `len` bytes starting at an absolute `offset`.
///
/// Fails with [`LdError::TruncatedRead`] naming the field being read when the
/// buffer ends first. This is the only path through which record parsing
/// touches the underlying bytes, so every fixed-width read is bounds-checked.
pub(crate) fn read_exact<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    context: &str,
) -> Result<&'a [u8]> {
    let end = offset.checked_add(len).ok_or_else(|| {
        LdError::truncated_read(context, offset as u64, len, data.len().saturating_sub(offset))
    })?;
    if end > data.len() {
        return Err(LdError::truncated_read(
            context,
            offset as u64,
            len,
            data.len().saturating_sub(offset),
        ));
    }
    Ok(&data[offset..end])
}

/// Decode a fixed-width ASCII string field.
///
/// Trailing NUL padding and surrounding whitespace are stripped. Any byte
/// outside the ASCII range degrades the whole field to an empty string with
/// a warning; reserved regions bleeding into string fields are common in
/// real captures and must not abort the parse.
pub(crate) fn decode_fixed_string(bytes: &[u8]) -> String {
    if !bytes.is_ascii() {
        warn!(len = bytes.len(), "non-ASCII bytes in fixed string field, dropping value");
        return String::new();
    }
    // ASCII is valid single-byte UTF-8, checked above.
    let text = std::str::from_utf8(bytes).unwrap_or_default();
    text.trim().trim_end_matches('\0').trim().to_string()
}

pub(crate) fn parse_u16_le(data: &[u8], offset: usize, context: &str) -> Result<u16> {
    let bytes = read_exact(data, offset, 2, context)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn parse_i16_le(data: &[u8], offset: usize, context: &str) -> Result<i16> {
    let bytes = read_exact(data, offset, 2, context)?;
    Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn parse_u32_le(data: &[u8], offset: usize, context: &str) -> Result<u32> {
    let bytes = read_exact(data, offset, 4, context)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Widen a half-precision bit pattern to `f32`.
///
/// No crate in our stack ships half-float support, and the format only needs
/// the one direction, so the widening is done directly on the bit fields.
/// Subnormals, signed zero, infinities and NaN all map to their `f32`
/// counterparts.
pub(crate) fn f16_to_f32(bits: u16) -> f32 {
    let negative = bits & 0x8000 != 0;
    let exponent = (bits >> 10) & 0x1F;
    let mantissa = bits & 0x03FF;

    let magnitude = match (exponent, mantissa) {
        (0, 0) => 0.0f32,
        // Subnormal: mantissa counts units of 2^-24.
        (0, m) => f32::from(m) * 2.0f32.powi(-24),
        (0x1F, 0) => f32::INFINITY,
        (0x1F, _) => f32::NAN,
        (e, m) => {
            let word = (u32::from(e) + 112) << 23 | u32::from(m) << 13;
            f32::from_bits(word)
        }
    };
    if negative { -magnitude } else { magnitude }
}
