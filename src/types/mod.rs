//! Core value types for LD channel data.
//!
//! This module provides the small value types shared across the decoder:
//!
//! - [`SampleEncoding`] maps the raw (category, subtype) tag pair from a
//!   channel metadata record onto a concrete word width, resolved once at
//!   parse time and matched exhaustively at decode time
//! - [`Scaling`] holds the per-channel linear transform applied to every raw
//!   sample word
//!
//! Both derive `serde` traits so channel metadata can be re-serialized by
//! downstream tooling without reaching back into the binary file.

mod encoding;
mod scaling;

pub use encoding::SampleEncoding;
pub use scaling::Scaling;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn supported_encodings_always_scale_finitely(
            raw in -32768i32..32768,
            shift in any::<i16>(),
            multiplier in any::<i16>(),
            scale in 1i16..100,
            dec_places in -2i16..3,
        ) {
            // Any in-range integer word through any non-degenerate transform
            // stays finite; to_table() relies on NaN being reserved for
            // padding, not produced by decoding.
            let scaling = Scaling { shift, multiplier, scale, dec_places };
            let decoded = scaling.apply(f64::from(raw));
            prop_assert!(decoded.is_finite());
        }

        #[test]
        fn encoding_word_size_bounds_hold(category in any::<u16>(), subtype in any::<u16>()) {
            if let Some(size) = SampleEncoding::resolve(category, subtype).word_size() {
                prop_assert!(size == 2 || size == 4);
            }
        }
    }
}
