//! Channel sample encoding definitions

use serde::{Deserialize, Serialize};

/// Numeric encoding of a channel's raw sample words.
///
/// Resolved once at metadata-parse time from the (category, subtype) tag pair
/// stored in the channel record, then matched exhaustively when samples are
/// decoded. Tag pairs outside the known tables are retained as `Unsupported`
/// so diagnostics can name the exact pair that was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleEncoding {
    /// 16-bit signed integer words
    Int16,
    /// 32-bit signed integer words
    Int32,
    /// 16-bit half-precision float words
    Float16,
    /// 32-bit single-precision float words
    Float32,
    /// Tag pair outside the known encoding tables
    Unsupported { category: u16, subtype: u16 },
}

/// Category tags observed in real captures. 0x00/0x03/0x05 all carry integer
/// words; 0x07 carries float words.
const INTEGER_CATEGORIES: [u16; 3] = [0x00, 0x03, 0x05];
const FLOAT_CATEGORY: u16 = 0x07;

impl SampleEncoding {
    /// Resolve the encoding from the raw (category, subtype) tag pair.
    ///
    /// The subtype is a 1-based index into a four-slot width table per
    /// family; only slots 2 (16-bit) and 4 (32-bit) are populated. Every
    /// other combination is `Unsupported`.
    pub fn resolve(category: u16, subtype: u16) -> Self {
        let family: &[Option<SampleEncoding>; 4] = if INTEGER_CATEGORIES.contains(&category) {
            &[None, Some(SampleEncoding::Int16), None, Some(SampleEncoding::Int32)]
        } else if category == FLOAT_CATEGORY {
            &[None, Some(SampleEncoding::Float16), None, Some(SampleEncoding::Float32)]
        } else {
            return SampleEncoding::Unsupported { category, subtype };
        };

        subtype
            .checked_sub(1)
            .and_then(|index| family.get(usize::from(index)).copied().flatten())
            .unwrap_or(SampleEncoding::Unsupported { category, subtype })
    }

    /// Returns the size in bytes of one raw sample word, or `None` when the
    /// encoding is unsupported.
    pub const fn word_size(&self) -> Option<usize> {
        match self {
            SampleEncoding::Int16 | SampleEncoding::Float16 => Some(2),
            SampleEncoding::Int32 | SampleEncoding::Float32 => Some(4),
            SampleEncoding::Unsupported { .. } => None,
        }
    }

    /// Whether sample decoding is possible for this encoding.
    pub const fn is_supported(&self) -> bool {
        !matches!(self, SampleEncoding::Unsupported { .. })
    }
}
