//! Per-channel linear sample scaling

use serde::{Deserialize, Serialize};

/// The linear transform converting raw sample words into physical units.
///
/// All four parameters are signed 16-bit fields read once from the channel
/// metadata record and applied uniformly across the channel:
///
/// ```text
/// decoded = ((raw / scale) * 10^(-dec_places) + shift) * multiplier
/// ```
///
/// The arithmetic is carried out in `f64` for every encoding, including the
/// float widths. A zero `scale` follows IEEE semantics (infinite values),
/// matching what real captures with degenerate metadata produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    pub shift: i16,
    pub multiplier: i16,
    pub scale: i16,
    pub dec_places: i16,
}

impl Scaling {
    /// The no-op transform: decoded value equals the raw word.
    pub const IDENTITY: Scaling =
        Scaling { shift: 0, multiplier: 1, scale: 1, dec_places: 0 };

    /// Apply the transform to one raw sample value.
    pub fn apply(&self, raw: f64) -> f64 {
        ((raw / f64::from(self.scale)) * 10f64.powi(-i32::from(self.dec_places))
            + f64::from(self.shift))
            * f64::from(self.multiplier)
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling::IDENTITY
    }
}
