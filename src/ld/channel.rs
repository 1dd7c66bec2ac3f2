//! Channel metadata records and lazy sample decoding.
//!
//! Each channel in an LD file is described by a fixed-size metadata record
//! holding the linked-list pointers, the sample block location, the numeric
//! encoding tags, the scaling parameters and the channel's identity strings.
//! The raw sample words are not touched until [`Channel::samples`] is called;
//! the decoded values are then cached for the life of the channel.

use crate::ld::codec::{
    decode_fixed_string, f16_to_f32, parse_i16_le, parse_u16_le, parse_u32_le, read_exact,
};
use crate::{LdError, Result, SampleEncoding, Scaling};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{trace, warn};

// Channel record field offsets within the fixed prefix.
const CHANNEL_PREV_PTR: usize = 0;
const CHANNEL_NEXT_PTR: usize = 4;
const CHANNEL_DATA_PTR: usize = 8;
const CHANNEL_DATA_LEN: usize = 12;
// 16..18 is a counter field with no downstream consumer.
const CHANNEL_CATEGORY: usize = 18;
const CHANNEL_SUBTYPE: usize = 20;
const CHANNEL_FREQUENCY: usize = 22;
const CHANNEL_SHIFT: usize = 24;
const CHANNEL_MULTIPLIER: usize = 26;
const CHANNEL_SCALE: usize = 28;
const CHANNEL_DEC_PLACES: usize = 30;
const CHANNEL_NAME: usize = 32;
const CHANNEL_NAME_LEN: usize = 32;
const CHANNEL_SHORT_NAME: usize = 64;
const CHANNEL_SHORT_NAME_LEN: usize = 8;
const CHANNEL_UNIT: usize = 72;
const CHANNEL_UNIT_LEN: usize = 12;

/// Length of a channel record before the reserved tail.
const CHANNEL_FIXED_LEN: usize = 84;

/// Width of the reserved tail of a channel metadata record.
///
/// The tail width differs between logger firmware generations and the file
/// carries no discriminant for it, so it is an explicit format parameter
/// rather than a guessed constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// 40-byte reserved tail, the width current loggers write.
    #[default]
    Standard,
    /// 32-byte reserved tail written by older firmware.
    Compact,
}

impl ChannelLayout {
    const fn reserved_len(self) -> usize {
        match self {
            ChannelLayout::Standard => 40,
            ChannelLayout::Compact => 32,
        }
    }

    /// Total stride of one channel metadata record under this layout.
    pub const fn record_len(self) -> usize {
        CHANNEL_FIXED_LEN + self.reserved_len()
    }
}

/// One channel: parsed metadata plus on-demand decoded samples.
///
/// The channel keeps a handle on the shared file buffer so sample decoding
/// can happen lazily; decoded values are computed once and cached under
/// single-assignment semantics, safe against concurrent readers.
#[derive(Clone)]
pub struct Channel {
    data: Arc<Vec<u8>>,
    /// Offset of this record in the file, the channel's identity in
    /// diagnostics
    pub meta_offset: u32,
    /// Offset of the previous record in the chain, 0 at the head
    pub prev_offset: u32,
    /// Offset of the next record in the chain, 0 at the tail
    pub next_offset: u32,
    /// Offset of the raw sample block
    pub data_offset: u32,
    /// Declared sample count
    pub data_len: u32,
    pub encoding: SampleEncoding,
    /// Sampling frequency in Hz
    pub frequency_hz: u16,
    pub scaling: Scaling,
    pub name: String,
    pub short_name: String,
    pub unit: String,
    samples: OnceLock<Vec<f64>>,
}

impl Channel {
    /// Parse one channel metadata record at `meta_offset`.
    pub fn parse(data: &Arc<Vec<u8>>, meta_offset: u32, layout: ChannelLayout) -> Result<Self> {
        trace!(meta_offset, "parsing channel metadata record");
        let start = meta_offset as usize;
        let record = read_exact(data, start, layout.record_len(), "channel record")?;

        let prev_offset = parse_u32_le(record, CHANNEL_PREV_PTR, "channel record")?;
        let next_offset = parse_u32_le(record, CHANNEL_NEXT_PTR, "channel record")?;
        let data_offset = parse_u32_le(record, CHANNEL_DATA_PTR, "channel record")?;
        let data_len = parse_u32_le(record, CHANNEL_DATA_LEN, "channel record")?;
        let category = parse_u16_le(record, CHANNEL_CATEGORY, "channel record")?;
        let subtype = parse_u16_le(record, CHANNEL_SUBTYPE, "channel record")?;
        let frequency_hz = parse_u16_le(record, CHANNEL_FREQUENCY, "channel record")?;
        let scaling = Scaling {
            shift: parse_i16_le(record, CHANNEL_SHIFT, "channel record")?,
            multiplier: parse_i16_le(record, CHANNEL_MULTIPLIER, "channel record")?,
            scale: parse_i16_le(record, CHANNEL_SCALE, "channel record")?,
            dec_places: parse_i16_le(record, CHANNEL_DEC_PLACES, "channel record")?,
        };

        let name = decode_fixed_string(&record[CHANNEL_NAME..CHANNEL_NAME + CHANNEL_NAME_LEN]);
        let short_name = decode_fixed_string(
            &record[CHANNEL_SHORT_NAME..CHANNEL_SHORT_NAME + CHANNEL_SHORT_NAME_LEN],
        );
        let unit = decode_fixed_string(&record[CHANNEL_UNIT..CHANNEL_UNIT + CHANNEL_UNIT_LEN]);

        let encoding = SampleEncoding::resolve(category, subtype);
        if !encoding.is_supported() {
            warn!(
                channel = %name,
                meta_offset,
                category,
                subtype,
                "channel declares an unsupported sample encoding"
            );
        }

        Ok(Self {
            data: Arc::clone(data),
            meta_offset,
            prev_offset,
            next_offset,
            data_offset,
            data_len,
            encoding,
            frequency_hz,
            scaling,
            name,
            short_name,
            unit,
            samples: OnceLock::new(),
        })
    }

    /// Decode and cache this channel's samples.
    ///
    /// Fails fast with [`LdError::UnknownChannelType`] when the encoding is
    /// unsupported. Otherwise the raw words are read from the sample block,
    /// scaled, and cached; repeated calls return the same slice without
    /// touching the buffer again.
    ///
    /// A sample block that ends before `data_len` words is recoverable:
    /// real-world captures are routinely truncated near end-of-file, so the
    /// words actually present are returned with a diagnostic rather than
    /// failing the channel. Nothing is fabricated to fill the gap.
    pub fn samples(&self) -> Result<&[f64]> {
        if let SampleEncoding::Unsupported { category, subtype } = self.encoding {
            return Err(LdError::unknown_channel_type(&self.name, category, subtype));
        }
        Ok(self.samples.get_or_init(|| self.decode_samples()))
    }

    /// Number of samples declared by the metadata record. The decoded count
    /// can be lower when the block is truncated.
    pub fn declared_len(&self) -> usize {
        self.data_len as usize
    }

    fn decode_samples(&self) -> Vec<f64> {
        let (word_size, decode): (usize, fn(&[u8]) -> f64) = match self.encoding {
            SampleEncoding::Int16 => (2, |w| f64::from(i16::from_le_bytes([w[0], w[1]]))),
            SampleEncoding::Int32 => {
                (4, |w| f64::from(i32::from_le_bytes([w[0], w[1], w[2], w[3]])))
            }
            SampleEncoding::Float16 => {
                (2, |w| f64::from(f16_to_f32(u16::from_le_bytes([w[0], w[1]]))))
            }
            SampleEncoding::Float32 => {
                (4, |w| f64::from(f32::from_le_bytes([w[0], w[1], w[2], w[3]])))
            }
            // samples() refuses unsupported encodings before decoding starts
            SampleEncoding::Unsupported { .. } => return Vec::new(),
        };

        let start = self.data_offset as usize;
        let declared = self.data_len as usize;
        let available_bytes = self.data.len().saturating_sub(start);
        let readable = (available_bytes / word_size).min(declared);
        if readable < declared {
            warn!(
                channel = %self.name,
                data_offset = self.data_offset,
                declared,
                readable,
                "sample block truncated, returning partial data"
            );
        }

        let mut samples = Vec::with_capacity(readable);
        for i in 0..readable {
            let word = &self.data[start + i * word_size..start + (i + 1) * word_size];
            samples.push(self.scaling.apply(decode(word)));
        }
        samples
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The shared file buffer is deliberately left out.
        f.debug_struct("Channel")
            .field("meta_offset", &self.meta_offset)
            .field("next_offset", &self.next_offset)
            .field("data_offset", &self.data_offset)
            .field("data_len", &self.data_len)
            .field("encoding", &self.encoding)
            .field("frequency_hz", &self.frequency_hz)
            .field("scaling", &self.scaling)
            .field("name", &self.name)
            .field("short_name", &self.short_name)
            .field("unit", &self.unit)
            .field("decoded", &self.samples.get().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ChannelSpec, LdFixture};
    use anyhow::Result;

    fn single_channel(fixture: LdFixture) -> Result<Channel> {
        let layout = fixture.layout();
        let bytes = Arc::new(fixture.build());
        let header = crate::ld::format::LdHeader::parse(&bytes)?;
        Ok(Channel::parse(&bytes, header.meta_ptr, layout)?)
    }

    #[test]
    fn record_len_covers_both_reserved_tails() {
        assert_eq!(ChannelLayout::Standard.record_len(), 124);
        assert_eq!(ChannelLayout::Compact.record_len(), 116);
    }

    #[test]
    fn metadata_fields_parse_from_record() -> Result<()> {
        let channel = single_channel(LdFixture::new().channel(
            ChannelSpec::int16("Engine RPM", "RPM", "rpm")
                .frequency(50)
                .scaling(Scaling { shift: 0, multiplier: 1, scale: 1, dec_places: 0 })
                .raw_i16(&[800, 950, 1200]),
        ))?;

        assert_eq!(channel.name, "Engine RPM");
        assert_eq!(channel.short_name, "RPM");
        assert_eq!(channel.unit, "rpm");
        assert_eq!(channel.frequency_hz, 50);
        assert_eq!(channel.encoding, SampleEncoding::Int16);
        assert_eq!(channel.data_len, 3);
        assert_eq!(channel.next_offset, 0);
        Ok(())
    }

    #[test]
    fn identity_scaling_returns_raw_words() -> Result<()> {
        let raw = [0i16, 1, -1, 32767, -32768, 42, 7, 1000, -999, 12];
        let channel =
            single_channel(LdFixture::new().channel(
                ChannelSpec::int16("Throttle", "TPS", "%").raw_i16(&raw),
            ))?;

        let samples = channel.samples()?;
        assert_eq!(samples.len(), 10);
        for (sample, expected) in samples.iter().zip(raw) {
            assert_eq!(*sample, f64::from(expected));
        }
        Ok(())
    }

    #[test]
    fn scaling_parameters_transform_samples() -> Result<()> {
        let channel = single_channel(
            LdFixture::new().channel(
                ChannelSpec::int16("Oil Pressure", "OilP", "kPa")
                    .scaling(Scaling { shift: 5, multiplier: 10, scale: 2, dec_places: 1 })
                    .raw_i16(&[100]),
            ),
        )?;

        // ((100 / 2) * 10^-1 + 5) * 10 = 100
        assert_eq!(channel.samples()?, &[100.0]);
        Ok(())
    }

    #[test]
    fn int32_and_float_widths_decode() -> Result<()> {
        let wide = single_channel(LdFixture::new().channel(
            ChannelSpec::int32("Odometer", "Odo", "m").raw_i32(&[1_000_000, -250_000]),
        ))?;
        assert_eq!(wide.samples()?, &[1_000_000.0, -250_000.0]);

        let float = single_channel(LdFixture::new().channel(
            ChannelSpec::float32("Lambda", "Lam", "").raw_f32(&[0.85, 1.02]),
        ))?;
        let samples = float.samples()?;
        assert!((samples[0] - 0.85).abs() < 1e-6);
        assert!((samples[1] - 1.02).abs() < 1e-6);

        // 0x3C00 = 1.0, 0xC000 = -2.0 in half precision
        let half = single_channel(LdFixture::new().channel(
            ChannelSpec::float16("Boost", "Bst", "bar").raw_u16(&[0x3C00, 0xC000]),
        ))?;
        assert_eq!(half.samples()?, &[1.0, -2.0]);
        Ok(())
    }

    #[test]
    fn samples_are_memoized_across_calls() -> Result<()> {
        let channel = single_channel(LdFixture::new().channel(
            ChannelSpec::int16("Speed", "Spd", "km/h").raw_i16(&[10, 20, 30]),
        ))?;

        let first = channel.samples()?;
        let second = channel.samples()?;
        assert_eq!(first, second);
        // Same cached allocation, not a re-decode.
        assert!(std::ptr::eq(first.as_ptr(), second.as_ptr()));
        Ok(())
    }

    #[test]
    fn truncated_sample_block_yields_partial_data() -> Result<()> {
        let fixture = LdFixture::new().channel(
            ChannelSpec::int16("Brake Temp", "BrkT", "C").raw_i16(&[100, 200, 300, 400, 500]),
        );
        let layout = fixture.layout();
        let mut bytes = fixture.build();
        // Chop the last two sample words off the end of the file.
        bytes.truncate(bytes.len() - 4);

        let bytes = Arc::new(bytes);
        let header = crate::ld::format::LdHeader::parse(&bytes)?;
        let channel = Channel::parse(&bytes, header.meta_ptr, layout)?;

        assert_eq!(channel.declared_len(), 5);
        let samples = channel.samples()?;
        assert_eq!(samples, &[100.0, 200.0, 300.0]);
        Ok(())
    }

    #[test]
    fn sample_block_entirely_out_of_bounds_yields_empty() -> Result<()> {
        let fixture =
            LdFixture::new().channel(ChannelSpec::int16("Ghost", "Gho", "").raw_i16(&[1, 2, 3]));
        let layout = fixture.layout();
        let mut bytes = fixture.build();
        let data_ptr_field = {
            let header = crate::ld::format::LdHeader::parse(&Arc::new(bytes.clone()))?;
            header.meta_ptr as usize + CHANNEL_DATA_PTR
        };
        // Point the sample block far past end-of-file.
        bytes[data_ptr_field..data_ptr_field + 4].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());

        let bytes = Arc::new(bytes);
        let header = crate::ld::format::LdHeader::parse(&bytes)?;
        let channel = Channel::parse(&bytes, header.meta_ptr, layout)?;
        assert_eq!(channel.samples()?, &[] as &[f64]);
        Ok(())
    }

    #[test]
    fn unsupported_encoding_fails_sample_access_by_name() -> Result<()> {
        let channel = single_channel(LdFixture::new().channel(
            ChannelSpec::raw_encoding("Mystery", "Mys", "", 0x09, 2).raw_i16(&[1]),
        ))?;

        assert_eq!(
            channel.encoding,
            SampleEncoding::Unsupported { category: 0x09, subtype: 2 }
        );
        let err = channel.samples().unwrap_err();
        match err {
            LdError::UnknownChannelType { channel: name, category, subtype } => {
                assert_eq!(name, "Mystery");
                assert_eq!(category, 0x09);
                assert_eq!(subtype, 2);
            }
            other => panic!("expected UnknownChannelType, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn compact_layout_parses_with_narrow_reserved_tail() -> Result<()> {
        let channel = single_channel(
            LdFixture::with_layout(ChannelLayout::Compact)
                .channel(ChannelSpec::int16("Gear", "Gr", "").raw_i16(&[3, 4, 5])),
        )?;
        assert_eq!(channel.name, "Gear");
        assert_eq!(channel.samples()?, &[3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn record_past_end_of_file_is_a_truncated_read() {
        let data = Arc::new(vec![0u8; 64]);
        let err = Channel::parse(&data, 32, ChannelLayout::Standard).unwrap_err();
        assert!(matches!(err, LdError::TruncatedRead { .. }));
    }
}
