//! Test utilities for building synthetic LD fixtures
//!
//! The LD format has no public corpus, so tests and benchmarks build their
//! own files: [`LdFixture`] lays out a header, optional nested event/venue/
//! vehicle records, a channel metadata chain and the raw sample blocks, all
//! with the pointer wiring a real logger would produce. Pointer overrides
//! let corruption scenarios (cycles, wild offsets) be expressed directly.

#![cfg(any(test, feature = "benchmark"))]

use crate::ld::channel::ChannelLayout;
use crate::ld::format::{EVENT_SIZE, LD_HEADER_SIZE, VEHICLE_ID_LEN, VENUE_SIZE};
use crate::types::Scaling;

/// One channel's worth of fixture data: metadata fields plus raw words.
pub struct ChannelSpec {
    name: String,
    short_name: String,
    unit: String,
    category: u16,
    subtype: u16,
    frequency: u16,
    scaling: Scaling,
    raw: Vec<u8>,
    sample_count: u32,
}

impl ChannelSpec {
    fn new(name: &str, short_name: &str, unit: &str, category: u16, subtype: u16) -> Self {
        Self {
            name: name.to_string(),
            short_name: short_name.to_string(),
            unit: unit.to_string(),
            category,
            subtype,
            frequency: 20,
            scaling: Scaling::IDENTITY,
            raw: Vec::new(),
            sample_count: 0,
        }
    }

    /// 16-bit signed integer channel.
    pub fn int16(name: &str, short_name: &str, unit: &str) -> Self {
        Self::new(name, short_name, unit, 0x03, 2)
    }

    /// 32-bit signed integer channel.
    pub fn int32(name: &str, short_name: &str, unit: &str) -> Self {
        Self::new(name, short_name, unit, 0x03, 4)
    }

    /// Half-precision float channel.
    pub fn float16(name: &str, short_name: &str, unit: &str) -> Self {
        Self::new(name, short_name, unit, 0x07, 2)
    }

    /// Single-precision float channel.
    pub fn float32(name: &str, short_name: &str, unit: &str) -> Self {
        Self::new(name, short_name, unit, 0x07, 4)
    }

    /// Channel with arbitrary encoding tags, for unsupported-type scenarios.
    pub fn raw_encoding(
        name: &str,
        short_name: &str,
        unit: &str,
        category: u16,
        subtype: u16,
    ) -> Self {
        Self::new(name, short_name, unit, category, subtype)
    }

    pub fn frequency(mut self, hz: u16) -> Self {
        self.frequency = hz;
        self
    }

    pub fn scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn raw_i16(mut self, values: &[i16]) -> Self {
        self.raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.sample_count = values.len() as u32;
        self
    }

    pub fn raw_i32(mut self, values: &[i32]) -> Self {
        self.raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.sample_count = values.len() as u32;
        self
    }

    pub fn raw_f32(mut self, values: &[f32]) -> Self {
        self.raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.sample_count = values.len() as u32;
        self
    }

    /// Raw 16-bit words, used for half-precision bit patterns.
    pub fn raw_u16(mut self, values: &[u16]) -> Self {
        self.raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.sample_count = values.len() as u32;
        self
    }
}

/// Builder for a complete synthetic LD file.
pub struct LdFixture {
    layout: ChannelLayout,
    driver: String,
    vehicle_id: String,
    venue: String,
    short_comment: String,
    date: String,
    time: String,
    event: Option<(String, String, String)>,
    event_venue: Option<String>,
    venue_vehicle: Option<String>,
    channels: Vec<ChannelSpec>,
    next_overrides: Vec<(usize, u32)>,
}

impl Default for LdFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LdFixture {
    pub fn new() -> Self {
        Self::with_layout(ChannelLayout::Standard)
    }

    pub fn with_layout(layout: ChannelLayout) -> Self {
        Self {
            layout,
            driver: String::new(),
            vehicle_id: String::new(),
            venue: String::new(),
            short_comment: String::new(),
            date: "01/01/2024".to_string(),
            time: "12:00:00".to_string(),
            event: None,
            event_venue: None,
            venue_vehicle: None,
            channels: Vec::new(),
            next_overrides: Vec::new(),
        }
    }

    pub fn driver(mut self, driver: &str) -> Self {
        self.driver = driver.to_string();
        self
    }

    pub fn vehicle_id(mut self, vehicle_id: &str) -> Self {
        self.vehicle_id = vehicle_id.to_string();
        self
    }

    pub fn venue(mut self, venue: &str) -> Self {
        self.venue = venue.to_string();
        self
    }

    pub fn short_comment(mut self, short_comment: &str) -> Self {
        self.short_comment = short_comment.to_string();
        self
    }

    pub fn date_time(mut self, date: &str, time: &str) -> Self {
        self.date = date.to_string();
        self.time = time.to_string();
        self
    }

    /// Attach an event record; required before [`event_venue`](Self::event_venue).
    pub fn event(mut self, name: &str, session: &str, comment: &str) -> Self {
        self.event = Some((name.to_string(), session.to_string(), comment.to_string()));
        self
    }

    /// Attach a venue record hanging off the event.
    pub fn event_venue(mut self, name: &str) -> Self {
        assert!(self.event.is_some(), "event_venue requires an event record");
        self.event_venue = Some(name.to_string());
        self
    }

    /// Attach a vehicle record hanging off the venue.
    pub fn venue_vehicle(mut self, id: &str) -> Self {
        assert!(self.event_venue.is_some(), "venue_vehicle requires a venue record");
        self.venue_vehicle = Some(id.to_string());
        self
    }

    pub fn channel(mut self, spec: ChannelSpec) -> Self {
        self.channels.push(spec);
        self
    }

    /// Replace the next-pointer of channel record `index` in the built
    /// bytes, for cycle and wild-pointer scenarios.
    pub fn override_next(mut self, index: usize, target: u32) -> Self {
        self.next_overrides.push((index, target));
        self
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn event_offset(&self) -> usize {
        LD_HEADER_SIZE
    }

    fn venue_offset(&self) -> usize {
        self.event_offset() + EVENT_SIZE
    }

    fn vehicle_offset(&self) -> usize {
        self.venue_offset() + VENUE_SIZE
    }

    fn channels_base(&self) -> usize {
        if self.venue_vehicle.is_some() {
            self.vehicle_offset() + VEHICLE_ID_LEN
        } else if self.event_venue.is_some() {
            self.vehicle_offset()
        } else if self.event.is_some() {
            self.venue_offset()
        } else {
            LD_HEADER_SIZE
        }
    }

    /// Offset of channel record `index` in the built file.
    pub fn channel_offset(&self, index: usize) -> u32 {
        (self.channels_base() + index * self.layout.record_len()) as u32
    }

    fn data_base(&self) -> usize {
        self.channels_base() + self.channels.len() * self.layout.record_len()
    }

    /// Serialize the fixture to LD bytes.
    pub fn build(&self) -> Vec<u8> {
        let data_base = self.data_base();
        let total = data_base + self.channels.iter().map(|c| c.raw.len()).sum::<usize>();
        let mut bytes = vec![0u8; total];

        // Header fields; everything between them stays zeroed reserved space.
        let meta_ptr = if self.channels.is_empty() { 0 } else { self.channel_offset(0) };
        put_u32(&mut bytes, 8, meta_ptr);
        put_u32(&mut bytes, 36, if self.event.is_some() { self.event_offset() as u32 } else { 0 });
        put_str(&mut bytes, 94, 16, &self.date);
        put_str(&mut bytes, 126, 16, &self.time);
        put_str(&mut bytes, 158, 64, &self.driver);
        put_str(&mut bytes, 222, 64, &self.vehicle_id);
        put_str(&mut bytes, 350, 64, &self.venue);
        put_str(&mut bytes, 1572, 64, &self.short_comment);

        if let Some((name, session, comment)) = &self.event {
            let base = self.event_offset();
            put_str(&mut bytes, base, 64, name);
            put_str(&mut bytes, base + 64, 64, session);
            put_str(&mut bytes, base + 128, 1024, comment);
            if self.event_venue.is_some() {
                put_u16(&mut bytes, base + 1152, self.venue_offset() as u16);
            }
        }

        if let Some(name) = &self.event_venue {
            let base = self.venue_offset();
            put_str(&mut bytes, base, 64, name);
            if self.venue_vehicle.is_some() {
                put_u16(&mut bytes, base + 1098, self.vehicle_offset() as u16);
            }
        }

        if let Some(id) = &self.venue_vehicle {
            put_str(&mut bytes, self.vehicle_offset(), 64, id);
        }

        let mut data_offset = data_base;
        for (index, spec) in self.channels.iter().enumerate() {
            let base = self.channel_offset(index) as usize;
            let prev = if index == 0 { 0 } else { self.channel_offset(index - 1) };
            let next = self
                .next_overrides
                .iter()
                .rev()
                .find(|(i, _)| *i == index)
                .map(|(_, target)| *target)
                .unwrap_or_else(|| {
                    if index + 1 == self.channels.len() {
                        0
                    } else {
                        self.channel_offset(index + 1)
                    }
                });

            put_u32(&mut bytes, base, prev);
            put_u32(&mut bytes, base + 4, next);
            put_u32(&mut bytes, base + 8, data_offset as u32);
            put_u32(&mut bytes, base + 12, spec.sample_count);
            put_u16(&mut bytes, base + 18, spec.category);
            put_u16(&mut bytes, base + 20, spec.subtype);
            put_u16(&mut bytes, base + 22, spec.frequency);
            put_i16(&mut bytes, base + 24, spec.scaling.shift);
            put_i16(&mut bytes, base + 26, spec.scaling.multiplier);
            put_i16(&mut bytes, base + 28, spec.scaling.scale);
            put_i16(&mut bytes, base + 30, spec.scaling.dec_places);
            put_str(&mut bytes, base + 32, 32, &spec.name);
            put_str(&mut bytes, base + 64, 8, &spec.short_name);
            put_str(&mut bytes, base + 72, 12, &spec.unit);

            bytes[data_offset..data_offset + spec.raw.len()].copy_from_slice(&spec.raw);
            data_offset += spec.raw.len();
        }

        bytes
    }
}

fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_i16(bytes: &mut [u8], offset: usize, value: i16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_str(bytes: &mut [u8], offset: usize, width: usize, value: &str) {
    let raw = value.as_bytes();
    let len = raw.len().min(width);
    bytes[offset..offset + len].copy_from_slice(&raw[..len]);
}
