//! LD file format structures and parsing
//!
//! Defines the fixed-layout records of the LD binary telemetry format and
//! provides parsing functions over an in-memory byte buffer.
//!
//! ## LD File Structure
//!
//! LD files contain recorded telemetry from automotive data loggers:
//!
//! 1. **File Header** (1762 bytes at offset 0) - pointers to the channel
//!    metadata chain and the event record, plus session identity fields
//! 2. **Event / Venue / Vehicle** - optional nested records reached by
//!    offset pointers, strictly header → event → venue → vehicle
//! 3. **Channel metadata records** - a singly linked list threaded through
//!    the file by offset pointers
//! 4. **Sample blocks** - raw little-endian words referenced per channel
//!
//! The layout is reverse engineered; regions with no known meaning are
//! consumed at fixed widths and not exposed.

use crate::ld::codec::{decode_fixed_string, parse_u16_le, parse_u32_le, read_exact};
use crate::{LdError, Result};
use chrono::NaiveDateTime;
use tracing::{debug, trace};

/// Size of the file header record in bytes.
pub const LD_HEADER_SIZE: usize = 1762;

// Header field offsets. Regions between the named fields are reserved.
const HEADER_META_PTR: usize = 8;
const HEADER_DATA_PTR: usize = 12;
const HEADER_EVENT_PTR: usize = 36;
const HEADER_DATE: usize = 94;
const HEADER_TIME: usize = 126;
const HEADER_DRIVER: usize = 158;
const HEADER_VEHICLE_ID: usize = 222;
const HEADER_VENUE: usize = 350;
const HEADER_SHORT_COMMENT: usize = 1572;

const HEADER_DATE_LEN: usize = 16;
const HEADER_TIME_LEN: usize = 16;
const HEADER_NAME_LEN: usize = 64;

/// Size of an event record: 64-byte name, 64-byte session, 1024-byte
/// comment, 16-bit venue pointer.
pub const EVENT_SIZE: usize = 1154;
const EVENT_SESSION: usize = 64;
const EVENT_COMMENT: usize = 128;
const EVENT_COMMENT_LEN: usize = 1024;
const EVENT_VENUE_PTR: usize = 1152;

/// Size of a venue record: 64-byte name, 1034 reserved bytes, 16-bit
/// vehicle pointer.
pub const VENUE_SIZE: usize = 1100;
const VENUE_VEHICLE_PTR: usize = 1098;

/// Width of the vehicle id field, the only part of the vehicle record this
/// decoder resolves.
pub const VEHICLE_ID_LEN: usize = 64;

/// The fixed-size header block at the start of every LD file.
///
/// `data_ptr` mirrors the channel-level sample pointers but nothing in the
/// reverse-engineered format is known to consume it; it is retained for
/// diagnostics only.
#[derive(Debug, Clone)]
pub struct LdHeader {
    /// Offset of the first channel metadata record, 0 when no channels exist
    pub meta_ptr: u32,
    /// Reserved sibling of `meta_ptr`, unused by the known layout
    pub data_ptr: u32,
    /// Offset of the event record, 0 when absent
    pub event_ptr: u32,
    /// Nested event record, present when `event_ptr` is nonzero
    pub event: Option<Event>,
    pub driver: String,
    pub vehicle_id: String,
    pub venue: String,
    /// Combined date + time of the capture
    pub datetime: NaiveDateTime,
    pub short_comment: String,
}

/// Event record referenced by the header.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub session: String,
    pub comment: String,
    /// Offset of the venue record, 0 when absent
    pub venue_ptr: u16,
    pub venue: Option<Venue>,
}

/// Venue record referenced by an event.
#[derive(Debug, Clone)]
pub struct Venue {
    pub name: String,
    /// Offset of the vehicle record, 0 when absent
    pub vehicle_ptr: u16,
    pub vehicle: Option<Vehicle>,
}

/// Vehicle record referenced by a venue. The format beyond the id field is
/// not understood, so the record is treated as opaque past name resolution.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: String,
}

impl LdHeader {
    /// Parse the file header at offset 0, following the event/venue/vehicle
    /// pointer chain when present.
    pub fn parse(data: &[u8]) -> Result<Self> {
        trace!(len = data.len(), "reading LD header ({} bytes)", LD_HEADER_SIZE);
        let header = read_exact(data, 0, LD_HEADER_SIZE, "file header")?;

        let meta_ptr = parse_u32_le(header, HEADER_META_PTR, "file header")?;
        let data_ptr = parse_u32_le(header, HEADER_DATA_PTR, "file header")?;
        let event_ptr = parse_u32_le(header, HEADER_EVENT_PTR, "file header")?;

        let date = decode_fixed_string(&header[HEADER_DATE..HEADER_DATE + HEADER_DATE_LEN]);
        let time = decode_fixed_string(&header[HEADER_TIME..HEADER_TIME + HEADER_TIME_LEN]);
        let driver = decode_fixed_string(&header[HEADER_DRIVER..HEADER_DRIVER + HEADER_NAME_LEN]);
        let vehicle_id =
            decode_fixed_string(&header[HEADER_VEHICLE_ID..HEADER_VEHICLE_ID + HEADER_NAME_LEN]);
        let venue = decode_fixed_string(&header[HEADER_VENUE..HEADER_VENUE + HEADER_NAME_LEN]);
        let short_comment = decode_fixed_string(
            &header[HEADER_SHORT_COMMENT..HEADER_SHORT_COMMENT + HEADER_NAME_LEN],
        );

        let datetime = parse_timestamp(&date, &time)?;

        let event = if event_ptr > 0 { Some(Event::parse(data, event_ptr as usize)?) } else { None };

        debug!(
            meta_ptr,
            event_ptr,
            driver = %driver,
            venue = %venue,
            %datetime,
            "parsed LD header"
        );

        Ok(Self {
            meta_ptr,
            data_ptr,
            event_ptr,
            event,
            driver,
            vehicle_id,
            venue,
            datetime,
            short_comment,
        })
    }
}

impl Event {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let record = read_exact(data, offset, EVENT_SIZE, "event record")?;

        let name = decode_fixed_string(&record[..EVENT_SESSION]);
        let session = decode_fixed_string(&record[EVENT_SESSION..EVENT_COMMENT]);
        let comment = decode_fixed_string(&record[EVENT_COMMENT..EVENT_COMMENT + EVENT_COMMENT_LEN]);
        let venue_ptr = parse_u16_le(record, EVENT_VENUE_PTR, "event record")?;

        let venue = if venue_ptr > 0 { Some(Venue::parse(data, venue_ptr as usize)?) } else { None };

        Ok(Self { name, session, comment, venue_ptr, venue })
    }
}

impl Venue {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let record = read_exact(data, offset, VENUE_SIZE, "venue record")?;

        let name = decode_fixed_string(&record[..HEADER_NAME_LEN]);
        let vehicle_ptr = parse_u16_le(record, VENUE_VEHICLE_PTR, "venue record")?;

        let vehicle =
            if vehicle_ptr > 0 { Some(Vehicle::parse(data, vehicle_ptr as usize)?) } else { None };

        Ok(Self { name, vehicle_ptr, vehicle })
    }
}

impl Vehicle {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let record = read_exact(data, offset, VEHICLE_ID_LEN, "vehicle record")?;
        Ok(Self { id: decode_fixed_string(record) })
    }
}

/// Parse the header's split date and time fields into one timestamp.
///
/// Some loggers write seconds and some do not, so the full format is tried
/// first and the minute-precision format is the fallback. Both failing is
/// fatal for the document.
fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime> {
    let combined = format!("{} {}", date, time);
    NaiveDateTime::parse_from_str(&combined, "%d/%m/%Y %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&combined, "%d/%m/%Y %H:%M"))
        .map_err(|_| LdError::HeaderTimestamp { date: date.to_string(), time: time.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::LdFixture;
    use anyhow::Result;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn header_round_trips_identity_fields() -> Result<()> {
        let bytes = LdFixture::new()
            .driver("A. Senna")
            .vehicle_id("kart-07")
            .venue("Interlagos")
            .short_comment("practice stint")
            .date_time("31/12/2023", "23:59:58")
            .build();

        let header = LdHeader::parse(&bytes)?;
        assert_eq!(header.driver, "A. Senna");
        assert_eq!(header.vehicle_id, "kart-07");
        assert_eq!(header.venue, "Interlagos");
        assert_eq!(header.short_comment, "practice stint");
        assert_eq!(header.meta_ptr, 0);
        assert_eq!(header.event_ptr, 0);
        assert!(header.event.is_none());
        assert_eq!(
            header.datetime,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap().and_hms_opt(23, 59, 58).unwrap()
        );
        Ok(())
    }

    #[test]
    fn timestamp_without_seconds_uses_fallback_format() -> Result<()> {
        let bytes = LdFixture::new().date_time("31/12/2023", "23:59").build();
        let header = LdHeader::parse(&bytes)?;
        assert_eq!(
            header.datetime,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap().and_hms_opt(23, 59, 0).unwrap()
        );
        assert_eq!(header.datetime.second(), 0);
        Ok(())
    }

    #[test]
    fn unparseable_timestamp_is_fatal() {
        let bytes = LdFixture::new().date_time("99/99/9999", "25:61").build();
        let err = LdHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, LdError::HeaderTimestamp { .. }));
        assert!(err.is_fatal_for_document());
    }

    #[test]
    fn truncated_header_is_rejected() {
        let err = LdHeader::parse(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, LdError::TruncatedRead { .. }));
    }

    #[test]
    fn event_venue_vehicle_chain_parses_when_present() -> Result<()> {
        let bytes = LdFixture::new()
            .event("Round 4", "Qualifying", "wet track")
            .event_venue("Phillip Island")
            .venue_vehicle("86-chassis-11")
            .build();

        let header = LdHeader::parse(&bytes)?;
        let event = header.event.expect("event record should be present");
        assert_eq!(event.name, "Round 4");
        assert_eq!(event.session, "Qualifying");
        assert_eq!(event.comment, "wet track");

        let venue = event.venue.expect("venue record should be present");
        assert_eq!(venue.name, "Phillip Island");

        let vehicle = venue.vehicle.expect("vehicle record should be present");
        assert_eq!(vehicle.id, "86-chassis-11");
        Ok(())
    }

    #[test]
    fn event_without_venue_stops_the_descent() -> Result<()> {
        let bytes = LdFixture::new().event("Test Day", "S1", "").build();
        let header = LdHeader::parse(&bytes)?;
        let event = header.event.expect("event record should be present");
        assert_eq!(event.venue_ptr, 0);
        assert!(event.venue.is_none());
        Ok(())
    }

    #[test]
    fn garbage_identity_fields_degrade_to_empty_strings() -> Result<()> {
        let mut bytes = LdFixture::new().driver("will be garbage").build();
        // Stamp non-ASCII into the driver field.
        bytes[HEADER_DRIVER] = 0xFE;
        let header = LdHeader::parse(&bytes)?;
        assert_eq!(header.driver, "");
        Ok(())
    }
}
