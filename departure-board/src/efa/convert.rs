//! Normalization of EFA DTOs into domain types.
//!
//! Every entry is decoded and converted on its own. An entry that fails to
//! decode or lacks a required field is logged and skipped; it never fails
//! the batch it arrived in.

use std::collections::HashSet;

use chrono::NaiveTime;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{Departure, LineType, Stop, delay_minutes, format_hhmm, minutes_until};

use super::types::{
    DepartureDto, DepartureResponse, Entries, StopFinderResponse, StopPointDto,
};

/// `motType` used when upstream omits it.
const UNKNOWN_MOT_TYPE: i32 = -1;

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A time component could not be parsed as an integer
    #[error("invalid {field}: {value:?}")]
    InvalidTime {
        field: &'static str,
        value: Option<String>,
    },

    /// Location is an address, POI or other non-stop kind
    #[error("not a stop (type {0:?})")]
    NotAStop(Option<String>),
}

/// Normalize a stop search response into distinct stops.
///
/// Keeps only points labelled as stops, drops points whose id or name
/// cannot be resolved and removes duplicate ids, keeping the first.
pub fn normalize_stop_finder(response: StopFinderResponse) -> Vec<Stop> {
    let points = response.stop_finder.and_then(|finder| finder.points);
    let candidates: Vec<StopPointDto> = decode_entries(point_entries(points), "stop point");

    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter_map(|point| match convert_stop_point(point) {
            Ok(stop) => Some(stop),
            Err(e) => {
                tracing::trace!(name = ?point.name, error = %e, "skipping stop point");
                None
            }
        })
        .filter(|stop| seen.insert(stop.id.clone()))
        .collect()
}

/// Normalize a departure monitor response.
///
/// `now` is the local time of day used for minutes-until calculations when
/// upstream provides no countdown.
pub fn normalize_departures(response: DepartureResponse, now: NaiveTime) -> Vec<Departure> {
    let entries = Entries::from_field(response.departure_list).into_vec();
    let candidates: Vec<DepartureDto> = decode_entries(entries, "departure");

    candidates
        .iter()
        .filter_map(|dto| match convert_departure(dto, now) {
            Ok(departure) => Some(departure),
            Err(e) => {
                tracing::debug!(error = %e, "skipping departure");
                None
            }
        })
        .collect()
}

/// Convert a single stop point.
pub fn convert_stop_point(point: &StopPointDto) -> Result<Stop, ConversionError> {
    if !point.is_stop() {
        return Err(ConversionError::NotAStop(
            point.any_type.clone().or_else(|| point.point_type.clone()),
        ));
    }

    let stop_ref = point.stop_ref.as_ref();

    let id = non_empty(point.stateless.as_deref())
        .or_else(|| non_empty(stop_ref.and_then(|r| r.id.as_deref())))
        .ok_or(ConversionError::MissingField("stateless / ref.id"))?;

    let name = non_empty(point.name.as_deref()).ok_or(ConversionError::MissingField("name"))?;

    let locality = stop_ref.and_then(|r| r.place.clone());

    Stop::new(id, name, locality).ok_or(ConversionError::MissingField("stateless / name"))
}

/// Convert a single departure entry.
pub fn convert_departure(dto: &DepartureDto, now: NaiveTime) -> Result<Departure, ConversionError> {
    let serving_line = dto
        .serving_line
        .as_ref()
        .ok_or(ConversionError::MissingField("servingLine"))?;
    let line = serving_line
        .number
        .clone()
        .ok_or(ConversionError::MissingField("servingLine.number"))?;
    let destination = serving_line
        .direction
        .clone()
        .ok_or(ConversionError::MissingField("servingLine.direction"))?;

    let scheduled = dto
        .date_time
        .as_ref()
        .ok_or(ConversionError::MissingField("dateTime"))?;
    let scheduled_hour =
        parse_component(scheduled.hour.as_deref()).ok_or_else(|| ConversionError::InvalidTime {
            field: "dateTime.hour",
            value: scheduled.hour.clone(),
        })?;
    let scheduled_minute =
        parse_component(scheduled.minute.as_deref()).ok_or_else(|| {
            ConversionError::InvalidTime {
                field: "dateTime.minute",
                value: scheduled.minute.clone(),
            }
        })?;

    // Without realtime data the vehicle is assumed to run on schedule.
    let real = dto.real_date_time.as_ref().unwrap_or(scheduled);
    let real_hour = parse_component(real.hour.as_deref()).unwrap_or(scheduled_hour);
    let real_minute = parse_component(real.minute.as_deref()).unwrap_or(scheduled_minute);

    let minutes_until = dto
        .countdown
        .unwrap_or_else(|| minutes_until(now, real_hour, real_minute));

    let mot_type = serving_line
        .mot_type
        .and_then(|m| i32::try_from(m).ok())
        .unwrap_or(UNKNOWN_MOT_TYPE);

    Ok(Departure {
        line_type: LineType::classify(&line, mot_type),
        line,
        destination,
        platform: dto.platform.clone().unwrap_or_default(),
        minutes_until,
        delay_minutes: delay_minutes(scheduled_hour, scheduled_minute, real_hour, real_minute),
        scheduled_time: format_hhmm(scheduled_hour, scheduled_minute),
    })
}

/// Resolve `stopFinder.points` into raw point entries.
///
/// An object container holds its entries under a nested `point` field;
/// an object without one holds nothing.
fn point_entries(points: Option<Value>) -> Vec<Value> {
    match Entries::from_field(points) {
        Entries::Single(Value::Object(mut container)) => {
            Entries::from_field(container.remove("point")).into_vec()
        }
        other => other.into_vec(),
    }
}

/// Decode each raw entry independently, keeping the successes.
fn decode_entries<T: DeserializeOwned>(entries: Vec<Value>, kind: &str) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(kind, error = %e, "failed to decode entry");
                None
            }
        })
        .collect()
}

fn parse_component(value: Option<&str>) -> Option<i32> {
    value?.parse().ok()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
