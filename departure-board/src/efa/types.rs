//! EFA API response DTOs.
//!
//! These types map to the EFA JSON dialect served by VRR. Everything is
//! optional because EFA omits fields freely, and scalar fields arrive as
//! strings or numbers depending on the server build. Container fields whose
//! shape varies between "absent", "one object" and "array of objects" are
//! kept as raw [`Value`]s and resolved through [`Entries`].

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Response from `XSLT_STOPFINDER_REQUEST`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopFinderResponse {
    #[serde(default)]
    pub stop_finder: Option<StopFinder>,
}

/// The `stopFinder` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopFinder {
    /// Either an array of points, or an object with a nested `point`
    /// field that is itself a single point or an array.
    #[serde(default)]
    pub points: Option<Value>,
}

/// A candidate location from stop search.
///
/// Upstream returns addresses and POIs alongside stops; only points whose
/// `type` or `anyType` is `"stop"` become [`Stop`](crate::domain::Stop)s.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPointDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub point_type: Option<String>,

    /// Stable, context-free stop identifier.
    #[serde(default, deserialize_with = "lenient_string")]
    pub stateless: Option<String>,

    #[serde(default, rename = "ref")]
    pub stop_ref: Option<StopRefDto>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub any_type: Option<String>,
}

impl StopPointDto {
    /// Whether upstream labels this point as a stop.
    pub fn is_stop(&self) -> bool {
        self.point_type.as_deref() == Some("stop") || self.any_type.as_deref() == Some("stop")
    }
}

/// The nested `ref` block of a stop point.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopRefDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,

    /// Locality, e.g. "Essen".
    #[serde(default, deserialize_with = "lenient_string")]
    pub place: Option<String>,
}

/// Response from `XSLT_DM_REQUEST`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureResponse {
    /// A single departure object or an array of them.
    #[serde(default)]
    pub departure_list: Option<Value>,
}

/// One entry of the departure list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub point_name: Option<String>,

    /// Scheduled departure.
    #[serde(default)]
    pub date_time: Option<DateTimeDto>,

    /// Realtime departure, absent when no realtime data exists.
    #[serde(default)]
    pub real_date_time: Option<DateTimeDto>,

    #[serde(default)]
    pub serving_line: Option<ServingLineDto>,

    /// Upstream minutes-until-departure.
    #[serde(default, deserialize_with = "lenient_int")]
    pub countdown: Option<i64>,
}

/// Date/time components, each a decimal string such as `"8"` or `"05"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateTimeDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub day: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hour: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub minute: Option<String>,
}

/// The line serving a departure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingLineDto {
    /// Line label, e.g. "U18".
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub direction: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub direction_from: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// Mode of transport code.
    #[serde(default, deserialize_with = "lenient_int")]
    pub mot_type: Option<i64>,
}

/// A container field resolved to one of its three upstream shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Entries {
    Absent,
    Single(Value),
    Sequence(Vec<Value>),
}

impl Entries {
    /// Classify a raw container field.
    ///
    /// `null` counts as absent. Scalars are not a valid container and are
    /// also treated as absent.
    pub fn from_field(field: Option<Value>) -> Self {
        match field {
            None | Some(Value::Null) => Entries::Absent,
            Some(Value::Array(items)) => Entries::Sequence(items),
            Some(object @ Value::Object(_)) => Entries::Single(object),
            Some(other) => {
                tracing::debug!(value = %other, "ignoring scalar container field");
                Entries::Absent
            }
        }
    }

    /// Flatten into a sequence of zero or more entries.
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Entries::Absent => Vec::new(),
            Entries::Single(value) => vec![value],
            Entries::Sequence(values) => values,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(Number),
}

/// Accept a string or a number, rendering numbers as their decimal text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    }))
}

/// Accept an integer or an integer-valued string. Anything else is `None`.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<Scalar>::deserialize(deserializer)?.and_then(|scalar| match scalar {
            Scalar::Text(text) => text.parse().ok(),
            Scalar::Number(number) => number.as_i64(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_stop_point() {
        let json = r#"{
            "usage": "sf",
            "type": "any",
            "name": "Essen, Hauptbahnhof",
            "stateless": "20009289",
            "anyType": "stop",
            "ref": {"id": "20009289", "gid": "de:05113:9289", "place": "Essen"}
        }"#;

        let point: StopPointDto = serde_json::from_str(json).unwrap();

        assert_eq!(point.name.as_deref(), Some("Essen, Hauptbahnhof"));
        assert_eq!(point.point_type.as_deref(), Some("any"));
        assert_eq!(point.stateless.as_deref(), Some("20009289"));
        assert!(point.is_stop());

        let stop_ref = point.stop_ref.unwrap();
        assert_eq!(stop_ref.id.as_deref(), Some("20009289"));
        assert_eq!(stop_ref.place.as_deref(), Some("Essen"));
    }

    #[test]
    fn deserialize_departure_with_string_numbers() {
        let json = r#"{
            "platform": "2",
            "countdown": "7",
            "dateTime": {"year": "2024", "month": "3", "day": "15", "hour": "8", "minute": "5"},
            "servingLine": {"number": "U18", "direction": "Mülheim Hbf", "motType": "2"}
        }"#;

        let dto: DepartureDto = serde_json::from_str(json).unwrap();

        assert_eq!(dto.platform.as_deref(), Some("2"));
        assert_eq!(dto.countdown, Some(7));
        assert!(dto.real_date_time.is_none());

        let line = dto.serving_line.unwrap();
        assert_eq!(line.number.as_deref(), Some("U18"));
        assert_eq!(line.mot_type, Some(2));

        let date_time = dto.date_time.unwrap();
        assert_eq!(date_time.hour.as_deref(), Some("8"));
        assert_eq!(date_time.minute.as_deref(), Some("5"));
    }

    #[test]
    fn deserialize_departure_with_json_numbers() {
        let json = r#"{
            "platform": 3,
            "countdown": 12,
            "dateTime": {"hour": 23, "minute": 58},
            "servingLine": {"number": 122, "direction": "Essen Hbf", "motType": 5}
        }"#;

        let dto: DepartureDto = serde_json::from_str(json).unwrap();

        assert_eq!(dto.platform.as_deref(), Some("3"));
        assert_eq!(dto.countdown, Some(12));
        assert_eq!(dto.date_time.unwrap().hour.as_deref(), Some("23"));

        let line = dto.serving_line.unwrap();
        assert_eq!(line.number.as_deref(), Some("122"));
        assert_eq!(line.mot_type, Some(5));
    }

    #[test]
    fn non_numeric_countdown_is_absent() {
        let dto: DepartureDto = serde_json::from_str(r#"{"countdown": "soon"}"#).unwrap();
        assert!(dto.countdown.is_none());
    }

    #[test]
    fn null_fields_are_absent() {
        let dto: DepartureDto =
            serde_json::from_str(r#"{"platform": null, "servingLine": null}"#).unwrap();
        assert!(dto.platform.is_none());
        assert!(dto.serving_line.is_none());
    }

    #[test]
    fn wrong_structure_fails_to_decode() {
        let result = serde_json::from_str::<DepartureDto>(r#"{"servingLine": "U18"}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<DepartureDto>(r#"{"platform": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let dto: DepartureDto =
            serde_json::from_str(r#"{"stopID": "20009289", "x": {"nested": [1, 2]}}"#).unwrap();
        assert!(dto.serving_line.is_none());
    }

    #[test]
    fn entries_shapes() {
        assert_eq!(Entries::from_field(None), Entries::Absent);
        assert_eq!(Entries::from_field(Some(Value::Null)), Entries::Absent);
        assert_eq!(Entries::from_field(Some(json!("text"))), Entries::Absent);
        assert_eq!(
            Entries::from_field(Some(json!({"a": 1}))),
            Entries::Single(json!({"a": 1}))
        );
        assert_eq!(
            Entries::from_field(Some(json!([{"a": 1}, {"a": 2}]))),
            Entries::Sequence(vec![json!({"a": 1}), json!({"a": 2})])
        );
    }

    #[test]
    fn entries_flatten() {
        assert!(Entries::Absent.into_vec().is_empty());
        assert_eq!(Entries::Single(json!({"a": 1})).into_vec().len(), 1);
        assert_eq!(
            Entries::Sequence(vec![json!(1), json!(2), json!(3)])
                .into_vec()
                .len(),
            3
        );
    }

    #[test]
    fn deserialize_envelopes_without_containers() {
        let response: StopFinderResponse = serde_json::from_str("{}").unwrap();
        assert!(response.stop_finder.is_none());

        let response: DepartureResponse = serde_json::from_str(r#"{"parameters": []}"#).unwrap();
        assert!(response.departure_list.is_none());
    }
}
