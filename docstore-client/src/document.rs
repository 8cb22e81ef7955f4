//! Document-level results and helper field types.

use crate::error::Reason;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::value::RawValue;
use std::fmt;
use std::str::FromStr;

/// Outcome of storing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// Document id (store-assigned when none was given).
    pub id: String,
    /// Collection name.
    pub collection: String,
    /// Schema name.
    pub schema: String,
    /// Version after the write; starts at 1.
    pub version: i64,
    /// Whether the write created the document rather than replacing it.
    pub created: bool,
}

/// Outcome of a point lookup.
///
/// `found == false` is a normal result, not an error.
#[derive(Debug, Clone)]
pub struct GetResult {
    /// Collection name.
    pub collection: String,
    /// Schema name.
    pub schema: String,
    /// Document id.
    pub id: String,
    /// Whether the document exists.
    pub found: bool,
    /// Current version when found.
    pub version: Option<i64>,
    /// Stored document, undecoded.
    pub source: Option<Box<RawValue>>,
}

impl GetResult {
    /// Decode the stored document into the caller's record type.
    ///
    /// Returns `Ok(None)` when nothing was found or the store returned no
    /// source.
    pub fn source_as<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.source
            .as_deref()
            .map(|raw| serde_json::from_str(raw.get()))
            .transpose()
    }
}

/// Outcome of a document removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Document id.
    pub id: String,
    /// Whether a document was there to delete.
    pub found: bool,
    /// Version recorded for the delete.
    pub version: Option<i64>,
}

/// Response body of index/delete requests.
#[derive(Debug, Deserialize)]
pub(crate) struct WriteResponse {
    #[serde(rename = "_index")]
    pub index: Option<String>,
    #[serde(rename = "_type")]
    pub doc_type: Option<String>,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    /// Elasticsearch 1.x/2.x.
    pub created: Option<bool>,
    /// Elasticsearch 1.x delete.
    pub found: Option<bool>,
    /// Elasticsearch 5+: `created`, `updated`, `deleted`, `not_found`, `noop`.
    pub result: Option<String>,
}

impl WriteResponse {
    /// The version the store assigned. A reply without one is unusable.
    pub fn required_version(&self, status: u16) -> std::result::Result<i64, Reason> {
        self.version
            .ok_or_else(|| Reason::with_status(status, "response carries no _version"))
    }

    pub fn created(&self) -> bool {
        match (&self.result, self.created) {
            (Some(result), _) => result == "created",
            (None, Some(created)) => created,
            (None, None) => false,
        }
    }

    pub fn found(&self) -> bool {
        match (&self.result, self.found) {
            (Some(result), _) => result != "not_found",
            (None, Some(found)) => found,
            (None, None) => false,
        }
    }
}

/// Response body of get requests.
#[derive(Debug, Deserialize)]
pub(crate) struct GetResponse {
    #[serde(rename = "_type")]
    pub doc_type: Option<String>,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    #[serde(default)]
    pub found: bool,
    #[serde(rename = "_source")]
    pub source: Option<Box<RawValue>>,
}

/// A latitude/longitude pair for `geo_point` fields.
///
/// Serialises as `{"lat": .., "lon": ..}`; also reads the `"lat,lon"`
/// string and `[lon, lat]` array forms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lon\", got {s:?}"))?;
        let lat = lat
            .trim()
            .parse()
            .map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
        let lon = lon
            .trim()
            .parse()
            .map_err(|e| format!("bad longitude {lon:?}: {e}"))?;
        Ok(Self { lat, lon })
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Object { lat: f64, lon: f64 },
            Text(String),
            Array([f64; 2]),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Object { lat, lon } => Ok(GeoPoint { lat, lon }),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Array([lon, lat]) => Ok(GeoPoint { lat, lon }),
        }
    }
}

/// Input for `completion` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestField {
    /// Terms the suggester completes from.
    pub input: Vec<String>,
    /// Text returned for a match (older stores only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Arbitrary data returned with a match (older stores only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Ranking weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl SuggestField {
    /// Suggest from the given inputs.
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set output text.
    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set payload.
    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Set weight.
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geo_point_forms() {
        let p: GeoPoint = serde_json::from_value(json!({"lat": 41.12, "lon": -71.34})).unwrap();
        assert_eq!(p, GeoPoint::new(41.12, -71.34));

        let p: GeoPoint = serde_json::from_value(json!("41.12,-71.34")).unwrap();
        assert_eq!(p, GeoPoint::new(41.12, -71.34));

        let p: GeoPoint = serde_json::from_value(json!([-71.34, 41.12])).unwrap();
        assert_eq!(p, GeoPoint::new(41.12, -71.34));

        assert!(serde_json::from_value::<GeoPoint>(json!("nowhere")).is_err());
    }

    #[test]
    fn test_geo_point_serializes_as_object() {
        let value = serde_json::to_value(GeoPoint::new(1.5, 2.5)).unwrap();
        assert_eq!(value, json!({"lat": 1.5, "lon": 2.5}));
    }

    #[test]
    fn test_suggest_field_omits_empty_options() {
        let value = serde_json::to_value(SuggestField::new(["Nevermind", "Nirvana"])).unwrap();
        assert_eq!(value, json!({"input": ["Nevermind", "Nirvana"]}));

        let value = serde_json::to_value(SuggestField::new(["x"]).weight(34)).unwrap();
        assert_eq!(value["weight"], 34);
    }

    #[test]
    fn test_write_response_flags() {
        let legacy: WriteResponse =
            serde_json::from_str(r#"{"_index":"t","_type":"tweet","_id":"1","_version":1,"created":true}"#)
                .unwrap();
        assert!(legacy.created());

        let modern: WriteResponse =
            serde_json::from_str(r#"{"_index":"t","_id":"1","_version":2,"result":"updated"}"#)
                .unwrap();
        assert!(!modern.created());
        assert!(modern.found());
        assert_eq!(modern.required_version(200).unwrap(), 2);

        let missing: WriteResponse =
            serde_json::from_str(r#"{"_index":"t","_id":"9","result":"not_found"}"#).unwrap();
        assert!(!missing.found());

        let reason = missing.required_version(200).unwrap_err();
        assert_eq!(reason.status, Some(200));
        assert!(reason.message.contains("_version"));
    }

    #[test]
    fn test_get_result_decodes_source() {
        #[derive(Deserialize)]
        struct Tweet {
            user: String,
        }

        let response: GetResponse = serde_json::from_str(
            r#"{"_index":"twitter","_type":"tweet","_id":"1","_version":3,"found":true,"_source":{"user":"olivere"}}"#,
        )
        .unwrap();

        let result = GetResult {
            collection: "twitter".to_string(),
            schema: response.doc_type.clone().unwrap_or_default(),
            id: "1".to_string(),
            found: response.found,
            version: response.version,
            source: response.source,
        };

        let tweet: Tweet = result.source_as().unwrap().unwrap();
        assert_eq!(tweet.user, "olivere");
        assert_eq!(result.version, Some(3));
    }
}
