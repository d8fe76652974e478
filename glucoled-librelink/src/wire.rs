//! LibreLinkUp response payloads and their conversion into [`Reading`]s.
//!
//! Every response is wrapped in an envelope `{"status": 0, "data": ...}`.
//! A non-zero status carries an `error.message` instead of data.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use glucoled_types::{Reading, TrendArrow};

use crate::FetchError;

/// Timestamp format used by the service, e.g. `12/22/2023 5:40:00 PM`.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Response envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: i32,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The error message, or a generic one naming the status.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| format!("status {}", self.status))
    }
}

/// Login response: either an auth ticket or a regional redirect.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(default)]
    pub redirect: bool,
    pub region: Option<String>,
    pub auth_ticket: Option<AuthTicket>,
}

#[derive(Debug, Deserialize)]
pub struct AuthTicket {
    pub token: String,
    /// Expiry as Unix seconds.
    pub expires: Option<u64>,
}

/// One followed patient from `/llu/connections`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub patient_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Payload of `/llu/connections/{patientId}/graph`.
///
/// The graph history is ignored; only the latest measurement matters.
#[derive(Debug, Deserialize)]
pub struct GraphData {
    pub connection: Option<GraphConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConnection {
    pub glucose_measurement: Option<Measurement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    pub value_in_mg_per_dl: Option<f64>,
    pub value: Option<f64>,
    pub factory_timestamp: Option<String>,
    pub timestamp: Option<String>,
    pub trend_arrow: Option<u8>,
}

impl Measurement {
    /// Convert to a [`Reading`].
    ///
    /// Prefers the mg/dL value and the UTC factory timestamp, falling back to
    /// the display value and the local timestamp.
    pub fn to_reading(&self) -> Result<Reading, FetchError> {
        let value = self
            .value_in_mg_per_dl
            .or(self.value)
            .ok_or_else(|| FetchError::NoData("measurement has no value".to_string()))?;

        let timestamp_ms = match (&self.factory_timestamp, &self.timestamp) {
            (Some(utc), _) => parse_utc_timestamp(utc)?,
            (None, Some(local)) => parse_local_timestamp(local)?,
            (None, None) => {
                return Err(FetchError::NoData(
                    "measurement has no timestamp".to_string(),
                ))
            }
        };

        let trend = self
            .trend_arrow
            .map(TrendArrow::from_code)
            .unwrap_or_default();

        Ok(Reading::new(value, timestamp_ms).with_trend(trend))
    }
}

impl GraphData {
    /// Extract the latest reading.
    pub fn latest_reading(&self) -> Result<Reading, FetchError> {
        self.connection
            .as_ref()
            .and_then(|c| c.glucose_measurement.as_ref())
            .ok_or_else(|| FetchError::NoData("no glucose measurement".to_string()))?
            .to_reading()
    }
}

fn parse_naive(raw: &str) -> Result<NaiveDateTime, FetchError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| FetchError::Parse(format!("timestamp '{}': {}", raw, e)))
}

fn to_epoch_ms(millis: i64, raw: &str) -> Result<u64, FetchError> {
    u64::try_from(millis)
        .map_err(|_| FetchError::Parse(format!("timestamp '{}' predates the epoch", raw)))
}

/// Parse a service timestamp that is expressed in UTC.
pub fn parse_utc_timestamp(raw: &str) -> Result<u64, FetchError> {
    let naive = parse_naive(raw)?;
    to_epoch_ms(Utc.from_utc_datetime(&naive).timestamp_millis(), raw)
}

/// Parse a service timestamp that is expressed in the host's local time.
pub fn parse_local_timestamp(raw: &str) -> Result<u64, FetchError> {
    let naive = parse_naive(raw)?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FetchError::Parse(format!("timestamp '{}' does not exist locally", raw)))?;
    to_epoch_ms(local.timestamp_millis(), raw)
}
