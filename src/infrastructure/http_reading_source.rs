// Sensor API reading source implementation
use crate::application::reading_source::ReadingSource;
use crate::domain::reading::{Quantity, Reading};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;

const MAX_RANGE_READINGS: usize = 1000;

#[derive(Debug, Clone)]
pub struct HttpReadingSource {
    base_url: String,
    client: reqwest::Client,
}

/// Record as served by `/api/v1/data` and `/api/v1/data/latest`
#[derive(Debug, Deserialize)]
struct SensorRecord {
    timestamp: String,
    value: f64,
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    location: String,
}

impl HttpReadingSource {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build sensor API client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn latest_url(&self, quantity: Quantity) -> String {
        format!(
            "{}/api/v1/data/latest?data_type={}",
            self.base_url,
            quantity.as_api_str()
        )
    }

    fn range_url(&self, quantity: Quantity, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        let start = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end = end.to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            "{}/api/v1/data?data_type={}&start_time={}&end_time={}&limit={}",
            self.base_url,
            quantity.as_api_str(),
            urlencoding::encode(&start),
            urlencoding::encode(&end),
            MAX_RANGE_READINGS
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to sensor API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sensor API request failed with status {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse sensor API response")
    }
}

/// Accepts RFC 3339 and the API's `YYYY-MM-DD HH:MM:SS[Z]` form
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let trimmed = raw.trim_end_matches('Z');
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn to_reading(record: SensorRecord) -> Option<Reading> {
    if !record.value.is_finite() {
        tracing::warn!("Skipping non-finite reading at {}", record.timestamp);
        return None;
    }

    match parse_timestamp(&record.timestamp) {
        Some(timestamp) => Some(Reading::new(
            timestamp,
            record.value,
            record.device_id,
            record.location,
        )),
        None => {
            tracing::warn!("Skipping reading with invalid timestamp: {}", record.timestamp);
            None
        }
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    async fn fetch_latest(&self, quantity: Quantity) -> Result<Option<Reading>> {
        let record: Option<SensorRecord> = self.get_json(&self.latest_url(quantity)).await?;
        Ok(record.and_then(to_reading))
    }

    async fn fetch_range(
        &self,
        quantity: Quantity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>> {
        let records: Vec<SensorRecord> = self
            .get_json(&self.range_url(quantity, start, end))
            .await?;

        let mut readings: Vec<Reading> = records.into_iter().filter_map(to_reading).collect();
        readings.sort_by_key(|r| r.timestamp);

        tracing::debug!("Fetched {} {} readings", readings.len(), quantity);
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn source() -> HttpReadingSource {
        HttpReadingSource::new("http://localhost:8000/".to_string(), Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-06-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01T21:30:00+09:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01 12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_to_reading_skips_invalid_records() {
        let record = |timestamp: &str, value: f64| SensorRecord {
            timestamp: timestamp.to_string(),
            value,
            device_id: "sensor_001".to_string(),
            location: "Greenhouse A".to_string(),
        };

        assert!(to_reading(record("2025-06-01 12:30:00Z", 24.5)).is_some());
        assert!(to_reading(record("not a time", 24.5)).is_none());
        assert!(to_reading(record("2025-06-01 12:30:00Z", f64::NAN)).is_none());
    }

    #[test]
    fn test_urls() {
        let source = source();
        assert_eq!(
            source.latest_url(Quantity::Ph),
            "http://localhost:8000/api/v1/data/latest?data_type=ph"
        );

        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        assert_eq!(
            source.range_url(Quantity::Temperature, start, end),
            "http://localhost:8000/api/v1/data?data_type=temperature\
             &start_time=2025-06-01T00%3A00%3A00Z&end_time=2025-06-02T00%3A00%3A00Z&limit=1000"
        );
    }

    #[test]
    fn test_record_deserialization() {
        let latest: Option<SensorRecord> = serde_json::from_str("null").unwrap();
        assert!(latest.is_none());

        let record: SensorRecord = serde_json::from_value(serde_json::json!({
            "timestamp": "2025-06-01 12:30:00Z",
            "value": 6.8,
            "device_id": "sensor_001",
            "location": "Greenhouse A"
        }))
        .unwrap();
        let reading = to_reading(record).unwrap();
        assert_eq!(reading.value, 6.8);
        assert_eq!(reading.device_id, "sensor_001");
    }
}
