// Data structures for records, series and prediction buckets

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::core::constants::SAMPLE_RATE_HZ;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    #[serde(rename = "ECG")]
    Ecg,
    #[serde(rename = "BPM")]
    Bpm,
    #[serde(rename = "Pred")]
    Pred,
}

impl SignalType {
    pub const ALL: [SignalType; 3] = [SignalType::Ecg, SignalType::Bpm, SignalType::Pred];

    /// Query value used by the record service.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Ecg => "ECG",
            SignalType::Bpm => "BPM",
            SignalType::Pred => "Pred",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECG" => Ok(SignalType::Ecg),
            "BPM" => Ok(SignalType::Bpm),
            "Pred" => Ok(SignalType::Pred),
            other => Err(format!("unknown signal type: {other}")),
        }
    }
}

/// Catalog entry describing one stored session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "full_name")]
    pub owner_name: String,
    pub email: String,
    pub created_date: String,
    pub created_time: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub length: u64,
}

impl Record {
    /// Creation timestamp, if the service sent parseable date and time strings.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        let date = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(self.created_date.trim(), fmt).ok())?;
        let time = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(self.created_time.trim(), fmt).ok())?;
        Some(date.and_time(time))
    }
}

/// Decodes a record list entry by entry. Malformed entries are logged and skipped.
pub fn decode_records(values: Vec<Value>) -> Vec<Record> {
    let total = values.len();
    let records: Vec<Record> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<Record>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping record #{}: {}", i, e);
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!("Kept {} of {} records", records.len(), total);
    }
    records
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub time: f64,
    pub value: f64,
}

/// Ordered, immutable sequence of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<SamplePoint>,
}

impl Series {
    /// Builds the time axis for raw samples.
    ///
    /// Rate series (BPM) are indexed by tick number; every other type is
    /// indexed in seconds at the fixed sample rate.
    pub fn from_samples(samples: &[f64], signal_type: SignalType) -> Self {
        let rate = SAMPLE_RATE_HZ as f64;
        let points = samples
            .iter()
            .enumerate()
            .map(|(i, &value)| SamplePoint {
                time: match signal_type {
                    SignalType::Bpm => i as f64,
                    _ => i as f64 / rate,
                },
                value,
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    /// `points[start..start + size]`, shortened to the available data.
    /// Never wraps; a start past the end yields an empty slice.
    pub fn window(&self, start: usize, size: usize) -> &[SamplePoint] {
        let len = self.points.len();
        let lo = start.min(len);
        let hi = start.saturating_add(size).min(len);
        &self.points[lo..hi]
    }

    /// Duration in seconds at the fixed sample rate.
    pub fn duration(&self) -> f64 {
        self.points.len() as f64 / SAMPLE_RATE_HZ as f64
    }
}

/// Label to count map in the order the service sent it.
pub type PredictionCounts = IndexMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledBucket {
    pub label: String,
    pub count: u64,
    pub color: Rgb,
}
