// In-memory data source for demos and tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::error::{Result, SourceError};
use crate::core::format::{PredictionCounts, Record, SignalType};
use crate::core::lock;
use crate::core::source::DataSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Samples(String, SignalType),
    Predictions(String),
    Records,
}

/// Serves fixed data and logs every request it receives.
/// Unknown ids answer with `SourceError::Unavailable`.
#[derive(Default)]
pub struct MemorySource {
    samples: Mutex<HashMap<(String, SignalType), Vec<f64>>>,
    predictions: Mutex<HashMap<String, PredictionCounts>>,
    records: Mutex<Option<Vec<Record>>>,
    requests: Mutex<Vec<Request>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(self, id: &str, signal_type: SignalType, samples: Vec<f64>) -> Self {
        self.insert_samples(id, signal_type, samples);
        self
    }

    pub fn with_predictions(self, id: &str, counts: PredictionCounts) -> Self {
        lock(&self.predictions).insert(id.to_string(), counts);
        self
    }

    pub fn with_records(self, records: Vec<Record>) -> Self {
        self.set_records(Some(records));
        self
    }

    pub fn insert_samples(&self, id: &str, signal_type: SignalType, samples: Vec<f64>) {
        lock(&self.samples).insert((id.to_string(), signal_type), samples);
    }

    /// `None` makes the record list unavailable.
    pub fn set_records(&self, records: Option<Vec<Record>>) {
        *lock(&self.records) = records;
    }

    pub fn requests(&self) -> Vec<Request> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn log(&self, request: Request) {
        lock(&self.requests).push(request);
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_samples(&self, id: &str, signal_type: SignalType) -> Result<Vec<f64>> {
        self.log(Request::Samples(id.to_string(), signal_type));
        lock(&self.samples)
            .get(&(id.to_string(), signal_type))
            .cloned()
            .ok_or_else(|| SourceError::Unavailable(format!("{signal_type} {id}")))
    }

    async fn fetch_prediction_counts(&self, id: &str) -> Result<PredictionCounts> {
        self.log(Request::Predictions(id.to_string()));
        lock(&self.predictions)
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable(format!("Pred {id}")))
    }

    async fn fetch_records(&self) -> Result<Vec<Record>> {
        self.log(Request::Records);
        lock(&self.records)
            .clone()
            .ok_or_else(|| SourceError::Unavailable("record list".to_string()))
    }
}
