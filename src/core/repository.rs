// Per-type signal slots with fetch deduplication

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::core::error::FetchError;
use crate::core::format::{PredictionCounts, Series, SignalType};
use crate::core::source::DataSource;

/// Result of a load: either a new fetch or the slot's current value.
#[derive(Debug, Clone)]
pub enum Loaded<T> {
    Fresh(Arc<T>),
    Cached(Arc<T>),
}

impl<T> Loaded<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Loaded::Fresh(_))
    }

    pub fn value(&self) -> &Arc<T> {
        match self {
            Loaded::Fresh(v) | Loaded::Cached(v) => v,
        }
    }
}

struct Slot<T> {
    // id of the last successful fetch; "" until something is loaded
    resolved_id: String,
    value: Arc<T>,
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self {
            resolved_id: String::new(),
            value: Arc::new(T::default()),
        }
    }
}

/// Fetches and caches one series per signal type plus one prediction map.
///
/// Each slot has its own lock, so loads of different types run
/// concurrently while loads of the same type are serialized.
pub struct SignalRepository<S> {
    source: Arc<S>,
    ecg: Mutex<Slot<Series>>,
    bpm: Mutex<Slot<Series>>,
    pred: Mutex<Slot<Series>>,
    predictions: Mutex<Slot<PredictionCounts>>,
}

impl<S: DataSource> SignalRepository<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            ecg: Mutex::default(),
            bpm: Mutex::default(),
            pred: Mutex::default(),
            predictions: Mutex::default(),
        }
    }

    fn slot(&self, signal_type: SignalType) -> &Mutex<Slot<Series>> {
        match signal_type {
            SignalType::Ecg => &self.ecg,
            SignalType::Bpm => &self.bpm,
            SignalType::Pred => &self.pred,
        }
    }

    /// Loads the series of `id` into the slot of `signal_type`.
    ///
    /// No request is issued when `id` is the id the slot already holds.
    /// On failure the slot keeps its previous series.
    pub async fn load(&self, id: &str, signal_type: SignalType) -> Result<Loaded<Series>, FetchError> {
        let mut slot = self.slot(signal_type).lock().await;

        if slot.resolved_id == id {
            debug!("{} slot already holds '{}', skipping fetch", signal_type, id);
            return Ok(Loaded::Cached(slot.value.clone()));
        }

        let samples = self
            .source
            .fetch_samples(id, signal_type)
            .await
            .map_err(|cause| {
                error!("Error fetching {} data for '{}': {}", signal_type, id, cause);
                FetchError {
                    signal_type,
                    id: id.to_string(),
                    cause,
                }
            })?;

        let series = Arc::new(Series::from_samples(&samples, signal_type));
        slot.resolved_id = id.to_string();
        slot.value = series.clone();

        info!("Loaded {} '{}' ({} samples)", signal_type, id, series.len());
        Ok(Loaded::Fresh(series))
    }

    /// Loads the label counts of a Pred record, with the same deduplication as `load`.
    pub async fn load_prediction_counts(&self, id: &str) -> Result<Loaded<PredictionCounts>, FetchError> {
        let mut slot = self.predictions.lock().await;

        if slot.resolved_id == id {
            debug!("Pred counts already hold '{}', skipping fetch", id);
            return Ok(Loaded::Cached(slot.value.clone()));
        }

        let counts = self.source.fetch_prediction_counts(id).await.map_err(|cause| {
            error!("Error fetching Pred data for '{}': {}", id, cause);
            FetchError {
                signal_type: SignalType::Pred,
                id: id.to_string(),
                cause,
            }
        })?;

        let counts = Arc::new(counts);
        slot.resolved_id = id.to_string();
        slot.value = counts.clone();

        info!("Loaded Pred counts '{}' ({} labels)", id, counts.len());
        Ok(Loaded::Fresh(counts))
    }

    pub async fn current(&self, signal_type: SignalType) -> Arc<Series> {
        self.slot(signal_type).lock().await.value.clone()
    }

    pub async fn resolved_id(&self, signal_type: SignalType) -> String {
        self.slot(signal_type).lock().await.resolved_id.clone()
    }

    pub async fn current_prediction_counts(&self) -> Arc<PredictionCounts> {
        self.predictions.lock().await.value.clone()
    }
}
