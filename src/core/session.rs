// Ties the repository, catalog and playback engine together

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::core::aggregator::aggregate;
use crate::core::catalog::{recompute, CatalogFilters, FilteredView, RecordCatalog};
use crate::core::error::CatalogError;
use crate::core::format::{LabeledBucket, Series, SignalType};
use crate::core::playback::PlaybackEngine;
use crate::core::repository::{Loaded, SignalRepository};
use crate::core::source::DataSource;

/// Record ids chosen for each slot. Empty means nothing selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub ecg_id: String,
    #[serde(default)]
    pub bpm_id: String,
    #[serde(default)]
    pub pred_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotOutcome {
    Fetched,
    Unchanged,
    Failed { error: String },
}

impl SlotOutcome {
    fn of<T, E: std::fmt::Display>(result: &Result<Loaded<T>, E>) -> Self {
        match result {
            Ok(Loaded::Fresh(_)) => SlotOutcome::Fetched,
            Ok(Loaded::Cached(_)) => SlotOutcome::Unchanged,
            Err(e) => SlotOutcome::Failed { error: e.to_string() },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SlotOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultReport {
    pub ecg: SlotOutcome,
    pub bpm: SlotOutcome,
    pub pred: SlotOutcome,
    pub catalog: SlotOutcome,
}

struct CatalogState {
    filters: CatalogFilters,
    view: FilteredView,
}

/// One operator's browsing and playback state.
pub struct Session<S> {
    repository: SignalRepository<S>,
    catalog: RecordCatalog<S>,
    playback: PlaybackEngine,
    // one consult at a time, so fresh results apply in the order they were fetched
    consult_lock: Mutex<()>,
    catalog_state: Mutex<CatalogState>,
    rate_series: RwLock<Arc<Series>>,
    buckets: RwLock<Vec<LabeledBucket>>,
}

impl<S: DataSource> Session<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            repository: SignalRepository::new(source.clone()),
            catalog: RecordCatalog::new(source),
            playback: PlaybackEngine::new(),
            consult_lock: Mutex::new(()),
            catalog_state: Mutex::new(CatalogState {
                filters: CatalogFilters::default(),
                view: FilteredView::default(),
            }),
            rate_series: RwLock::new(Arc::new(Series::default())),
            buckets: RwLock::new(Vec::new()),
        }
    }

    pub fn repository(&self) -> &SignalRepository<S> {
        &self.repository
    }

    pub fn catalog(&self) -> &RecordCatalog<S> {
        &self.catalog
    }

    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }

    /// Loads all three slots and refreshes the catalog concurrently.
    ///
    /// A newly fetched ECG series restarts playback from a stopped state.
    /// Slots fail independently. Overlapping calls run one after another.
    pub async fn consult(&self, selection: &Selection) -> ConsultReport {
        let _guard = self.consult_lock.lock().await;

        info!(
            "Consult: ECG='{}' BPM='{}' Pred='{}'",
            selection.ecg_id, selection.bpm_id, selection.pred_id
        );

        let (ecg, bpm, pred, refreshed) = tokio::join!(
            self.repository.load(&selection.ecg_id, SignalType::Ecg),
            self.repository.load(&selection.bpm_id, SignalType::Bpm),
            self.repository.load_prediction_counts(&selection.pred_id),
            self.catalog.refresh(),
        );

        let report = ConsultReport {
            ecg: SlotOutcome::of(&ecg),
            bpm: SlotOutcome::of(&bpm),
            pred: SlotOutcome::of(&pred),
            catalog: match &refreshed {
                Ok(_) => SlotOutcome::Fetched,
                Err(e) => SlotOutcome::Failed { error: e.to_string() },
            },
        };

        if let Ok(Loaded::Fresh(series)) = ecg {
            self.playback.load_source(series);
        }
        if let Ok(Loaded::Fresh(series)) = bpm {
            *self.rate_series.write().await = series;
        }
        if let Ok(Loaded::Fresh(counts)) = pred {
            *self.buckets.write().await = aggregate(&counts);
        }
        if refreshed.is_ok() {
            self.rederive(|_| {}).await;
        }

        report
    }

    /// Reloads the record list and re-derives the view.
    pub async fn refresh_catalog(&self) -> Result<FilteredView, CatalogError> {
        self.catalog.refresh().await?;
        Ok(self.rederive(|_| {}).await)
    }

    pub async fn toggle_type_filter(&self, signal_type: SignalType) -> FilteredView {
        self.rederive(|f| f.types.toggle(signal_type)).await
    }

    pub async fn set_search_term(&self, term: impl Into<String>) -> FilteredView {
        let term = term.into();
        self.rederive(move |f| f.search_term = term).await
    }

    /// `None` or an empty name clears the owner restriction.
    pub async fn select_owner(&self, owner: Option<String>) -> FilteredView {
        let owner = owner.filter(|o| !o.is_empty());
        self.rederive(move |f| f.selected_owner = owner).await
    }

    pub async fn filters(&self) -> CatalogFilters {
        self.catalog_state.lock().await.filters.clone()
    }

    pub async fn view(&self) -> FilteredView {
        self.catalog_state.lock().await.view.clone()
    }

    /// View of the current catalog under arbitrary filters. Session filters are untouched.
    pub async fn preview(&self, filters: &CatalogFilters) -> FilteredView {
        self.catalog.view(filters).await
    }

    pub async fn rate_series(&self) -> Arc<Series> {
        self.rate_series.read().await.clone()
    }

    pub async fn prediction_buckets(&self) -> Vec<LabeledBucket> {
        self.buckets.read().await.clone()
    }

    async fn rederive(&self, mutate: impl FnOnce(&mut CatalogFilters)) -> FilteredView {
        let mut state = self.catalog_state.lock().await;
        mutate(&mut state.filters);
        let records = self.catalog.records().await;
        state.view = recompute(&records, &state.filters);
        if state.view.records.is_empty() && !records.is_empty() {
            debug!("Filters exclude all {} records", records.len());
        }
        state.view.clone()
    }
}
