// Record catalog and its filtered views

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::core::error::CatalogError;
use crate::core::format::{Record, SignalType};
use crate::core::source::DataSource;

/// Inclusive type toggles. With none active every type is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilters {
    #[serde(rename = "ECG", default)]
    pub ecg: bool,
    #[serde(rename = "BPM", default)]
    pub bpm: bool,
    #[serde(rename = "Pred", default)]
    pub pred: bool,
}

impl TypeFilters {
    pub fn only(types: &[SignalType]) -> Self {
        let mut filters = Self::default();
        for &ty in types {
            filters.set(ty, true);
        }
        filters
    }

    pub fn is_active(&self, signal_type: SignalType) -> bool {
        match signal_type {
            SignalType::Ecg => self.ecg,
            SignalType::Bpm => self.bpm,
            SignalType::Pred => self.pred,
        }
    }

    pub fn set(&mut self, signal_type: SignalType, active: bool) {
        match signal_type {
            SignalType::Ecg => self.ecg = active,
            SignalType::Bpm => self.bpm = active,
            SignalType::Pred => self.pred = active,
        }
    }

    pub fn toggle(&mut self, signal_type: SignalType) {
        let active = self.is_active(signal_type);
        self.set(signal_type, !active);
    }

    pub fn any_active(&self) -> bool {
        self.ecg || self.bpm || self.pred
    }

    /// Whether a record of `signal_type` passes.
    pub fn admits(&self, signal_type: SignalType) -> bool {
        !self.any_active() || self.is_active(signal_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilters {
    #[serde(default)]
    pub types: TypeFilters,
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub selected_owner: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ByType {
    #[serde(rename = "ECG")]
    pub ecg: Vec<Record>,
    #[serde(rename = "BPM")]
    pub bpm: Vec<Record>,
    #[serde(rename = "Pred")]
    pub pred: Vec<Record>,
}

impl ByType {
    pub fn get(&self, signal_type: SignalType) -> &[Record] {
        match signal_type {
            SignalType::Ecg => &self.ecg,
            SignalType::Bpm => &self.bpm,
            SignalType::Pred => &self.pred,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredView {
    pub records: Vec<Record>,
    pub by_owner: IndexSet<String>,
    pub by_type: ByType,
}

/// Derives the view of `records` under `filters`.
///
/// The owner restriction applies first; `by_owner` and `by_type` come from
/// the owner-restricted list. Type toggles and the case-insensitive owner
/// search then narrow `records`. Catalog order is kept throughout.
pub fn recompute(records: &[Record], filters: &CatalogFilters) -> FilteredView {
    let owned: Vec<&Record> = match filters.selected_owner.as_deref() {
        Some(owner) if !owner.is_empty() => {
            records.iter().filter(|r| r.owner_name == owner).collect()
        }
        _ => records.iter().collect(),
    };

    let by_owner = owned.iter().map(|r| r.owner_name.clone()).collect();

    let of_type = |ty: SignalType| -> Vec<Record> {
        owned
            .iter()
            .filter(|r| r.signal_type == ty)
            .map(|r| (*r).clone())
            .collect()
    };
    let by_type = ByType {
        ecg: of_type(SignalType::Ecg),
        bpm: of_type(SignalType::Bpm),
        pred: of_type(SignalType::Pred),
    };

    let needle = filters.search_term.to_lowercase();
    let records = owned
        .into_iter()
        .filter(|r| filters.types.admits(r.signal_type))
        .filter(|r| needle.is_empty() || r.owner_name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    FilteredView {
        records,
        by_owner,
        by_type,
    }
}

/// Holds the full record list. A refresh swaps the whole list at once.
pub struct RecordCatalog<S> {
    source: Arc<S>,
    records: RwLock<Arc<Vec<Record>>>,
}

impl<S: DataSource> RecordCatalog<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            records: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Replaces the catalog with the service's record list.
    /// On failure the previous list is kept.
    pub async fn refresh(&self) -> Result<Arc<Vec<Record>>, CatalogError> {
        let fetched = match self.source.fetch_records().await {
            Ok(records) => Arc::new(records),
            Err(e) => {
                warn!("Error fetching records: {}", e);
                return Err(e.into());
            }
        };

        *self.records.write().await = fetched.clone();
        info!("Catalog refreshed: {} records", fetched.len());
        Ok(fetched)
    }

    pub async fn records(&self) -> Arc<Vec<Record>> {
        self.records.read().await.clone()
    }

    pub async fn view(&self, filters: &CatalogFilters) -> FilteredView {
        let records = self.records().await;
        recompute(&records, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemorySource;

    fn record(id: &str, owner: &str, signal_type: SignalType) -> Record {
        Record {
            id: id.to_string(),
            owner_name: owner.to_string(),
            email: format!("{}@example.com", owner.to_lowercase()),
            created_date: "2024-01-01".to_string(),
            created_time: "10:00:00".to_string(),
            signal_type,
            length: 1000,
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            record("1", "Ann", SignalType::Ecg),
            record("2", "Bob", SignalType::Bpm),
            record("3", "Ann", SignalType::Pred),
            record("4", "Joanna", SignalType::Ecg),
            record("5", "Bob", SignalType::Ecg),
        ]
    }

    #[test]
    fn test_type_filter() {
        let records = vec![record("1", "Ann", SignalType::Ecg), record("2", "Bob", SignalType::Bpm)];
        let filters = CatalogFilters {
            types: TypeFilters::only(&[SignalType::Ecg]),
            ..Default::default()
        };
        assert_eq!(ids(&recompute(&records, &filters).records), ["1"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let records = vec![record("1", "Ann", SignalType::Ecg), record("2", "Bob", SignalType::Bpm)];
        let filters = CatalogFilters {
            search_term: "an".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&recompute(&records, &filters).records), ["1"]);

        let filters = CatalogFilters {
            search_term: "OB".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&recompute(&records, &filters).records), ["2"]);
    }

    #[test]
    fn test_no_filters_keeps_everything_in_order() {
        let view = recompute(&sample(), &CatalogFilters::default());
        assert_eq!(ids(&view.records), ["1", "2", "3", "4", "5"]);
        let owners: Vec<_> = view.by_owner.iter().map(String::as_str).collect();
        assert_eq!(owners, ["Ann", "Bob", "Joanna"]);
        assert_eq!(ids(&view.by_type.ecg), ["1", "4", "5"]);
        assert_eq!(ids(&view.by_type.bpm), ["2"]);
        assert_eq!(ids(&view.by_type.pred), ["3"]);
    }

    #[test]
    fn test_filters_are_inclusive() {
        let filters = CatalogFilters {
            types: TypeFilters::only(&[SignalType::Bpm, SignalType::Pred]),
            ..Default::default()
        };
        assert_eq!(ids(&recompute(&sample(), &filters).records), ["2", "3"]);
    }

    #[test]
    fn test_type_filter_and_search_combine() {
        let filters = CatalogFilters {
            types: TypeFilters::only(&[SignalType::Ecg]),
            search_term: "ANN".to_string(),
            ..Default::default()
        };
        // "Joanna" contains "ann" too
        assert_eq!(ids(&recompute(&sample(), &filters).records), ["1", "4"]);
    }

    #[test]
    fn test_selected_owner_restricts_everything() {
        let filters = CatalogFilters {
            selected_owner: Some("Ann".to_string()),
            ..Default::default()
        };
        let view = recompute(&sample(), &filters);
        assert_eq!(view.by_owner.len(), 1);
        assert!(view.by_owner.contains("Ann"));
        assert_eq!(ids(&view.records), ["1", "3"]);
        assert_eq!(ids(&view.by_type.ecg), ["1"]);
        assert!(view.by_type.get(SignalType::Bpm).is_empty());
    }

    #[test]
    fn test_empty_owner_means_all() {
        let filters = CatalogFilters {
            selected_owner: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(recompute(&sample(), &filters).records.len(), 5);
    }

    #[test]
    fn test_type_toggles_do_not_narrow_groups() {
        let filters = CatalogFilters {
            types: TypeFilters::only(&[SignalType::Pred]),
            ..Default::default()
        };
        let view = recompute(&sample(), &filters);
        assert_eq!(view.by_type.ecg.len(), 3);
        assert_eq!(view.by_owner.len(), 3);
    }

    #[test]
    fn test_toggle() {
        let mut filters = TypeFilters::default();
        assert!(filters.admits(SignalType::Bpm));
        filters.toggle(SignalType::Ecg);
        assert!(filters.admits(SignalType::Ecg));
        assert!(!filters.admits(SignalType::Bpm));
        filters.toggle(SignalType::Ecg);
        assert!(!filters.any_active());
    }

    #[tokio::test]
    async fn test_refresh_replaces_and_failure_keeps() {
        let source = Arc::new(MemorySource::new().with_records(sample()));
        let catalog = RecordCatalog::new(source.clone());
        assert!(catalog.records().await.is_empty());

        catalog.refresh().await.unwrap();
        assert_eq!(catalog.records().await.len(), 5);

        source.set_records(Some(vec![record("9", "Zoe", SignalType::Bpm)]));
        catalog.refresh().await.unwrap();
        assert_eq!(ids(&catalog.records().await), ["9"]);

        source.set_records(None);
        assert!(catalog.refresh().await.is_err());
        assert_eq!(ids(&catalog.records().await), ["9"]);

        let view = catalog.view(&CatalogFilters::default()).await;
        assert_eq!(ids(&view.records), ["9"]);
    }
}
