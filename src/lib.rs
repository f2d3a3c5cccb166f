// ECG session viewer core
// Record catalog, signal slots and fixed-rate playback

pub mod core;

// Re-export main types
pub use crate::core::aggregator::{aggregate, color_for};
pub use crate::core::catalog::{recompute, CatalogFilters, FilteredView, RecordCatalog, TypeFilters};
pub use crate::core::data_handle::handle_ws_playback;
pub use crate::core::error::{CatalogError, FetchError, SourceError};
pub use crate::core::format::{LabeledBucket, PredictionCounts, Record, Rgb, SamplePoint, Series, SignalType};
pub use crate::core::memory::MemorySource;
pub use crate::core::playback::{format_time, PlaybackEngine, PlaybackFrame, PlaybackState};
pub use crate::core::repository::{Loaded, SignalRepository};
pub use crate::core::session::{ConsultReport, Selection, Session, SlotOutcome};
pub use crate::core::source::{DataSource, HttpDataSource};

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(SAMPLE_RATE_HZ, 125);
        assert_eq!(WINDOW_SIZE, 10 * SAMPLE_RATE_HZ as usize);
    }
}
