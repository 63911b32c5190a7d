//! Rolling damage window for live DPS totals.

mod window;

pub use window::{
    SourceTotals, WindowAggregator, DEFAULT_MAX_EVENTS_PER_SOURCE, DEFAULT_SPAN_SECS,
    DEFAULT_SUPPRESSED_ZONE,
};
