//! Presentation handoff: table rows, sector breakdown, candle series, and
//! CSV / JSON export of a `BatchResult`.

pub mod export;
pub mod summary;

pub use export::{export_history_csv, export_json, export_summary_csv, write_artifact};
pub use summary::{
    candle_series, sector_breakdown, summary_rows, CandlePoint, SectorSlice, SummaryRow,
};
