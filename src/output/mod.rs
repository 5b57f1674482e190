//! Everything that leaves the engine: the ledger, the text report and the
//! dashboard series.

pub mod dashboard;
pub mod ledger;
pub mod summary;

pub use dashboard::{build_chart_data, ChartData, Panel, Series};
pub use ledger::{header_line, row_line, write_rows, Ledger, LedgerContents};
pub use summary::{render_summary, Summary};
