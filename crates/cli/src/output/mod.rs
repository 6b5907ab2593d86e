//! Output formatting for CLI results.

pub mod detail;
pub mod format;
pub mod table;

pub use detail::format_borrow_result;
pub use table::format_series_table;
