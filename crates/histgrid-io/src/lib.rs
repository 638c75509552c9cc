//! Table input/output for histgrid
//!
//! - [`CsvTableWriter`]: the [`GridSink`](histgrid_core::GridSink) that writes
//!   extracted grids as CSV, per tag or wide
//! - [`read_table`]: reads written tables back into grids
//! - [`stitch_tables`]: joins per-window tables into one table per variable
//! - [`CoverageReport`]: non-missing counts and latest timestamps per column

pub mod coverage;
pub mod errors;
pub mod naming;
pub mod reader;
pub mod stitch;
pub mod table;
pub mod writer;

pub use coverage::{reports_to_json, CoverageEntry, CoverageReport};
pub use errors::TableError;
pub use naming::{sanitize_folder_name, sanitize_variable_name, table_file_name};
pub use reader::read_table;
pub use stitch::{stitch_tables, StitchOptions, StitchSummary, StitchedVariable};
pub use table::{decode_text, encode_text, render_table, write_table, TableFormat};
pub use writer::{CsvTableWriter, WrittenTable};
