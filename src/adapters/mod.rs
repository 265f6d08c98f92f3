// Adapters layer: concrete codecs and renderers for external formats.

pub mod csv_table;
pub mod pdf;
