//! Core records, notices and table rendering for the startup times store.

pub mod models;
pub mod notice;
pub mod table;

pub use models::*;
pub use notice::{LogSink, Notice, NoticeSink, RecordingSink};
pub use table::{elapsed_string, render_table, value_string, Cell, Column, Formatter, Row};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
