//! Cinera Index
//!
//! This crate provides the per-project index layer for Cinera, including:
//! - Parsing of line-oriented `.index` documents into episodes and markers
//! - Writing episodes back into the same grammar
//! - Marker time labels and episode day names

mod error;
pub mod episode;
pub mod parser;
pub mod time;
pub mod writer;

pub use episode::{day_name, Episode, Marker};
pub use error::{IndexError, ParseWarning, WarningKind};
pub use parser::{parse_index, IndexParser, ParsedIndex};
pub use time::{marker_time, summary_time};
pub use writer::write_index;
