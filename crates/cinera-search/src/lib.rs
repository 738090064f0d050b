//! Cinera Search
//!
//! Free-text search over every loaded project, with results streamed to a
//! render collaborator in bounded batches so large result sets never block
//! the host.

mod aggregate;
mod error;
mod executor;
mod query;
mod render;
mod session;

pub use aggregate::{Summary, Totals};
pub use cinera_core::SortOrder;
pub use error::SearchError;
pub use executor::{execute, MarkerMatch, MatchGroup, SearchOutcome};
pub use query::Query;
pub use render::{
    highlight, DisplayState, RenderPass, RenderSink, RenderedMarker, Segment, Turn,
    DEFAULT_RENDER_BUDGET,
};
pub use session::{PassStart, Session, SessionHandle, SessionOptions, ViewState};
