pub mod board;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod routing;
pub mod snapshot;
pub mod theme;

pub use board::{Board, FlowIssue, FlowReport, RoutedConnection};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{BoardConfig, load_config};
pub use error::{BoardError, BoardResult};
pub use export::to_flowchart;
pub use geometry::{Rect, Size, bounds_of, estimate_card_size, intersects};
pub use model::{Aggregate, Card, CardId, CardType, Connection, Position};
pub use routing::route;
pub use snapshot::{BoardSnapshot, CardRecord, SCHEMA_VERSION};
