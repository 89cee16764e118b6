//! `termroute-routing`: search-term intent routing and traffic-shaping classifier.
//!
//! Pure engine crate: receives pre-loaded search-term rows and a negative
//! keyword snapshot, returns classified routing decisions plus aggregates.
//! No CLI dependencies; file IO is limited to parsing CSV text handed in.

pub mod aggregate;
pub mod brand;
pub mod config;
pub mod contamination;
pub mod engine;
pub mod error;
pub mod intent;
pub mod load;
pub mod metrics;
pub mod model;
pub mod negatives;
pub mod recommend;
pub mod render;
pub mod resolve;
pub mod window;

pub use config::{CompiledRules, RoutingConfig};
pub use engine::{run, RunOptions};
pub use error::RouteError;
pub use model::{RouteInput, RouteReport, RoutingDecision, RoutingStatus, SearchTermRecord};
pub use negatives::NegativeKeywordSet;
