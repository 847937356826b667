//! Data Models
//!
//! Wire-level data contracts exchanged with the AtlasField service.

pub mod analysis;
pub mod chat;
pub mod prediction;
pub mod site;
pub mod trend;

pub use analysis::*;
pub use chat::*;
pub use prediction::*;
pub use site::*;
pub use trend::*;
