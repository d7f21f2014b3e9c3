//! Zone → SubZone → Treasure catalog: durable records, seed import, and
//! collection progress.

pub mod error;
pub mod memory;
pub mod model;
pub mod progress;
pub mod seed;
pub mod store;

pub use error::*;
pub use memory::*;
pub use model::*;
pub use progress::*;
pub use seed::*;
pub use store::*;
