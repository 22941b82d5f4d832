pub mod errors;
pub mod events;
pub mod room;
pub mod verdict;

// Re-export all types
pub use errors::*;
pub use events::*;
pub use room::*;
pub use verdict::*;

pub type PlayerId = uuid::Uuid;
