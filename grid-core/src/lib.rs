pub mod dictionary;
pub mod grid;
pub mod scoring;
pub mod session;
pub mod tournament;

// Re-export main components
pub use dictionary::*;
pub use grid::*;
pub use scoring::*;
pub use session::*;
pub use tournament::*;
