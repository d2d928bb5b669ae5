pub mod config;
pub mod harvest;
pub mod logging;
pub mod model;
pub mod traits;

// Re-export common types for convenience
pub use config::*;
pub use harvest::*;
pub use model::*;
pub use traits::*;
