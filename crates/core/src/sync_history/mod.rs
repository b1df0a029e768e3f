pub mod sync_history_model;
pub mod sync_history_traits;

pub use sync_history_model::*;
pub use sync_history_traits::*;
