pub mod connections_model;
pub mod connections_traits;

pub use connections_model::*;
pub use connections_traits::*;
