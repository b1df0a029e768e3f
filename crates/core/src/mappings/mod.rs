pub mod mappings_model;
pub mod mappings_traits;

pub use mappings_model::*;
pub use mappings_traits::*;
