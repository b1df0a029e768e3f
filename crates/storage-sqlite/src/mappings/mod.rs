pub mod model;
pub mod repository;

pub use model::AccountMappingDB;
pub use repository::MappingRepository;
