pub mod model;
pub mod repository;

pub use model::SyncHistoryDB;
pub use repository::SyncHistoryRepository;
