pub mod model;
pub mod repository;

pub use model::BrokerConnectionDB;
pub use repository::ConnectionRepository;
