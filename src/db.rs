pub mod user_repo;
pub use user_repo::UserRepository;
pub mod diagnosis_repo;
pub use diagnosis_repo::DiagnosisRepository;
pub mod chat_repo;
pub use chat_repo::ChatRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
