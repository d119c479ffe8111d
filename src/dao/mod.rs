/// Medical records storage and retrieval operations.
pub mod med_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
