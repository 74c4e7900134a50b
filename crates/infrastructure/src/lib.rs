//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_log_store;
mod postgres_capability_repository;
mod postgres_log_entry_repository;
mod postgres_target_element_repository;

pub use in_memory_log_store::InMemoryLogStore;
pub use postgres_capability_repository::PostgresCapabilityRepository;
pub use postgres_log_entry_repository::PostgresLogEntryRepository;
pub use postgres_target_element_repository::PostgresTargetElementRepository;
