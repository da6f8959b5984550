#![forbid(unsafe_code)]

mod memory;
pub mod repository;
pub mod sqlite;

pub use memory::InMemoryRepository;
pub use repository::{Storage, StorageError};
