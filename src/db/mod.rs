//! SQLite persistence for the autosave slot and named saves.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::StorageError;
pub use models::SaveEntry;
pub use repository::SaveStore;
