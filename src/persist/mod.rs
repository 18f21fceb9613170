//! Snapshots, analysis files, linear records and autosave.

mod autosave;
mod record;
mod snapshot;

pub use autosave::AutoSaver;
pub use record::LinearRecord;
pub use snapshot::{FORMAT_TAG, ImportError, LoadedGame, SCHEMA_VERSION, Snapshot};
