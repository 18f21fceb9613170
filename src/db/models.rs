//! Save table models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;

use crate::db::schema;

/// Metadata of a stored save, without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::saves)]
pub struct SaveEntry {
    slot: String,
    label: String,
    saved_at: NaiveDateTime,
    mode: String,
    phase: String,
    move_count: i32,
}

/// Row written when a save is created or replaced.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::saves)]
pub(crate) struct NewSave {
    slot: String,
    label: String,
    payload: String,
    saved_at: NaiveDateTime,
    mode: String,
    phase: String,
    move_count: i32,
}
