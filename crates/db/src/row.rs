//! Positional [`RowCursor`] over a PostgreSQL result row.

use gallery_core::row::RowCursor;
use sqlx::postgres::PgRow;
use sqlx::Row;

/// Borrowed view of a `PgRow` for the record loaders.
///
/// Getters panic on an out-of-range index or a type mismatch, both of
/// which mean the query no longer matches the loader's projection.
pub struct PgRowCursor<'r>(pub &'r PgRow);

impl RowCursor for PgRowCursor<'_> {
    fn get_i32(&self, index: usize) -> i32 {
        self.0.get(index)
    }

    fn get_i64(&self, index: usize) -> i64 {
        self.0.get(index)
    }

    fn get_f64(&self, index: usize) -> f64 {
        self.0.get(index)
    }

    fn get_string(&self, index: usize) -> Option<String> {
        self.0.get(index)
    }
}
