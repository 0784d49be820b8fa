//! Positional read access to one media-index row.

/// A cursor positioned at a single result row.
///
/// Column positions are a contract with the query that produced the row.
/// A getter called with the wrong index or on a column of the wrong type is
/// a programming error; implementations may panic.
pub trait RowCursor {
    fn get_i32(&self, index: usize) -> i32;
    fn get_i64(&self, index: usize) -> i64;
    fn get_f64(&self, index: usize) -> f64;
    fn get_string(&self, index: usize) -> Option<String>;
}
