/// Process-global media identifier, see [`crate::media_id::make_id`].
pub type MediaId = i64;

/// Row id assigned by the media index. Only unique within one media kind.
pub type LocalId = i32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
