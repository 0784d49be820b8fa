//! Local media records backed by a media index and a thumbnail service.

pub mod error;
pub mod identity_cache;
pub mod local_video;
pub mod media_id;
pub mod row;
pub mod thumbnail;
pub mod types;
