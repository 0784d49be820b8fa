//! Query functions over the media index, one repository per table.

pub mod local_video_repo;

pub use local_video_repo::LocalVideoRepo;
