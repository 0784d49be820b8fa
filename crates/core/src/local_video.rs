//! Local video records loaded from the media index.
//!
//! A [`VideoRecord`] is built from one row of the video projection and
//! shared through an [`IdentityCache`] so every load of the same row yields
//! the same instance.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::identity_cache::IdentityCache;
use crate::media_id::{make_id, MediaKind};
use crate::row::RowCursor;
use crate::thumbnail::{
    Bitmap, ImageKind, Resizer, ThumbnailProvider, ThumbnailSize, MICRO_TARGET_PIXELS,
};
use crate::types::{LocalId, MediaId, Timestamp};

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

// Must match the order of `VIDEO_PROJECTION`.
pub const INDEX_ID: usize = 0;
pub const INDEX_CAPTION: usize = 1;
pub const INDEX_MIME_TYPE: usize = 2;
pub const INDEX_LATITUDE: usize = 3;
pub const INDEX_LONGITUDE: usize = 4;
pub const INDEX_DATE_TAKEN: usize = 5;
pub const INDEX_DATE_ADDED: usize = 6;
pub const INDEX_DATE_MODIFIED: usize = 7;
pub const INDEX_DATA: usize = 8;
pub const INDEX_DURATION: usize = 9;

/// Columns a row handed to [`VideoRecord::load`] must carry, in order.
pub const VIDEO_PROJECTION: [&str; 10] = [
    "_id",
    "title",
    "mime_type",
    "latitude",
    "longitude",
    "datetaken",
    "date_added",
    "date_modified",
    "_data",
    "duration",
];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Kind of media a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

/// Metadata columns of a video row.
///
/// Latitude and longitude are `0.0` when the index has no location; the
/// index does not distinguish "absent" from a real zero coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub caption: Option<String>,
    pub mime_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub date_taken_ms: i64,
    pub date_added_sec: i64,
    pub date_modified_sec: i64,
    pub file_path: Option<String>,
    pub duration_sec: i32,
}

impl VideoMetadata {
    /// Read every metadata column from a row of [`VIDEO_PROJECTION`].
    pub fn from_row(cursor: &impl RowCursor) -> Self {
        Self {
            caption: cursor.get_string(INDEX_CAPTION),
            mime_type: cursor.get_string(INDEX_MIME_TYPE),
            latitude: cursor.get_f64(INDEX_LATITUDE),
            longitude: cursor.get_f64(INDEX_LONGITUDE),
            date_taken_ms: cursor.get_i64(INDEX_DATE_TAKEN),
            date_added_sec: cursor.get_i64(INDEX_DATE_ADDED),
            date_modified_sec: cursor.get_i64(INDEX_DATE_MODIFIED),
            file_path: cursor.get_string(INDEX_DATA),
            duration_sec: cursor.get_i32(INDEX_DURATION),
        }
    }
}

/// A video in local storage.
///
/// The identity (`id`, `unique_id`) is fixed at construction. Metadata is
/// set once by the loader; a record observed between cache registration
/// and population reports `None` from [`metadata`](Self::metadata).
#[derive(Debug)]
pub struct VideoRecord {
    id: LocalId,
    unique_id: MediaId,
    metadata: OnceLock<VideoMetadata>,
}

impl VideoRecord {
    fn new(id: LocalId, unique_id: MediaId) -> Self {
        Self {
            id,
            unique_id,
            metadata: OnceLock::new(),
        }
    }

    /// Load the record for the row under `cursor`, reusing a cached
    /// instance when one exists.
    ///
    /// A cached record is returned as-is; its fields are never refreshed
    /// from the row. A fresh record is registered in `cache` before its
    /// fields are populated.
    pub fn load<C>(cursor: &impl RowCursor, cache: &C) -> Arc<Self>
    where
        C: IdentityCache<Self> + ?Sized,
    {
        let id = cursor.get_i32(INDEX_ID);
        let unique_id = make_id(MediaKind::LocalVideo, id);
        if let Some(record) = cache.get(unique_id) {
            tracing::trace!(id, unique_id, "Video record cache hit");
            return record;
        }

        tracing::trace!(id, unique_id, "Video record cache miss");
        let record = Arc::new(Self::new(id, unique_id));
        cache.put(unique_id, Arc::clone(&record));

        // Fresh record: no one else can have set the metadata yet.
        if record.metadata.set(VideoMetadata::from_row(cursor)).is_err() {
            tracing::warn!(id, unique_id, "Video record populated twice");
        }
        record
    }

    /// Fetch a bitmap of the requested kind from the thumbnail service.
    ///
    /// Full images and thumbnails are both served by the `Mini` tier
    /// unmodified. Micro thumbnails use the same tier, downscaled to
    /// [`MICRO_TARGET_PIXELS`]. A missing thumbnail yields `None`.
    pub fn fetch_image(
        &self,
        provider: &(impl ThumbnailProvider + ?Sized),
        resizer: &(impl Resizer + ?Sized),
        kind: ImageKind,
    ) -> Option<Bitmap> {
        tracing::debug!(id = self.id, ?kind, "Requesting video thumbnail");
        match kind {
            ImageKind::FullImage | ImageKind::Thumbnail => {
                provider.get_thumbnail(self.id, ThumbnailSize::Mini)
            }
            ImageKind::MicroThumbnail => provider
                .get_thumbnail(self.id, ThumbnailSize::Mini)
                .map(|bitmap| resizer.resize(bitmap, MICRO_TARGET_PIXELS)),
        }
    }

    /// Like [`fetch_image`](Self::fetch_image) for a raw kind tag.
    ///
    /// An unknown tag fails with [`CoreError::InvalidArgument`] before the
    /// thumbnail service is contacted.
    pub fn fetch_image_by_tag(
        &self,
        provider: &(impl ThumbnailProvider + ?Sized),
        resizer: &(impl Resizer + ?Sized),
        tag: i32,
    ) -> Result<Option<Bitmap>, CoreError> {
        let kind = ImageKind::try_from(tag)?;
        Ok(self.fetch_image(provider, resizer, kind))
    }

    /// Cancel any pending thumbnail request for this video.
    pub fn cancel_image(&self, provider: &(impl ThumbnailProvider + ?Sized)) {
        tracing::debug!(id = self.id, "Cancelling video thumbnail request");
        provider.cancel_thumbnail_request(self.id);
    }

    // -- accessors -----------------------------------------------------------

    pub fn id(&self) -> LocalId {
        self.id
    }

    pub fn unique_id(&self) -> MediaId {
        self.unique_id
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::Video
    }

    /// Row metadata, or `None` while the loader is still populating.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.get()
    }

    pub fn caption(&self) -> Option<&str> {
        self.metadata()?.caption.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.metadata()?.mime_type.as_deref()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.metadata()?.file_path.as_deref()
    }

    /// `(latitude, longitude)`; `(0.0, 0.0)` may mean "no location".
    pub fn location(&self) -> Option<(f64, f64)> {
        self.metadata().map(|m| (m.latitude, m.longitude))
    }

    pub fn duration_sec(&self) -> Option<i32> {
        self.metadata().map(|m| m.duration_sec)
    }

    pub fn date_taken(&self) -> Option<Timestamp> {
        DateTime::<Utc>::from_timestamp_millis(self.metadata()?.date_taken_ms)
    }

    pub fn date_added(&self) -> Option<Timestamp> {
        DateTime::<Utc>::from_timestamp(self.metadata()?.date_added_sec, 0)
    }

    pub fn date_modified(&self) -> Option<Timestamp> {
        DateTime::<Utc>::from_timestamp(self.metadata()?.date_modified_sec, 0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use assert_matches::assert_matches;
    use image::DynamicImage;

    use super::*;
    use crate::identity_cache::WeakIdentityCache;
    use crate::thumbnail::PixelCountResizer;

    // -- Fakes ---------------------------------------------------------------

    struct FakeRow {
        id: i32,
        title: Option<&'static str>,
        mime: Option<&'static str>,
        lat: f64,
        lon: f64,
        date_taken: i64,
        date_added: i64,
        date_modified: i64,
        path: Option<&'static str>,
        duration: i32,
    }

    impl RowCursor for FakeRow {
        fn get_i32(&self, index: usize) -> i32 {
            match index {
                INDEX_ID => self.id,
                INDEX_DURATION => self.duration,
                other => panic!("column {other} is not an i32"),
            }
        }

        fn get_i64(&self, index: usize) -> i64 {
            match index {
                INDEX_DATE_TAKEN => self.date_taken,
                INDEX_DATE_ADDED => self.date_added,
                INDEX_DATE_MODIFIED => self.date_modified,
                other => panic!("column {other} is not an i64"),
            }
        }

        fn get_f64(&self, index: usize) -> f64 {
            match index {
                INDEX_LATITUDE => self.lat,
                INDEX_LONGITUDE => self.lon,
                other => panic!("column {other} is not an f64"),
            }
        }

        fn get_string(&self, index: usize) -> Option<String> {
            match index {
                INDEX_CAPTION => self.title.map(String::from),
                INDEX_MIME_TYPE => self.mime.map(String::from),
                INDEX_DATA => self.path.map(String::from),
                other => panic!("column {other} is not a string"),
            }
        }
    }

    fn trip_row() -> FakeRow {
        FakeRow {
            id: 42,
            title: Some("Trip"),
            mime: Some("video/mp4"),
            lat: 0.0,
            lon: 0.0,
            date_taken: 1000,
            date_added: 2000,
            date_modified: 3000,
            path: Some("/sdcard/DCIM/42.mp4"),
            duration: 30,
        }
    }

    /// Cache that counts `put` calls.
    #[derive(Default)]
    struct CountingCache {
        inner: WeakIdentityCache<VideoRecord>,
        puts: std::sync::atomic::AtomicUsize,
    }

    impl IdentityCache<VideoRecord> for CountingCache {
        fn get(&self, id: MediaId) -> Option<Arc<VideoRecord>> {
            self.inner.get(id)
        }

        fn put(&self, id: MediaId, value: Arc<VideoRecord>) {
            assert!(value.metadata().is_none(), "registered before populating");
            self.puts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.put(id, value);
        }
    }

    struct FakeProvider {
        bitmap: Option<(u32, u32)>,
        requests: RefCell<Vec<(LocalId, ThumbnailSize)>>,
        cancels: RefCell<Vec<LocalId>>,
    }

    impl FakeProvider {
        fn with_bitmap(width: u32, height: u32) -> Self {
            Self {
                bitmap: Some((width, height)),
                requests: RefCell::new(Vec::new()),
                cancels: RefCell::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                bitmap: None,
                requests: RefCell::new(Vec::new()),
                cancels: RefCell::new(Vec::new()),
            }
        }
    }

    impl ThumbnailProvider for FakeProvider {
        fn get_thumbnail(&self, id: LocalId, size: ThumbnailSize) -> Option<Bitmap> {
            self.requests.borrow_mut().push((id, size));
            self.bitmap.map(|(w, h)| DynamicImage::new_rgb8(w, h))
        }

        fn cancel_thumbnail_request(&self, id: LocalId) {
            self.cancels.borrow_mut().push(id);
        }
    }

    /// Resizer that records how often it ran.
    #[derive(Default)]
    struct CountingResizer {
        calls: Cell<usize>,
    }

    impl Resizer for CountingResizer {
        fn resize(&self, bitmap: Bitmap, target_pixels: u32) -> Bitmap {
            self.calls.set(self.calls.get() + 1);
            PixelCountResizer.resize(bitmap, target_pixels)
        }
    }

    fn loaded_trip() -> (WeakIdentityCache<VideoRecord>, Arc<VideoRecord>) {
        let cache = WeakIdentityCache::new();
        let record = VideoRecord::load(&trip_row(), &cache);
        (cache, record)
    }

    // -- load ----------------------------------------------------------------

    #[test]
    fn load_populates_all_fields() {
        let (_cache, record) = loaded_trip();

        assert_eq!(record.id(), 42);
        assert_eq!(record.unique_id(), make_id(MediaKind::LocalVideo, 42));
        assert_eq!(record.media_type(), MediaType::Video);
        let meta = record.metadata().unwrap();
        assert_eq!(meta.caption.as_deref(), Some("Trip"));
        assert_eq!(meta.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(meta.latitude, 0.0);
        assert_eq!(meta.longitude, 0.0);
        assert_eq!(meta.date_taken_ms, 1000);
        assert_eq!(meta.date_added_sec, 2000);
        assert_eq!(meta.date_modified_sec, 3000);
        assert_eq!(record.file_path(), Some("/sdcard/DCIM/42.mp4"));
        assert_eq!(record.duration_sec(), Some(30));
    }

    #[test]
    fn load_registers_record_in_cache() {
        let (cache, record) = loaded_trip();

        let cached = cache.get(record.unique_id()).unwrap();
        assert!(Arc::ptr_eq(&cached, &record));
    }

    #[test]
    fn second_load_returns_cached_instance_unchanged() {
        let cache = CountingCache::default();
        let first = VideoRecord::load(&trip_row(), &cache);

        let mut renamed = trip_row();
        renamed.title = Some("Renamed");
        renamed.duration = 99;
        let second = VideoRecord::load(&renamed, &cache);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.caption(), Some("Trip"));
        assert_eq!(second.duration_sec(), Some(30));
        assert_eq!(cache.puts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn same_id_yields_same_unique_id_across_caches() {
        let (_a, first) = loaded_trip();
        let (_b, second) = loaded_trip();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.unique_id(), second.unique_id());
    }

    #[test]
    fn distinct_ids_get_distinct_records() {
        let cache = CountingCache::default();
        let first = VideoRecord::load(&trip_row(), &cache);
        let mut other = trip_row();
        other.id = 43;
        let second = VideoRecord::load(&other, &cache);

        assert_ne!(first.unique_id(), second.unique_id());
        assert_eq!(cache.puts.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn null_text_columns_stay_none() {
        let mut row = trip_row();
        row.title = None;
        row.mime = None;
        row.path = None;
        let record = VideoRecord::load(&row, &WeakIdentityCache::<VideoRecord>::new());

        assert_eq!(record.caption(), None);
        assert_eq!(record.mime_type(), None);
        assert_eq!(record.file_path(), None);
        assert_eq!(record.location(), Some((0.0, 0.0)));
    }

    #[test]
    fn timestamps_convert_to_utc() {
        let (_cache, record) = loaded_trip();

        assert_eq!(record.date_taken().unwrap().timestamp_millis(), 1000);
        assert_eq!(record.date_added().unwrap().timestamp(), 2000);
        assert_eq!(record.date_modified().unwrap().timestamp(), 3000);
    }

    #[test]
    fn unpopulated_record_reports_no_metadata() {
        let record = VideoRecord::new(7, make_id(MediaKind::LocalVideo, 7));

        assert!(record.metadata().is_none());
        assert_eq!(record.caption(), None);
        assert_eq!(record.date_taken(), None);
    }

    #[test]
    fn metadata_cannot_be_populated_twice() {
        let (_cache, record) = loaded_trip();
        let mut other = trip_row();
        other.title = Some("Other");

        assert!(record.metadata.set(VideoMetadata::from_row(&other)).is_err());
        assert_eq!(record.caption(), Some("Trip"));
    }

    // -- fetch_image ---------------------------------------------------------

    #[test]
    fn full_image_and_thumbnail_use_mini_tier_unmodified() {
        let (_cache, record) = loaded_trip();
        let provider = FakeProvider::with_bitmap(512, 384);
        let resizer = CountingResizer::default();

        let full = record
            .fetch_image(&provider, &resizer, ImageKind::FullImage)
            .unwrap();
        let thumb = record
            .fetch_image(&provider, &resizer, ImageKind::Thumbnail)
            .unwrap();

        assert_eq!((full.width(), full.height()), (512, 384));
        assert_eq!((thumb.width(), thumb.height()), (512, 384));
        assert_eq!(
            *provider.requests.borrow(),
            vec![(42, ThumbnailSize::Mini), (42, ThumbnailSize::Mini)]
        );
        assert_eq!(resizer.calls.get(), 0);
    }

    #[test]
    fn micro_thumbnail_is_downscaled() {
        let (_cache, record) = loaded_trip();
        let provider = FakeProvider::with_bitmap(512, 384);
        let resizer = CountingResizer::default();

        let micro = record
            .fetch_image(&provider, &resizer, ImageKind::MicroThumbnail)
            .unwrap();

        assert_eq!((micro.width(), micro.height()), (148, 111));
        assert_eq!(*provider.requests.borrow(), vec![(42, ThumbnailSize::Mini)]);
        assert_eq!(resizer.calls.get(), 1);
    }

    #[test]
    fn missing_thumbnail_propagates_none_without_resizing() {
        let (_cache, record) = loaded_trip();
        let provider = FakeProvider::empty();
        let resizer = CountingResizer::default();

        for kind in [
            ImageKind::FullImage,
            ImageKind::Thumbnail,
            ImageKind::MicroThumbnail,
        ] {
            assert!(record.fetch_image(&provider, &resizer, kind).is_none());
        }
        assert_eq!(resizer.calls.get(), 0);
        assert_eq!(provider.requests.borrow().len(), 3);
    }

    #[test]
    fn fetch_by_known_tag_matches_kind() {
        let (_cache, record) = loaded_trip();
        let provider = FakeProvider::with_bitmap(512, 512);

        let micro = record
            .fetch_image_by_tag(&provider, &PixelCountResizer, 3)
            .unwrap()
            .unwrap();
        assert_eq!((micro.width(), micro.height()), (128, 128));
    }

    #[test]
    fn fetch_by_unknown_tag_fails_without_provider_call() {
        let (_cache, record) = loaded_trip();
        let provider = FakeProvider::with_bitmap(512, 384);

        let result = record.fetch_image_by_tag(&provider, &PixelCountResizer, 17);

        assert_matches!(result, Err(CoreError::InvalidArgument(_)));
        assert!(provider.requests.borrow().is_empty());
    }

    // -- cancel_image --------------------------------------------------------

    #[test]
    fn cancel_image_forwards_row_id() {
        let (_cache, record) = loaded_trip();
        let provider = FakeProvider::empty();

        record.cancel_image(&provider);
        record.cancel_image(&provider);

        assert_eq!(*provider.cancels.borrow(), vec![42, 42]);
        assert!(provider.requests.borrow().is_empty());
    }

    // -- projection ----------------------------------------------------------

    #[test]
    fn projection_indices_line_up() {
        assert_eq!(VIDEO_PROJECTION[INDEX_ID], "_id");
        assert_eq!(VIDEO_PROJECTION[INDEX_CAPTION], "title");
        assert_eq!(VIDEO_PROJECTION[INDEX_DATA], "_data");
        assert_eq!(VIDEO_PROJECTION[INDEX_DURATION], "duration");
    }
}
