//! Local staging cache for uploads
//!
//! Every upload is first copied (or moved) into a local cache directory
//! keyed by a generated cache id. Processing runs on the cached copy, and
//! the cached copy is what gets committed to storage.
//!
//! # Layout
//!
//! | Path | Contents |
//! |------|----------|
//! | `<root>/<cache_dir>/<cache_id>/photo.jpg` | Root file |
//! | `<root>/<cache_dir>/<cache_id>/thumb_photo.jpg` | `thumb` version |
//! | `<root>/<cache_dir>/<cache_id>/thumb_small_photo.jpg` | `thumb.small` version |

pub mod area;
pub mod id;

pub use area::CacheArea;
pub use id::{cache_name, split_cache_name, CacheId};
