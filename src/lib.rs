//! Offshoot - versioned file uploads
//!
//! Caches an uploaded file, runs its processors, and stores it together
//! with a tree of derived versions (thumbnails, previews, ...). Every
//! lifecycle operation cascades to the versions.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod processing;
pub mod storage;
pub mod ui;
pub mod uploader;

pub use error::{OffshootError, OffshootResult};
pub use file::UploadedFile;
pub use uploader::{Mount, Uploader, UploaderDef, UrlArg, VersionOptions};
