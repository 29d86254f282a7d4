//! Remote video retrieval and thumbnail extraction.

pub mod download;
pub mod error;
pub mod thumbnail;

pub use download::{fetch_video, filename_from_url, mime_for_filename, DownloadedVideo};
pub use error::{MediaError, MediaResult};
pub use thumbnail::thumbnail_from_url;
