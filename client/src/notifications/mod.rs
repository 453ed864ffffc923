//! Push notification popups.
//!
//! Turns delivered notifications into popup content, tracks the popup's
//! visibility, resolves its gestures, and saves attached images.

pub mod download;
pub mod gesture;
pub mod payload;
pub mod popup;

pub use download::{DirectoryMediaLibrary, ImageDownloader, MediaLibrary};
pub use gesture::{DismissResolution, ImageTransform, resolve_dismiss};
pub use payload::{PayloadDecoder, PopupContent, RawNotification, decode_image_urls};
pub use popup::{NotificationSource, PopupController};
