//! Saving notification images to the device gallery.

use crate::errors::{ClientError, ClientResult};
use crate::notice::Notice;
use crate::push::PermissionStatus;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Album downloaded images are filed under.
pub const DOWNLOAD_ALBUM: &str = "Download";

/// Device media library.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn request_permission(&self) -> ClientResult<PermissionStatus>;

    /// Imports the file at `path` into `album`, creating the album if needed.
    async fn save_to_album(&self, path: &Path, album: &str) -> ClientResult<PathBuf>;
}

/// Media library rooted at a directory, one sub-directory per album.
#[derive(Debug, Clone)]
pub struct DirectoryMediaLibrary {
    root: PathBuf,
}

impl DirectoryMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaLibrary for DirectoryMediaLibrary {
    async fn request_permission(&self) -> ClientResult<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn save_to_album(&self, path: &Path, album: &str) -> ClientResult<PathBuf> {
        let album_dir = self.root.join(album);
        tokio::fs::create_dir_all(&album_dir)
            .await
            .map_err(|e| ClientError::platform(format!("Cannot create album: {}", e)))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| ClientError::platform("Downloaded file has no name"))?;
        let target = album_dir.join(file_name);

        tokio::fs::copy(path, &target)
            .await
            .map_err(|e| ClientError::platform(format!("Cannot import image: {}", e)))?;

        Ok(target)
    }
}

/// Downloads images into a scratch directory before handing them to the
/// media library.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    http_client: Client,
    directory: PathBuf,
}

impl ImageDownloader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            http_client: Client::new(),
            directory: directory.into(),
        }
    }

    /// Downloads `image_url` and saves it into the gallery.
    ///
    /// Every failure is reported as an error notice.
    pub async fn save_to_gallery<L: MediaLibrary + ?Sized>(
        &self,
        image_url: Option<&str>,
        library: &L,
    ) -> Notice {
        let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Notice::error("No image URL provided.");
        };

        match library.request_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(_) => return Notice::error("Media library permission not granted."),
            Err(e) => return Notice::error(format!("Download error: {}", e)),
        }

        match self.download_and_import(url, library).await {
            Ok(saved) => {
                info!(path = %saved.display(), "Image saved to gallery");
                Notice::success("Image saved to gallery!")
            }
            Err(ClientError::Http { status, .. }) => {
                error!(%url, status, "Image download failed");
                Notice::error("Image download failed.")
            }
            Err(e) => {
                error!(%url, "Download error: {}", e);
                Notice::error(format!("Download error: {}", e))
            }
        }
    }

    async fn download_and_import<L: MediaLibrary + ?Sized>(
        &self,
        url: &str,
        library: &L,
    ) -> ClientResult<PathBuf> {
        let file = self.download(url).await?;
        library.save_to_album(&file, DOWNLOAD_ALBUM).await
    }

    /// Fetches `url` into `downloaded_<millis>.jpg` in the scratch directory.
    pub async fn download(&self, url: &str) -> ClientResult<PathBuf> {
        info!(%url, "Downloading image");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http(status.as_u16(), String::new()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::network(e.to_string()))?;

        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            ClientError::platform(format!("Cannot create download directory: {}", e))
        })?;

        let path = self
            .directory
            .join(format!("downloaded_{}.jpg", Utc::now().timestamp_millis()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ClientError::platform(format!("Cannot write image: {}", e)))?;

        Ok(path)
    }
}
