//! Export of the current item to a local file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pmomedia::MediaItem;
use tracing::info;

/// Saves media items into a target directory
///
/// Files are named `media_<unix-millis>.<ext>` with the extension taken
/// from the item kind. Transport failures bubble up so the caller can
/// fall back to opening the raw URL directly.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    directory: PathBuf,
}

impl Downloader {
    pub fn new(client: reqwest::Client, directory: impl Into<PathBuf>) -> Self {
        Self {
            client,
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Fetch the item and write it to the download directory
    pub async fn download(&self, item: &MediaItem) -> Result<PathBuf> {
        let filename = format!(
            "media_{}.{}",
            chrono::Utc::now().timestamp_millis(),
            item.kind.default_extension()
        );
        let path = self.directory.join(filename);

        let response = self
            .client
            .get(&item.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("fetching media for download")?;
        let bytes = response.bytes().await.context("reading download body")?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .context("creating download directory")?;
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        info!(path = %path.display(), bytes = bytes.len(), "💾 Saved media");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmomedia::MediaKind;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn downloads_into_target_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-jpeg".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = Downloader::new(reqwest::Client::new(), dir.path());
        let item = MediaItem::new(format!("{}/img", server.uri()), MediaKind::Image);

        let path = downloader.download(&item).await.unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"fake-jpeg");
    }

    #[tokio::test]
    async fn transport_failure_bubbles_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = Downloader::new(reqwest::Client::new(), dir.path());
        let item = MediaItem::video(format!("{}/video", server.uri()));

        assert!(downloader.download(&item).await.is_err());
    }
}
