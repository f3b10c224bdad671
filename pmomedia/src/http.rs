//! HTTP implementation of the media source contract

use crate::error::{Error, Result};
use crate::models::{MediaKind, SourceDescriptor};
use crate::source::MediaSource;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default timeout for resolution requests
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 5000;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "pmoview/0.1.0";

/// Append freshly generated dedup-busting query parameters to a URL
///
/// Upstream endpoints serve random content per request, but intermediate
/// caches may pin a response to the bare URL. A per-call timestamp and
/// random value keep two consecutive resolutions distinct.
pub fn cache_busted(endpoint: &str) -> Result<String> {
    let mut url = Url::parse(endpoint)?;
    url.query_pairs_mut()
        .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string())
        .append_pair("r", &rand::random::<u32>().to_string());
    Ok(url.into())
}

/// HTTP media source
///
/// Resolves one playable URL per call against a fixed endpoint:
///
/// - **Image endpoints** return a random image for every fetch of the same
///   path, so resolution is local: the busted URL itself is the item.
/// - **Video endpoints** are queried with a cancellable, timeout-bounded
///   GET; the post-redirect final URL is the item.
///
/// # Example
///
/// ```no_run
/// use pmomedia::{HttpMediaSource, MediaKind, MediaSource};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = HttpMediaSource::builder()
///         .id("picsum")
///         .name("Lorem Picsum")
///         .endpoint("https://picsum.photos/1920/1080")
///         .kind(MediaKind::Image)
///         .build()?;
///     let url = source.resolve(&CancellationToken::new()).await?;
///     println!("Resolved: {url}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
    id: String,
    name: String,
    endpoint: String,
    kind: MediaKind,
    client: Client,
    resolve_timeout: Duration,
}

impl HttpMediaSource {
    /// Create a builder for configuring the source
    pub fn builder() -> HttpMediaSourceBuilder {
        HttpMediaSourceBuilder::default()
    }

    /// Build a source from a catalog entry, sharing an HTTP client
    pub fn from_descriptor(
        desc: &SourceDescriptor,
        client: Client,
        resolve_timeout: Duration,
    ) -> Result<Self> {
        // Validation du endpoint dès l'enregistrement
        Url::parse(&desc.url)?;
        Ok(Self {
            id: desc.id.clone(),
            name: desc.name.clone(),
            endpoint: desc.url.clone(),
            kind: desc.kind,
            client,
            resolve_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl MediaSource for HttpMediaSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    async fn resolve(&self, cancel: &CancellationToken) -> Result<String> {
        let target = cache_busted(&self.endpoint)?;

        // Les endpoints image renvoient un contenu aléatoire par fetch :
        // l'URL elle-même est la résolution, pas besoin d'aller-retour.
        if self.kind.is_image() {
            return Ok(target);
        }

        let request = self.client.get(&target).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Aborted),
            outcome = tokio::time::timeout(self.resolve_timeout, request) => match outcome {
                Err(_) => return Err(Error::Timeout),
                Ok(Err(e)) => return Err(Error::Http(e)),
                Ok(Ok(response)) => response,
            },
        };

        let response = response.error_for_status()?;
        Ok(response.url().to_string())
    }
}

/// Builder for `HttpMediaSource`
#[derive(Debug, Default)]
pub struct HttpMediaSourceBuilder {
    id: Option<String>,
    name: Option<String>,
    endpoint: Option<String>,
    kind: Option<MediaKind>,
    client: Option<Client>,
    resolve_timeout: Option<Duration>,
}

impl HttpMediaSourceBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Share an existing HTTP client (connection pool, proxy settings)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpMediaSource> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::other("endpoint is required"))?;
        Url::parse(&endpoint)?;

        let id = self.id.unwrap_or_else(|| endpoint.clone());
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(DEFAULT_USER_AGENT)
                .build()
                .map_err(Error::Http)?,
        };

        Ok(HttpMediaSource {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            endpoint,
            kind: self.kind.unwrap_or(MediaKind::Image),
            client,
            resolve_timeout: self
                .resolve_timeout
                .unwrap_or(Duration::from_millis(DEFAULT_RESOLVE_TIMEOUT_MS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_busted_appends_fresh_parameters() {
        let a = cache_busted("https://example.com/random").unwrap();
        let b = cache_busted("https://example.com/random").unwrap();

        assert!(a.contains("t=") && a.contains("r="));
        // Deux appels consécutifs ne produisent jamais la même URL
        assert_ne!(a, b);
    }

    #[test]
    fn cache_busted_rejects_invalid_endpoint() {
        assert!(matches!(
            cache_busted("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn builder_requires_endpoint() {
        let err = HttpMediaSource::builder().id("x").build();
        assert!(err.is_err());
    }
}
