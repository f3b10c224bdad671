//! Catalog of registered media sources and the current selection

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::http::HttpMediaSource;
use crate::models::SourceDescriptor;
use crate::source::MediaSource;

/// Registry of the sources a viewer session can pull from
///
/// Sources keep their registration order (the selection UI shows them that
/// way); selection defaults to the first registered source. Changing the
/// selection is validated against membership — the caller reacts to a
/// successful change by resetting the playback pipeline.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn MediaSource>>,
    order: Vec<String>,
    selected: Option<String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from catalog entries, sharing one HTTP client
    ///
    /// Invalid entries are skipped with a warning; an empty catalog yields
    /// an empty registry (the viewer then has nothing to play).
    pub fn from_descriptors(
        descriptors: &[SourceDescriptor],
        client: reqwest::Client,
        resolve_timeout: Duration,
    ) -> Self {
        let mut registry = Self::new();
        for desc in descriptors {
            match HttpMediaSource::from_descriptor(desc, client.clone(), resolve_timeout) {
                Ok(source) => registry.register(Arc::new(source)),
                Err(e) => {
                    warn!(id = %desc.id, url = %desc.url, error = %e, "Skipping invalid source entry");
                }
            }
        }
        registry
    }

    /// Register a source; the first one becomes the default selection
    pub fn register(&mut self, source: Arc<dyn MediaSource>) {
        let id = source.id().to_string();
        if self.sources.insert(id.clone(), source).is_none() {
            self.order.push(id.clone());
        }
        if self.selected.is_none() {
            self.selected = Some(id);
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn MediaSource>> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownSource(id.to_string()))
    }

    /// Change the active selection
    pub fn select(&mut self, id: &str) -> Result<Arc<dyn MediaSource>> {
        let source = self.get(id)?;
        self.selected = Some(id.to_string());
        info!(source = %source.name(), "Selected media source");
        Ok(source)
    }

    /// Currently selected source, if any is registered
    pub fn selected(&self) -> Option<Arc<dyn MediaSource>> {
        self.selected
            .as_deref()
            .and_then(|id| self.sources.get(id).cloned())
    }

    /// All registered sources, in registration order
    pub fn list(&self) -> Vec<Arc<dyn MediaSource>> {
        self.order
            .iter()
            .filter_map(|id| self.sources.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn descriptor(id: &str, kind: MediaKind) -> SourceDescriptor {
        SourceDescriptor {
            id: id.to_string(),
            name: format!("Source {id}"),
            url: format!("https://example.com/{id}"),
            kind,
        }
    }

    fn registry_of(ids: &[&str]) -> SourceRegistry {
        let descriptors: Vec<_> = ids
            .iter()
            .map(|id| descriptor(id, MediaKind::Image))
            .collect();
        SourceRegistry::from_descriptors(
            &descriptors,
            reqwest::Client::new(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn first_registered_source_is_selected() {
        let registry = registry_of(&["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.selected().unwrap().id(), "a");
    }

    #[test]
    fn select_validates_membership() {
        let mut registry = registry_of(&["a", "b"]);
        assert!(registry.select("b").is_ok());
        assert_eq!(registry.selected().unwrap().id(), "b");

        assert!(matches!(registry.select("nope"), Err(Error::UnknownSource(_))));
        // Failed selection leaves the previous one in place
        assert_eq!(registry.selected().unwrap().id(), "b");
    }

    #[test]
    fn invalid_catalog_entries_are_skipped() {
        let mut descriptors = vec![descriptor("ok", MediaKind::Video)];
        descriptors.push(SourceDescriptor {
            id: "broken".into(),
            name: "Broken".into(),
            url: "not a url".into(),
            kind: MediaKind::Image,
        });

        let registry = SourceRegistry::from_descriptors(
            &descriptors,
            reqwest::Client::new(),
            Duration::from_secs(5),
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.selected().unwrap().id(), "ok");
    }
}
