//! Extension pour intégrer le catalogue de sources dans pmoconfig
//!
//! Ce module fournit le trait `MediaCatalogConfigExt` qui permet de lire le
//! catalogue `sources:` de la configuration sous forme typée.
//!
//! # Exemple
//!
//! ```rust,ignore
//! use pmoconfig::get_config;
//! use pmomedia::MediaCatalogConfigExt;
//!
//! let config = get_config();
//! let sources = config.get_media_sources()?;
//! ```

use anyhow::Result;
use pmoconfig::Config;

use crate::models::SourceDescriptor;

/// Trait d'extension pour lire le catalogue de sources médias
pub trait MediaCatalogConfigExt {
    /// Récupère les entrées du catalogue `sources:`
    ///
    /// Les entrées mal formées sont ignorées avec un avertissement plutôt
    /// que de faire échouer le chargement complet.
    fn get_media_sources(&self) -> Result<Vec<SourceDescriptor>>;
}

impl MediaCatalogConfigExt for Config {
    fn get_media_sources(&self) -> Result<Vec<SourceDescriptor>> {
        let catalog = self.get_sources_catalog();
        let entries = match catalog {
            serde_yaml::Value::Sequence(entries) => entries,
            _ => return Ok(Vec::new()),
        };

        let mut descriptors = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_yaml::from_value::<SourceDescriptor>(entry) {
                Ok(desc) => descriptors.push(desc),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed source catalog entry");
                }
            }
        }
        Ok(descriptors)
    }
}
