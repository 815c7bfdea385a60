//! spacetraveling: a statically generated blog fed by a headless content API
//!
//! Posts are fetched from a Prismic repository and rendered with embedded
//! Tera templates. The home page lists posts a page at a time with a
//! "load more" control; every post known at build time gets its own page,
//! and posts published later are resolved on request by the server.

pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use source::{ContentSource, MemorySource, PrismicClient};

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Static assets copied into the output
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` when present
    /// and applying environment overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// The content source: a JSON dump when `offline` is given, the
    /// configured content API otherwise
    pub fn content_source(&self, offline: Option<&Path>) -> Result<Arc<dyn ContentSource>> {
        if let Some(path) = offline {
            return Ok(Arc::new(MemorySource::from_file(path)?));
        }

        let prismic = &self.config.prismic;
        if prismic.endpoint.is_empty() {
            anyhow::bail!(
                "No content API configured: set prismic.endpoint in _config.yml or PRISMIC_API_ENDPOINT"
            );
        }

        Ok(Arc::new(PrismicClient::new(
            &prismic.endpoint,
            prismic.access_token.clone(),
        )))
    }

    /// Generate the static site
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<()> {
        commands::generate::run(self, source).await?;
        Ok(())
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
