//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::content::EmbedPolicy;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,
    pub date_format: String,
    pub logo: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,

    // Content source
    #[serde(default)]
    pub prismic: PrismicConfig,

    /// Resolve unknown post slugs at request time
    pub fallback: bool,

    #[serde(default)]
    pub reading_time: ReadingTimeConfig,

    #[serde(default)]
    pub rich_text: RichTextConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: String::new(),
            date_format: "dd MMM yyyy".to_string(),
            logo: "/Logo.svg".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),

            prismic: PrismicConfig::default(),
            fallback: true,
            reading_time: ReadingTimeConfig::default(),
            rich_text: RichTextConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("PRISMIC_API_ENDPOINT").ok(),
            std::env::var("PRISMIC_ACCESS_TOKEN").ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            tracing::debug!("Using content API endpoint from environment");
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            self.prismic.access_token = Some(token);
        }
    }
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API entry point, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    /// Posts per listing page
    pub page_size: u32,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "post".to_string(),
            page_size: 1,
        }
    }
}

/// How the reading time shown on a post is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingTimeMode {
    /// Always show `minutes`
    Fixed,
    /// Derive from the word count of the post
    Computed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingTimeConfig {
    pub mode: ReadingTimeMode,
    pub minutes: u32,
    pub words_per_minute: u32,
}

impl Default for ReadingTimeConfig {
    fn default() -> Self {
        Self {
            mode: ReadingTimeMode::Fixed,
            minutes: 4,
            words_per_minute: 200,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextConfig {
    pub embed: EmbedPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.prismic.document_type, "post");
        assert_eq!(config.prismic.page_size, 1);
        assert!(config.fallback);
        assert_eq!(config.reading_time.mode, ReadingTimeMode::Fixed);
        assert_eq!(config.reading_time.minutes, 4);
        assert_eq!(config.rich_text.embed, EmbedPolicy::Trusted);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
prismic:
  endpoint: https://blog.cdn.prismic.io/api/v2
  page_size: 5
fallback: false
reading_time:
  mode: computed
rich_text:
  embed: sanitized
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "en");
        assert_eq!(config.prismic.endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.page_size, 5);
        assert_eq!(config.prismic.document_type, "post");
        assert!(!config.fallback);
        assert_eq!(config.reading_time.mode, ReadingTimeMode::Computed);
        assert_eq!(config.reading_time.words_per_minute, 200);
        assert_eq!(config.rich_text.embed, EmbedPolicy::Sanitized);
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let mut config = SiteConfig::default();
        config.prismic.endpoint = "https://a.cdn.prismic.io/api/v2".to_string();

        config.apply_overrides(Some(String::new()), Some("secret".to_string()));
        assert_eq!(config.prismic.endpoint, "https://a.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.access_token.as_deref(), Some("secret"));

        config.apply_overrides(Some("https://b.cdn.prismic.io/api/v2".to_string()), None);
        assert_eq!(config.prismic.endpoint, "https://b.cdn.prismic.io/api/v2");
    }
}
