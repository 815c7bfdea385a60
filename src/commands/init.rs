//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: ''
date_format: dd MMM yyyy
logo: /Logo.svg

# URL
url: http://localhost:3000
root: /

# Directory
source_dir: source
public_dir: public

# Content API
## The endpoint and token can also come from PRISMIC_API_ENDPOINT and
## PRISMIC_ACCESS_TOKEN.
prismic:
  endpoint: ''
  document_type: post
  page_size: 1

## Pagination: the "load more" button asks `spacetraveling server` for the
## next posts (GET /posts/more). When the output of `generate` is deployed
## without the server, only the first page is shown and the button hides
## itself.

# Resolve posts published after the last generation when they are requested
fallback: true

# Reading time shown on posts (fixed | computed)
reading_time:
  mode: fixed
  minutes: 4
  words_per_minute: 200

# Rich text from the content API (trusted | sanitized)
rich_text:
  embed: trusted
"#;

const DEFAULT_LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="238" height="25" viewBox="0 0 238 25">
  <text x="0" y="20" font-family="Inter, sans-serif" font-size="22" fill="#F8F8F8">spacetraveling<tspan fill="#FF57B2">.</tspan></text>
</svg>
"##;

/// Initialize a new blog in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("source"))?;
    fs::create_dir_all(target_dir.join("languages"))?;

    write_if_missing(&target_dir.join("_config.yml"), DEFAULT_CONFIG)?;
    write_if_missing(&target_dir.join("source/Logo.svg"), DEFAULT_LOGO)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::debug!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created {:?}", path);
    Ok(())
}
