//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::source::ContentSource;
use crate::Blog;

/// Generate the static site from `source`
pub async fn run(blog: &Blog, source: &dyn ContentSource) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let report = generator.generate(source).await?;

    for slug in &report.skipped {
        tracing::warn!("No page generated for {:?}", slug);
    }

    let duration = start.elapsed();
    tracing::info!("Completed in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
