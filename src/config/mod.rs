//! Configuration module

mod site;

pub use site::PrismicConfig;
pub use site::ReadingTimeConfig;
pub use site::ReadingTimeMode;
pub use site::RichTextConfig;
pub use site::SiteConfig;
