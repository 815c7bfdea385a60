//! Content module - post models and rich text rendering

mod post;
pub mod richtext;

pub use post::{
    Banner, ContentSection, DetailData, PostDetail, PostPagination, PostSummary, SummaryData,
};
pub use richtext::{EmbedPolicy, RichText, RichTextRenderer};
