//! Post models mapped from content API documents

use serde::{Deserialize, Deserializer, Serialize};

use super::richtext::{as_text, Block, RichText};
use crate::config::{ReadingTimeConfig, ReadingTimeMode};
use crate::helpers::count_words;
use crate::source::{Document, SearchResponse, SourceError};

/// A post as shown on the listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Slug
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub data: SummaryData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryData {
    #[serde(default, deserialize_with = "text_field")]
    pub title: String,
    #[serde(default, deserialize_with = "text_field")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "text_field")]
    pub author: String,
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub data: DetailData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailData {
    #[serde(default, deserialize_with = "text_field")]
    pub title: String,
    #[serde(default, deserialize_with = "text_field")]
    pub subtitle: String,
    #[serde(default)]
    pub banner: Option<Banner>,
    #[serde(default, deserialize_with = "text_field")]
    pub author: String,
    #[serde(default)]
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: String,
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "text_field")]
    pub heading: String,
    #[serde(default)]
    pub body: RichText,
}

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPagination {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl TryFrom<Document> for PostSummary {
    type Error = SourceError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let uid = require_uid(&doc)?;
        let data = serde_json::from_value(doc.data)
            .map_err(|e| SourceError::Parse(format!("document {}: {}", doc.id, e)))?;

        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            data,
        })
    }
}

impl TryFrom<Document> for PostDetail {
    type Error = SourceError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let uid = require_uid(&doc)?;
        let data = serde_json::from_value(doc.data)
            .map_err(|e| SourceError::Parse(format!("document {}: {}", doc.id, e)))?;

        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            data,
        })
    }
}

impl TryFrom<SearchResponse> for PostPagination {
    type Error = SourceError;

    fn try_from(response: SearchResponse) -> Result<Self, Self::Error> {
        let results = response
            .results
            .into_iter()
            .map(PostSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            results,
            next_page: response.next_page.filter(|p| !p.is_empty()),
        })
    }
}

impl PostDetail {
    /// Words across all section headings and bodies
    pub fn word_count(&self) -> usize {
        self.data
            .content
            .iter()
            .map(|section| count_words(&section.heading) + count_words(&as_text(&section.body)))
            .sum()
    }

    /// Reading time in minutes
    pub fn reading_time(&self, config: &ReadingTimeConfig) -> u32 {
        match config.mode {
            ReadingTimeMode::Fixed => config.minutes,
            ReadingTimeMode::Computed => {
                let wpm = config.words_per_minute.max(1) as usize;
                self.word_count().div_ceil(wpm).max(1) as u32
            }
        }
    }
}

fn require_uid(doc: &Document) -> Result<String, SourceError> {
    doc.uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| SourceError::Parse(format!("document {} has no uid", doc.id)))
}

/// Accept a text field sent either as a string or as rich text
fn text_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextField {
        Plain(String),
        Rich(Vec<Block>),
    }

    Ok(match Option::<TextField>::deserialize(deserializer)? {
        Some(TextField::Plain(s)) => s,
        Some(TextField::Rich(blocks)) => as_text(&blocks),
        None => String::new(),
    })
}
