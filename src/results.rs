use serde::{Deserialize, Serialize};

/// One article entry discovered on a search result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Headline as shown in the result listing
    pub title: String,

    /// Absolute URL of the article
    pub url: String,

    /// Source and publication time label, e.g. "中国日报网 2024-11-20 09:12"
    pub source_time: String,
}

impl LinkRecord {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source_time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_time: source_time.into(),
        }
    }
}

/// Title and cleaned body text pulled from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// Empty when no title probe matched
    pub title: String,

    /// Never empty
    pub content: String,
}

/// A fully harvested article, one CSV row.
///
/// Field order is the column order of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub source_time: String,
    pub content: String,
}

impl ArticleRecord {
    /// Merge link metadata with the extracted article.
    ///
    /// The re-extracted title wins when it is non-empty, otherwise the
    /// listing title is kept.
    pub fn from_parts(link: &LinkRecord, article: ExtractedArticle) -> Self {
        let title = if article.title.is_empty() {
            link.title.clone()
        } else {
            article.title
        };

        Self {
            title,
            url: link.url.clone(),
            source_time: link.source_time.clone(),
            content: article.content,
        }
    }
}
