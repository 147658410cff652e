use crate::error::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete outcome of a single scrape request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// URL that was scraped
    pub url: String,

    /// UTC timestamp (ISO 8601) taken when the result was assembled
    #[serde(rename = "scrapedAt")]
    pub scraped_at: String,

    pub meta: Meta,

    /// Sections in discovery order
    pub sections: Vec<Section>,

    /// What the renderer did to the page before extraction
    pub interactions: Interactions,

    /// Non-fatal errors, in the order they were recorded
    #[serde(default)]
    pub errors: Vec<ScrapeError>,
}

/// Page-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub title: String,
    pub description: String,
    pub language: String,
    /// Absolute canonical URL, if the page declares one
    pub canonical: Option<String>,
}

/// Classification of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Hero,
    Section,
    Nav,
    Footer,
    List,
    Grid,
    Faq,
    Pricing,
    Unknown,
}

impl SectionType {
    /// Maps an element's tag name onto a section type
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "nav" => SectionType::Nav,
            "footer" => SectionType::Footer,
            "header" => SectionType::Hero,
            "section" => SectionType::Section,
            _ => SectionType::Unknown,
        }
    }
}

/// A labeled chunk of page content extracted as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// `section-` followed by 8 hex chars derived from `label`
    pub id: String,

    #[serde(rename = "type")]
    pub section_type: SectionType,

    pub label: String,

    #[serde(rename = "sourceUrl")]
    pub source_url: String,

    pub content: Content,

    /// Serialized element, possibly cut at a tag boundary
    #[serde(rename = "rawHtml")]
    pub raw_html: String,

    #[serde(default)]
    pub truncated: bool,
}

/// Extracted content of a section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    pub headings: Vec<String>,
    pub text: String,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub lists: Vec<Vec<String>>,
    pub tables: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// Record of simulated user activity during rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interactions {
    pub clicks: Vec<Click>,
    pub scrolls: u32,
    pub pages: Vec<String>,
}

/// One successfully performed click
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    /// Visible text of the element, at most 50 chars
    pub text: String,
    pub selector: String,
    pub element_id: Option<String>,
    pub timestamp: String,
}

/// Non-fatal error entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeError {
    pub message: String,
    pub phase: Phase,
}

impl ScrapeError {
    pub fn new(message: impl Into<String>, phase: Phase) -> Self {
        Self {
            message: message.into(),
            phase,
        }
    }
}

/// Which fetch path produced the sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Static,
    Js,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Static => "static",
            Strategy::Js => "js",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scrape result together with the strategy that produced it
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub result: ScrapeResult,
    pub strategy: Strategy,
}
