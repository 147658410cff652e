use crate::error::Error;
use crate::filter;
use crate::parsers::text::{capitalize, element_text, leading_words};
use crate::results::{Content, Image, Link, Meta, Section, SectionType};
use crate::utils::{clean_text, section_id, truncate_html};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector should be valid")
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[name="description"]"#));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector(r#"link[rel="canonical"]"#));
static SEMANTIC: LazyLock<Selector> =
    LazyLock::new(|| selector("header, nav, main, section, article, footer"));
static TOP_LEVEL_DIVS: LazyLock<Selector> = LazyLock::new(|| selector("body > div"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static LABEL_HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMAGES: LazyLock<Selector> = LazyLock::new(|| selector("img[src]"));
static LISTS: LazyLock<Selector> = LazyLock::new(|| selector("ul, ol"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static HEADER_CELLS: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static DATA_CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td"));

/// Number of words used for a label when a section has no heading
const LABEL_WORDS: usize = 6;

/// Segmentation tier that produced a page's sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Semantic,
    TopLevelDivs,
    Body,
    Empty,
}

/// Extracts page-level metadata from a parsed document
pub fn extract_metadata(doc: &Html, base: Option<&Url>) -> Meta {
    let mut meta = Meta::default();

    if let Some(title) = doc.select(&TITLE).next() {
        meta.title = element_text(&title);
    }

    if let Some(desc) = doc.select(&DESCRIPTION).next() {
        meta.description = desc.value().attr("content").unwrap_or_default().to_string();
    }

    meta.language = doc
        .root_element()
        .value()
        .attr("lang")
        .unwrap_or_default()
        .to_string();

    meta.canonical = doc
        .select(&CANONICAL)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(|href| match base {
            Some(base) => filter::absolutize(base, href),
            None => href.trim().to_string(),
        })
        .filter(|href| !href.is_empty());

    meta
}

/// Builds sections for a document using the first tier that yields any.
///
/// Failures building individual candidates are collected in `errors` and the
/// candidate is skipped.
pub struct SectionBuilder<'a> {
    pub source_url: &'a str,
    pub base: Option<&'a Url>,
    pub max_raw_html_length: usize,
}

impl SectionBuilder<'_> {
    /// Runs the tiered segmentation, returning sections in discovery order
    pub fn segment(&self, doc: &Html, errors: &mut Vec<Error>) -> (Vec<Section>, Tier) {
        let sections = self.build_all(doc.select(&SEMANTIC), errors);
        if !sections.is_empty() {
            return (sections, Tier::Semantic);
        }

        let sections = self.build_all(doc.select(&TOP_LEVEL_DIVS), errors);
        if !sections.is_empty() {
            return (sections, Tier::TopLevelDivs);
        }

        let sections = self.build_all(doc.select(&BODY).take(1), errors);
        if !sections.is_empty() {
            return (sections, Tier::Body);
        }

        (Vec::new(), Tier::Empty)
    }

    fn build_all<'b>(
        &self,
        candidates: impl Iterator<Item = ElementRef<'b>>,
        errors: &mut Vec<Error>,
    ) -> Vec<Section> {
        let mut sections = Vec::new();
        for element in candidates {
            match self.build_section(&element) {
                Ok(section) if !section.content.text.is_empty() => sections.push(section),
                Ok(_) => {}
                Err(e) => {
                    ::log::debug!(
                        "Skipping <{}> candidate in {}: {}",
                        element.value().name(),
                        self.source_url,
                        e
                    );
                    errors.push(e);
                }
            }
        }
        sections
    }

    /// Builds one section from an element
    pub fn build_section(&self, element: &ElementRef) -> Result<Section, Error> {
        let base = self.base.ok_or_else(|| {
            Error::Parse(format!(
                "cannot resolve references against source URL {:?}",
                self.source_url
            ))
        })?;

        let tag = element.value().name();
        let content = extract_content(element, base);
        let label = section_label(element, &content.text);
        let (raw_html, truncated) = truncate_html(&element.html(), self.max_raw_html_length);

        Ok(Section {
            id: section_id(&label),
            section_type: SectionType::from_tag(tag),
            label,
            source_url: self.source_url.to_string(),
            content,
            raw_html,
            truncated,
        })
    }
}

/// Extracts text, headings, links, images, lists and tables of an element
pub fn extract_content(element: &ElementRef, base: &Url) -> Content {
    let text = clean_text(&element_text(element));

    let headings = element
        .select(&HEADINGS)
        .map(|h| element_text(&h))
        .collect();

    let links = element
        .select(&LINKS)
        .map(|a| Link {
            text: element_text(&a),
            href: filter::absolutize(base, a.value().attr("href").unwrap_or_default()),
        })
        .collect();

    let images = element
        .select(&IMAGES)
        .map(|img| Image {
            src: filter::absolutize(base, img.value().attr("src").unwrap_or_default()),
            alt: img.value().attr("alt").unwrap_or_default().to_string(),
        })
        .collect();

    let lists = element
        .select(&LISTS)
        .map(list_items)
        .filter(|items| !items.is_empty())
        .collect();

    let tables = element.select(&TABLES).map(table_object).collect();

    Content {
        headings,
        text,
        links,
        images,
        lists,
        tables,
    }
}

/// Texts of the direct `li` children of a list
fn list_items(list: ElementRef) -> Vec<String> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(|li| element_text(&li))
        .filter(|text| !text.is_empty())
        .collect()
}

/// `{ "headers": [...], "rows": [[...], ...] }` for a table
fn table_object(table: ElementRef) -> Map<String, Value> {
    let headers: Vec<Value> = table
        .select(&HEADER_CELLS)
        .map(|th| Value::String(element_text(&th)))
        .collect();

    let rows: Vec<Value> = table
        .select(&ROWS)
        .map(|tr| {
            tr.select(&DATA_CELLS)
                .map(|td| Value::String(element_text(&td)))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .map(Value::Array)
        .collect();

    let mut object = Map::new();
    object.insert("headers".to_string(), Value::Array(headers));
    object.insert("rows".to_string(), Value::Array(rows));
    object
}

/// Label for a section: its first h1-h3, else its leading words, else its tag
pub fn section_label(element: &ElementRef, text: &str) -> String {
    if let Some(heading) = element.select(&LABEL_HEADINGS).next() {
        let heading_text = element_text(&heading);
        if !heading_text.is_empty() {
            return heading_text;
        }
    }

    if !text.is_empty() {
        return leading_words(text, LABEL_WORDS);
    }

    let tag = capitalize(element.value().name());
    if tag.is_empty() {
        "Content".to_string()
    } else {
        tag
    }
}
