//! HTML field extraction
//!
//! Selectors are compiled once into a [`QuerySet`] at startup and shared
//! read-only by every worker. Extraction itself is a pure function of the
//! page content and the query set.

use crate::ConfigError;
use scraper::{Html, Selector};

/// Ordered, pre-compiled selectors
#[derive(Debug, Clone)]
pub struct QuerySet {
    selectors: Vec<Selector>,
}

impl QuerySet {
    /// Compiles selectors, keeping their order
    pub fn compile<I, S>(queries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selectors = queries
            .into_iter()
            .map(|query| {
                let query = query.as_ref();
                if query.trim().is_empty() {
                    return Err(ConfigError::InvalidSelector {
                        selector: query.to_string(),
                        message: "selector cannot be empty".to_string(),
                    });
                }

                Selector::parse(query).map_err(|e| ConfigError::InvalidSelector {
                    selector: query.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { selectors })
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Extracts one value per selector from decoded page content
    ///
    /// The HTML parser is error tolerant, so malformed markup still yields a
    /// document and extraction cannot fail. Each value is the text of
    /// every matching element concatenated in document order, with leading
    /// and trailing whitespace trimmed. A selector with no match yields an
    /// empty string.
    ///
    /// # Example
    ///
    /// ```
    /// use idscrape::pipeline::QuerySet;
    ///
    /// let queries = QuerySet::compile([".name", ".missing"]).unwrap();
    /// let fields = queries.extract("<div class=\"name\"> Ada </div>");
    /// assert_eq!(fields, vec!["Ada".to_string(), String::new()]);
    /// ```
    pub fn extract(&self, content: &str) -> Vec<String> {
        let document = Html::parse_document(content);

        self.selectors
            .iter()
            .map(|selector| select_text(&document, selector))
            .collect()
    }
}

fn select_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}
