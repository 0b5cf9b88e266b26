use serde::Deserialize;

/// Main configuration structure for a scraping run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scrape: ScrapeConfig,
    pub fields: FieldsConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
}

/// Id range and parallelism
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// URL containing a single `%d` where the id is substituted
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// First id to scrape (inclusive)
    pub from: i64,

    /// Last id to scrape (exclusive)
    pub to: i64,

    /// Number of workers fetching in parallel
    pub concurrency: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url_template: "http://example.com/v/%d".to_string(),
            from: 0,
            to: 1,
            concurrency: 1,
        }
    }
}

impl ScrapeConfig {
    /// Number of ids in `[from, to)`, zero when the range is empty
    pub fn task_count(&self) -> u64 {
        if self.to > self.from {
            self.to.abs_diff(self.from)
        } else {
            0
        }
    }
}

/// One extracted column: its header name and the selector that fills it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    /// Header name written to the output file
    pub column: String,

    /// CSS selector evaluated against each page
    pub selector: String,
}

impl FieldQuery {
    fn new(column: &str, selector: &str) -> Self {
        Self {
            column: column.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// The four extracted fields, always applied in name/address/phone/email order
///
/// In a config file each `[fields.<name>]` table may set `column`,
/// `selector`, or both; whatever is left out keeps that field's default.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawFields")]
pub struct FieldsConfig {
    pub name: FieldQuery,
    pub address: FieldQuery,
    pub phone: FieldQuery,
    pub email: FieldQuery,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            name: FieldQuery::new("name", ".name"),
            address: FieldQuery::new("address", ".address"),
            phone: FieldQuery::new("phone", ".phone"),
            email: FieldQuery::new("email", ".email"),
        }
    }
}

impl FieldsConfig {
    /// Returns the fields in their fixed output order
    pub fn ordered(&self) -> [&FieldQuery; 4] {
        [&self.name, &self.address, &self.phone, &self.email]
    }

    /// Header names for the extracted fields, in output order
    pub fn columns(&self) -> Vec<String> {
        self.ordered().iter().map(|f| f.column.clone()).collect()
    }

    /// Selector strings, in output order
    pub fn selectors(&self) -> Vec<String> {
        self.ordered().iter().map(|f| f.selector.clone()).collect()
    }
}

/// `[fields]` as written in the file, before defaults are filled in
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFields {
    name: FieldOverride,
    address: FieldOverride,
    phone: FieldOverride,
    email: FieldOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FieldOverride {
    column: Option<String>,
    selector: Option<String>,
}

impl FieldOverride {
    fn apply(self, default: FieldQuery) -> FieldQuery {
        FieldQuery {
            column: self.column.unwrap_or(default.column),
            selector: self.selector.unwrap_or(default.selector),
        }
    }
}

impl From<RawFields> for FieldsConfig {
    fn from(raw: RawFields) -> Self {
        let defaults = FieldsConfig::default();
        Self {
            name: raw.name.apply(defaults.name),
            address: raw.address.apply(defaults.address),
            phone: raw.phone.apply(defaults.phone),
            email: raw.email.apply(defaults.email),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the CSV file (created or truncated)
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output.csv".to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("idscrape/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
