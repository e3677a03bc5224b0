//! Lookup of well-known cookies in an Open Cookie Database CSV export
//!
//! The CSV has one row per cookie name. A row flagged as wildcard match names a
//! prefix: `_gat_gtag_` describes `_gat_gtag_UA_1234_1` as well.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading the cookie database
#[derive(Debug, Error)]
pub enum CookieDatabaseError {
    #[error("Failed to read cookie database '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

// Column positions of the CSV export; the header wording varies between releases
const COL_ID: usize = 0;
const COL_PLATFORM: usize = 1;
const COL_CATEGORY: usize = 2;
const COL_NAME: usize = 3;
const COL_DOMAIN: usize = 4;
const COL_DESCRIPTION: usize = 5;
const COL_RETENTION: usize = 6;
const COL_CONTROLLER: usize = 7;
const COL_PRIVACY: usize = 8;
const COL_WILDCARD: usize = 9;

/// What the database knows about one cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieInfo {
    pub id: String,
    pub platform: String,
    pub category: String,
    pub cookie_name: String,
    pub domain: String,
    pub description: String,
    pub retention_period: String,
    pub data_controller: String,
    pub privacy_policy: String,

    /// `cookie_name` is a prefix for every cookie starting with it
    pub wildcard_match: bool,
}

impl CookieInfo {
    fn from_record(record: &csv::StringRecord) -> Self {
        let field = |index: usize| record.get(index).unwrap_or("").trim().to_string();

        Self {
            id: field(COL_ID),
            platform: field(COL_PLATFORM),
            category: field(COL_CATEGORY),
            cookie_name: field(COL_NAME),
            domain: field(COL_DOMAIN),
            description: field(COL_DESCRIPTION),
            retention_period: field(COL_RETENTION),
            data_controller: field(COL_CONTROLLER),
            privacy_policy: field(COL_PRIVACY),
            wildcard_match: field(COL_WILDCARD) == "1",
        }
    }
}

/// Cookie descriptions keyed by cookie name
#[derive(Debug, Clone, Default)]
pub struct CookieDatabase {
    entries: HashMap<String, CookieInfo>,
}

impl CookieDatabase {
    /// Reads an Open Cookie Database CSV file
    ///
    /// The first row is the header. Rows may be shorter than the header; missing
    /// columns are empty. When a name occurs twice the first row wins.
    pub fn load(path: &Path) -> Result<Self, CookieDatabaseError> {
        let csv_error = |source: csv::Error| CookieDatabaseError::Csv {
            path: path.display().to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_error)?;

        let mut entries = HashMap::new();
        for record in reader.records() {
            let info = CookieInfo::from_record(&record.map_err(csv_error)?);
            if info.cookie_name.is_empty() {
                continue;
            }
            entries.entry(info.cookie_name.clone()).or_insert(info);
        }

        tracing::debug!("Loaded {} cookies from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a cookie by exact name, then by the longest wildcard prefix
    ///
    /// A wildcard hit is returned under the searched name.
    pub fn search(&self, cookie_name: &str) -> Option<CookieInfo> {
        if let Some(info) = self.entries.get(cookie_name) {
            return Some(info.clone());
        }

        self.entries
            .values()
            .filter(|info| info.wildcard_match && cookie_name.starts_with(&info.cookie_name))
            .max_by_key(|info| info.cookie_name.len())
            .map(|info| CookieInfo {
                cookie_name: cookie_name.to_string(),
                ..info.clone()
            })
    }
}
