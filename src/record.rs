//! Row schema and the derived-field rules.
//!
//! A [`Record`] carries the four core source columns (`title`, `plot`,
//! `release_year`, `genre`), the three derived columns computed by the
//! transform stage (`plot_length`, `title_clean`, `decade`), and any number of
//! passthrough columns whose names live in the dataset's [`Schema`].

use regex::Regex;
use std::sync::LazyLock;

pub const TITLE: &str = "title";
pub const PLOT: &str = "plot";
pub const RELEASE_YEAR: &str = "release_year";
pub const GENRE: &str = "genre";
pub const PLOT_LENGTH: &str = "plot_length";
pub const TITLE_CLEAN: &str = "title_clean";
pub const DECADE: &str = "decade";

/// Columns the transform stage requires in the (normalized) source header.
pub const REQUIRED_COLUMNS: [&str; 3] = [TITLE, PLOT, RELEASE_YEAR];

/// Every column with a dedicated [`Record`] field. Anything else is passthrough.
pub const KNOWN_COLUMNS: [&str; 7] = [
    TITLE,
    PLOT,
    RELEASE_YEAR,
    GENRE,
    PLOT_LENGTH,
    TITLE_CLEAN,
    DECADE,
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w_]").expect("valid non-word regex"));

/// One movie row.
///
/// `extra` is positional: `extra[i]` belongs to `Schema::passthrough[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record {
    pub title: Option<String>,
    pub plot: Option<String>,
    pub release_year: Option<i32>,
    pub genre: Option<String>,
    pub plot_length: u32,
    pub title_clean: Option<String>,
    pub decade: Option<i32>,
    pub extra: Vec<Option<String>>,
}

/// Column layout shared by every record of a [`Dataset`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    /// Passthrough column names, normalized, in source order.
    pub passthrough: Vec<String>,
}

impl Schema {
    #[must_use]
    pub fn new(passthrough: Vec<String>) -> Self {
        Self { passthrough }
    }

    /// Full column order as persisted: core source columns, passthrough
    /// columns, then derived columns.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![TITLE, PLOT, RELEASE_YEAR, GENRE];
        names.extend(self.passthrough.iter().map(String::as_str));
        names.extend([PLOT_LENGTH, TITLE_CLEAN, DECADE]);
        names
    }
}

/// An ordered collection of records sharing one [`Schema`].
///
/// Order is not meaningful: partitioning reorders records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl Dataset {
    #[must_use]
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in a canonical order, for order-independent comparison.
    #[must_use]
    pub fn sorted_records(&self) -> Vec<Record> {
        let mut records = self.records.clone();
        records.sort();
        records
    }

    /// Value of a passthrough column for the given record, if the column exists.
    #[must_use]
    pub fn passthrough_value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a str> {
        let idx = self.schema.passthrough.iter().position(|c| c == column)?;
        record.extra.get(idx)?.as_deref()
    }
}

/// Normalize a source header: trim, lowercase, spaces and hyphens become underscores.
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Number of whitespace-delimited tokens.
#[must_use]
pub fn plot_length(plot: &str) -> u32 {
    u32::try_from(plot.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Lowercase, spaces to underscores, then strip everything that is not a word character.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let lowered = title.to_lowercase().replace(' ', "_");
    NON_WORD.replace_all(&lowered, "").into_owned()
}

/// `floor(year / 10) * 10`, flooring toward negative infinity.
#[must_use]
pub const fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}
