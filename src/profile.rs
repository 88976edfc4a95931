//! Scanning of textual query profiles.
//!
//! Profiles are human-readable reports with no versioned format. Fields are
//! located by their literal labels.

const ROWS_PRODUCED_LABEL: &str = "RowsProduced";
const NON_DEFAULT_OPTIONS_LABEL: &str = "Query Options (non default):";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeProfile {
    text: String,
}

impl RuntimeProfile {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    pub fn lines_containing<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.text.lines().filter(move |line| line.contains(label))
    }

    pub fn first_line_containing(&self, label: &str) -> Option<&str> {
        self.text.lines().find(|line| line.contains(label))
    }

    /// Row count from the first `RowsProduced` line, which belongs to the
    /// coordinator fragment. The exact count is the last parenthesised number,
    /// e.g. `RowsProduced: 5 (5)`.
    pub fn rows_produced(&self) -> Option<u64> {
        let line = self.first_line_containing(ROWS_PRODUCED_LABEL)?;
        let open = line.rfind('(')?;
        let close = open + line[open..].find(')')?;
        line[open + 1..close].trim().parse().ok()
    }

    /// `(NAME, VALUE)` pairs from the non-default query options line, in
    /// profile order. `None` when the profile has no such line.
    pub fn non_default_query_options(&self) -> Option<Vec<(String, String)>> {
        let line = self.first_line_containing(NON_DEFAULT_OPTIONS_LABEL)?;
        let (_, options) = line.split_once(NON_DEFAULT_OPTIONS_LABEL)?;

        Some(
            options
                .split(',')
                .map(str::trim)
                .filter(|option| !option.is_empty())
                .map(|option| match option.split_once('=') {
                    Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                    None => (option.to_string(), String::new()),
                })
                .collect(),
        )
    }

    /// Value of a non-default option; names compare case-insensitively.
    pub fn query_option(&self, name: &str) -> Option<String> {
        self.non_default_query_options()?
            .into_iter()
            .find(|(option, _)| option.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

impl From<String> for RuntimeProfile {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
