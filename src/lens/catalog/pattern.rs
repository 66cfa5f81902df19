//! Script naming pattern
//!
//! A naming pattern is a regular expression template. Before compiling, the
//! placeholders below are replaced with escaped literal values:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{schema_name}` | schema name given when searching scripts |
//! | `{db_name}` | database file name without extension |
//! | `{db_ext}` | database extension including the dot (e.g. `.db`) |
//!
//! Other braces are left alone, so repetition counts such as `\d{3}` keep
//! their regex meaning. The compiled expression must have exactly three
//! capturing groups: version, category and description.

use regex::Regex;

use crate::error::{Result, UpgradeError};

/// Default pattern for script file names
pub const DEFAULT_SCRIPT_PATTERN: &str =
    r"^(\d+)_(full|upgrade|mandatory)_{schema_name}_(.*)\.sql$";

/// Number of capture groups a pattern must define
pub const PATTERN_GROUP_COUNT: usize = 3;

/// Values substituted into a pattern template
#[derive(Debug, Clone, Default)]
pub struct PatternContext {
    pub schema_name: String,
    pub db_name: String,
    pub db_ext: String,
}

impl PatternContext {
    pub fn new(schema_name: &str) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, db_name: &str, db_ext: &str) -> Self {
        self.db_name = db_name.to_string();
        self.db_ext = db_ext.to_string();
        self
    }

    /// Replace the placeholders of `template`
    pub fn substitute(&self, template: &str) -> String {
        template
            .replace("{schema_name}", &regex::escape(&self.schema_name))
            .replace("{db_name}", &regex::escape(&self.db_name))
            .replace("{db_ext}", &regex::escape(&self.db_ext))
    }
}

/// A compiled naming pattern with a validated group count
#[derive(Debug, Clone)]
pub struct NamingPattern {
    template: String,
    regex: Regex,
}

/// Captures of a matching file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch<'a> {
    pub version: &'a str,
    pub category: &'a str,
    pub description: &'a str,
}

impl NamingPattern {
    /// Substitute placeholders and compile the template
    pub fn compile(template: &str, context: &PatternContext) -> Result<Self> {
        let source = context.substitute(template);

        let regex = Regex::new(&source).map_err(|e| UpgradeError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;

        // captures_len counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != PATTERN_GROUP_COUNT {
            return Err(UpgradeError::InvalidPattern {
                pattern: source,
                reason: format!(
                    "{} capturing groups are expected in the pattern, found {}",
                    PATTERN_GROUP_COUNT, groups
                ),
            });
        }

        Ok(Self {
            template: template.to_string(),
            regex,
        })
    }

    /// The template before substitution
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled expression after substitution
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Match a file name, anchored at its start
    ///
    /// Unmatched optional groups yield empty strings.
    pub fn match_name<'a>(&self, file_name: &'a str) -> Option<NameMatch<'a>> {
        let caps = self.regex.captures(file_name)?;
        if caps.get(0).map(|m| m.start()) != Some(0) {
            return None;
        }
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        Some(NameMatch {
            version: group(1),
            category: group(2),
            description: group(3),
        })
    }
}
