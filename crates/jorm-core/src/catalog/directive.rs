//! Per-field mapping directives.
//!
//! Directives arrive as `;`-separated tag strings, e.g.
//! `"primaryKey;autoIncrement"` or `"column:username"`. Keys are matched
//! case-insensitively. Unknown keys are skipped so declarations written for a
//! newer engine still load.

use tracing::debug;

/// Parsed mapping directives for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    /// Field is the primary key.
    pub primary_key: bool,
    /// Primary key value is generated by the store.
    pub auto_increment: bool,
    /// Explicit column name.
    pub column: Option<String>,
    /// Stamp with the current time on create.
    pub auto_time: bool,
    /// Stamp with the current time on every update.
    pub auto_update: bool,
}

impl Directives {
    /// Parse a tag string.
    pub fn parse(tag: &str) -> Self {
        let mut directives = Self::default();
        directives.merge(tag);
        directives
    }

    /// Merge the directives of `tag` into `self`. Later values win.
    pub fn merge(&mut self, tag: &str) {
        for part in tag.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, arg) = match part.split_once(':') {
                Some((key, arg)) => (key.trim(), Some(arg.trim())),
                None => (part, None),
            };

            match key.to_ascii_lowercase().as_str() {
                "primarykey" | "primary_key" | "pk" => self.primary_key = true,
                "autoincrement" | "auto_increment" | "auto" => self.auto_increment = true,
                "auto_time" | "autotime" | "autocreatetime" => self.auto_time = true,
                "auto_update" | "autoupdate" | "autoupdatetime" => self.auto_update = true,
                "column" => match arg {
                    Some(name) if !name.is_empty() => self.column = Some(name.to_string()),
                    _ => debug!(directive = part, "Ignoring column directive without a name"),
                },
                _ => debug!(directive = part, "Ignoring unknown mapping directive"),
            }
        }
    }

    /// Check if the column is written by the engine rather than the caller.
    pub fn is_engine_managed(&self) -> bool {
        self.auto_increment || self.auto_time || self.auto_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_key_auto_increment() {
        let d = Directives::parse("primaryKey;autoIncrement");
        assert!(d.primary_key);
        assert!(d.auto_increment);
        assert_eq!(d.column, None);
    }

    #[test]
    fn test_parse_column_override() {
        let d = Directives::parse("column:username");
        assert_eq!(d.column.as_deref(), Some("username"));
        assert!(!d.primary_key);
    }

    #[test]
    fn test_aliases_and_case() {
        let d = Directives::parse(" PK ; auto ; AUTO_TIME ;autoUpdateTime");
        assert!(d.primary_key);
        assert!(d.auto_increment);
        assert!(d.auto_time);
        assert!(d.auto_update);
        assert!(d.is_engine_managed());
    }

    #[test]
    fn test_unknown_directives_ignored() {
        let d = Directives::parse("size:255;index;column:email;not_null");
        assert_eq!(
            d,
            Directives {
                column: Some("email".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_empty_column_name_ignored() {
        assert_eq!(Directives::parse("column:"), Directives::default());
        assert_eq!(Directives::parse(""), Directives::default());
    }
}
