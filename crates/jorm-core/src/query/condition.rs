//! WHERE-clause accumulation.

use crate::error::{Error, Result};
use crate::value::Value;

/// Lexical context a scan of SQL text ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanEnd {
    Code,
    Quoted,
    LineComment,
    BlockComment,
}

#[derive(Clone, Copy)]
enum Lexeme {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Visit the byte offset of every `?` placeholder in `sql`, skipping quoted
/// literals and identifiers, `--` line comments and `/* */` block comments.
/// Doubled quotes inside a literal are escapes.
pub(crate) fn for_each_placeholder(sql: &str, mut visit: impl FnMut(usize)) -> ScanEnd {
    let mut lexeme = Lexeme::Code;
    let mut chars = sql.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match lexeme {
            Lexeme::Quoted(q) if c == q => {
                if next == Some(q) {
                    chars.next();
                } else {
                    lexeme = Lexeme::Code;
                }
            }
            Lexeme::Quoted(_) => {}
            Lexeme::LineComment => {
                if c == '\n' {
                    lexeme = Lexeme::Code;
                }
            }
            Lexeme::BlockComment => {
                if c == '*' && next == Some('/') {
                    chars.next();
                    lexeme = Lexeme::Code;
                }
            }
            Lexeme::Code => match c {
                '\'' | '"' | '`' => lexeme = Lexeme::Quoted(c),
                '-' if next == Some('-') => {
                    chars.next();
                    lexeme = Lexeme::LineComment;
                }
                '/' if next == Some('*') => {
                    chars.next();
                    lexeme = Lexeme::BlockComment;
                }
                '?' => visit(idx),
                _ => {}
            },
        }
    }

    match lexeme {
        Lexeme::Code => ScanEnd::Code,
        Lexeme::Quoted(_) => ScanEnd::Quoted,
        Lexeme::LineComment => ScanEnd::LineComment,
        Lexeme::BlockComment => ScanEnd::BlockComment,
    }
}

/// Number of `?` placeholders in `sql` outside quoted text and comments.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    for_each_placeholder(sql, |_| count += 1);
    count
}

/// One `Where` call: a SQL fragment and the arguments for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// SQL fragment with `?` placeholders.
    pub fragment: String,
    /// Arguments, one per placeholder, in order.
    pub args: Vec<Value>,
}

/// Conjunction of clauses, combined with AND in insertion order.
///
/// Argument values never enter the SQL text; they stay in a separate list
/// aligned with the placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Create an empty predicate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause.
    pub fn and(&mut self, fragment: impl Into<String>, args: Vec<Value>) {
        self.clauses.push(Clause {
            fragment: fragment.into(),
            args,
        });
    }

    /// Check if no clause was added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clauses in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Render to `(sql, args)`, or `None` when empty.
    ///
    /// A lone clause is emitted verbatim; with several, each is parenthesized
    /// so an `OR` inside one fragment cannot leak into its neighbours.
    pub fn render(&self) -> Result<Option<(String, Vec<Value>)>> {
        if self.clauses.is_empty() {
            return Ok(None);
        }

        let wrap = self.clauses.len() > 1;
        let mut parts = Vec::with_capacity(self.clauses.len());
        let mut args = Vec::new();

        for clause in &self.clauses {
            let fragment = clause.fragment.trim();
            if fragment.is_empty() {
                return Err(Error::query("empty where clause"));
            }
            let mut expected = 0;
            let end = for_each_placeholder(fragment, |_| expected += 1);
            let fragment = match end {
                ScanEnd::BlockComment => {
                    return Err(Error::query(format!(
                        "where clause `{fragment}` has an unterminated comment"
                    )))
                }
                // A trailing line comment would swallow whatever follows.
                ScanEnd::LineComment => format!("{fragment}\n"),
                ScanEnd::Code | ScanEnd::Quoted => fragment.to_string(),
            };
            if expected != clause.args.len() {
                return Err(Error::query(format!(
                    "where clause `{fragment}` has {expected} placeholder(s) but {} argument(s)",
                    clause.args.len()
                )));
            }
            parts.push(if wrap { format!("({fragment})") } else { fragment });
            args.extend(clause.args.iter().cloned());
        }

        Ok(Some((parts.join(" AND "), args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn test_count_placeholders_skips_literals() {
        assert_eq!(count_placeholders("id = ?"), 1);
        assert_eq!(count_placeholders("age BETWEEN ? AND ?"), 2);
        assert_eq!(count_placeholders("name = '?' AND age = ?"), 1);
        assert_eq!(count_placeholders("note = 'it''s ?' OR x = ?"), 1);
        assert_eq!(count_placeholders("\"we?ird\" = ?"), 1);
        assert_eq!(count_placeholders("1=1"), 0);
    }

    #[test]
    fn test_count_placeholders_skips_comments() {
        assert_eq!(count_placeholders("id = ? /* why? */"), 1);
        assert_eq!(count_placeholders("id = ? -- or ?\nAND age = ?"), 2);
        assert_eq!(count_placeholders("a = 1 - ? AND b = ?/2"), 2);
        assert_eq!(count_placeholders("note = '-- ?' AND x = ?"), 1);
    }

    #[test]
    fn test_trailing_line_comment_is_closed() {
        let mut p = Predicate::new();
        p.and("age > ? -- adults?", args![18]);
        p.and("name = ?", args!["a"]);

        let (sql, args) = p.render().unwrap().unwrap();
        assert_eq!(sql, "(age > ? -- adults?\n) AND (name = ?)");
        assert_eq!(args.len(), 2);

        let mut p = Predicate::new();
        p.and("id = ? /* open", args![1]);
        assert!(p.render().unwrap_err().to_string().contains("unterminated comment"));
    }

    #[test]
    fn test_render_single_clause() {
        let mut p = Predicate::new();
        p.and("id = ?", args![7]);

        let (sql, args) = p.render().unwrap().unwrap();
        assert_eq!(sql, "id = ?");
        assert_eq!(args, vec![Value::Int(7)]);
    }

    #[test]
    fn test_render_conjunction_in_call_order() {
        let mut p = Predicate::new();
        p.and("age > ?", args![18]);
        p.and("name = ? OR name = ?", args!["a", "b"]);
        p.and("active = ?", args![true]);

        let (sql, args) = p.render().unwrap().unwrap();
        assert_eq!(sql, "(age > ?) AND (name = ? OR name = ?) AND (active = ?)");
        assert_eq!(count_placeholders(&sql), args.len());
        assert_eq!(
            args,
            vec![
                Value::Int(18),
                Value::Text("a".into()),
                Value::Text("b".into()),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_values_never_interpolated() {
        let mut p = Predicate::new();
        p.and("name = ?", args!["x'; DROP TABLE users; --"]);

        let (sql, args) = p.render().unwrap().unwrap();
        assert_eq!(sql, "name = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_placeholder_mismatch() {
        let mut p = Predicate::new();
        p.and("age BETWEEN ? AND ?", args![1]);
        let err = p.render().unwrap_err();
        assert!(err.to_string().contains("2 placeholder(s) but 1 argument(s)"));
    }

    #[test]
    fn test_empty_predicate() {
        assert!(Predicate::new().render().unwrap().is_none());

        let mut p = Predicate::new();
        p.and("   ", Vec::new());
        assert!(p.render().is_err());
    }
}
