//! Argument view over a tokenized command line.

use crate::errors::CommandError;

/// `argv[0]` is the verb; the rest are positional words or `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgView {
    tokens: Vec<String>,
}

fn is_pair(token: &str) -> bool {
    matches!(token.find('='), Some(i) if i > 0)
}

impl ArgView {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn verb(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or("")
    }

    /// Everything after the verb.
    pub fn rest(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    /// Value of the first `key=value` token whose key matches case-insensitively.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.rest().iter().find_map(|tok| {
            let prefix = tok.get(..key.len())?;
            let value = tok.get(key.len()..)?.strip_prefix('=')?;
            prefix.eq_ignore_ascii_case(key).then_some(value)
        })
    }

    /// `n`-th (0-based) word after the verb that is not a `key=value` pair.
    pub fn positional(&self, n: usize) -> Option<&str> {
        self.rest()
            .iter()
            .filter(|t| !is_pair(t))
            .nth(n)
            .map(String::as_str)
    }

    /// Whether a bare word such as `all` or `readonly` appears after the verb.
    pub fn has_flag(&self, word: &str) -> bool {
        self.rest()
            .iter()
            .filter(|t| !is_pair(t))
            .any(|t| t.eq_ignore_ascii_case(word))
    }

    /// Required string argument.
    pub fn require(&self, key: &'static str) -> Result<&str, CommandError> {
        match self.lookup(key) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(CommandError::MissingArgument(key)),
        }
    }

    /// Optional size argument in MiB; must be a positive integer when present.
    pub fn mib(&self, key: &'static str) -> Result<Option<u64>, CommandError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(raw) => match raw.parse::<u64>() {
                Ok(v) if v > 0 => Ok(Some(v)),
                _ => Err(CommandError::InvalidArgument {
                    key,
                    value: raw.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn view(line: &str) -> ArgView {
        ArgView::new(tokenize(line))
    }

    #[test]
    fn lookup_is_case_insensitive_and_first_match_wins() {
        let args = view("create partition primary SIZE=100 size=200");
        assert_eq!(args.lookup("size"), Some("100"));
        assert_eq!(args.lookup("offset"), None);
    }

    #[test]
    fn lookup_requires_equals_right_after_key() {
        let args = view("format fslabel=x fs=ext4");
        assert_eq!(args.lookup("fs"), Some("ext4"));
    }

    #[test]
    fn lookup_reads_quoted_values() {
        let args = view(r#"format fs=ext4 label="My Disk""#);
        assert_eq!(args.lookup("fs"), Some("ext4"));
        assert_eq!(args.lookup("label"), Some("My Disk"));
    }

    #[test]
    fn positional_skips_pairs() {
        let args = view("create size=10 partition efi");
        assert_eq!(args.verb(), "create");
        assert_eq!(args.positional(0), Some("partition"));
        assert_eq!(args.positional(1), Some("efi"));
        assert_eq!(args.positional(2), None);
    }

    #[test]
    fn flags_match_any_case() {
        let args = view("clean ALL");
        assert!(args.has_flag("all"));
        assert!(!args.has_flag("quick"));
    }

    #[test]
    fn mib_rejects_malformed_values() {
        assert_eq!(view("shrink size=512").mib("size").unwrap(), Some(512));
        assert_eq!(view("shrink").mib("size").unwrap(), None);
        assert!(matches!(
            view("shrink size=ten").mib("size"),
            Err(CommandError::InvalidArgument { key: "size", .. })
        ));
        assert!(view("shrink size=0").mib("size").is_err());
    }

    #[test]
    fn require_rejects_empty_values() {
        assert!(matches!(
            view("create vdisk file=").require("file"),
            Err(CommandError::MissingArgument("file"))
        ));
    }
}
