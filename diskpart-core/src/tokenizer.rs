//! Command line splitting.

/// Tokens beyond this count are dropped.
pub const MAX_TOKENS: usize = 32;

/// Split one input line into tokens.
///
/// Blank lines and lines starting with `#` yield nothing. Whitespace separates tokens
/// except inside `"..."`, which may start anywhere in a token and is taken literally up to
/// the next `"` or the end of the line. The quote characters themselves are dropped.
pub fn tokenize(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }
        if tokens.len() == MAX_TOKENS {
            log::debug!("line has more than {} tokens; ignoring the rest", MAX_TOKENS);
            break;
        }

        let mut token = String::new();
        let mut quoted = false;
        while let Some(&c) = chars.peek() {
            if c == '"' {
                quoted = !quoted;
            } else if c.is_whitespace() && !quoted {
                break;
            } else {
                token.push(c);
            }
            chars.next();
        }
        tokens.push(token);
    }
    tokens
}
