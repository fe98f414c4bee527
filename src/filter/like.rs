//! LIKE-pattern helpers shared by the backends that cannot hand patterns to
//! PostgreSQL. `%` matches any run, `_` one character, `\` escapes the next.

/// Escape user text so it matches literally inside a LIKE pattern.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Any,
    One,
    Lit(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => tokens.push(Token::Any),
            '_' => tokens.push(Token::One),
            '\\' => tokens.push(Token::Lit(chars.next().unwrap_or('\\'))),
            other => tokens.push(Token::Lit(other)),
        }
    }
    tokens
}

/// Case-insensitive LIKE match (ILIKE semantics).
pub fn ilike_matches(pattern: &str, text: &str) -> bool {
    let tokens: Vec<Token> = tokenize(pattern)
        .into_iter()
        .map(|t| match t {
            Token::Lit(c) => Token::Lit(fold(c)),
            other => other,
        })
        .collect();
    let text: Vec<char> = text.chars().map(fold).collect();

    // Greedy wildcard matching with single backtrack point
    let (mut t, mut s) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while s < text.len() {
        match tokens.get(t) {
            Some(Token::One) => {
                t += 1;
                s += 1;
            }
            Some(Token::Lit(c)) if *c == text[s] => {
                t += 1;
                s += 1;
            }
            Some(Token::Any) => {
                star = Some((t, s));
                t += 1;
            }
            _ => match star {
                Some((star_t, star_s)) => {
                    t = star_t + 1;
                    s = star_s + 1;
                    star = Some((star_t, star_s + 1));
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|tok| *tok == Token::Any)
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Translate a LIKE pattern into an anchored regular expression.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for token in tokenize(pattern) {
        match token {
            Token::Any => out.push_str(".*"),
            Token::One => out.push('.'),
            Token::Lit(c) => {
                if "\\.^$|?*+()[]{}".contains(c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_search_is_case_insensitive() {
        let pattern = format!("%{}%", escape_like("tech"));
        assert!(ilike_matches(&pattern, "PT Teknologi TechCorp"));
        assert!(!ilike_matches(&pattern, "Bank Nusantara"));
    }

    #[test]
    fn wildcards_in_search_text_are_literal() {
        let pattern = format!("%{}%", escape_like("50%"));
        assert!(ilike_matches(&pattern, "diskon 50% hari ini"));
        assert!(!ilike_matches(&pattern, "diskon 500 hari ini"));

        let underscore = format!("%{}%", escape_like("a_b"));
        assert!(ilike_matches(&underscore, "xa_by"));
        assert!(!ilike_matches(&underscore, "xacby"));
    }

    #[test]
    fn empty_search_matches_everything() {
        assert!(ilike_matches("%%", ""));
        assert!(ilike_matches("%%", "anything"));
    }

    #[test]
    fn regex_translation_is_anchored_and_escaped() {
        assert_eq!(like_to_regex("%a.b%"), "^.*a\\.b.*$");
        assert_eq!(like_to_regex(&format!("%{}%", escape_like("50%"))), "^.*50%.*$");
    }
}
