use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

const BUILTIN_RULES: &str = include_str!("../data/name_rules.json");

#[derive(Debug, Deserialize)]
struct RulesFile {
    articles: Vec<String>,
    words: HashMap<String, String>,
    #[serde(default)]
    names: HashMap<String, String>,
}

#[derive(Debug)]
pub enum RulesError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for RulesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulesError::Io(err) => write!(f, "io error: {}", err),
            RulesError::Json(err) => write!(f, "name rules error: {}", err),
        }
    }
}

impl std::error::Error for RulesError {}

impl From<std::io::Error> for RulesError {
    fn from(err: std::io::Error) -> Self {
        RulesError::Io(err)
    }
}

impl From<serde_json::Error> for RulesError {
    fn from(err: serde_json::Error) -> Self {
        RulesError::Json(err)
    }
}

/// Capitalization rules for artist names: lowercase articles, word-level
/// exceptions and whole-name exceptions. All keys are stored lowercase.
#[derive(Clone, Debug)]
pub struct NameRules {
    articles: HashSet<String>,
    words: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl NameRules {
    /// Tables shipped in `data/name_rules.json`.
    pub fn builtin() -> Result<Self, RulesError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn from_path(path: &Path) -> Result<Self, RulesError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(text: &str) -> Result<Self, RulesError> {
        let file: RulesFile = serde_json::from_str(text)?;
        Ok(Self {
            articles: file
                .articles
                .into_iter()
                .map(|word| word.trim().to_lowercase())
                .collect(),
            words: lowercase_keys(file.words),
            names: lowercase_keys(file.names),
        })
    }

    pub fn normalise(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if let Some(head) = strip_trailing_article(trimmed) {
            let head = head.trim();
            if head.is_empty() {
                return "The".to_string();
            }
            let joined = format!("The {}", self.normalise(head));
            return match self.names.get(&joined.to_lowercase()) {
                Some(canonical) => canonical.clone(),
                None => joined,
            };
        }

        if let Some(canonical) = self.names.get(&trimmed.to_lowercase()) {
            return canonical.clone();
        }

        self.render(&parse(raw))
    }

    fn render(&self, span: &Span<'_>) -> String {
        match span {
            Span::Group {
                before,
                inner,
                after,
            } => {
                let mut out = self.render(before);
                out.push('(');
                out.push_str(&self.render(inner));
                out.push(')');
                out.push_str(&self.render(after));
                out
            }
            Span::Tokens(tokens) => tokens
                .iter()
                .map(|token| match token {
                    Token::Delimiter(text) => text.to_string(),
                    Token::Word { text, ordinal } => self.rewrite_word(text, *ordinal),
                })
                .collect(),
        }
    }

    fn rewrite_word(&self, word: &str, ordinal: usize) -> String {
        if word.is_empty() {
            return String::new();
        }
        let key = word.to_lowercase();

        if ordinal != 0 && self.articles.contains(&key) {
            return key;
        }
        if let Some(canonical) = self.words.get(&key) {
            return canonical.clone();
        }
        if is_initials(word) || is_roman_numeral(word) {
            return word.to_uppercase();
        }
        if let Some(rest) = strip_mc(word) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next() {
                let mut out = String::from("Mc");
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
                return out;
            }
        }
        if let Some(stem) = strip_possessive(word) {
            let mut out = self.rewrite_word(stem, ordinal);
            out.push_str("'s");
            return out;
        }

        let parts: Vec<&str> = word.split('\'').collect();
        if parts.len() == 2 && parts.iter().all(|part| !part.is_empty()) {
            return format!("{}'{}", capitalize(parts[0]), capitalize(parts[1]));
        }

        if word.contains('-') {
            return word
                .split('-')
                .enumerate()
                .map(|(index, part)| self.rewrite_word(part, index))
                .collect::<Vec<_>>()
                .join("-");
        }

        capitalize(word)
    }
}

fn lowercase_keys(table: HashMap<String, String>) -> HashMap<String, String> {
    table
        .into_iter()
        .map(|(key, value)| (key.trim().to_lowercase(), value))
        .collect()
}

/// Parenthesised text is split off and rewritten on its own. Every part
/// restarts its word count at zero, so the first word inside the brackets is
/// never treated as a mid-name article. Text after `)` usually opens with a
/// space, which yields an empty word at ordinal zero, so a following article
/// stays lowercase.
#[derive(Debug, PartialEq, Eq)]
enum Span<'a> {
    Tokens(Vec<Token<'a>>),
    Group {
        before: Box<Span<'a>>,
        inner: Box<Span<'a>>,
        after: Box<Span<'a>>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Delimiter(&'a str),
    Word { text: &'a str, ordinal: usize },
}

fn parse(text: &str) -> Span<'_> {
    match split_group(text) {
        Some((before, inner, after)) => Span::Group {
            before: Box::new(parse(before)),
            inner: Box::new(parse(inner)),
            after: Box::new(parse(after)),
        },
        None => Span::Tokens(tokenize(text)),
    }
}

/// First `(` and the first `)` after it.
fn split_group(text: &str) -> Option<(&str, &str, &str)> {
    let open = text.find('(')?;
    let close = open + 1 + text[open + 1..].find(')')?;
    Some((&text[..open], &text[open + 1..close], &text[close + 1..]))
}

/// Splits on whitespace runs and on single `,` `/` `;` `\`. Words and
/// delimiters alternate, starting and ending with a (possibly empty) word.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut ordinal = 0;
    let mut word_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let delimiter_end = if ch.is_whitespace() {
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_idx + next.len_utf8();
                chars.next();
            }
            end
        } else if matches!(ch, ',' | '/' | ';' | '\\') {
            idx + ch.len_utf8()
        } else {
            continue;
        };

        tokens.push(Token::Word {
            text: &text[word_start..idx],
            ordinal,
        });
        ordinal += 1;
        tokens.push(Token::Delimiter(&text[idx..delimiter_end]));
        word_start = delimiter_end;
    }

    tokens.push(Token::Word {
        text: &text[word_start..],
        ordinal,
    });
    tokens
}

fn strip_trailing_article(name: &str) -> Option<&str> {
    const SUFFIX: &str = ", the";
    let split = name.len().checked_sub(SUFFIX.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = name.split_at(split);
    if tail.eq_ignore_ascii_case(SUFFIX) {
        Some(head)
    } else {
        None
    }
}

fn strip_mc(word: &str) -> Option<&str> {
    let prefix = word.get(..2)?;
    if prefix.eq_ignore_ascii_case("mc") && word.len() > 2 {
        Some(&word[2..])
    } else {
        None
    }
}

fn strip_possessive(word: &str) -> Option<&str> {
    let split = word.len().checked_sub(2)?;
    if split == 0 || !word.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = word.split_at(split);
    if tail.eq_ignore_ascii_case("'s") {
        Some(stem)
    } else {
        None
    }
}

/// Two or more `letter.` pairs, optionally followed by one bare letter.
fn is_initials(word: &str) -> bool {
    let bytes = word.as_bytes();
    let mut pairs = 0;
    let mut idx = 0;
    while idx + 1 < bytes.len() && bytes[idx].is_ascii_alphabetic() && bytes[idx + 1] == b'.' {
        pairs += 1;
        idx += 2;
    }
    if pairs < 2 {
        return false;
    }
    match &bytes[idx..] {
        [] => true,
        [last] => last.is_ascii_alphabetic(),
        _ => false,
    }
}

fn is_roman_numeral(word: &str) -> bool {
    !word.is_empty()
        && word.chars().all(|ch| {
            matches!(
                ch.to_ascii_lowercase(),
                'i' | 'v' | 'x' | 'l' | 'c' | 'd' | 'm'
            )
        })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
