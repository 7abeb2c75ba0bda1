//! Heuristic flashcard parsing.
//!
//! Two strategies segment ordered lines into term/definition cards:
//!
//! - [`parse_flat`] for slide text: `Term - Definition` lines, with following
//!   unmatched lines continuing the previous definition.
//! - [`parse_nested`] for notes text: `∙ ` bulleted main terms whose indented
//!   `o Sub - Def` lines become nested sub-cards.
//!
//! Each line is classified by the first [`LineRule`] that matches it; there is
//! no backtracking over alternative splits.

use crate::types::{Definition, FlashCard};
use regex::Regex;
use std::sync::LazyLock;

/// `Term - Definition`, split at the first hyphen.
static TERM_DEFINITION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*-\s*(.+)$").unwrap());

/// `o Sub-term - Sub-definition`.
static SUB_TERM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^o\s+(.*?)\s+-\s+(.*)").unwrap());

/// Bullet marker that opens a main term in notes text.
const MAIN_TERM_MARKER: &str = "∙ ";

/// Separator used to split a main term that carries its own definition.
const HEADER_SEPARATOR: &str = " - ";

/// Rules of the flat strategy, in precedence order.
pub const FLAT_RULES: &[LineRule] = &[LineRule::TermDefinition];

/// Rules for top-level notes lines, in precedence order.
pub const NESTED_RULES: &[LineRule] = &[LineRule::MainTerm];

/// Rules for lines buffered under a main term, in precedence order.
pub const SUB_RULES: &[LineRule] = &[LineRule::SubTerm];

/// A line classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRule {
    /// `Term - Definition` anywhere in the line.
    TermDefinition,
    /// `∙ Main term` bullet line.
    MainTerm,
    /// `o Sub - Def` indented bullet line.
    SubTerm,
}

/// The pieces captured by a matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub rule: LineRule,
    pub term: String,
    /// Empty for [`LineRule::MainTerm`].
    pub definition: String,
}

impl LineRule {
    /// Apply this rule to an already trimmed line.
    pub fn apply(self, line: &str) -> Option<LineMatch> {
        match self {
            LineRule::TermDefinition => captures(self, &TERM_DEFINITION_REGEX, line),
            LineRule::SubTerm => captures(self, &SUB_TERM_REGEX, line),
            LineRule::MainTerm => line.strip_prefix(MAIN_TERM_MARKER).map(|rest| LineMatch {
                rule: self,
                term: rest.to_string(),
                definition: String::new(),
            }),
        }
    }
}

fn captures(rule: LineRule, regex: &Regex, line: &str) -> Option<LineMatch> {
    let caps = regex.captures(line)?;
    Some(LineMatch {
        rule,
        term: caps[1].trim().to_string(),
        definition: caps[2].trim().to_string(),
    })
}

/// Classify a line with the first matching rule of `rules`.
pub fn classify(line: &str, rules: &[LineRule]) -> Option<LineMatch> {
    rules.iter().find_map(|rule| rule.apply(line))
}

/// Trim lines and drop blank ones.
fn clean_lines<S: AsRef<str>>(lines: &[S]) -> impl Iterator<Item = &str> {
    lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
}

/// Parse slide lines into flat cards.
///
/// Lines before the first `Term - Definition` line are dropped; later
/// unmatched lines are appended to the open card's definition on a new line.
pub fn parse_flat<S: AsRef<str>>(lines: &[S]) -> Vec<FlashCard> {
    let mut cards = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in clean_lines(lines) {
        match classify(line, FLAT_RULES) {
            Some(found) => {
                if let Some((term, definition)) = current.take() {
                    cards.push(FlashCard::new(term, definition));
                }
                current = Some((found.term, found.definition));
            }
            None => {
                if let Some((_, definition)) = current.as_mut() {
                    definition.push('\n');
                    definition.push_str(line);
                }
            }
        }
    }

    if let Some((term, definition)) = current {
        cards.push(FlashCard::new(term, definition));
    }

    cards
}

/// Parse notes lines into main terms with nested sub-cards.
///
/// A main term with no sub-cards whose own text contains `" - "` is split
/// into a flat card instead.
pub fn parse_nested<S: AsRef<str>>(lines: &[S]) -> Vec<FlashCard> {
    let mut cards = Vec::new();
    let mut main_term: Option<String> = None;
    let mut sub_lines: Vec<&str> = Vec::new();

    for line in clean_lines(lines) {
        match classify(line, NESTED_RULES) {
            Some(found) => {
                if let Some(term) = main_term.take() {
                    cards.push(FlashCard::nested(term, resolve_sub_lines(&sub_lines)));
                }
                main_term = Some(found.term);
                sub_lines.clear();
            }
            None => sub_lines.push(line),
        }
    }

    if let Some(term) = main_term {
        cards.push(FlashCard::nested(term, resolve_sub_lines(&sub_lines)));
    }

    cards.into_iter().map(flatten_header_card).collect()
}

/// Resolve the lines buffered under a main term into sub-cards.
fn resolve_sub_lines(lines: &[&str]) -> Vec<FlashCard> {
    let mut cards = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in lines {
        match classify(line, SUB_RULES) {
            Some(found) => {
                if let Some((term, definition)) = current.take() {
                    cards.push(FlashCard::new(term, definition.trim()));
                }
                current = Some((found.term, found.definition));
            }
            None => {
                if let Some((_, definition)) = current.as_mut() {
                    definition.push(' ');
                    definition.push_str(line);
                }
            }
        }
    }

    if let Some((term, definition)) = current {
        cards.push(FlashCard::new(term, definition.trim()));
    }

    cards
}

/// Split `Term - Definition` main terms that collected no sub-cards.
fn flatten_header_card(card: FlashCard) -> FlashCard {
    if !matches!(&card.definition, Definition::Nested(subs) if subs.is_empty()) {
        return card;
    }

    let split = card
        .term
        .split_once(HEADER_SEPARATOR)
        .map(|(term, definition)| (term.trim().to_string(), definition.trim().to_string()));

    match split {
        Some((term, definition)) => FlashCard::new(term, definition),
        None => card,
    }
}
