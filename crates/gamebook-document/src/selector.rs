//! Structural selectors: a small CSS subset.
//!
//! Supported: type and `*`, `.class`, `#id`, attribute tests (`[a]`, `[a=v]`,
//! `[a~=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`), `:first-child`, `:last-child`,
//! a trailing `:first` that keeps only the first match, descendant and `>`
//! combinators, and `,` groups.

use thiserror::Error;

use crate::document::{Document, NodeId};

/// Why a selector string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// Nothing to parse.
    #[error("empty selector")]
    Empty,
    /// A character that does not fit the grammar.
    #[error("unexpected {found:?} at offset {position}")]
    Unexpected {
        /// The offending character.
        found: char,
        /// Character offset.
        position: usize,
    },
    /// The input stopped in the middle of a construct.
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    /// A pseudo-class outside the supported set.
    #[error("unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOperator {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTest {
    name: String,
    expected: Option<(AttributeOperator, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeTest>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Each compound with the combinator linking it to the previous one.
    parts: Vec<(Combinator, Compound)>,
    first_only: bool,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Complex>,
}

impl Selector {
    /// Parses a selector list.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] describing the first syntax problem.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser {
            chars: source.chars().collect(),
            position: 0,
        };
        parser.skip_whitespace();
        if parser.at_end() {
            return Err(SelectorError::Empty);
        }
        let mut groups = vec![parser.complex()?];
        while parser.eat(',') {
            parser.skip_whitespace();
            groups.push(parser.complex()?);
        }
        parser.skip_whitespace();
        if let Some(found) = parser.peek() {
            return Err(SelectorError::Unexpected {
                found,
                position: parser.position,
            });
        }
        Ok(Self { groups })
    }

    /// Whether the element matches any group of the selector.
    #[must_use]
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.groups
            .iter()
            .any(|group| matches_at(doc, node, &group.parts, group.parts.len() - 1))
    }
}

impl Document {
    /// Elements strictly below `scope` matching `selector`, in document order.
    #[must_use]
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.select_among(self.descendant_elements(scope), selector)
    }

    /// Like [`Document::select`], but `scope` itself may match.
    #[must_use]
    pub fn select_inclusive(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.select_among(self.subtree_elements(scope), selector)
    }

    fn select_among(&self, candidates: Vec<NodeId>, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        for group in &selector.groups {
            let mut matched = candidates
                .iter()
                .copied()
                .filter(|node| matches_at(self, *node, &group.parts, group.parts.len() - 1));
            if group.first_only {
                found.extend(matched.next());
            } else {
                found.extend(matched);
            }
        }
        if selector.groups.len() > 1 {
            self.sort_unique(&mut found);
        }
        found
    }
}

fn matches_at(doc: &Document, node: NodeId, parts: &[(Combinator, Compound)], index: usize) -> bool {
    let (combinator, compound) = &parts[index];
    if !compound.matches(doc, node) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|parent| doc.is_element(parent) && matches_at(doc, parent, parts, index - 1)),
        Combinator::Descendant => doc
            .ancestors(node)
            .any(|ancestor| doc.is_element(ancestor) && matches_at(doc, ancestor, parts, index - 1)),
    }
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };
        if self.tag.as_ref().is_some_and(|want| !want.eq_ignore_ascii_case(tag)) {
            return false;
        }
        if !self.ids.iter().all(|id| doc.attribute(node, "id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|class| doc.has_class(node, class)) {
            return false;
        }
        if !self.attributes.iter().all(|test| test.matches(doc, node)) {
            return false;
        }
        self.pseudos.iter().all(|pseudo| {
            let siblings = doc
                .parent(node)
                .map(|parent| doc.element_children(parent))
                .unwrap_or_default();
            match pseudo {
                Pseudo::FirstChild => siblings.first() == Some(&node),
                Pseudo::LastChild => siblings.last() == Some(&node),
            }
        })
    }
}

impl AttributeTest {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(actual) = doc.attribute(node, &self.name) else {
            return false;
        };
        let Some((operator, expected)) = &self.expected else {
            return true;
        };
        match operator {
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
            AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
            AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
            AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected.as_str()),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
        self.position > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                found,
                position: self.position,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut first_only = false;
        let mut parts = vec![(Combinator::Descendant, self.compound(&mut first_only)?)];
        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.position += 1;
                    self.skip_whitespace();
                    parts.push((Combinator::Child, self.compound(&mut first_only)?));
                }
                Some(_) if had_space => {
                    parts.push((Combinator::Descendant, self.compound(&mut first_only)?));
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Complex { parts, first_only })
    }

    fn compound(&mut self, first_only: &mut bool) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut parsed_any = false;
        if self.eat('*') {
            parsed_any = true;
        } else if self.peek().is_some_and(is_identifier_start) {
            compound.tag = Some(self.identifier()?);
            parsed_any = true;
        }
        loop {
            match self.peek() {
                Some('.') => {
                    self.position += 1;
                    compound.classes.push(self.identifier()?);
                }
                Some('#') => {
                    self.position += 1;
                    compound.ids.push(self.identifier()?);
                }
                Some('[') => {
                    self.position += 1;
                    compound.attributes.push(self.attribute_test()?);
                }
                Some(':') => {
                    self.position += 1;
                    let name = self.identifier()?;
                    match name.as_str() {
                        "first-child" => compound.pseudos.push(Pseudo::FirstChild),
                        "last-child" => compound.pseudos.push(Pseudo::LastChild),
                        "first" => *first_only = true,
                        _ => return Err(SelectorError::UnsupportedPseudo(name)),
                    }
                }
                _ => break,
            }
            parsed_any = true;
        }
        if parsed_any {
            Ok(compound)
        } else {
            Err(self.unexpected())
        }
    }

    fn identifier(&mut self) -> Result<String, SelectorError> {
        if !self.peek().is_some_and(is_identifier_start) {
            return Err(self.unexpected());
        }
        let start = self.position;
        while self.peek().is_some_and(is_identifier_char) {
            self.position += 1;
        }
        Ok(self.chars[start..self.position].iter().collect())
    }

    fn attribute_test(&mut self) -> Result<AttributeTest, SelectorError> {
        self.skip_whitespace();
        let name = self.identifier()?;
        self.skip_whitespace();
        if self.eat(']') {
            return Ok(AttributeTest {
                name,
                expected: None,
            });
        }
        let operator = match self.peek() {
            Some('=') => AttributeOperator::Equals,
            Some('~') => AttributeOperator::Includes,
            Some('^') => AttributeOperator::Prefix,
            Some('$') => AttributeOperator::Suffix,
            Some('*') => AttributeOperator::Substring,
            _ => return Err(self.unexpected()),
        };
        self.position += 1;
        if operator != AttributeOperator::Equals && !self.eat('=') {
            return Err(self.unexpected());
        }
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.position += 1;
                let start = self.position;
                while self.peek().is_some_and(|c| c != quote) {
                    self.position += 1;
                }
                let value: String = self.chars[start..self.position].iter().collect();
                if !self.eat(quote) {
                    return Err(SelectorError::UnexpectedEnd);
                }
                value
            }
            Some(_) => {
                let start = self.position;
                while self.peek().is_some_and(|c| c != ']' && !c.is_whitespace()) {
                    self.position += 1;
                }
                self.chars[start..self.position].iter().collect()
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.unexpected());
        }
        Ok(AttributeTest {
            name,
            expected: Some((operator, value)),
        })
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
