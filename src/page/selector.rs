//! Compound element selectors.
//!
//! Only the subset the list view needs is supported: an optional tag, an
//! optional `#id`, any number of `.class` tests, and attribute tests of the
//! form `[name]`, `[name="value"]`, and `[name*="value"]`. Combinators are
//! not supported.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing a selector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector was blank.
    #[error("selector is empty")]
    Empty,

    /// A character that cannot start or continue a selector part.
    #[error("unexpected character {found:?} in selector {selector:?}")]
    UnexpectedCharacter {
        /// Offending character.
        found: char,
        /// Selector being parsed.
        selector: String,
    },

    /// A `.`, `#`, or `[` with no name after it.
    #[error("missing name in selector {selector:?}")]
    MissingName {
        /// Selector being parsed.
        selector: String,
    },

    /// An attribute test was not closed.
    #[error("unterminated attribute test in selector {selector:?}")]
    UnterminatedAttribute {
        /// Selector being parsed.
        selector: String,
    },
}

/// One attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeTest {
    /// `[name]`
    Present(String),
    /// `[name="value"]`
    Equals(String, String),
    /// `[name*="value"]`
    Contains(String, String),
}

impl AttributeTest {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Present(name) | Self::Equals(name, _) | Self::Contains(name, _) => name,
        }
    }

    pub(crate) fn accepts(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Present(_), found) => found.is_some(),
            (Self::Equals(_, expected), Some(found)) => found == expected,
            (Self::Contains(_, needle), Some(found)) => found.contains(needle.as_str()),
            (_, None) => false,
        }
    }
}

/// A parsed compound selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeTest>,
}

impl Selector {
    /// Parses a compound selector such as `a.Link--primary[href*="/pull/"]`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse()
    }

    /// Selector matching elements that carry every one of `classes`.
    #[must_use]
    pub fn with_classes(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|class| (*class).to_owned()).collect(),
            ..Self::default()
        }
    }

    /// Restricts the selector to elements named `tag`.
    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_ascii_lowercase());
        self
    }

    /// Adds an attribute test.
    #[must_use]
    pub fn attribute(mut self, test: AttributeTest) -> Self {
        self.attributes.push(test);
        self
    }

    /// Tag name required by the selector, if any.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// `id` required by the selector, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Classes required by the selector.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Attribute tests required by the selector.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeTest] {
        &self.attributes
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            formatter.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(formatter, "#{id}")?;
        }
        for class in &self.classes {
            write!(formatter, ".{class}")?;
        }
        for test in &self.attributes {
            match test {
                AttributeTest::Present(name) => write!(formatter, "[{name}]")?,
                AttributeTest::Equals(name, value) => write!(formatter, "[{name}=\"{value}\"]")?,
                AttributeTest::Contains(name, value) => {
                    write!(formatter, "[{name}*=\"{value}\"]")?;
                }
            }
        }
        Ok(())
    }
}

const fn is_name_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '-' | '_')
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.trim().chars().peekable(),
        }
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::UnexpectedCharacter {
            found,
            selector: self.input.to_owned(),
        }
    }

    fn parse(mut self) -> Result<Selector, SelectorError> {
        if self.input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut selector = Selector::default();
        let tag = self.name();
        if !tag.is_empty() {
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some(marker) = self.chars.next() {
            match marker {
                '.' => {
                    let class = self.required_name()?;
                    selector.classes.push(class);
                }
                '#' => {
                    let id = self.required_name()?;
                    selector.id = Some(id);
                }
                '[' => {
                    let test = self.attribute_test()?;
                    selector.attributes.push(test);
                }
                other => return Err(self.unexpected(other)),
            }
        }
        Ok(selector)
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(&character) = self.chars.peek() {
            if !is_name_char(character) {
                break;
            }
            name.push(character);
            self.chars.next();
        }
        name
    }

    fn required_name(&mut self) -> Result<String, SelectorError> {
        let name = self.name();
        if name.is_empty() {
            return Err(SelectorError::MissingName {
                selector: self.input.to_owned(),
            });
        }
        Ok(name)
    }

    fn attribute_test(&mut self) -> Result<AttributeTest, SelectorError> {
        let name = self.required_name()?;
        let input = self.input;
        let unterminated = || SelectorError::UnterminatedAttribute {
            selector: input.to_owned(),
        };

        match self.chars.next() {
            Some(']') => Ok(AttributeTest::Present(name)),
            Some('=') => {
                let value = self.quoted_value()?;
                self.expect_close()?;
                Ok(AttributeTest::Equals(name, value))
            }
            Some('*') => {
                if self.chars.next() != Some('=') {
                    return Err(unterminated());
                }
                let value = self.quoted_value()?;
                self.expect_close()?;
                Ok(AttributeTest::Contains(name, value))
            }
            Some(other) => Err(self.unexpected(other)),
            None => Err(unterminated()),
        }
    }

    fn quoted_value(&mut self) -> Result<String, SelectorError> {
        let unterminated = SelectorError::UnterminatedAttribute {
            selector: self.input.to_owned(),
        };
        let Some(quote @ ('"' | '\'')) = self.chars.next() else {
            return Err(unterminated);
        };

        let mut value = String::new();
        for character in self.chars.by_ref() {
            if character == quote {
                return Ok(value);
            }
            value.push(character);
        }
        Err(unterminated)
    }

    fn expect_close(&mut self) -> Result<(), SelectorError> {
        match self.chars.next() {
            Some(']') => Ok(()),
            Some(other) => Err(self.unexpected(other)),
            None => Err(SelectorError::UnterminatedAttribute {
                selector: self.input.to_owned(),
            }),
        }
    }
}
