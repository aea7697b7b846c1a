//! HTML lexer (tokenizer).
//!
//! This module provides low-level tokenization of HTML source text. It
//! recognizes the token shapes the tree builder needs: start tags with their
//! ordered attributes, end tags, comments, doctypes, and raw text runs.
//!
//! # Tokenization Rules
//!
//! - Tag and attribute names are ASCII-lowercased during lexing.
//! - Text runs are carried *raw*: character entities stay exactly as written
//!   so untouched regions of a document round-trip verbatim.
//! - Attribute values may be double-quoted, single-quoted, or unquoted;
//!   valueless (boolean) attributes are kept as `None`.
//! - Raw-text elements (`script`, `style`) are not special here; the tree
//!   builder calls [`raw_text`] to swallow their content up to the matching
//!   end tag.
//!
//! A `<` that does not open well-formed markup makes [`token`] fail at that
//! position; whether that is a hard error or a literal `<` character is the
//! tree builder's decision (strict vs. lenient mode).

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_until, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt},
    sequence::{delimited, preceded},
};

/// A single HTML attribute: lowercased name plus optional raw value.
///
/// The value is `None` for boolean attributes (`<input disabled>`); otherwise
/// it holds the value text with entities left undecoded.
pub type Attribute = (String, Option<String>);

/// Token types recognized by the HTML lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Doctype declaration; holds the raw text between `<!` and `>`
    /// (e.g., `DOCTYPE html`).
    Doctype(&'a str),

    /// Comment; holds the raw text between `<!--` and `-->`.
    Comment(&'a str),

    /// Start tag with its name, attributes in source order, and whether it
    /// was written self-closing (`<br/>`).
    StartTag {
        /// Lowercased tag name
        name: String,
        /// Attributes in the order they appear in the source
        attrs: Vec<Attribute>,
        /// Whether the tag ended in `/>`
        self_closing: bool,
    },

    /// End tag (lowercased name).
    EndTag(String),

    /// Raw text run up to the next `<`. Entities are not decoded.
    Text(&'a str),
}

/// Characters allowed in a tag or attribute name.
///
/// Deliberately loose: anything that is not whitespace, a delimiter, or a
/// quote counts as a name character, which matches how permissive HTML
/// parsers scan names.
fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '=' | '"' | '\'')
}

/// Parse a tag or attribute name, lowercasing it.
fn name(input: &str) -> IResult<&str, String> {
    map(take_while1(is_name_char), |s: &str| s.to_ascii_lowercase())(input)
}

/// Parse a tag name: like [`name`] but the first character must be a letter,
/// so `<3 kittens` stays a text run instead of becoming a tag.
fn tag_name(input: &str) -> IResult<&str, String> {
    if !input.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Alpha)));
    }
    name(input)
}

/// Parse an attribute value: double-quoted, single-quoted, or unquoted.
///
/// Quoted values may be empty; unquoted values run until whitespace or `>`.
/// The value is returned raw (entities undecoded).
fn attribute_value(input: &str) -> IResult<&str, String> {
    alt((
        map(delimited(char('"'), take_till(|c| c == '"'), char('"')), str::to_string),
        map(delimited(char('\''), take_till(|c| c == '\''), char('\'')), str::to_string),
        map(take_till1(|c: char| c.is_whitespace() || c == '>'), str::to_string),
    ))(input)
}

/// Parse one attribute: `name`, `name=value`, `name="value"` or `name='value'`.
fn attribute(input: &str) -> IResult<&str, Attribute> {
    let (input, attr_name) = name(input)?;
    let (input, value) =
        opt(preceded(delimited(multispace0, char('='), multispace0), attribute_value))(input)?;
    Ok((input, (attr_name, value)))
}

/// Parse a start tag: `<name attr="v" ...>` or `<name ... />`.
fn start_tag(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('<')(input)?;
    let (input, element_name) = tag_name(input)?;

    let mut attrs = Vec::new();
    let mut remaining = input;
    loop {
        let (rest, _) = multispace0(remaining)?;
        if let Ok((rest, attr)) = attribute(rest) {
            attrs.push(attr);
            remaining = rest;
        } else {
            remaining = rest;
            break;
        }
    }

    let (remaining, slash) = opt(char('/'))(remaining)?;
    let (remaining, _) = char('>')(remaining)?;

    Ok((
        remaining,
        Token::StartTag { name: element_name, attrs, self_closing: slash.is_some() },
    ))
}

/// Parse an end tag: `</name>` (whitespace tolerated before `>`).
fn end_tag(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = tag("</")(input)?;
    let (input, element_name) = tag_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('>')(input)?;
    Ok((input, Token::EndTag(element_name)))
}

/// Parse a comment: `<!-- ... -->`. The content is kept raw.
fn comment(input: &str) -> IResult<&str, Token<'_>> {
    map(delimited(tag("<!--"), take_until("-->"), tag("-->")), Token::Comment)(input)
}

/// Parse a doctype (or any other `<!...>` declaration that is not a comment).
///
/// The raw declaration text is preserved so `<!DOCTYPE html>` keeps its
/// original casing when re-emitted.
fn doctype(input: &str) -> IResult<&str, Token<'_>> {
    map(delimited(tag("<!"), take_till(|c| c == '>'), char('>')), Token::Doctype)(input)
}

/// Parse a raw text run: everything up to the next `<`.
fn text(input: &str) -> IResult<&str, Token<'_>> {
    map(take_till1(|c| c == '<'), Token::Text)(input)
}

/// Parse the next token from the input.
///
/// Markup alternatives are tried first (comment before doctype, since both
/// begin with `<!`), then a raw text run. Fails on empty input and on a `<`
/// that opens no recognizable markup.
pub fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((comment, doctype, end_tag, start_tag, text))(input)
}

/// Split off raw-text content for an element like `script` or `style`.
///
/// Scans (case-insensitively) for the first `</element` that is followed by
/// whitespace, `/` or `>`, which is how browsers terminate raw-text content.
/// Returns `(content, rest)` where `rest` begins at the closing `</`. If no
/// closing tag exists, the whole input is content.
pub fn raw_text<'a>(input: &'a str, element: &str) -> (&'a str, &'a str) {
    let needle = format!("</{}", element.to_ascii_lowercase());
    let lower = input.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(pos) = lower[search_from..].find(&needle) {
        let at = search_from + pos;
        let after = at + needle.len();
        match lower[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {
                return (&input[..at], &input[at..]);
            }
            None => return (&input[..at], &input[at..]),
            _ => search_from = after,
        }
    }
    (input, "")
}
