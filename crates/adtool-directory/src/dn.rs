//! Distinguished Name handling for directory entries.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use adtool_core::error::Error as CoreError;

/// Errors that can occur when parsing or building distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// The distinguished name was empty.
    #[error("distinguished name cannot be empty")]
    Empty,
    /// A component in the distinguished name was invalid.
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    /// A component was missing the attribute name to the left of the `=`.
    #[error("distinguished name component missing attribute: {0}")]
    MissingAttribute(String),
    /// A component was missing the value to the right of the `=`.
    #[error("distinguished name component missing value for attribute {0}")]
    MissingValue(String),
    /// The distinguished name contained a dangling or malformed escape sequence.
    #[error("distinguished name contains an invalid escape sequence")]
    InvalidEscape,
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::InvalidEntry(err.to_string())
    }
}

/// A single `attribute=value` pair of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    attribute: String,
    value: String,
}

impl RelativeDistinguishedName {
    /// Create a new relative distinguished name from an unescaped value.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute portion of the RDN (e.g. `CN`).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Unescaped value portion of the RDN.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn matches_attribute(&self, attribute: &str) -> bool {
        self.attribute.eq_ignore_ascii_case(attribute)
    }

    fn render(&self) -> String {
        format!("{}={}", self.attribute, escape_value(&self.value))
    }
}

/// Strongly-typed distinguished name.
///
/// DNs received from the server keep their exact spelling so they can be handed back verbatim in
/// later requests; DNs built locally are rendered with RFC 4514 escaping. Multi-valued RDNs
/// (`a=1+b=2`) are kept as a single component whose value retains the `+` part.
#[derive(Debug, Clone)]
pub struct DistinguishedName {
    raw: String,
    rdns: Vec<RelativeDistinguishedName>,
}

impl DistinguishedName {
    /// Parses a distinguished name from a string.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError`] if the distinguished name is empty or contains invalid
    /// syntax.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DistinguishedNameError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let rdns = split_unescaped(raw, ',')?
            .into_iter()
            .map(|component| parse_component(&component))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            rdns,
        })
    }

    /// Builds a child DN by prefixing `attribute=value` (value is escaped as needed).
    #[must_use]
    pub fn child(&self, attribute: &str, value: &str) -> Self {
        let rdn = RelativeDistinguishedName::new(attribute, value);
        let raw = format!("{},{}", rdn.render(), self.raw);
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Self { raw, rdns }
    }

    /// Borrows the distinguished name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the relative distinguished names in order, leaf first.
    #[must_use]
    pub fn components(&self) -> &[RelativeDistinguishedName] {
        &self.rdns
    }

    /// Looks up the value for the first attribute that matches `attribute` (case-insensitive).
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.rdns
            .iter()
            .find(|rdn| rdn.matches_attribute(attribute))
            .map(RelativeDistinguishedName::value)
    }

    /// Value of the leaf RDN when it is a `CN`.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.rdns
            .first()
            .filter(|rdn| rdn.matches_attribute("cn"))
            .map(RelativeDistinguishedName::value)
    }
}

/// DNs compare case-insensitively on attribute names and values, as directory servers do.
impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.rdns.len() == other.rdns.len()
            && self.rdns.iter().zip(&other.rdns).all(|(a, b)| {
                a.matches_attribute(&b.attribute) && a.value.eq_ignore_ascii_case(&b.value)
            })
    }
}

impl Eq for DistinguishedName {}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = DistinguishedNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DistinguishedName> for String {
    fn from(value: DistinguishedName) -> Self {
        value.raw
    }
}

/// Splits on `delimiter` outside of escape sequences; the pieces keep their escapes.
fn split_unescaped(input: &str, delimiter: char) -> Result<Vec<String>, DistinguishedNameError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escape = false;

    for ch in input.chars() {
        if escape {
            current.push(ch);
            escape = false;
            continue;
        }

        match ch {
            '\\' => {
                current.push(ch);
                escape = true;
            }
            c if c == delimiter => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }

    if escape {
        return Err(DistinguishedNameError::InvalidEscape);
    }

    parts.push(current.trim().to_string());
    if let Some(empty) = parts.iter().find(|part| part.is_empty()) {
        return Err(DistinguishedNameError::InvalidComponent(empty.clone()));
    }
    Ok(parts)
}

fn parse_component(component: &str) -> Result<RelativeDistinguishedName, DistinguishedNameError> {
    let (attribute, value) = component
        .split_once('=')
        .ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
    let attribute = attribute.trim();
    let value = value.trim_start();

    if attribute.is_empty() || attribute.contains('\\') {
        return Err(DistinguishedNameError::MissingAttribute(
            component.to_string(),
        ));
    }
    if value.is_empty() {
        return Err(DistinguishedNameError::MissingValue(attribute.to_string()));
    }

    Ok(RelativeDistinguishedName::new(attribute, unescape(value)?))
}

fn unescape(value: &str) -> Result<String, DistinguishedNameError> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let next = chars.next().ok_or(DistinguishedNameError::InvalidEscape)?;
        if next.is_ascii_hexdigit() {
            let low = chars
                .next()
                .filter(char::is_ascii_hexdigit)
                .ok_or(DistinguishedNameError::InvalidEscape)?;
            let pair = format!("{next}{low}");
            let byte =
                u8::from_str_radix(&pair, 16).map_err(|_| DistinguishedNameError::InvalidEscape)?;
            bytes.push(byte);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8(bytes).map_err(|_| DistinguishedNameError::InvalidEscape)
}

/// Escapes an attribute value for use inside a DN (RFC 4514, section 2.4).
#[must_use]
pub fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in value.chars().enumerate() {
        let needs_escape = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (idx == 0 && (ch == ' ' || ch == '#'))
            || (idx == last && ch == ' ');

        if ch == '\0' {
            escaped.push_str("\\00");
            continue;
        }
        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_server_spelling() {
        let dn = DistinguishedName::parse("CN=John Doe,CN=Users,DC=lab,DC=local").unwrap();
        assert_eq!(dn.as_str(), "CN=John Doe,CN=Users,DC=lab,DC=local");
        assert_eq!(dn.common_name(), Some("John Doe"));
        assert_eq!(dn.get("dc"), Some("lab"));
        assert_eq!(dn.components().len(), 4);
    }

    #[test]
    fn parse_escaped_comma_and_hex_pairs() {
        let dn = DistinguishedName::parse("CN=Smith\\, John,CN=Users,DC=lab,DC=local").unwrap();
        assert_eq!(dn.common_name(), Some("Smith, John"));

        let dn = DistinguishedName::parse("CN=Smith\\2C John,CN=Users,DC=lab,DC=local").unwrap();
        assert_eq!(dn.common_name(), Some("Smith, John"));

        let dn = DistinguishedName::parse("CN=J\\C3\\BCrgen,DC=lab").unwrap();
        assert_eq!(dn.common_name(), Some("Jürgen"));
    }

    #[test]
    fn child_escapes_special_characters() {
        let users = DistinguishedName::parse("CN=Users,DC=lab,DC=local").unwrap();
        let dn = users.child("CN", "Ops, Tier 1");
        assert_eq!(dn.as_str(), "CN=Ops\\, Tier 1,CN=Users,DC=lab,DC=local");
        assert_eq!(dn.common_name(), Some("Ops, Tier 1"));
        assert_eq!(DistinguishedName::parse(dn.as_str()).unwrap(), dn);
    }

    #[test]
    fn equality_ignores_case() {
        let a = DistinguishedName::parse("CN=Jane Doe,CN=Users,DC=lab,DC=local").unwrap();
        let b = DistinguishedName::parse("cn=jane doe, cn=users, dc=LAB, dc=local").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_inputs() {
        assert_eq!(
            DistinguishedName::parse("   ").unwrap_err(),
            DistinguishedNameError::Empty
        );
        assert!(matches!(
            DistinguishedName::parse("CN=John,").unwrap_err(),
            DistinguishedNameError::InvalidComponent(_)
        ));
        assert!(matches!(
            DistinguishedName::parse("=John").unwrap_err(),
            DistinguishedNameError::MissingAttribute(_)
        ));
        assert!(matches!(
            DistinguishedName::parse("CN=").unwrap_err(),
            DistinguishedNameError::MissingValue(_)
        ));
        assert_eq!(
            DistinguishedName::parse("CN=John\\").unwrap_err(),
            DistinguishedNameError::InvalidEscape
        );
    }

    #[test]
    fn escape_leading_and_trailing_spaces() {
        assert_eq!(escape_value(" padded "), "\\ padded\\ ");
        assert_eq!(escape_value("#hash"), "\\#hash");
        assert_eq!(escape_value("plain"), "plain");
    }
}
