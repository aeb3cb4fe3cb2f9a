//! Search filter construction.
//!
//! Every operator-supplied value goes through [`escape_filter_value`] before it is placed in a
//! filter, so a group called `ops*` matches only `ops*`.

/// Escapes a value for use inside an LDAP search filter (RFC 4515, section 3).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// `(attribute=value)` with the value escaped.
#[must_use]
pub fn equality(attribute: &str, value: &str) -> String {
    format!("({attribute}={})", escape_filter_value(value))
}

/// `(&...)` over the given clauses.
#[must_use]
pub fn and<I, S>(clauses: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let body = clauses
        .into_iter()
        .map(|clause| clause.as_ref().to_string())
        .collect::<String>();
    format!("(&{body})")
}
