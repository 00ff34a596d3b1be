//! Accept filters, in the style of an HTML file input's `accept` attribute.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Any,
    /// Lowercase suffix including the leading dot, e.g. `.mp4`
    Extension(String),
    /// Lowercase top-level type, e.g. `video` for `video/*`
    MimeFamily(String),
    /// Lowercase essence, e.g. `video/mp4`
    Mime(String),
}

/// Which files a selection may produce.
///
/// Comma-separated tokens, any of which may match:
/// - `.mp4` or `mp4`: file name extension (case-insensitive)
/// - `video/*`: any MIME type in a family
/// - `video/mp4`: an exact MIME type (parameters are ignored)
/// - `*`, `*/*` or an empty filter: everything
///
/// # Examples
///
/// ```
/// use mediastore_source::AcceptFilter;
///
/// let filter = AcceptFilter::parse("video/*, .mkv");
/// assert!(filter.matches("clip.webm", "video/webm"));
/// assert!(filter.matches("film.MKV", "application/octet-stream"));
/// assert!(!filter.matches("song.mp3", "audio/mpeg"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptFilter {
    raw: String,
    rules: Vec<Rule>,
}
impl AcceptFilter {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let rules = raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let token = token.to_ascii_lowercase();
                match token.split_once('/') {
                    _ if token == "*" => Rule::Any,
                    Some(("*", "*")) => Rule::Any,
                    Some((family, "*")) => Rule::MimeFamily(family.to_string()),
                    Some(_) => Rule::Mime(essence(&token).to_string()),
                    None if token.starts_with('.') => Rule::Extension(token),
                    None => Rule::Extension(format!(".{token}")),
                }
            })
            .collect();
        Self { raw, rules }
    }

    /// A filter that accepts every file.
    pub fn any() -> Self {
        Self::parse("")
    }

    pub fn is_any(&self) -> bool {
        self.rules.is_empty() || self.rules.contains(&Rule::Any)
    }

    /// Whether a file with this name and MIME type is accepted.
    pub fn matches(&self, name: &str, mime_type: &str) -> bool {
        if self.is_any() {
            return true;
        }
        let name = name.to_ascii_lowercase();
        let mime_type = essence(mime_type).to_ascii_lowercase();
        self.rules.iter().any(|rule| match rule {
            Rule::Any => true,
            Rule::Extension(ext) => name.len() > ext.len() && name.ends_with(ext.as_str()),
            Rule::MimeFamily(family) => mime_type.split_once('/').is_some_and(|(top, _)| top == family),
            Rule::Mime(exact) => mime_type == *exact,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
impl Default for AcceptFilter {
    fn default() -> Self {
        Self::any()
    }
}
impl FromStr for AcceptFilter {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
impl From<&str> for AcceptFilter {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
impl fmt::Display for AcceptFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// "video/mp4; codecs=avc1" -> "video/mp4"
fn essence(mime_type: &str) -> &str {
    mime_type.split(';').next().unwrap_or_default().trim()
}
