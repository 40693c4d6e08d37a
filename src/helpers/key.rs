use regex::Regex;
use url::Url;

/// Extracts a spreadsheet key from either a bare key or a spreadsheet URL
/// such as `https://docs.google.com/spreadsheets/d/<key>/edit#gid=0`.
/// Returns None if no plausible key is found.
pub(crate) fn spreadsheet_key(value: &str) -> Option<String> {
    let pattern = Regex::new(r"^[A-Za-z0-9_-]+$").expect("Hardcode regex pattern");
    let value = value.trim();
    if pattern.is_match(value) {
        return Some(value.to_owned());
    }

    let url = Url::parse(value).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments
        .windows(2)
        .find(|pair| pair[0] == "d")
        .map(|pair| pair[1])
        .filter(|key| pattern.is_match(key))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_key() {
        assert_eq!(spreadsheet_key(" 1AbC-d_9 ").as_deref(), Some("1AbC-d_9"));
    }

    #[test]
    fn test_url_key() {
        assert_eq!(
            spreadsheet_key("https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0").as_deref(),
            Some("1AbC-d_9")
        );
        assert_eq!(
            spreadsheet_key("https://docs.google.com/spreadsheets/u/1/d/xyz").as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn test_invalid_key() {
        assert_eq!(spreadsheet_key("not a key"), None);
        assert_eq!(spreadsheet_key("ftp://host/d/xyz"), None);
        assert_eq!(spreadsheet_key("https://docs.google.com/spreadsheets/"), None);
        assert_eq!(spreadsheet_key(""), None);
    }
}
