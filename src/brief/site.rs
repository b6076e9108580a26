use url::Url;

pub const UNKNOWN_SITE: &str = "Unknown";

/// Host of `url` with a leading `www.` removed, if the url has a host.
pub fn host_without_www(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

/// Site label stored with a history record and sent with the request.
pub fn derive_site(url: &str) -> String {
    host_without_www(url).unwrap_or_else(|| UNKNOWN_SITE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_www() {
        assert_eq!(derive_site("https://www.nytimes.com/x"), "nytimes.com");
    }

    #[test]
    fn leaves_bare_host_alone() {
        assert_eq!(derive_site("https://example.com/x"), "example.com");
    }

    #[test]
    fn only_strips_prefix_not_inner_www() {
        assert_eq!(derive_site("https://news.www.example.com/"), "news.www.example.com");
    }

    #[test]
    fn unparseable_url_is_unknown() {
        assert_eq!(derive_site("not a url"), UNKNOWN_SITE);
        assert_eq!(host_without_www("mailto:u@x.com"), None);
    }
}
