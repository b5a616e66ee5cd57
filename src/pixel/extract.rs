//! Request validation: callback name and referrer
//!
//! The referrer decides what is counted: its host is the site, its path
//! the page.

use axum::http::{header::REFERER, HeaderMap};
use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Host, Url};

use super::error::PixelError;
use super::jsonp::is_safe_callback;

const CALLBACK_PARAM: &str = "jsonpCallback";

/// Site and path of the embedding page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub site: String,
    pub path: String,
}

/// First `jsonpCallback` value of a raw query string; later repeats are ignored
pub fn callback_param(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(name, _)| name == CALLBACK_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Check the callback name. Missing or empty is always rejected; with `strict`
/// anything that is not an identifier path is rejected too.
pub fn validate_callback(callback: Option<&str>, strict: bool) -> Result<&str, PixelError> {
    match callback {
        Some(name) if !name.is_empty() => {
            if strict && !is_safe_callback(name) {
                return Err(PixelError::BadRequest);
            }
            Ok(name)
        }
        _ => Err(PixelError::BadRequest),
    }
}

/// The raw referrer, or `BadRequest` when absent or empty.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn referrer(headers: &HeaderMap) -> Result<String, PixelError> {
    let value = headers.get(REFERER).ok_or(PixelError::BadRequest)?;
    if value.is_empty() {
        return Err(PixelError::BadRequest);
    }
    Ok(String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Split a referrer into site and path.
///
/// Anything that is not an absolute URL with a host is `MalformedReferrer`.
/// The path is percent-decoded and otherwise kept as sent, dot segments
/// included, so `/a/../b` and `/b` are different pages.
pub fn parse_referrer(referrer: &str) -> Result<PageRef, PixelError> {
    let url = Url::parse(referrer).map_err(|e| PixelError::MalformedReferrer(e.to_string()))?;

    let site = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        _ => {
            return Err(PixelError::MalformedReferrer(format!(
                "referrer {} has no host",
                referrer
            )))
        }
    };

    Ok(PageRef {
        site,
        path: percent_decode_str(raw_path(referrer))
            .decode_utf8_lossy()
            .into_owned(),
    })
}

/// Path portion of an absolute URL, before `?` or `#`, without normalization
fn raw_path(referrer: &str) -> &str {
    let rest = referrer
        .split_once("://")
        .map_or(referrer, |(_, rest)| rest);
    let start = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let path = &rest[start..];
    let end = path
        .find(|c: char| matches!(c, '?' | '#'))
        .unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_referrer_site_and_path() {
        let page = parse_referrer("https://example.com/blog/post1").unwrap();
        assert_eq!(page.site, "example.com");
        assert_eq!(page.path, "/blog/post1");
    }

    #[test]
    fn test_parse_referrer_drops_port_query_and_fragment() {
        let page = parse_referrer("http://Example.com:8080/a/b?x=1#top").unwrap();
        assert_eq!(page.site, "example.com");
        assert_eq!(page.path, "/a/b");
    }

    #[test]
    fn test_parse_referrer_root() {
        assert_eq!(parse_referrer("https://example.com").unwrap().path, "");
        assert_eq!(parse_referrer("https://example.com/").unwrap().path, "/");
        assert_eq!(parse_referrer("https://example.com?x=1").unwrap().path, "");
    }

    #[test]
    fn test_parse_referrer_decodes_path() {
        let page = parse_referrer("https://a.com/%E5%8D%9A%E5%AE%A2/%E6%96%87%E7%AB%A0?p=1").unwrap();
        assert_eq!(page.site, "a.com");
        assert_eq!(page.path, "/博客/文章");

        let page = parse_referrer("https://a.com/my%20post").unwrap();
        assert_eq!(page.path, "/my post");
    }

    #[test]
    fn test_parse_referrer_keeps_dot_segments() {
        assert_eq!(parse_referrer("https://a.com/a/../b").unwrap().path, "/a/../b");
        assert_eq!(parse_referrer("https://a.com/./x").unwrap().path, "/./x");
    }

    #[test]
    fn test_parse_referrer_raw_unicode_path() {
        assert_eq!(parse_referrer("https://a.com/博客").unwrap().path, "/博客");
    }

    #[test]
    fn test_callback_param_first_value_wins() {
        assert_eq!(callback_param(Some("jsonpCallback=a&jsonpCallback=b")), Some("a".to_string()));
        assert_eq!(callback_param(Some("x=1&jsonpCallback=cb%5F1")), Some("cb_1".to_string()));
        assert_eq!(callback_param(Some("jsonpCallback=")), Some(String::new()));
        assert_eq!(callback_param(Some("callback=cb")), None);
        assert_eq!(callback_param(None), None);
    }

    #[test]
    fn test_parse_referrer_ip_hosts() {
        assert_eq!(parse_referrer("http://10.1.2.3/x").unwrap().site, "10.1.2.3");
        assert_eq!(parse_referrer("http://[::1]:8080/x").unwrap().site, "::1");
    }

    #[test]
    fn test_parse_referrer_rejects_malformed() {
        for referrer in ["not a url", "/relative/path", "mailto:someone@example.com", "http://"] {
            assert!(
                matches!(parse_referrer(referrer), Err(PixelError::MalformedReferrer(_))),
                "{:?} should be malformed",
                referrer
            );
        }
    }

    #[test]
    fn test_validate_callback() {
        assert_eq!(validate_callback(Some("cb"), true).unwrap(), "cb");
        assert!(matches!(validate_callback(None, true), Err(PixelError::BadRequest)));
        assert!(matches!(validate_callback(Some(""), false), Err(PixelError::BadRequest)));
        assert!(matches!(
            validate_callback(Some("alert(1)"), true),
            Err(PixelError::BadRequest)
        ));
        assert_eq!(validate_callback(Some("alert(1)"), false).unwrap(), "alert(1)");
    }

    #[test]
    fn test_referrer_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(referrer(&headers), Err(PixelError::BadRequest)));

        headers.insert(REFERER, HeaderValue::from_static(""));
        assert!(matches!(referrer(&headers), Err(PixelError::BadRequest)));

        headers.insert(REFERER, HeaderValue::from_static("https://a.com/"));
        assert_eq!(referrer(&headers).unwrap(), "https://a.com/");
    }

    #[test]
    fn test_referrer_header_with_raw_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            HeaderValue::from_bytes("https://a.com/博客".as_bytes()).unwrap(),
        );

        let raw = referrer(&headers).unwrap();
        assert_eq!(raw, "https://a.com/博客");
        assert_eq!(parse_referrer(&raw).unwrap().path, "/博客");
    }
}
