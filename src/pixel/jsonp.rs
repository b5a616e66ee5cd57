//! Callback-wrapped script payload
//!
//! ```text
//! try{cb({"site_uv":1,"page_pv":1,"version":2.4,"site_pv":1})}catch(e){}
//! ```
//!
//! Key order is fixed and the counters are emitted as bare numbers. The
//! `try/catch` keeps the embedding page's script running even when `cb` is
//! not defined there.

use crate::counter::CounterSnapshot;

/// Protocol version reported to the embed script
pub const PROTOCOL_VERSION: &str = "2.4";

const MAX_CALLBACK_LEN: usize = 128;

/// Render `snapshot` as a call to `callback`. The name is emitted verbatim.
pub fn render(callback: &str, snapshot: &CounterSnapshot) -> String {
    format!(
        r#"try{{{}({{"site_uv":{},"page_pv":{},"version":{},"site_pv":{}}})}}catch(e){{}}"#,
        callback, snapshot.site_uv, snapshot.page_pv, PROTOCOL_VERSION, snapshot.site_pv
    )
}

/// Whether `name` is a plain identifier or a dotted member path such as
/// `BusuanziCallback_123` or `window.counters.update`
pub fn is_safe_callback(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_CALLBACK_LEN {
        return false;
    }

    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            }
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_worked_example() {
        let snapshot = CounterSnapshot::from_outcomes(Some(1), Some(1), Some(1));
        assert_eq!(
            render("cb", &snapshot),
            r#"try{cb({"site_uv":1,"page_pv":1,"version":2.4,"site_pv":1})}catch(e){}"#
        );
    }

    #[test]
    fn test_render_key_order() {
        let snapshot = CounterSnapshot::from_outcomes(Some(7), Some(42), Some(3));
        let body = render("BusuanziCallback_1", &snapshot);

        assert_eq!(
            body,
            r#"try{BusuanziCallback_1({"site_uv":7,"page_pv":3,"version":2.4,"site_pv":42})}catch(e){}"#
        );
        let uv = body.find("site_uv").unwrap();
        let ppv = body.find("page_pv").unwrap();
        let version = body.find("version").unwrap();
        let spv = body.find("site_pv").unwrap();
        assert!(uv < ppv && ppv < version && version < spv);
    }

    #[test]
    fn test_render_failed_counters_as_zero() {
        let snapshot = CounterSnapshot::from_outcomes(Some(5), Some(9), None);
        assert!(render("cb", &snapshot).contains(r#""page_pv":0,"#));
    }

    #[test]
    fn test_payload_is_valid_json_inside_call() {
        let snapshot = CounterSnapshot::from_outcomes(Some(10), Some(20), Some(30));
        let body = render("cb", &snapshot);
        let json = body
            .strip_prefix("try{cb(")
            .and_then(|rest| rest.strip_suffix(")}catch(e){}"))
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["site_uv"], 10);
        assert_eq!(value["site_pv"], 20);
        assert_eq!(value["page_pv"], 30);
        assert_eq!(value["version"], 2.4);
    }

    #[test]
    fn test_safe_callback_names() {
        for name in ["cb", "_cb", "$", "BusuanziCallback_123", "window.counters.update", "a1$b"] {
            assert!(is_safe_callback(name), "{} should be accepted", name);
        }
    }

    #[test]
    fn test_unsafe_callback_names() {
        let too_long = "a".repeat(MAX_CALLBACK_LEN + 1);
        for name in [
            "",
            "1cb",
            "cb()",
            "alert(1);cb",
            "a..b",
            ".cb",
            "cb.",
            "cb-name",
            "cb name",
            "</script>",
            too_long.as_str(),
        ] {
            assert!(!is_safe_callback(name), "{:?} should be rejected", name);
        }
    }
}
