//! Store key layout
//!
//! ```text
//! {prefix}site_uv:{site}          set of visitor ids
//! {prefix}site_pv                 hash, field = site
//! {prefix}page_pv:{site}          hash, field = path
//! ```

const SITE_UV: &str = "site_uv";
const SITE_PV: &str = "site_pv";
const PAGE_PV: &str = "page_pv";

/// Derives namespaced store keys from a configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNamer {
    prefix: String,
}

impl KeyNamer {
    /// A non-empty prefix without a trailing ':' gets one appended here, once.
    pub fn new(prefix: &str) -> Self {
        let mut prefix = prefix.to_string();
        if !prefix.is_empty() && !prefix.ends_with(':') {
            prefix.push(':');
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Set holding the unique visitors of `site`
    pub fn site_uv(&self, site: &str) -> String {
        format!("{}{}:{}", self.prefix, SITE_UV, site)
    }

    /// Hash of per-site page views; the field is the site
    pub fn site_pv(&self) -> String {
        format!("{}{}", self.prefix, SITE_PV)
    }

    /// Hash of per-path page views within `site`; the field is the path
    pub fn page_pv(&self, site: &str) -> String {
        format!("{}{}:{}", self.prefix, PAGE_PV, site)
    }
}
