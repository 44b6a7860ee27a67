mod rule;

pub use rule::{DomainRule, domain_of};

use std::collections::BTreeSet;
use url::Url;

/// Extract the lowercase hostname from a URL string
pub fn host_of(url: &str) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Failed to parse URL {}: {}", url, e);
            return None;
        }
    };

    match parsed.host_str() {
        Some(host) => Some(host.to_lowercase()),
        None => {
            tracing::debug!("No host in URL: {}", url);
            None
        }
    }
}

/// Set of registrable domains that history entries are matched against
#[derive(Debug, Clone, Default)]
pub struct DomainSet {
    rule: DomainRule,
    domains: BTreeSet<String>,
}

impl DomainSet {
    /// Create an empty set using the given reduction rule
    pub fn new(rule: DomainRule) -> Self {
        Self {
            rule,
            domains: BTreeSet::new(),
        }
    }

    /// Build a set from tracked site URLs
    ///
    /// URLs without a parseable host are skipped.
    pub fn from_urls<'a, I>(rule: DomainRule, urls: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::new(rule);
        for url in urls {
            if !set.insert_url(url) {
                tracing::warn!("Tracked site has no usable host, skipping: {}", url);
            }
        }
        set
    }

    /// Add the registrable domain of a URL; returns false if the URL has no host
    pub fn insert_url(&mut self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => {
                self.domains.insert(self.rule.reduce(&host));
                true
            }
            None => false,
        }
    }

    /// Check whether a URL belongs to one of the tracked domains
    pub fn matches_url(&self, url: &str) -> bool {
        if self.domains.is_empty() {
            return false;
        }
        match host_of(url) {
            Some(host) => self.domains.contains(&self.rule.reduce(&host)),
            None => false,
        }
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn rule(&self) -> DomainRule {
        self.rule
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }
}
