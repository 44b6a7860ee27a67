/// How a hostname is reduced to the domain that tracked sites are compared on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DomainRule {
    /// Keep the last two dot-separated labels (`sub.example.com` -> `example.com`).
    ///
    /// Known limitation: multi-part public suffixes are not understood, so
    /// `example.co.uk` reduces to `co.uk` and every `.co.uk` site matches.
    #[default]
    TwoLabel,
    /// Public Suffix List aware reduction (`example.co.uk` stays `example.co.uk`).
    ///
    /// This changes which history entries a cleanup deletes and must be
    /// requested explicitly.
    PublicSuffix,
}

impl DomainRule {
    /// Reduce a hostname to its registrable domain under this rule
    ///
    /// Matching is case-insensitive, so the result is always lowercase.
    pub fn reduce(&self, hostname: &str) -> String {
        let hostname = hostname.trim_end_matches('.').to_lowercase();
        match self {
            DomainRule::TwoLabel => two_label(&hostname),
            DomainRule::PublicSuffix => public_suffix(&hostname),
        }
    }
}

/// Registrable domain of a hostname using the two-label heuristic
pub fn domain_of(hostname: &str) -> String {
    DomainRule::TwoLabel.reduce(hostname)
}

fn two_label(hostname: &str) -> String {
    let parts: Vec<&str> = hostname.split('.').collect();
    let start = parts.len().saturating_sub(2);
    parts[start..].join(".")
}

fn public_suffix(hostname: &str) -> String {
    if hostname.parse::<std::net::IpAddr>().is_ok() {
        return hostname.to_string();
    }

    match psl::domain(hostname.as_bytes()) {
        Some(root) => String::from_utf8_lossy(root.as_bytes()).to_string(),
        None => two_label(hostname),
    }
}
