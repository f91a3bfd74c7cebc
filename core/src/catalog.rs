//! # Vulnerability Correlation
//!
//! Maps a normalized service signature (service name + banner) to known
//! vulnerability identifiers. Lookup is deterministic: results are ordered
//! by severity descending, then identifier ascending, so reports are stable
//! across runs.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;

/// Severity of a catalog entry. Ordering is ascending: `Low < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Maps a service signature to zero or more vulnerability identifiers.
pub trait VulnerabilityCatalog: Send + Sync {
    /// Returns identifiers for the given signature.
    ///
    /// Matching policy: entries whose banner pattern matches win; the
    /// service-name fallback applies only when no banner entry matched.
    /// The result is de-duplicated and deterministically ordered.
    fn lookup(&self, service: Option<&str>, banner: Option<&str>) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    id: String,
    severity: Severity,
    /// Normalized (lowercase) service name this entry applies to.
    service: String,
    /// Case-insensitive banner substring. Entries with a pattern only match
    /// via the banner; entries without one are service-level fallbacks.
    banner_pattern: Option<String>,
}

/// An in-memory catalog with a fixed entry table.
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The built-in table: banner-pinned entries for the classic portal
    /// fixtures plus service-level fallbacks for notoriously exposed
    /// services.
    pub fn builtin() -> Self {
        Self::empty()
            .with_entry(
                "CVE-2020-14145",
                Severity::Medium,
                "ssh",
                Some("OpenSSH 8.2"),
            )
            .with_entry(
                "CVE-2021-44790",
                Severity::Critical,
                "http",
                Some("Apache/2.4.41"),
            )
            .with_entry(
                "CVE-2021-44790",
                Severity::Critical,
                "https",
                Some("Apache/2.4.41"),
            )
            .with_entry("CVE-2011-2523", Severity::Critical, "ftp", Some("vsftpd 2.3.4"))
            .with_entry("CVE-2016-0777", Severity::High, "ssh", None)
            .with_entry("CVE-2020-10188", Severity::High, "telnet", None)
            .with_entry("CVE-2017-0144", Severity::Critical, "microsoft-ds", None)
            .with_entry("CVE-2019-0708", Severity::Critical, "rdp", None)
    }

    pub fn with_entry(
        mut self,
        id: &str,
        severity: Severity,
        service: &str,
        banner_pattern: Option<&str>,
    ) -> Self {
        self.entries.push(CatalogEntry {
            id: id.to_string(),
            severity,
            service: service.to_ascii_lowercase(),
            banner_pattern: banner_pattern.map(str::to_ascii_lowercase),
        });
        self
    }

    fn banner_matches(&self, banner: &str) -> Vec<&CatalogEntry> {
        let banner = banner.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.banner_pattern
                    .as_deref()
                    .is_some_and(|pattern| banner.contains(pattern))
            })
            .collect()
    }

    fn service_matches(&self, service: &str) -> Vec<&CatalogEntry> {
        let service = service.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| e.banner_pattern.is_none() && e.service == service)
            .collect()
    }
}

impl VulnerabilityCatalog for StaticCatalog {
    fn lookup(&self, service: Option<&str>, banner: Option<&str>) -> Vec<String> {
        let mut matched = match banner {
            Some(banner) => self.banner_matches(banner),
            None => Vec::new(),
        };

        // Service-name fallback only when nothing matched on the banner.
        if matched.is_empty() {
            if let Some(service) = service {
                matched = self.service_matches(service);
            }
        }

        matched.sort_by(|a, b| match b.severity.cmp(&a.severity) {
            CmpOrdering::Equal => a.id.cmp(&b.id),
            other => other,
        });

        // Keep the first (highest-severity) occurrence of each identifier,
        // wherever the sort placed the rest.
        let mut seen = HashSet::new();
        matched.retain(|e| seen.insert(e.id.as_str()));

        matched.into_iter().map(|e| e.id.clone()).collect()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
