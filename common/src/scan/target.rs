//! # Scan Target Model
//!
//! A target is a host identifier: an IP address or a hostname. Targets are
//! collected into a [`TargetSet`] with set semantics, but insertion order is
//! preserved so reports enumerate hosts the way the caller listed them.

use std::fmt;
use std::str::FromStr;

/// A single host identifier (IP or hostname). Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("target must not be empty".to_string());
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(format!("target '{trimmed}' must not contain whitespace"));
        }
        Ok(Target(trimmed.to_string()))
    }
}

/// A de-duplicated, insertion-ordered set of targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target, keeping the first occurrence's position.
    /// Returns `false` when the target was already present.
    pub fn insert(&mut self, target: Target) -> bool {
        if self.targets.contains(&target) {
            return false;
        }
        self.targets.push(target);
        true
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }
}

impl FromStr for TargetSet {
    type Err = String;

    /// Parses a comma-separated target list (e.g., "10.0.0.5, example.com").
    /// Empty segments are skipped; duplicates collapse to the first mention.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = TargetSet::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            set.insert(part.parse()?);
        }
        if set.is_empty() {
            return Err(format!("no targets found in '{s}'"));
        }
        Ok(set)
    }
}

impl FromIterator<Target> for TargetSet {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        let mut set = TargetSet::new();
        for target in iter {
            set.insert(target);
        }
        set
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
