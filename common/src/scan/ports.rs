//! # Port Specification
//!
//! Resolves port expressions like `1-1000`, `22,80,443` or `22,8000-8100`
//! into an ordered sequence of distinct ports. Enumeration order follows the
//! expression, so identical expressions always produce identical plans.

use std::str::FromStr;

/// The top ports used by the quick-scan preset, most common first.
const TOP_PORTS: &[u16] = &[
    80, 23, 443, 21, 22, 25, 3389, 110, 445, 139, 143, 53, 135, 3306, 8080,
    1723, 111, 995, 993, 5900, 1025, 587, 8888, 199, 1720, 465, 548, 113, 81,
    6001, 10000, 514, 5060, 179, 1026, 2000, 8443, 8000, 32768, 554, 26, 1433,
    49152, 2001, 515, 8008, 49154, 1027, 5666, 646, 5000, 5631, 631, 49153,
    8081, 2049, 88, 79, 5800, 106, 2121, 1110, 49155, 6000, 513, 990, 5357,
    427, 49156, 543, 544, 5101, 144, 7, 389, 8009, 3128, 444, 9999, 5009,
    7070, 5190, 3000, 5432, 1900, 3986, 13, 1029, 9, 5051, 6646, 49157, 1028,
    873, 1755, 2717, 4899, 9100, 119, 37,
];

/// An ordered sequence of distinct port numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<u16>,
}

impl PortSpec {
    /// The quick-scan preset: the most common service ports.
    pub fn quick() -> Self {
        PortSpec {
            ports: TOP_PORTS.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    fn push(&mut self, port: u16) {
        if !self.ports.contains(&port) {
            self.ports.push(port);
        }
    }
}

impl FromStr for PortSpec {
    type Err = String;

    /// Parses a port expression.
    ///
    /// Supported segments, comma-separated:
    /// * a single port: `443`
    /// * an inclusive range: `1-1024`
    ///
    /// Duplicates collapse to the first mention.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = PortSpec::default();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_port(start)?;
                    let end = parse_port(end)?;
                    if start > end {
                        return Err(format!("descending port range '{part}'"));
                    }
                    for port in start..=end {
                        spec.push(port);
                    }
                }
                None => spec.push(parse_port(part)?),
            }
        }

        if spec.is_empty() {
            return Err(format!("no ports found in '{s}'"));
        }
        Ok(spec)
    }
}

fn parse_port(s: &str) -> Result<u16, String> {
    let value: u32 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid port '{s}': {e}"))?;
    if value == 0 || value > u16::MAX as u32 {
        return Err(format!("port {value} out of range (1-65535)"));
    }
    Ok(value as u16)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
