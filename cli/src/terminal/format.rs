//! Renders findings and advisories for the terminal.

use colored::*;

use vantage_common::config::Config;
use vantage_common::scan::outcome::{Finding, PortStatus};

use super::print;

pub fn is_open(finding: &Finding) -> bool {
    finding.outcome.status == PortStatus::Open
}

fn status_colored(status: PortStatus) -> ColoredString {
    match status {
        PortStatus::Open => "open".green().bold(),
        PortStatus::Closed => "closed".bright_black(),
        PortStatus::Filtered => "filtered".yellow(),
        PortStatus::Error => "error".red(),
    }
}

/// Prints findings grouped per target, ports ascending within each group.
/// The stored sequence stays in completion order; sorting here is purely
/// presentational.
pub fn print_findings(findings: &[Finding], cfg: &Config) {
    let mut targets: Vec<&str> = Vec::new();
    for finding in findings {
        let host = finding.outcome.target.as_str();
        if !targets.contains(&host) {
            targets.push(host);
        }
    }

    for (idx, host) in targets.iter().enumerate() {
        let mut group: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.outcome.target.as_str() == *host)
            .collect();
        group.sort_by_key(|f| f.outcome.port);

        print::tree_head(idx, host);
        for (i, finding) in group.iter().enumerate() {
            print::tree_line(i + 1 == group.len(), &finding_line(finding));
        }
        if cfg.quiet == 0 && idx + 1 != targets.len() {
            println!();
        }
    }
}

fn finding_line(finding: &Finding) -> String {
    let outcome = &finding.outcome;

    let port = match outcome.port {
        Some(port) => format!("{port:>5}"),
        None => " host".to_string(),
    };
    let service = outcome.service.as_deref().unwrap_or("-");
    let banner = outcome.banner.as_deref().unwrap_or("");

    let mut line = format!(
        "{} {:<10} {:<14} {}",
        port.bold(),
        status_colored(outcome.status),
        service,
        banner.bright_black()
    );

    if finding.has_vulnerabilities() {
        let ids = finding.vulnerabilities.join(", ");
        line = format!("{line} {}", ids.red().bold());
    }
    line
}

pub fn print_advisory(id: &str, text: &str) {
    println!("{}", id.red().bold());
    for line in text.lines() {
        println!("  {line}");
    }
    println!();
}
