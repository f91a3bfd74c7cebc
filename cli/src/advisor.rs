//! The environment-supplied advisory provider for the CLI.
//!
//! Remediation wording is opaque to the engine; this provider answers from
//! a small template table keyed by identifier, with a general fallback.
//! A short artificial delay keeps the asynchronous path honest in demos.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use vantage_common::error::AdvisoryError;
use vantage_core::advisory::AdvisoryProvider;

const GENERATION_DELAY: Duration = Duration::from_millis(250);

pub struct TemplateAdvisor {
    delay: Duration,
}

impl TemplateAdvisor {
    pub fn new() -> Self {
        Self {
            delay: GENERATION_DELAY,
        }
    }
}

#[async_trait]
impl AdvisoryProvider for TemplateAdvisor {
    async fn generate(&self, vuln_id: &str) -> Result<String, AdvisoryError> {
        sleep(self.delay).await;

        let text = if vuln_id.contains("CVE-2021-44790") {
            "This vulnerability affects Apache HTTP Server. Recommended actions:\n\
             1. Upgrade to Apache version 2.4.52 or later\n\
             2. Apply the available security patch\n\
             3. Implement a Web Application Firewall (WAF) as a temporary mitigation"
        } else if vuln_id.contains("CVE-2020-14145") {
            "This vulnerability affects OpenSSH. Recommended actions:\n\
             1. Update to the latest OpenSSH version\n\
             2. Configure proper SSH key management\n\
             3. Implement IP filtering for SSH access"
        } else {
            "General recommendations:\n\
             1. Update the affected service to the latest version\n\
             2. Apply security patches as they become available\n\
             3. Consider implementing network segmentation to limit exposure"
        };

        Ok(text.to_string())
    }
}
