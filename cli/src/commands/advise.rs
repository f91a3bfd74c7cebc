use std::sync::Arc;

use vantage_common::config::Config;
use vantage_core::advisory::{AdvisoryCache, AdvisoryState};

use crate::advisor::TemplateAdvisor;
use crate::terminal::format;

pub async fn advise(id: &str, _cfg: &Config) -> anyhow::Result<()> {
    let cache = AdvisoryCache::new(Arc::new(TemplateAdvisor::new()));

    match cache.request(id).wait().await {
        AdvisoryState::Ready(text) => {
            format::print_advisory(id, &text);
            Ok(())
        }
        AdvisoryState::Failed(err) => anyhow::bail!("could not generate advisory: {err}"),
        AdvisoryState::Pending => unreachable!("wait() only returns terminal states"),
    }
}
