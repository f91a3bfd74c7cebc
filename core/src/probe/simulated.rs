//! A scripted prober for demos and tests.
//!
//! Probes answer from a fixed reply table instead of the network, with
//! optional latency jitter so concurrent completion order still races the
//! way it does against real hosts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use vantage_common::error::TransportError;
use vantage_common::scan::outcome::PortStatus;
use vantage_common::scan::plan::{DetectionFlags, ProbeUnit};
use vantage_common::scan::target::TargetSet;

use super::{ProbeReply, Prober, service_name};

/// How a scripted unit behaves when probed.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(ProbeReply),
    Fail(TransportError),
    /// Never answers; the session's probe timeout decides the outcome.
    Hang,
}

pub struct SimulatedProber {
    scripts: HashMap<(String, Option<u16>), Script>,
    fallback: Script,
    jitter: Option<(Duration, Duration)>,
    calls: AtomicUsize,
}

impl SimulatedProber {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            fallback: Script::Reply(ProbeReply::status(PortStatus::Closed)),
            jitter: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Scripts the behavior for one (target, port) pair.
    pub fn script(mut self, target: &str, port: impl Into<Option<u16>>, script: Script) -> Self {
        self.scripts.insert((target.to_string(), port.into()), script);
        self
    }

    /// Behavior for units with no script entry. Defaults to `closed`.
    pub fn fallback(mut self, script: Script) -> Self {
        self.fallback = script;
        self
    }

    /// Adds a uniformly random per-probe delay.
    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.jitter = Some((min, max));
        self
    }

    /// Number of probe calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// The demo script: every listed target answers with the classic
    /// portal fixture (SSH/HTTP/HTTPS open with vulnerable banners, MySQL
    /// filtered, the proxy port closed).
    pub fn demo(targets: &TargetSet) -> Self {
        let mut prober = Self::new().with_jitter(
            Duration::from_millis(20),
            Duration::from_millis(120),
        );
        for target in targets.iter() {
            let host = target.as_str();
            prober = prober
                .script(
                    host,
                    22,
                    Script::Reply(
                        ProbeReply::status(PortStatus::Open)
                            .with_service("ssh")
                            .with_banner("OpenSSH 8.2p1 Ubuntu-4ubuntu0.5"),
                    ),
                )
                .script(
                    host,
                    80,
                    Script::Reply(
                        ProbeReply::status(PortStatus::Open)
                            .with_service("http")
                            .with_banner("Apache/2.4.41 (Ubuntu)"),
                    ),
                )
                .script(
                    host,
                    443,
                    Script::Reply(
                        ProbeReply::status(PortStatus::Open)
                            .with_service("https")
                            .with_banner("Apache/2.4.41 (Ubuntu)"),
                    ),
                )
                .script(
                    host,
                    3306,
                    Script::Reply(
                        ProbeReply::status(PortStatus::Filtered).with_service("mysql"),
                    ),
                )
                .script(
                    host,
                    8080,
                    Script::Reply(
                        ProbeReply::status(PortStatus::Closed).with_service("http-proxy"),
                    ),
                );
        }
        prober
    }
}

impl Default for SimulatedProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for SimulatedProber {
    async fn probe(
        &self,
        unit: &ProbeUnit,
        _timeout: Duration,
        detect: &DetectionFlags,
    ) -> Result<ProbeReply, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if let Some((min, max)) = self.jitter {
            let delay = rand::rng().random_range(min..=max);
            sleep(delay).await;
        }

        let key = (unit.target.as_str().to_string(), unit.port);
        let script = self.scripts.get(&key).unwrap_or(&self.fallback);

        match script {
            Script::Reply(reply) => {
                let mut reply = reply.clone();
                if reply.service.is_none() && detect.service_detection {
                    reply.service = unit
                        .port
                        .and_then(service_name)
                        .map(str::to_string);
                }
                if !detect.service_detection {
                    reply.banner = None;
                    reply.service = None;
                }
                Ok(reply)
            }
            Script::Fail(err) => Err(err.clone()),
            Script::Hang => {
                sleep(Duration::from_secs(3600)).await;
                Ok(ProbeReply::status(PortStatus::Filtered))
            }
        }
    }
}
