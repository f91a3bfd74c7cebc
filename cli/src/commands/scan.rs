use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use vantage_common::config::Config;
use vantage_common::scan::outcome::Finding;
use vantage_common::scan::plan::{DetectionFlags, ScanMode, ScanPlan};
use vantage_common::scan::ports::PortSpec;
use vantage_common::scan::target::TargetSet;
use vantage_common::{success, warn};
use vantage_core::advisory::{AdvisoryCache, AdvisoryState};
use vantage_core::catalog::StaticCatalog;
use vantage_core::coordinator::{ScanCoordinator, SessionHandle, SessionView};
use vantage_core::probe::simulated::SimulatedProber;
use vantage_core::probe::tcp::TcpConnectProber;
use vantage_core::probe::Prober;
use vantage_core::session::SessionState;

use crate::advisor::TemplateAdvisor;
use crate::terminal::{format, print};

/// The caller context for CLI-issued scans. One invocation, one scan.
const CLI_CONTEXT: &str = "cli";

const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Tcp,
    Udp,
    Syn,
    Discovery,
}

impl From<ModeArg> for ScanMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tcp => ScanMode::TcpConnect,
            ModeArg::Udp => ScanMode::Udp,
            ModeArg::Syn => ScanMode::Syn,
            ModeArg::Discovery => ScanMode::Discovery,
        }
    }
}

#[derive(Args)]
pub struct ScanArgs {
    /// Targets: comma-separated IPs or hostnames
    pub targets: TargetSet,

    /// Port expression, e.g. "1-1024" or "22,80,8000-8100"
    #[arg(short, long, default_value = "1-1024")]
    pub ports: PortSpec,

    /// Scan the top 100 ports instead of --ports
    #[arg(long)]
    pub quick: bool,

    /// Probe mode
    #[arg(long, value_enum, default_value = "tcp")]
    pub mode: ModeArg,

    /// Per-probe timeout in milliseconds
    #[arg(short, long, default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Worker pool size
    #[arg(short, long, default_value_t = 32)]
    pub concurrency: usize,

    /// Skip service detection and banner grabbing
    #[arg(long)]
    pub no_service_detection: bool,

    /// Skip vulnerability correlation
    #[arg(long)]
    pub no_cve: bool,

    /// Report filtered ports explicitly
    #[arg(long)]
    pub firewall_detection: bool,

    /// Allow intrusive probes
    #[arg(long)]
    pub aggressive: bool,

    /// Fetch remediation advisories for flagged findings after the scan
    #[arg(long)]
    pub advise: bool,

    /// Warm the advisory cache while the scan is still running
    #[arg(long)]
    pub prefetch_advisories: bool,

    /// Answer probes from the built-in demo script instead of the network
    #[arg(long)]
    pub simulate: bool,
}

impl ScanArgs {
    fn plan(&self) -> ScanPlan {
        let ports = if self.quick {
            PortSpec::quick()
        } else {
            self.ports.clone()
        };

        let detect = DetectionFlags {
            service_detection: !self.no_service_detection,
            os_detection: false,
            firewall_detection: self.firewall_detection,
            check_cves: !self.no_cve,
            aggressive: self.aggressive,
        };

        ScanPlan::new(self.targets.clone(), ports, self.mode.into())
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_concurrency(self.concurrency)
            .with_detection(detect)
            .with_prefetch_advisories(self.prefetch_advisories)
    }

    fn prober(&self) -> Arc<dyn Prober> {
        if self.simulate {
            Arc::new(SimulatedProber::demo(&self.targets))
        } else {
            Arc::new(TcpConnectProber)
        }
    }
}

pub async fn scan(args: ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let plan = args.plan();
    let total = plan.total_units();
    success!(
        "{} probe units planned across {} target(s)",
        total,
        plan.targets.len()
    );

    let advisories = Arc::new(AdvisoryCache::new(Arc::new(TemplateAdvisor::new())));
    let coordinator = ScanCoordinator::new(args.prober(), Arc::new(StaticCatalog::builtin()))
        .with_advisories(Arc::clone(&advisories));

    let started = Instant::now();
    let handle = coordinator.create_and_start(CLI_CONTEXT, plan)?;

    drive_to_completion(&coordinator, handle, total, cfg).await?;
    let final_view = report(&coordinator, handle, started.elapsed(), cfg)?;

    if args.advise {
        print_advisories(&final_view.findings, &advisories, cfg).await;
    }
    Ok(())
}

/// Polls progress for the bar and forwards Ctrl-C as a cancel request.
async fn drive_to_completion(
    coordinator: &ScanCoordinator,
    handle: SessionHandle,
    total: usize,
    cfg: &Config,
) -> anyhow::Result<SessionView> {
    let bar = progress_bar(total, cfg.quiet);
    let mut cancel_requested = false;

    loop {
        let view = coordinator.get(handle)?;
        bar.set_position(view.progress.completed as u64);

        if view.state.is_terminal() {
            bar.finish_and_clear();
            return Ok(view);
        }

        tokio::select! {
            _ = tokio::time::sleep(PROGRESS_POLL_INTERVAL) => {}
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                warn!("cancellation requested, letting in-flight probes settle...");
                coordinator.cancel(handle)?;
                cancel_requested = true;
            }
        }
    }
}

fn progress_bar(total: usize, quiet: u8) -> ProgressBar {
    if quiet > 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:40.green/black}] {pos}/{len} probes")
            .unwrap()
            .progress_chars("■■·"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn report(
    coordinator: &ScanCoordinator,
    handle: SessionHandle,
    elapsed: Duration,
    cfg: &Config,
) -> anyhow::Result<SessionView> {
    let view = coordinator.remove(handle)?;

    if view.findings.is_empty() {
        print::header("zero findings", cfg.quiet);
        return Ok(view);
    }

    print::header("scan report", cfg.quiet);
    format::print_findings(&view.findings, cfg);
    print_summary(&view, elapsed, cfg);
    Ok(view)
}

fn print_summary(view: &SessionView, elapsed: Duration, cfg: &Config) {
    let open = view
        .findings
        .iter()
        .filter(|f| format::is_open(f))
        .count();
    let flagged: usize = view
        .findings
        .iter()
        .filter(|f| f.has_vulnerabilities())
        .count();

    let verdict = match view.state {
        SessionState::Cancelled => "cancelled".yellow().bold(),
        SessionState::Failed => "failed".red().bold(),
        _ => "complete".green().bold(),
    };
    let timing = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();

    if cfg.quiet == 0 {
        print::fat_separator();
    }
    success!(
        "Scan {verdict}: {}/{} probes answered ({}%), {open} open, {flagged} flagged in {timing}",
        view.progress.completed,
        view.progress.total,
        view.progress.percent(),
    );
}

async fn print_advisories(findings: &[Finding], advisories: &AdvisoryCache, cfg: &Config) {
    let mut ids: Vec<&str> = Vec::new();
    for finding in findings {
        for id in &finding.vulnerabilities {
            if !ids.contains(&id.as_str()) {
                ids.push(id);
            }
        }
    }
    if ids.is_empty() {
        return;
    }

    print::header("remediation advisories", cfg.quiet);
    for id in ids {
        match advisories.request(id).wait().await {
            AdvisoryState::Ready(text) => format::print_advisory(id, &text),
            AdvisoryState::Failed(err) => warn!("no advisory for {id}: {err}"),
            AdvisoryState::Pending => unreachable!("wait() only returns terminal states"),
        }
    }
}
