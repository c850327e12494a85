mod bootstrap;
mod output;
mod report;

use std::future::Future;

use anyhow::{Context, Result};
use revops_core::settings::Settings;
use revops_data::reader::inspect_dir;
use revops_data::DashboardPayload;
use revops_runtime::orchestrator::DashboardOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("RevOps Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data dir: {}, output: {}, trend year: {}",
        settings.data_dir.display(),
        settings.output.display(),
        settings.trend_year
    );

    if settings.inspect {
        let dir = settings.data_dir.clone();
        let shapes = tokio::task::spawn_blocking(move || inspect_dir(&dir))
            .await?
            .with_context(|| format!("inspecting {}", settings.data_dir.display()))?;
        for shape in &shapes {
            tracing::info!("{}: {} rows, {} columns", shape.name, shape.rows, shape.columns.len());
        }
        print!("{}", report::render_shapes(&shapes));
        return Ok(());
    }

    let orchestrator = DashboardOrchestrator::new(&settings.data_dir, settings.engine_config());

    let payload = run_until_interrupted(orchestrator.run(), ctrl_c())
        .await
        .with_context(|| format!("building dashboard from {}", settings.data_dir.display()))?;

    output::write_payload(&settings.output, &payload)?;
    tracing::info!("Dashboard data written to {}", settings.output.display());

    if !settings.quiet {
        print!(
            "{}",
            report::render_summary(&payload, settings.top_channels, settings.stuck_days)
        );
    }

    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Await `build`, or fail if `shutdown` resolves first so the process exits
/// non-zero without writing a payload.
async fn run_until_interrupted<B, S>(build: B, shutdown: S) -> Result<DashboardPayload>
where
    B: Future<Output = revops_core::Result<DashboardPayload>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = build => Ok(result?),
        _ = shutdown => {
            tracing::warn!("Interrupted; no output written");
            anyhow::bail!("interrupted before the dashboard was built")
        }
    }
}
