//! Async dashboard orchestrator.
//!
//! The four datasets are read concurrently, then the marketing, pipeline and
//! revenue aggregators run concurrently over the loaded records. Everything
//! here is CPU or file bound, so each unit of work goes to
//! [`tokio::task::spawn_blocking`]. The first failure aborts the run and no
//! payload is produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use revops_core::error::{DashboardError, Result};
use revops_core::models::{CustomerRecord, MarketingChannelRecord, PipelineDealRecord};
use revops_core::settings::EngineConfig;
use revops_data::analysis::{assemble, DashboardInputs, DashboardPayload};
use revops_data::marketing::summarize_marketing;
use revops_data::pipeline::summarize_pipeline;
use revops_data::reader::{load_benchmarks, load_dataset, DatasetPaths};
use revops_data::revenue::summarize_revenue;
use tokio::task::{spawn_blocking, JoinError};

// ── DashboardOrchestrator ─────────────────────────────────────────────────────

/// One-shot dashboard builder over a data directory.
///
/// ```no_run
/// use revops_runtime::orchestrator::DashboardOrchestrator;
/// use revops_core::settings::EngineConfig;
///
/// # async fn demo() -> revops_core::Result<()> {
/// let orch = DashboardOrchestrator::new("./data", EngineConfig::default());
/// let payload = orch.run().await?;
/// println!("{} channels", payload.marketing.channel_performance.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DashboardOrchestrator {
    data_dir: PathBuf,
    config: Arc<EngineConfig>,
}

impl DashboardOrchestrator {
    pub fn new(data_dir: impl Into<PathBuf>, config: EngineConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            config: Arc::new(config),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load, aggregate and assemble.
    pub async fn run(&self) -> Result<DashboardPayload> {
        let started = Instant::now();

        let inputs = self.load().await?;
        let loaded_in = started.elapsed();

        let payload = self.aggregate(inputs).await?;

        tracing::info!(
            "Dashboard built in {:.3}s (load {:.3}s): {} channels, {} stages, {} segments",
            started.elapsed().as_secs_f64(),
            loaded_in.as_secs_f64(),
            payload.marketing.channel_performance.len(),
            payload.pipeline.stage_breakdown.len(),
            payload.revenue.segment_breakdown.len(),
        );
        Ok(payload)
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Read the four datasets in parallel and validate them.
    async fn load(&self) -> Result<DashboardInputs> {
        let dir = self.data_dir.clone();
        let paths = blocking(move || DatasetPaths::discover(&dir)).await?;
        tracing::debug!(?paths, "datasets located");

        let DatasetPaths {
            marketing,
            pipeline,
            customers,
            benchmarks,
        } = paths;

        let (marketing, pipeline, customers, benchmarks) = tokio::try_join!(
            blocking(move || load_dataset::<MarketingChannelRecord>(&marketing)),
            blocking(move || load_dataset::<PipelineDealRecord>(&pipeline)),
            blocking(move || load_dataset::<CustomerRecord>(&customers)),
            blocking(move || load_benchmarks(&benchmarks)),
        )?;

        let inputs = DashboardInputs {
            marketing,
            pipeline,
            customers,
            benchmarks,
        };
        inputs.validate()?;

        tracing::info!(
            "Loaded {} marketing rows, {} deals, {} customers, {} benchmarks from {}",
            inputs.marketing.len(),
            inputs.pipeline.len(),
            inputs.customers.len(),
            inputs.benchmarks.len(),
            self.data_dir.display()
        );
        Ok(inputs)
    }

    /// Run the three aggregators in parallel, then assemble.
    async fn aggregate(&self, inputs: DashboardInputs) -> Result<DashboardPayload> {
        let DashboardInputs {
            marketing,
            pipeline,
            customers,
            benchmarks,
        } = inputs;
        let pipeline_config = Arc::clone(&self.config);

        let (marketing, pipeline, revenue) = tokio::try_join!(
            blocking(move || Ok(summarize_marketing(&marketing))),
            blocking(move || Ok(summarize_pipeline(&pipeline, &pipeline_config))),
            blocking(move || Ok(summarize_revenue(&customers))),
        )?;

        assemble(marketing, pipeline, revenue, benchmarks, &self.config)
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Run `f` on the blocking pool and flatten the join error into ours.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    spawn_blocking(f).await.map_err(join_error)?
}

fn join_error(err: JoinError) -> DashboardError {
    DashboardError::Other(anyhow::anyhow!("aggregation task failed: {err}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
