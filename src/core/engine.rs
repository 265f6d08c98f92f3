use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 依序執行 extract → transform → load；任何一步失敗就停止
pub struct CompEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> CompEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting competition run");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Reading competitor table...");
        let table = self.pipeline.extract().await?;
        tracing::info!("Read {} competitors", table.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🔀 Assigning groups and laying out cards...");
        let artifacts = self.pipeline.transform(table).await?;
        tracing::info!(
            "Grouped {} events; {} scorecards, {} namecards",
            artifacts.grouped.assignment.events().count(),
            artifacts.scorecards.len(),
            artifacts.namecards.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Writing output files...");
        let output_path = self.pipeline.load(artifacts).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
