use std::path::PathBuf;

use cricetl::config::EtlConfig;
use cricetl::pipeline::{EtlPipeline, RunOutcome, RunSummary};
use serde_json::Value;
use tempfile::TempDir;

#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub source_dir: PathBuf,
    pub config: EtlConfig,
}

pub async fn init_test_context() -> anyhow::Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let source_dir = temp_dir.path().join("json");
    tokio::fs::create_dir_all(&source_dir).await?;
    let config = EtlConfig::new(&source_dir, temp_dir.path().join("store")).with_force(true);

    Ok(TestContext {
        temp_dir,
        source_dir,
        config,
    })
}

#[allow(dead_code)]
impl TestContext {
    pub async fn write_match(&self, match_id: &str, document: &Value) -> anyhow::Result<()> {
        let path = self.source_dir.join(format!("{match_id}.json"));
        tokio::fs::write(path, serde_json::to_vec_pretty(document)?).await?;
        Ok(())
    }

    pub async fn write_raw(&self, file_name: &str, body: &str) -> anyhow::Result<()> {
        tokio::fs::write(self.source_dir.join(file_name), body).await?;
        Ok(())
    }

    pub async fn pipeline(&self) -> anyhow::Result<EtlPipeline> {
        EtlPipeline::open(self.config.clone()).await
    }

    /// Opens the pipeline, runs it once and expects a completed run.
    pub async fn run_once(&self) -> anyhow::Result<(EtlPipeline, RunSummary)> {
        let pipeline = self.pipeline().await?;
        match pipeline.run().await? {
            RunOutcome::Completed(summary) => Ok((pipeline, summary)),
            RunOutcome::Skipped { reason } => anyhow::bail!("run skipped: {reason}"),
        }
    }
}
