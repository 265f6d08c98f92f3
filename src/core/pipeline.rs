use crate::adapters::csv_table;
use crate::adapters::pdf::PdfCardRenderer;
use crate::core::{grouping, layout};
use crate::domain::model::{CompetitorTable, GroupedTable, RunArtifacts, RunSummary};
use crate::domain::ports::{CardRenderer, ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, TimeZone};
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

pub const GROUPED_CSV_FILE: &str = "grouped_competitors.csv";
pub const SCORECARD_PDF_FILE: &str = "multi_scorecards.pdf";
pub const NAMECARD_PDF_FILE: &str = "grouped_namecards.pdf";
pub const SUMMARY_JSON_FILE: &str = "run_summary.json";
const DEFAULT_TEMPLATE_NAME: &str = "results.xls";

/// 寫入中的暫存資料夾，全部寫完才改名成 `run_folder`
fn staging_folder_name(run_folder: &str) -> String {
    format!(".{}.partial", run_folder)
}

/// `comp_output_%Y%m%d_%H%M%S`
pub fn run_folder_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("comp_output_%Y%m%d_%H%M%S").to_string()
}

pub struct CompPipeline<S: Storage, C: ConfigProvider, R: CardRenderer = PdfCardRenderer> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) renderer: R,
}

impl<S: Storage, C: ConfigProvider> CompPipeline<S, C, PdfCardRenderer> {
    pub fn new(storage: S, config: C) -> Self {
        let renderer = PdfCardRenderer::new(config.round());
        Self {
            storage,
            config,
            renderer,
        }
    }
}

impl<S: Storage, C: ConfigProvider, R: CardRenderer> CompPipeline<S, C, R> {
    pub fn with_renderer(storage: S, config: C, renderer: R) -> Self {
        Self {
            storage,
            config,
            renderer,
        }
    }

    /// 範本檔讀不到時只警告，不中斷
    async fn read_results_template(&self) -> Option<(String, Vec<u8>)> {
        let template = self.config.results_template()?;
        let file_name = Path::new(template)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_TEMPLATE_NAME)
            .to_string();

        match self.storage.read_file(template).await {
            Ok(data) => Some((file_name, data)),
            Err(e) => {
                tracing::warn!("⚠️ Results template {} not copied: {}", template, e);
                None
            }
        }
    }

    /// 先寫進暫存資料夾，全部成功才改名成正式名稱
    async fn publish(
        &self,
        run_folder: &str,
        files: &[(String, Vec<u8>)],
        archive: Option<&[u8]>,
    ) -> Result<()> {
        let staging = staging_folder_name(run_folder);

        tracing::debug!("Writing {} files to {}", files.len(), staging);
        for (name, data) in files {
            self.storage
                .write_file(&format!("{}/{}", staging, name), data)
                .await?;
        }
        if let Some(zip_data) = archive {
            tracing::debug!("Writing archive ({} bytes)", zip_data.len());
            self.storage
                .write_file(&format!("{}.zip", staging), zip_data)
                .await?;
        }

        self.storage.rename(&staging, run_folder).await?;
        if archive.is_some() {
            if let Err(e) = self
                .storage
                .rename(&format!("{}.zip", staging), &format!("{}.zip", run_folder))
                .await
            {
                // 資料夾已發布但 zip 沒有，一併撤回
                self.discard(run_folder).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn discard(&self, path: &str) {
        if let Err(e) = self.storage.remove(path).await {
            tracing::warn!("⚠️ Could not remove partial output {}: {}", path, e);
        }
    }
}

fn bundle_archive(run_folder: &str, files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in files {
        zip.start_file::<_, ()>(format!("{}/{}", run_folder, name), FileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: CardRenderer> Pipeline for CompPipeline<S, C, R> {
    async fn extract(&self) -> Result<CompetitorTable> {
        tracing::debug!("Reading competitor table from: {}", self.config.input_file());
        let data = self.storage.read_file(self.config.input_file()).await?;
        let table = csv_table::read_table(&data)?;

        if table.is_empty() {
            tracing::warn!("Competitor table has no rows");
        }

        Ok(table)
    }

    async fn transform(&self, table: CompetitorTable) -> Result<RunArtifacts> {
        // 分組完成後才排版
        let assignment = grouping::assign_groups(&table, self.config.group_size())?;
        let grouped = GroupedTable::new(table, assignment);

        let scorecards = layout::layout_scorecards(&grouped, &self.config.scorecard_grid())?;
        let namecards = layout::layout_namecards(&grouped, &self.config.namecard_grid())?;

        Ok(RunArtifacts {
            grouped,
            scorecards,
            namecards,
        })
    }

    async fn load(&self, artifacts: RunArtifacts) -> Result<String> {
        let run_folder = run_folder_name(&chrono::Local::now());

        // 全部內容先在記憶體裡產生，失敗時不留下半套輸出
        let summary = RunSummary::from_artifacts(&artifacts);
        let mut files = vec![
            (
                GROUPED_CSV_FILE.to_string(),
                csv_table::write_grouped_table(&artifacts.grouped)?,
            ),
            (
                SCORECARD_PDF_FILE.to_string(),
                self.renderer.render_scorecards(&artifacts.scorecards)?,
            ),
            (
                NAMECARD_PDF_FILE.to_string(),
                self.renderer.render_namecards(&artifacts.namecards)?,
            ),
            (
                SUMMARY_JSON_FILE.to_string(),
                serde_json::to_vec_pretty(&summary)?,
            ),
        ];

        if let Some(template) = self.read_results_template().await {
            files.push(template);
        }

        let archive = if self.config.archive() {
            Some(bundle_archive(&run_folder, &files)?)
        } else {
            None
        };

        if let Err(e) = self.publish(&run_folder, &files, archive.as_deref()).await {
            tracing::warn!("⚠️ Writing {} failed, removing partial output", run_folder);
            let staging = staging_folder_name(&run_folder);
            self.discard(&staging).await;
            self.discard(&format!("{}.zip", staging)).await;
            return Err(e);
        }

        Ok(format!("{}/{}", self.config.output_path(), run_folder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Namecard, Placement, Scorecard};
    use crate::utils::error::CompError;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        /// 寫入路徑以此結尾時回傳錯誤
        fail_on: Option<&'static str>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
                fail_on: None,
            }
        }

        fn failing_on(suffix: &'static str) -> Self {
            Self {
                fail_on: Some(suffix),
                ..Self::new()
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn paths(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut paths: Vec<String> = files.keys().cloned().collect();
            paths.sort();
            paths
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                CompError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_on.is_some_and(|suffix| path.ends_with(suffix)) {
                return Err(CompError::IoError(std::io::Error::other(format!(
                    "disk full: {}",
                    path
                ))));
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn rename(&self, from: &str, to: &str) -> Result<()> {
            let mut files = self.files.lock().await;
            let prefix = format!("{}/", from);
            let moved: Vec<String> = files
                .keys()
                .filter(|k| *k == from || k.starts_with(&prefix))
                .cloned()
                .collect();
            for key in moved {
                if let Some(data) = files.remove(&key) {
                    files.insert(format!("{}{}", to, &key[from.len()..]), data);
                }
            }
            Ok(())
        }

        async fn remove(&self, path: &str) -> Result<()> {
            let mut files = self.files.lock().await;
            let prefix = format!("{}/", path);
            files.retain(|k, _| k != path && !k.starts_with(&prefix));
            Ok(())
        }
    }

    struct MockConfig {
        group_size: usize,
        results_template: Option<String>,
        archive: bool,
    }

    impl MockConfig {
        fn new(group_size: usize) -> Self {
            Self {
                group_size,
                results_template: None,
                archive: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_file(&self) -> &str {
            "competitors.csv"
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn group_size(&self) -> usize {
            self.group_size
        }

        fn round(&self) -> u32 {
            1
        }

        fn results_template(&self) -> Option<&str> {
            self.results_template.as_deref()
        }

        fn archive(&self) -> bool {
            self.archive
        }
    }

    /// 以文字列出卡片，方便斷言
    struct TextRenderer;

    impl CardRenderer for TextRenderer {
        fn render_scorecards(&self, placements: &[Placement<Scorecard>]) -> Result<Vec<u8>> {
            Ok(placements
                .iter()
                .map(|p| format!("{} {} {} {}\n", p.page, p.content.name, p.content.event, p.content.group))
                .collect::<String>()
                .into_bytes())
        }

        fn render_namecards(&self, placements: &[Placement<Namecard>]) -> Result<Vec<u8>> {
            Ok(placements
                .iter()
                .map(|p| format!("{} {}\n", p.page, p.content.name))
                .collect::<String>()
                .into_bytes())
        }
    }

    const COMPETITORS: &str = "Name,Events\nCarl,333\nAlice,333:pyram\nBob,333\nDana,\n";

    #[test]
    fn test_run_folder_name() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(run_folder_name(&now), "comp_output_20250309_140507");
    }

    #[tokio::test]
    async fn test_extract_reads_table() {
        let storage = MockStorage::new();
        storage.put_file("competitors.csv", COMPETITORS.as_bytes()).await;
        let pipeline = CompPipeline::with_renderer(storage, MockConfig::new(2), TextRenderer);

        let table = pipeline.extract().await.unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.competitors[1].events, vec!["333", "pyram"]);
    }

    #[tokio::test]
    async fn test_extract_missing_input() {
        let pipeline =
            CompPipeline::with_renderer(MockStorage::new(), MockConfig::new(2), TextRenderer);
        assert!(matches!(
            pipeline.extract().await,
            Err(CompError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_transform_assigns_then_lays_out() {
        let table = csv_table::read_table(COMPETITORS.as_bytes()).unwrap();
        let pipeline =
            CompPipeline::with_renderer(MockStorage::new(), MockConfig::new(2), TextRenderer);

        let artifacts = pipeline.transform(table).await.unwrap();

        // Alice=1, Bob=2, Carl=1
        let scorecards: Vec<_> = artifacts
            .scorecards
            .iter()
            .map(|p| (p.content.name.as_str(), p.content.event.as_str(), p.content.group))
            .collect();
        assert_eq!(
            scorecards,
            vec![
                ("Carl", "333", 1),
                ("Alice", "333", 1),
                ("Alice", "pyram", 1),
                ("Bob", "333", 2),
            ]
        );
        assert_eq!(artifacts.namecards.len(), 4);
        assert!(artifacts.namecards[3].content.events.is_empty());
    }

    #[tokio::test]
    async fn test_transform_rejects_zero_group_size() {
        let table = csv_table::read_table(COMPETITORS.as_bytes()).unwrap();
        let pipeline =
            CompPipeline::with_renderer(MockStorage::new(), MockConfig::new(0), TextRenderer);

        assert!(matches!(
            pipeline.transform(table).await,
            Err(CompError::InvalidConfigValueError { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_writes_run_folder() {
        let storage = MockStorage::new();
        storage.put_file("results.xls", b"template").await;

        let mut config = MockConfig::new(2);
        config.results_template = Some("results.xls".to_string());
        config.archive = true;

        let pipeline = CompPipeline::with_renderer(storage.clone(), config, TextRenderer);
        let table = csv_table::read_table(COMPETITORS.as_bytes()).unwrap();
        let artifacts = pipeline.transform(table).await.unwrap();
        let output = pipeline.load(artifacts).await.unwrap();

        assert!(output.starts_with("test_output/comp_output_"));
        let run_folder = output.trim_start_matches("test_output/").to_string();

        let paths = storage.paths().await;
        for file in [
            GROUPED_CSV_FILE,
            SCORECARD_PDF_FILE,
            NAMECARD_PDF_FILE,
            SUMMARY_JSON_FILE,
            "results.xls",
        ] {
            assert!(paths.contains(&format!("{}/{}", run_folder, file)), "missing {}", file);
        }
        assert!(paths.contains(&format!("{}.zip", run_folder)));

        let csv = storage
            .get_file(&format!("{}/{}", run_folder, GROUPED_CSV_FILE))
            .await
            .unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert!(csv.starts_with("Name,Events,333,pyram\n"));
        assert!(csv.contains("Bob,333,2,\n"));

        let summary = storage
            .get_file(&format!("{}/{}", run_folder, SUMMARY_JSON_FILE))
            .await
            .unwrap();
        let summary: serde_json::Value = serde_json::from_slice(&summary).unwrap();
        assert_eq!(summary["competitors"], 4);
        assert_eq!(summary["events"]["333"]["groups"], 2);
        assert_eq!(summary["scorecards"], 4);
        assert_eq!(summary["namecard_pages"], 1);
        assert!(paths.iter().all(|p| !p.contains(".partial")));
    }

    async fn load_with_failing_storage(suffix: &'static str) -> (MockStorage, Result<String>) {
        let storage = MockStorage::failing_on(suffix);
        let mut config = MockConfig::new(2);
        config.archive = true;

        let pipeline = CompPipeline::with_renderer(storage.clone(), config, TextRenderer);
        let table = csv_table::read_table(COMPETITORS.as_bytes()).unwrap();
        let artifacts = pipeline.transform(table).await.unwrap();
        let result = pipeline.load(artifacts).await;
        (storage, result)
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_run_folder() {
        let (storage, result) = load_with_failing_storage(NAMECARD_PDF_FILE).await;

        assert!(matches!(result, Err(CompError::IoError(_))));
        assert!(storage.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_archive_write_leaves_nothing() {
        let (storage, result) = load_with_failing_storage(".zip").await;

        assert!(result.is_err());
        assert!(storage.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_template_is_not_fatal() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new(2);
        config.results_template = Some("missing/results.xls".to_string());

        let pipeline = CompPipeline::with_renderer(storage.clone(), config, TextRenderer);
        let table = csv_table::read_table(COMPETITORS.as_bytes()).unwrap();
        let artifacts = pipeline.transform(table).await.unwrap();

        assert!(pipeline.load(artifacts).await.is_ok());
        let paths = storage.paths().await;
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| !p.ends_with(".zip")));
    }
}
