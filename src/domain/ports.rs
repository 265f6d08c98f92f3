use crate::domain::model::{
    CompetitorTable, GridSpec, Namecard, Placement, RunArtifacts, Scorecard,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 搬移檔案或整個資料夾，目標已存在時覆蓋
    fn rename(&self, from: &str, to: &str)
        -> impl std::future::Future<Output = Result<()>> + Send;
    /// 刪除檔案或整個資料夾；不存在不算錯誤
    fn remove(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn group_size(&self) -> usize;
    fn round(&self) -> u32;
    fn results_template(&self) -> Option<&str>;
    fn archive(&self) -> bool;

    fn scorecard_grid(&self) -> GridSpec {
        GridSpec::SCORECARD
    }

    fn namecard_grid(&self) -> GridSpec {
        GridSpec::NAMECARD
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<CompetitorTable>;
    async fn transform(&self, table: CompetitorTable) -> Result<RunArtifacts>;
    async fn load(&self, artifacts: RunArtifacts) -> Result<String>;
}

/// 把版面配置畫成可列印的文件
pub trait CardRenderer: Send + Sync {
    fn render_scorecards(&self, placements: &[Placement<Scorecard>]) -> Result<Vec<u8>>;
    fn render_namecards(&self, placements: &[Placement<Namecard>]) -> Result<Vec<u8>>;
}
