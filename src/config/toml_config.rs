use crate::config::{validate_run_config, DEFAULT_GROUP_SIZE, DEFAULT_OUTPUT_PATH, DEFAULT_ROUND};
use crate::domain::model::GridSpec;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CompError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: RunConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: String,
    pub output_path: Option<String>,
    pub group_size: Option<usize>,
    pub round: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub scorecard: Option<GridOverride>,
    pub namecard: Option<GridOverride>,
}

/// 只覆寫有填的欄位，其餘沿用預設版面
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridOverride {
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub pitch_x: Option<f32>,
    pub pitch_y: Option<f32>,
    pub origin_x: Option<f32>,
    pub origin_y: Option<f32>,
}

impl GridOverride {
    pub fn apply(&self, base: GridSpec) -> GridSpec {
        GridSpec {
            rows: self.rows.unwrap_or(base.rows),
            cols: self.cols.unwrap_or(base.cols),
            pitch_x: self.pitch_x.unwrap_or(base.pitch_x),
            pitch_y: self.pitch_y.unwrap_or(base.pitch_y),
            origin_x: self.origin_x.unwrap_or(base.origin_x),
            origin_y: self.origin_y.unwrap_or(base.origin_y),
            ..base
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub results_template: Option<String>,
    pub archive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${COMP_INPUT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CompError::InvalidConfigValueError {
            field: "env_substitution".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_file(&self) -> &str {
        &self.run.input
    }

    fn output_path(&self) -> &str {
        self.run.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn group_size(&self) -> usize {
        self.run.group_size.unwrap_or(DEFAULT_GROUP_SIZE)
    }

    fn round(&self) -> u32 {
        self.run.round.unwrap_or(DEFAULT_ROUND)
    }

    fn results_template(&self) -> Option<&str> {
        self.output.results_template.as_deref()
    }

    fn archive(&self) -> bool {
        self.output.archive.unwrap_or(false)
    }

    fn scorecard_grid(&self) -> GridSpec {
        match &self.layout.scorecard {
            Some(grid) => grid.apply(GridSpec::SCORECARD),
            None => GridSpec::SCORECARD,
        }
    }

    fn namecard_grid(&self) -> GridSpec {
        match &self.layout.namecard {
            Some(grid) => grid.apply(GridSpec::NAMECARD),
            None => GridSpec::NAMECARD,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_run_config(self)
    }
}
