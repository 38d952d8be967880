use crate::core::remap::KeyRemap;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub migration: MigrationInfo,
    pub catalog: CatalogConfig,
    pub aws: Option<AwsConfig>,
    pub jobs: Vec<JobConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationInfo {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// Catalog section: logical table names to physical DynamoDB tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub database: String,
    pub tables: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
    pub remap: KeyRemap,
    pub source: JobSourceConfig,
    pub load: JobLoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSourceConfig {
    pub catalog_table: String,
    pub scan_page_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLoadConfig {
    pub table_name: String,
    pub throughput_write_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl MigrationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AWS_REGION})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_non_empty_string(
            "migration.name",
            &self.migration.name,
        )?;
        crate::utils::validation::validate_non_empty_string(
            "catalog.database",
            &self.catalog.database,
        )?;

        if self.catalog.tables.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "catalog.tables".to_string(),
            });
        }

        if self.jobs.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "jobs".to_string(),
            });
        }

        let mut seen_names = HashSet::new();
        for job in &self.jobs {
            crate::utils::validation::validate_non_empty_string("jobs.name", &job.name)?;

            if !seen_names.insert(job.name.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "jobs.name".to_string(),
                    value: job.name.clone(),
                    reason: "Duplicate job name".to_string(),
                });
            }

            // 來源必須對應到 catalog 中登記的資料表
            if !self.catalog.tables.contains_key(&job.source.catalog_table) {
                let mut known: Vec<&str> =
                    self.catalog.tables.keys().map(|k| k.as_str()).collect();
                known.sort_unstable();
                return Err(EtlError::InvalidConfigValueError {
                    field: "jobs.source.catalog_table".to_string(),
                    value: job.source.catalog_table.clone(),
                    reason: format!("Not in catalog.tables (known: {})", known.join(", ")),
                });
            }

            crate::utils::validation::validate_non_empty_string(
                "jobs.load.table_name",
                &job.load.table_name,
            )?;

            if let Some(percent) = job.load.throughput_write_percent {
                crate::utils::validation::validate_write_percent(
                    "jobs.load.throughput_write_percent",
                    percent,
                )?;
            }

            if let Some(page_size) = job.source.scan_page_size {
                crate::utils::validation::validate_positive_number(
                    "jobs.source.scan_page_size",
                    page_size.max(0) as usize,
                    1,
                )?;
            }
        }

        if let Some(aws) = &self.aws {
            if let Some(endpoint) = &aws.endpoint_url {
                crate::utils::validation::validate_url("aws.endpoint_url", endpoint)?;
            }
        }

        Ok(())
    }

    /// 依名稱取得遷移任務
    pub fn job(&self, name: &str) -> Result<&JobConfig> {
        self.jobs
            .iter()
            .find(|job| job.name == name)
            .ok_or_else(|| EtlError::UnknownJobError {
                name: name.to_string(),
                available: self.job_names().join(", "),
            })
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|job| job.name.as_str()).collect()
    }

    /// 取得 catalog 資料表對應的實體資料表名稱
    pub fn physical_table(&self, catalog_table: &str) -> Result<&str> {
        self.catalog
            .tables
            .get(catalog_table)
            .map(|name| name.as_str())
            .ok_or_else(|| EtlError::MissingConfigError {
                field: format!("catalog.tables.{}", catalog_table),
            })
    }

    pub fn database(&self) -> &str {
        &self.catalog.database
    }

    pub fn region(&self) -> Option<&str> {
        self.aws.as_ref().and_then(|aws| aws.region.as_deref())
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.aws.as_ref().and_then(|aws| aws.endpoint_url.as_deref())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
