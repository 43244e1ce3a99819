use crate::core::matching::MatchStrategy;
use crate::core::{ConfigProvider, WritePolicy};
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub sync: SyncSection,
    pub service_a: ServiceConfig,
    pub service_b: ServiceConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_sync_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub concurrent: bool,
    #[serde(default)]
    pub write_policy: WritePolicy,
    #[serde(default)]
    pub matching: MatchStrategy,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            name: default_sync_name(),
            concurrent: true,
            write_policy: WritePolicy::default(),
            matching: MatchStrategy::default(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_watchlist_path")]
    pub watchlist_path: String,
    /// 寫入時 JSON body 的欄位名稱
    #[serde(default = "default_payload_field")]
    pub payload_field: String,
    /// 回應若是物件，清單所在的欄位
    pub items_field: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthConfig {
    /// `Authorization: Bearer <token>`
    Bearer { token: String },
    /// Token sent in a custom header, e.g. `X-Plex-Token`.
    Header { header: String, token: String },
}

impl AuthConfig {
    pub fn token(&self) -> &str {
        match self {
            AuthConfig::Bearer { token } | AuthConfig::Header { token, .. } => token,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_sync_name() -> String {
    "watchlist-sync".to_string()
}

fn default_true() -> bool {
    true
}

fn default_watchlist_path() -> String {
    "watchlist".to_string()
}

fn default_payload_field() -> String {
    "item".to_string()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let to_parse_error = |e: &dyn std::fmt::Display| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        };

        // 先解析再替換，token 內的引號或反斜線不會破壞 TOML 語法
        let table: toml::Table = toml::from_str(content).map_err(|e| to_parse_error(&e))?;
        let mut value = toml::Value::Table(table);
        Self::substitute_env_vars(&mut value);

        value.try_into().map_err(|e| to_parse_error(&e))
    }

    /// 替換字串值中的環境變數 (例如 ${PLEX_API_KEY})，未設定的保留原樣
    fn substitute_env_vars(value: &mut toml::Value) {
        match value {
            toml::Value::String(text) => {
                if env_var_pattern().is_match(text) {
                    *text = env_var_pattern()
                        .replace_all(text, |caps: &regex::Captures| {
                            let var_name = &caps[1];
                            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
                        })
                        .into_owned();
                }
            }
            toml::Value::Array(items) => items.iter_mut().for_each(Self::substitute_env_vars),
            toml::Value::Table(table) => {
                table.iter_mut().for_each(|(_, v)| Self::substitute_env_vars(v))
            }
            _ => {}
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("sync.name", &self.sync.name)?;
        validate_service("service_a", &self.service_a)?;
        validate_service("service_b", &self.service_b)?;

        if self.service_a.name == self.service_b.name {
            return Err(SyncError::InvalidConfigValueError {
                field: "service_b.name".to_string(),
                value: self.service_b.name.clone(),
                reason: "Both services share the same name".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_service(prefix: &str, service: &ServiceConfig) -> Result<()> {
    validation::validate_non_empty_string(&format!("{}.name", prefix), &service.name)?;
    validation::validate_url(&format!("{}.base_url", prefix), &service.base_url)?;
    validation::validate_non_empty_string(
        &format!("{}.payload_field", prefix),
        &service.payload_field,
    )?;
    validation::validate_token(&format!("{}.auth.token", prefix), service.auth.token())?;

    if let AuthConfig::Header { header, .. } = &service.auth {
        validation::validate_header_name(&format!("{}.auth.header", prefix), header)?;
    }

    if let Some(timeout) = service.timeout_seconds {
        validation::validate_range(&format!("{}.timeout_seconds", prefix), timeout, 1, 600)?;
    }

    Ok(())
}

impl ConfigProvider for SyncConfig {
    fn concurrent(&self) -> bool {
        self.sync.concurrent
    }

    fn write_policy(&self) -> WritePolicy {
        self.sync.write_policy
    }

    fn match_strategy(&self) -> MatchStrategy {
        self.sync.matching
    }

    fn dry_run(&self) -> bool {
        self.sync.dry_run
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
