//! 設定 - レジストリの構成（TOML）
//!
//! 起動時に一度だけ読み込み、ストア実装に渡します。
//! [`RegistryConfig::validate`] を通った後は変更しません。
//!
//! # 検証
//! - テーブル名・カラム名は `[A-Za-z_][A-Za-z0-9_]*` のみ
//! - 2 つのテーブル名は別でなければならない
//! - タイムアウトは 0 より大きい
//! - 未知のキーはエラー

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::VersionOrdering;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be a plain SQL identifier, got '{value}'")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("artifact_table and version_table must differ")]
    TableNameClash,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub database: DatabaseConfig,
    pub schema: SchemaNames,
    pub versions: VersionsConfig,
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `None` ならインメモリ DB
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub operation_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5_000,
            operation_timeout_ms: 10_000,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// レジストリの 2 テーブルのテーブル名・カラム名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaNames {
    pub artifact_table: String,
    pub version_table: String,
    pub uid_column: String,
    pub artifact_uid_column: String,
    pub name_column: String,
    pub type_column: String,
    pub version_column: String,
    pub provenance_column: String,
}

impl Default for SchemaNames {
    fn default() -> Self {
        Self {
            artifact_table: "delivery_artifact".into(),
            version_table: "delivery_artifact_version".into(),
            uid_column: "uid".into(),
            artifact_uid_column: "delivery_artifact_uid".into(),
            name_column: "name".into(),
            type_column: "type".into(),
            version_column: "version".into(),
            provenance_column: "provenance".into(),
        }
    }
}

impl SchemaNames {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("schema.artifact_table", &self.artifact_table),
            ("schema.version_table", &self.version_table),
            ("schema.uid_column", &self.uid_column),
            ("schema.artifact_uid_column", &self.artifact_uid_column),
            ("schema.name_column", &self.name_column),
            ("schema.type_column", &self.type_column),
            ("schema.version_column", &self.version_column),
            ("schema.provenance_column", &self.provenance_column),
        ];
        for (field, value) in fields {
            if !is_identifier(value) {
                return Err(ConfigError::InvalidIdentifier {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.artifact_table.eq_ignore_ascii_case(&self.version_table) {
            return Err(ConfigError::TableNameClash);
        }
        Ok(())
    }
}

// 名前は SQL に埋め込まれるので [A-Za-z_][A-Za-z0-9_]* だけを通す
fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionsConfig {
    pub ordering: VersionOrdering,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracingConfig {
    pub trace_timeout_ms: u64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            trace_timeout_ms: 1_000,
        }
    }
}

impl TracingConfig {
    pub fn trace_timeout(&self) -> Duration {
        Duration::from_millis(self.trace_timeout_ms)
    }
}

impl RegistryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema.validate()?;
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("database.busy_timeout_ms"));
        }
        if self.database.operation_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("database.operation_timeout_ms"));
        }
        if self.tracing.trace_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("tracing.trace_timeout_ms"));
        }
        Ok(())
    }
}
