//! RegistryConfig - registry の設定
//!
//! JSON から読み込めるように serde で定義します。
//! 省略したフィールドはデフォルト値になります。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 同じ型を二重登録したときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// 後から登録した handler で置き換える（last write wins）
    #[default]
    Replace,
    /// 二重登録をエラーにして、最初の handler を残す
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid registry config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RegistryConfig {
    pub fn strict() -> Self {
        Self {
            collision_policy: CollisionPolicy::Reject,
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }
}
