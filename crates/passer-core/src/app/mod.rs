//! App - 起動時の組み立て
//!
//! # 主要コンポーネント
//! - **RegistryConfig**: 衝突ポリシーなどの設定
//! - **RegistryBuilder**: Registry の構築と起動時検証

pub mod builder;
pub mod config;

pub use self::builder::{BuildError, RegistryBuilder};
pub use self::config::{CollisionPolicy, ConfigError, RegistryConfig};
