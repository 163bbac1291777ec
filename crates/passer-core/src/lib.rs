//! passer-core
//!
//! Typed dispatch-and-execution registry.
//!
//! 型ごとに handler を登録し、値を自己記述的な envelope にして、
//! 後から同じ（または別の）呼び出し側がその envelope を正しい handler で実行します。
//!
//! # モジュール構成
//! - **domain**: TypeKey, envelope, Context, エラー, Outcome
//! - **typed**: Payload, Handler, Codec, Registry
//! - **app**: RegistryConfig, RegistryBuilder
//! - **observability**: 実行結果のカウンタ
//!
//! # 使用例
//! ```ignore
//! let registry = Registry::<Presult, MyError>::new();
//! registry.register::<Ptype, _>(|_ctx: Context, p: Ptype| async move {
//!     Ok(Presult { key: format!("{}+result", p.key) })
//! })?;
//!
//! let data = registry.encode(&Ptype { key: "haha".into() })?;
//! let out = registry.execute(&Context::background(), &data).await?;
//! assert_eq!(out.key, "haha+result");
//! ```

pub mod domain;
pub mod typed;
pub mod app;
pub mod observability;

pub use crate::app::{CollisionPolicy, RegistryBuilder, RegistryConfig};
pub use crate::domain::{Context, DoneReason, ExecuteError, Outcome, PasserError, TypeKey};
pub use crate::observability::ExecutionCounts;
pub use crate::typed::{BincodeCodec, Codec, Handler, JsonCodec, Payload, Registration, Registry};
