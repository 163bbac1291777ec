//! Payload trait - registry に流せる値の型
//!
//! # 学習ポイント
//! - Blanket impl による marker trait
//! - Trait bounds の組み合わせ (Serialize + DeserializeOwned + Send + 'static)

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::TypeKey;

/// Payload は envelope の body に載せられる型
///
/// serde で往復できて、spawn した handler に move できる型ならすべて Payload です。
/// 個別に impl する必要はありません。
///
/// # Trait Bounds
/// - `Serialize`: encode のため
/// - `DeserializeOwned`: execute 時に body から新しい値を作るため
/// - `Send + 'static`: tokio::spawn した handler に渡すため
pub trait Payload: Serialize + DeserializeOwned + Send + 'static {
    /// registry のキー
    fn type_key() -> TypeKey {
        TypeKey::of::<Self>()
    }
}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + 'static {}


#[cfg(test)]
mod tests {
    use super::fixtures::{TestStructA, TestStructB};
    use super::*;

    #[test]
    fn type_key_follows_rust_type() {
        assert_eq!(TestStructA::type_key(), TypeKey::of::<TestStructA>());
        assert_ne!(TestStructA::type_key(), TestStructB::type_key());
    }
}
