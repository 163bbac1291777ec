//! RegistryBuilder - Registry の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use super::config::RegistryConfig;
use crate::domain::{PasserError, TypeKey};
use crate::typed::{Codec, Handler, JsonCodec, Payload, Registry};

/// RegistryBuilder は Registry を構築
///
/// # 使用例
/// ```ignore
/// let registry = RegistryBuilder::<Presult, MyError, _>::with_codec(BincodeCodec)
///     .config(RegistryConfig::strict())
///     .register::<Ptype, _>(AppendResult)?
///     .expect::<Ptype>()
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect::<P>() で期待される payload 型を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
pub struct RegistryBuilder<R, E, C = JsonCodec> {
    registry: Registry<R, E, C>,
    expected_types: Vec<TypeKey>,
}

/// BuildError は Registry 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing payload types: {0:?}. These types were expected but not registered.")]
    MissingTypes(Vec<TypeKey>),
}

impl<R, E> RegistryBuilder<R, E, JsonCodec>
where
    R: Send + 'static,
    E: Send + 'static,
{
    /// JsonCodec を使う RegistryBuilder を作成
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl<R, E> Default for RegistryBuilder<R, E, JsonCodec>
where
    R: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E, C> RegistryBuilder<R, E, C>
where
    R: Send + 'static,
    E: Send + 'static,
    C: Codec,
{
    /// codec を指定して作成
    ///
    /// 登録済み handler は codec ごとに型消去されるので、codec は最初に決めます。
    pub fn with_codec(codec: C) -> Self {
        Self {
            registry: Registry::with_codec(codec),
            expected_types: Vec::new(),
        }
    }

    /// 設定を差し替える
    ///
    /// 衝突ポリシーはこれ以降の register に適用されるので、先に呼んでください。
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.registry.set_config(config);
        self
    }

    /// Handler を登録
    ///
    /// # Example
    /// ```ignore
    /// builder.register::<MyPayload, _>(MyHandler)?;
    /// ```
    pub fn register<P, H>(self, handler: H) -> Result<Self, PasserError>
    where
        P: Payload,
        H: Handler<P, R, E>,
    {
        self.registry.register::<P, H>(handler)?;
        Ok(self)
    }

    /// 登録されているべき payload 型を追加
    pub fn expect<P: Payload>(mut self) -> Self {
        self.expected_types.push(P::type_key());
        self
    }

    /// Registry を構築
    ///
    /// # 検証
    /// - expect() で追加された型が全て登録されているかチェック
    /// - 不足があれば BuildError::MissingTypes を返す
    pub fn build(self) -> Result<Registry<R, E, C>, BuildError> {
        let registered_types = self.registry.registered_types();
        let missing_types: Vec<TypeKey> = self
            .expected_types
            .into_iter()
            .filter(|x| !registered_types.contains(x))
            .collect();
        if !missing_types.is_empty() {
            return Err(BuildError::MissingTypes(missing_types));
        }
        Ok(self.registry)
    }
}
