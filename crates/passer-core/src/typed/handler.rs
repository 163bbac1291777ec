//! Handler trait - payload を処理する Handler の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<P, R, E>)
//! - Object-safe trait (DynHandler)
//! - Type erasure パターン (TypedHandler<P, H> → DynHandler)
//! - `self: Arc<Self>` receiver で 'static な future を作る

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::codec::Codec;
use super::payload::Payload;
use crate::domain::{Context, PasserError, TypeKey};

/// Handler は payload を受け取って結果を返す
///
/// # 使用例
/// ```ignore
/// struct AppendResult;
///
/// #[async_trait]
/// impl Handler<Ptype, Presult, MyError> for AppendResult {
///     async fn handle(&self, _ctx: Context, p: Ptype) -> Result<Presult, MyError> {
///         Ok(Presult { key: format!("{}+result", p.key) })
///     }
/// }
/// ```
///
/// `Fn(Context, P) -> impl Future<Output = Result<R, E>>` のクロージャもそのまま Handler になります。
///
/// # キャンセル
/// 長く動く handler は `ctx.done()` を監視して自分で終了してください。
/// registry は待つのをやめるだけで、handler を止めません。
#[async_trait]
pub trait Handler<P, R, E>: Send + Sync + 'static
where
    P: Payload,
    R: Send + 'static,
    E: Send + 'static,
{
    async fn handle(&self, ctx: Context, payload: P) -> Result<R, E>;
}

#[async_trait]
impl<P, R, E, F, Fut> Handler<P, R, E> for F
where
    P: Payload,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(Context, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    async fn handle(&self, ctx: Context, payload: P) -> Result<R, E> {
        (self)(ctx, payload).await
    }
}

/// DynHandler は payload 型を消去した Handler
///
/// TypedHandler<P, H> を DynHandler に変換することで、
/// HashMap<TypeKey, Arc<dyn DynHandler<R, E, C>>> に格納可能にします。
///
/// # Object Safety
/// - payload 型 P は trait に現れない
/// - `self: Arc<Self>` は dispatch 可能な receiver
pub trait DynHandler<R, E, C: Codec>: Send + Sync {
    /// body を decode して、spawn できる future を返す
    ///
    /// decode に失敗したら handler は呼ばれず `DecodingFailed`。
    fn prepare(
        self: Arc<Self>,
        codec: &C,
        ctx: Context,
        body: &[u8],
    ) -> Result<BoxFuture<'static, Result<R, E>>, PasserError>;

    fn type_key(&self) -> &TypeKey;
}

pub struct TypedHandler<P, H> {
    handler: H,
    key: TypeKey,
    _marker: PhantomData<fn() -> P>,
}

impl<P: Payload, H> TypedHandler<P, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            key: P::type_key(),
            _marker: PhantomData,
        }
    }
}

impl<P, H, R, E, C> DynHandler<R, E, C> for TypedHandler<P, H>
where
    P: Payload,
    H: Handler<P, R, E>,
    R: Send + 'static,
    E: Send + 'static,
    C: Codec,
{
    fn prepare(
        self: Arc<Self>,
        codec: &C,
        ctx: Context,
        body: &[u8],
    ) -> Result<BoxFuture<'static, Result<R, E>>, PasserError> {
        let payload: P = codec
            .decode(body)
            .map_err(|source| PasserError::DecodingFailed {
                key: self.key.clone(),
                source,
            })?;

        Ok(Box::pin(async move { self.handler.handle(ctx, payload).await }))
    }

    fn type_key(&self) -> &TypeKey {
        &self.key
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{AppendResultHandler, Presult};
    use super::*;
    use crate::typed::codec::{BincodeCodec, JsonCodec};
    use crate::typed::payload::fixtures::{Ptype, TestStructA};

    #[tokio::test]
    async fn test_typed_handler() {
        let typed = Arc::new(TypedHandler::<Ptype, _>::new(AppendResultHandler));
        let body = JsonCodec
            .encode(&Ptype {
                key: "haha".to_string(),
            })
            .unwrap();

        let fut = DynHandler::<Presult, String, JsonCodec>::prepare(
            typed,
            &JsonCodec,
            Context::background(),
            &body,
        )
        .unwrap();
        assert_eq!(
            fut.await,
            Ok(Presult {
                key: "haha+result".to_string()
            })
        );
    }

    #[tokio::test]
    async fn closure_is_a_handler() {
        let handler = |_ctx: Context, input: TestStructA| async move {
            Ok::<_, String>(input.field_b)
        };
        let typed = Arc::new(TypedHandler::<TestStructA, _>::new(handler));
        let body = BincodeCodec
            .encode(&TestStructA {
                field_a: 1,
                field_b: "from closure".to_string(),
            })
            .unwrap();

        let fut = DynHandler::<String, String, BincodeCodec>::prepare(
            typed,
            &BincodeCodec,
            Context::background(),
            &body,
        )
        .unwrap();
        assert_eq!(fut.await, Ok("from closure".to_string()));
    }

    #[test]
    fn prepare_reports_decode_failure_without_calling_handler() {
        let typed = Arc::new(TypedHandler::<Ptype, _>::new(AppendResultHandler));
        let result = DynHandler::<Presult, String, JsonCodec>::prepare(
            typed,
            &JsonCodec,
            Context::background(),
            b"{broken",
        );
        assert!(matches!(result, Err(PasserError::DecodingFailed { .. })));
    }

    #[test]
    fn type_key_is_payload_type() {
        let typed = TypedHandler::<Ptype, _>::new(AppendResultHandler);
        let key = DynHandler::<Presult, String, JsonCodec>::type_key(&typed);
        assert_eq!(key, &TypeKey::of::<Ptype>());
    }
}
