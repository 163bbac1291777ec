//! Registry - Handler の登録と envelope の実行
//!
//! # 学習ポイント
//! - Mutex<HashMap> で型消去された trait object を共有管理
//! - ロックは map の読み書きの間だけ保持し、codec と handler はロックの外で動かす
//! - tokio::spawn + oneshot + select! によるキャンセル競合
//!
//! # execute の状態遷移
//! Parsing → Lookup → Decoding → Dispatched → { Completed | TimedOut | Canceled }
//!
//! 内部でのリトライはしません。

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::codec::{Codec, JsonCodec};
use super::handler::{DynHandler, Handler, TypedHandler};
use super::payload::Payload;
use crate::app::config::{CollisionPolicy, RegistryConfig};
use crate::domain::envelope::{self, Envelope};
use crate::domain::{Context, ExecuteError, Outcome, PasserError, TypeKey};
use crate::observability::{ExecutionCounts, OutcomeCounters};

type HandlerMap<R, E, C> = HashMap<TypeKey, Arc<dyn DynHandler<R, E, C>>>;

/// register の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 新しく登録した
    Inserted,
    /// 既存の handler を置き換えた（CollisionPolicy::Replace）
    Replaced,
}

/// Registry は型ごとの Handler を管理し、envelope を実行する
///
/// # 使用例
/// ```ignore
/// let registry = Arc::new(Registry::<Presult, MyError>::new());
/// registry.register::<Ptype, _>(AppendResult)?;
///
/// let data = registry.encode(&Ptype { key: "haha".into() })?;
/// let ctx = Context::background().with_timeout(Duration::from_secs(1));
/// let result = registry.execute(&ctx, &data).await?;
/// ```
///
/// # 型パラメータ
/// - `R`: すべての handler が返す結果型
/// - `E`: handler のドメインエラー型（execute はこれを包まずに返す）
/// - `C`: body の Codec（構築時に注入）
pub struct Registry<R, E, C = JsonCodec> {
    handlers: Mutex<HandlerMap<R, E, C>>,
    codec: C,
    config: RegistryConfig,
    counters: OutcomeCounters,
}

impl<R, E> Registry<R, E, JsonCodec>
where
    R: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl<R, E> Default for Registry<R, E, JsonCodec>
where
    R: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E, C> Registry<R, E, C>
where
    R: Send + 'static,
    E: Send + 'static,
    C: Codec,
{
    pub fn with_codec(codec: C) -> Self {
        Self::with_config(codec, RegistryConfig::default())
    }

    pub fn with_config(codec: C, config: RegistryConfig) -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            codec,
            config,
            counters: OutcomeCounters::default(),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: RegistryConfig) {
        self.config = config;
    }

    // handler は map の中で常に完全な状態なので、poison は無視して良い
    fn table(&self) -> MutexGuard<'_, HandlerMap<R, E, C>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &TypeKey) -> Option<Arc<dyn DynHandler<R, E, C>>> {
        self.table().get(key).cloned()
    }

    /// payload 型 P の handler を登録
    ///
    /// 同じ型の handler が既にある場合は CollisionPolicy に従います。
    /// - Replace: 置き換えて `Registration::Replaced`
    /// - Reject: `PasserError::AlreadyRegistered`、既存の handler は残る
    pub fn register<P, H>(&self, handler: H) -> Result<Registration, PasserError>
    where
        P: Payload,
        H: Handler<P, R, E>,
    {
        let key = P::type_key();
        if !envelope::is_valid_key(&key) {
            return Err(PasserError::InvalidTypeKey(key));
        }
        let entry: Arc<dyn DynHandler<R, E, C>> = Arc::new(TypedHandler::<P, H>::new(handler));

        let registration = {
            let mut table = self.table();
            match table.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                    Registration::Inserted
                }
                Entry::Occupied(mut slot) => match self.config.collision_policy {
                    CollisionPolicy::Replace => {
                        slot.insert(entry);
                        Registration::Replaced
                    }
                    CollisionPolicy::Reject => {
                        return Err(PasserError::AlreadyRegistered(key));
                    }
                },
            }
        };

        match registration {
            Registration::Inserted => debug!(type_key = %key, "handler registered"),
            Registration::Replaced => warn!(type_key = %key, "handler replaced"),
        }
        Ok(registration)
    }

    /// サンプル値の型で登録（値そのものは使わない）
    pub fn register_for<P, H>(&self, _sample: &P, handler: H) -> Result<Registration, PasserError>
    where
        P: Payload,
        H: Handler<P, R, E>,
    {
        self.register::<P, H>(handler)
    }

    pub fn has_registration<P: Payload>(&self) -> bool {
        self.table().contains_key(&P::type_key())
    }

    pub fn has_registration_for<P: Payload>(&self, _sample: &P) -> bool {
        self.has_registration::<P>()
    }

    /// 登録済みの TypeKey（ソート済み）
    pub fn registered_types(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.table().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn counts(&self) -> ExecutionCounts {
        self.counters.snapshot()
    }

    /// value を envelope に変換
    ///
    /// 未登録の型は `UnregisteredType`。後で実行できないデータは作りません。
    pub fn encode<P: Payload>(&self, value: &P) -> Result<Vec<u8>, PasserError> {
        let key = P::type_key();
        if !self.table().contains_key(&key) {
            return Err(PasserError::UnregisteredType(key));
        }

        let body = self
            .codec
            .encode(value)
            .map_err(|source| PasserError::EncodingFailed {
                key: key.clone(),
                source,
            })?;

        trace!(type_key = %key, codec = self.codec.name(), body_len = body.len(), "encoded envelope");
        Ok(envelope::encode(&key, &body))
    }

    /// envelope を解析して handler を実行
    ///
    /// - handler は tokio::spawn された別タスクで動き、結果は oneshot で受け取る
    /// - ctx が先に終了したら `Canceled` / `DeadlineExceeded` を即座に返す
    ///   （handler は止めない。結果は不明として扱うこと）
    /// - handler が先に終わったら、その Result をそのまま返す
    pub async fn execute(&self, ctx: &Context, data: &[u8]) -> Result<R, ExecuteError<E>> {
        let result = self.dispatch(ctx, data).await;
        self.counters.record(Outcome::of(&result));
        result
    }

    async fn dispatch(&self, ctx: &Context, data: &[u8]) -> Result<R, ExecuteError<E>> {
        // Parsing
        let envelope = Envelope::parse(data)?;
        let key = envelope.type_key();

        // Lookup（ロックはこの間だけ保持）
        let handler = self.lookup(&key).ok_or_else(|| {
            PasserError::unrecognized(format!("no handler registered for {key}"))
        })?;

        // Decoding（prepare は handler を消費するので key は先に取る）
        let task_key = handler.type_key().clone();
        let task = handler.prepare(&self.codec, ctx.clone(), envelope.body())?;

        // 既に終了している context では handler を起動しない
        if let Some(reason) = ctx.err() {
            debug!(type_key = %key, %reason, "context done before dispatch");
            return Err(PasserError::from(reason).into());
        }

        // Dispatched
        // oneshot は容量 1 で send がブロックしない。受信側が居なくなっていたら捨てるだけ
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = task.await;
            if tx.send(outcome).is_err() {
                trace!(type_key = %task_key, "execute caller stopped waiting, dropping handler result");
            }
        });

        tokio::select! {
            biased;
            reason = ctx.done() => {
                warn!(type_key = %key, %reason, "stopped waiting for running handler");
                Err(PasserError::from(reason).into())
            }
            received = rx => match received {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(ExecuteError::Handler(err)),
                Err(_) => {
                    warn!(type_key = %key, "handler task ended without a result");
                    Err(PasserError::HandlerPanicked(key).into())
                }
            },
        }
    }
}
