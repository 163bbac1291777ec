//! Errors - エラー型と分類
//!
//! - `PasserError`: registry 自身が返すエラー
//! - `ExecuteError<E>`: execute の戻り値。handler のエラーは包まずにそのまま運ぶ
//! - `CodecError`: body の encode/decode 失敗

use std::fmt;

use thiserror::Error;

use super::type_key::TypeKey;

/// ErrorKind は実行エラーの分類
///
/// - Transient: context が先に終了した。handler はまだ動いている可能性がある（結果不明）
/// - Permanent: 登録や envelope の問題。同じ入力で再試行しても無意味
/// - Infrastructure: handler の実行単位そのものが壊れた（panic など）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Codec の失敗
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode codec: {0}")]
    Bincode(#[from] bincode::Error),
}

#[derive(Debug, Error)]
pub enum PasserError {
    /// encode しようとした型に handler が登録されていない
    #[error("type is not registered: {0}")]
    UnregisteredType(TypeKey),

    /// separator が無い、または識別子に対応する handler が無い envelope
    #[error("unknown data type, unable to execute: {reason}")]
    Unrecognized { reason: String },

    /// CollisionPolicy::Reject で同じ型を二重登録した
    #[error("handler for type '{0}' is already registered")]
    AlreadyRegistered(TypeKey),

    /// 識別子に separator が含まれている
    #[error("type key '{0}' contains the envelope separator")]
    InvalidTypeKey(TypeKey),

    #[error("encoding {key} failed: {source}")]
    EncodingFailed {
        key: TypeKey,
        #[source]
        source: CodecError,
    },

    #[error("decoding {key} failed: {source}")]
    DecodingFailed {
        key: TypeKey,
        #[source]
        source: CodecError,
    },

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// handler の実行単位が結果を返さずに終了した
    #[error("handler for {0} panicked")]
    HandlerPanicked(TypeKey),
}

impl PasserError {
    pub(crate) fn unrecognized(reason: impl Into<String>) -> Self {
        Self::Unrecognized {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PasserError::Canceled | PasserError::DeadlineExceeded => ErrorKind::Transient,
            PasserError::HandlerPanicked(_) => ErrorKind::Infrastructure,
            PasserError::UnregisteredType(_)
            | PasserError::Unrecognized { .. }
            | PasserError::AlreadyRegistered(_)
            | PasserError::InvalidTypeKey(_)
            | PasserError::EncodingFailed { .. }
            | PasserError::DecodingFailed { .. } => ErrorKind::Permanent,
        }
    }

    /// context 由来のエラーか（結果不明として扱うべきか）
    pub fn is_context_error(&self) -> bool {
        matches!(self, PasserError::Canceled | PasserError::DeadlineExceeded)
    }

    /// 呼び出し側のリトライ判断用。registry 自身はリトライしない
    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Permanent
    }
}

/// ExecuteError は execute の失敗
///
/// `Handler(E)` は handler が返したエラー値そのもの。
/// Display / source も E に委譲するので、呼び出し側からは素の handler エラーに見えます。
#[derive(Debug)]
pub enum ExecuteError<E> {
    Passer(PasserError),
    Handler(E),
}

impl<E> ExecuteError<E> {
    pub fn passer(&self) -> Option<&PasserError> {
        match self {
            ExecuteError::Passer(err) => Some(err),
            ExecuteError::Handler(_) => None,
        }
    }

    pub fn handler(&self) -> Option<&E> {
        match self {
            ExecuteError::Handler(err) => Some(err),
            ExecuteError::Passer(_) => None,
        }
    }

    pub fn into_handler(self) -> Option<E> {
        match self {
            ExecuteError::Handler(err) => Some(err),
            ExecuteError::Passer(_) => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ExecuteError::Passer(PasserError::Canceled))
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ExecuteError::Passer(PasserError::DeadlineExceeded))
    }
}

impl<E> From<PasserError> for ExecuteError<E> {
    fn from(err: PasserError) -> Self {
        ExecuteError::Passer(err)
    }
}

impl<E: fmt::Display> fmt::Display for ExecuteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Passer(err) => fmt::Display::fmt(err, f),
            ExecuteError::Handler(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl<E> std::error::Error for ExecuteError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecuteError::Passer(err) => std::error::Error::source(err),
            ExecuteError::Handler(err) => std::error::Error::source(err),
        }
    }
}
