//! Domain model (type keys, envelopes, contexts, errors, outcomes).
//!
//! transport や handler の実装には依存しない純粋な型だけを置きます。

pub mod type_key;
pub mod envelope;
pub mod context;
pub mod errors;
pub mod outcome;

pub use self::type_key::TypeKey;
pub use self::envelope::{Envelope, SEPARATOR};
pub use self::context::{Context, DoneReason};
pub use self::errors::{CodecError, ErrorKind, ExecuteError, PasserError};
pub use self::outcome::Outcome;
