//! Typed - 型付き dispatch API
//!
//! payload の Rust 型をそのまま registry のキーにして、
//! Handler との対応付けを型で保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Payload` trait, `Handler<P, R, E>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod payload;
pub mod handler;
pub mod registry;
pub mod codec;

// 主要な trait/型 を再エクスポート
pub use self::payload::Payload;
pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::registry::{Registration, Registry};
pub use self::codec::{BincodeCodec, Codec, CodecError, JsonCodec};
