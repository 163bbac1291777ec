//! Codec - payload と body bytes の相互変換
//!
//! registry は envelope の枠（識別子 + separator）だけを扱い、
//! body の中身は Codec に任せます。
//!
//! # 実装
//! - `JsonCodec`: serde_json（デフォルト、人間が読める）
//! - `BincodeCodec`: bincode 1.x（小さい、速い）
//!
//! envelope はどの Codec で作られたかを記録しません。
//! encode 側と execute 側で同じ Codec を使ってください。

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use crate::domain::errors::CodecError;

/// Codec は値を body bytes に変換する
///
/// `decode(encode(v))` が `v` と観測上等しい値を返すこと。
/// generic メソッドを持つので object-safe ではなく、Registry の型パラメータとして注入します。
pub trait Codec: Send + Sync + 'static {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// ログ用の名前
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::payload::fixtures::{TestStructA, TestStructB};

    fn sample_b() -> TestStructB {
        let mut family = std::collections::HashMap::new();
        family.insert("parent".to_string(), "alice".to_string());
        TestStructB {
            field_a: 1.5,
            field_b: "b".to_string(),
            family,
        }
    }

    fn assert_reproduces<C: Codec>(codec: C) {
        let a = TestStructA {
            field_a: -7,
            field_b: "execute_test".to_string(),
        };
        let back: TestStructA = codec.decode(&codec.encode(&a).unwrap()).unwrap();
        assert_eq!(back, a);

        let zero = TestStructA::default();
        let back: TestStructA = codec.decode(&codec.encode(&zero).unwrap()).unwrap();
        assert_eq!(back, zero);

        let b = sample_b();
        let back: TestStructB = codec.decode(&codec.encode(&b).unwrap()).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn json_codec_reproduces_values() {
        assert_reproduces(JsonCodec);
    }

    #[test]
    fn bincode_codec_reproduces_values() {
        assert_reproduces(BincodeCodec);
    }

    #[test]
    fn json_codec_reports_garbage() {
        let err = JsonCodec.decode::<TestStructA>(b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn bincode_codec_reports_truncated_input() {
        let err = BincodeCodec.decode::<TestStructA>(&[1, 2]).unwrap_err();
        assert!(matches!(err, CodecError::Bincode(_)));
    }
}
