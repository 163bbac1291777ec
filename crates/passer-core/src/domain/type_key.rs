//! TypeKey - payload 型の識別子
//!
//! Registry のキーであり、envelope の先頭に書かれる文字列です。
//! `std::any::type_name` から導出するため、同一プロセス内では安定しています。
//!
//! # 注意
//! - `type_name` の出力はコンパイラのバージョン間で保証されません
//! - envelope をプロセス間で受け渡す場合は、同じビルドを使う前提です

use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;

/// TypeKey は payload の具体型を表す識別子
///
/// # 例
/// ```ignore
/// let key = TypeKey::of::<Ptype>();
/// assert_eq!(key.as_str(), "my_crate::Ptype");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    /// 型パラメータから TypeKey を導出
    pub fn of<T: ?Sized>() -> Self {
        Self(type_name::<T>().to_string())
    }

    /// サンプル値の型から TypeKey を導出
    ///
    /// 値そのものは使わず、型だけを見ます。
    pub fn of_val<T: ?Sized>(_sample: &T) -> Self {
        Self::of::<T>()
    }

    /// envelope から取り出した識別子をそのまま包む
    pub(crate) fn from_wire(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn same_type_yields_same_key() {
        assert_eq!(TypeKey::of::<Alpha>(), TypeKey::of::<Alpha>());
        assert_eq!(TypeKey::of_val(&Alpha), TypeKey::of::<Alpha>());
    }

    #[test]
    fn distinct_types_yield_distinct_keys() {
        assert_ne!(TypeKey::of::<Alpha>(), TypeKey::of::<Beta>());
        assert_ne!(TypeKey::of::<Vec<u8>>(), TypeKey::of::<Vec<u16>>());
    }

    #[test]
    fn key_is_fully_qualified() {
        let key = TypeKey::of::<Alpha>();
        assert!(key.as_str().ends_with("::Alpha"));
        assert!(key.as_str().contains("type_key"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = TypeKey::of::<u32>();
        let s = serde_json::to_string(&key).unwrap();
        assert_eq!(s, "\"u32\"");
    }
}
