//! Envelope - 自己記述的なバイト列
//!
//! `<type key bytes><SEPARATOR><body bytes>`
//!
//! - 識別子は最初の SEPARATOR までの部分
//! - body は SEPARATOR の後ろ全部（body 内に SEPARATOR が含まれていても良い）
//! - body を作った codec は envelope に書かれない。encode 側と execute 側で合わせること

use super::errors::PasserError;
use super::type_key::TypeKey;

/// 識別子と body の区切り
pub const SEPARATOR: &[u8] = b"!?@#";

/// TypeKey と body から envelope を組み立てる
pub fn encode(key: &TypeKey, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.as_bytes().len() + SEPARATOR.len() + body.len());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(SEPARATOR);
    buf.extend_from_slice(body);
    buf
}

/// 識別子に SEPARATOR が含まれていないか
pub fn is_valid_key(key: &TypeKey) -> bool {
    find_separator(key.as_bytes()).is_none()
}

fn find_separator(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(SEPARATOR.len())
        .position(|window| window == SEPARATOR)
}

/// 解析済みの envelope（入力バッファを借用する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    type_key: &'a str,
    body: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// 最初の SEPARATOR で分割する
    ///
    /// separator が無い、または識別子が UTF-8 でなければ `Unrecognized`。
    pub fn parse(bytes: &'a [u8]) -> Result<Self, PasserError> {
        let idx = find_separator(bytes)
            .ok_or_else(|| PasserError::unrecognized("envelope has no type separator"))?;

        let type_key = std::str::from_utf8(&bytes[..idx])
            .map_err(|_| PasserError::unrecognized("type identifier is not valid utf-8"))?;

        Ok(Self {
            type_key,
            body: &bytes[idx + SEPARATOR.len()..],
        })
    }

    pub fn type_key(&self) -> TypeKey {
        TypeKey::from_wire(self.type_key)
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Sample;

    #[test]
    fn parse_recovers_key_and_body() {
        let key = TypeKey::of::<Sample>();
        let data = encode(&key, br#"{"Key":"haha"}"#);

        let env = Envelope::parse(&data).unwrap();
        assert_eq!(env.type_key(), key);
        assert_eq!(env.body(), br#"{"Key":"haha"}"#);
    }

    #[test]
    fn parse_splits_at_first_separator() {
        let data = b"a::B!?@#body!?@#more".to_vec();

        let env = Envelope::parse(&data).unwrap();
        assert_eq!(env.type_key().as_str(), "a::B");
        assert_eq!(env.body(), b"body!?@#more");
    }

    #[test]
    fn empty_body_is_valid_framing() {
        let data = encode(&TypeKey::of::<Sample>(), b"");
        let env = Envelope::parse(&data).unwrap();
        assert!(env.body().is_empty());
    }

    #[rstest]
    #[case::plain_text(b"invalid serialized data".as_slice())]
    #[case::empty(b"".as_slice())]
    #[case::partial_separator(b"a::B!?@".as_slice())]
    fn parse_rejects_missing_separator(#[case] data: &[u8]) {
        let err = Envelope::parse(data).unwrap_err();
        assert!(matches!(err, PasserError::Unrecognized { .. }));
    }

    #[test]
    fn parse_rejects_non_utf8_identifier() {
        let data = [0xff, 0xfe, b'!', b'?', b'@', b'#', b'x'];
        let err = Envelope::parse(&data).unwrap_err();
        assert!(matches!(err, PasserError::Unrecognized { .. }));
    }

    #[test]
    fn rust_type_names_never_contain_separator() {
        assert!(is_valid_key(&TypeKey::of::<Sample>()));
        assert!(is_valid_key(&TypeKey::of::<std::collections::HashMap<String, Vec<u8>>>()));
        assert!(!is_valid_key(&TypeKey::from_wire("bad!?@#key")));
    }
}
