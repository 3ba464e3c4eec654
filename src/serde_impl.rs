use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::SecurityIdentifier;

impl Serialize for SecurityIdentifier {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.to_bytes())
        }
    }
}

struct SidVisitor;

impl<'de> de::Visitor<'de> for SidVisitor {
    type Value = SecurityIdentifier;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a SID as a string (e.g., \"S-1-...\") or as raw binary")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        SecurityIdentifier::from_bytes(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Bytes(v), &self))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        self.visit_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for SecurityIdentifier {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(SidVisitor)
        } else {
            deserializer.deserialize_bytes(SidVisitor)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use crate::sid;
    use crate::{SecurityIdentifier, arb_security_identifier};
    use proptest::prelude::*;
    use serde_test::{Configure, Token, assert_de_tokens_error, assert_tokens};

    #[test]
    fn readable_tokens() {
        let sid = sid!("S-1-5-21-9-9-9");
        assert_tokens(&sid.readable(), &[Token::Str("S-1-5-21-9-9-9")]);
    }

    #[test]
    fn compact_tokens() {
        let sid = sid!("S-1-5-32-544");
        assert_tokens(
            &sid.compact(),
            &[Token::Bytes(&[1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 32, 2, 0, 0])],
        );
    }

    #[test]
    fn invalid_string_is_rejected() {
        assert_de_tokens_error::<serde_test::Readable<SecurityIdentifier>>(
            &[Token::Str("not-a-sid")],
            "invalid value: string \"not-a-sid\", expected a SID as a string (e.g., \"S-1-...\") or as raw binary",
        );
    }

    proptest! {
        #[test]
        fn json_round_trip(sid in arb_security_identifier()) {
            let json = serde_json::to_string(&sid).unwrap();
            prop_assert_eq!(&json, &format!("\"{sid}\""));
            let back: SecurityIdentifier = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, sid);
        }
    }
}
