//! Extracted token records.
//!
//! Every accepted word becomes an immutable `TokenValue`. Submission hands
//! an ordered slice of these to the registered application callback.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// Classification of an extracted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// A fixed command keyword.
    Keyword,
    /// The negation keyword (`no`).
    Negation,
    /// A typed value accepted by a leaf slot.
    Value,
}

/// Typed value slot kinds accepted by leaf nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafType {
    Int,
    String,
    Ipv4,
    Ipv6,
    Float,
    Bool,
}

impl LeafType {
    /// Built-in type validation over the raw token text.
    ///
    /// Semantic checks beyond the type itself (ranges, name registries,
    /// patterns) belong to the application validator.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            LeafType::Int => text.parse::<i64>().is_ok(),
            LeafType::String => !text.is_empty(),
            LeafType::Ipv4 => text.parse::<Ipv4Addr>().is_ok(),
            LeafType::Ipv6 => text.parse::<Ipv6Addr>().is_ok(),
            LeafType::Float => text.parse::<f64>().is_ok(),
            LeafType::Bool => matches!(text, "true" | "false"),
        }
    }

    /// Placeholder shown in help listings, e.g. `<ipv4>`.
    pub fn placeholder(self) -> &'static str {
        match self {
            LeafType::Int => "<int>",
            LeafType::String => "<string>",
            LeafType::Ipv4 => "<ipv4>",
            LeafType::Ipv6 => "<ipv6>",
            LeafType::Float => "<float>",
            LeafType::Bool => "<bool>",
        }
    }
}

/// An immutable extracted token record: `(kind, type, id, text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValue {
    kind: TokenKind,
    leaf_type: LeafType,
    leaf_id: u32,
    text: String,
}

impl TokenValue {
    /// Record for an accepted command keyword.
    pub fn keyword(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Keyword,
            leaf_type: LeafType::String,
            leaf_id: 0,
            text: text.into(),
        }
    }

    /// Record for the accepted negation keyword.
    pub fn negation(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Negation,
            leaf_type: LeafType::String,
            leaf_id: 0,
            text: text.into(),
        }
    }

    /// Record for a typed value accepted by a leaf slot.
    pub fn value(leaf_type: LeafType, leaf_id: u32, text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Value,
            leaf_type,
            leaf_id,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn leaf_type(&self) -> LeafType {
        self.leaf_type
    }

    /// Application-chosen slot id (0 for keywords).
    pub fn leaf_id(&self) -> u32 {
        self.leaf_id
    }

    /// The raw text as typed (after auto-completion).
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- LeafType built-in validation --

    #[test]
    fn int_accepts_signed() {
        assert!(LeafType::Int.accepts("42"));
        assert!(LeafType::Int.accepts("-7"));
        assert!(!LeafType::Int.accepts("4.2"));
        assert!(!LeafType::Int.accepts("forty"));
    }

    #[test]
    fn string_rejects_empty() {
        assert!(LeafType::String.accepts("eth0"));
        assert!(!LeafType::String.accepts(""));
    }

    #[test]
    fn ipv4_accepts_dotted_quad() {
        assert!(LeafType::Ipv4.accepts("10.0.0.1"));
        assert!(!LeafType::Ipv4.accepts("10.0.0"));
        assert!(!LeafType::Ipv4.accepts("256.0.0.1"));
    }

    #[test]
    fn ipv6_accepts_colon_hex() {
        assert!(LeafType::Ipv6.accepts("::1"));
        assert!(LeafType::Ipv6.accepts("fe80::1"));
        assert!(!LeafType::Ipv6.accepts("10.0.0.1"));
    }

    #[test]
    fn float_accepts_decimal() {
        assert!(LeafType::Float.accepts("3.25"));
        assert!(LeafType::Float.accepts("10"));
        assert!(!LeafType::Float.accepts("ten"));
    }

    #[test]
    fn bool_accepts_exact_words() {
        assert!(LeafType::Bool.accepts("true"));
        assert!(LeafType::Bool.accepts("false"));
        assert!(!LeafType::Bool.accepts("yes"));
        assert!(!LeafType::Bool.accepts("True"));
    }

    #[test]
    fn placeholder_strings() {
        assert_eq!(LeafType::Ipv4.placeholder(), "<ipv4>");
        assert_eq!(LeafType::Int.placeholder(), "<int>");
    }

    // -- TokenValue construction --

    #[test]
    fn keyword_record() {
        let t = TokenValue::keyword("show");
        assert_eq!(t.kind(), TokenKind::Keyword);
        assert_eq!(t.leaf_id(), 0);
        assert_eq!(t.text(), "show");
    }

    #[test]
    fn negation_record() {
        let t = TokenValue::negation("no");
        assert_eq!(t.kind(), TokenKind::Negation);
        assert_eq!(t.text(), "no");
    }

    #[test]
    fn value_record() {
        let t = TokenValue::value(LeafType::Ipv4, 7, "10.0.0.1");
        assert_eq!(t.kind(), TokenKind::Value);
        assert_eq!(t.leaf_type(), LeafType::Ipv4);
        assert_eq!(t.leaf_id(), 7);
        assert_eq!(t.text(), "10.0.0.1");
    }

    #[test]
    fn records_compare_by_content() {
        let a = TokenValue::value(LeafType::Int, 1, "5");
        let b = TokenValue::value(LeafType::Int, 1, "5");
        let c = TokenValue::value(LeafType::Int, 1, "6");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    // -- Serde --

    #[test]
    fn token_kind_serde_roundtrip() {
        let k = TokenKind::Negation;
        let json = serde_json::to_string(&k).unwrap();
        let k2: TokenKind = serde_json::from_str(&json).unwrap();
        assert_eq!(k, k2);
    }

    #[test]
    fn leaf_type_serde_roundtrip() {
        let t = LeafType::Ipv6;
        let json = serde_json::to_string(&t).unwrap();
        let t2: LeafType = serde_json::from_str(&json).unwrap();
        assert_eq!(t, t2);
    }

    #[test]
    fn token_value_serde_roundtrip() {
        let t = TokenValue::value(LeafType::String, 3, "core-1");
        let json = serde_json::to_string(&t).unwrap();
        let t2: TokenValue = serde_json::from_str(&json).unwrap();
        assert_eq!(t, t2);
    }
}
