//! The `key=value;key=value` wire format spoken by the seat firmware.
//!
//! Parsing is lenient: segments without `=` are skipped, keys and values are
//! trimmed, and a later duplicate key overrides an earlier one. Callers read
//! fields through [`Fields`] and supply their own defaults.

use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(BTreeMap<String, String>);

impl Fields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// First non-empty value among `keys`.
    pub fn first(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn number<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn number_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.number(key).unwrap_or(default)
    }

    /// Firmware flags are `0`/`1`; anything non-zero counts as set.
    pub fn flag(&self, key: &str) -> bool {
        self.number::<i64>(key).is_some_and(|v| v != 0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

pub fn parse(payload: &str) -> Fields {
    let mut fields = BTreeMap::new();

    for segment in payload.split(';') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        fields.insert(key.to_string(), value.trim().to_string());
    }

    Fields(fields)
}

/// Builds an outbound `action;key=value;...` string.
#[derive(Debug, Clone)]
pub struct Encoder {
    buffer: String,
}

impl Encoder {
    pub fn new(action: &str) -> Self {
        Self {
            buffer: action.to_string(),
        }
    }

    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.buffer.push(';');
        self.buffer.push_str(key);
        self.buffer.push('=');
        self.buffer.extend(
            value
                .to_string()
                .chars()
                .filter(|c| *c != ';' && *c != '=' && !c.is_control()),
        );
        self
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_payload() {
        let fields = parse("s=1;iu=1;pc=1;lt=0;hm=1;sm=12;sec=300;fee=5;al=0");

        assert_eq!(fields.len(), 9);
        assert!(fields.flag("iu"));
        assert!(!fields.flag("lt"));
        assert_eq!(fields.number_or::<u32>("sec", 0), 300);
        assert_eq!(fields.get("fee"), Some("5"));
    }

    #[test]
    fn test_parse_skips_malformed_segments() {
        let fields = parse(";;garbage; =7;uid = 031368fc ;x=1=2;");

        assert_eq!(fields.get("uid"), Some("031368fc"));
        assert_eq!(fields.get("x"), Some("1=2"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_parse_never_fails() {
        assert!(parse("").is_empty());
        assert!(parse("occupy_over_120s").is_empty());

        let fields = parse("sec=abc;iu=");
        assert_eq!(fields.number_or::<u32>("sec", 0), 0);
        assert!(!fields.flag("iu"));
        assert_eq!(fields.get("iu"), None);
    }

    #[test]
    fn test_first_prefers_earlier_key() {
        let fields = parse("card=AA;uid=BB");
        assert_eq!(fields.first(&["uid", "card"]), Some("BB"));
        assert_eq!(fields.first(&["occ", "card"]), Some("AA"));
    }

    #[test]
    fn test_encoder_strips_delimiters() {
        let encoded = Encoder::new("card_ok")
            .field("uid", "031368FC")
            .field("name", "bad;name=x")
            .finish();

        assert_eq!(encoded, "card_ok;uid=031368FC;name=badnamex");
    }
}
