// Keys and configuration bags shared by every part of the registry

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Name of a configuration key, collection, model or request
///
/// Symbols order by their string form, which is what makes validation
/// messages and accessor listings reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Symbol> for Symbol {
    fn from(symbol: &Symbol) -> Self {
        symbol.clone()
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Configuration bag handed to `Registry::build`
pub type Config = BTreeMap<Symbol, serde_json::Value>;

/// Caller-supplied attributes for a collection accessor
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Build a `Config` from `(key, value)` pairs
///
/// Usage:
///     let config = config_from([("api_key", json!("x")), ("region", json!("us"))]);
pub fn config_from<K, I>(pairs: I) -> Config
where
    K: Into<Symbol>,
    I: IntoIterator<Item = (K, serde_json::Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Render a key list the way error messages print it: `a, b, c`
pub fn join_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symbols_order_by_name() {
        let mut symbols = vec![Symbol::from("region"), Symbol::from("api_key"), Symbol::from("zone")];
        symbols.sort();
        assert_eq!(join_symbols(&symbols), "api_key, region, zone");
    }

    #[test]
    fn test_config_lookup_by_str() {
        let config = config_from([("api_key", json!("secret"))]);
        assert_eq!(config.get("api_key"), Some(&json!("secret")));
        assert!(config.get("region").is_none());
    }

    #[test]
    fn test_symbol_serializes_as_plain_string() {
        let value = serde_json::to_value(Symbol::from("servers")).unwrap();
        assert_eq!(value, json!("servers"));
    }
}
