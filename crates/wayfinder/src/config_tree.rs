//! Page-object configuration trees.
//!
//! A configuration tree maps normalized keys to selector fragments and
//! nested trees. Keys are normalized once, when the tree is built, so
//! resolution is a plain exact-key lookup.
//!
//! Source shapes:
//!
//! ```yaml
//! usernameField: "#user"          # Leaf
//! header:                         # Branch
//!   nav: "nav.main"
//! loginForm:                      # LeafWithChildren
//!   - "form#login"
//!   - submit: "button[type=submit]"
//! ```

use crate::result::{WayfinderError, WayfinderResult};
use heck::ToLowerCamelCase;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Normalize a key to its canonical camelCase form.
///
/// Words are split at non-alphanumeric characters, at lower-to-upper case
/// transitions, at letter/digit boundaries and before the last capital of an
/// acronym run, so `"login button"`, `"Login-Button"`, `"login_button"` and
/// `"loginButton"` all become `"loginButton"`.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    split_digit_runs(raw).to_lower_camel_case()
}

// heck keeps digits inside a word; here a letter/digit transition starts a new one
fn split_digit_runs(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev: Option<char> = None;
    for c in raw.chars() {
        if prev.is_some_and(|p| {
            (p.is_alphabetic() && c.is_numeric()) || (p.is_numeric() && c.is_alphabetic())
        }) {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// A node of a configuration tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNode {
    /// A CSS selector fragment
    Leaf(String),
    /// A nested tree with no selector of its own
    Branch(ConfigTree),
    /// A selector fragment that also has children
    LeafWithChildren(String, ConfigTree),
}

impl ConfigNode {
    /// Selector fragment carried by this node, if any
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::Leaf(css) | Self::LeafWithChildren(css, _) => Some(css),
            Self::Branch(_) => None,
        }
    }

    /// Subtree carried by this node, if any
    #[must_use]
    pub const fn subtree(&self) -> Option<&ConfigTree> {
        match self {
            Self::Branch(tree) | Self::LeafWithChildren(_, tree) => Some(tree),
            Self::Leaf(_) => None,
        }
    }

    fn from_value(key: &str, value: &Value) -> WayfinderResult<Self> {
        match value {
            Value::String(css) => Ok(Self::Leaf(css.clone())),
            Value::Object(_) => Ok(Self::Branch(ConfigTree::from_value(value)?)),
            Value::Array(items) => match items.as_slice() {
                [Value::String(css), children @ Value::Object(_)] => Ok(Self::LeafWithChildren(
                    css.clone(),
                    ConfigTree::from_value(children)?,
                )),
                _ => Err(WayfinderError::invalid_config(format!(
                    "\"{key}\" must be [selector, {{children}}], got {value}"
                ))),
            },
            other => Err(WayfinderError::invalid_config(format!(
                "\"{key}\" must be a selector string, a mapping or [selector, {{children}}], got {other}"
            ))),
        }
    }

    fn with_defaults(&self, base: &Self) -> Self {
        match (self, base) {
            (Self::Branch(own), Self::Branch(defaults)) => {
                Self::Branch(own.with_defaults(defaults))
            }
            (Self::Branch(own), Self::LeafWithChildren(css, defaults)) => {
                Self::LeafWithChildren(css.clone(), own.with_defaults(defaults))
            }
            (
                Self::LeafWithChildren(css, own),
                Self::Branch(defaults) | Self::LeafWithChildren(_, defaults),
            ) => Self::LeafWithChildren(css.clone(), own.with_defaults(defaults)),
            (own, _) => own.clone(),
        }
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(css) => serializer.serialize_str(css),
            Self::Branch(tree) => tree.serialize(serializer),
            Self::LeafWithChildren(css, tree) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(css)?;
                seq.serialize_element(tree)?;
                seq.end()
            }
        }
    }
}

/// A mapping from normalized keys to configuration nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    entries: BTreeMap<String, ConfigNode>,
}

impl ConfigTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON value, normalizing every key.
    ///
    /// Two source keys that normalize to the same key are rejected.
    pub fn from_value(value: &Value) -> WayfinderResult<Self> {
        let Value::Object(map) = value else {
            return Err(WayfinderError::invalid_config(format!(
                "page object must be a mapping, got {value}"
            )));
        };
        let mut tree = Self::new();
        for (raw_key, raw_node) in map {
            let key = normalize_key(raw_key);
            if tree.entries.contains_key(&key) {
                return Err(WayfinderError::invalid_config(format!(
                    "\"{raw_key}\" collides with another key normalized to \"{key}\""
                )));
            }
            let node = ConfigNode::from_value(raw_key, raw_node)?;
            let _ = tree.entries.insert(key, node);
        }
        Ok(tree)
    }

    /// Add a node under the normalized form of `key`
    #[must_use]
    pub fn with(mut self, key: &str, node: ConfigNode) -> Self {
        self.insert(key, node);
        self
    }

    /// Add a leaf selector under the normalized form of `key`
    #[must_use]
    pub fn with_leaf(self, key: &str, css: impl Into<String>) -> Self {
        self.with(key, ConfigNode::Leaf(css.into()))
    }

    /// Insert a node under the normalized form of `key`
    pub fn insert(&mut self, key: &str, node: ConfigNode) {
        let _ = self.entries.insert(normalize_key(key), node);
    }

    /// Look up a node by an already-normalized key
    #[must_use]
    pub fn get(&self, normalized_key: &str) -> Option<&ConfigNode> {
        self.entries.get(normalized_key)
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deep-merge `base` underneath this tree.
    ///
    /// Keys present in `self` keep their value; keys only in `base` are
    /// copied; subtrees present on both sides are merged recursively.
    #[must_use]
    pub fn with_defaults(&self, base: &Self) -> Self {
        let mut merged = base.entries.clone();
        for (key, own) in &self.entries {
            let node = match base.entries.get(key) {
                Some(default) => own.with_defaults(default),
                None => own.clone(),
            };
            let _ = merged.insert(key.clone(), node);
        }
        Self { entries: merged }
    }
}

impl<'de> Deserialize<'de> for ConfigTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod normalize_key_tests {
        use super::*;

        #[test]
        fn test_equivalent_spellings() {
            for raw in [
                "loginButton",
                "login button",
                "Login-Button",
                "login_button",
                "LOGIN BUTTON",
                "  login   button ",
            ] {
                assert_eq!(normalize_key(raw), "loginButton", "input {raw:?}");
            }
        }

        #[test]
        fn test_acronym_run() {
            assert_eq!(normalize_key("XMLHttpRequest"), "xmlHttpRequest");
            assert_eq!(normalize_key("userID"), "userId");
        }

        #[test]
        fn test_digits_split_words() {
            assert_eq!(normalize_key("step2 form"), "step2Form");
            assert_eq!(normalize_key("step2form"), "step2Form");
            assert_eq!(normalize_key("2fa code"), "2FaCode");
            assert_eq!(normalize_key("h1"), "h1");
        }

        #[test]
        fn test_single_word_and_empty() {
            assert_eq!(normalize_key("Header"), "header");
            assert_eq!(normalize_key(""), "");
            assert_eq!(normalize_key("--"), "");
        }

        #[test]
        fn test_idempotent() {
            let once = normalize_key("Main Nav-Bar");
            assert_eq!(normalize_key(&once), once);
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_node_shapes() {
            let tree = ConfigTree::from_value(&json!({
                "username field": "#user",
                "header": { "nav": "nav.main" },
                "login-form": ["form#login", { "submit": "button" }]
            }))
            .unwrap();

            assert_eq!(
                tree.get("usernameField"),
                Some(&ConfigNode::Leaf("#user".to_string()))
            );
            assert!(matches!(tree.get("header"), Some(ConfigNode::Branch(_))));
            match tree.get("loginForm") {
                Some(ConfigNode::LeafWithChildren(css, children)) => {
                    assert_eq!(css, "form#login");
                    assert!(children.get("submit").is_some());
                }
                other => panic!("unexpected node {other:?}"),
            }
        }

        #[test]
        fn test_rejects_bad_shapes() {
            let err = ConfigTree::from_value(&json!({ "count": 3 })).unwrap_err();
            assert!(err.to_string().contains("count"));

            let err = ConfigTree::from_value(&json!({ "pair": ["a", "b"] })).unwrap_err();
            assert!(err.to_string().contains("pair"));

            assert!(ConfigTree::from_value(&json!("#root")).is_err());
        }

        #[test]
        fn test_rejects_colliding_keys() {
            let err =
                ConfigTree::from_value(&json!({ "login button": "#a", "loginButton": "#b" }))
                    .unwrap_err();
            assert!(err.to_string().contains("loginButton"));
        }

        #[test]
        fn test_deserialize_from_yaml() {
            let yaml = "header:\n  nav link: a.nav\nform:\n  - form.main\n  - submit: button\n";
            let tree: ConfigTree = serde_yaml_ng::from_str(yaml).unwrap();
            let header = tree.get("header").and_then(ConfigNode::subtree).unwrap();
            assert_eq!(
                header.get("navLink"),
                Some(&ConfigNode::Leaf("a.nav".to_string()))
            );
            assert_eq!(tree.get("form").and_then(ConfigNode::fragment), Some("form.main"));
        }

        #[test]
        fn test_serialize_round_shape() {
            let tree = ConfigTree::new()
                .with_leaf("title", "h1")
                .with(
                    "form",
                    ConfigNode::LeafWithChildren(
                        "form".to_string(),
                        ConfigTree::new().with_leaf("submit", "button"),
                    ),
                );
            let value = serde_json::to_value(&tree).unwrap();
            assert_eq!(
                value,
                json!({ "title": "h1", "form": ["form", { "submit": "button" }] })
            );
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_route_value_wins() {
            let base = ConfigTree::new()
                .with_leaf("title", "h1.base")
                .with_leaf("footer", "footer");
            let route = ConfigTree::new().with_leaf("title", "h1.login");
            let merged = route.with_defaults(&base);

            assert_eq!(merged.get("title").and_then(ConfigNode::fragment), Some("h1.login"));
            assert_eq!(merged.get("footer").and_then(ConfigNode::fragment), Some("footer"));
        }

        #[test]
        fn test_subtrees_merge_recursively() {
            let base = ConfigTree::new().with(
                "header",
                ConfigNode::Branch(
                    ConfigTree::new()
                        .with_leaf("logo", "img.logo")
                        .with_leaf("nav", "nav.base"),
                ),
            );
            let route = ConfigTree::new().with(
                "header",
                ConfigNode::LeafWithChildren(
                    "header#top".to_string(),
                    ConfigTree::new().with_leaf("nav", "nav.login"),
                ),
            );
            let merged = route.with_defaults(&base);
            let header = merged.get("header").unwrap();

            assert_eq!(header.fragment(), Some("header#top"));
            let children = header.subtree().unwrap();
            assert_eq!(children.get("nav").and_then(ConfigNode::fragment), Some("nav.login"));
            assert_eq!(children.get("logo").and_then(ConfigNode::fragment), Some("img.logo"));
        }

        #[test]
        fn test_route_leaf_replaces_base_branch() {
            let base = ConfigTree::new().with(
                "menu",
                ConfigNode::Branch(ConfigTree::new().with_leaf("item", "li")),
            );
            let route = ConfigTree::new().with_leaf("menu", "ul.menu");
            let merged = route.with_defaults(&base);
            assert_eq!(merged.get("menu"), Some(&ConfigNode::Leaf("ul.menu".to_string())));
        }

        #[test]
        fn test_base_untouched() {
            let base = ConfigTree::new().with_leaf("title", "h1");
            let route = ConfigTree::new().with_leaf("title", "h2");
            let _ = route.with_defaults(&base);
            assert_eq!(base.get("title").and_then(ConfigNode::fragment), Some("h1"));
        }
    }

    mod merge_property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn leaves() -> impl Strategy<Value = BTreeMap<String, String>> {
            prop::collection::btree_map("[a-z]{1,6}", "[a-z#.]{1,8}", 0..6)
        }

        fn tree_of(leaves: &BTreeMap<String, String>) -> ConfigTree {
            leaves
                .iter()
                .fold(ConfigTree::new(), |tree, (key, css)| tree.with_leaf(key, css.clone()))
        }

        proptest! {
            #[test]
            fn prop_route_keys_win_and_base_keys_survive(base in leaves(), own in leaves()) {
                let merged = tree_of(&own).with_defaults(&tree_of(&base));

                for (key, css) in &own {
                    prop_assert_eq!(merged.get(key).and_then(ConfigNode::fragment), Some(css.as_str()));
                }
                for (key, css) in base.iter().filter(|(key, _)| !own.contains_key(*key)) {
                    prop_assert_eq!(merged.get(key).and_then(ConfigNode::fragment), Some(css.as_str()));
                }
                let keys: BTreeSet<&String> = own.keys().chain(base.keys()).collect();
                prop_assert_eq!(merged.len(), keys.len());
            }
        }
    }
}
