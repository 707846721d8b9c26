//! Compound id to CSS selector resolution.
//!
//! A compound id such as `"header:nav:loginButton"` is walked segment by
//! segment through a [`ConfigTree`], collecting the selector fragments met on
//! the way into one descendant selector.

use crate::config_tree::{normalize_key, ConfigNode, ConfigTree};
use crate::result::{WayfinderError, WayfinderResult};

/// Separator between compound id segments
pub const SEGMENT_SEPARATOR: char = ':';

/// Where a resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedNode<'a> {
    /// The id was empty; resolution stayed at the root tree
    Root(&'a ConfigTree),
    /// The node named by the last segment
    Node(&'a ConfigNode),
}

impl<'a> ResolvedNode<'a> {
    /// Subtree further segments would descend into
    #[must_use]
    pub const fn subtree(&self) -> Option<&'a ConfigTree> {
        match self {
            Self::Root(tree) => Some(tree),
            Self::Node(node) => node.subtree(),
        }
    }
}

/// Result of resolving a compound id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    selector: String,
    node: ResolvedNode<'a>,
    context: &'a str,
}

impl<'a> Resolution<'a> {
    /// Accumulated selector, `None` when no segment carried a fragment
    #[must_use]
    pub fn css(&self) -> Option<&str> {
        if self.selector.is_empty() {
            None
        } else {
            Some(&self.selector)
        }
    }

    /// Accumulated selector, possibly empty
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Node the resolution ended on
    #[must_use]
    pub const fn node(&self) -> ResolvedNode<'a> {
        self.node
    }

    /// Resolve further segments starting from this resolution.
    ///
    /// `resolve(tree, "a:b:c")` equals
    /// `resolve(tree, "a:b")?.continue_with("c")`.
    pub fn continue_with(self, rest: &str) -> WayfinderResult<Self> {
        walk(self, rest, rest)
    }
}

/// Resolve `compound_id` against `tree`.
///
/// `context` names the page object in error messages.
pub fn resolve<'a>(
    tree: &'a ConfigTree,
    compound_id: &str,
    context: &'a str,
) -> WayfinderResult<Resolution<'a>> {
    let start = Resolution {
        selector: String::new(),
        node: ResolvedNode::Root(tree),
        context,
    };
    walk(start, compound_id, compound_id)
}

fn walk<'a>(
    start: Resolution<'a>,
    segments: &str,
    full_id: &str,
) -> WayfinderResult<Resolution<'a>> {
    if segments.is_empty() {
        return Ok(start);
    }
    segments
        .split(SEGMENT_SEPARATOR)
        .try_fold(start, |acc, segment| step(acc, segment, full_id))
}

fn step<'a>(
    acc: Resolution<'a>,
    segment: &str,
    full_id: &str,
) -> WayfinderResult<Resolution<'a>> {
    let key = normalize_key(segment);
    let node = acc
        .node
        .subtree()
        .and_then(|tree| tree.get(&key))
        .ok_or_else(|| WayfinderError::PropertyNotFound {
            segment: key.clone(),
            id: full_id.to_string(),
            context: acc.context.to_string(),
        })?;

    let selector = match node.fragment() {
        Some(fragment) => join(&acc.selector, fragment),
        None => acc.selector,
    };

    Ok(Resolution {
        selector,
        node: ResolvedNode::Node(node),
        context: acc.context,
    })
}

fn join(prefix: &str, fragment: &str) -> String {
    let fragment = fragment.trim();
    match (prefix.is_empty(), fragment.is_empty()) {
        (_, true) => prefix.to_string(),
        (true, false) => fragment.to_string(),
        (false, false) => format!("{prefix} {fragment}"),
    }
}
