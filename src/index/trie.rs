//! Prefix trie index
//!
//! A char-keyed trie over extracted text. Each node holds the handles of
//! elements whose full (collation-folded) text terminates at that node, so
//! a prefix query walks `|prefix|` nodes and then collects one subtree;
//! cost is proportional to the prefix length plus the match count, never to
//! the collection size. Insert and remove are incremental, and removal
//! prunes newly-empty nodes so the trie never outgrows its live contents.

use std::collections::HashMap;

use crate::key::Collation;
use crate::set::ElementId;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Elements whose full text ends at this node, in insertion order
    terminals: Vec<ElementId>,
}

impl TrieNode {
    fn is_empty(&self) -> bool {
        self.terminals.is_empty() && self.children.is_empty()
    }

    fn collect_into(&self, out: &mut Vec<ElementId>) {
        out.extend_from_slice(&self.terminals);
        for child in self.children.values() {
            child.collect_into(out);
        }
    }
}

/// Trie index over extracted text
#[derive(Debug)]
pub struct PrefixIndex {
    root: TrieNode,
    collation: Collation,
}

impl PrefixIndex {
    /// Creates an empty trie with the given collation
    pub fn new(collation: Collation) -> Self {
        Self {
            root: TrieNode::default(),
            collation,
        }
    }

    /// Insert an element under its text.
    ///
    /// The text has already been folded under this index's collation by
    /// the descriptor at extraction time.
    pub fn insert(&mut self, text: &str, id: ElementId) {
        let mut node = &mut self.root;
        for ch in text.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.terminals.push(id);
    }

    /// Remove an element from under its text, pruning emptied nodes.
    pub fn remove(&mut self, text: &str, id: ElementId) {
        Self::remove_walk(&mut self.root, text, id);
    }

    fn remove_walk(node: &mut TrieNode, rest: &str, id: ElementId) {
        let mut chars = rest.chars();
        match chars.next() {
            None => {
                node.terminals.retain(|held| *held != id);
            }
            Some(ch) => {
                if let Some(child) = node.children.get_mut(&ch) {
                    Self::remove_walk(child, chars.as_str(), id);
                    if child.is_empty() {
                        node.children.remove(&ch);
                    }
                }
            }
        }
    }

    /// Handles of all elements whose text starts with `prefix`.
    ///
    /// The query prefix is folded under the index collation before the
    /// walk, so it always agrees with what insertion stored.
    pub fn starts_with(&self, prefix: &str) -> Vec<ElementId> {
        let folded = self.collation.fold_text(prefix);
        let mut node = &self.root;
        for ch in folded.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut matches = Vec::new();
        node.collect_into(&mut matches);
        matches
    }

    /// Handles of elements whose whole folded text equals `text`
    pub fn exact(&self, text: &str) -> Vec<ElementId> {
        let folded = self.collation.fold_text(text);
        let mut node = &self.root;
        for ch in folded.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        node.terminals.clone()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.root = TrieNode::default();
    }

    /// All element handles in the trie (consistency audits)
    pub fn ids(&self) -> Vec<ElementId> {
        let mut all = Vec::new();
        self.root.collect_into(&mut all);
        all
    }
}
