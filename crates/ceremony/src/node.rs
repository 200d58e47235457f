//! Ceremony tree node type and simplification.

use serde::{Deserialize, Serialize};

/// One node of a ceremony tree.
///
/// Equality is structural: same variant, same component id, or pairwise-equal
/// children in order. `Done` is the synthetic terminal appended before a walk
/// so that "sequence fully satisfied" is observable as reaching a leaf; it is
/// a distinct variant so it can never collide with a real component id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CeremonyNode {
    Component { id: String },
    Sequence { children: Vec<CeremonyNode> },
    Choice { children: Vec<CeremonyNode> },
    Done,
}

impl CeremonyNode {
    #[must_use]
    pub fn component(id: impl Into<String>) -> Self {
        Self::Component { id: id.into() }
    }

    #[must_use]
    pub fn sequence(children: Vec<CeremonyNode>) -> Self {
        Self::Sequence { children }
    }

    #[must_use]
    pub fn choice(children: Vec<CeremonyNode>) -> Self {
        Self::Choice { children }
    }

    /// Component id if this node is a leaf component.
    #[must_use]
    pub fn component_id(&self) -> Option<&str> {
        match self {
            Self::Component { id } => Some(id),
            _ => None,
        }
    }

    /// Every distinct component id referenced anywhere in the tree, in
    /// first-occurrence order. Used at startup to validate that each
    /// referenced component has a registered provider.
    #[must_use]
    pub fn leaf_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_leaf_ids(&mut ids);
        ids
    }

    fn collect_leaf_ids(&self, ids: &mut Vec<String>) {
        match self {
            Self::Component { id } => {
                if !ids.iter().any(|known| known == id) {
                    ids.push(id.clone());
                }
            }
            Self::Sequence { children } | Self::Choice { children } => {
                for child in children {
                    child.collect_leaf_ids(ids);
                }
            }
            Self::Done => {}
        }
    }

    /// Normalize the tree: flatten same-kind nesting, drop structurally
    /// duplicate children (first occurrence wins), and collapse containers
    /// left with a single child. Idempotent.
    #[must_use]
    pub fn simplify(&self) -> Self {
        match self {
            Self::Component { .. } | Self::Done => self.clone(),
            Self::Sequence { children } => {
                Self::simplify_container(children, true, Self::sequence)
            }
            Self::Choice { children } => Self::simplify_container(children, false, Self::choice),
        }
    }

    fn simplify_container(
        children: &[CeremonyNode],
        sequence: bool,
        rebuild: fn(Vec<CeremonyNode>) -> CeremonyNode,
    ) -> CeremonyNode {
        let mut flat: Vec<CeremonyNode> = Vec::with_capacity(children.len());
        for child in children {
            let child = child.simplify();
            // Associativity: a sequence inside a sequence (or a choice inside
            // a choice) contributes its children directly to the parent.
            match child {
                Self::Sequence { children } if sequence => flat.extend(children),
                Self::Choice { children } if !sequence => flat.extend(children),
                other => flat.push(other),
            }
        }

        let mut unique: Vec<CeremonyNode> = Vec::with_capacity(flat.len());
        for child in flat {
            if !unique.contains(&child) {
                unique.push(child);
            }
        }

        if unique.len() == 1 {
            unique
                .pop()
                .unwrap_or(rebuild(Vec::new()))
        } else {
            rebuild(unique)
        }
    }
}
