//! Leaf-ordering enumeration and step resolution.

use crate::CeremonyNode;

/// Outcome of resolving ceremony progress against the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStep {
    /// The next pending step: a single `Component`, or a one-level `Choice`
    /// of components when more than one is simultaneously eligible.
    Pending(CeremonyNode),
    /// Every required step on some valid walk is complete.
    Complete,
    /// The completed list matches no walk of the tree.
    NotFound,
}

/// Enumerate every `(leaf, completed-prefix)` pair reachable by some valid
/// resolution of all choices, plus a `(None, prefix)` terminal entry for
/// every prefix that represents a complete path through the ceremony.
///
/// Trees are a handful of components in practice, so the result is
/// materialized rather than yielded lazily.
#[must_use]
pub fn enumerate_leaf_orderings(node: &CeremonyNode) -> Vec<(Option<String>, Vec<String>)> {
    // Appending the terminal to the whole ceremony makes "sequence fully
    // satisfied" observable as reaching a leaf instead of an out-of-band
    // signal.
    let mut out = Vec::new();
    walk_sequence(
        &[node.clone(), CeremonyNode::Done],
        Vec::new(),
        &mut out,
    );
    out
}

fn walk_sequence(
    children: &[CeremonyNode],
    prefix: Vec<String>,
    out: &mut Vec<(Option<String>, Vec<String>)>,
) {
    let Some((first, rest)) = children.split_first() else {
        return;
    };
    match first {
        CeremonyNode::Component { id } => {
            out.push((Some(id.clone()), prefix.clone()));
            let mut completed = prefix;
            completed.push(id.clone());
            walk_sequence(rest, completed, out);
        }
        CeremonyNode::Done => {
            // Terminal reached; anything after it is unreachable by
            // construction.
            out.push((None, prefix));
        }
        CeremonyNode::Choice {
            children: alternatives,
        } => {
            // Resolve the first unresolved choice by substituting each
            // alternative in turn and re-walking the modified sequence.
            for alternative in alternatives {
                let mut substituted = Vec::with_capacity(rest.len() + 1);
                substituted.push(alternative.clone());
                substituted.extend_from_slice(rest);
                walk_sequence(&substituted, prefix.clone(), out);
            }
        }
        CeremonyNode::Sequence { children: inner } => {
            let mut flattened = Vec::with_capacity(inner.len() + rest.len());
            flattened.extend_from_slice(inner);
            flattened.extend_from_slice(rest);
            walk_sequence(&flattened, prefix, out);
        }
    }
}

/// Map the ordered list of completed component ids to the next pending step.
///
/// Scans [`enumerate_leaf_orderings`], collecting every leaf whose prefix
/// exactly equals `completed` (deduplicated) and checking whether some
/// terminal entry matches it. No leaf and no terminal is `NotFound`; one
/// leaf is that component; several leaves form a synthetic one-level choice;
/// a terminal with no leaves is `Complete`.
#[must_use]
pub fn resolve_step_at_path(node: &CeremonyNode, completed: &[String]) -> ResolvedStep {
    let mut candidates: Vec<String> = Vec::new();
    let mut terminal = false;
    for (leaf, prefix) in enumerate_leaf_orderings(node) {
        if prefix != completed {
            continue;
        }
        match leaf {
            Some(id) => {
                if !candidates.iter().any(|known| known == &id) {
                    candidates.push(id);
                }
            }
            None => terminal = true,
        }
    }

    match candidates.len() {
        0 if terminal => ResolvedStep::Complete,
        0 => ResolvedStep::NotFound,
        1 => ResolvedStep::Pending(CeremonyNode::component(candidates.remove(0))),
        _ => ResolvedStep::Pending(CeremonyNode::choice(
            candidates.into_iter().map(CeremonyNode::component).collect(),
        )),
    }
}
