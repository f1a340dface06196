//! Circular-reference sanitization
//!
//! Walks a value graph in place and replaces every entry that would make it
//! unserializable with a sentinel marker string:
//!
//! | Marker | Replaces |
//! |--------|----------|
//! | `"[Circular]"` | a reference back to a container on the current path |
//! | `"[Function]"` | a callable value |
//! | `"[CircularError]"` | a child whose own walk failed |
//!
//! Cycle detection is path-local: a child is circular only if it is one of
//! the containers between the root and the node being visited (that node
//! included). A container shared by two sibling branches without a cycle is
//! walked once per branch and left in place.
//!
//! The walk uses an explicit stack of open containers instead of recursion,
//! and no lock is held while descending. Each node is read into a snapshot,
//! its children are walked, and the replacements are then written back.
//! Locks are only ever tried, never waited on: a node that is held
//! elsewhere fails its branch instead of blocking the walk.

use smallvec::SmallVec;
use std::collections::HashSet;
use std::vec;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::path::PathSegment;
use crate::value::{NodeId, Value};

/// Marker for a reference back to an open ancestor
pub const CIRCULAR: &str = "[Circular]";

/// Marker for a child whose sanitization failed
pub const CIRCULAR_ERROR: &str = "[CircularError]";

/// Marker for a callable value
pub const FUNCTION: &str = "[Function]";

/// Failure to sanitize one branch of a value graph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// The node is locked elsewhere and cannot be read or rewritten
    #[error("node {0:?} is locked elsewhere")]
    Busy(NodeId),
}

type Replacements = SmallVec<[(PathSegment, &'static str); 4]>;

/// One open container on the walk stack.
struct Frame {
    value: Value,
    id: NodeId,
    /// Entry of the parent that holds this container; `None` for the root
    slot: Option<PathSegment>,
    entries: vec::IntoIter<(PathSegment, Value)>,
    replacements: Replacements,
}

impl Frame {
    fn open(value: Value, id: NodeId, slot: Option<PathSegment>) -> Result<Self, SanitizeError> {
        let entries = entries(&value, id)?.into_iter();
        Ok(Frame {
            value,
            id,
            slot,
            entries,
            replacements: SmallVec::new(),
        })
    }
}

/// Sanitize `value` in place and return the sanitized value.
///
/// Containers are rewritten in place and returned as the same handle.
/// A function passed as the root is left untouched and the `"[Function]"`
/// marker is returned in its stead. Scalars are returned as they are.
///
/// If the root itself cannot be walked (it is locked elsewhere) the failure
/// is logged and the root is returned unchanged; use [`try_sanitize`] to
/// observe it.
pub fn sanitize(value: &Value) -> Value {
    if value.is_function() {
        return Value::from(FUNCTION);
    }
    if let Err(e) = try_sanitize(value) {
        warn!(error = %e, kind = value.type_name(), "could not sanitize root value");
    }
    value.clone()
}

/// Sanitize `value` in place, reporting a failure on the root.
///
/// Failures below the root are never reported: the failing entry is
/// replaced with `"[CircularError]"` and the walk carries on.
///
/// The walk keeps its own stack, so nesting depth is bounded by memory
/// rather than by the thread's call stack.
pub fn try_sanitize(value: &Value) -> Result<(), SanitizeError> {
    let Some(id) = value.node_id() else {
        return Ok(());
    };
    let mut stack = vec![Frame::open(value.clone(), id, None)?];
    // Containers on the current root-to-top path
    let mut open: HashSet<NodeId> = HashSet::from([id]);

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.entries.next(),
            None => return Ok(()),
        };

        let Some((slot, child)) = next else {
            let Some(frame) = stack.pop() else {
                return Ok(());
            };
            open.remove(&frame.id);
            if let Err(e) = close(frame.value, frame.id, frame.replacements) {
                match frame.slot {
                    Some(slot) => {
                        debug!(slot = %slot, error = %e, "sanitize branch failed");
                        mark(&mut stack, slot, CIRCULAR_ERROR);
                    }
                    None => return Err(e),
                }
            }
            continue;
        };

        if child.is_function() {
            mark(&mut stack, slot, FUNCTION);
            continue;
        }
        let Some(child_id) = child.node_id() else {
            continue;
        };
        if open.contains(&child_id) {
            trace!(slot = %slot, "cutting circular reference");
            mark(&mut stack, slot, CIRCULAR);
            continue;
        }
        match Frame::open(child, child_id, Some(slot.clone())) {
            Ok(frame) => {
                open.insert(child_id);
                stack.push(frame);
            }
            Err(e) => {
                debug!(slot = %slot, error = %e, "sanitize branch failed");
                mark(&mut stack, slot, CIRCULAR_ERROR);
            }
        }
    }
}

fn mark(stack: &mut [Frame], slot: PathSegment, marker: &'static str) {
    if let Some(frame) = stack.last_mut() {
        frame.replacements.push((slot, marker));
    }
}

fn close(value: Value, id: NodeId, replacements: Replacements) -> Result<(), SanitizeError> {
    if replacements.is_empty() {
        return Ok(());
    }
    replace(&value, id, replacements)
}

/// Snapshot the own entries of a container.
fn entries(value: &Value, id: NodeId) -> Result<Vec<(PathSegment, Value)>, SanitizeError> {
    let busy = || SanitizeError::Busy(id);
    let snapshot = match value {
        Value::Array(node) => node
            .try_read()
            .ok_or_else(busy)?
            .iter()
            .enumerate()
            .map(|(i, v)| (PathSegment::Index(i), v.clone()))
            .collect(),
        Value::Object(node) => node
            .try_read()
            .ok_or_else(busy)?
            .iter()
            .map(|(k, v)| (PathSegment::Key(k.clone()), v.clone()))
            .collect(),
        Value::Error(error) => error
            .record()
            .try_read()
            .ok_or_else(busy)?
            .extra
            .iter()
            .map(|(k, v)| (PathSegment::Key(k.clone()), v.clone()))
            .collect(),
        _ => Vec::new(),
    };
    Ok(snapshot)
}

/// Write markers back into the entries they replace.
fn replace(value: &Value, id: NodeId, replacements: Replacements) -> Result<(), SanitizeError> {
    let busy = || SanitizeError::Busy(id);
    match value {
        Value::Array(node) => {
            let mut items = node.try_write().ok_or_else(busy)?;
            for (slot, marker) in replacements {
                if let PathSegment::Index(i) = slot {
                    if let Some(item) = items.get_mut(i) {
                        *item = Value::from(marker);
                    }
                }
            }
        }
        Value::Object(node) => {
            let mut fields = node.try_write().ok_or_else(busy)?;
            for (slot, marker) in replacements {
                if let PathSegment::Key(k) = slot {
                    if let Some(field) = fields.get_mut(&k) {
                        *field = Value::from(marker);
                    }
                }
            }
        }
        Value::Error(error) => {
            let mut record = error.record().try_write().ok_or_else(busy)?;
            for (slot, marker) in replacements {
                if let PathSegment::Key(k) = slot {
                    if let Some(field) = record.extra.get_mut(&k) {
                        *field = Value::from(marker);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}
