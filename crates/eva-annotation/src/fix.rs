//! Auto-fix: reconcile a keyframe against the reference keyframe.
//!
//! Two passes, both relative to keyframe 0 only:
//! 1. slot count: trim trailing slots or append vacant ones until the
//!    keyframe has as many slots as the reference;
//! 2. prompt shape: every occupied prompt whose non-status fields differ from
//!    the reference prompt at the same index is replaced by a copy of the
//!    reference prompt that keeps the local status.
//!
//! Every correction is reported as a [`FixRecord`].

use std::fmt;

use eva_core::{PromptAnnotation, Result, REFERENCE_KEYFRAME};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{AnnotationStore, Slot};

/// What a single correction did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixKind {
    RemovePoint,
    AppendPoint,
    AppendField { field: String },
    RemoveField { field: String },
    ModifyField { field: String, old: String, new: String },
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemovePoint => f.write_str("remove a point"),
            Self::AppendPoint => f.write_str("append a point"),
            Self::AppendField { field } => write!(f, "Append[{field}]"),
            Self::RemoveField { field } => write!(f, "Remove[{field}]"),
            Self::ModifyField { field, old, new } => write!(f, "Modify[{field}][{old}]->[{new}]"),
        }
    }
}

/// One correction made by [`AnnotationStore::auto_fix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRecord {
    pub keyframe: usize,
    /// Slot index for prompt corrections; `None` for slot-count corrections.
    pub point: Option<usize>,
    pub kind: FixKind,
}

impl FixRecord {
    /// Human-readable heading identifying the keyframe and point.
    pub fn title(&self) -> String {
        match self.point {
            None => format!("[Point num fix]Frame{}:", self.keyframe),
            Some(point) => format!("[Prompt fix]Frame{}/Point{}:", self.keyframe, point),
        }
    }

    /// Description of the correction.
    pub fn content(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for FixRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.title(), self.kind)
    }
}

impl AnnotationStore {
    /// Reconcile `keyframe` against the reference keyframe.
    ///
    /// Returns the corrections in the order they were made; an empty list
    /// means the keyframe was already consistent. Non-keyframes and the
    /// reference keyframe itself are never touched.
    pub fn auto_fix(&mut self, keyframe: usize) -> Result<Vec<FixRecord>> {
        if keyframe == REFERENCE_KEYFRAME || !self.schedule().contains(keyframe) {
            return Ok(Vec::new());
        }
        let reference: Vec<Slot> = self
            .slots(REFERENCE_KEYFRAME)
            .map(<[Slot]>::to_vec)
            .unwrap_or_default();

        let mut records = Vec::new();
        let slots = self.slots_mut(keyframe)?;

        // An empty reference has no slot count to enforce.
        if !reference.is_empty() {
            while slots.len() > reference.len() {
                slots.pop();
                records.push(FixRecord {
                    keyframe,
                    point: None,
                    kind: FixKind::RemovePoint,
                });
            }
            while slots.len() < reference.len() {
                slots.push(Slot::default());
                records.push(FixRecord {
                    keyframe,
                    point: None,
                    kind: FixKind::AppendPoint,
                });
            }
        }

        for (index, slot) in slots.iter_mut().enumerate() {
            let Some(local) = slot.prompt.as_ref() else {
                continue;
            };
            let Some(reference_prompt) = reference.get(index).and_then(|s| s.prompt.as_ref())
            else {
                continue;
            };
            let changes = shape_changes(reference_prompt, local);
            if changes.is_empty() {
                continue;
            }
            let replaced = reference_prompt.with_status_of(local);
            slot.prompt = Some(replaced);
            records.extend(changes.into_iter().map(|kind| FixRecord {
                keyframe,
                point: Some(index),
                kind,
            }));
        }

        debug!("Auto-fix on keyframe {}: {} corrections", keyframe, records.len());
        Ok(records)
    }

    /// Auto-fix every non-reference keyframe in schedule order.
    pub fn auto_fix_all(&mut self) -> Result<Vec<FixRecord>> {
        let keyframes: Vec<usize> = self.schedule().iter().collect();
        let mut records = Vec::new();
        for keyframe in keyframes {
            records.extend(self.auto_fix(keyframe)?);
        }
        Ok(records)
    }
}

/// Field differences between a local prompt and its reference, status excluded.
///
/// Reference fields are walked first (missing → append, differing → modify),
/// then local fields the reference lacks (→ remove).
fn shape_changes(reference: &PromptAnnotation, local: &PromptAnnotation) -> Vec<FixKind> {
    let reference_fields = reference.shape_fields();
    let local_fields = local.shape_fields();
    let lookup = |fields: &[(&'static str, String)], name: &str| {
        fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
    };

    let mut changes = Vec::new();
    for (name, value) in &reference_fields {
        match lookup(&local_fields, name) {
            None => changes.push(FixKind::AppendField {
                field: name.to_string(),
            }),
            Some(old) if old != *value => changes.push(FixKind::ModifyField {
                field: name.to_string(),
                old,
                new: value.clone(),
            }),
            Some(_) => {}
        }
    }
    for (name, _) in &local_fields {
        if lookup(&reference_fields, name).is_none() {
            changes.push(FixKind::RemoveField {
                field: name.to_string(),
            });
        }
    }
    changes
}
