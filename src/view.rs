//! Evaluation View Builder
//!
//! Derives the file set a grader or IDE sees from an answer's current files,
//! the task's initial files, and the task's [`FilePolicy`]. The result is never
//! persisted.

use crate::pattern::{Classification, FilePolicy};
use crate::types::VirtualFile;
use std::collections::HashMap;
use tracing::debug;

pub type EffectiveFileView = Vec<VirtualFile>;

/// Build the effective view.
///
/// Current entries keep their order. Hidden paths are dropped, protected paths
/// take their initial content or are dropped when the initial set lacks them.
/// Protected initial paths the student deleted are appended in initial order.
pub fn build_effective_view(
    current: Vec<VirtualFile>,
    initial: Vec<VirtualFile>,
    policy: &FilePolicy,
) -> EffectiveFileView {
    let mut originals: Vec<Option<VirtualFile>> = Vec::new();
    let mut slot_of: HashMap<String, usize> = HashMap::new();
    for file in initial {
        if policy.classify(&file.path) != Classification::Protected
            || slot_of.contains_key(&file.path)
        {
            continue;
        }
        slot_of.insert(file.path.clone(), originals.len());
        originals.push(Some(file));
    }

    let mut view = Vec::with_capacity(current.len() + originals.len());
    let (mut hidden, mut restored) = (0usize, 0usize);
    for file in current {
        match policy.classify(&file.path) {
            Classification::Hidden => hidden += 1,
            Classification::Protected => {
                let original = slot_of
                    .get(&file.path)
                    .and_then(|&slot| originals[slot].take());
                if let Some(original) = original {
                    restored += 1;
                    view.push(original);
                }
            }
            Classification::Visible => view.push(file),
        }
    }

    let before = view.len();
    view.extend(originals.into_iter().flatten());
    debug!(
        hidden,
        restored,
        appended = view.len() - before,
        total = view.len(),
        "Built effective view"
    );
    view
}
