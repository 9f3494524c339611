//! Ownership records linking tasks and answers to their collections.
//!
//! These are handed in by the caller's persistence layer. This crate never
//! stores them; it only reads ids and pattern lists from them.

use crate::pattern::{FilePolicy, PatternList};
use crate::types::{CollectionId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task's initial collection and its file rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFiles {
    pub task_id: Uuid,
    pub owner: UserId,
    pub initial_files: CollectionId,
    #[serde(default)]
    pub hidden_files: PatternList,
    #[serde(default)]
    pub protected_files: PatternList,
}

impl TaskFiles {
    /// New task record with a fresh collection id and no rules.
    pub fn new(task_id: Uuid, owner: impl Into<UserId>) -> Self {
        Self {
            task_id,
            owner: owner.into(),
            initial_files: Uuid::new_v4(),
            hidden_files: PatternList::empty(),
            protected_files: PatternList::empty(),
        }
    }

    pub fn policy(&self) -> FilePolicy {
        FilePolicy::new(&self.hidden_files, &self.protected_files)
    }
}

/// A student's working collection for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFiles {
    pub answer_id: Uuid,
    pub task_id: Uuid,
    pub student: UserId,
    pub current_files: CollectionId,
}

/// Pattern lists as exposed to someone allowed to edit the task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatterns {
    pub hidden_files: PatternList,
    pub protected_files: PatternList,
}

/// Capability check supplied by the caller's authorization layer
pub trait Authorizer: Send + Sync {
    fn may_edit_task(&self, caller: &UserId, task: &TaskFiles) -> bool;
}

/// Only the task owner may edit
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

impl Authorizer for OwnerOnly {
    fn may_edit_task(&self, caller: &UserId, task: &TaskFiles) -> bool {
        caller == &task.owner
    }
}
