use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Feature,
    Bug,
    Spike,
    Infra,
    Chore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Backlog,
    Ready,
    InProgress,
    Implemented,
    QaInProgress,
    QaPassed,
    QaFailed,
    Done,
    Cancelled,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub priority: i32,
    pub story_points: i32,
    pub status: ItemStatus,
    #[serde(default)]
    pub sprint_id: Option<u32>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn needs_breakdown(&self) -> bool {
        self.story_points >= 9 && self.subtasks.is_empty()
    }
}

/// The on-disk `backlog.json` document: items plus a redundant, invariant-checked
/// metadata summary (spec §3: "Metadata totals always equal the derived counts").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backlog {
    pub project_name: String,
    pub metadata: BacklogMetadata,
    pub items: Vec<WorkItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BacklogMetadata {
    pub total_items: usize,
    pub total_points: i64,
}

impl Default for Backlog {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            metadata: BacklogMetadata::default(),
            items: Vec::new(),
        }
    }
}

impl Backlog {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            metadata: BacklogMetadata::default(),
            items: Vec::new(),
        }
    }

    /// Recompute `metadata` from `items`. Every mutating operation calls this
    /// before the state-store write so the invariant never has a chance to drift.
    pub fn recompute_metadata(&mut self) {
        self.metadata.total_items = self.items.len();
        self.metadata.total_points = self.items.iter().map(|i| i.story_points as i64).sum();
    }

    pub fn get(&self, id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut WorkItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Next dense, zero-padded parent id: one past the highest existing
    /// parent number (subtask suffixes don't consume the counter).
    pub fn next_item_number(&self) -> u32 {
        self.items
            .iter()
            .filter_map(|i| crate::clock::parse_task_id(&i.id))
            .filter(|(_, suffix)| suffix.is_none())
            .map(|(n, _)| n)
            .max()
            .map(|n| n + 1)
            .unwrap_or(1)
    }

    /// Already-assigned suffix letters for `parent_id`, in creation order.
    pub fn child_suffixes(&self, parent_number: u32) -> Vec<char> {
        let mut suffixes: Vec<char> = self
            .items
            .iter()
            .filter_map(|i| crate::clock::parse_task_id(&i.id))
            .filter(|(n, suffix)| *n == parent_number && suffix.is_some())
            .filter_map(|(_, suffix)| suffix)
            .collect();
        suffixes.sort_unstable();
        suffixes
    }
}
