//! Backlog engine (spec §4.2): CRUD over work items, parent/subtask
//! breakdown and rollup, and sprint assignment. Every mutating call goes
//! through `sprinty_data::store::update` so each operation is one atomic
//! file write.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sprinty_data::clock::{format_subtask_id, format_task_id, next_suffix};
use sprinty_data::store;
use sprinty_data::{Backlog, ItemStatus, ItemType, Result, SprintyError, WorkItem};

pub struct BacklogEngine {
    path: PathBuf,
}

impl BacklogEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create an empty backlog. Idempotent: refuses to overwrite an existing one.
    pub fn init(&self, project_name: &str) -> Result<()> {
        if self.path.exists() {
            return Err(SprintyError::AlreadyInitialized);
        }
        store::write_json(&self.path, &Backlog::new(project_name))
    }

    fn load(&self) -> Result<Backlog> {
        store::read_json(&self.path)
    }

    pub fn all(&self) -> Result<Vec<WorkItem>> {
        Ok(self.load()?.items)
    }

    pub fn get(&self, id: &str) -> Result<WorkItem> {
        self.load()?
            .items
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| SprintyError::ItemNotFound(id.to_string()))
    }

    pub fn by_status(&self, status: ItemStatus) -> Result<Vec<WorkItem>> {
        Ok(self.load()?.items.into_iter().filter(|i| i.status == status).collect())
    }

    pub fn sprint_backlog(&self, sprint_id: u32) -> Result<Vec<WorkItem>> {
        Ok(self
            .load()?
            .items
            .into_iter()
            .filter(|i| i.sprint_id == Some(sprint_id))
            .collect())
    }

    /// Lowest `priority` integer wins; ties broken by lowest id.
    pub fn next_ready(&self) -> Result<Option<WorkItem>> {
        let backlog = self.load()?;
        Ok(backlog
            .items
            .into_iter()
            .filter(|i| i.status == ItemStatus::Ready)
            .min_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id))))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &self,
        title: &str,
        item_type: ItemType,
        priority: i32,
        points: i32,
        ac: Vec<String>,
    ) -> Result<WorkItem> {
        store::update::<Backlog, _, _>(&self.path, |backlog| {
            let number = backlog.next_item_number();
            let now = Utc::now();
            let item = WorkItem {
                id: format_task_id(number),
                title: title.to_string(),
                description: None,
                item_type,
                priority,
                story_points: points,
                status: ItemStatus::Backlog,
                sprint_id: None,
                acceptance_criteria: ac,
                dependencies: vec![],
                parent_id: None,
                subtasks: vec![],
                failure_reason: None,
                created_at: now,
                updated_at: now,
            };
            backlog.items.push(item.clone());
            backlog.recompute_metadata();
            item
        })
    }

    pub fn add_from_record(&self, mut item: WorkItem) -> Result<WorkItem> {
        store::update::<Backlog, _, _>(&self.path, |backlog| {
            item.status = ItemStatus::Backlog;
            item.sprint_id = None;
            backlog.items.push(item.clone());
            backlog.recompute_metadata();
            item
        })
    }

    pub fn set_status(&self, id: &str, status: ItemStatus) -> Result<()> {
        store::update::<Backlog, _, _>(&self.path, |backlog| -> Result<()> {
            let item = backlog
                .items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| SprintyError::ItemNotFound(id.to_string()))?;
            item.status = status;
            item.updated_at = Utc::now();
            Ok(())
        })?
    }

    pub fn assign_to_sprint(&self, id: &str, sprint_id: u32) -> Result<()> {
        store::update::<Backlog, _, _>(&self.path, |backlog| -> Result<()> {
            let item = backlog
                .items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| SprintyError::ItemNotFound(id.to_string()))?;
            item.sprint_id = Some(sprint_id);
            item.status = ItemStatus::Ready;
            item.updated_at = Utc::now();
            Ok(())
        })?
    }

    pub fn set_failure_reason(&self, id: &str, reason: &str) -> Result<()> {
        store::update::<Backlog, _, _>(&self.path, |backlog| -> Result<()> {
            let item = backlog
                .items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| SprintyError::ItemNotFound(id.to_string()))?;
            item.failure_reason = Some(reason.to_string());
            item.updated_at = Utc::now();
            Ok(())
        })?
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        store::update::<Backlog, _, _>(&self.path, |backlog| -> Result<()> {
            let before = backlog.items.len();
            backlog.items.retain(|i| i.id != id);
            if backlog.items.len() == before {
                return Err(SprintyError::ItemNotFound(id.to_string()));
            }
            backlog.recompute_metadata();
            Ok(())
        })?
    }

    pub fn has_qa_failed(&self) -> Result<bool> {
        Ok(self.load()?.items.iter().any(|i| i.status == ItemStatus::QaFailed))
    }

    pub fn is_sprint_complete(&self, sprint_id: u32) -> Result<bool> {
        let backlog = self.load()?;
        Ok(backlog
            .items
            .iter()
            .filter(|i| i.sprint_id == Some(sprint_id))
            .all(|i| i.status.is_terminal()))
    }

    /// Requires at least one item, all items terminal, and no undone P1 bug.
    pub fn is_backlog_complete(&self) -> Result<bool> {
        let backlog = self.load()?;
        if backlog.items.is_empty() {
            return Ok(false);
        }
        if !backlog.items.iter().all(|i| i.status.is_terminal()) {
            return Ok(false);
        }
        let has_open_p1_bug = backlog
            .items
            .iter()
            .any(|i| i.item_type == ItemType::Bug && i.priority == 1 && i.status != ItemStatus::Done);
        Ok(!has_open_p1_bug)
    }

    /// Create a subtask with the next unused letter suffix, inheriting
    /// `sprint_id`, `priority`, and `acceptance_criteria` from the parent.
    /// One logical transaction: both writes land in the same state-store call.
    pub fn break_down(&self, parent_id: &str, title: &str, points: i32, desc: Option<&str>) -> Result<WorkItem> {
        store::update::<Backlog, _, _>(&self.path, |backlog| -> Result<WorkItem> {
            let (parent_number, _) = sprinty_data::clock::parse_task_id(parent_id)
                .ok_or_else(|| SprintyError::ItemNotFound(parent_id.to_string()))?;

            let (parent_sprint_id, parent_priority, parent_ac) = {
                let parent = backlog
                    .get(parent_id)
                    .ok_or_else(|| SprintyError::ItemNotFound(parent_id.to_string()))?;
                (parent.sprint_id, parent.priority, parent.acceptance_criteria.clone())
            };

            let suffix = next_suffix(&backlog.child_suffixes(parent_number));
            let subtask_id = format_subtask_id(parent_number, suffix);
            let now = Utc::now();
            let subtask = WorkItem {
                id: subtask_id.clone(),
                title: title.to_string(),
                description: desc.map(str::to_string),
                item_type: ItemType::Feature,
                priority: parent_priority,
                story_points: points,
                status: ItemStatus::Backlog,
                sprint_id: parent_sprint_id,
                acceptance_criteria: parent_ac,
                dependencies: vec![],
                parent_id: Some(parent_id.to_string()),
                subtasks: vec![],
                failure_reason: None,
                created_at: now,
                updated_at: now,
            };
            backlog.items.push(subtask.clone());

            let parent = backlog
                .get_mut(parent_id)
                .ok_or_else(|| SprintyError::ItemNotFound(parent_id.to_string()))?;
            parent.subtasks.push(subtask_id);
            parent.updated_at = now;

            backlog.recompute_metadata();
            Ok(subtask)
        })?
    }

    /// Derive the parent's status from its non-cancelled children, by the
    /// first matching rule (spec §4.2).
    pub fn roll_up(&self, parent_id: &str) -> Result<ItemStatus> {
        store::update::<Backlog, _, _>(&self.path, |backlog| -> Result<ItemStatus> {
            let subtask_ids = backlog
                .get(parent_id)
                .ok_or_else(|| SprintyError::ItemNotFound(parent_id.to_string()))?
                .subtasks
                .clone();

            let children: Vec<ItemStatus> = subtask_ids
                .iter()
                .filter_map(|id| backlog.get(id))
                .filter(|c| c.status != ItemStatus::Cancelled)
                .map(|c| c.status)
                .collect();

            let new_status = derive_rollup_status(&children);

            let parent = backlog
                .get_mut(parent_id)
                .ok_or_else(|| SprintyError::ItemNotFound(parent_id.to_string()))?;
            parent.status = new_status;
            parent.updated_at = Utc::now();
            Ok(new_status)
        })?
    }
}

fn derive_rollup_status(children: &[ItemStatus]) -> ItemStatus {
    if children.iter().any(|s| *s == ItemStatus::QaFailed) {
        return ItemStatus::QaFailed;
    }
    if children.iter().any(|s| *s == ItemStatus::InProgress) {
        return ItemStatus::InProgress;
    }
    if children
        .iter()
        .any(|s| matches!(s, ItemStatus::Implemented | ItemStatus::QaInProgress))
    {
        return ItemStatus::Implemented;
    }
    let all_qa_passed = !children.is_empty() && children.iter().all(|s| *s == ItemStatus::QaPassed);
    let all_done = !children.is_empty() && children.iter().all(|s| *s == ItemStatus::Done);
    if all_qa_passed && !all_done {
        return ItemStatus::QaPassed;
    }
    if children.iter().all(|s| matches!(s, ItemStatus::Done | ItemStatus::Cancelled)) {
        return ItemStatus::Done;
    }
    ItemStatus::InProgress
}

pub fn backlog_path(state_dir: &Path) -> PathBuf {
    state_dir.join("backlog.json")
}
