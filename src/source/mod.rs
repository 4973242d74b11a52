//! Read-only view of the legacy scheduling schema.
//!
//! A [`SourceReader`] hands out fully loaded [`SourceProject`]s: every
//! baseline already carries its task, and every task carries whatever part of
//! the key-date lookup chain exists in the legacy store.

mod db;
pub mod schema;

pub use db::SourceDb;

use crate::error::MigrationResult;
use crate::mapping::{FieldMap, FieldValue, MapSource, MappingError};
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Anything that can list the legacy projects.
pub trait SourceReader: Send + Sync {
    fn get_all_projects(&self) -> MigrationResult<Vec<SourceProject>>;
}

impl SourceReader for Vec<SourceProject> {
    fn get_all_projects(&self) -> MigrationResult<Vec<SourceProject>> {
        Ok(self.clone())
    }
}

/// A legacy project with its baselines (creation order) and tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProject {
    pub uid: Uuid,
    pub name: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
    pub baselines: Vec<SourceBaseline>,
    pub tasks: Vec<SourceTask>,
}

impl SourceProject {
    pub fn new(uid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: Some(name.into()),
            start_date: None,
            finish_date: None,
            baselines: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_dates(mut self, start: NaiveDateTime, finish: NaiveDateTime) -> Self {
        self.start_date = Some(start);
        self.finish_date = Some(finish);
        self
    }

    pub fn with_task(mut self, task: SourceTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Add a baseline row and keep the list ordered by creation timestamp.
    pub fn with_baseline(mut self, baseline: SourceBaseline) -> Self {
        self.baselines.push(baseline);
        self.baselines.sort_by_key(|b| b.created_date);
        self
    }

    /// Tasks with a resolvable key date, in source order.
    pub fn key_date_tasks(&self) -> impl Iterator<Item = &SourceTask> {
        self.tasks.iter().filter(|t| t.has_key_date())
    }
}

/// One baseline row. Several rows share a number, one per task snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBaseline {
    pub number: i64,
    pub created_date: NaiveDateTime,
    pub start_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
    pub task_uid: Uuid,
    pub task: Option<SourceTask>,
}

impl SourceBaseline {
    pub fn new(number: i64, created_date: NaiveDateTime, task: SourceTask) -> Self {
        Self {
            number,
            created_date,
            start_date: task.start_date,
            finish_date: task.finish_date,
            task_uid: task.uid,
            task: Some(task),
        }
    }

    /// The baseline's task, when it resolves to a key date.
    pub fn key_date_task(&self) -> Option<&SourceTask> {
        self.task.as_ref().filter(|t| t.has_key_date())
    }
}

/// Value of the lookup table entry referenced by a custom field.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupValue {
    pub text: Option<String>,
}

/// The key-date custom field attached to a task.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFieldValue {
    pub code_value: String,
    pub lookup: Option<LookupValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceTask {
    pub uid: Uuid,
    pub name: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
    pub custom_value: Option<CustomFieldValue>,
}

impl SourceTask {
    pub fn new(
        uid: Uuid,
        name: impl Into<String>,
        start_date: NaiveDateTime,
        finish_date: NaiveDateTime,
    ) -> Self {
        Self {
            uid,
            name: Some(name.into()),
            start_date: Some(start_date),
            finish_date: Some(finish_date),
            custom_value: None,
        }
    }

    /// Attach a resolved key-date label through a synthetic lookup code.
    pub fn with_key_date(mut self, label: impl Into<String>) -> Self {
        self.custom_value = Some(CustomFieldValue {
            code_value: self.uid.to_string(),
            lookup: Some(LookupValue {
                text: Some(label.into()),
            }),
        });
        self
    }

    /// Walk custom field -> lookup value -> text. Empty labels do not count.
    pub fn key_date(&self) -> Option<&str> {
        self.custom_value
            .as_ref()?
            .lookup
            .as_ref()?
            .text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn has_key_date(&self) -> bool {
        self.key_date().is_some()
    }

    /// Deferred accessor used by the mapper; fails when the chain is broken.
    pub fn resolve_key_date(&self) -> Result<String, MappingError> {
        let custom = self
            .custom_value
            .as_ref()
            .ok_or_else(|| MappingError::unresolved("key_date", "task has no key-date custom field"))?;
        let lookup = custom.lookup.as_ref().ok_or_else(|| {
            MappingError::unresolved(
                "key_date",
                format!("lookup value {} is missing", custom.code_value),
            )
        })?;
        lookup
            .text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                MappingError::unresolved(
                    "key_date",
                    format!("lookup value {} has no text", custom.code_value),
                )
            })
    }

    pub fn dates(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        (self.start_date, self.finish_date)
    }
}

// -----------------------------------------------------------------------------
// Field maps
// -----------------------------------------------------------------------------

const PROJECT_FIELDS: &[FieldMap<SourceProject>] = &[
    FieldMap {
        source: "proj_name",
        target: "name",
        resolve: |p| Ok(p.name.clone().into()),
    },
    FieldMap {
        source: "proj_uid",
        target: "uuid",
        resolve: |p| Ok(FieldValue::Uuid(p.uid)),
    },
    FieldMap {
        source: "proj_info_start_date",
        target: "start_date",
        resolve: |p| Ok(p.start_date.into()),
    },
    FieldMap {
        source: "proj_info_finish_date",
        target: "finish_date",
        resolve: |p| Ok(p.finish_date.into()),
    },
];

const TASK_FIELDS: &[FieldMap<SourceTask>] = &[
    FieldMap {
        source: "task_start_date",
        target: "task_start_date",
        resolve: |t| Ok(t.start_date.into()),
    },
    FieldMap {
        source: "task_finish_date",
        target: "task_finish_date",
        resolve: |t| Ok(t.finish_date.into()),
    },
    FieldMap {
        source: "task_uid",
        target: "task_uuid",
        resolve: |t| Ok(FieldValue::Uuid(t.uid)),
    },
    FieldMap {
        source: "key_date",
        target: "name",
        resolve: |t| t.resolve_key_date().map(FieldValue::Text),
    },
    FieldMap {
        source: "task_name",
        target: "task_name",
        resolve: |t| Ok(t.name.clone().into()),
    },
];

const BASELINE_FIELDS: &[FieldMap<SourceBaseline>] = &[
    FieldMap {
        source: "tb_base_num",
        target: "base_number",
        resolve: |b| Ok(FieldValue::Int(b.number)),
    },
    FieldMap {
        source: "created_date",
        target: "created_at",
        resolve: |b| Ok(FieldValue::Date(b.created_date.date())),
    },
];

impl MapSource for SourceProject {
    fn field_map() -> &'static [FieldMap<Self>] {
        PROJECT_FIELDS
    }
}

impl MapSource for SourceTask {
    fn field_map() -> &'static [FieldMap<Self>] {
        TASK_FIELDS
    }
}

impl MapSource for SourceBaseline {
    fn field_map() -> &'static [FieldMap<Self>] {
        BASELINE_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{map_new, map_onto};
    use crate::types::{NewKeyDates, NewProject};
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn task() -> SourceTask {
        SourceTask::new(Uuid::from_u128(7), "Pour foundation", ts(1), ts(3))
    }

    #[test]
    fn key_date_requires_full_chain() {
        let mut t = task();
        assert!(!t.has_key_date());

        t.custom_value = Some(CustomFieldValue {
            code_value: "42".into(),
            lookup: None,
        });
        assert!(!t.has_key_date());
        assert!(t.resolve_key_date().unwrap_err().to_string().contains("42"));

        t.custom_value = Some(CustomFieldValue {
            code_value: "42".into(),
            lookup: Some(LookupValue {
                text: Some("  ".into()),
            }),
        });
        assert!(!t.has_key_date());

        let t = task().with_key_date("Gate 1");
        assert_eq!(t.key_date(), Some("Gate 1"));
    }

    #[test]
    fn task_maps_onto_key_dates_draft() {
        let draft: NewKeyDates = map_new(
            &task().with_key_date("Gate 1"),
            vec![("version_id", FieldValue::Int(4))],
        )
        .unwrap();
        assert_eq!(draft.name.as_deref(), Some("Gate 1"));
        assert_eq!(draft.task_name.as_deref(), Some("Pour foundation"));
        assert_eq!(draft.task_uuid, Some(Uuid::from_u128(7)));
        assert_eq!(draft.task_start_date, Some(ts(1)));
        assert_eq!(draft.version_id, Some(4));
        assert_eq!(draft.project_id, None);
    }

    #[test]
    fn task_without_key_date_fails_to_map() {
        let mut draft = NewKeyDates::default();
        let err = map_onto(&mut draft, &task()).unwrap_err();
        assert!(matches!(err, MappingError::Unresolved { ref field, .. } if field == "key_date"));
        assert_eq!(draft, NewKeyDates::default());
    }

    #[test]
    fn project_maps_identity_and_dates() {
        let project = SourceProject::new(Uuid::from_u128(1), "Bridge").with_dates(ts(1), ts(30));
        let draft: NewProject = map_new(&project, vec![]).unwrap();
        assert_eq!(draft.uuid, Some(Uuid::from_u128(1)));
        assert_eq!(draft.name.as_deref(), Some("Bridge"));
        assert_eq!(draft.finish_date, Some(ts(30)));
        assert!(draft.is_active);
    }

    #[test]
    fn baselines_stay_in_creation_order() {
        let project = SourceProject::new(Uuid::from_u128(1), "Bridge")
            .with_baseline(SourceBaseline::new(2, ts(9), task()))
            .with_baseline(SourceBaseline::new(1, ts(2), task()));
        let numbers: Vec<i64> = project.baselines.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn declared_source_fields() {
        fn target_of<S: MapSource>(source_field: &str) -> Option<&'static str> {
            S::field_map()
                .iter()
                .find(|m| m.source == source_field)
                .map(|m| m.target)
        }
        assert_eq!(target_of::<SourceTask>("key_date"), Some("name"));
        assert_eq!(target_of::<SourceBaseline>("tb_base_num"), Some("base_number"));
        assert_eq!(target_of::<SourceProject>("siteid"), None);
    }
}
