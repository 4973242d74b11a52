//! Target-side entities and their insert drafts.

use crate::mapping::{FieldValue, MapTarget, MappingError, required};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A migrated project. `uuid` is the join key back to the legacy project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub uuid: Uuid,
    pub is_active: bool,
    pub start_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
}

/// A baseline snapshot of a project schedule, unique per (project, number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePlan {
    pub id: i64,
    pub created_at: NaiveDate,
    pub base_number: i64,
    pub project_id: i64,
    pub base_plan_start_date: NaiveDateTime,
    pub base_plan_finish_date: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// One synchronization snapshot. Parentless versions are baseline roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    pub migration_date: NaiveDateTime,
    pub base_plan_id: Option<i64>,
    pub project_id: i64,
    pub parent_version_id: Option<i64>,
}

impl Version {
    pub fn is_root(&self) -> bool {
        self.parent_version_id.is_none()
    }
}

/// A migrated task snapshot carrying its key-date label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDates {
    pub id: i64,
    pub name: String,
    pub task_start_date: NaiveDateTime,
    pub task_finish_date: NaiveDateTime,
    pub task_uuid: Uuid,
    pub task_name: Option<String>,
    pub version_id: i64,
    pub base_plan_id: Option<i64>,
    pub project_id: i64,
    pub updated_at: Option<NaiveDateTime>,
}

impl KeyDates {
    pub fn dates(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.task_start_date, self.task_finish_date)
    }
}

impl MapTarget for KeyDates {
    const ENTITY: &'static str = "KeyDates";

    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), MappingError> {
        match field {
            "name" => self.name = required(value.into_text(field)?, Self::ENTITY, "name")?,
            "task_start_date" => {
                self.task_start_date =
                    required(value.into_datetime(field)?, Self::ENTITY, "task_start_date")?
            }
            "task_finish_date" => {
                self.task_finish_date =
                    required(value.into_datetime(field)?, Self::ENTITY, "task_finish_date")?
            }
            "task_uuid" => {
                self.task_uuid = required(value.into_uuid(field)?, Self::ENTITY, "task_uuid")?
            }
            "task_name" => self.task_name = value.into_text(field)?,
            "updated_at" => self.updated_at = value.into_datetime(field)?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Insert drafts, populated by the mapper plus caller overrides.
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: Option<String>,
    pub uuid: Option<Uuid>,
    pub is_active: bool,
    pub start_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
}

impl Default for NewProject {
    fn default() -> Self {
        Self {
            name: None,
            uuid: None,
            is_active: true,
            start_date: None,
            finish_date: None,
        }
    }
}

impl MapTarget for NewProject {
    const ENTITY: &'static str = "Project";

    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), MappingError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "uuid" => self.uuid = value.into_uuid(field)?,
            "is_active" => self.is_active = value.into_bool(field)?.unwrap_or(true),
            "start_date" => self.start_date = value.into_datetime(field)?,
            "finish_date" => self.finish_date = value.into_datetime(field)?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBasePlan {
    pub created_at: Option<NaiveDate>,
    pub base_number: Option<i64>,
    pub project_id: Option<i64>,
    pub base_plan_start_date: Option<NaiveDateTime>,
    pub base_plan_finish_date: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl MapTarget for NewBasePlan {
    const ENTITY: &'static str = "BasePlan";

    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), MappingError> {
        match field {
            "created_at" => self.created_at = value.into_date(field)?,
            "base_number" => self.base_number = value.into_int(field)?,
            "project_id" => self.project_id = value.into_int(field)?,
            "base_plan_start_date" => self.base_plan_start_date = value.into_datetime(field)?,
            "base_plan_finish_date" => self.base_plan_finish_date = value.into_datetime(field)?,
            "updated_at" => self.updated_at = value.into_datetime(field)?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub migration_date: NaiveDateTime,
    pub base_plan_id: Option<i64>,
    pub project_id: i64,
    pub parent_version_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewKeyDates {
    pub name: Option<String>,
    pub task_start_date: Option<NaiveDateTime>,
    pub task_finish_date: Option<NaiveDateTime>,
    pub task_uuid: Option<Uuid>,
    pub task_name: Option<String>,
    pub version_id: Option<i64>,
    pub base_plan_id: Option<i64>,
    pub project_id: Option<i64>,
    pub updated_at: Option<NaiveDateTime>,
}

impl MapTarget for NewKeyDates {
    const ENTITY: &'static str = "KeyDates";

    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), MappingError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "task_start_date" => self.task_start_date = value.into_datetime(field)?,
            "task_finish_date" => self.task_finish_date = value.into_datetime(field)?,
            "task_uuid" => self.task_uuid = value.into_uuid(field)?,
            "task_name" => self.task_name = value.into_text(field)?,
            "version_id" => self.version_id = value.into_int(field)?,
            "base_plan_id" => self.base_plan_id = value.into_int(field)?,
            "project_id" => self.project_id = value.into_int(field)?,
            "updated_at" => self.updated_at = value.into_datetime(field)?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}
