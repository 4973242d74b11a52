//! SQLite-backed reader for the legacy tables.

use super::{
    CustomFieldValue, LookupValue, SourceBaseline, SourceProject, SourceReader, SourceTask,
};
use crate::db::uuid_column;
use crate::error::MigrationResult;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Read-only handle to the legacy store.
#[derive(Clone)]
pub struct SourceDb {
    conn: Arc<Mutex<Connection>>,
    key_date_field_uid: String,
}

impl SourceDb {
    /// Open an existing legacy database file read-only.
    pub fn open<P: AsRef<Path>>(path: P, key_date_field_uid: impl Into<String>) -> MigrationResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA busy_timeout=5000;")?;
        Ok(Self::from_connection(conn, key_date_field_uid))
    }

    /// Wrap an already opened connection (fixtures, in-memory dumps).
    pub fn from_connection(conn: Connection, key_date_field_uid: impl Into<String>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            key_date_field_uid: key_date_field_uid.into(),
        }
    }

    pub fn key_date_field_uid(&self) -> &str {
        &self.key_date_field_uid
    }

    fn with_conn<F, T>(&self, f: F) -> MigrationResult<T>
    where
        F: FnOnce(&Connection) -> MigrationResult<T>,
    {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }
}

impl SourceReader for SourceDb {
    fn get_all_projects(&self) -> MigrationResult<Vec<SourceProject>> {
        self.with_conn(|conn| {
            let lookups = load_lookup_values(conn)?;
            let custom_values = load_key_date_codes(conn, &self.key_date_field_uid)?;
            let (mut tasks_by_project, tasks_by_uid) =
                load_tasks(conn, &custom_values, &lookups)?;
            let mut baselines_by_project = load_baselines(conn, &tasks_by_uid)?;

            let mut stmt = conn.prepare(
                "SELECT PROJ_UID, PROJ_NAME, PROJ_INFO_START_DATE, PROJ_INFO_FINISH_DATE
                 FROM MSP_PROJECTS ORDER BY rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    uuid_column(row, 0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<NaiveDateTime>>(2)?,
                    row.get::<_, Option<NaiveDateTime>>(3)?,
                ))
            })?;

            let mut projects = Vec::new();
            for row in rows {
                let (uid, name, start_date, finish_date) = row?;
                projects.push(SourceProject {
                    uid,
                    name: name.map(|n| n.trim_end().to_string()),
                    start_date,
                    finish_date,
                    baselines: baselines_by_project.remove(&uid).unwrap_or_default(),
                    tasks: tasks_by_project.remove(&uid).unwrap_or_default(),
                });
            }

            debug!(count = projects.len(), "Loaded legacy projects");
            Ok(projects)
        })
    }
}

/// Normalize a lookup code so integer and text codes compare equal.
fn code_key(value: Value) -> Option<String> {
    match value {
        Value::Integer(i) => Some(i.to_string()),
        Value::Text(s) => Some(s.trim().to_uppercase()),
        Value::Real(f) => Some(f.to_string()),
        Value::Null | Value::Blob(_) => None,
    }
}

fn load_lookup_values(conn: &Connection) -> MigrationResult<HashMap<String, Option<String>>> {
    let mut stmt = conn.prepare(
        "SELECT LT_STRUCT_UID, LT_VALUE_TEXT FROM MSP_LOOKUP_TABLE_VALUES ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Value>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut lookups = HashMap::new();
    for row in rows {
        let (code, text) = row?;
        if let Some(key) = code_key(code) {
            lookups.entry(key).or_insert(text);
        }
    }
    Ok(lookups)
}

fn load_key_date_codes(conn: &Connection, field_uid: &str) -> MigrationResult<HashMap<Uuid, String>> {
    let mut stmt = conn.prepare(
        "SELECT TASK_UID, CODE_VALUE FROM MSP_TASK_CUSTOM_FIELD_VALUES
         WHERE UPPER(MD_PROP_UID) = UPPER(?1)
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![field_uid], |row| {
        Ok((uuid_column(row, 0)?, row.get::<_, Value>(1)?))
    })?;

    let mut codes = HashMap::new();
    for row in rows {
        let (task_uid, code) = row?;
        if let Some(key) = code_key(code) {
            codes.entry(task_uid).or_insert(key);
        }
    }
    Ok(codes)
}

type TasksByProject = HashMap<Uuid, Vec<SourceTask>>;
type TasksByUid = HashMap<Uuid, SourceTask>;

fn load_tasks(
    conn: &Connection,
    custom_values: &HashMap<Uuid, String>,
    lookups: &HashMap<String, Option<String>>,
) -> MigrationResult<(TasksByProject, TasksByUid)> {
    let mut stmt = conn.prepare(
        "SELECT TASK_UID, PROJ_UID, TASK_NAME, TASK_START_DATE, TASK_FINISH_DATE
         FROM MSP_TASKS ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            uuid_column(row, 0)?,
            uuid_column(row, 1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<NaiveDateTime>>(3)?,
            row.get::<_, Option<NaiveDateTime>>(4)?,
        ))
    })?;

    let mut by_project: TasksByProject = HashMap::new();
    let mut by_uid: TasksByUid = HashMap::new();
    for row in rows {
        let (uid, project_uid, name, start_date, finish_date) = row?;
        let custom_value = custom_values.get(&uid).map(|code| CustomFieldValue {
            code_value: code.clone(),
            lookup: lookups.get(code).map(|text| LookupValue { text: text.clone() }),
        });
        let task = SourceTask {
            uid,
            name,
            start_date,
            finish_date,
            custom_value,
        };
        by_uid.entry(uid).or_insert_with(|| task.clone());
        by_project.entry(project_uid).or_default().push(task);
    }
    Ok((by_project, by_uid))
}

fn load_baselines(
    conn: &Connection,
    tasks_by_uid: &TasksByUid,
) -> MigrationResult<HashMap<Uuid, Vec<SourceBaseline>>> {
    let mut stmt = conn.prepare(
        "SELECT PROJ_UID, TB_BASE_NUM, CREATED_DATE, TB_BASE_START, TB_BASE_FINISH, TASK_UID
         FROM MSP_TASK_BASELINES
         ORDER BY CREATED_DATE ASC, rowid ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            uuid_column(row, 0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<NaiveDateTime>>(2)?,
            row.get::<_, Option<NaiveDateTime>>(3)?,
            row.get::<_, Option<NaiveDateTime>>(4)?,
            uuid_column(row, 5)?,
        ))
    })?;

    let mut by_project: HashMap<Uuid, Vec<SourceBaseline>> = HashMap::new();
    for row in rows {
        let (project_uid, number, created_date, start_date, finish_date, task_uid) = row?;
        let Some(created_date) = created_date else {
            warn!(project = %project_uid, base_number = number, task = %task_uid, "Skipping baseline row without CREATED_DATE");
            continue;
        };
        by_project.entry(project_uid).or_default().push(SourceBaseline {
            number,
            created_date,
            start_date,
            finish_date,
            task_uid,
            task: tasks_by_uid.get(&task_uid).cloned(),
        });
    }
    Ok(by_project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::source::schema::{DEFAULT_KEY_DATE_FIELD_UID, LEGACY_SCHEMA};

    fn fixture() -> SourceDb {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(LEGACY_SCHEMA).unwrap();
        conn.execute_batch(&format!(
            "INSERT INTO MSP_PROJECTS (PROJ_UID, PROJ_NAME, PROJ_INFO_START_DATE, PROJ_INFO_FINISH_DATE)
             VALUES ('00000000-0000-0000-0000-000000000001', 'Depot   ', '2024-01-01 00:00:00', '2024-12-31 00:00:00');
             INSERT INTO MSP_TASKS (TASK_UID, PROJ_UID, TASK_NAME, TASK_START_DATE, TASK_FINISH_DATE) VALUES
               ('00000000-0000-0000-0000-0000000000a1', '00000000-0000-0000-0000-000000000001', 'Permit', '2024-02-01 08:00:00', '2024-02-10 17:00:00'),
               ('00000000-0000-0000-0000-0000000000a2', '00000000-0000-0000-0000-000000000001', 'Survey', '2024-03-01 08:00:00', '2024-03-05 17:00:00');
             INSERT INTO MSP_TASK_CUSTOM_FIELD_VALUES (CUSTOM_FIELD_UID, TASK_UID, PROJ_UID, MD_PROP_UID, CODE_VALUE) VALUES
               ('c1', '00000000-0000-0000-0000-0000000000A1', '00000000-0000-0000-0000-000000000001', '{field}', '17'),
               ('c2', '00000000-0000-0000-0000-0000000000a2', '00000000-0000-0000-0000-000000000001', 'other-field', '17');
             INSERT INTO MSP_LOOKUP_TABLE_VALUES (LCID, LT_STRUCT_UID, LT_VALUE_TEXT) VALUES (1049, '17', 'Permit granted');
             INSERT INTO MSP_TASK_BASELINES (PROJ_UID, TB_BASE_NUM, CREATED_DATE, TASK_UID) VALUES
               ('00000000-0000-0000-0000-000000000001', 0, '2024-01-20 10:00:00', '00000000-0000-0000-0000-0000000000a2'),
               ('00000000-0000-0000-0000-000000000001', 0, '2024-01-15 10:00:00', '00000000-0000-0000-0000-0000000000a1'),
               ('00000000-0000-0000-0000-000000000001', 1, NULL, '00000000-0000-0000-0000-0000000000a1');",
            field = DEFAULT_KEY_DATE_FIELD_UID.to_lowercase()
        ))
        .unwrap();
        SourceDb::from_connection(conn, DEFAULT_KEY_DATE_FIELD_UID)
    }

    #[test]
    fn loads_projects_with_nested_tasks_and_baselines() {
        let projects = fixture().get_all_projects().unwrap();
        assert_eq!(projects.len(), 1);

        let project = &projects[0];
        assert_eq!(project.name.as_deref(), Some("Depot"));
        assert_eq!(project.tasks.len(), 2);
        // Row without CREATED_DATE is dropped, the rest are in creation order.
        assert_eq!(project.baselines.len(), 2);
        assert_eq!(project.baselines[0].task_uid, Uuid::from_u128(0xa1));
        assert_eq!(project.baselines[1].task_uid, Uuid::from_u128(0xa2));
    }

    #[test]
    fn key_date_resolved_only_through_configured_field() {
        let projects = fixture().get_all_projects().unwrap();
        let project = &projects[0];

        let permit = project.tasks.iter().find(|t| t.uid == Uuid::from_u128(0xa1)).unwrap();
        assert_eq!(permit.key_date(), Some("Permit granted"));

        let survey = project.tasks.iter().find(|t| t.uid == Uuid::from_u128(0xa2)).unwrap();
        assert!(!survey.has_key_date());

        assert!(project.baselines[0].key_date_task().is_some());
        assert!(project.baselines[1].key_date_task().is_none());
    }

    #[test]
    fn malformed_uuid_fails_the_read() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(LEGACY_SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO MSP_PROJECTS (PROJ_UID, PROJ_NAME) VALUES ('not-a-uuid', 'x')",
            [],
        )
        .unwrap();
        let source = SourceDb::from_connection(conn, DEFAULT_KEY_DATE_FIELD_UID);
        assert!(matches!(
            source.get_all_projects(),
            Err(MigrationError::Database(_))
        ));
    }
}
