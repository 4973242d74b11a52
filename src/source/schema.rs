//! DDL of the legacy scheduling tables read by [`super::SourceDb`].
//!
//! The legacy store is owned by another system; this crate never writes to
//! it. The DDL is kept here so fixtures and local dumps share one layout.

/// Default `MD_PROP_UID` of the custom field holding a task's key date.
pub const DEFAULT_KEY_DATE_FIELD_UID: &str = "674EB4DD-ECB7-E811-A2C3-005056ABC6E7";

pub const LEGACY_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS MSP_PROJECTS (
    SiteId TEXT,
    PROJ_UID TEXT NOT NULL PRIMARY KEY,
    PROJ_NAME TEXT,
    PROJ_INFO_START_DATE TEXT,
    PROJ_INFO_FINISH_DATE TEXT
);

CREATE TABLE IF NOT EXISTS MSP_TASKS (
    SiteId INTEGER,
    TASK_UID TEXT NOT NULL,
    PROJ_UID TEXT NOT NULL,
    TASK_NAME TEXT,
    TASK_START_DATE TEXT,
    TASK_FINISH_DATE TEXT,
    PRIMARY KEY (TASK_UID, PROJ_UID)
);

CREATE TABLE IF NOT EXISTS MSP_TASK_CUSTOM_FIELD_VALUES (
    SiteId TEXT,
    CUSTOM_FIELD_UID TEXT NOT NULL PRIMARY KEY,
    TASK_UID TEXT NOT NULL,
    PROJ_UID TEXT NOT NULL,
    MD_PROP_UID TEXT NOT NULL,
    CODE_VALUE TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS MSP_CUSTOM_FIELDS (
    SiteId INTEGER,
    MD_PROP_UID TEXT NOT NULL PRIMARY KEY,
    MD_LOOKUP_TABLE_UID TEXT,
    MD_PROP_NAME TEXT
);

CREATE TABLE IF NOT EXISTS MSP_LOOKUP_TABLE_VALUES (
    SiteId TEXT,
    LCID INTEGER,
    LT_STRUCT_UID TEXT NOT NULL,
    LT_VALUE_TEXT TEXT,
    PRIMARY KEY (LT_STRUCT_UID, LCID)
);

CREATE TABLE IF NOT EXISTS MSP_TASK_BASELINES (
    SiteId TEXT,
    PROJ_UID TEXT NOT NULL,
    TB_BASE_NUM INTEGER NOT NULL,
    CREATED_DATE TEXT,
    TB_BASE_START TEXT,
    TB_BASE_FINISH TEXT,
    TASK_UID TEXT NOT NULL,
    PRIMARY KEY (PROJ_UID, TB_BASE_NUM, TASK_UID)
);
";
