//! Grouping of a project's key-date baselines into base plans.

use crate::error::{MigrationError, MigrationResult};
use crate::source::{SourceBaseline, SourceProject, SourceTask};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of a base plan derived from the legacy baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub number: i64,
    /// Calendar date of the earliest baseline row carrying this number.
    pub earliest_date: NaiveDate,
}

/// The baselines sharing one [`GroupKey`], with their key-date tasks.
#[derive(Debug, Clone)]
pub struct BaselineGroup<'a> {
    pub key: GroupKey,
    /// First baseline row encountered for the group.
    pub first: &'a SourceBaseline,
    /// Distinct tasks in first-encounter order.
    pub tasks: Vec<&'a SourceTask>,
}

impl<'a> BaselineGroup<'a> {
    fn new(key: GroupKey, first: &'a SourceBaseline) -> Self {
        Self {
            key,
            first,
            tasks: Vec::new(),
        }
    }

    fn push(&mut self, task: &'a SourceTask) {
        if !self.tasks.iter().any(|t| t.uid == task.uid) {
            self.tasks.push(task);
        }
    }

    /// Earliest task start and latest task finish across the group.
    pub fn date_range(&self, project_uid: Uuid) -> MigrationResult<(NaiveDateTime, NaiveDateTime)> {
        let start = self.tasks.iter().filter_map(|t| t.start_date).min();
        let finish = self.tasks.iter().filter_map(|t| t.finish_date).max();
        match (start, finish) {
            (Some(start), Some(finish)) => Ok((start, finish)),
            _ => Err(MigrationError::UndatedBaseline {
                project_uid,
                base_number: self.key.number,
            }),
        }
    }
}

/// Baselines whose task resolves to a key date, in source order.
pub fn key_date_baselines(project: &SourceProject) -> Vec<(&SourceBaseline, &SourceTask)> {
    project
        .baselines
        .iter()
        .filter_map(|b| b.key_date_task().map(|t| (b, t)))
        .collect()
}

/// Earliest creation date per baseline number.
fn earliest_dates(baselines: &[(&SourceBaseline, &SourceTask)]) -> HashMap<i64, NaiveDate> {
    let mut earliest: HashMap<i64, NaiveDate> = HashMap::new();
    for (baseline, _) in baselines {
        let date = baseline.created_date.date();
        earliest
            .entry(baseline.number)
            .and_modify(|d| *d = (*d).min(date))
            .or_insert(date);
    }
    earliest
}

/// Group key-date baselines, keeping groups in first-encounter order.
///
/// `include` decides per baseline number whether it takes part; the
/// existing-project path uses it to keep only numbers not yet migrated.
pub fn group_baselines<'a>(
    baselines: &[(&'a SourceBaseline, &'a SourceTask)],
    include: impl Fn(i64) -> bool,
) -> Vec<BaselineGroup<'a>> {
    let earliest = earliest_dates(baselines);
    let mut groups: Vec<BaselineGroup<'a>> = Vec::new();

    for &(baseline, task) in baselines {
        if !include(baseline.number) {
            continue;
        }
        let key = GroupKey {
            number: baseline.number,
            earliest_date: earliest
                .get(&baseline.number)
                .copied()
                .unwrap_or_else(|| baseline.created_date.date()),
        };
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.push(task),
            None => {
                let mut group = BaselineGroup::new(key, baseline);
                group.push(task);
                groups.push(group);
            }
        }
    }

    groups
}

/// Distinct tasks per baseline number, numbers in first-encounter order.
pub fn tasks_by_number<'a>(
    baselines: &[(&'a SourceBaseline, &'a SourceTask)],
) -> Vec<(i64, Vec<&'a SourceTask>)> {
    let mut out: Vec<(i64, Vec<&'a SourceTask>)> = Vec::new();
    for &(baseline, task) in baselines {
        let idx = match out.iter().position(|(n, _)| *n == baseline.number) {
            Some(idx) => idx,
            None => {
                out.push((baseline.number, Vec::new()));
                out.len() - 1
            }
        };
        let tasks = &mut out[idx].1;
        if !tasks.iter().any(|t| t.uid == task.uid) {
            tasks.push(task);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn task(n: u128, start: u32, finish: u32) -> SourceTask {
        SourceTask::new(Uuid::from_u128(n), format!("Task {n}"), ts(start, 8), ts(finish, 17))
            .with_key_date("Milestone")
    }

    #[test]
    fn groups_by_number_with_earliest_date() {
        let project = SourceProject::new(Uuid::from_u128(1), "Depot")
            .with_baseline(SourceBaseline::new(1, ts(3, 9), task(10, 5, 6)))
            .with_baseline(SourceBaseline::new(1, ts(7, 9), task(11, 2, 4)))
            .with_baseline(SourceBaseline::new(2, ts(8, 9), task(12, 9, 12)));

        let baselines = key_date_baselines(&project);
        let groups = group_baselines(&baselines, |_| true);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.number, 1);
        assert_eq!(groups[0].key.earliest_date, ts(3, 0).date());
        assert_eq!(groups[0].tasks.len(), 2);
        assert_eq!(groups[1].key.number, 2);
        assert_eq!(groups[1].key.earliest_date, ts(8, 0).date());
    }

    #[test]
    fn date_range_ignores_task_order() {
        let project = SourceProject::new(Uuid::from_u128(1), "Depot")
            .with_baseline(SourceBaseline::new(0, ts(1, 9), task(10, 5, 9)))
            .with_baseline(SourceBaseline::new(0, ts(1, 10), task(11, 2, 4)))
            .with_baseline(SourceBaseline::new(0, ts(1, 11), task(12, 3, 20)));

        let baselines = key_date_baselines(&project);
        let groups = group_baselines(&baselines, |_| true);
        let (start, finish) = groups[0].date_range(project.uid).unwrap();
        assert_eq!(start, ts(2, 8));
        assert_eq!(finish, ts(20, 17));
    }

    #[test]
    fn baselines_without_key_dates_are_dropped() {
        let plain = SourceTask::new(Uuid::from_u128(20), "Plain", ts(1, 8), ts(2, 8));
        let project = SourceProject::new(Uuid::from_u128(1), "Depot")
            .with_baseline(SourceBaseline::new(0, ts(1, 9), plain))
            .with_baseline(SourceBaseline::new(1, ts(2, 9), task(10, 1, 2)));

        let baselines = key_date_baselines(&project);
        assert_eq!(baselines.len(), 1);
        let groups = group_baselines(&baselines, |n| n != 1);
        assert!(groups.is_empty());
    }

    #[test]
    fn undated_group_is_an_error() {
        let mut undated = task(10, 1, 2);
        undated.start_date = None;
        let project = SourceProject::new(Uuid::from_u128(1), "Depot")
            .with_baseline(SourceBaseline::new(4, ts(1, 9), undated));

        let baselines = key_date_baselines(&project);
        let groups = group_baselines(&baselines, |_| true);
        let err = groups[0].date_range(project.uid).unwrap_err();
        assert!(matches!(err, MigrationError::UndatedBaseline { base_number: 4, .. }));
    }

    #[test]
    fn tasks_by_number_deduplicates() {
        let project = SourceProject::new(Uuid::from_u128(1), "Depot")
            .with_baseline(SourceBaseline::new(1, ts(1, 9), task(10, 1, 2)))
            .with_baseline(SourceBaseline::new(0, ts(2, 9), task(10, 1, 2)))
            .with_baseline(SourceBaseline::new(1, ts(3, 9), task(10, 1, 2)));

        let baselines = key_date_baselines(&project);
        let numbers = tasks_by_number(&baselines);
        assert_eq!(numbers.len(), 2);
        assert_eq!(numbers[0].0, 1);
        assert_eq!(numbers[0].1.len(), 1);
        assert_eq!(numbers[1].0, 0);
    }
}
