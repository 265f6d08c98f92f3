//! Group assignment.
//!
//! Each event is grouped on its own: registrants are sorted by name (stable,
//! so equal names keep table order) and dealt round-robin over
//! `ceil(n / group_size)` groups. Group `k` therefore holds ranks
//! `k-1, k-1+g, k-1+2g, ...` and group sizes differ by at most one.

use crate::domain::model::{CompetitorTable, GroupAssignment, GroupedTable};
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;

/// Assigns a group number to every (event, registrant) pair in `table`.
///
/// Fails only when `group_size` is zero.
pub fn assign_groups(table: &CompetitorTable, group_size: usize) -> Result<GroupAssignment> {
    validate_positive_number("group_size", group_size, 1)?;

    let mut assignment = GroupAssignment::new();
    for event in table.event_universe() {
        let groups = assign_event(table, &event, group_size);
        tracing::debug!(
            "Event {}: {} registrants in {} groups",
            event,
            groups.len(),
            groups.iter().map(|(_, g)| *g).max().unwrap_or(0)
        );
        for (row, group) in groups {
            assignment.insert(&event, row, group);
        }
    }

    Ok(assignment)
}

/// 先分組再把結果掛回原表
pub fn group_table(table: CompetitorTable, group_size: usize) -> Result<GroupedTable> {
    let assignment = assign_groups(&table, group_size)?;
    Ok(GroupedTable::new(table, assignment))
}

/// 回傳 (原始列索引, 組別)，依排序後名次排列
fn assign_event(table: &CompetitorTable, event: &str, group_size: usize) -> Vec<(usize, u32)> {
    let mut registrants: Vec<(usize, &str)> = table
        .iter()
        .enumerate()
        .filter(|(_, competitor)| competitor.is_registered(event))
        .map(|(row, competitor)| (row, competitor.name.as_str()))
        .collect();

    if registrants.is_empty() {
        return Vec::new();
    }

    // sort_by 是穩定排序，同名者維持原表順序
    registrants.sort_by(|a, b| a.1.cmp(b.1));

    let num_groups = registrants.len().div_ceil(group_size).max(1);
    registrants
        .into_iter()
        .enumerate()
        .map(|(rank, (row, _))| (row, (rank % num_groups) as u32 + 1))
        .collect()
}
