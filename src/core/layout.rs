//! Card layout.
//!
//! Cards fill a page column by column: down `rows` slots, then the next
//! column, and after `cols` columns a new page starts. The cursor only moves
//! forward, one slot per card.

use crate::domain::model::{
    GridSpec, GroupedTable, Namecard, Placement, Scorecard, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::utils::error::{CompError, Result};
use crate::utils::validation::{validate_positive_number, validate_range};

const MAX_COORDINATE_MM: f32 = 1000.0;

impl GridSpec {
    pub fn validate(&self, prefix: &str) -> Result<()> {
        validate_positive_number(&format!("{}.rows", prefix), self.rows, 1)?;
        validate_positive_number(&format!("{}.cols", prefix), self.cols, 1)?;
        validate_range(&format!("{}.pitch_x", prefix), self.pitch_x, 1.0, MAX_COORDINATE_MM)?;
        validate_range(&format!("{}.pitch_y", prefix), self.pitch_y, 1.0, MAX_COORDINATE_MM)?;
        validate_range(&format!("{}.origin_x", prefix), self.origin_x, 0.0, MAX_COORDINATE_MM)?;
        validate_range(&format!("{}.origin_y", prefix), self.origin_y, 0.0, MAX_COORDINATE_MM)?;
        Ok(())
    }

    /// 最後一列、最後一欄的卡片也必須完整落在 A4 頁面內
    pub fn validate_fits_page(&self, prefix: &str) -> Result<()> {
        self.validate(prefix)?;

        let (right, bottom) = self.far_corner();
        if right > PAGE_WIDTH_MM {
            return Err(CompError::InvalidConfigValueError {
                field: format!("{}.cols", prefix),
                value: self.cols.to_string(),
                reason: format!(
                    "Cards extend to x={}mm, past the {}mm page width",
                    right, PAGE_WIDTH_MM
                ),
            });
        }
        if bottom > PAGE_HEIGHT_MM {
            return Err(CompError::InvalidConfigValueError {
                field: format!("{}.rows", prefix),
                value: self.rows.to_string(),
                reason: format!(
                    "Cards extend to y={}mm, past the {}mm page height",
                    bottom, PAGE_HEIGHT_MM
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct GridCursor {
    page: usize,
    row: usize,
    col: usize,
}

impl GridCursor {
    fn advance(&mut self, grid: &GridSpec) {
        self.row += 1;
        if self.row == grid.rows {
            self.row = 0;
            self.col += 1;
            if self.col == grid.cols {
                self.col = 0;
                self.page += 1;
            }
        }
    }
}

/// Places `items` on the grid in iteration order.
pub fn place<T, I>(grid: &GridSpec, items: I) -> Result<Vec<Placement<T>>>
where
    I: IntoIterator<Item = T>,
{
    grid.validate("layout")?;

    let mut cursor = GridCursor::default();
    let mut placements = Vec::new();
    for content in items {
        placements.push(Placement {
            page: cursor.page,
            row: cursor.row,
            col: cursor.col,
            x: grid.origin_x + cursor.col as f32 * grid.pitch_x,
            y: grid.origin_y + cursor.row as f32 * grid.pitch_y,
            content,
        });
        cursor.advance(grid);
    }

    Ok(placements)
}

/// `ceil(item_count / (rows * cols))`，沒有卡片時為 0
pub fn page_count(item_count: usize, grid: &GridSpec) -> usize {
    let slots = grid.slots_per_page();
    if slots == 0 {
        return 0;
    }
    item_count.div_ceil(slots)
}

/// 每個 (選手, 項目) 一張成績卡；沒有組別的項目略過
pub fn scorecard_items(grouped: &GroupedTable) -> Vec<Scorecard> {
    grouped
        .rows()
        .flat_map(|(row, competitor)| {
            competitor.events.iter().filter_map(move |event| {
                grouped.group_for(row, event).map(|group| Scorecard {
                    name: competitor.name.clone(),
                    event: event.clone(),
                    group,
                })
            })
        })
        .collect()
}

/// 每位選手一張名牌，列出所有項目 (沒有組別的為 `None`)
pub fn namecard_items(grouped: &GroupedTable) -> Vec<Namecard> {
    grouped
        .rows()
        .map(|(row, competitor)| Namecard {
            name: competitor.name.clone(),
            events: competitor
                .events
                .iter()
                .map(|event| (event.clone(), grouped.group_for(row, event)))
                .collect(),
        })
        .collect()
}

pub fn layout_scorecards(grouped: &GroupedTable, grid: &GridSpec) -> Result<Vec<Placement<Scorecard>>> {
    let placements = place(grid, scorecard_items(grouped))?;
    tracing::debug!(
        "Laid out {} scorecards on {} pages",
        placements.len(),
        page_count(placements.len(), grid)
    );
    Ok(placements)
}

pub fn layout_namecards(grouped: &GroupedTable, grid: &GridSpec) -> Result<Vec<Placement<Namecard>>> {
    let placements = place(grid, namecard_items(grouped))?;
    tracing::debug!(
        "Laid out {} namecards on {} pages",
        placements.len(),
        page_count(placements.len(), grid)
    );
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grouping::group_table;
    use crate::domain::model::{Competitor, CompetitorTable, GroupAssignment};

    #[test]
    fn test_scorecard_grid_wraps_column_then_page() {
        let placements = place(&GridSpec::SCORECARD, 0..9).unwrap();
        let slots: Vec<_> = placements
            .iter()
            .map(|p| (p.page, p.x, p.y))
            .collect();

        assert_eq!(
            slots,
            vec![
                (0, 10.0, 10.0),
                (0, 10.0, 85.0),
                (0, 10.0, 160.0),
                (0, 10.0, 235.0),
                (0, 115.0, 10.0),
                (0, 115.0, 85.0),
                (0, 115.0, 160.0),
                (0, 115.0, 235.0),
                (1, 10.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_zero_rows_rejected() {
        let grid = GridSpec {
            rows: 0,
            ..GridSpec::NAMECARD
        };
        assert!(place(&grid, 0..3).is_err());
    }

    #[test]
    fn test_default_grids_fit_a4() {
        assert!(GridSpec::SCORECARD.validate_fits_page("layout.scorecard").is_ok());
        assert!(GridSpec::NAMECARD.validate_fits_page("layout.namecard").is_ok());
    }

    #[test]
    fn test_extra_row_runs_off_page() {
        let grid = GridSpec {
            rows: 5,
            ..GridSpec::SCORECARD
        };
        let err = grid.validate_fits_page("layout.scorecard").unwrap_err();
        assert!(matches!(
            err,
            CompError::InvalidConfigValueError { ref field, .. } if field == "layout.scorecard.rows"
        ));

        let wide = GridSpec {
            pitch_x: 120.0,
            ..GridSpec::NAMECARD
        };
        assert!(wide.validate_fits_page("layout.namecard").is_err());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, &GridSpec::NAMECARD), 0);
        assert_eq!(page_count(10, &GridSpec::NAMECARD), 1);
        assert_eq!(page_count(11, &GridSpec::NAMECARD), 2);
        assert_eq!(page_count(17, &GridSpec::SCORECARD), 3);
    }

    #[test]
    fn test_scorecards_advance_per_card_not_per_competitor() {
        let table = CompetitorTable::new(vec![
            Competitor::new("Alice", ["333", "222", "444"]),
            Competitor::new("Bob", ["333"]),
        ]);
        let grouped = group_table(table, 2).unwrap();
        let placements = layout_scorecards(&grouped, &GridSpec::SCORECARD).unwrap();

        let order: Vec<_> = placements
            .iter()
            .map(|p| (p.content.name.as_str(), p.content.event.as_str(), p.row))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Alice", "333", 0),
                ("Alice", "222", 1),
                ("Alice", "444", 2),
                ("Bob", "333", 3),
            ]
        );
    }

    #[test]
    fn test_namecard_keeps_event_order_and_absent_groups() {
        let table = CompetitorTable::new(vec![
            Competitor::new("Alice", ["pyram", "333"]),
            Competitor::new("Empty", Vec::<String>::new()),
        ]);
        let grouped = group_table(table, 2).unwrap();
        let cards = namecard_items(&grouped);

        assert_eq!(
            cards[0].events,
            vec![("pyram".to_string(), Some(1)), ("333".to_string(), Some(1))]
        );
        assert!(cards[1].events.is_empty());
    }

    #[test]
    fn test_registered_event_without_group() {
        let table = CompetitorTable::new(vec![
            Competitor::new("Alice", ["333", "clock"]),
            Competitor::new("Bob", ["clock"]),
        ]);
        // 只有 333 有分組，clock 沒有組別欄位
        let mut assignment = GroupAssignment::new();
        assignment.insert("333", 0, 1);
        let grouped = GroupedTable::new(table, assignment);

        let scorecards = layout_scorecards(&grouped, &GridSpec::SCORECARD).unwrap();
        let pairs: Vec<_> = scorecards
            .iter()
            .map(|p| (p.content.name.as_str(), p.content.event.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Alice", "333")]);

        let namecards = layout_namecards(&grouped, &GridSpec::NAMECARD).unwrap();
        assert_eq!(namecards.len(), 2);
        assert_eq!(
            namecards[0].content.events,
            vec![("333".to_string(), Some(1)), ("clock".to_string(), None)]
        );
        assert_eq!(namecards[1].content.events, vec![("clock".to_string(), None)]);
    }

    #[test]
    fn test_no_assignment_at_all() {
        let table = CompetitorTable::new(vec![Competitor::new("Alice", ["333"])]);
        let grouped = GroupedTable::new(table, GroupAssignment::new());

        assert!(layout_scorecards(&grouped, &GridSpec::SCORECARD)
            .unwrap()
            .is_empty());
        let namecards = layout_namecards(&grouped, &GridSpec::NAMECARD).unwrap();
        assert_eq!(namecards[0].content.events, vec![("333".to_string(), None)]);
    }
}
