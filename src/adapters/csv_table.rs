//! CSV codec for the competitor table.
//!
//! Input needs `Name` and `Events` columns; `Events` is a `:`-separated list.
//! Any other column is carried through to the grouped output unchanged.

use crate::domain::model::{Competitor, CompetitorTable, GroupedTable};
use crate::utils::error::{CompError, Result};

pub const NAME_COLUMN: &str = "Name";
pub const EVENTS_COLUMN: &str = "Events";
pub const EVENT_DELIMITER: char = ':';

/// 拆解 Events 欄位：去空白、丟掉空項目與重複項目
pub fn parse_events(field: &str) -> Vec<String> {
    let mut events: Vec<String> = Vec::new();
    for token in field.split(EVENT_DELIMITER) {
        let token = token.trim();
        if !token.is_empty() && !events.iter().any(|e| e == token) {
            events.push(token.to_string());
        }
    }
    events
}

pub fn format_events(events: &[String]) -> String {
    events.join(&EVENT_DELIMITER.to_string())
}

pub fn read_table(data: &[u8]) -> Result<CompetitorTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let name_idx = column_index(&columns, NAME_COLUMN)?;
    let events_idx = column_index(&columns, EVENTS_COLUMN)?;

    let mut competitors = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let name = record.get(name_idx).unwrap_or_default().trim();
        if name.is_empty() {
            return Err(CompError::MalformedInputError {
                line,
                message: format!("empty '{}' field", NAME_COLUMN),
            });
        }

        let events = parse_events(record.get(events_idx).unwrap_or_default());
        let fields = record.iter().map(|value| value.to_string()).collect();

        competitors.push(Competitor::new(name, events).with_fields(fields));
    }

    tracing::debug!(
        "Read {} competitors with columns {:?}",
        competitors.len(),
        columns
    );
    Ok(CompetitorTable::with_columns(columns, competitors))
}

/// 原始欄位 + 每個項目一欄組別 (依代碼排序)，沒有組別的格子留空
pub fn write_grouped_table(grouped: &GroupedTable) -> Result<Vec<u8>> {
    let event_columns: Vec<&str> = grouped.assignment.events().collect();

    // 與項目同名的舊欄位由組別欄取代
    let kept_columns: Vec<(usize, &str)> = grouped
        .table
        .columns
        .iter()
        .map(|c| c.as_str())
        .enumerate()
        .filter(|(_, c)| !event_columns.contains(c))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = kept_columns.iter().map(|(_, c)| *c).collect();
    header.extend(event_columns.iter().copied());
    writer.write_record(&header)?;

    let columns = &grouped.table.columns;
    let name_idx = columns.iter().position(|c| c == NAME_COLUMN);
    let events_idx = columns.iter().position(|c| c == EVENTS_COLUMN);

    for (row, competitor) in grouped.rows() {
        let mut fields: Vec<String> = kept_columns
            .iter()
            .map(|&(idx, _)| {
                // 只有第一個 Name / Events 欄換成正規化後的值，其餘照原值寫回
                if Some(idx) == name_idx {
                    competitor.name.clone()
                } else if Some(idx) == events_idx {
                    format_events(&competitor.events)
                } else {
                    competitor.fields.get(idx).cloned().unwrap_or_default()
                }
            })
            .collect();
        fields.extend(event_columns.iter().map(|event| {
            grouped
                .group_for(row, event)
                .map(|group| group.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&fields)?;
    }

    writer.into_inner().map_err(|e| CompError::IoError(e.into_error()))
}

fn column_index(columns: &[String], column: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| CompError::MissingColumnError {
            column: column.to_string(),
        })
}
