use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type EventCode = String;

/// 一位選手：姓名與報名項目 (保持輸入順序、不重複)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub events: Vec<EventCode>,
    /// 整列原始值，索引對應 `CompetitorTable::columns`
    #[serde(default)]
    pub fields: Vec<String>,
}

impl Competitor {
    pub fn new<I, E>(name: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        let mut unique: Vec<EventCode> = Vec::new();
        for event in events {
            let event = event.into();
            if !event.is_empty() && !unique.contains(&event) {
                unique.push(event);
            }
        }

        Self {
            name: name.into(),
            events: unique,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn is_registered(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorTable {
    /// 原始表頭 (含 Name 與 Events)，輸出時照原順序寫回
    pub columns: Vec<String>,
    pub competitors: Vec<Competitor>,
}

impl CompetitorTable {
    pub fn new(competitors: Vec<Competitor>) -> Self {
        Self {
            columns: vec!["Name".to_string(), "Events".to_string()],
            competitors,
        }
    }

    pub fn with_columns(columns: Vec<String>, competitors: Vec<Competitor>) -> Self {
        Self {
            columns,
            competitors,
        }
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Competitor> {
        self.competitors.iter()
    }

    /// 所有選手報名項目的聯集
    pub fn event_universe(&self) -> BTreeSet<EventCode> {
        self.competitors
            .iter()
            .flat_map(|c| c.events.iter().cloned())
            .collect()
    }
}

/// (項目, 選手列) -> 組別，組別從 1 開始
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAssignment {
    groups: BTreeMap<EventCode, BTreeMap<usize, u32>>,
}

impl GroupAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, event: &str, row: usize, group: u32) {
        self.groups
            .entry(event.to_string())
            .or_default()
            .insert(row, group);
    }

    pub fn group_for(&self, event: &str, row: usize) -> Option<u32> {
        self.groups.get(event)?.get(&row).copied()
    }

    /// 有分組欄位的項目，依代碼排序
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|e| e.as_str())
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.groups.contains_key(event)
    }

    pub fn registrants(&self, event: &str) -> usize {
        self.groups.get(event).map_or(0, |rows| rows.len())
    }

    pub fn group_count(&self, event: &str) -> u32 {
        self.groups
            .get(event)
            .and_then(|rows| rows.values().max().copied())
            .unwrap_or(0)
    }

    /// 某項目中各組別的人數，索引 0 對應第 1 組
    pub fn group_sizes(&self, event: &str) -> Vec<usize> {
        let mut sizes = vec![0; self.group_count(event) as usize];
        if let Some(rows) = self.groups.get(event) {
            for group in rows.values() {
                sizes[*group as usize - 1] += 1;
            }
        }
        sizes
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedTable {
    pub table: CompetitorTable,
    pub assignment: GroupAssignment,
}

impl GroupedTable {
    pub fn new(table: CompetitorTable, assignment: GroupAssignment) -> Self {
        Self { table, assignment }
    }

    pub fn group_for(&self, row: usize, event: &str) -> Option<u32> {
        self.assignment.group_for(event, row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, &Competitor)> {
        self.table.competitors.iter().enumerate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorecard {
    pub name: String,
    pub event: EventCode,
    pub group: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namecard {
    pub name: String,
    /// `None` 表示此項目沒有分組，印成 "-"
    pub events: Vec<(EventCode, Option<u32>)>,
}

/// 一張卡片在第幾頁、哪一格，以及左上角座標 (mm，原點在頁面左上)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement<T> {
    pub page: usize,
    pub row: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
    pub content: T,
}

/// A4 portrait，所有卡片都畫在這個尺寸的頁面上
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Grid geometry for one card layout: slots per page, the cell pitch and
/// the size of the card drawn in each cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub pitch_x: f32,
    pub pitch_y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub card_width: f32,
    pub card_height: f32,
}

impl GridSpec {
    pub const SCORECARD: GridSpec = GridSpec {
        rows: 4,
        cols: 2,
        pitch_x: 105.0,
        pitch_y: 75.0,
        origin_x: 10.0,
        origin_y: 10.0,
        card_width: 95.0,
        card_height: 62.0,
    };

    pub const NAMECARD: GridSpec = GridSpec {
        rows: 5,
        cols: 2,
        pitch_x: 105.0,
        pitch_y: 60.0,
        origin_x: 10.0,
        origin_y: 10.0,
        card_width: 90.0,
        card_height: 47.0,
    };

    pub fn slots_per_page(&self) -> usize {
        self.rows * self.cols
    }

    /// 最右下角那張卡片的右緣與下緣 (mm)
    pub fn far_corner(&self) -> (f32, f32) {
        let last_col = self.cols.saturating_sub(1) as f32;
        let last_row = self.rows.saturating_sub(1) as f32;
        (
            self.origin_x + last_col * self.pitch_x + self.card_width,
            self.origin_y + last_row * self.pitch_y + self.card_height,
        )
    }
}

/// transform 階段的產物，交給 load 寫出
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub grouped: GroupedTable,
    pub scorecards: Vec<Placement<Scorecard>>,
    pub namecards: Vec<Placement<Namecard>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub registrants: usize,
    pub groups: u32,
    pub group_sizes: Vec<usize>,
}

/// 寫進 run_summary.json 的統計
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub competitors: usize,
    pub events: BTreeMap<EventCode, EventSummary>,
    pub scorecards: usize,
    pub scorecard_pages: usize,
    pub namecards: usize,
    pub namecard_pages: usize,
}

impl RunSummary {
    pub fn from_artifacts(artifacts: &RunArtifacts) -> Self {
        let assignment = &artifacts.grouped.assignment;
        let events = assignment
            .events()
            .map(|event| {
                (
                    event.to_string(),
                    EventSummary {
                        registrants: assignment.registrants(event),
                        groups: assignment.group_count(event),
                        group_sizes: assignment.group_sizes(event),
                    },
                )
            })
            .collect();

        Self {
            competitors: artifacts.grouped.table.len(),
            events,
            scorecards: artifacts.scorecards.len(),
            scorecard_pages: page_span(&artifacts.scorecards),
            namecards: artifacts.namecards.len(),
            namecard_pages: page_span(&artifacts.namecards),
        }
    }
}

fn page_span<T>(placements: &[Placement<T>]) -> usize {
    placements.last().map_or(0, |p| p.page + 1)
}
