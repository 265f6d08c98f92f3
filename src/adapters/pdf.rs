//! PDF rendering of laid-out cards.
//!
//! Placement coordinates are millimetres from the top-left corner of an A4
//! page; printpdf measures from the bottom-left, so every y is flipped here.

use crate::domain::model::{
    GridSpec, Namecard, Placement, Scorecard, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::domain::ports::CardRenderer;
use crate::utils::error::{CompError, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

const SCORECARD_FONT_SIZE: f32 = 8.0;
const SCORECARD_LINE_MM: f32 = 4.0;
const ATTEMPT_ROWS: usize = 7;
const ATTEMPT_ROW_MM: f32 = 6.0;
/// 成績格每欄寬度：編號、成績、裁判、選手、備註
const ATTEMPT_COLUMNS_MM: [f32; 5] = [20.0, 18.0, 20.0, 20.0, 15.0];

const NAMECARD_NAME_FONT_SIZE: f32 = 14.0;
const NAMECARD_EVENT_FONT_SIZE: f32 = 9.0;
const NAMECARD_LINE_MM: f32 = 6.0;
/// 9pt 字高約 3.2mm，行距不能再小
const NAMECARD_MIN_LINE_MM: f32 = 4.0;
const NAMECARD_EVENTS_TOP_MM: f32 = 20.0;
const NAMECARD_BOTTOM_PADDING_MM: f32 = 2.0;

const BORDER_THICKNESS: f32 = 0.5;
const CELL_THICKNESS: f32 = 0.3;

/// 1pt = 0.3528mm
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone)]
pub struct PdfCardRenderer {
    round: u32,
}

impl PdfCardRenderer {
    pub fn new(round: u32) -> Self {
        Self { round }
    }
}

impl Default for PdfCardRenderer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CardRenderer for PdfCardRenderer {
    fn render_scorecards(&self, placements: &[Placement<Scorecard>]) -> Result<Vec<u8>> {
        let mut canvas = CardCanvas::new("Scorecards")?;
        for placement in placements {
            canvas.seek_page(placement.page);
            draw_scorecard(&canvas, placement, self.round);
        }
        tracing::debug!("Rendered {} scorecards on {} pages", placements.len(), canvas.pages());
        canvas.finish()
    }

    fn render_namecards(&self, placements: &[Placement<Namecard>]) -> Result<Vec<u8>> {
        let mut canvas = CardCanvas::new("Namecards")?;
        for placement in placements {
            canvas.seek_page(placement.page);
            draw_namecard(&canvas, placement);
        }
        tracing::debug!("Rendered {} namecards on {} pages", placements.len(), canvas.pages());
        canvas.finish()
    }
}

fn draw_scorecard(canvas: &CardCanvas, placement: &Placement<Scorecard>, round: u32) {
    let (x, y) = (placement.x, placement.y);
    let card = &placement.content;

    let grid = GridSpec::SCORECARD;
    canvas.rect(x, y, grid.card_width, grid.card_height, BORDER_THICKNESS);

    let header = [
        format!("Name: {}", card.name),
        format!("Event: {}", card.event),
        format!("Round: {}", round),
        format!("Station: {}", card.group),
    ];
    let mut line_y = y + 2.0;
    for text in &header {
        canvas.text(text, SCORECARD_FONT_SIZE, x + 2.0, line_y, SCORECARD_LINE_MM, false);
        line_y += SCORECARD_LINE_MM;
    }

    line_y += 1.0;
    for attempt in 1..=ATTEMPT_ROWS {
        let mut cell_x = x + 2.0;
        for (idx, width) in ATTEMPT_COLUMNS_MM.iter().enumerate() {
            canvas.rect(cell_x, line_y, *width, ATTEMPT_ROW_MM, CELL_THICKNESS);
            if idx == 0 {
                canvas.text(
                    &format!("{}.", attempt),
                    SCORECARD_FONT_SIZE,
                    cell_x + 1.0,
                    line_y,
                    ATTEMPT_ROW_MM,
                    false,
                );
            }
            cell_x += width;
        }
        line_y += ATTEMPT_ROW_MM;
    }
}

fn draw_namecard(canvas: &CardCanvas, placement: &Placement<Namecard>) {
    let (x, y) = (placement.x, placement.y);
    let card = &placement.content;

    let grid = GridSpec::NAMECARD;
    canvas.rect(x, y, grid.card_width, grid.card_height, BORDER_THICKNESS);
    canvas.text(&card.name, NAMECARD_NAME_FONT_SIZE, x + 5.0, y + 5.0, 8.0, true);

    let available = grid.card_height - NAMECARD_EVENTS_TOP_MM - NAMECARD_BOTTOM_PADDING_MM;
    let (lines, leading) = fit_lines(namecard_lines(card), available);
    let mut line_y = y + NAMECARD_EVENTS_TOP_MM;
    for line in &lines {
        canvas.text(line, NAMECARD_EVENT_FONT_SIZE, x + 5.0, line_y, leading, false);
        line_y += leading;
    }
}

/// 讓項目清單塞進高度 `available` 的區塊：先縮行距，還放不下就截斷並
/// 以 "+N more" 收尾。回傳要畫的行與行距。
fn fit_lines(mut lines: Vec<String>, available: f32) -> (Vec<String>, f32) {
    let capacity = ((available / NAMECARD_MIN_LINE_MM).floor() as usize).max(1);
    if lines.len() > capacity {
        let hidden = lines.len() - (capacity - 1);
        lines.truncate(capacity - 1);
        lines.push(format!("+{} more", hidden));
    }

    let leading = if lines.is_empty() {
        NAMECARD_LINE_MM
    } else {
        (available / lines.len() as f32).min(NAMECARD_LINE_MM)
    };
    (lines, leading)
}

/// "333: Group 2"，沒有組別時為 "333: -"
pub fn namecard_lines(card: &Namecard) -> Vec<String> {
    card.events
        .iter()
        .map(|(event, group)| match group {
            Some(group) => format!("{}: Group {}", event, group),
            None => format!("{}: -", event),
        })
        .collect()
}

struct CardCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    page: usize,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl CardCanvas {
    fn new(title: &str) -> Result<Self> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| CompError::PdfError(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| CompError::PdfError(e.to_string()))?;

        Ok(Self {
            doc,
            layer,
            page: 0,
            regular,
            bold,
        })
    }

    /// 只會往後翻頁
    fn seek_page(&mut self, page: usize) {
        while self.page < page {
            let (new_page, new_layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(new_page).get_layer(new_layer);
            self.page += 1;
        }
    }

    fn pages(&self) -> usize {
        self.page + 1
    }

    /// (x, y) 為左上角
    fn rect(&self, x: f32, y: f32, width: f32, height: f32, thickness: f32) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.set_outline_thickness(thickness);

        let (top, bottom) = (PAGE_HEIGHT_MM - y, PAGE_HEIGHT_MM - y - height);
        let points = vec![
            (Point::new(Mm(x), Mm(top)), false),
            (Point::new(Mm(x + width), Mm(top)), false),
            (Point::new(Mm(x + width), Mm(bottom)), false),
            (Point::new(Mm(x), Mm(bottom)), false),
        ];
        self.layer.add_line(Line {
            points,
            is_closed: true,
        });
    }

    /// 在高度 `line_height` 的列中垂直置中寫字，(x, y) 為該列左上角
    fn text(&self, text: &str, size: f32, x: f32, y: f32, line_height: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        let baseline = y + (line_height + size * PT_TO_MM * 0.7) / 2.0;
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT_MM - baseline), font);
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| CompError::PdfError(e.to_string()))
    }
}
