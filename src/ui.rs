use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use itertools::Itertools;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::clock::Clock;
use crate::metrics::{format_time, letter_grade};
use crate::projector::{project_lines, CharState, ProjectedLine};
use crate::results::SnippetMeta;
use crate::session::{Session, SessionStatus};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

const LINE_BREAK_MARKER: &str = "↵";
const MISSED_SPACE_MARKER: &str = "·";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn style_for(state: CharState) -> Style {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    match state {
        CharState::Correct => bold_style.fg(Color::Green),
        CharState::Incorrect | CharState::IncorrectSpace => bold_style.fg(Color::Red),
        CharState::Current => bold_style.add_modifier(Modifier::DIM | Modifier::UNDERLINED),
        CharState::Pending => bold_style.add_modifier(Modifier::DIM),
    }
}

/// One drawn column of the code block
type CodeCell = (String, CharState);

fn line_cells(line: ProjectedLine) -> Vec<CodeCell> {
    let mut cells = line
        .segments
        .into_iter()
        .flat_map(|seg| {
            let state = seg.state;
            seg.text
                .chars()
                .map(|c| {
                    let symbol = match state {
                        CharState::IncorrectSpace => MISSED_SPACE_MARKER.to_string(),
                        _ => c.to_string(),
                    };
                    (symbol, state)
                })
                .collect::<Vec<CodeCell>>()
        })
        .collect::<Vec<CodeCell>>();

    // a line break is only drawn when it needs attention
    if let Some(state @ (CharState::Incorrect | CharState::Current)) = line.line_break {
        cells.push((LINE_BREAK_MARKER.to_string(), state));
    }
    cells
}

fn cells_to_line(cells: &[CodeCell]) -> Line<'static> {
    cells
        .iter()
        .chunk_by(|(_, state)| *state)
        .into_iter()
        .map(|(state, group)| {
            let text = group.map(|(symbol, _)| symbol.as_str()).collect::<String>();
            Span::styled(text, style_for(state))
        })
        .collect::<Vec<Span>>()
        .into()
}

/// Split a line's cells into rows at most `width` columns wide
fn wrap_cells(cells: &[CodeCell], width: u16) -> Vec<&[CodeCell]> {
    let width = width.max(1) as usize;
    let mut rows = Vec::new();
    let mut row_start = 0;
    let mut row_width = 0;

    for (idx, (symbol, _)) in cells.iter().enumerate() {
        let w = symbol.width();
        if row_width + w > width && idx > row_start {
            rows.push(&cells[row_start..idx]);
            row_start = idx;
            row_width = 0;
        }
        row_width += w;
    }
    rows.push(&cells[row_start..]);
    rows
}

/// Styled lines for the reference text of `session`, one per reference line
pub fn code_lines<C: Clock>(session: &Session<C>) -> Vec<Line<'static>> {
    let states = session.projection();

    project_lines(session.reference(), &states)
        .into_iter()
        .map(|line| cells_to_line(&line_cells(line)))
        .collect()
}

/// The code block wrapped to `width` columns, with the index of the row holding the
/// caret (if the session has one)
pub fn code_rows<C: Clock>(
    session: &Session<C>,
    width: u16,
) -> (Vec<Line<'static>>, Option<usize>) {
    let states = session.projection();
    let mut rows = Vec::new();
    let mut caret_row = None;

    for line in project_lines(session.reference(), &states) {
        let cells = line_cells(line);
        for row in wrap_cells(&cells, width) {
            if row.iter().any(|(_, state)| *state == CharState::Current) {
                caret_row = Some(rows.len());
            }
            rows.push(cells_to_line(row));
        }
    }
    (rows, caret_row)
}

/// First row to show so that the caret stays in view, roughly centred
fn scroll_offset(total_rows: usize, visible_rows: usize, caret_row: Option<usize>) -> usize {
    if total_rows <= visible_rows {
        return 0;
    }
    let caret_row = caret_row.unwrap_or(0);
    caret_row
        .saturating_sub(visible_rows / 2)
        .min(total_rows - visible_rows)
}

fn describe(meta: &SnippetMeta) -> String {
    match meta.difficulty {
        Some(difficulty) => format!("{} · {} · {}", meta.topic, meta.language, difficulty),
        None => format!("{} · {}", meta.topic, meta.language),
    }
}

/// Centre a block of `width` x `height` inside `area`, clamped to it
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // snippet
            Constraint::Length(1), // live stats
            Constraint::Length(1), // padding
            Constraint::Min(1),    // code
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(describe(session.snippet()), bold_style))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let stats_style = if session.status() == SessionStatus::Active {
        bold_style
    } else {
        dim_bold_style
    };
    Paragraph::new(Span::styled(
        format!(
            "{}   {} wpm   {}% acc   {} errors",
            format_time(session.elapsed_secs()),
            session.wpm(),
            session.accuracy(),
            session.error_count()
        ),
        stats_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    // +1 leaves room for a line break marker
    let code_width = session
        .reference_text()
        .lines()
        .map(|l| l.width() as u16 + 1)
        .max()
        .unwrap_or(1)
        .min(chunks[3].width);
    let (rows, caret_row) = code_rows(session, code_width);
    let code_area = centered(chunks[3], code_width, rows.len() as u16);
    let offset = scroll_offset(rows.len(), code_area.height as usize, caret_row);

    Paragraph::new(rows)
        .scroll((offset as u16, 0))
        .render(code_area, buf);

    let legend = match session.status() {
        SessionStatus::NotStarted => "(enter) start / (→) new / (esc)ape",
        _ => "(←) retry / (→) new / (esc)ape",
    };
    Paragraph::new(Span::styled(legend, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let (wpm, accuracy, elapsed_secs, error_count) = match &app.last_result {
        Some(r) => (r.wpm, r.accuracy, r.elapsed_secs, r.error_count),
        None => (
            session.wpm(),
            session.accuracy(),
            session.elapsed_secs(),
            session.error_count(),
        ),
    };
    let grade = letter_grade(wpm, accuracy);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // grade
            Constraint::Length(1), // padding
            Constraint::Length(1), // stats
            Constraint::Length(1), // snippet
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("test complete   grade {grade}"),
        bold_style.fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {}   {} errors",
            wpm,
            accuracy,
            format_time(elapsed_secs),
            error_count
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        describe(session.snippet()),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled("(r)etry / (n)ew / (esc)ape", italic_style))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
}
