use crate::config::Theme;
use crate::state::panel::Panel;
use crate::ui::actions::help_entries;
use crate::ui::table_panel::TablePanel;
use crate::ui::viewer::{InputMode, Viewer};
use crate::utils::logging::get_log_buffer;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table},
    Frame,
};

/// Widest a grid column is allowed to get
const MAX_COLUMN_WIDTH: usize = 30;

/// Colors for one theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub header: Color,
    pub border: Color,
    pub cursor_fg: Color,
    pub cursor_bg: Color,
    pub selection_bg: Color,
    pub muted: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                header: Color::Blue,
                border: Color::Gray,
                cursor_fg: Color::White,
                cursor_bg: Color::Blue,
                selection_bg: Color::LightBlue,
                muted: Color::DarkGray,
            },
            Theme::Dark => Self {
                fg: Color::Gray,
                bg: Color::Black,
                header: Color::Cyan,
                border: Color::DarkGray,
                cursor_fg: Color::Black,
                cursor_bg: Color::Yellow,
                selection_bg: Color::DarkGray,
                muted: Color::DarkGray,
            },
            Theme::Classic => Self {
                fg: Color::Yellow,
                bg: Color::Blue,
                header: Color::White,
                border: Color::Cyan,
                cursor_fg: Color::Black,
                cursor_bg: Color::Cyan,
                selection_bg: Color::LightCyan,
                muted: Color::Gray,
            },
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }
}

/// Border type for the `style` setting; unknown names fall back to plain
pub fn border_type(style: &str) -> BorderType {
    match style.to_ascii_lowercase().as_str() {
        "rounded" => BorderType::Rounded,
        "double" => BorderType::Double,
        "thick" => BorderType::Thick,
        _ => BorderType::Plain,
    }
}

/// Draw the whole viewer: navigator, panel, status line and overlays
pub fn draw(f: &mut Frame, viewer: &Viewer) {
    let store = viewer.store();
    let global = Palette::for_theme(store.settings().theme);
    let borders = border_type(&store.settings().style);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(chunks[0]);

    draw_navigator(f, main[0], viewer, &global, borders);

    match viewer.synchronizer().visible_panel() {
        Some(panel) => {
            let palette = Palette::for_theme(store.theme_for(panel.name()));
            draw_panel(f, main[1], panel, &palette, borders);
        }
        None => {
            let empty = Paragraph::new("No dataset open. Press 'o' to import a file.")
                .style(global.base().fg(global.muted))
                .block(bordered("Data", &global, borders));
            f.render_widget(empty, main[1]);
        }
    }

    draw_status(f, chunks[1], viewer, &global);

    if viewer.show_log() {
        draw_log(f, centered_rect(80, 70, f.area()), &global, borders);
    }
    if viewer.show_help() {
        draw_help(f, centered_rect(50, 80, f.area()), &global, borders);
    }
}

fn bordered<'a>(title: impl Into<Line<'a>>, palette: &Palette, borders: BorderType) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(borders)
        .border_style(Style::default().fg(palette.border))
        .style(palette.base())
        .title(title)
}

fn draw_navigator(
    f: &mut Frame,
    area: Rect,
    viewer: &Viewer,
    palette: &Palette,
    borders: BorderType,
) {
    let navigator = viewer.synchronizer().navigator();
    let items: Vec<ListItem> = navigator
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let marker = if navigator.is_marked(&row.name) { "* " } else { "  " };
            let mut style = palette.base();
            if navigator.current_index() == Some(idx) {
                style = style
                    .fg(palette.cursor_fg)
                    .bg(palette.cursor_bg)
                    .add_modifier(Modifier::BOLD);
            }
            ListItem::new(format!("{}{}", marker, row.label())).style(style)
        })
        .collect();

    let title = format!("Datasets ({})", navigator.len());
    f.render_widget(List::new(items).block(bordered(title, palette, borders)), area);
}

fn draw_panel(f: &mut Frame, area: Rect, panel: &TablePanel, palette: &Palette, borders: BorderType) {
    let table = panel.displayed();
    let title = format!(
        "{} [{}] {}x{}",
        panel.name(),
        panel.active_view_mode().label(),
        table.row_count(),
        table.column_count()
    );
    let block = bordered(title, palette, borders);

    if table.column_count() == 0 {
        f.render_widget(Paragraph::new("Empty table").block(block), area);
        return;
    }

    let (cursor_row, cursor_col) = panel.cursor();
    let visible_rows = (area.height as usize).saturating_sub(4).max(1);
    let first_row = cursor_row.saturating_sub(visible_rows - 1);

    // Column widths from the header and the rows on screen
    let widths: Vec<usize> = (0..table.column_count())
        .map(|col| {
            let header = table.columns[col].name.chars().count();
            let cells = (first_row..(first_row + visible_rows).min(table.row_count()))
                .filter_map(|row| table.get_value(row, col))
                .map(|value| value.to_string().chars().count())
                .max()
                .unwrap_or(0);
            header.max(cells).clamp(1, MAX_COLUMN_WIDTH)
        })
        .collect();

    // Scroll horizontally so the cursor column is on screen
    let available = (area.width as usize).saturating_sub(2);
    let mut first_col = 0;
    while first_col < cursor_col
        && widths[first_col..=cursor_col].iter().map(|w| w + 1).sum::<usize>() > available
    {
        first_col += 1;
    }
    let mut columns = Vec::new();
    let mut used = 0;
    for (col, width) in widths.iter().enumerate().skip(first_col) {
        if used + width + 1 > available && !columns.is_empty() {
            break;
        }
        used += width + 1;
        columns.push(col);
    }

    let header = Row::new(
        columns
            .iter()
            .map(|&col| Cell::from(table.columns[col].name.clone())),
    )
    .style(
        Style::default()
            .fg(palette.header)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = (first_row..(first_row + visible_rows).min(table.row_count()))
        .map(|row| {
            Row::new(columns.iter().map(|&col| {
                let text = table
                    .get_value(row, col)
                    .map(|value| value.to_string())
                    .unwrap_or_default();
                let style = if (row, col) == (cursor_row, cursor_col) {
                    Style::default().fg(palette.cursor_fg).bg(palette.cursor_bg)
                } else if panel.has_block_selection() && panel.is_selected(row, col) {
                    Style::default().bg(palette.selection_bg)
                } else {
                    Style::default()
                };
                Cell::from(text).style(style)
            }))
        })
        .collect();

    let constraints: Vec<Constraint> = columns
        .iter()
        .map(|&col| Constraint::Length(widths[col] as u16))
        .collect();

    let grid = Table::new(rows, constraints)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(grid, area);
}

fn draw_status(f: &mut Frame, area: Rect, viewer: &Viewer, palette: &Palette) {
    let line = match viewer.mode() {
        InputMode::Prompt { kind, input } => Line::from(vec![
            Span::styled(
                format!("{}: ", kind.title()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        InputMode::Normal => {
            let mut spans = vec![Span::raw(viewer.status().to_string())];
            if viewer.pending_imports() > 0 {
                spans.push(Span::styled(
                    format!("  [{} loading]", viewer.pending_imports()),
                    Style::default().fg(palette.muted),
                ));
            }
            Line::from(spans)
        }
    };
    f.render_widget(Paragraph::new(line).style(palette.base().add_modifier(Modifier::REVERSED)), area);
}

fn draw_log(f: &mut Frame, area: Rect, palette: &Palette, borders: BorderType) {
    let height = (area.height as usize).saturating_sub(2);
    let lines: Vec<Line> = get_log_buffer()
        .map(|buffer| buffer.get_recent(height))
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let color = match entry.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                "DEBUG" | "TRACE" => palette.muted,
                _ => palette.fg,
            };
            Line::from(Span::styled(entry.format_for_display(), Style::default().fg(color)))
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(bordered("Log (Esc to close)", palette, borders)),
        area,
    );
}

fn draw_help(f: &mut Frame, area: Rect, palette: &Palette, borders: BorderType) {
    let lines: Vec<Line> = help_entries()
        .into_iter()
        .map(|(key, label)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>10}  ", key),
                    Style::default().fg(palette.header).add_modifier(Modifier::BOLD),
                ),
                Span::raw(label),
            ])
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(bordered("Keys (Esc to close)", palette, borders)),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
