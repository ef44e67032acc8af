use crate::app::{App, Button, BUTTONS};
use crate::braille::BrailleCanvas;
use crate::charts::HIGHLIGHT;
use crate::map::{legend_gradient, stat_text, ColorRamp, Rgb, LEGEND_LABEL};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Row, Table, Widget},
    Frame,
};

const TITLE: &str = " ROAD ACCIDENT STATISTICS ";

/// Fixed screen regions of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardLayout {
    pub title: Rect,
    pub buttons: [Rect; 4],
    pub chart: Rect,
    /// Chart area inside its border (legend hover target)
    pub chart_plot: Rect,
    pub table: Rect,
    pub map: Rect,
    /// Map area inside its border, in character cells
    pub map_inner: Rect,
    pub legend: Rect,
    pub status: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(3), // Buttons
                Constraint::Min(6),    // Body
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let button_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(rows[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(body[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(4)])
            .split(body[1]);

        let bordered = Block::default().borders(Borders::ALL);

        Self {
            title: rows[0],
            buttons: [button_row[0], button_row[1], button_row[2], button_row[3]],
            chart: left[0],
            chart_plot: bordered.inner(left[0]),
            table: left[1],
            map: right[0],
            map_inner: bordered.inner(right[0]),
            legend: right[1],
            status: rows[3],
        }
    }
}

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = &app.layout;

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            TITLE,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))),
        layout.title,
    );

    render_buttons(frame, app);
    render_chart(frame, app);
    render_table(frame, app);
    render_map(frame, app);
    render_legend(frame, app.color_ramp(), layout.legend);
    render_status_bar(frame, app, layout.status);
}

fn render_buttons(frame: &mut Frame, app: &App) {
    for (button, area) in BUTTONS.iter().zip(app.layout.buttons) {
        let active = matches!(button, Button::Chart(view) if *view == app.chart_view);
        let style = if active {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let widget = Paragraph::new(Line::from(button.label()).centered())
            .style(style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        frame.render_widget(widget, area);
    }
}

fn render_chart(frame: &mut Frame, app: &App) {
    let view = app.chart_view;
    let bars: Vec<Bar> = view
        .bars(&app.dataset, &app.overrides)
        .into_iter()
        .map(|bar| {
            let color = if bar.highlighted { HIGHLIGHT } else { view.base_color() };
            Bar::default()
                .value(bar.value)
                .label(Line::from(bar.label))
                .style(Style::default().fg(rgb(color)))
                .value_style(Style::default().fg(Color::Black).bg(rgb(color)))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", view.title()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, app.layout.chart);

    if app.chart_legend.is_visible() {
        render_chart_legend(frame, view.legend(), app.layout.chart_plot);
    }
}

fn render_chart_legend(frame: &mut Frame, entries: [(&str, Rgb); 2], plot: Rect) {
    let width = entries.iter().map(|(label, _)| label.len() as u16).max().unwrap_or(0) + 6;
    let height = entries.len() as u16 + 2;
    if plot.width < width || plot.height < height {
        return;
    }
    let area = Rect::new(plot.right() - width, plot.y, width, height);

    let lines: Vec<Line> = entries
        .iter()
        .map(|(label, color)| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(rgb(*color))),
                Span::styled(label.to_string(), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Legend "),
        ),
        area,
    );
}

fn render_table(frame: &mut Frame, app: &App) {
    let header = Row::new(["Region", "Population", "Accidents", "Victims"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .dataset
        .iter()
        .map(|region| {
            Row::new([
                region.name.clone(),
                stat_text(region.population),
                stat_text(region.accidents),
                stat_text(region.victims),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Regions "),
    );
    frame.render_widget(table, app.layout.table);
}

fn render_map(frame: &mut Frame, app: &App) {
    let title = match app.map.tile_source() {
        Some(_) => " Accident Map (© OpenStreetMap contributors) ",
        None => " Accident Map ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(block, app.layout.map);

    let inner = app.layout.map_inner;
    let canvas = app
        .map
        .rasterize(inner.width as usize, inner.height as usize);

    let cursor_pos = app.mouse_pos.filter(|&(col, row)| {
        inner.contains(ratatui::layout::Position::new(col, row))
    });

    frame.render_widget(MapWidget { canvas, cursor_pos }, inner);

    if let Some((summary, (col, row))) = &app.hover {
        let lines: Vec<Line> = summary.lines().into_iter().map(Line::from).collect();
        let width = lines.iter().map(|l| l.width() as u16).max().unwrap_or(0) + 2;
        let height = lines.len() as u16 + 2;
        if let Some(area) = popup_near(*col, *row, width, height, inner) {
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(lines)
                    .style(Style::default().fg(Color::Black).bg(Color::White))
                    .block(Block::default().borders(Borders::ALL)),
                area,
            );
        }
    }
}

/// Place a popup next to the cursor, flipped to stay inside `bounds`
fn popup_near(col: u16, row: u16, width: u16, height: u16, bounds: Rect) -> Option<Rect> {
    if width > bounds.width || height > bounds.height {
        return None;
    }
    let x = if col + 2 + width <= bounds.right() {
        col + 2
    } else {
        col.saturating_sub(width + 1).max(bounds.x)
    };
    let y = if row + 1 + height <= bounds.bottom() {
        row + 1
    } else {
        row.saturating_sub(height).max(bounds.y)
    };
    Some(Rect::new(x, y, width, height))
}

/// Braille map cells with fills as backgrounds and outlines as colored dots
struct MapWidget {
    canvas: BrailleCanvas,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (row_idx, row) in self.canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, cell) in row.iter().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                let target = &mut buf[(area.x + col_idx as u16, y)];
                if let Some(bg) = cell.bg {
                    target.set_bg(rgb(bg));
                }
                // Skip empty braille characters (U+2800)
                if cell.bits != 0 {
                    target.set_char(cell.glyph());
                    if let Some(fg) = cell.fg {
                        target.set_fg(rgb(fg));
                    }
                }
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(cx, cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn render_legend(frame: &mut Frame, ramp: ColorRamp, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Legend ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let gradient: Vec<Span> = legend_gradient(ramp, inner.width as usize)
        .into_iter()
        .map(|color| Span::styled(" ", Style::default().bg(rgb(color))))
        .collect();

    let lines = vec![
        Line::from(gradient),
        Line::from(Span::styled(LEGEND_LABEL, Style::default().fg(Color::White))).centered(),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let unmatched = app.dataset.report().unmatched_rows.len();

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} regions", app.dataset.len()),
            Style::default().fg(Color::Green),
        ),
    ];
    if unmatched > 0 {
        spans.push(Span::styled(
            format!(" ({unmatched} unmatched rows)"),
            Style::default().fg(Color::Magenta),
        ));
    }
    if let Some(message) = &app.status_message {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::White)));
    }
    spans.push(Span::styled(
        " | 1-3:chart t:traffic hjkl:pan +/-:zoom r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_regions_are_disjoint() {
        let layout = DashboardLayout::new(Rect::new(0, 0, 120, 40));
        assert_eq!(layout.title.height, 1);
        assert_eq!(layout.status.y, 39);
        assert!(!layout.chart.intersects(layout.map));
        assert!(!layout.table.intersects(layout.map));
        let map = layout.map;
        assert_eq!(
            layout.map_inner,
            Rect::new(map.x + 1, map.y + 1, map.width - 2, map.height - 2)
        );
        for pair in layout.buttons.windows(2) {
            assert!(!pair[0].intersects(pair[1]));
        }
    }

    #[test]
    fn test_popup_flips_at_edges() {
        let bounds = Rect::new(0, 0, 40, 20);
        assert_eq!(popup_near(5, 5, 10, 4, bounds), Some(Rect::new(7, 6, 10, 4)));
        assert_eq!(popup_near(35, 18, 10, 4, bounds), Some(Rect::new(24, 14, 10, 4)));
        assert_eq!(popup_near(5, 5, 50, 4, bounds), None);
    }
}
