use beatscope::shared::STEPS_PER_PATTERN;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::middle::DisplayState;

const LABEL_WIDTH: u16 = 16;
const LED_WIDTH: u16 = 2;

// one line per instrument: label, fired LED, then the 16 steps
pub fn draw_step_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let rows = state.labels.len().max(1) as u32;
    let row_constraints = vec![Constraint::Ratio(1, rows); state.labels.len()];
    let mut col_constraints = vec![Constraint::Length(LABEL_WIDTH), Constraint::Length(LED_WIDTH)];
    col_constraints.extend([Constraint::Ratio(1, STEPS_PER_PATTERN as u32); STEPS_PER_PATTERN]);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_idx, row_area) in row_areas.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints.clone())
            .split(*row_area);

        let label = Paragraph::new(state.labels[row_idx].as_str())
            .style(Style::default().fg(Color::Rgb(255, 166, 0)));
        frame.render_widget(label, cols[0]);

        let fired = state.fired.get(row_idx).copied().unwrap_or(false) && state.playing;
        let led = Paragraph::new(if fired { "●" } else { " " })
            .style(Style::default().fg(Color::LightGreen));
        frame.render_widget(led, cols[1]);

        for step in 0..STEPS_PER_PATTERN {
            let active = state.pattern.get(row_idx, step).unwrap_or(false);
            let on_playhead = state.column == Some(step as u8);
            let cursor = state.cursor == (row_idx, step);
            let style = step_style(active, on_playhead, step);
            let text = if cursor { "<>" } else { "" };
            let cell = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(if cursor {
                    style.add_modifier(Modifier::BOLD).fg(Color::Yellow)
                } else {
                    style
                });
            frame.render_widget(cell, cols[2 + step]);
        }
    }
}

fn step_style(active: bool, on_playhead: bool, step: usize) -> Style {
    let bg = match (active, on_playhead) {
        (true, true) => Color::LightMagenta,
        (true, false) => Color::Magenta,
        (false, true) => Color::Gray,
        // every beat (4 steps) gets a slightly lighter cell
        (false, false) if step % 4 == 0 => Color::Rgb(48, 48, 48),
        (false, false) => Color::Rgb(28, 28, 28),
    };
    Style::default().bg(bg)
}
