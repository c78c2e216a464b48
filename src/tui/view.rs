use image::RgbImage;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid::draw_step_grid;
use crate::middle::DisplayState;

const HELP: &str = "arrows/hjkl move  x toggle  space play/pause  0 rewind  g generate  c clear  r record  p play take  s stop take  q quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // transport + recorder status
            Constraint::Min(12),    // step grid
            Constraint::Length(10), // spectrogram thumbnail
            Constraint::Length(1),  // key help
        ])
        .split(area);

    draw_status(frame, sections[0], state, blink_on);
    let grid_block = Block::default().borders(Borders::ALL).title(" pattern ");
    let grid_area = grid_block.inner(sections[1]);
    frame.render_widget(grid_block, sections[1]);
    draw_step_grid(frame, grid_area, state);
    draw_spectrogram(frame, sections[2], state);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[3],
    );
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let transport = if state.playing {
        Span::styled("▶ PLAY", Style::default().fg(Color::LightGreen))
    } else {
        Span::styled("■ STOP", Style::default().fg(Color::Gray))
    };
    let step = match state.column {
        Some(c) => format!("step {:>2}", c + 1),
        None => String::from("step --"),
    };
    // the record dot blinks while a take is being captured
    let rec = if state.recording {
        let dot = if blink_on { "●" } else { " " };
        Span::styled(
            format!("{dot} REC {:.1}s", state.recorded_secs),
            Style::default().fg(Color::Red),
        )
    } else if state.rendering {
        Span::styled("… rendering", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("  idle")
    };
    let playback = if state.playback {
        "  ♪ playing take"
    } else {
        ""
    };

    let line = Line::from(vec![
        transport,
        Span::raw(format!("  {step}  {:.0} bpm   ", state.bpm)),
        rec,
        Span::raw(playback),
        Span::styled(format!("   {}", state.status), Style::default().fg(Color::DarkGray)),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" beatscope ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_spectrogram(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let block = Block::default().borders(Borders::ALL).title(" spectrogram ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(preview) = &state.preview else {
        frame.render_widget(
            Paragraph::new("record something with r").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    };
    paint_image(frame, inner, preview);
}

// nearest-neighbour blit of the thumbnail into cell backgrounds
fn paint_image(frame: &mut Frame, area: Rect, img: &RgbImage) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || area.width == 0 || area.height == 0 {
        return;
    }
    let buf = frame.buffer_mut();
    for dy in 0..area.height {
        for dx in 0..area.width {
            let px = (dx as u32 * w / area.width as u32).min(w - 1);
            let py = (dy as u32 * h / area.height as u32).min(h - 1);
            let [r, g, b] = img.get_pixel(px, py).0;
            if let Some(cell) = buf.cell_mut((area.x + dx, area.y + dy)) {
                cell.set_char(' ').set_bg(Color::Rgb(r, g, b));
            }
        }
    }
}
