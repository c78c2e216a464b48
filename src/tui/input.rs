use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::middle::InputEvent;

// poll for input from the terminal, resolve keys to semantic input events
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code).into_iter().collect());
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Option<InputEvent> {
    let event = match code {
        KeyCode::Esc | KeyCode::Char('q') => InputEvent::Quit,

        // cursor
        KeyCode::Up | KeyCode::Char('k') => InputEvent::MoveCursor { rows: -1, steps: 0 },
        KeyCode::Down | KeyCode::Char('j') => InputEvent::MoveCursor { rows: 1, steps: 0 },
        KeyCode::Left | KeyCode::Char('h') => InputEvent::MoveCursor { rows: 0, steps: -1 },
        KeyCode::Right | KeyCode::Char('l') => InputEvent::MoveCursor { rows: 0, steps: 1 },
        KeyCode::Enter | KeyCode::Char('x') => InputEvent::ToggleStep,

        // sequencer
        KeyCode::Char(' ') => InputEvent::PlayPause,
        KeyCode::Char('0') => InputEvent::Rewind,
        KeyCode::Char('g') => InputEvent::GenerateBeat,
        KeyCode::Char('c') => InputEvent::ClearPattern,

        // recorder
        KeyCode::Char('r') => InputEvent::Record,
        KeyCode::Char('p') => InputEvent::PlayTake,
        KeyCode::Char('s') => InputEvent::StopTake,

        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_events() {
        assert_eq!(handle_key(KeyCode::Char(' ')), Some(InputEvent::PlayPause));
        assert_eq!(handle_key(KeyCode::Char('r')), Some(InputEvent::Record));
        assert_eq!(
            handle_key(KeyCode::Left),
            Some(InputEvent::MoveCursor { rows: 0, steps: -1 })
        );
        assert_eq!(handle_key(KeyCode::Char('?')), None);
    }
}
