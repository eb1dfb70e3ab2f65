//! Translation of crossterm key events into canonical key names.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::event::MediaKeyCode;
use reel_core::input::key_name::ModifierSet;
use reel_core::input::key_name::format_chord;

/// Canonical name for a key press, or `None` for events that never reach
/// the bindings (releases, bare modifiers, lock keys).
pub fn key_name_from_event(event: &KeyEvent) -> Option<String> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let mut modifiers = modifier_set(event.modifiers);
    let key = match event.code {
        KeyCode::Char(ch) => {
            if let Some(letter) = ctrl_char_to_letter(ch) {
                modifiers.ctrl = true;
                letter.to_string()
            } else {
                // The terminal already applied shift to anything without case.
                if !(ch.is_lowercase() || ch.is_uppercase()) && ch != ' ' {
                    modifiers.shift = false;
                }
                char_key_name(ch)
            }
        }
        KeyCode::BackTab => {
            modifiers.shift = true;
            "TAB".to_string()
        }
        KeyCode::Enter => "ENTER".to_string(),
        KeyCode::Tab => "TAB".to_string(),
        KeyCode::Backspace => "BS".to_string(),
        KeyCode::Esc => "ESC".to_string(),
        KeyCode::Delete => "DEL".to_string(),
        KeyCode::Insert => "INS".to_string(),
        KeyCode::Home => "HOME".to_string(),
        KeyCode::End => "END".to_string(),
        KeyCode::PageUp => "PGUP".to_string(),
        KeyCode::PageDown => "PGDWN".to_string(),
        KeyCode::Left => "LEFT".to_string(),
        KeyCode::Right => "RIGHT".to_string(),
        KeyCode::Up => "UP".to_string(),
        KeyCode::Down => "DOWN".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::PrintScreen => "PRINT".to_string(),
        KeyCode::Pause => "PAUSE".to_string(),
        KeyCode::Menu => "MENU".to_string(),
        KeyCode::Media(media) => media_key_name(media)?.to_string(),
        KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::KeypadBegin
        | KeyCode::Modifier(_) => return None,
    };

    Some(format_chord(modifiers, &key))
}

fn modifier_set(modifiers: KeyModifiers) -> ModifierSet {
    ModifierSet {
        shift: modifiers.contains(KeyModifiers::SHIFT),
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        alt: modifiers.contains(KeyModifiers::ALT),
        meta: modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
    }
}

fn char_key_name(ch: char) -> String {
    match ch {
        ' ' => "SPACE".to_string(),
        '#' => "SHARP".to_string(),
        _ => ch.to_string(),
    }
}

/// Raw control characters (`0x01..=0x1a`) some terminals send for Ctrl+letter.
fn ctrl_char_to_letter(ch: char) -> Option<char> {
    let value = ch as u32;
    if (1..=26).contains(&value) && !matches!(ch, '\t' | '\n' | '\r') {
        return char::from_u32(value + u32::from(b'a') - 1);
    }
    None
}

fn media_key_name(media: MediaKeyCode) -> Option<&'static str> {
    let name = match media {
        MediaKeyCode::Play => "PLAYONLY",
        MediaKeyCode::Pause => "PAUSEONLY",
        MediaKeyCode::PlayPause => "PLAYPAUSE",
        MediaKeyCode::Stop => "STOP",
        MediaKeyCode::FastForward => "FORWARD",
        MediaKeyCode::Rewind => "REWIND",
        MediaKeyCode::TrackNext => "NEXT",
        MediaKeyCode::TrackPrevious => "PREV",
        MediaKeyCode::Record => "RECORD",
        MediaKeyCode::RaiseVolume => "VOLUME_UP",
        MediaKeyCode::LowerVolume => "VOLUME_DOWN",
        MediaKeyCode::MuteVolume => "MUTE",
        MediaKeyCode::Reverse => return None,
    };
    Some(name)
}
