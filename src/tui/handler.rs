use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::View;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    OpenArticle,
    Back,
    ScrollUp,
    ScrollDown,
    Refresh,
    ShowHelp,
    HideHelp,
}

pub fn handle_key_event(key: KeyEvent, view: View, show_help: bool) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(AppAction::Quit),
        (KeyCode::Char('r'), _) => return Some(AppAction::Refresh),
        (KeyCode::Char('?'), _) => return Some(AppAction::ShowHelp),
        _ => {}
    }

    match view {
        View::List => match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Char('<') | KeyCode::Home => Some(AppAction::MoveToTop),
            KeyCode::Char('>') | KeyCode::End => Some(AppAction::MoveToBottom),
            KeyCode::Enter => Some(AppAction::OpenArticle),
            _ => None,
        },
        View::Detail => match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::ScrollUp),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
                Some(AppAction::Back)
            }
            _ => None,
        },
    }
}
