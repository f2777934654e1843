//! Plain-text rendition of the todo page.

use std::fmt::Write;

use crate::session::Session;
use crate::view_model::{EntryKey, SyncState, TodoListViewModel};

pub const TITLE: &str = "Amplify Todos";

pub fn render(view: &TodoListViewModel, session: &Session) -> String {
    let mut out = String::new();
    let draft = view.draft();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# {}", session.greeting());
    let _ = writeln!(out, "[Sign out]");
    let _ = writeln!(out, "## {TITLE}");
    let _ = writeln!(out, "Name: {}", draft.name);
    let _ = writeln!(out, "Description: {}", draft.description);
    let _ = writeln!(out, "[Create Todo]");
    if view.is_loading() {
        let _ = writeln!(out, "(loading)");
    }

    for (position, entry) in view.entries().iter().enumerate() {
        let key = match view.entry_key(position) {
            Some(EntryKey::Id(id)) => id.to_string(),
            _ => format!("#{position}"),
        };
        let marker = match &entry.sync {
            SyncState::Confirmed => String::new(),
            SyncState::Pending(_) => " (saving)".to_string(),
            SyncState::Failed { reason, .. } => format!(" (not saved: {reason})"),
        };
        let _ = writeln!(out, "- {} [{key}]{marker}", entry.name);
        if let Some(description) = &entry.description {
            let _ = writeln!(out, "  {description}");
        }
    }
    out
}
