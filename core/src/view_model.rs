//! In-memory state behind the todo page: the form draft and the list.
//!
//! # Design
//! The view-model never performs I/O. Operations that need the network return
//! a [`Command`]; the host executes it and reports back through
//! [`TodoListViewModel::complete_fetch`] or
//! [`TodoListViewModel::complete_create`]. This keeps every state transition
//! synchronous and testable, and lets the same type sit behind the C ABI.
//!
//! Submitting is optimistic: the entry is appended and the draft cleared
//! before the create is even sent, and nothing is rolled back when it fails.
//! Failed entries stay visible and are marked [`SyncState::Failed`].

use std::mem;

use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::types::{CreateTodoInput, PageRequest, Todo, TodoId, TodoPage};

/// Upper bound on pages followed by one fetch.
pub const MAX_FETCH_PAGES: usize = 1000;

/// In-progress, unsaved form values for a new todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub description: String,
}

impl Draft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Both fields must contain something other than whitespace.
    pub fn is_submittable(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Name => self.name = value,
            DraftField::Description => self.description = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Description,
}

/// Correlates an optimistic entry with its in-flight create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey(u64);

impl PendingKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PendingKey {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifies one fetch; results carrying an older ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for FetchTicket {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Delivered by the API (fetched, or acknowledged by a create).
    Confirmed,
    /// Appended locally; the create has not answered yet.
    Pending(PendingKey),
    /// The create failed. The entry is kept; nothing is retried.
    Failed { key: PendingKey, reason: String },
}

/// One row of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEntry {
    pub id: Option<TodoId>,
    pub name: String,
    pub description: Option<String>,
    pub sync: SyncState,
}

impl TodoEntry {
    fn confirmed(todo: Todo) -> Self {
        Self {
            id: Some(todo.id),
            name: todo.name,
            description: todo.description,
            sync: SyncState::Confirmed,
        }
    }

    fn pending_key(&self) -> Option<PendingKey> {
        match self.sync {
            SyncState::Pending(key) | SyncState::Failed { key, .. } => Some(key),
            SyncState::Confirmed => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.sync == SyncState::Confirmed
    }
}

/// Stable render key: the id once known, otherwise the list position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Id(TodoId),
    Position(usize),
}

/// Work the host must perform and report back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch { ticket: FetchTicket, page: PageRequest },
    Create { key: PendingKey, input: CreateTodoInput },
}

#[derive(Debug)]
struct FetchInProgress {
    ticket: FetchTicket,
    pages: usize,
    items: Vec<Todo>,
    /// Ids acknowledged by creates while this fetch was running. Its snapshot
    /// may predate them.
    acked: Vec<TodoId>,
}

#[derive(Debug, Default)]
pub struct TodoListViewModel {
    draft: Draft,
    entries: Vec<TodoEntry>,
    page_size: Option<u32>,
    mounted: bool,
    fetch: Option<FetchInProgress>,
    next_ticket: u64,
    next_key: u64,
}

impl TodoListViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request pages of at most `page_size` items.
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn entries(&self) -> &[TodoEntry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn entry_key(&self, position: usize) -> Option<EntryKey> {
        let entry = self.entries.get(position)?;
        Some(match &entry.id {
            Some(id) => EntryKey::Id(id.clone()),
            None => EntryKey::Position(position),
        })
    }

    /// First-render hook. Only the first call yields a fetch.
    pub fn mount(&mut self) -> Option<Command> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        Some(self.start_fetch())
    }

    /// Re-read the authoritative list. Supersedes any fetch in flight.
    pub fn refresh(&mut self) -> Command {
        self.mounted = true;
        self.start_fetch()
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        self.draft.set(field, value.into());
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.set_field(DraftField::Name, value);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.set_field(DraftField::Description, value);
    }

    /// Append the draft optimistically, clear it, and hand back the create.
    ///
    /// Returns `None` and changes nothing when the draft is not submittable.
    pub fn submit(&mut self) -> Option<Command> {
        if !self.draft.is_submittable() {
            debug!("ignoring submit of incomplete draft");
            return None;
        }

        let draft = mem::take(&mut self.draft);
        let key = PendingKey(self.next_key);
        self.next_key += 1;

        self.entries.push(TodoEntry {
            id: None,
            name: draft.name.clone(),
            description: Some(draft.description.clone()),
            sync: SyncState::Pending(key),
        });

        Some(Command::Create {
            key,
            input: CreateTodoInput::new(draft.name, draft.description),
        })
    }

    /// Feed back one page of a fetch.
    ///
    /// `Ok(Some(_))` asks for the next page. `Ok(None)` means the list was
    /// replaced, or the result was stale and ignored. On `Err` the list keeps
    /// its prior value and the error is returned after being logged.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<TodoPage, ApiError>,
    ) -> Result<Option<Command>, ApiError> {
        let Some(fetch) = self.fetch.as_mut().filter(|f| f.ticket == ticket) else {
            debug!(ticket = ticket.get(), "dropping stale fetch result");
            return Ok(None);
        };

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                self.fetch = None;
                error!("error fetching todos: {err}");
                return Err(err);
            }
        };

        fetch.pages += 1;
        fetch.items.extend(page.items);

        if let Some(next_token) = page.next_token {
            if fetch.pages >= MAX_FETCH_PAGES {
                self.fetch = None;
                let err = ApiError::TooManyPages(MAX_FETCH_PAGES);
                error!("error fetching todos: {err}");
                return Err(err);
            }
            return Ok(Some(Command::Fetch {
                ticket,
                page: PageRequest {
                    limit: self.page_size,
                    next_token: Some(next_token),
                },
            }));
        }

        let Some(fetch) = self.fetch.take() else {
            return Ok(None);
        };
        self.replace_with(fetch);
        Ok(None)
    }

    /// Feed back the outcome of a create.
    ///
    /// On success the optimistic entry takes the server id, or is dropped if a
    /// fetch already delivered that id. On failure the entry is marked
    /// `Failed` and the logged error is returned.
    pub fn complete_create(
        &mut self,
        key: PendingKey,
        result: Result<Todo, ApiError>,
    ) -> Result<(), ApiError> {
        let Some(pos) = self.entries.iter().position(|e| e.pending_key() == Some(key)) else {
            warn!(key = key.get(), "create result for unknown entry");
            return result.map(|_| ());
        };

        match result {
            Ok(todo) => {
                if let Some(fetch) = self.fetch.as_mut() {
                    fetch.acked.push(todo.id.clone());
                }
                let already_fetched = self
                    .entries
                    .iter()
                    .any(|e| e.is_confirmed() && e.id.as_ref() == Some(&todo.id));
                if already_fetched {
                    self.entries.remove(pos);
                } else {
                    self.entries[pos] = TodoEntry::confirmed(todo);
                }
                Ok(())
            }
            Err(err) => {
                error!("error creating todo: {err}");
                self.entries[pos].sync = SyncState::Failed {
                    key,
                    reason: err.to_string(),
                };
                Err(err)
            }
        }
    }

    fn start_fetch(&mut self) -> Command {
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        if self.fetch.is_some() {
            debug!(ticket = ticket.get(), "superseding fetch in flight");
        }
        self.fetch = Some(FetchInProgress {
            ticket,
            pages: 0,
            items: Vec::new(),
            acked: Vec::new(),
        });
        Command::Fetch {
            ticket,
            page: PageRequest::first(self.page_size),
        }
    }

    /// Fetched items in returned order, then the local entries the fetch
    /// could not know about: unconfirmed ones, and ones confirmed by a create
    /// after the fetch started but missing from its snapshot.
    fn replace_with(&mut self, fetch: FetchInProgress) {
        let FetchInProgress { items, acked, .. } = fetch;
        let unseen: Vec<TodoId> = acked
            .into_iter()
            .filter(|id| !items.iter().any(|t| &t.id == id))
            .collect();
        let local: Vec<TodoEntry> = self
            .entries
            .drain(..)
            .filter(|e| !e.is_confirmed() || e.id.as_ref().is_some_and(|id| unseen.contains(id)))
            .collect();
        self.entries = items.into_iter().map(TodoEntry::confirmed).collect();
        self.entries.extend(local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(n: u32, name: &str, description: &str) -> Todo {
        Todo {
            id: TodoId::new(format!("todo-{n}")),
            name: name.to_string(),
            description: Some(description.to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    fn page(items: Vec<Todo>, next_token: Option<&str>) -> TodoPage {
        TodoPage {
            items,
            next_token: next_token.map(str::to_string),
        }
    }

    fn fetch_ticket(cmd: Option<Command>) -> FetchTicket {
        match cmd {
            Some(Command::Fetch { ticket, .. }) => ticket,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    fn create_key(cmd: Option<Command>) -> PendingKey {
        match cmd {
            Some(Command::Create { key, .. }) => key,
            other => panic!("expected create, got {other:?}"),
        }
    }

    fn mounted_with(items: Vec<Todo>) -> TodoListViewModel {
        let mut vm = TodoListViewModel::new();
        let ticket = fetch_ticket(vm.mount());
        vm.complete_fetch(ticket, Ok(page(items, None))).unwrap();
        vm
    }

    #[test]
    fn mount_fetches_once() {
        let mut vm = TodoListViewModel::new();
        assert!(matches!(vm.mount(), Some(Command::Fetch { .. })));
        assert!(vm.is_loading());
        assert!(vm.mount().is_none());
    }

    #[test]
    fn successful_fetch_replaces_list_in_order() {
        let vm = mounted_with(vec![todo(2, "b", "y"), todo(1, "a", "x")]);
        let names: Vec<_> = vm.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert!(vm.entries().iter().all(TodoEntry::is_confirmed));
        assert!(!vm.is_loading());
    }

    #[test]
    fn failed_fetch_leaves_list_unchanged() {
        let mut vm = TodoListViewModel::new();
        let ticket = fetch_ticket(vm.mount());
        let err = vm
            .complete_fetch(ticket, Err(ApiError::Transport("down".into())))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(vm.entries().is_empty());

        let mut vm = mounted_with(vec![todo(1, "a", "x")]);
        let ticket = fetch_ticket(Some(vm.refresh()));
        vm.complete_fetch(ticket, Err(ApiError::MissingData("listTodos")))
            .unwrap_err();
        assert_eq!(vm.entries().len(), 1);
        assert_eq!(vm.entries()[0].name, "a");
    }

    #[test]
    fn submit_appends_optimistic_entry_and_clears_draft() {
        let mut vm = mounted_with(vec![todo(1, "a", "x")]);
        vm.set_name("Buy milk");
        vm.set_description("2%");

        let cmd = vm.submit();
        match &cmd {
            Some(Command::Create { input, .. }) => {
                assert_eq!(input, &CreateTodoInput::new("Buy milk", "2%"));
            }
            other => panic!("expected create, got {other:?}"),
        }

        assert_eq!(vm.draft(), &Draft::default());
        let last = vm.entries().last().unwrap();
        assert_eq!(last.name, "Buy milk");
        assert_eq!(last.description.as_deref(), Some("2%"));
        assert_eq!(last.id, None);
        assert!(matches!(last.sync, SyncState::Pending(_)));
        assert_eq!(vm.entries().len(), 2);
    }

    #[test]
    fn incomplete_drafts_are_ignored() {
        for (name, description) in [("", ""), ("name", ""), ("", "desc"), ("  ", "desc"), ("name", "\t")] {
            let mut vm = TodoListViewModel::new();
            vm.set_name(name);
            vm.set_description(description);
            assert!(vm.submit().is_none());
            assert!(vm.entries().is_empty());
            assert_eq!(vm.draft(), &Draft::new(name, description));
        }
    }

    #[test]
    fn sequential_submissions_keep_order_without_ids() {
        let mut vm = TodoListViewModel::new();
        vm.set_name("first");
        vm.set_description("1");
        let k1 = create_key(vm.submit());
        vm.set_name("second");
        vm.set_description("2");
        let k2 = create_key(vm.submit());

        assert_ne!(k1, k2);
        let names: Vec<_> = vm.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(vm.entries().iter().all(|e| e.id.is_none()));
        assert_eq!(vm.entry_key(1), Some(EntryKey::Position(1)));
    }

    #[test]
    fn failed_create_keeps_entry_and_marks_it() {
        let mut vm = TodoListViewModel::new();
        vm.set_name("n");
        vm.set_description("d");
        let key = create_key(vm.submit());

        let err = vm
            .complete_create(key, Err(ApiError::HttpError { status: 500, body: "x".into() }))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
        assert_eq!(vm.entries().len(), 1);
        assert!(matches!(
            &vm.entries()[0].sync,
            SyncState::Failed { key: k, reason } if *k == key && reason.contains("500")
        ));
        assert_eq!(vm.draft(), &Draft::default());
    }

    #[test]
    fn successful_create_confirms_entry() {
        let mut vm = TodoListViewModel::new();
        vm.set_name("n");
        vm.set_description("d");
        let key = create_key(vm.submit());

        vm.complete_create(key, Ok(todo(7, "n", "d"))).unwrap();
        assert_eq!(vm.entries().len(), 1);
        assert_eq!(vm.entries()[0].id, Some(TodoId::from("todo-7")));
        assert!(vm.entries()[0].is_confirmed());
        assert_eq!(vm.entry_key(0), Some(EntryKey::Id(TodoId::from("todo-7"))));
    }

    #[test]
    fn refresh_keeps_unconfirmed_entries_after_fetched_ones() {
        let mut vm = mounted_with(vec![todo(1, "a", "x")]);
        vm.set_name("local");
        vm.set_description("l");
        vm.submit();

        let ticket = fetch_ticket(Some(vm.refresh()));
        vm.complete_fetch(ticket, Ok(page(vec![todo(1, "a", "x"), todo(2, "b", "y")], None)))
            .unwrap();

        let names: Vec<_> = vm.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "local"]);
        assert!(!vm.entries()[2].is_confirmed());
    }

    #[test]
    fn create_ack_after_fetch_already_saw_it_removes_duplicate() {
        let mut vm = TodoListViewModel::new();
        vm.set_name("n");
        vm.set_description("d");
        let key = create_key(vm.submit());

        let ticket = fetch_ticket(vm.mount());
        vm.complete_fetch(ticket, Ok(page(vec![todo(9, "n", "d")], None)))
            .unwrap();
        assert_eq!(vm.entries().len(), 2);

        vm.complete_create(key, Ok(todo(9, "n", "d"))).unwrap();
        assert_eq!(vm.entries().len(), 1);
        assert_eq!(vm.entries()[0].id, Some(TodoId::from("todo-9")));
    }

    #[test]
    fn create_ack_survives_fetch_that_started_before_it() {
        let mut vm = TodoListViewModel::new();
        let ticket = fetch_ticket(vm.mount());
        vm.set_name("n");
        vm.set_description("d");
        let key = create_key(vm.submit());

        vm.complete_create(key, Ok(todo(9, "n", "d"))).unwrap();
        assert!(vm.entries()[0].is_confirmed());

        // The fetch read the server before the create landed.
        vm.complete_fetch(ticket, Ok(page(vec![todo(1, "a", "x")], None)))
            .unwrap();
        let names: Vec<_> = vm.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "n"]);
        assert_eq!(vm.entries()[1].id, Some(TodoId::from("todo-9")));
        assert!(vm.entries()[1].is_confirmed());
    }

    #[test]
    fn create_ack_seen_by_running_fetch_is_not_duplicated() {
        let mut vm = TodoListViewModel::new();
        let ticket = fetch_ticket(vm.mount());
        vm.set_name("n");
        vm.set_description("d");
        let key = create_key(vm.submit());
        vm.complete_create(key, Ok(todo(9, "n", "d"))).unwrap();

        vm.complete_fetch(ticket, Ok(page(vec![todo(9, "n", "d")], None)))
            .unwrap();
        assert_eq!(vm.entries().len(), 1);
        assert_eq!(vm.entries()[0].id, Some(TodoId::from("todo-9")));
    }

    #[test]
    fn later_refresh_drops_confirmed_entries_gone_from_server() {
        let mut vm = TodoListViewModel::new();
        vm.set_name("n");
        vm.set_description("d");
        let key = create_key(vm.submit());
        vm.complete_create(key, Ok(todo(9, "n", "d"))).unwrap();

        // Started after the ack, so its snapshot is authoritative.
        let ticket = fetch_ticket(Some(vm.refresh()));
        vm.complete_fetch(ticket, Ok(page(Vec::new(), None))).unwrap();
        assert!(vm.entries().is_empty());
    }

    #[test]
    fn paginated_fetch_accumulates_pages() {
        let mut vm = TodoListViewModel::new().with_page_size(Some(1));
        let ticket = fetch_ticket(vm.mount());

        let next = vm
            .complete_fetch(ticket, Ok(page(vec![todo(1, "a", "x")], Some("p2"))))
            .unwrap();
        match next {
            Some(Command::Fetch { ticket: t, page }) => {
                assert_eq!(t, ticket);
                assert_eq!(page.limit, Some(1));
                assert_eq!(page.next_token.as_deref(), Some("p2"));
            }
            other => panic!("expected next page, got {other:?}"),
        }
        assert!(vm.entries().is_empty());

        let done = vm
            .complete_fetch(ticket, Ok(page(vec![todo(2, "b", "y")], None)))
            .unwrap();
        assert!(done.is_none());
        assert_eq!(vm.entries().len(), 2);
    }

    #[test]
    fn failure_mid_pagination_discards_partial_pages() {
        let mut vm = mounted_with(vec![todo(1, "a", "x")]);
        let ticket = fetch_ticket(Some(vm.refresh()));
        vm.complete_fetch(ticket, Ok(page(vec![todo(2, "b", "y")], Some("p2"))))
            .unwrap();
        vm.complete_fetch(ticket, Err(ApiError::Transport("reset".into())))
            .unwrap_err();

        assert_eq!(vm.entries().len(), 1);
        assert_eq!(vm.entries()[0].name, "a");
        assert!(!vm.is_loading());
    }

    #[test]
    fn stale_fetch_results_are_dropped() {
        let mut vm = TodoListViewModel::new();
        let old = fetch_ticket(vm.mount());
        let new = fetch_ticket(Some(vm.refresh()));

        let outcome = vm.complete_fetch(old, Ok(page(vec![todo(1, "old", "x")], None)));
        assert!(matches!(outcome, Ok(None)));
        assert!(vm.entries().is_empty());

        vm.complete_fetch(new, Ok(page(vec![todo(2, "new", "y")], None)))
            .unwrap();
        assert_eq!(vm.entries()[0].name, "new");
    }

    #[test]
    fn endless_pagination_is_cut_off() {
        let mut vm = TodoListViewModel::new();
        let ticket = fetch_ticket(vm.mount());
        let mut last = Ok(None);
        for _ in 0..MAX_FETCH_PAGES {
            last = vm.complete_fetch(ticket, Ok(page(Vec::new(), Some("again"))));
            if last.is_err() {
                break;
            }
        }
        assert!(matches!(last, Err(ApiError::TooManyPages(MAX_FETCH_PAGES))));
        assert!(!vm.is_loading());
    }
}
