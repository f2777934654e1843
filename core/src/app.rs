//! Synchronous driver pairing the view-model with one injected `TodoApi`.
//!
//! Every view-model command is executed immediately and its result fed back,
//! so a caller sees a settled state after each method returns. Failures have
//! already been logged by the view-model; they are returned as well so the
//! caller can decide whether to show them.

use tracing::info;

use crate::error::ApiError;
use crate::remote::TodoApi;
use crate::render::render;
use crate::session::Session;
use crate::view_model::{Command, TodoListViewModel};

/// What happened to a submit.
#[derive(Debug)]
pub enum Submission {
    /// The draft was incomplete; nothing changed.
    Rejected,
    /// The entry was appended and the create succeeded.
    Saved,
    /// The entry was appended but the create failed.
    Failed(ApiError),
}

pub struct TodoApp<A> {
    api: A,
    view: TodoListViewModel,
    session: Session,
}

impl<A: TodoApi> TodoApp<A> {
    pub fn new(api: A, session: Session) -> Self {
        Self::with_view(api, session, TodoListViewModel::new())
    }

    pub fn with_view(api: A, session: Session, view: TodoListViewModel) -> Self {
        Self { api, view, session }
    }

    pub fn view(&self) -> &TodoListViewModel {
        &self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// First render: load the list once. Later calls do nothing.
    pub fn mount(&mut self) -> Result<(), ApiError> {
        match self.view.mount() {
            Some(cmd) => self.run(cmd),
            None => Ok(()),
        }
    }

    pub fn refresh(&mut self) -> Result<(), ApiError> {
        let cmd = self.view.refresh();
        self.run(cmd)
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.view.set_name(value);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.view.set_description(value);
    }

    pub fn submit(&mut self) -> Submission {
        let Some(cmd) = self.view.submit() else {
            return Submission::Rejected;
        };
        match self.run(cmd) {
            Ok(()) => Submission::Saved,
            Err(err) => Submission::Failed(err),
        }
    }

    pub fn render(&self) -> String {
        render(&self.view, &self.session)
    }

    /// End the session, handing back the API value.
    pub fn sign_out(self) -> A {
        info!(user = self.session.username().unwrap_or_default(), "signing out");
        self.api
    }

    fn run(&mut self, cmd: Command) -> Result<(), ApiError> {
        let mut next = Some(cmd);
        while let Some(cmd) = next.take() {
            next = match cmd {
                Command::Fetch { ticket, page } => {
                    let result = self.api.list_todos(&page);
                    self.view.complete_fetch(ticket, result)?
                }
                Command::Create { key, input } => {
                    let result = self.api.create_todo(&input);
                    self.view.complete_create(key, result)?;
                    None
                }
            };
        }
        Ok(())
    }
}
