mod repl;
mod settings;
mod transport;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use todo_core::{RemoteTodos, Session, Submission, TodoApp, TodoClient, TodoListViewModel};
use tracing::info;
use tracing_subscriber::EnvFilter;

use repl::Input;
use settings::ConnectionArgs;
use transport::UreqTransport;

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Interactive client for a GraphQL todo list")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Name shown in the greeting. Omit for an anonymous session.
    #[arg(long, env = "TODO_USER")]
    user: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.connection.resolve()?;
    info!(endpoint = %config.endpoint, "connecting");

    let session = cli.user.map_or_else(Session::anonymous, Session::signed_in);
    let api = RemoteTodos::new(TodoClient::from_config(&config), UreqTransport::new());
    let view = TodoListViewModel::new().with_page_size(config.page_size);
    let mut app = TodoApp::with_view(api, session, view);

    if let Err(e) = app.mount() {
        eprintln!("could not load todos: {e}");
    }
    println!("{}", app.render());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let input = match repl::parse(&line?) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match input {
            Input::Empty => {}
            Input::Name(text) => app.set_name(text),
            Input::Description(text) => app.set_description(text),
            Input::Submit => {
                match app.submit() {
                    Submission::Rejected => eprintln!("name and description are both required"),
                    Submission::Saved => {}
                    Submission::Failed(e) => eprintln!("could not save todo: {e}"),
                }
                println!("{}", app.render());
            }
            Input::Refresh => {
                if let Err(e) = app.refresh() {
                    eprintln!("could not load todos: {e}");
                }
                println!("{}", app.render());
            }
            Input::Show => println!("{}", app.render()),
            Input::Help => println!("{}", repl::HELP),
            Input::SignOut => {
                app.sign_out();
                println!("signed out");
                break;
            }
            Input::Quit => break,
        }
    }

    Ok(())
}
