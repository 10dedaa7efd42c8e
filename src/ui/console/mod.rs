use crate::client::registry::Registry;
use crate::client::state::Target;
use crate::client::transport::{Endpoint, HttpTransport, Transport};
use crate::client::DebugClient;
use crate::ui::command::parser::{QUIT_COMMAND, QUIT_COMMAND_SHORT};
use crate::ui::command::{
    map, message, r#break, remote, session, show, trace, watch, Command, CommandError,
    CommandResult,
};
use crate::ui::config;
use crate::ui::console::editor::{create_editor, SmdbgEditor};
use crate::ui::console::help::help_for_command;
use crate::ui::console::print::style::{
    BreakpointView, ErrorView, KeywordView, PathView, SessionView,
};
use crate::ui::console::print::ExternalPrinter;
use crate::{muted_error, weak_error};
use anyhow::Context;
use log::{debug, info};
use rustyline::error::ReadlineError;
use std::rc::Rc;
use std::sync::{Arc, Mutex, Once};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::LocalSet;

mod editor;
mod help;
pub mod print;
pub mod view;

const WELCOME_TEXT: &str = r#"
smdbg: actor message debugger client, type `help` for list of commands
"#;

/// Command line prompt: `SMDBG@<host>[<local id>](<global id prefix>)> `.
pub fn prompt(host: &str, registry: &Registry) -> String {
    match registry.current() {
        Ok(session) => format!(
            "SMDBG@{host}[{}]({})> ",
            session.local_id(),
            session.global_id().short()
        ),
        Err(_) => format!("SMDBG@{host}> "),
    }
}

pub struct AppBuilder {
    endpoint: Endpoint,
}

impl AppBuilder {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn build(self) -> anyhow::Result<TerminalApplication> {
        let (control_tx, control_rx) = mpsc::unbounded_channel::<Control>();
        let mut editor = create_editor()?;
        let printer = ExternalPrinter::new(&mut editor);

        Ok(TerminalApplication {
            host: self.endpoint.host().to_string(),
            client: DebugClient::new(HttpTransport::new(self.endpoint)),
            editor,
            printer,
            control_tx,
            control_rx,
        })
    }
}

enum Control {
    /// New command from user received
    Cmd(String),
    /// Terminate application
    Terminate,
}

pub struct TerminalApplication {
    client: DebugClient<HttpTransport>,
    host: String,
    editor: SmdbgEditor,
    printer: ExternalPrinter,
    control_tx: UnboundedSender<Control>,
    control_rx: UnboundedReceiver<Control>,
}

pub static LOGGER_ONCE: Once = Once::new();
pub static HELLO_ONCE: Once = Once::new();

impl TerminalApplication {
    /// Open the first session and run interactive loop until user quits.
    ///
    /// Fails only if the first session can not be opened.
    pub fn run(self) -> anyhow::Result<()> {
        LOGGER_ONCE.call_once(|| {
            env_logger::init();
        });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        LocalSet::new().block_on(&runtime, self.run_local())
    }

    async fn run_local(self) -> anyhow::Result<()> {
        let client = Rc::new(self.client);
        let id = client
            .open()
            .await
            .with_context(|| format!("failed to open debug session at {}", self.host))?;
        let global_id = client.switch_to(id)?;
        info!(target: "session", "first session {id} opened as {global_id}");

        let prompt = Arc::new(Mutex::new(prompt(&self.host, &client.registry())));
        let executor = Executor {
            client,
            printer: Rc::new(self.printer),
            prompt: Arc::clone(&prompt),
            host: Rc::from(self.host.as_str()),
        };

        let mut editor = self.editor;
        {
            let control_tx = self.control_tx;
            let prompt = Arc::clone(&prompt);
            thread::spawn(move || editor_loop(&mut editor, &prompt, &control_tx));
        }

        HELLO_ONCE.call_once(|| {
            executor.printer.print(WELCOME_TEXT);
        });
        executor.printer.print(format!(
            "Session {} opened ({global_id})",
            SessionView::from(id)
        ));

        let app_loop = AppLoop {
            executor,
            control_rx: self.control_rx,
        };
        app_loop.run().await;

        Ok(())
    }
}

/// Read user input until quit, every line is forwarded to the application loop without waiting
/// for the previous command to complete.
fn editor_loop(
    editor: &mut SmdbgEditor,
    prompt: &Mutex<String>,
    control_tx: &UnboundedSender<Control>,
) {
    let history = config::current()
        .filter(|cfg| cfg.save_history)
        .map(|cfg| cfg.history_file.clone());
    if let Some(ref file) = history {
        muted_error!(editor.load_history(file), "history not loaded:");
    }

    loop {
        let current_prompt = prompt.lock().map(|p| p.clone()).unwrap_or_default();
        match editor.readline(&current_prompt) {
            Ok(input) => {
                let command = input.trim();
                if command == QUIT_COMMAND || command == QUIT_COMMAND_SHORT {
                    break;
                }
                if !command.is_empty() {
                    _ = editor.add_history_entry(command);
                }
                if control_tx.send(Control::Cmd(input)).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("error: {:#}", err);
                break;
            }
        }
    }

    if let Some(ref file) = history {
        weak_error!(editor.save_history(file), "history not saved:");
    }
    _ = control_tx.send(Control::Terminate);
}

struct AppLoop {
    executor: Executor<HttpTransport>,
    control_rx: UnboundedReceiver<Control>,
}

impl AppLoop {
    async fn run(mut self) {
        while let Some(action) = self.control_rx.recv().await {
            match action {
                Control::Cmd(command) => {
                    // commands are not serialized, their output comes in order of completion
                    let executor = self.executor.clone();
                    tokio::task::spawn_local(async move { executor.execute(&command).await });
                }
                Control::Terminate => {
                    break;
                }
            }
        }
    }
}

/// Execute a single command line and print its result.
pub struct Executor<T: Transport> {
    client: Rc<DebugClient<T>>,
    printer: Rc<ExternalPrinter>,
    prompt: Arc<Mutex<String>>,
    host: Rc<str>,
}

impl<T: Transport> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            client: Rc::clone(&self.client),
            printer: Rc::clone(&self.printer),
            prompt: Arc::clone(&self.prompt),
            host: Rc::clone(&self.host),
        }
    }
}

impl<T: Transport> Executor<T> {
    async fn execute(&self, command: &str) {
        if let Err(e) = self.handle_command(command).await {
            match e {
                CommandError::Parsing(_) => {
                    self.printer.print(ErrorView::from(e));
                }
                CommandError::Handle(ref err) if err.is_network() => {
                    self.printer
                        .print(ErrorView::from(format!("connection error: {e:#}")));
                }
                CommandError::Handle(_) | CommandError::Evaluation(_) => {
                    self.printer.print(ErrorView::from(format!("error: {e:#}")));
                }
            }
        }
        self.update_prompt();
    }

    fn update_prompt(&self) {
        let new_prompt = prompt(&self.host, &self.client.registry());
        if let Ok(mut prompt) = self.prompt.lock() {
            *prompt = new_prompt;
        }
    }

    async fn handle_command(&self, cmd: &str) -> CommandResult<()> {
        let command = Command::parse(cmd)?;
        debug!(target: "console", "execute {command:?}");

        match command {
            Command::Session(cmd) => match session::Handler::new(&self.client).handle(cmd).await? {
                session::ExecutionResult::Opened(id, global_id) => self.printer.print(format!(
                    "Session {} opened ({global_id})",
                    SessionView::from(id)
                )),
                session::ExecutionResult::Switched(id, global_id) => self.printer.print(format!(
                    "Switched to session {} ({global_id})",
                    SessionView::from(id)
                )),
                session::ExecutionResult::Closed(id) => self
                    .printer
                    .print(format!("Session {} closed", SessionView::from(id))),
                session::ExecutionResult::Info(sessions) => {
                    self.printer.print_lines(view::render_sessions(&sessions))
                }
            },
            Command::Remote(cmd) => match remote::Handler::new(&self.client).handle(cmd).await? {
                remote::ExecutionResult::Listing(listing) => self
                    .printer
                    .print_lines(view::render_remote_listing(&listing)),
                remote::ExecutionResult::Connected(id, global_id) => {
                    self.printer.print(format!(
                        "Connected to {global_id} as session {}",
                        SessionView::from(id)
                    ))
                }
            },
            Command::Breakpoint(cmd) => {
                match r#break::Handler::new(&self.client).handle(cmd).await? {
                    r#break::ExecutionResult::New(name) => self
                        .printer
                        .print(format!("New breakpoint {}", BreakpointView::from(name))),
                    r#break::ExecutionResult::Modified { name, active } => {
                        self.printer.print(format!(
                            "Breakpoint {} {}",
                            BreakpointView::from(name),
                            if active { "enabled" } else { "disabled" }
                        ))
                    }
                }
            }
            Command::Trace(enabled) => {
                let enabled = trace::Handler::new(&self.client).handle(enabled).await?;
                self.printer.print(format!(
                    "Trace is {}",
                    KeywordView::from(if enabled { "on" } else { "off" })
                ));
            }
            Command::Map(cmd) => match map::Handler::new(&self.client).handle(cmd).await? {
                map::ExecutionResult::Continued => self.printer.print("Map execution continued"),
                map::ExecutionResult::MovedTo(target_id) => self
                    .printer
                    .print(format!("Cursor moved to target #{}", target_id + 1)),
                map::ExecutionResult::TargetAdded(target) => {
                    let target = view::render_target(&Target::from_value(&target));
                    self.printer
                        .print(format!("Target added: {}", PathView::from(target.name)));
                }
                map::ExecutionResult::TargetRemoved => self.printer.print("Target removed"),
                map::ExecutionResult::Dumped => self
                    .printer
                    .print("Dump created, use `show dumps` to see it"),
            },
            Command::Watch(cmd) => match watch::Handler::new(&self.client).handle(cmd)? {
                watch::ExecutionResult::Added(number, source) => self
                    .printer
                    .print(format!("{number}) {}", KeywordView::from(source))),
                watch::ExecutionResult::Removed(number, watch) => self.printer.print(format!(
                    "Watch {number}) {} removed",
                    KeywordView::from(watch.source())
                )),
            },
            Command::Message(text) => {
                let injected = message::Handler::new(&self.client).handle(&text).await?;
                let target = view::render_target(&Target::from_value(&injected.target));
                self.printer.print(format!(
                    "Message content set for {}",
                    PathView::from(target.name)
                ));
            }
            Command::Show(aspect) => match show::Handler::new(&self.client).handle(aspect).await? {
                show::ExecutionResult::Watch {
                    message_content,
                    watches,
                } => self
                    .printer
                    .print_lines(view::render_watches(message_content.as_ref(), &watches)),
                show::ExecutionResult::Map(snapshot) => {
                    self.printer.print_lines(view::render_map(&snapshot))
                }
                show::ExecutionResult::Exception(exception) => self
                    .printer
                    .print_lines(view::render_exception(exception.as_ref())),
                show::ExecutionResult::Dumps(dumps) => {
                    self.printer.print_lines(view::render_dumps(&dumps))
                }
                show::ExecutionResult::Help => self.printer.print_lines(view::render_aspects()),
            },
            Command::Stat => {
                let state = show::Handler::new(&self.client).stat().await?;
                self.printer.print(
                    serde_json::to_string_pretty(&state).unwrap_or_else(|_| state.to_string()),
                );
            }
            Command::SkipInput => {}
            Command::Help(command) => {
                self.printer.print(help_for_command(command.as_deref()));
            }
        }

        Ok(())
    }
}
