use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::FutureExt;
use futures::future::BoxFuture;
use ratatui::Frame;
use ratatui::layout::Rect;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::theme::Theme;

/// Opaque value a task hands back to the screen that spawned it.
pub type Payload = Box<dyn Any + Send>;

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Tick,
    Payload(Payload),
}

/// Follow-up work returned by screens and their callbacks.
///
/// Commands never block the event loop: anything slow is wrapped in
/// [`Command::Task`] and its result comes back as another command.
pub enum Command {
    None,
    Batch(Vec<Command>),
    Task(BoxFuture<'static, Command>),
    /// Hand a payload to the screen that issued the enclosing task.
    Deliver(Payload),
    Push(Box<dyn Screen>),
    Pop,
    Status(String),
    Quit,
    Fail(anyhow::Error),
}

impl Command {
    pub fn task<F>(future: F) -> Self
    where
        F: Future<Output = Command> + Send + 'static,
    {
        Self::Task(future.boxed())
    }

    pub fn deliver<P: Any + Send>(payload: P) -> Self {
        Self::Deliver(Box::new(payload))
    }

    pub fn push<S: Screen + 'static>(screen: S) -> Self {
        Self::Push(Box::new(screen))
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::Status(text.into())
    }

    pub fn batch(commands: impl IntoIterator<Item = Command>) -> Self {
        let commands = commands
            .into_iter()
            .filter(|command| !command.is_none())
            .collect::<Vec<_>>();
        match commands.len() {
            0 => Self::None,
            _ => Self::Batch(commands),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Debug for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Batch(commands) => f.debug_tuple("Batch").field(commands).finish(),
            Self::Task(_) => write!(f, "Task(..)"),
            Self::Deliver(_) => write!(f, "Deliver(..)"),
            Self::Push(screen) => write!(f, "Push({})", screen.title()),
            Self::Pop => write!(f, "Pop"),
            Self::Status(text) => f.debug_tuple("Status").field(text).finish(),
            Self::Quit => write!(f, "Quit"),
            Self::Fail(error) => write!(f, "Fail({error:#})"),
        }
    }
}

/// A full-body view living on the navigation stack.
pub trait Screen: Send {
    fn title(&self) -> String;

    fn init(&mut self) -> Command {
        Command::None
    }

    fn update(&mut self, message: Message) -> Command;

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// True while the screen owns plain character input (e.g. a search box).
    fn captures_text(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ScreenId(u64);

#[derive(Debug)]
pub struct Completion {
    pub owner: ScreenId,
    pub command: Command,
}

pub struct Navigator {
    stack: Vec<(ScreenId, Box<dyn Screen>)>,
    next_id: u64,
    status: String,
    running: bool,
    failure: Option<anyhow::Error>,
    tasks: mpsc::UnboundedSender<Completion>,
}

impl Navigator {
    pub fn new(tasks: mpsc::UnboundedSender<Completion>) -> Self {
        Self {
            stack: Vec::new(),
            next_id: 1,
            status: "Ready".to_string(),
            running: true,
            failure: None,
            tasks,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn take_failure(&mut self) -> Option<anyhow::Error> {
        self.failure.take()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn breadcrumbs(&self) -> Vec<String> {
        self.stack.iter().map(|(_, screen)| screen.title()).collect()
    }

    pub fn top_mut(&mut self) -> Option<&mut (dyn Screen + 'static)> {
        self.stack.last_mut().map(|(_, screen)| screen.as_mut())
    }

    pub fn top_captures_text(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|(_, screen)| screen.captures_text())
    }

    pub fn push(&mut self, mut screen: Box<dyn Screen>) {
        let id = ScreenId(self.next_id);
        self.next_id += 1;
        let title = screen.title();
        let command = screen.init();
        self.stack.push((id, screen));
        info!(screen = %title, depth = self.depth(), "push screen");
        self.execute(id, command);
    }

    pub fn pop(&mut self) {
        if let Some((_, screen)) = self.stack.pop() {
            info!(screen = %screen.title(), "pop screen");
        }
        if self.stack.is_empty() {
            self.running = false;
        }
    }

    /// Host-level keys first, everything else goes to the top screen.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.execute_detached(Command::Quit);
            }
            KeyCode::Char('q') if key.modifiers.is_empty() && !self.top_captures_text() => {
                self.pop();
            }
            _ => self.dispatch(Message::Key(key)),
        }
    }

    pub fn dispatch(&mut self, message: Message) {
        let Some((id, screen)) = self.stack.last_mut() else {
            return;
        };
        let id = *id;
        let command = screen.update(message);
        self.execute(id, command);
    }

    pub fn complete(&mut self, completion: Completion) {
        self.execute(completion.owner, completion.command);
    }

    fn execute_detached(&mut self, command: Command) {
        let owner = self
            .stack
            .last()
            .map(|(id, _)| *id)
            .unwrap_or(ScreenId(0));
        self.execute(owner, command);
    }

    fn execute(&mut self, owner: ScreenId, command: Command) {
        match command {
            Command::None => {}
            Command::Batch(commands) => {
                for command in commands {
                    self.execute(owner, command);
                }
            }
            Command::Task(future) => {
                let tx = self.tasks.clone();
                tokio::spawn(async move {
                    let command = future.await;
                    let _ = tx.send(Completion { owner, command });
                });
            }
            Command::Deliver(payload) => self.deliver(owner, payload),
            Command::Push(screen) => self.push(screen),
            Command::Pop => self.pop(),
            Command::Status(status) => self.status = status,
            Command::Quit => {
                info!("quit requested");
                self.running = false;
            }
            Command::Fail(error) => {
                warn!("session failed: {error:#}");
                self.failure = Some(error);
                self.running = false;
            }
        }
    }

    fn deliver(&mut self, owner: ScreenId, payload: Payload) {
        let command = match self.stack.iter_mut().find(|(id, _)| *id == owner) {
            Some((_, screen)) => screen.update(Message::Payload(payload)),
            None => {
                debug!(?owner, "dropping payload for a screen no longer on the stack");
                return;
            }
        };
        self.execute(owner, command);
    }
}
