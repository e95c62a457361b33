use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use tutor_core::{update, AppState, AppViewModel, Msg};
use tutor_engine::{BackendClient, EndpointResolver, EngineHandle, JsonHistoryRepository};

use super::commands::{self, Command, HELP_TEXT};
use super::config::AppConfig;
use super::effects::{now_millis, EffectRunner};
use super::logging::{self, LogDestination};
use super::render;

const TICK_INTERVAL: Duration = Duration::from_millis(75);

/// Everything the main loop reacts to.
pub enum Event {
    Line(String),
    InputClosed,
    Msg(Msg),
}

pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::initialize(LogDestination::from_flag(config.log_to_terminal));
    engine_info!("Starting tutor client with {:?}", config);

    let resolver = EndpointResolver::http(config.resolver_settings(), config.candidate_generator())
        .context("could not create HTTP client")?;
    let engine = EngineHandle::new(BackendClient::new(Arc::new(resolver)))
        .context("could not start engine thread")?;
    let history = JsonHistoryRepository::in_dir(&config.history_dir());
    engine_info!("Chat history at {:?}", history.slot().path());

    let (event_tx, event_rx) = mpsc::channel::<Event>();
    let effects = EffectRunner::new(engine, Box::new(history), event_tx.clone());
    spawn_input_reader(event_tx.clone());

    // Background tick to coalesce rendering.
    thread::spawn(move || {
        while event_tx.send(Event::Msg(Msg::Tick)).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    let mut app = App::new(effects);
    app.print(["Study assistant. Type /help for commands."]);
    app.dispatch(Msg::Started { at: now_millis() });

    for event in event_rx {
        match event {
            Event::Line(line) => {
                if !app.handle_line(&line) {
                    break;
                }
            }
            Event::InputClosed => break,
            Event::Msg(msg) => app.dispatch(msg),
        }
    }

    app.flush();
    engine_info!("Tutor client exiting");
    Ok(())
}

fn spawn_input_reader(events: mpsc::Sender<Event>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if events.send(Event::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    engine_warn!("Failed to read input: {}", err);
                    break;
                }
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

struct App {
    state: AppState,
    shown: AppViewModel,
    render_pending: bool,
    effects: EffectRunner,
}

impl App {
    fn new(effects: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            shown: AppViewModel::default(),
            render_pending: false,
            effects,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let is_tick = matches!(msg, Msg::Tick);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.render_pending |= state.consume_dirty();
        self.state = state;

        if is_tick {
            self.flush();
        }
        self.effects.enqueue(effects);
    }

    /// Prints whatever changed since the last render.
    fn flush(&mut self) {
        if !self.render_pending {
            return;
        }
        self.render_pending = false;
        let view = self.state.view();
        let lines = render::render(&self.shown, &view);
        self.shown = view;
        self.print(lines);
    }

    /// Handles one input line. Returns `false` when the user quits.
    fn handle_line(&mut self, line: &str) -> bool {
        let command = match commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(err) => {
                self.print([err.to_string()]);
                return true;
            }
        };

        self.flush();
        if matches!(command, Command::Ask(_) | Command::Upload(_)) && !self.state.is_idle() {
            self.print(["Please wait for the current request to finish."]);
            return true;
        }
        match command {
            Command::Ask(question) => {
                self.dispatch(Msg::InputChanged(question));
                self.dispatch(Msg::SendClicked { at: now_millis() });
            }
            Command::Upload(path) => match commands::chosen_file(&path) {
                Ok(msg) => self.dispatch(msg),
                Err(err) => self.print([format!("{err:#}")]),
            },
            Command::NewChat => self.dispatch(Msg::NewChatClicked { at: now_millis() }),
            Command::History => {
                let view = self.state.view();
                self.print(render::render_history(&view));
            }
            Command::Open(index) => match commands::history_entry(&self.state.view(), index) {
                Some(id) => self.dispatch(Msg::ChatSelected { id }),
                None => self.print([format!("No conversation number {index}; see /history.")]),
            },
            Command::Clear => self.dispatch(Msg::ClearHistoryClicked { at: now_millis() }),
            Command::Status => {
                let view = self.state.view();
                self.print(render::render_status(&view, &self.effects.connection_info()));
                self.dispatch(Msg::StatusRequested);
            }
            Command::Help => self.print(HELP_TEXT.lines()),
            Command::Quit => return false,
        }
        true
    }

    fn print<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = io::stdout().lock();
        for line in lines {
            let _ = writeln!(out, "{}", line.as_ref());
        }
        let _ = out.flush();
    }
}
