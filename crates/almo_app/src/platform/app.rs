use std::path::{Path, PathBuf};
use std::sync::Arc;

use almo_core::{update, AppState, FileRef, Msg, SendOutcome};
use almo_engine::{EngineHandle, TokenProvider};
use almo_logging::{almo_error, almo_info, almo_warn};
use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::config::AppConfig;
use super::effects::{map_event, EffectRunner};
use super::ui::commands::{self, Command, HELP};
use super::ui::render::{render, render_documents, render_sessions, RenderState};
use super::{logging, persistence};

pub async fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logging::initialize(config.log_destination, config.log_level);
    almo_info!("Starting almo against {}", config.client.base_url);

    let tokens: Arc<dyn TokenProvider> = Arc::new(config.token.clone());
    if tokens.credential().is_none() {
        almo_warn!("ALMO_TOKEN is not set; uploads and chat will require authentication");
    }
    let (engine, mut events) =
        EngineHandle::new(&config.client, tokens).context("building the HTTP client")?;

    let mut app = App {
        runner: EffectRunner::new(engine),
        printed: RenderState::default(),
    };
    let mut state = AppState::new(Utc::now());
    let saved = persistence::load_sessions(&config.state_dir);
    if !saved.is_empty() {
        state = app.dispatch(state, Msg::RestoreSessions(saved));
    }
    let mut greeting = render(&state.view(), &mut app.printed);
    greeting.push("Type /help for commands.".to_string());
    app.print(greeting);
    app.runner.load_documents();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match commands::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => state = app.handle_command(state, command).await,
                    None => {}
                },
                Ok(None) => break,
                Err(err) => {
                    almo_error!("Reading input failed: {}", err);
                    break;
                }
            },
            Some(event) = events.recv() => {
                if let Some(msg) = map_event(event, Utc::now()) {
                    state = app.dispatch(state, msg);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    app.runner.shutdown();
    persistence::save_sessions(&config.state_dir, &state.sessions_snapshot()).with_context(
        || format!("saving sessions to {}", config.state_dir.display()),
    )?;
    almo_info!("Exiting");
    Ok(())
}

struct App {
    runner: EffectRunner,
    printed: RenderState,
}

impl App {
    fn dispatch(&mut self, state: AppState, msg: Msg) -> AppState {
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        if state.consume_dirty() {
            let lines = render(&state.view(), &mut self.printed);
            self.print(lines);
        }
        state
    }

    async fn handle_command(&mut self, state: AppState, command: Command) -> AppState {
        let at = Utc::now();
        match command {
            Command::Chat(text) => {
                let session_id = state.active_session();
                let state = self.dispatch(state, Msg::ChatSubmitted { session_id, text, at });
                if state.view().last_send == Some(SendOutcome::RejectedInFlight) {
                    self.print(vec![
                        "Still waiting for the previous reply; message not sent.".to_string(),
                    ]);
                }
                state
            }
            Command::Upload(paths) => {
                let mut files = Vec::with_capacity(paths.len());
                for path in paths {
                    files.push(file_ref(path).await);
                }
                self.dispatch(state, Msg::FilesSubmitted(files))
            }
            Command::Docs => {
                self.print(render_documents(&state.view()));
                state
            }
            Command::Dismiss(document_id) => {
                if state.document(&document_id).is_none() {
                    self.print(vec![format!("No document {document_id}.")]);
                }
                self.dispatch(state, Msg::DocumentDismissed(document_id))
            }
            Command::Discard => self.dispatch(state, Msg::DocumentsDiscarded),
            Command::NewSession => self.dispatch(state, Msg::NewSession { at }),
            Command::Sessions => {
                self.print(render_sessions(&state.view()));
                state
            }
            Command::Select(session_id) => {
                let known = state
                    .view()
                    .sessions
                    .iter()
                    .any(|session| session.id == session_id);
                if !known {
                    self.print(vec![format!("No session #{session_id}.")]);
                }
                self.dispatch(state, Msg::SessionSelected(session_id))
            }
            Command::Help => {
                self.print(HELP.lines().map(str::to_string).collect());
                state
            }
            Command::Invalid(reason) => {
                self.print(vec![reason]);
                state
            }
            Command::Quit => state,
        }
    }

    fn print(&self, lines: Vec<String>) {
        for line in lines {
            println!("{line}");
        }
    }
}

/// Describes a local file. Metadata errors leave the size at zero; the
/// upload itself then reports the read failure for that file.
async fn file_ref(path: PathBuf) -> FileRef {
    let size = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta.len(),
        Err(err) => {
            almo_warn!("Could not stat {:?}: {}", path, err);
            0
        }
    };
    FileRef::new(display_name(&path), size, path)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
