//! Dashboard runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the Elm runtime boundary: all side effects happen here. The
//! reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Spawned tasks send their `UiEvent` results to `inbox_tx`; the loop drains
//! `inbox_rx` every iteration, so state is only mutated on the UI thread.

mod handlers;

use std::future::Future;
use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use claimdesk_core::session::SessionStore;
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::common::{TaskCompleted, TaskId, TaskKind, TaskStarted};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Redraw cadence while a task is running (spinner animation).
pub const BUSY_TICK: Duration = Duration::from_millis(80);

/// Redraw cadence when idle.
pub const IDLE_TICK: Duration = Duration::from_millis(250);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

pub struct DashboardRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    store: SessionStore,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: Instant,
}

impl DashboardRuntime {
    /// Enters the alternate screen. Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(store: SessionStore) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;
        let state = AppState::new(store.settings().base_url.clone());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state,
            store,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs until the user quits.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal input fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        let result = self.event_loop();
        let _ = terminal::disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let effects = update::bootstrap(&mut self.state);
        self.execute_effects(effects);

        let mut dirty = true;
        while !self.state.should_quit {
            if dirty {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }

            let events = self.collect_events()?;
            for event in events {
                dirty = true;
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let tick_interval = if self.state.tasks.is_any_running() {
            BUSY_TICK
        } else {
            IDLE_TICK
        };
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        self.execute_effects(effects);
    }

    /// Spawns an async task with a uniform `TaskStarted`/`TaskCompleted` lifecycle.
    fn spawn_task<Fut>(&self, kind: TaskKind, id: TaskId, fut: Fut)
    where
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let _ = tx.send(UiEvent::TaskStarted {
            kind,
            started: TaskStarted { id },
        });
        tokio::spawn(async move {
            let result = fut.await;
            let completed = TaskCompleted {
                id,
                result: Box::new(result),
            };
            let _ = tx.send(UiEvent::TaskCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::RestoreSession { task } => {
                let store = self.store.clone();
                self.spawn_task(
                    TaskKind::SessionRestore,
                    task,
                    handlers::restore_session(store),
                );
            }
            UiEffect::SubmitAuth { task, request } => {
                let store = self.store.clone();
                self.spawn_task(
                    TaskKind::AuthSubmit,
                    task,
                    handlers::submit_auth(store, request),
                );
            }
            UiEffect::StartSession { response } => {
                let event = handlers::start_session(&self.store, response);
                self.dispatch_event(event);
            }
            UiEffect::Logout => handlers::logout(&self.store),
            UiEffect::LoadDocument { task, role, path } => {
                self.spawn_task(
                    TaskKind::load_document(role),
                    task,
                    handlers::load_document(role, path),
                );
            }
            UiEffect::Analyze { task, upload } => {
                let Some(session) = self.state.session.clone() else {
                    return;
                };
                let store = self.store.clone();
                self.spawn_task(
                    TaskKind::Analyze,
                    task,
                    handlers::analyze(store, session, upload),
                );
            }
            UiEffect::FetchHistory { task } => {
                let Some(session) = self.state.session.clone() else {
                    return;
                };
                let store = self.store.clone();
                self.spawn_task(
                    TaskKind::History,
                    task,
                    handlers::fetch_history(store, session),
                );
            }
        }
    }
}

impl Drop for DashboardRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}
