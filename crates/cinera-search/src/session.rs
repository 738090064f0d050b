//! Cooperative search session.
//!
//! A [`Session`] is the single place where search passes start and render
//! turns run. UI input reaches it through a [`SessionHandle`]: the handle
//! writes the shared view state (or a project's visibility) and then nudges
//! the session, which reads everything back as a snapshot at the start of the
//! next pass. Index loads report in over a channel; each completion triggers
//! a full refresh pass so cross-project ordering stays correct.
//!
//! Only one render pass exists at a time. Starting a pass drops the previous
//! one and resets the sink before anything new is emitted.

use crate::error::{Result, SearchError};
use crate::executor::execute;
use crate::query::Query;
use crate::render::{DisplayState, RenderPass, RenderSink, Turn, DEFAULT_RENDER_BUDGET};
use cinera_core::{Corpus, LoadEvent, Loader, ProjectKey, SortOrder};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// UI-owned inputs, read by the session at the start of each pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Current query text
    pub query: String,
    /// Episode ordering
    pub order: SortOrder,
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Render units per turn
    pub render_budget: usize,
    /// Initial ordering
    pub order: SortOrder,
    /// Query to start with, e.g. restored from a link
    pub initial_query: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            render_budget: DEFAULT_RENDER_BUDGET,
            order: SortOrder::default(),
            initial_query: None,
        }
    }
}

/// What a call to [`Session::run_search`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStart {
    /// Same query and no refresh requested; the current pass continues
    Unchanged,
    /// No active query; the full index is shown
    FullIndex,
    /// A new pass started with this many render units
    Started { units: usize },
}

#[derive(Debug)]
enum Command {
    /// Query text may have changed
    Input,
    /// Ordering or visibility changed; search again regardless
    Refresh,
    Shutdown,
}

/// UI-side handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    view: Arc<RwLock<ViewState>>,
    corpus: Arc<Corpus>,
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| SearchError::SessionClosed)
    }

    /// Replace the query text. Safe to call on every keystroke.
    pub fn set_query(&self, query: impl Into<String>) -> Result<()> {
        self.view.write().query = query.into();
        self.send(Command::Input)
    }

    /// Set the episode ordering.
    pub fn set_order(&self, order: SortOrder) -> Result<()> {
        self.view.write().order = order;
        self.send(Command::Refresh)
    }

    /// Flip the episode ordering. Returns the new ordering.
    pub fn toggle_order(&self) -> Result<SortOrder> {
        let order = {
            let mut view = self.view.write();
            view.order = view.order.toggled();
            view.order
        };
        self.send(Command::Refresh)?;
        Ok(order)
    }

    /// Show or hide every project with this identity.
    pub fn set_filtered_out(&self, key: &ProjectKey, filtered_out: bool) -> Result<usize> {
        let matched = self.corpus.set_filtered_out(key, filtered_out);
        self.send(Command::Refresh)?;
        Ok(matched)
    }

    /// Show or hide a project by id.
    pub fn set_filtered_out_by_id(&self, id: &str, filtered_out: bool) -> Result<()> {
        self.corpus.set_filtered_out_by_id(id, filtered_out)?;
        self.send(Command::Refresh)
    }

    /// Current view state
    pub fn view(&self) -> ViewState {
        self.view.read().clone()
    }

    /// Stop the session at its next scheduling point.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }
}

/// Drives search passes and render turns for one display.
pub struct Session<S: RenderSink> {
    corpus: Arc<Corpus>,
    view: Arc<RwLock<ViewState>>,
    sink: S,
    budget: usize,
    commands: mpsc::UnboundedReceiver<Command>,
    commands_open: bool,
    loads_tx: mpsc::UnboundedSender<LoadEvent>,
    loads: mpsc::UnboundedReceiver<LoadEvent>,
    outstanding_loads: usize,
    last_query: Option<String>,
    pass: Option<RenderPass>,
    passes: u64,
}

impl<S: RenderSink> Session<S> {
    /// Create a session and the handle the UI uses to drive it.
    pub fn new(corpus: Arc<Corpus>, sink: S, options: SessionOptions) -> (Self, SessionHandle) {
        let view = Arc::new(RwLock::new(ViewState {
            query: options.initial_query.unwrap_or_default(),
            order: options.order,
        }));
        let (tx, commands) = mpsc::unbounded_channel();
        let (loads_tx, loads) = mpsc::unbounded_channel();

        let handle = SessionHandle {
            view: view.clone(),
            corpus: corpus.clone(),
            tx,
        };

        let session = Self {
            corpus,
            view,
            sink,
            budget: options.render_budget.max(1),
            commands,
            commands_open: true,
            loads_tx,
            loads,
            outstanding_loads: 0,
            last_query: None,
            pass: None,
            passes: 0,
        };

        (session, handle)
    }

    /// Start fetching every unloaded project. Must be called from within a
    /// tokio runtime.
    pub fn load_all(&mut self, loader: &Loader) -> usize {
        let started = loader.spawn_all(&self.corpus, self.loads_tx.clone());
        self.outstanding_loads += started;
        self.sink.loading(self.corpus.pending());
        started
    }

    /// The sink, for inspection between turns
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Whether a render pass still has units to emit
    pub fn is_rendering(&self) -> bool {
        self.pass.is_some()
    }

    /// Number of passes started so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Start a new search pass if the query changed or `refresh` is set.
    ///
    /// A new pass discards the old one and resets the sink before the first
    /// unit of the new pass can be emitted.
    pub fn run_search(&mut self, refresh: bool) -> PassStart {
        let view = self.view.read().clone();

        if !refresh && self.last_query.as_deref() == Some(view.query.as_str()) {
            return PassStart::Unchanged;
        }

        if let Some(old) = self.pass.take() {
            debug!(
                emitted = old.emitted(),
                turns = old.turns(),
                "Superseding render pass"
            );
        }
        self.sink.reset();
        self.passes += 1;

        let Some(query) = Query::compile(&view.query) else {
            self.last_query = Some(view.query);
            self.sink.display(&DisplayState::FullIndex);
            debug!(pass = self.passes, "No active query");
            return PassStart::FullIndex;
        };
        self.last_query = Some(view.query);

        let outcome = execute(&self.corpus.snapshot(), &query, view.order);
        let units = outcome.render_units();

        self.sink
            .display(&DisplayState::Results(outcome.totals.summary()));

        info!(
            pass = self.passes,
            query = %query.raw(),
            groups = outcome.groups.len(),
            units,
            "Search pass started"
        );

        let pass = RenderPass::new(outcome.groups, self.budget);
        self.pass = (!pass.is_finished()).then_some(pass);

        PassStart::Started { units }
    }

    /// Run one render turn of the active pass, if any.
    pub fn render_turn(&mut self) -> Turn {
        let Some(pass) = self.pass.as_mut() else {
            return Turn::Finished;
        };

        let turn = pass.turn(&mut self.sink);
        if turn == Turn::Finished {
            self.pass = None;
        }
        turn
    }

    /// Record a finished load and search again from scratch.
    pub fn apply_load(&mut self, event: LoadEvent) -> Result<PassStart> {
        self.outstanding_loads = self.outstanding_loads.saturating_sub(1);
        self.corpus.apply(event)?;
        self.sink.loading(self.corpus.pending());
        Ok(self.run_search(true))
    }

    /// Run until shut down, or until every handle is dropped, every load has
    /// reported and the last pass has rendered. Returns the sink.
    pub async fn run(mut self) -> S {
        self.run_search(false);

        loop {
            let rendering = self.pass.is_some();
            let loading = self.outstanding_loads > 0;

            tokio::select! {
                biased;

                command = self.commands.recv(), if self.commands_open => match command {
                    Some(Command::Input) => {
                        self.run_search(false);
                    }
                    Some(Command::Refresh) => {
                        self.run_search(true);
                    }
                    Some(Command::Shutdown) => {
                        debug!("Session shutdown requested");
                        break;
                    }
                    None => {
                        self.commands_open = false;
                    }
                },

                Some(event) = self.loads.recv(), if loading => {
                    if let Err(e) = self.apply_load(event) {
                        tracing::warn!(error = %e, "Discarding load result");
                    }
                }

                _ = tokio::task::yield_now(), if rendering => {
                    self.render_turn();
                }

                else => break,
            }
        }

        debug!(passes = self.passes, "Session finished");
        self.sink
    }
}
