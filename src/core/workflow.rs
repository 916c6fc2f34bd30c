//! Connection-selection-sync workflow state machine
//!
//! Three live phases: Input (capture a connection string), Selecting (pick
//! collections from the fetched catalog), Syncing (sync run in flight). One
//! back edge (Selecting -> Input) and one recovery edge (Syncing ->
//! Selecting). One gateway call in flight per workflow instance; submit while
//! a call is outstanding is a logged no-op, confirm reports `Busy` because it
//! must yield a report.

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::core::{BackendGateway, GatewayError, Session, SyncReport};

/// Macro-state label, for display and gating by the driving layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Input,
    Selecting,
    Syncing,
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowPhase::Input => "input",
            WorkflowPhase::Selecting => "selecting",
            WorkflowPhase::Syncing => "syncing",
        };
        write!(f, "{}", s)
    }
}

/// Workflow state with per-phase payload. The catalog and selection only
/// exist while selecting or syncing, so a stale selection against a missing
/// catalog is unrepresentable.
#[derive(Debug, Clone)]
enum WorkflowState {
    Input {
        connection_string: String,
    },
    Selecting {
        connection_string: String,
        catalog: Vec<String>,
        selection: BTreeSet<String>,
    },
    Syncing {
        connection_string: String,
        catalog: Vec<String>,
        selection: BTreeSet<String>,
    },
}

/// Errors reported to the caller. Gateway failures are recoverable: the
/// machine is already back in a stable phase when the error is returned.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Connection string was empty or whitespace-only
    #[error("Connection string must not be empty")]
    EmptyConnectionString,

    /// Confirm requested with nothing selected
    #[error("Select at least one collection before syncing")]
    EmptySelection,

    /// Toggle of a name that is not in the current catalog
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Confirm requested before a catalog was fetched
    #[error("No collection catalog loaded; submit a connection first")]
    NoCatalog,

    /// A gateway call is already in flight for this workflow
    #[error("Another operation is already in flight")]
    Busy,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The per-session sync job. Exclusively owns its state; the session is
/// read-only.
pub struct SyncWorkflow {
    gateway: Arc<dyn BackendGateway>,
    session: Session,
    state: WorkflowState,
    last_error: Option<String>,
    busy: bool,
}

impl SyncWorkflow {
    pub fn new(gateway: Arc<dyn BackendGateway>, session: Session) -> Self {
        Self {
            gateway,
            session,
            state: WorkflowState::Input {
                connection_string: String::new(),
            },
            last_error: None,
            busy: false,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        match self.state {
            WorkflowState::Input { .. } => WorkflowPhase::Input,
            WorkflowState::Selecting { .. } => WorkflowPhase::Selecting,
            WorkflowState::Syncing { .. } => WorkflowPhase::Syncing,
        }
    }

    /// Loading flag for the driving layer: disable triggers while set.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Error from the last failed transition, cleared on the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The typed connection string, in any phase.
    pub fn connection_string(&self) -> &str {
        match &self.state {
            WorkflowState::Input { connection_string }
            | WorkflowState::Selecting {
                connection_string, ..
            }
            | WorkflowState::Syncing {
                connection_string, ..
            } => connection_string,
        }
    }

    /// Fetched catalog; empty outside Selecting/Syncing.
    pub fn catalog(&self) -> &[String] {
        match &self.state {
            WorkflowState::Input { .. } => &[],
            WorkflowState::Selecting { catalog, .. } | WorkflowState::Syncing { catalog, .. } => {
                catalog
            }
        }
    }

    /// Current selection; empty outside Selecting/Syncing.
    pub fn selection(&self) -> BTreeSet<String> {
        match &self.state {
            WorkflowState::Input { .. } => BTreeSet::new(),
            WorkflowState::Selecting { selection, .. }
            | WorkflowState::Syncing { selection, .. } => selection.clone(),
        }
    }

    /// Edit the draft connection string. Only meaningful in Input.
    pub fn set_connection_string(&mut self, value: impl Into<String>) {
        if let WorkflowState::Input { connection_string } = &mut self.state {
            *connection_string = value.into();
        } else {
            tracing::debug!(phase = %self.phase(), "Ignoring connection edit outside input phase");
        }
    }

    /// Submit the connection string and fetch the collection catalog.
    ///
    /// Validation failures make no gateway call. On gateway failure the
    /// machine stays in Input with the typed string retained and the error
    /// recorded for display.
    pub async fn submit_connection(&mut self) -> Result<(), WorkflowError> {
        if self.busy {
            tracing::debug!("Submit ignored: call already in flight");
            return Ok(());
        }
        let connection_string = match &self.state {
            WorkflowState::Input { connection_string } => connection_string.clone(),
            _ => {
                tracing::debug!(phase = %self.phase(), "Submit ignored outside input phase");
                return Ok(());
            }
        };

        if connection_string.trim().is_empty() {
            return Err(WorkflowError::EmptyConnectionString);
        }

        self.busy = true;
        let result = self
            .gateway
            .fetch_collections(&self.session, &connection_string)
            .await;
        self.busy = false;

        match result {
            Ok(catalog) => {
                tracing::info!(collections = catalog.len(), "Collection catalog fetched");
                self.last_error = None;
                // Fresh catalog, fresh selection: never retain a selection
                // against a replaced catalog.
                self.state = WorkflowState::Selecting {
                    connection_string,
                    catalog,
                    selection: BTreeSet::new(),
                };
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Collection fetch failed");
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Toggle a collection in or out of the selection. Idempotent pairwise:
    /// toggling twice restores the prior selection.
    pub fn toggle_collection(&mut self, name: &str) -> Result<(), WorkflowError> {
        let WorkflowState::Selecting {
            catalog, selection, ..
        } = &mut self.state
        else {
            tracing::debug!(phase = %self.phase(), "Toggle ignored outside selecting phase");
            return Ok(());
        };

        if !catalog.iter().any(|c| c == name) {
            return Err(WorkflowError::UnknownCollection(name.to_string()));
        }

        if !selection.remove(name) {
            selection.insert(name.to_string());
        }
        Ok(())
    }

    /// Confirm the selection and run the sync.
    ///
    /// On success the workflow resets to Input and the report is returned.
    /// On failure it restores Selecting with the selection intact and the
    /// error recorded.
    pub async fn confirm_sync(&mut self) -> Result<SyncReport, WorkflowError> {
        if self.busy {
            tracing::debug!("Confirm ignored: call already in flight");
            return Err(WorkflowError::Busy);
        }
        let (connection_string, catalog, selection) = match &self.state {
            WorkflowState::Selecting {
                connection_string,
                catalog,
                selection,
            } => (connection_string.clone(), catalog.clone(), selection.clone()),
            _ => {
                tracing::debug!(phase = %self.phase(), "Confirm rejected outside selecting phase");
                return Err(WorkflowError::NoCatalog);
            }
        };

        if selection.is_empty() {
            return Err(WorkflowError::EmptySelection);
        }

        self.state = WorkflowState::Syncing {
            connection_string: connection_string.clone(),
            catalog: catalog.clone(),
            selection: selection.clone(),
        };
        self.busy = true;
        let result = self
            .gateway
            .run_sync(&self.session, &connection_string, &selection)
            .await;
        self.busy = false;

        match result {
            Ok(report) => {
                tracing::info!(chunks = report.chunks, "Sync completed");
                self.last_error = None;
                self.state = WorkflowState::Input {
                    connection_string: String::new(),
                };
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sync failed, selection preserved");
                self.last_error = Some(e.to_string());
                self.state = WorkflowState::Selecting {
                    connection_string,
                    catalog,
                    selection,
                };
                Err(e.into())
            }
        }
    }

    /// Back edge: discard the catalog and selection, keep the typed string.
    pub fn back(&mut self) {
        if let WorkflowState::Selecting {
            connection_string, ..
        } = &self.state
        {
            self.state = WorkflowState::Input {
                connection_string: connection_string.clone(),
            };
        }
    }

    /// Manual restart: discard everything.
    pub fn reset(&mut self) {
        self.state = WorkflowState::Input {
            connection_string: String::new(),
        };
        self.last_error = None;
        self.busy = false;
    }
}
