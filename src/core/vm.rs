//! VM model - Lifecycle phase, power actions, and the observed snapshot

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the VM as observed by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmPhase {
    /// Nothing has been loaded yet
    #[default]
    Unknown,
    /// Initial status query is outstanding
    Checking,
    /// VM is powered off
    Stopped,
    /// Start command is outstanding
    Starting,
    /// VM is powered on
    Running,
    /// Stop command is outstanding
    Stopping,
}

impl VmPhase {
    /// Stable phases from which a command may be issued
    pub fn is_quiescent(&self) -> bool {
        matches!(self, Self::Stopped | Self::Running)
    }

    /// Phases that represent an outstanding network operation
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Checking | Self::Starting | Self::Stopping)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    /// The command a toggle would issue from this phase
    pub fn next_action(&self) -> Option<VmAction> {
        match self {
            Self::Stopped => Some(VmAction::Start),
            Self::Running => Some(VmAction::Stop),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Checking => "Checking",
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        }
    }
}

impl std::fmt::Display for VmPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Power command accepted by the control API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmAction {
    Start,
    Stop,
}

impl VmAction {
    /// Phase held while this command is outstanding
    pub fn in_flight_phase(&self) -> VmPhase {
        match self {
            Self::Start => VmPhase::Starting,
            Self::Stop => VmPhase::Stopping,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Stop => "Stopped",
        }
    }
}

impl std::fmt::Display for VmAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// Read-only view of the VM state rendered by the dashboard.
///
/// Only the lifecycle controller can mutate a snapshot; every mutator keeps
/// the access endpoint tied to the `Running` phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmSnapshot {
    phase: VmPhase,
    access_endpoint: Option<String>,
    last_error: Option<String>,
}

impl VmSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> VmPhase {
        self.phase
    }

    pub fn access_endpoint(&self) -> Option<&str> {
        self.access_endpoint.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Mark the status query as outstanding
    pub(super) fn mark_checking(&mut self) {
        self.phase = VmPhase::Checking;
        self.access_endpoint = None;
    }

    /// Apply a confirmed remote state
    pub(super) fn mark_confirmed(&mut self, running: bool, endpoint: Option<String>) {
        if running {
            self.phase = VmPhase::Running;
            self.access_endpoint = endpoint;
        } else {
            self.phase = VmPhase::Stopped;
            self.access_endpoint = None;
        }
        self.last_error = None;
    }

    /// Fall back to the safe default when the remote state cannot be confirmed
    pub(super) fn mark_unconfirmed(&mut self) {
        self.phase = VmPhase::Stopped;
        self.access_endpoint = None;
    }

    /// Speculative step taken before a command's response arrives
    pub(super) fn mark_in_flight(&mut self, action: VmAction) {
        self.phase = action.in_flight_phase();
        self.access_endpoint = None;
    }

    /// Mark the VM as running after a successful start
    pub(super) fn mark_started(&mut self, endpoint: Option<String>) {
        self.phase = VmPhase::Running;
        self.access_endpoint = endpoint;
        self.last_error = None;
    }

    /// Mark the VM as stopped after a successful stop
    pub(super) fn mark_stopped(&mut self) {
        self.phase = VmPhase::Stopped;
        self.access_endpoint = None;
        self.last_error = None;
    }

    /// Undo a speculative step, restoring the pre-command state
    pub(super) fn roll_back(&mut self, previous: VmSnapshot, error: String) {
        *self = previous;
        self.last_error = Some(error);
    }
}
