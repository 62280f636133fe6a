//! Lifecycle controller - Owns the VM snapshot and drives start/stop against the control API
//!
//! Network calls run on the tokio runtime; their results come back over a
//! channel and are applied on the UI thread by [`LifecycleController::poll`].
//! At most one call is outstanding at any time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::activity::{ActivityKind, ActivityLog};
use super::api::{ApiError, ControlApi, RemoteState, StatusResponse, ToggleResponse};
use super::router::{AccessHandoff, AccessRouter};
use super::vm::{VmAction, VmPhase, VmSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("VM status has not been loaded yet")]
    NotReady,
    #[error("cannot act while the VM is {phase}")]
    Busy { phase: VmPhase },
}

/// Something the view may want to react to after a completion was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    StatusResolved { phase: VmPhase },
    Started { handoff: Option<AccessHandoff> },
    Stopped,
    CommandFailed { action: VmAction, message: String },
}

/// Rollback point for the speculative in-flight step
#[derive(Debug, Clone)]
pub struct PendingCommand {
    pub action: VmAction,
    previous: VmSnapshot,
}

#[derive(Debug)]
enum Outcome {
    Status(Result<StatusResponse, ApiError>),
    Command {
        pending: PendingCommand,
        result: Result<ToggleResponse, ApiError>,
    },
}

#[derive(Debug)]
struct Completion {
    seq: u64,
    outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    StatusQuery,
    Command(VmAction),
}

#[derive(Debug, Clone, Copy)]
struct Outstanding {
    seq: u64,
    kind: OperationKind,
}

pub struct LifecycleController {
    snapshot: VmSnapshot,
    api: Arc<dyn ControlApi>,
    runtime: Handle,
    call_timeout: Duration,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    outstanding: Option<Outstanding>,
    next_seq: u64,
    activity: ActivityLog,
}

impl LifecycleController {
    /// Create a controller in the `Unknown` phase. Call [`Self::mount`] to load the status.
    pub fn new(api: Arc<dyn ControlApi>, runtime: Handle, call_timeout: Duration) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            snapshot: VmSnapshot::new(),
            api,
            runtime,
            call_timeout,
            completion_tx,
            completion_rx,
            outstanding: None,
            next_seq: 0,
            activity: ActivityLog::new(),
        }
    }

    /// Start the initial status query
    pub fn mount(&mut self) {
        if let Err(e) = self.refresh_status() {
            warn!("Initial status query skipped: {}", e);
        }
    }

    pub fn snapshot(&self) -> &VmSnapshot {
        &self.snapshot
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn activity_mut(&mut self) -> &mut ActivityLog {
        &mut self.activity
    }

    /// The operation currently awaiting a response, if any
    pub fn in_flight(&self) -> Option<OperationKind> {
        self.outstanding.map(|o| o.kind)
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Query the control API for the current power state
    pub fn refresh_status(&mut self) -> Result<(), ControllerError> {
        if self.outstanding.is_some() {
            let phase = self.snapshot.phase();
            warn!("Status refresh refused while VM is {}", phase);
            return Err(ControllerError::Busy { phase });
        }

        self.snapshot.mark_checking();
        let api = Arc::clone(&self.api);
        let deadline = self.call_timeout;
        self.dispatch(OperationKind::StatusQuery, move |seq| async move {
            let result = with_deadline(deadline, api.status()).await;
            Completion {
                seq,
                outcome: Outcome::Status(result),
            }
        });
        Ok(())
    }

    /// Issue `start` from `Stopped` or `stop` from `Running`.
    ///
    /// Refused while any operation is outstanding; nothing is queued.
    pub fn toggle(&mut self) -> Result<VmAction, ControllerError> {
        let phase = self.snapshot.phase();
        let action = match phase.next_action() {
            Some(action) if self.outstanding.is_none() => action,
            _ if phase == VmPhase::Unknown => return Err(self.reject(ControllerError::NotReady)),
            _ => return Err(self.reject(ControllerError::Busy { phase })),
        };

        let pending = PendingCommand {
            action,
            previous: self.snapshot.clone(),
        };
        self.snapshot.mark_in_flight(action);

        info!("Requesting VM {}", action);
        self.activity
            .record(ActivityKind::CommandIssued, format!("Requested VM {}", action));

        let api = Arc::clone(&self.api);
        let deadline = self.call_timeout;
        self.dispatch(OperationKind::Command(action), move |seq| async move {
            let result = with_deadline(deadline, api.toggle(action)).await;
            Completion {
                seq,
                outcome: Outcome::Command { pending, result },
            }
        });
        Ok(action)
    }

    /// Apply every completion that has arrived since the last call
    pub fn poll(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(event) = self.apply(completion) {
                events.push(event);
            }
        }
        events
    }

    /// Wait for the outstanding operation to complete and apply it
    #[cfg(test)]
    pub async fn settle(&mut self) -> Option<ControllerEvent> {
        while self.outstanding.is_some() {
            let completion = self.completion_rx.recv().await?;
            if let Some(event) = self.apply(completion) {
                return Some(event);
            }
        }
        None
    }

    fn reject(&mut self, error: ControllerError) -> ControllerError {
        warn!("Toggle rejected: {}", error);
        self.activity
            .record(ActivityKind::CommandRejected, error.to_string());
        error
    }

    fn dispatch<F, Fut>(&mut self, kind: OperationKind, call: F)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        self.next_seq += 1;
        let seq = self.next_seq;
        let tx = self.completion_tx.clone();
        let task = call(seq);

        self.runtime.spawn(async move {
            // The receiver is gone once the controller is dropped
            let _ = tx.send(task.await);
        });

        debug!("Dispatched {:?} (seq {})", kind, seq);
        self.outstanding = Some(Outstanding { seq, kind });
    }

    fn apply(&mut self, completion: Completion) -> Option<ControllerEvent> {
        match self.outstanding {
            Some(outstanding) if outstanding.seq == completion.seq => {
                self.outstanding = None;
            }
            _ => {
                debug!("Discarding stale completion (seq {})", completion.seq);
                return None;
            }
        }

        let event = match completion.outcome {
            Outcome::Status(result) => self.resolve_status(result),
            Outcome::Command { pending, result } => self.resolve_command(pending, result),
        };
        Some(event)
    }

    fn resolve_status(&mut self, result: Result<StatusResponse, ApiError>) -> ControllerEvent {
        match result {
            Ok(status) => {
                let running = status.status == RemoteState::Running;
                self.snapshot.mark_confirmed(running, status.url);
                info!("VM status: {}", self.snapshot.phase());
                self.activity.record(
                    ActivityKind::StatusChecked,
                    format!("VM reported {}", self.snapshot.phase()),
                );
            }
            Err(e) => {
                warn!("Status check failed, assuming VM is stopped: {}", e);
                self.snapshot.mark_unconfirmed();
                self.activity.record(
                    ActivityKind::StatusUnavailable,
                    format!("Could not confirm VM state ({}); showing Stopped", e),
                );
            }
        }

        ControllerEvent::StatusResolved {
            phase: self.snapshot.phase(),
        }
    }

    fn resolve_command(
        &mut self,
        pending: PendingCommand,
        result: Result<ToggleResponse, ApiError>,
    ) -> ControllerEvent {
        let action = pending.action;
        match result {
            Ok(response) => {
                info!("VM {} succeeded", action);
                self.activity.record(
                    ActivityKind::CommandSucceeded,
                    format!("VM {}", action.past_tense().to_lowercase()),
                );
                match action {
                    VmAction::Start => {
                        let handoff = response
                            .url
                            .as_deref()
                            .map(|url| AccessRouter::hand_off(Some(url)));
                        self.snapshot.mark_started(response.url);
                        ControllerEvent::Started { handoff }
                    }
                    VmAction::Stop => {
                        self.snapshot.mark_stopped();
                        ControllerEvent::Stopped
                    }
                }
            }
            Err(e) => {
                error!("VM {} failed: {}", action, e);
                let message = format!("Failed to {} VM. Please try again.", action);
                self.activity.record(
                    ActivityKind::CommandFailed,
                    format!("VM {} failed: {}", action, e),
                );
                self.snapshot.roll_back(pending.previous, message.clone());
                ControllerEvent::CommandFailed { action, message }
            }
        }
    }
}

async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .unwrap_or(Err(ApiError::Timeout(deadline)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    const SESSION_URL: &str = "https://vm.example/session";

    enum StatusReply {
        Running(Option<&'static str>),
        Stopped,
        Fail,
    }

    enum ToggleReply {
        Ok(Option<&'static str>),
        Fail,
        Gated(oneshot::Receiver<()>, Option<&'static str>),
        Hang,
    }

    #[derive(Default)]
    struct FakeApi {
        statuses: Mutex<VecDeque<StatusReply>>,
        toggles: Mutex<VecDeque<ToggleReply>>,
        status_calls: AtomicUsize,
        toggle_calls: AtomicUsize,
        actions: Mutex<Vec<VmAction>>,
    }

    impl FakeApi {
        fn with_status(reply: StatusReply) -> Arc<Self> {
            let api = Self::default();
            api.statuses.lock().unwrap().push_back(reply);
            Arc::new(api)
        }

        fn push_status(&self, reply: StatusReply) {
            self.statuses.lock().unwrap().push_back(reply);
        }

        fn push_toggle(&self, reply: ToggleReply) {
            self.toggles.lock().unwrap().push_back(reply);
        }

        fn toggle_calls(&self) -> usize {
            self.toggle_calls.load(Ordering::SeqCst)
        }

        fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    fn failure() -> ApiError {
        ApiError::Request {
            message: "connection refused".into(),
        }
    }

    #[async_trait]
    impl ControlApi for FakeApi {
        async fn status(&self) -> Result<StatusResponse, ApiError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(StatusReply::Stopped);
            match reply {
                StatusReply::Running(url) => Ok(StatusResponse {
                    status: RemoteState::Running,
                    url: url.map(str::to_owned),
                }),
                StatusReply::Stopped => Ok(StatusResponse {
                    status: RemoteState::Stopped,
                    url: None,
                }),
                StatusReply::Fail => Err(failure()),
            }
        }

        async fn toggle(&self, action: VmAction) -> Result<ToggleResponse, ApiError> {
            self.toggle_calls.fetch_add(1, Ordering::SeqCst);
            self.actions.lock().unwrap().push(action);
            let reply = self
                .toggles
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ToggleReply::Ok(None));
            let url = match reply {
                ToggleReply::Ok(url) => url,
                ToggleReply::Fail => return Err(failure()),
                ToggleReply::Gated(gate, url) => {
                    let _ = gate.await;
                    url
                }
                ToggleReply::Hang => std::future::pending().await,
            };
            Ok(ToggleResponse {
                url: url.map(str::to_owned),
            })
        }
    }

    fn controller(api: Arc<FakeApi>) -> LifecycleController {
        LifecycleController::new(api, Handle::current(), Duration::from_secs(5))
    }

    async fn mounted(api: Arc<FakeApi>) -> LifecycleController {
        let mut controller = controller(api);
        controller.mount();
        controller.settle().await;
        controller
    }

    #[tokio::test]
    async fn starts_unknown_then_checks_on_mount() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        let mut controller = controller(Arc::clone(&api));
        assert_eq!(controller.snapshot().phase(), VmPhase::Unknown);

        controller.mount();
        assert_eq!(controller.snapshot().phase(), VmPhase::Checking);
        assert_eq!(controller.in_flight(), Some(OperationKind::StatusQuery));

        let event = controller.settle().await;
        assert_eq!(
            event,
            Some(ControllerEvent::StatusResolved {
                phase: VmPhase::Stopped
            })
        );
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn refresh_reports_running_with_endpoint() {
        let api = FakeApi::with_status(StatusReply::Running(Some(SESSION_URL)));
        let controller = mounted(api).await;

        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
        assert_eq!(controller.snapshot().access_endpoint(), Some(SESSION_URL));
    }

    #[tokio::test]
    async fn refresh_running_without_url_has_no_endpoint() {
        let api = FakeApi::with_status(StatusReply::Running(None));
        let controller = mounted(api).await;

        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
        assert_eq!(controller.snapshot().access_endpoint(), None);
    }

    #[tokio::test]
    async fn refresh_failure_degrades_to_stopped_without_error() {
        let api = FakeApi::with_status(StatusReply::Fail);
        let controller = mounted(api).await;

        assert_eq!(controller.snapshot().phase(), VmPhase::Stopped);
        assert_eq!(controller.snapshot().access_endpoint(), None);
        assert_eq!(controller.snapshot().last_error(), None);
        assert_eq!(
            controller.activity().iter().next().map(|e| e.kind),
            Some(ActivityKind::StatusUnavailable)
        );
    }

    #[tokio::test]
    async fn refresh_always_lands_in_a_stable_phase() {
        for reply in [
            StatusReply::Running(Some(SESSION_URL)),
            StatusReply::Running(None),
            StatusReply::Stopped,
            StatusReply::Fail,
        ] {
            let controller = mounted(FakeApi::with_status(reply)).await;
            assert!(controller.snapshot().phase().is_quiescent());
        }
    }

    #[tokio::test]
    async fn repeated_refresh_against_same_state_is_idempotent() {
        let api = FakeApi::with_status(StatusReply::Running(Some(SESSION_URL)));
        api.push_status(StatusReply::Running(Some(SESSION_URL)));
        let mut controller = mounted(Arc::clone(&api)).await;
        let first = controller.snapshot().clone();

        controller.refresh_status().expect("refresh");
        controller.settle().await;

        assert_eq!(controller.snapshot(), &first);
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test]
    async fn start_success_stores_endpoint_and_hands_it_off() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        api.push_toggle(ToggleReply::Ok(Some(SESSION_URL)));
        let mut controller = mounted(Arc::clone(&api)).await;

        assert_eq!(controller.toggle(), Ok(VmAction::Start));
        assert_eq!(controller.snapshot().phase(), VmPhase::Starting);

        let event = controller.settle().await;
        assert_eq!(
            event,
            Some(ControllerEvent::Started {
                handoff: Some(AccessRouter::hand_off(Some(SESSION_URL)))
            })
        );
        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
        assert_eq!(controller.snapshot().access_endpoint(), Some(SESSION_URL));
        assert_eq!(api.actions.lock().unwrap().as_slice(), &[VmAction::Start]);
    }

    #[tokio::test]
    async fn start_success_without_url_skips_handoff() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        api.push_toggle(ToggleReply::Ok(None));
        let mut controller = mounted(api).await;

        controller.toggle().expect("toggle");
        let event = controller.settle().await;

        assert_eq!(event, Some(ControllerEvent::Started { handoff: None }));
        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
        assert_eq!(controller.snapshot().access_endpoint(), None);
    }

    #[tokio::test]
    async fn stop_success_clears_endpoint() {
        let api = FakeApi::with_status(StatusReply::Running(Some(SESSION_URL)));
        api.push_toggle(ToggleReply::Ok(Some("https://ignored.example")));
        let mut controller = mounted(Arc::clone(&api)).await;

        assert_eq!(controller.toggle(), Ok(VmAction::Stop));
        assert_eq!(controller.snapshot().phase(), VmPhase::Stopping);
        assert_eq!(controller.snapshot().access_endpoint(), None);

        assert_eq!(controller.settle().await, Some(ControllerEvent::Stopped));
        assert_eq!(controller.snapshot().phase(), VmPhase::Stopped);
        assert_eq!(controller.snapshot().access_endpoint(), None);
        assert_eq!(api.actions.lock().unwrap().as_slice(), &[VmAction::Stop]);
    }

    #[tokio::test]
    async fn start_failure_reverts_and_records_error() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        api.push_toggle(ToggleReply::Fail);
        let mut controller = mounted(api).await;

        controller.toggle().expect("toggle");
        let event = controller.settle().await;

        assert_eq!(
            event,
            Some(ControllerEvent::CommandFailed {
                action: VmAction::Start,
                message: "Failed to start VM. Please try again.".into(),
            })
        );
        assert_eq!(controller.snapshot().phase(), VmPhase::Stopped);
        assert_eq!(controller.snapshot().access_endpoint(), None);
        assert_eq!(
            controller.snapshot().last_error(),
            Some("Failed to start VM. Please try again.")
        );
    }

    #[tokio::test]
    async fn stop_failure_restores_running_with_endpoint() {
        let api = FakeApi::with_status(StatusReply::Running(Some(SESSION_URL)));
        api.push_toggle(ToggleReply::Fail);
        let mut controller = mounted(api).await;

        controller.toggle().expect("toggle");
        controller.settle().await;

        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
        assert_eq!(controller.snapshot().access_endpoint(), Some(SESSION_URL));
        assert!(controller.snapshot().last_error().is_some());
    }

    #[tokio::test]
    async fn next_success_clears_last_error() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        api.push_toggle(ToggleReply::Fail);
        api.push_toggle(ToggleReply::Ok(Some(SESSION_URL)));
        let mut controller = mounted(api).await;

        controller.toggle().expect("first toggle");
        controller.settle().await;
        assert!(controller.snapshot().last_error().is_some());

        controller.toggle().expect("second toggle");
        controller.settle().await;
        assert_eq!(controller.snapshot().last_error(), None);
        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
    }

    #[tokio::test]
    async fn toggles_while_in_flight_fire_no_extra_commands() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        let (release, gate) = oneshot::channel();
        api.push_toggle(ToggleReply::Gated(gate, Some(SESSION_URL)));
        let mut controller = mounted(Arc::clone(&api)).await;

        assert_eq!(controller.toggle(), Ok(VmAction::Start));
        for _ in 0..5 {
            assert_eq!(
                controller.toggle(),
                Err(ControllerError::Busy {
                    phase: VmPhase::Starting
                })
            );
        }
        assert!(controller.refresh_status().is_err());

        tokio::task::yield_now().await;
        release.send(()).expect("release gate");
        controller.settle().await;

        assert_eq!(api.toggle_calls(), 1);
        assert_eq!(api.status_calls(), 1);
        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
    }

    #[tokio::test]
    async fn toggle_before_first_load_is_not_ready() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        let mut controller = controller(Arc::clone(&api));

        assert_eq!(controller.toggle(), Err(ControllerError::NotReady));

        controller.mount();
        assert_eq!(
            controller.toggle(),
            Err(ControllerError::Busy {
                phase: VmPhase::Checking
            })
        );
        controller.settle().await;
        assert_eq!(api.toggle_calls(), 0);
    }

    #[tokio::test]
    async fn hung_command_times_out_and_reverts() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        api.push_toggle(ToggleReply::Hang);
        let mut controller =
            LifecycleController::new(api, Handle::current(), Duration::from_millis(50));
        controller.mount();
        controller.settle().await;

        controller.toggle().expect("toggle");
        let event = controller.settle().await;

        assert!(matches!(
            event,
            Some(ControllerEvent::CommandFailed {
                action: VmAction::Start,
                ..
            })
        ));
        assert_eq!(controller.snapshot().phase(), VmPhase::Stopped);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let api = FakeApi::with_status(StatusReply::Stopped);
        let mut controller = mounted(api).await;
        let before = controller.snapshot().clone();

        let stale = Completion {
            seq: 42,
            outcome: Outcome::Status(Ok(StatusResponse {
                status: RemoteState::Running,
                url: Some(SESSION_URL.into()),
            })),
        };

        assert_eq!(controller.apply(stale), None);
        assert_eq!(controller.snapshot(), &before);
    }

    #[tokio::test]
    async fn poll_applies_completions_without_blocking() {
        let api = FakeApi::with_status(StatusReply::Running(None));
        let mut controller = controller(api);
        controller.mount();

        while controller.is_busy() {
            tokio::task::yield_now().await;
            for event in controller.poll() {
                assert_eq!(
                    event,
                    ControllerEvent::StatusResolved {
                        phase: VmPhase::Running
                    }
                );
            }
        }
        assert_eq!(controller.snapshot().phase(), VmPhase::Running);
    }
}
