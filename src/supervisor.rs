use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::StreamalertError;

/// A fatal error reported by a routine. The first one reported tears the
/// whole process down.
#[derive(Debug)]
pub struct RoutineFailure {
    pub routine: String,
    pub error: StreamalertError,
}

impl RoutineFailure {
    pub fn new(routine: impl Into<String>, error: StreamalertError) -> Self {
        Self {
            routine: routine.into(),
            error,
        }
    }

    pub fn into_error(self) -> StreamalertError {
        StreamalertError::RoutineFailed {
            routine: self.routine,
            source: Box::new(self.error),
        }
    }
}

impl fmt::Display for RoutineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "routine '{}' failed: {}", self.routine, self.error)
    }
}

type RoutineEntry = Box<
    dyn FnOnce(
            CancellationToken,
            mpsc::Sender<RoutineFailure>,
        ) -> Pin<Box<dyn Future<Output = ()> + Send>>
        + Send,
>;

/// A named, cancellable background unit of work. Immutable once handed to
/// the supervisor.
///
/// The entry point receives the shared cancellation token and the shared
/// fatal-error channel. It must exit promptly once the token is cancelled,
/// and report at most one fatal error (with `try_send`, so a full channel
/// drops the report rather than blocking).
pub struct Routine {
    name: String,
    entry: RoutineEntry,
}

impl Routine {
    pub fn new<F, Fut>(name: impl Into<String>, entry: F) -> Self
    where
        F: FnOnce(CancellationToken, mpsc::Sender<RoutineFailure>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.into(),
            entry: Box::new(move |cancel, errors| Box::pin(entry(cancel, errors))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Starts a set of routines, waits for the first fatal error or an OS
/// termination signal, cancels everything, and drains.
///
/// Lifecycle: constructed once at process start, runs through
/// `start` + `wait_for_shutdown`, torn down exactly once at process exit.
pub struct Supervisor {
    cancel: CancellationToken,
    errors_tx: mpsc::Sender<RoutineFailure>,
    errors_rx: mpsc::Receiver<RoutineFailure>,
    tasks: JoinSet<()>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        // Capacity 1: the first failure wins, later reports are dropped.
        let (errors_tx, errors_rx) = mpsc::channel(1);
        Self {
            cancel: CancellationToken::new(),
            errors_tx,
            errors_rx,
            tasks: JoinSet::new(),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Launch every routine concurrently. Must run inside a tokio runtime.
    pub fn start(&mut self, routines: Vec<Routine>) {
        for routine in routines {
            tracing::info!(routine = %routine.name, "starting routine");
            let cancel = self.cancel.clone();
            let errors = self.errors_tx.clone();
            self.tasks.spawn((routine.entry)(cancel, errors));
        }
    }

    /// Block until an OS termination signal or the first fatal routine
    /// error; whichever comes first cancels every routine. Then wait for
    /// all of them to exit before returning.
    ///
    /// Only the error path returns `Err`, so the process exit status
    /// distinguishes abnormal termination. A second signal or a second
    /// error after cancellation has no further effect.
    pub async fn wait_for_shutdown(mut self) -> Result<(), RoutineFailure> {
        let result = tokio::select! {
            _ = shutdown_signal() => {
                tracing::info!("received termination signal, shutting down");
                Ok(())
            }
            failure = self.errors_rx.recv() => match failure {
                Some(failure) => {
                    tracing::error!(
                        routine = %failure.routine,
                        error = %failure.error,
                        "routine reported fatal error, shutting down"
                    );
                    Err(failure)
                }
                // All senders live in `self`, so recv cannot yield None here.
                None => Ok(()),
            },
        };

        self.cancel.cancel();
        while self.tasks.join_next().await.is_some() {}
        tracing::info!("all routines stopped");
        result
    }
}

/// One-shot notification for SIGINT/SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt =
            signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
