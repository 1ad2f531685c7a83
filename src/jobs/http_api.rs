use axum::Router;
use tokio::net::TcpListener;

use crate::error::StreamalertError;
use crate::supervisor::{Routine, RoutineFailure};

pub const HTTP_API_ROUTINE: &str = "http-api";

/// Run the user-facing HTTP API as a supervised routine.
///
/// The listener is bound by the caller so bind errors fail the boot sequence
/// instead of surfacing asynchronously. A server error is fatal; shutdown via
/// the shared token is graceful and not an error.
pub fn http_api_routine(listener: TcpListener, app: Router) -> Routine {
    Routine::new(HTTP_API_ROUTINE, move |cancel, errors| async move {
        let shutdown = cancel.cancelled_owned();
        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            let _ = errors.try_send(RoutineFailure::new(
                HTTP_API_ROUTINE,
                StreamalertError::IoError(err),
            ));
        } else {
            tracing::info!("http api stopped");
        }
    })
}
