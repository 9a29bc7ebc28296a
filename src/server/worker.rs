//! Per-connection worker.
//!
//! # Responsibilities
//! - Read exactly one request from the connection
//! - Answer refused connections with `TooManyClients` without touching the store
//! - Dispatch admitted requests to the auth service and map the outcome to a tag
//! - Write exactly one response, then free the admission slot and close
//!
//! # Design Decisions
//! - Transport and decode failures get no response; the connection is dropped
//! - The slot is held for a configurable pause after responding before release
//! - Slot and socket are owned values, so every exit path releases both

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::auth::{AuthError, AuthResult, AuthService};
use crate::net::{Admission, WorkerState};
use crate::observability::metrics;
use crate::protocol::{FrameError, FramedStream, Request, Response};
use crate::store::{User, UserStore};

/// Everything a worker needs besides its connection.
pub struct WorkerContext<S: UserStore> {
    pub auth: AuthService<S>,
    /// Pause between responding and releasing the admission slot.
    pub slot_release_delay: Duration,
}

fn advance(state: &mut WorkerState, next: WorkerState) {
    tracing::trace!(from = %state, to = %next, "Worker state");
    *state = next;
}

/// Serve one connection end to end.
///
/// Returns the response that was sent, or the transport/decode error that
/// ended the connection early.
pub async fn handle_connection<S, T>(
    stream: T,
    admission: Admission,
    context: &WorkerContext<S>,
) -> Result<Response, FrameError>
where
    S: UserStore,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = WorkerState::Start;
    let mut channel = FramedStream::new(stream);

    let request: Request = match channel.recv().await {
        Ok(request) => request,
        Err(e) => {
            if e.is_decode() {
                tracing::warn!(error = %e, "Undecodable request, closing without response");
            } else {
                tracing::warn!(error = %e, "Failed to read request");
            }
            return Err(e);
        }
    };
    advance(&mut state, WorkerState::Decoded);
    tracing::debug!(
        kind = request.kind(),
        login = %request.user().login,
        "Request decoded"
    );

    let response = match &admission {
        Admission::Refused => {
            tracing::info!("Too many clients, refusing request");
            Response::TooManyClients
        }
        Admission::Admitted(_) => dispatch(&context.auth, &request).await,
    };
    advance(&mut state, WorkerState::Processed);

    let sent = channel.send(&response).await;
    match &sent {
        Ok(()) => {
            advance(&mut state, WorkerState::Responded);
            metrics::record_response(response.tag());
            tracing::info!(tag = response.tag(), "Response sent");
            if let Err(e) = channel.shutdown().await {
                tracing::debug!(error = %e, "Error shutting down connection");
            }
        }
        Err(e) => tracing::error!(error = %e, tag = response.tag(), "Failed to send response"),
    }

    if let Admission::Admitted(slot) = admission {
        if sent.is_ok() {
            slot.release_after(context.slot_release_delay).await;
        } else {
            slot.release();
        }
    }

    drop(channel);
    advance(&mut state, WorkerState::Closed);

    sent.map(|()| response)
}

async fn dispatch<S: UserStore>(auth: &AuthService<S>, request: &Request) -> Response {
    let outcome = match request {
        Request::SignIn(user) => auth.sign_in(user).await,
        Request::SignUp(user) => auth.sign_up(user).await,
    };
    if let Err(AuthError::StoreUnavailable(e)) = &outcome {
        tracing::error!(error = %e, kind = request.kind(), "Store failure");
    }
    response_for(outcome)
}

/// Map an auth outcome to its response tag.
pub fn response_for(outcome: AuthResult<User>) -> Response {
    match outcome {
        Ok(user) => Response::Ok(user),
        Err(AuthError::IncorrectUser) => Response::IncorrectUser,
        Err(AuthError::IncorrectPassword) => Response::IncorrectPassword,
        Err(AuthError::IncorrectEmail) => Response::IncorrectEmail,
        Err(AuthError::UserNotFound) => Response::UserNotFound,
        Err(AuthError::PasswordMismatch) => Response::PasswordMismatch,
        Err(AuthError::UserExists) => Response::UserExists,
        Err(AuthError::EmailExists) => Response::EmailExists,
        Err(AuthError::StoreUnavailable(_)) => Response::StoreUnavailable,
    }
}
