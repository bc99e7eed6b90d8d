//! Error sanitization for client-facing messages.
//!
//! Prevents leaking internal details (collaborator URLs, registry state) to clients.

use metaverse_shared::{ErrorCode, ServerMessage};

use crate::use_cases::coordinator::CoordinatorError;

/// Sanitize an error for client consumption.
///
/// Logs the full error server-side, returns generic message for client.
pub fn sanitize_error<E: std::fmt::Display>(error: &E, context: &str) -> String {
    tracing::error!(
        error = %error,
        context = context,
        "Internal error occurred"
    );

    format!("An error occurred while {}", context)
}

/// The frame sent back to the client for a failed message.
///
/// Client-caused errors keep their detail; internal ones are sanitized.
pub fn error_reply(error: &CoordinatorError, context: &str) -> ServerMessage {
    match error {
        CoordinatorError::Validation { reason, position } => ServerMessage::MovementRejected {
            reason: *reason,
            x: position.x,
            y: position.y,
        },
        CoordinatorError::Internal(_) => {
            ServerMessage::error(ErrorCode::InternalError, sanitize_error(error, context))
        }
        other => ServerMessage::error(
            other.code().unwrap_or(ErrorCode::InternalError),
            other.to_string(),
        ),
    }
}

/// Common error messages for client consumption.
pub mod messages {
    pub const INVALID_MESSAGE: &str = "Invalid message format";
    pub const BINARY_UNSUPPORTED: &str = "Binary frames are not supported";
}
