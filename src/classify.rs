//! Failure classification for the pipeline's inbound failure hook.
//!
//! [`classify`] is pure: it looks only at what went wrong and whether the request was already
//! replayed after a refresh. Deciding whether to surface the failure is left to the caller,
//! which consults the configured silent allow-list.

// self
use crate::{_prelude::*, transport::TransportError};

/// Status code that marks an expired or missing session.
pub const UNAUTHORIZED: u16 = 401;

/// What went wrong with a single transport call.
#[derive(Clone, Copy, Debug)]
pub enum Failure<'a> {
	/// No response arrived.
	Transport(&'a TransportError),
	/// The backend answered with a status of 400 or above.
	Status(u16),
}

/// Network failure flavor, used to pick the user-facing wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkKind {
	/// The call exceeded its timeout.
	Timeout,
	/// The connection failed for any other reason.
	Connection,
}

/// Classification assigned to a failed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
	/// No response at all.
	Network(NetworkKind),
	/// First 401 for this request; the refresh protocol takes over.
	AuthExpired,
	/// Any other failure status, including a 401 after a replay.
	Application(u16),
}
impl Classification {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Network(NetworkKind::Timeout) => "timeout",
			Self::Network(NetworkKind::Connection) => "connection",
			Self::AuthExpired => "auth_expired",
			Self::Application(_) => "application",
		}
	}
}
impl Display for Classification {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Labels a failure. `retried` is the request's replay stamp.
pub fn classify(failure: Failure<'_>, retried: bool) -> Classification {
	match failure {
		Failure::Transport(e) if e.is_timeout() => Classification::Network(NetworkKind::Timeout),
		Failure::Transport(_) => Classification::Network(NetworkKind::Connection),
		Failure::Status(UNAUTHORIZED) if !retried => Classification::AuthExpired,
		Failure::Status(status) => Classification::Application(status),
	}
}

/// Wording shown for network failures.
pub fn network_message(kind: NetworkKind) -> &'static str {
	match kind {
		NetworkKind::Timeout => "The server is taking too long to respond. Please try again.",
		NetworkKind::Connection => "Cannot reach the server. Check your network connection.",
	}
}

/// Wording shown for application failures without a server-supplied message.
pub fn status_message(status: u16) -> &'static str {
	match status {
		400 => "The request was invalid.",
		401 => "Please log in to continue.",
		403 => "You do not have permission to do that.",
		404 => "The requested information could not be found.",
		409 => "That information already exists.",
		500 => "A server error occurred. Please try again shortly.",
		_ => "Something went wrong.",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_failures_are_network_errors() {
		let timeout = TransportError::Timeout;
		let refused = TransportError::network(std::fmt::Error);

		assert_eq!(
			classify(Failure::Transport(&timeout), false),
			Classification::Network(NetworkKind::Timeout)
		);
		assert_eq!(
			classify(Failure::Transport(&refused), true),
			Classification::Network(NetworkKind::Connection)
		);
	}

	#[test]
	fn first_unauthorized_is_auth_expired() {
		assert_eq!(classify(Failure::Status(401), false), Classification::AuthExpired);
	}

	#[test]
	fn replayed_unauthorized_is_terminal() {
		assert_eq!(classify(Failure::Status(401), true), Classification::Application(401));
	}

	#[test]
	fn other_statuses_are_application_errors() {
		for status in [400, 403, 404, 409, 500, 503] {
			assert_eq!(classify(Failure::Status(status), false), Classification::Application(status));
		}
	}

	#[test]
	fn messages_cover_known_statuses() {
		assert_eq!(status_message(404), "The requested information could not be found.");
		assert_eq!(status_message(418), "Something went wrong.");
		assert_ne!(network_message(NetworkKind::Timeout), network_message(NetworkKind::Connection));
	}
}
