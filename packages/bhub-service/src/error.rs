pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced to callers. Text-index failures are absorbed by the gateway and never appear
/// here; only an expired index deadline does.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Timed out waiting for {operation}.")]
	Timeout { operation: &'static str },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}
}

impl From<bhub_storage::Error> for Error {
	fn from(err: bhub_storage::Error) -> Self {
		match err {
			bhub_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			bhub_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}
