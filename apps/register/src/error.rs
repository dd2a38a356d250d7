//! Error types for the register.

use tally_core::session::SessionError;
use tally_core::{CoreError, GatewayError};
use thiserror::Error;

/// Register errors. None of these end the program; the terminal prints
/// them and keeps the cart as it was.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A typed command could not be understood.
    #[error("{0}")]
    InvalidCommand(String),

    #[error("Not logged in. Use: login <email> <password>")]
    NotLoggedIn,

    #[error("No store selected. Use: stores, then use <store-id>")]
    NoStoreSelected,

    /// Submission failed; the cart is unchanged and can be paid again.
    #[error("{notice} ({source})")]
    PaymentFailed {
        notice: String,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type RegisterResult<T> = Result<T, RegisterError>;
