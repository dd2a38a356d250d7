//! # tally-register: Terminal Point of Sale
//!
//! A line-oriented register for one cashier. The cart and checkout logic
//! live in `tally-core`; this crate adds the pieces that touch the outside
//! world.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  main.rs ── reads stdin, prints replies                           │
//! │     │                                                             │
//! │     ▼                                                             │
//! │  terminal ── Command parsing, Cart, Checkout, Receipt             │
//! │     │                 │                                           │
//! │     ▼                 ▼                                           │
//! │  gateway          session_file                                    │
//! │  (HTTP to server) (session.json between runs)                     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod session_file;
pub mod terminal;

pub use config::{ConfigOverrides, RegisterConfig};
pub use error::{RegisterError, RegisterResult};
pub use gateway::{AccountGateway, HttpGateway};
pub use session_file::FileSessionStorage;
pub use terminal::{Command, Terminal};
