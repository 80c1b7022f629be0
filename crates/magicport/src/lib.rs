//! A libmagic port: classifies files and buffers for a parent process.
//!
//! The parent speaks length-prefixed frames over the port's stdin/stdout,
//! each carrying one versioned term. The port opens three classifier views
//! (MIME type, MIME encoding and description), announces `ready`, and then
//! answers commands one at a time until told to stop.
//!
//! # Crate Structure
//!
//! - [`term`] — Versioned tagged-term codec
//! - [`frame`] — Length-prefixed framing over byte streams
//! - [`magic`] — Classifier views, the registry, and the libmagic binding
//! - [`Port`] — The command loop tying them together

pub mod command;
pub mod config;
pub mod exit;
pub mod port;
pub mod response;

pub use config::PortConfig;
pub use exit::{Fatal, Shutdown};
pub use port::{Flow, Port};
pub use response::{Rejection, Response};

/// Re-export term codec types.
pub mod term {
    pub use magicport_term::*;
}

/// Re-export frame types.
pub mod frame {
    pub use magicport_frame::*;
}

/// Re-export classifier types.
pub mod magic {
    pub use magicport_magic::*;
}
