//! QRBar session logic.
//!
//! Decides what to render and keeps local state consistent with the code
//! store. The pieces, leaf-first:
//!
//! - [`catalog`]: code types, sub-formats, and `resolve_render_format`
//! - [`validate`]: draft check before submission
//! - [`render`]: `select_renderer`, record → engine parameters
//! - [`state`] / [`request`]: session state and the requests that change it
//! - [`controller`]: `SessionController`, the only writer of session state
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use qrbar_client::HttpCodeStore;
//! use qrbar_session::{DraftField, SessionController};
//!
//! let store = Arc::new(HttpCodeStore::new("http://localhost:8000"));
//! let mut session = SessionController::new(store);
//! session.mount().await;
//! session.edit(DraftField::Text("hello".into()));
//! session.submit().await?;
//! for (id, spec) in session.render_specs() {
//!     println!("{id}: {spec:?}");
//! }
//! ```

pub mod catalog;
pub mod controller;
pub mod render;
pub mod request;
pub mod state;
pub mod validate;

pub use catalog::{RenderFormat, builtin_choices, resolve_render_format};
pub use controller::{CREATE_FAILED_MESSAGE, SessionController, SubmitError};
pub use render::{BarcodeSpec, QrSpec, RenderSpec, select_renderer};
pub use request::{Command, DraftField};
pub use state::{DraftRequest, SessionState, SubmitPhase};
pub use validate::{ValidationError, validate};
