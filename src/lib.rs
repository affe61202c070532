//! Labelbase API client library for Rust.
//!
//! A Rust client library for interacting with the
//! [Labelbase API](https://labelbase.space). Labelbases are named
//! collections of labels: free-text annotations attached to transaction,
//! output and other references.
//!
//! Besides plain CRUD, the client tracks a current labelbase and offers
//! find-or-create / update-or-create helpers keyed on a label's
//! `(ref, type)` pair.
//!
//! # Quick Start
//!
//! ```no_run
//! use labelbase_client::{LabelFields, LabelbaseClient};
//!
//! let mut client = LabelbaseClient::new("my-api-key", None).unwrap();
//! client.use_labelbase("12");
//!
//! let labels = client.labels(None).unwrap();
//! for label in labels.list().unwrap_or_default() {
//!     println!("{} {}: {}", label.label_type, label.reference, label.label);
//! }
//!
//! let fields = LabelFields::default().with_label("exchange withdrawal");
//! labels
//!     .update_or_create_by_ref_and_type("a1b2c3:0", "output", &fields.with_spendable(true))
//!     .unwrap();
//! ```
//!
//! Requests that fail remotely are logged through `tracing` and reported
//! as `None` (or `false` for deletes); only local problems such as a
//! missing labelbase selection or invalid label fields are returned as
//! errors.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

// Re-export the main public types at the crate root for convenience.
pub use client::{LabelbaseClient, LabelsClient};
pub use config::{BodyEncoding, ClientConfig, DEFAULT_BASE_URL, LOCAL_BASE_URL};
pub use error::{LabelbaseError, Result, TransportError, ValidationError};
pub use models::{Label, LabelFields, LabelType, Labelbase, LabelbaseParams};
pub use session::Session;
pub use transport::{HttpTransport, Transport};
