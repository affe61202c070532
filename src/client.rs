use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{Label, LabelFields, LabelType, Labelbase, LabelbaseParams};
use crate::session::Session;
use crate::transport::{HttpTransport, Transport};

// ---------------------------------------------------------------------------
// Internal request handling
// ---------------------------------------------------------------------------

/// Send a request and decode the body as `R`.
///
/// Transport and decoding failures are logged and collapse to `None`, as does
/// a successful response with an empty body.
fn fetch<T: Transport, R: DeserializeOwned>(
    transport: &T,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Option<R> {
    let data = match transport.send(method.clone(), path, body) {
        Ok(Some(data)) => data,
        Ok(None) => {
            debug!(%method, path, "labelbase request returned no data");
            return None;
        }
        Err(e) => {
            warn!(%method, path, error = %e, "labelbase request failed");
            return None;
        }
    };
    match serde_json::from_value(data) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(%method, path, error = %e, "unexpected labelbase response shape");
            None
        }
    }
}

/// Send a request whose body, if any, is irrelevant. Returns whether it succeeded.
fn execute<T: Transport>(transport: &T, method: Method, path: &str) -> bool {
    match transport.send(method.clone(), path, None) {
        Ok(_) => true,
        Err(e) => {
            warn!(%method, path, error = %e, "labelbase request failed");
            false
        }
    }
}

/// Serialize a request body. Model types always serialize to an object.
fn to_body<S: serde::Serialize>(value: &S) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(error = %e, "failed to encode labelbase request body");
            None
        }
    }
}

fn labelbases_path() -> String {
    "labelbase".to_string()
}

fn labelbase_path(labelbase_id: &str) -> String {
    format!("labelbase/{labelbase_id}")
}

fn labels_path(labelbase_id: &str) -> String {
    format!("labelbase/{labelbase_id}/label")
}

fn label_path(labelbase_id: &str, label_id: &str) -> String {
    format!("labelbase/{labelbase_id}/label/{label_id}")
}

// ---------------------------------------------------------------------------
// Public client
// ---------------------------------------------------------------------------

/// Main entry point for interacting with the Labelbase API.
///
/// The client owns a [`Session`] holding the current labelbase selection.
/// Operations taking `Option<&str>` for a labelbase id use the explicit id
/// when given and the selection otherwise.
///
/// ```no_run
/// use labelbase_client::{LabelFields, LabelbaseClient, LabelbaseParams};
///
/// let mut client = LabelbaseClient::new("my-api-key", None).unwrap();
/// client.create_labelbase(&LabelbaseParams::new("savings"), true);
///
/// let txid = "f91d0a8a78462bc59398f2c5d7a84fcff491c26ba54c4833478b202796c8aafd";
/// let labels = client.labels(None).unwrap();
/// labels
///     .get_or_create_by_ref_and_type(txid, "tx", &LabelFields::default().with_label("rent"))
///     .unwrap();
/// ```
pub struct LabelbaseClient<T: Transport = HttpTransport> {
    transport: T,
    session: Session,
}

impl LabelbaseClient<HttpTransport> {
    /// Create a new client.
    ///
    /// * `api_key`  – token sent as `Authorization: Token <api_key>`
    /// * `base_url` – API root; defaults to [`DEFAULT_BASE_URL`](crate::DEFAULT_BASE_URL)
    pub fn new(api_key: &str, base_url: Option<&str>) -> Result<Self> {
        let mut config = ClientConfig::new(api_key);
        if let Some(url) = base_url {
            config = config.with_base_url(url);
        }
        Self::from_config(&config)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    /// Create a client configured from `LABELBASE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> LabelbaseClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self::with_session(transport, Session::new())
    }

    /// Create a client that continues an existing selection.
    pub fn with_session(transport: T, session: Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn current_labelbase_id(&self) -> Option<&str> {
        self.session.current_labelbase_id()
    }

    /// Resolve the labelbase an operation targets without touching the network.
    pub fn resolve_labelbase_id<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        self.session.resolve(explicit)
    }

    /// Change the current labelbase.
    pub fn use_labelbase(&mut self, labelbase_id: impl Into<String>) {
        self.session.select(labelbase_id);
    }

    // -- labelbases ----------------------------------------------------------

    /// List all labelbases visible to the API key.
    pub fn list_labelbases(&self) -> Option<Vec<Labelbase>> {
        fetch(&self.transport, Method::GET, &labelbases_path(), None)
    }

    /// Get a single labelbase.
    pub fn get_labelbase(&self, labelbase_id: &str) -> Option<Labelbase> {
        fetch(&self.transport, Method::GET, &labelbase_path(labelbase_id), None)
    }

    /// Create a labelbase, optionally making it the current one.
    ///
    /// Nothing is selected when creation fails.
    pub fn create_labelbase(&mut self, params: &LabelbaseParams, select: bool) -> Option<Labelbase> {
        let body = to_body(params)?;
        let created: Labelbase = fetch(&self.transport, Method::POST, &labelbases_path(), Some(&body))?;
        info!(labelbase_id = %created.id, name = %created.name, "labelbase created");
        if select {
            self.use_labelbase(created.id.clone());
        }
        Some(created)
    }

    /// Replace a labelbase's fields, optionally re-selecting it afterwards.
    ///
    /// All three fields are sent; empty strings clear the remote value.
    pub fn update_labelbase(
        &mut self,
        labelbase_id: Option<&str>,
        params: &LabelbaseParams,
        select: bool,
    ) -> Result<Option<Labelbase>> {
        let path = labelbase_path(self.resolve_labelbase_id(labelbase_id)?);
        let Some(body) = to_body(params) else {
            return Ok(None);
        };
        let updated: Option<Labelbase> = fetch(&self.transport, Method::PUT, &path, Some(&body));
        if let (true, Some(labelbase)) = (select, &updated) {
            self.use_labelbase(labelbase.id.clone());
        }
        Ok(updated)
    }

    /// Delete a labelbase. The current selection is left as it was, even if
    /// it names the deleted labelbase.
    pub fn delete_labelbase(&self, labelbase_id: Option<&str>) -> Result<bool> {
        let path = labelbase_path(self.resolve_labelbase_id(labelbase_id)?);
        Ok(execute(&self.transport, Method::DELETE, &path))
    }

    // -- sub-client accessor -------------------------------------------------

    /// Label operations scoped to a labelbase (explicit or current).
    ///
    /// Fails with [`MissingLabelbaseSelection`](crate::LabelbaseError::MissingLabelbaseSelection)
    /// before any request is made when neither is available.
    pub fn labels(&self, labelbase_id: Option<&str>) -> Result<LabelsClient<'_, T>> {
        let labelbase_id = self.resolve_labelbase_id(labelbase_id)?.to_string();
        Ok(LabelsClient {
            transport: &self.transport,
            labelbase_id,
        })
    }
}

// ===========================================================================
// Labels
// ===========================================================================

pub struct LabelsClient<'a, T: Transport> {
    transport: &'a T,
    labelbase_id: String,
}

impl<T: Transport> LabelsClient<'_, T> {
    /// The labelbase these operations target.
    pub fn labelbase_id(&self) -> &str {
        &self.labelbase_id
    }

    /// List all labels in the labelbase, in server order.
    ///
    /// Records that do not decode as a [`Label`] are logged and skipped.
    pub fn list(&self) -> Option<Vec<Label>> {
        let path = labels_path(&self.labelbase_id);
        let records: Vec<Value> = fetch(self.transport, Method::GET, &path, None)?;
        Some(
            records
                .into_iter()
                .filter_map(|record| match serde_json::from_value(record) {
                    Ok(label) => Some(label),
                    Err(e) => {
                        warn!(path = %path, error = %e, "skipping undecodable label record");
                        None
                    }
                })
                .collect(),
        )
    }

    /// Get a single label.
    pub fn get(&self, label_id: &str) -> Option<Label> {
        fetch(
            self.transport,
            Method::GET,
            &label_path(&self.labelbase_id, label_id),
            None,
        )
    }

    /// Create a label after checking the type-conditional fields.
    ///
    /// Unknown extra fields are passed through to the server.
    pub fn create(&self, fields: &LabelFields) -> Result<Option<Label>> {
        fields.validate()?;
        let Some(body) = to_body(fields) else {
            return Ok(None);
        };
        Ok(fetch(
            self.transport,
            Method::POST,
            &labels_path(&self.labelbase_id),
            Some(&body),
        ))
    }

    /// Read-modify-write update of a label.
    ///
    /// The stored record is fetched, `changes` are laid over it and the
    /// result replaces the record. `spendable` is dropped unless the merged
    /// type is `output`. Returns `None` without writing if the read fails.
    pub fn update(&self, label_id: &str, changes: &LabelFields) -> Option<Label> {
        let Some(mut label) = self.get(label_id) else {
            error!(
                labelbase_id = %self.labelbase_id,
                label_id,
                "label data could not be retrieved, update aborted"
            );
            return None;
        };
        label.merge(changes);
        label.strip_spendable_unless_output();

        let body = to_body(&label)?;
        fetch(
            self.transport,
            Method::PUT,
            &label_path(&self.labelbase_id, label_id),
            Some(&body),
        )
    }

    /// Delete a label. Returns whether the server accepted the delete.
    pub fn delete(&self, label_id: &str) -> bool {
        execute(
            self.transport,
            Method::DELETE,
            &label_path(&self.labelbase_id, label_id),
        )
    }

    // -- reconciliation ------------------------------------------------------

    /// Find the first label annotating `reference` with `label_type`.
    ///
    /// A labelbase may hold several labels for the same pair; the first one
    /// in listing order is returned. `None` also covers a failed listing.
    pub fn find_by_ref_and_type(
        &self,
        reference: &str,
        label_type: impl Into<LabelType>,
    ) -> Option<Label> {
        match self.lookup(reference, &label_type.into()) {
            Lookup::Found(label) => Some(label),
            Lookup::Missing | Lookup::Unavailable => None,
        }
    }

    fn lookup(&self, reference: &str, label_type: &LabelType) -> Lookup {
        match self.list() {
            Some(labels) => labels
                .into_iter()
                .find(|label| label.matches(reference, label_type))
                .map_or(Lookup::Missing, Lookup::Found),
            None => Lookup::Unavailable,
        }
    }

    /// Return the first matching label unchanged, or create one from
    /// `reference`, `label_type` and `extra`.
    ///
    /// Nothing is created when the labels cannot be listed.
    pub fn get_or_create_by_ref_and_type(
        &self,
        reference: &str,
        label_type: impl Into<LabelType>,
        extra: &LabelFields,
    ) -> Result<Option<Label>> {
        let label_type = label_type.into();
        match self.lookup(reference, &label_type) {
            Lookup::Found(found) => Ok(Some(found)),
            Lookup::Missing => self.create(
                &extra
                    .clone()
                    .with_reference(reference)
                    .with_type(label_type),
            ),
            Lookup::Unavailable => {
                self.abort_listing_failed();
                Ok(None)
            }
        }
    }

    /// Update the first matching label with `extra`, or create one.
    ///
    /// On a match the stored record is re-read, `extra` is merged over it and
    /// fields invalid for `label_type` (`spendable`, `origin`) are dropped
    /// before delegating to [`update`](Self::update). Nothing is written when
    /// either read fails.
    pub fn update_or_create_by_ref_and_type(
        &self,
        reference: &str,
        label_type: impl Into<LabelType>,
        extra: &LabelFields,
    ) -> Result<Option<Label>> {
        let label_type = label_type.into();
        let found = match self.lookup(reference, &label_type) {
            Lookup::Found(found) => found,
            Lookup::Missing => {
                return self.create(
                    &extra
                        .clone()
                        .with_reference(reference)
                        .with_type(label_type),
                );
            }
            Lookup::Unavailable => {
                self.abort_listing_failed();
                return Ok(None);
            }
        };

        let Some(mut existing) = self.get(&found.id) else {
            error!(
                labelbase_id = %self.labelbase_id,
                label_id = %found.id,
                "existing label data could not be retrieved, update aborted"
            );
            return Ok(None);
        };
        existing.merge(extra);
        existing.strip_fields_invalid_for(&label_type);

        let label_id = existing.id.clone();
        Ok(self.update(&label_id, &LabelFields::from(existing)))
    }

    fn abort_listing_failed(&self) {
        error!(
            labelbase_id = %self.labelbase_id,
            "labels could not be listed, reconciliation aborted"
        );
    }
}

/// Outcome of scanning a labelbase for a `(ref, type)` pair.
enum Lookup {
    Found(Label),
    Missing,
    Unavailable,
}
