//! Mutation forms: local validated state plus exactly one mutating call.
//!
//! # Design
//! A `FormSpec` describes one form: its fields, client-side rules, the
//! request it issues and the caches it refreshes. `Form<F>` wraps it with
//! the submit lifecycle shared by every form:
//!
//! 1. `begin_submit` validates. Invalid input returns the field errors and
//!    no request is built. Valid input marks the form pending and returns
//!    the request; a second call while pending is refused.
//! 2. The host executes the request.
//! 3. `finish_submit` parses the response, invalidates the form's cache
//!    keys, then either toasts success and closes/resets, or routes the
//!    server's validation errors onto the form's fields (toast otherwise).
//!
//! Updates are pessimistic: nothing in the cache changes until the server
//! has answered.

pub mod delete;
pub mod items;
pub mod login;
pub mod modal;
pub mod settings;
pub mod users;
pub mod validation;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::AppContext;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::storage::Storage;
use crate::transport::{Transport, TransportError};

pub use delete::DeleteForm;
pub use items::{AddItemForm, EditItemForm};
pub use login::{SignInForm, SignUpForm};
pub use modal::{ActionTarget, ActionsMenu, Modal};
pub use settings::{ChangePasswordForm, DeleteAccountForm, UserInformationForm};
pub use users::{AddUserForm, EditUserForm};

/// Error messages keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// What the form does once the server has accepted the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSuccess {
    /// Close the modal and clear the inputs.
    Close,
    /// Stay open with the inputs cleared.
    Reset,
    /// Stay open and keep the inputs.
    Stay,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Pending,
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub trait FormSpec {
    type Output;

    /// Fields that can display an error.
    const FIELDS: &'static [&'static str];

    fn validate(&self) -> FieldErrors;

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError>;

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<Self::Output, ApiError>;

    /// Cache resources refreshed once the call settles.
    fn invalidates(&self) -> &'static [&'static str] {
        &[]
    }

    fn success_message(&self) -> Option<String>;

    fn after_success(&self) -> AfterSuccess {
        AfterSuccess::Close
    }

    /// Take over the server's answer into the inputs.
    fn accept(&mut self, _output: &Self::Output) {}

    /// Extra effects on the application once the call succeeded.
    fn on_success<S: Storage>(&self, _ctx: &mut AppContext<S>, _output: &Self::Output) {}

    /// Field that shows a rejection no field claims, instead of a toast.
    fn fallback_error_field(&self) -> Option<&'static str> {
        None
    }

    /// Clear the inputs back to their initial values.
    fn reset(&mut self);
}

#[derive(Debug)]
pub struct Form<F: FormSpec> {
    values: F,
    errors: FieldErrors,
    pending: bool,
    open: bool,
}

impl<F: FormSpec> Form<F> {
    pub fn new(values: F) -> Self {
        Self {
            values,
            errors: FieldErrors::new(),
            pending: false,
            open: true,
        }
    }

    pub fn values(&self) -> &F {
        &self.values
    }

    /// Edit the inputs. Editing clears the error shown on `field`.
    pub fn edit(&mut self, field: &str, change: impl FnOnce(&mut F)) {
        change(&mut self.values);
        self.errors.remove(field);
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The submit control is disabled while a call is outstanding.
    pub fn can_submit(&self) -> bool {
        !self.pending
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.values.reset();
        self.errors.clear();
        self.open = false;
    }

    /// Validate and, if valid, produce the single request of this submit.
    pub fn begin_submit(&mut self, client: &ApiClient) -> Result<HttpRequest, SubmitError> {
        if self.pending {
            return Err(SubmitError::Pending);
        }
        let errors = self.values.validate();
        if !errors.is_empty() {
            debug!(fields = ?errors.keys().collect::<Vec<_>>(), "form invalid");
            self.errors = errors.clone();
            return Err(SubmitError::Invalid(errors));
        }
        self.errors.clear();
        let request = self.values.build(client)?;
        self.pending = true;
        Ok(request)
    }

    /// Settle the submit started by `begin_submit`.
    pub fn finish_submit<S: Storage>(
        &mut self,
        ctx: &mut AppContext<S>,
        response: Result<HttpResponse, TransportError>,
    ) -> Result<F::Output, SubmitError> {
        self.pending = false;
        let result = response
            .map_err(|e| ApiError::Transport(e.to_string()))
            .and_then(|r| self.values.parse(&ctx.client, r));

        for resource in self.values.invalidates() {
            ctx.cache.invalidate(resource);
        }

        match result {
            Ok(output) => {
                self.values.accept(&output);
                if let Some(message) = self.values.success_message() {
                    info!(%message, "mutation succeeded");
                    ctx.toasts.success(message);
                }
                match self.values.after_success() {
                    AfterSuccess::Close => self.close(),
                    AfterSuccess::Reset => {
                        self.values.reset();
                        self.errors.clear();
                    }
                    AfterSuccess::Stay => {}
                }
                self.values.on_success(ctx, &output);
                Ok(output)
            }
            Err(e) => {
                warn!(error = %e, "mutation failed");
                self.surface(ctx, &e);
                Err(SubmitError::Api(e))
            }
        }
    }

    /// `begin_submit`, execute through `transport`, `finish_submit`.
    pub fn submit<S: Storage>(
        &mut self,
        ctx: &mut AppContext<S>,
        transport: &dyn Transport,
    ) -> Result<F::Output, SubmitError> {
        let request = self.begin_submit(&ctx.client)?;
        let response = transport.execute(request);
        self.finish_submit(ctx, response)
    }

    fn surface<S: Storage>(&mut self, ctx: &mut AppContext<S>, err: &ApiError) {
        let mut claimed = false;
        for (field, message) in err.field_errors() {
            if F::FIELDS.contains(&field.as_str()) {
                self.errors.insert(field, message);
                claimed = true;
            }
        }
        if claimed {
            return;
        }
        match self.values.fallback_error_field() {
            Some(field) if matches!(err, ApiError::Validation { .. }) => {
                self.errors.insert(field.to_string(), err.message());
            }
            _ => ctx.report_error(err),
        }
    }
}

/// Trimmed value, `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Like `optional`, but a field that had a value and was edited to blank
/// is sent as `""` so the server clears it.
pub(crate) fn cleared_or_optional(value: &str, original: Option<&str>) -> Option<String> {
    let had_value = original.is_some_and(|o| !o.trim().is_empty());
    match optional(value) {
        None if had_value => Some(String::new()),
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use crate::app::AppContext;
    use crate::config::ClientConfig;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::storage::MemoryStorage;
    use crate::transport::{Transport, TransportError};

    /// Replays canned responses and records the requests it was given.
    #[derive(Default)]
    pub struct Recorder {
        responses: RefCell<Vec<Result<HttpResponse, TransportError>>>,
        pub requests: RefCell<Vec<HttpRequest>>,
    }

    impl Recorder {
        pub fn replying(status: u16, body: &str) -> Self {
            let r = Self::default();
            r.responses.borrow_mut().push(Ok(HttpResponse::new(status, body)));
            r
        }

        pub fn count(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn last_body(&self) -> serde_json::Value {
            let requests = self.requests.borrow();
            let body = requests.last().and_then(|r| r.body.as_deref()).unwrap_or("null");
            serde_json::from_str(body).unwrap()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(request);
            self.responses.borrow_mut().remove(0)
        }
    }

    pub fn ctx() -> AppContext<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        crate::storage::Storage::set(&mut storage, "access_token", "tok");
        AppContext::new(ClientConfig::default(), storage)
    }
}
