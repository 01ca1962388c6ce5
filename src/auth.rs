//! Camera-usage authorization.
//!
//! Every other camera activity is gated on the outcome of
//! [`PermissionGate::check`].

use crate::capture::CameraError;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Platform authorization state for camera use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    /// Policy forbids camera use.
    Restricted,
    /// Access was refused.
    Denied,
    /// Access was granted.
    Authorized,
}

/// Platform camera-authorization API.
pub trait AuthorizationProvider {
    /// Current authorization state, without prompting.
    fn status(&self) -> AuthorizationStatus;

    /// Prompts the user; resolves to whether access was granted.
    fn request_access(&self) -> impl Future<Output = bool> + Send;
}

/// Queries and requests camera authorization.
pub struct PermissionGate<A> {
    provider: A,
    authorized: bool,
}

impl<A: AuthorizationProvider> PermissionGate<A> {
    /// Wraps `provider`. Nothing is authorized until [`check`](Self::check) succeeds.
    pub fn new(provider: A) -> Self {
        Self {
            provider,
            authorized: false,
        }
    }

    /// Result of the most recent check.
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// The wrapped authorization provider.
    pub fn provider(&self) -> &A {
        &self.provider
    }

    /// Inspects the current authorization, prompting if undetermined.
    ///
    /// Safe to call repeatedly; a prior grant short-circuits without a
    /// prompt.
    pub async fn check(&mut self) -> Result<(), CameraError> {
        let granted = match self.provider.status() {
            AuthorizationStatus::Authorized => true,
            AuthorizationStatus::NotDetermined => {
                tracing::info!("Requesting camera authorization");
                self.provider.request_access().await
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => false,
        };

        self.authorized = granted;
        if granted {
            tracing::info!("Camera access authorized");
            Ok(())
        } else {
            tracing::warn!("Camera access not authorized");
            Err(CameraError::NotAuthorized)
        }
    }
}

/// In-process authorization provider with a fixed answer to prompts.
///
/// Behaves like a platform provider: a prompt resolves the status to
/// `Authorized` or `Denied` for subsequent queries.
#[derive(Debug)]
pub struct StaticAuthorization {
    status: Mutex<AuthorizationStatus>,
    grant_on_request: bool,
    requests: AtomicUsize,
}

impl StaticAuthorization {
    /// Provider reporting `status`; a prompt grants access when `grant_on_request` is set.
    pub fn new(status: AuthorizationStatus, grant_on_request: bool) -> Self {
        Self {
            status: Mutex::new(status),
            grant_on_request,
            requests: AtomicUsize::new(0),
        }
    }

    /// Already authorized.
    pub fn granted() -> Self {
        Self::new(AuthorizationStatus::Authorized, true)
    }

    /// Already denied.
    pub fn denied() -> Self {
        Self::new(AuthorizationStatus::Denied, false)
    }

    /// Number of prompts shown so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl AuthorizationProvider for StaticAuthorization {
    fn status(&self) -> AuthorizationStatus {
        self.status
            .lock()
            .map(|status| *status)
            .unwrap_or(AuthorizationStatus::Restricted)
    }

    fn request_access(&self) -> impl Future<Output = bool> + Send {
        async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let granted = self.grant_on_request;
            if let Ok(mut status) = self.status.lock() {
                *status = if granted {
                    AuthorizationStatus::Authorized
                } else {
                    AuthorizationStatus::Denied
                };
            }
            granted
        }
    }
}
