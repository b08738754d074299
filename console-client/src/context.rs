//! Authentication context of a console page

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::user::AuthUser;

/// Generic login failure, used if the server didn't say what went wrong
const LOGIN_FAILED: &str = "Login failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// Server refused the credentials
    #[error("{0}")]
    Rejected(String),
    #[error("Network error. Please try again.")]
    Network,
}

/// What the page should do after an auth operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Redirect(String),
}

/// Client side routes the context navigates between
#[derive(Debug, Clone)]
pub struct Routes {
    pub sign_in: String,
    /// Pages reachable without a session, never redirected away from
    pub public: Vec<String>,
}

impl Default for Routes {
    fn default() -> Self {
        let sign_in = access::Gate::default().sign_in().to_owned();
        Self {
            public: vec![sign_in.clone(), "/signup".to_owned()],
            sign_in,
        }
    }
}

impl Routes {
    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|public| public == path)
    }
}

/// Cached identity of the page's user
///
/// Starts out loading and unauthenticated. The first [`AuthContext::refresh`] settles it.
#[derive(Debug)]
pub struct AuthContext<A> {
    api: A,
    routes: Routes,
    loading: bool,
    authenticated: bool,
    user: Option<AuthUser>,
}

impl<A: AuthApi> AuthContext<A> {
    pub fn new(api: A) -> Self {
        Self::with_routes(api, Routes::default())
    }

    pub fn with_routes(api: A, routes: Routes) -> Self {
        Self {
            api,
            routes,
            loading: true,
            authenticated: false,
            user: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn clear(&mut self) {
        self.authenticated = false;
        self.user = None;
    }

    /// Validates the session with the server
    ///
    /// Any failure, transport errors included, leaves the context unauthenticated and sends the
    /// user to sign in, unless `current_path` is a public page already.
    pub async fn refresh(&mut self, current_path: &str) -> Navigation {
        let user = match self.api.check().await {
            Ok(resp) if resp.authenticated => resp.user,
            Ok(resp) => {
                debug!(error = ?resp.error, "Session not authenticated");
                None
            }
            Err(err) => {
                warn!(%err, "Session check failed");
                None
            }
        };

        self.loading = false;
        match user {
            Some(user) => {
                self.authenticated = true;
                self.user = Some(user.into());
                Navigation::Stay
            }
            None => {
                self.clear();
                if self.routes.is_public(current_path) {
                    Navigation::Stay
                } else {
                    Navigation::Redirect(self.routes.sign_in.clone())
                }
            }
        }
    }

    /// Signs in with credentials. No retries.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), LoginError> {
        let resp = self.api.login(email, password).await.map_err(|err| {
            warn!(%err, "Login request failed");
            LoginError::Network
        })?;

        let Some(user) = resp.user else {
            let error = resp.error.unwrap_or_else(|| LOGIN_FAILED.to_owned());
            info!(%error, "Login rejected");
            return Err(LoginError::Rejected(error));
        };

        self.authenticated = true;
        self.user = Some(user.into());
        Ok(())
    }

    /// Signs out
    ///
    /// Server side invalidation is best effort. Local state is cleared and the page is sent to
    /// sign in either way.
    pub async fn logout(&mut self) -> Navigation {
        if let Err(err) = self.api.logout().await {
            warn!(%err, "Logout request failed");
        }

        self.clear();
        Navigation::Redirect(self.routes.sign_in.clone())
    }

    /// Checks a permission of the cached user. Always `false` when signed out.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.has_permission(permission))
    }
}
