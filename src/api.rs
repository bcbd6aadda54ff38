use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::Error;

/// Tiffin Sathi API configuration.
///
/// The required base URL is a constructor parameter — no runtime
/// "missing field" errors. Endpoint paths default to the production API
/// layout and can be overridden via chaining:
///
/// ```rust,ignore
/// use tiffin_auth::ApiConfig;
///
/// let config = ApiConfig::new("https://api.tiffinsathi.com".parse()?)
///     .with_login_path("/v2/auth/login");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) login_path: String,
    pub(crate) profile_path: String,
}

impl ApiConfig {
    /// Create a new API configuration.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: "/auth/login".into(),
            profile_path: "/auth/me".into(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `TIFFIN_API_BASE`: API base URL
    ///
    /// # Optional env vars
    /// - `TIFFIN_LOGIN_PATH`: Override the login endpoint path
    /// - `TIFFIN_PROFILE_PATH`: Override the profile endpoint path
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TIFFIN_API_BASE` is missing or not a
    /// valid URL.
    pub fn from_env() -> Result<Self, Error> {
        let base = std::env::var("TIFFIN_API_BASE")
            .map_err(|_| Error::Config("TIFFIN_API_BASE is required".into()))?;
        let base_url: Url = base
            .parse()
            .map_err(|e| Error::Config(format!("TIFFIN_API_BASE: {e}")))?;

        let mut config = Self::new(base_url);
        if let Ok(path) = std::env::var("TIFFIN_LOGIN_PATH") {
            config = config.with_login_path(path);
        }
        if let Ok(path) = std::env::var("TIFFIN_PROFILE_PATH") {
            config = config.with_profile_path(path);
        }
        Ok(config)
    }

    /// Override the login endpoint path (default `/auth/login`).
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Override the profile endpoint path (default `/auth/me`).
    #[must_use]
    pub fn with_profile_path(mut self, path: impl Into<String>) -> Self {
        self.profile_path = path.into();
        self
    }

    /// API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("endpoint {path}: {e}")))
    }
}

/// Login response body.
///
/// The API has grown several shapes over time; every field is optional and
/// the accessors apply a fixed precedence so callers never see the variance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LoginPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    jwt: Option<String>,
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    user: Option<JsonValue>,
}

impl LoginPayload {
    /// The bearer token, normalized across response shapes.
    ///
    /// Ordered field precedence: `token`, then `accessToken`, then `jwt`,
    /// then `authToken`, then `user.token`. This list is the single place
    /// the precedence is defined.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| self.access_token.clone())
            .or_else(|| self.jwt.clone())
            .or_else(|| self.auth_token.clone())
            .or_else(|| {
                self.user
                    .as_ref()?
                    .get("token")?
                    .as_str()
                    .map(str::to_owned)
            })
    }

    /// The role the response declares: top-level `role`, then `user.role`.
    #[must_use]
    pub fn declared_role(&self) -> Option<&str> {
        self.role
            .as_deref()
            .or_else(|| self.user.as_ref()?.get("role")?.as_str())
    }

    /// The embedded user object, when the response carries one.
    #[must_use]
    pub fn user(&self) -> Option<&JsonValue> {
        self.user.as_ref()
    }
}

/// Profile response body. Used only as the role fallback when login omits it.
#[derive(Debug, Clone, Default, Deserialize)]
#[non_exhaustive]
pub struct ProfilePayload {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    user: Option<JsonValue>,
}

impl ProfilePayload {
    /// The role the profile declares: top-level `role`, then `user.role`.
    #[must_use]
    pub fn declared_role(&self) -> Option<&str> {
        self.role
            .as_deref()
            .or_else(|| self.user.as_ref()?.get("role")?.as_str())
    }
}

/// HTTP client for the Tiffin Sathi authentication endpoints.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Api`] if the
    /// endpoint returns a non-success status.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginPayload, Error> {
        let url = self.config.endpoint(&self.config.login_path)?;
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self.http.post(url).json(&body).send().await?;
        let response = Self::ensure_success(response, "login").await?;
        response.json::<LoginPayload>().await.map_err(Into::into)
    }

    /// Fetch the caller's profile using a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Api`] if the
    /// endpoint returns a non-success status.
    pub async fn fetch_profile(&self, token: &str) -> Result<ProfilePayload, Error> {
        let url = self.config.endpoint(&self.config.profile_path)?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = Self::ensure_success(response, "profile fetch").await?;
        response.json::<ProfilePayload>().await.map_err(Into::into)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Api {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> LoginPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn bearer_token_precedence_order() {
        let p = payload(serde_json::json!({
            "token": "a",
            "accessToken": "b",
            "jwt": "c",
            "authToken": "d",
            "user": { "token": "e" },
        }));
        assert_eq!(p.bearer_token().as_deref(), Some("a"));

        let p = payload(serde_json::json!({
            "accessToken": "b",
            "jwt": "c",
        }));
        assert_eq!(p.bearer_token().as_deref(), Some("b"));

        let p = payload(serde_json::json!({ "jwt": "c", "authToken": "d" }));
        assert_eq!(p.bearer_token().as_deref(), Some("c"));

        let p = payload(serde_json::json!({ "authToken": "d" }));
        assert_eq!(p.bearer_token().as_deref(), Some("d"));

        let p = payload(serde_json::json!({ "user": { "token": "e" } }));
        assert_eq!(p.bearer_token().as_deref(), Some("e"));

        let p = payload(serde_json::json!({ "user": {} }));
        assert_eq!(p.bearer_token(), None);
    }

    #[test]
    fn declared_role_falls_back_to_user_object() {
        let p = payload(serde_json::json!({ "role": "ADMIN", "user": { "role": "USER" } }));
        assert_eq!(p.declared_role(), Some("ADMIN"));

        let p = payload(serde_json::json!({ "user": { "role": "vendor" } }));
        assert_eq!(p.declared_role(), Some("vendor"));

        let p = payload(serde_json::json!({ "token": "t" }));
        assert_eq!(p.declared_role(), None);
    }

    #[test]
    fn profile_declared_role() {
        let p: ProfilePayload =
            serde_json::from_value(serde_json::json!({ "user": { "role": "DELIVERY" } })).unwrap();
        assert_eq!(p.declared_role(), Some("DELIVERY"));
    }

    #[test]
    fn config_defaults_and_overrides() {
        let config = ApiConfig::new("https://api.example.com".parse().unwrap());
        assert_eq!(
            config.endpoint(&config.login_path).unwrap().as_str(),
            "https://api.example.com/auth/login"
        );
        assert_eq!(
            config.endpoint(&config.profile_path).unwrap().as_str(),
            "https://api.example.com/auth/me"
        );

        let config = config.with_login_path("/v2/login");
        assert_eq!(
            config.endpoint(&config.login_path).unwrap().as_str(),
            "https://api.example.com/v2/login"
        );
    }
}
