//! Implements the `DataSource` trait against the accounting backend's REST API.

use crate::api::session::{Session, SessionFile};
use crate::api::DataSource;
use crate::model::{
    Account, CreateAccountRequest, CreateOrganizationRequest, CreateTransactionRequest, OrgId,
    Organization, OrganizationSummary, Transaction, UpdateAccountRequest,
    UpdateOrganizationRequest, UpdateTransactionRequest, User,
};
use crate::error::ErrorType;
use crate::{Config, Error, Result};
use anyhow::{anyhow, bail, Context};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ORG_HEADER: &str = "x-org-id";

/// Talks to the backend over HTTP. Every data request carries the bearer token from the session
/// and, outside of `/auth/` routes, the selected organization. A `401` triggers one token refresh
/// and one retry.
pub(crate) struct RestSource {
    client: Client,
    base: Url,
    org: Option<OrgId>,
    session: SessionFile,
    config: Config,
}

impl RestSource {
    pub(crate) async fn new(config: &Config, org: Option<OrgId>) -> Result<Self> {
        let session = SessionFile::load_or_default(config.session_path()).await?;
        Ok(Self {
            client: http_client()?,
            base: config.api_url().clone(),
            org,
            session,
            config: config.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&mut self, path: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        parse(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&mut self, path: &str, body: &B) -> Result<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        parse(response).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.send(Method::PATCH, path, Some(body)).await?;
        parse(response).await
    }

    async fn delete(&mut self, path: &str) -> Result<()> {
        let _ = self.send::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Sends the request, refreshing the token and retrying once if the backend answers `401`.
    async fn send<B: Serialize>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = endpoint(&self.base, path)?;
        let response = self
            .request(method.clone(), url.clone(), path, body)?
            .send()
            .await
            .with_context(|| format!("{method} {url} failed"))?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check(response).await;
        }

        debug!("{method} {url} returned 401, refreshing the access token");
        self.refresh().await?;
        let response = self
            .request(method.clone(), url.clone(), path, body)?
            .send()
            .await
            .with_context(|| format!("{method} {url} failed after refreshing the token"))?;
        check(response).await
    }

    fn request<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        path: &str,
        body: Option<&B>,
    ) -> Result<RequestBuilder> {
        let headers = request_headers(self.session.data(), self.org.as_ref(), path)?;
        trace!("{method} {url}");
        let builder = self.client.request(method, url).headers(headers);
        Ok(match body {
            Some(body) => builder.json(body),
            None => builder,
        })
    }

    /// Posts `/auth/refresh` with the stored cookies and saves the new token. When the refresh is
    /// rejected the session is expired.
    async fn refresh(&mut self) -> Result<()> {
        let path = "auth/refresh";
        let url = endpoint(&self.base, path)?;
        let response = self
            .request(Method::POST, url.clone(), path, Some(&serde_json::json!({})))?
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        if !response.status().is_success() {
            warn!("Token refresh was rejected with {}", response.status());
            self.session.data_mut().remember_cookies(response.headers());
            return self.expire().await;
        }
        self.session.data_mut().remember_cookies(response.headers());
        let refreshed: TokenResponse = parse(response).await?;
        self.session
            .data_mut()
            .set_access_token(refreshed.access_token);
        self.session.save().await?;
        debug!("Saved refreshed access token to {}", self.session.path().display());
        Ok(())
    }

    /// Drops the stored token and forgets the selected organization, then fails with an auth
    /// error asking for a new login.
    async fn expire(&mut self) -> Result<()> {
        self.session.data_mut().clear_access_token();
        self.session.save().await?;
        self.config.clear_organization_id().await?;
        Err(ErrorType::Auth.tag(anyhow!(
            "Your session has expired or you are not logged in, run 'finboard login'"
        )))
    }
}

#[async_trait::async_trait]
impl DataSource for RestSource {
    async fn list_transactions(&mut self) -> Result<Vec<Transaction>> {
        self.get("transactions").await
    }

    async fn get_transaction(&mut self, id: &str) -> Result<Transaction> {
        self.get(&format!("transactions/{id}")).await
    }

    async fn create_transaction(
        &mut self,
        request: CreateTransactionRequest,
    ) -> Result<Transaction> {
        self.post("transactions", &request).await
    }

    async fn update_transaction(
        &mut self,
        id: &str,
        request: UpdateTransactionRequest,
    ) -> Result<Transaction> {
        self.patch(&format!("transactions/{id}"), &request).await
    }

    async fn delete_transaction(&mut self, id: &str) -> Result<()> {
        self.delete(&format!("transactions/{id}")).await
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        self.get("accounts").await
    }

    async fn get_account(&mut self, id: &str) -> Result<Account> {
        self.get(&format!("accounts/{id}")).await
    }

    async fn create_account(&mut self, request: CreateAccountRequest) -> Result<Account> {
        self.post("accounts", &request).await
    }

    async fn update_account(&mut self, id: &str, request: UpdateAccountRequest) -> Result<Account> {
        self.patch(&format!("accounts/{id}"), &request).await
    }

    async fn delete_account(&mut self, id: &str) -> Result<()> {
        self.delete(&format!("accounts/{id}")).await
    }

    async fn list_organizations(&mut self) -> Result<Vec<Organization>> {
        self.get("organizations").await
    }

    async fn create_organization(
        &mut self,
        request: CreateOrganizationRequest,
    ) -> Result<Organization> {
        self.post("organizations", &request).await
    }

    async fn update_organization(
        &mut self,
        id: &str,
        request: UpdateOrganizationRequest,
    ) -> Result<Organization> {
        self.patch(&format!("organizations/{id}"), &request).await
    }

    async fn organization_summary(&mut self, id: &str) -> Result<OrganizationSummary> {
        self.get(&format!("organizations/{id}/summary")).await
    }

    async fn current_user(&mut self) -> Result<User> {
        self.get("users/me").await
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// The body of `/auth/refresh`. `/auth/login` and `/auth/register` add the user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    user: Option<User>,
}

/// Posts the credentials to `/auth/login` and stores the resulting session.
pub(crate) async fn login(config: &Config, email: &str, password: &str) -> Result<Authenticated> {
    authenticate(config, "auth/login", &LoginRequest { email, password }, email)
        .await
        .context("Login failed")
}

/// Creates a user with `/auth/register` and stores the resulting session, so the new user is
/// logged in right away.
pub(crate) async fn register(
    config: &Config,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<Authenticated> {
    let request = RegisterRequest {
        email,
        password,
        name,
    };
    authenticate(config, "auth/register", &request, email)
        .await
        .context("Registration failed")
}

/// The stored session and, when the backend sent it, the user it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct Authenticated {
    pub(crate) session: Session,
    pub(crate) user: Option<User>,
}

async fn authenticate<B: Serialize>(
    config: &Config,
    path: &str,
    body: &B,
    email: &str,
) -> Result<Authenticated> {
    let url = endpoint(config.api_url(), path)?;
    let response = http_client()?
        .post(url.clone())
        .json(body)
        .send()
        .await
        .with_context(|| format!("POST {url} failed"))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("{url} returned {status}: {}", body.trim());
    }

    let headers = response.headers().clone();
    let token: TokenResponse = parse(response).await?;
    let email = token
        .user
        .as_ref()
        .map(|user| user.email.clone())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| email.to_string());
    let mut session = Session::new(token.access_token, Some(email));
    session.remember_cookies(&headers);

    SessionFile::new(config.session_path(), session.clone())
        .save()
        .await
        .context("Unable to save the session")?;
    Ok(Authenticated {
        session,
        user: token.user,
    })
}

/// Tells the backend to end the session, then deletes the local session file. A failed backend
/// call is logged and does not stop the local logout.
pub(crate) async fn logout(config: &Config) -> Result<()> {
    let file = SessionFile::load_or_default(config.session_path()).await?;
    if file.data().access_token().is_none() {
        debug!("No stored access token, nothing to end on the backend");
        return file.delete().await;
    }
    let path = "auth/logout";
    let url = endpoint(config.api_url(), path)?;
    let headers = request_headers(file.data(), None, path)?;
    match http_client()?.post(url.clone()).headers(headers).send().await {
        Ok(response) if response.status().is_success() => debug!("Backend session ended"),
        Ok(response) => warn!("POST {url} returned {}", response.status()),
        Err(e) => warn!("POST {url} failed: {e}"),
    }
    file.delete().await
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Unable to build the HTTP client")
}

/// Joins `path` onto `base`, keeping every segment of `base`.
fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).with_context(|| format!("Invalid endpoint URL '{joined}'"))
}

/// Builds the auth and organization headers for a request to `path`.
fn request_headers(session: &Session, org: Option<&OrgId>, path: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(token) = session.access_token() {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("The stored access token is not a valid header value")?;
        headers.insert(AUTHORIZATION, value);
    }
    if let Some(cookies) = session.cookie_header() {
        if let Ok(value) = HeaderValue::from_str(&cookies) {
            headers.insert(COOKIE, value);
        }
    }
    let is_auth_route = path.trim_start_matches('/').starts_with("auth/");
    if let Some(org) = org.filter(|_| !is_auth_route) {
        let value = HeaderValue::from_str(org.as_str())
            .with_context(|| format!("Invalid organization id '{org}'"))?;
        headers.insert(HeaderName::from_static(ORG_HEADER), value);
    }
    Ok(headers)
}

/// Turns a non-success status into an error that carries the response body.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(unauthorized(&url, status));
    }
    bail!("{url} returned {status}: {}", body.trim())
}

fn unauthorized(url: &Url, status: StatusCode) -> Error {
    ErrorType::Auth.tag(anyhow!("{url} returned {status}, run 'finboard login'"))
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let url = response.url().clone();
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Unable to read the response from {url}"))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Unexpected response from {url}"))
}
