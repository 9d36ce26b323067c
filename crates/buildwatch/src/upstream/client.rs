use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

use super::auth::{self, ApiToken};
use super::document::Document;
use super::error::{Result, UpstreamError};
use super::{BUILD_INCLUDES, Platform, Session};
use crate::config::{ApiKeyCredentials, AuthConfig};
use crate::utils::text::string_at;
use crate::utils::time::unix_timestamp_seconds;

const PUBLIC_API_BASE: &str = "https://api.appstoreconnect.apple.com/v1";
const WEB_API_BASE: &str = "https://appstoreconnect.apple.com/iris/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const PAGE_LIMIT: &str = "200";
const MAX_PAGES: usize = 50;

enum Authorization {
    ApiKey {
        credentials: ApiKeyCredentials,
        token: Option<ApiToken>,
    },
    WebSession,
}

/// Blocking App Store Connect client.
pub struct ConnectClient {
    http: Client,
    base_url: &'static str,
    authorization: Authorization,
}

impl ConnectClient {
    /// Builds the HTTP client and establishes the session for `auth`.
    pub fn connect(auth: &AuthConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("buildwatch/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()?;

        match auth {
            AuthConfig::ApiKey(credentials) => {
                let token = auth::mint_api_token(credentials)?;
                tracing::info!(key_id = %credentials.key_id, "using App Store Connect API key");
                Ok(Self {
                    http,
                    base_url: PUBLIC_API_BASE,
                    authorization: Authorization::ApiKey {
                        credentials: credentials.clone(),
                        token: Some(token),
                    },
                })
            }
            AuthConfig::Credentials { username, password } => {
                auth::web_sign_in(&http, username, password)?;
                tracing::info!("signed in to App Store Connect web session");
                Ok(Self {
                    http,
                    base_url: WEB_API_BASE,
                    authorization: Authorization::WebSession,
                })
            }
        }
    }

    fn authorize(&mut self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &mut self.authorization {
            Authorization::ApiKey { credentials, token } => {
                let now = unix_timestamp_seconds();
                let current = match token.take() {
                    Some(existing) if existing.is_fresh(now) => existing,
                    _ => auth::mint_api_token(credentials)?,
                };
                let request = request.bearer_auth(&current.value);
                *token = Some(current);
                Ok(request)
            }
            Authorization::WebSession => Ok(request),
        }
    }

    fn fetch_page(&mut self, request: RequestBuilder) -> Result<Document> {
        let request = self.authorize(request)?;
        let response = request.send()?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text()?;
        if !status.is_success() {
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                url,
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches a collection, following `links.next` until exhausted.
    fn fetch_all(&mut self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "fetching collection");
        let first = self.http.get(&url).query(query);
        let mut document = self.fetch_page(first)?;

        let mut pages = 1;
        while let Some(next) = document.links.next.clone() {
            if pages >= MAX_PAGES {
                tracing::warn!(%url, pages, "stopping pagination at page limit");
                break;
            }
            let page = self.fetch_page(self.http.get(&next))?;
            document.absorb_page(page);
            pages += 1;
        }

        Ok(document.into_hydrated())
    }
}

impl Session for ConnectClient {
    fn select_team(&mut self, team_id: &str) -> Result<()> {
        match self.authorization {
            Authorization::ApiKey { .. } => {
                tracing::warn!(
                    team_id,
                    "API keys are scoped to a single team; team selection skipped"
                );
                Ok(())
            }
            Authorization::WebSession => auth::select_web_team(&self.http, team_id),
        }
    }

    fn list_apps(&mut self) -> Result<Vec<Value>> {
        self.fetch_all("/apps", &[("limit", PAGE_LIMIT)])
    }

    fn find_app(&mut self, bundle_id: &str) -> Result<Option<Value>> {
        let candidates =
            self.fetch_all("/apps", &[("filter[bundleId]", bundle_id), ("limit", PAGE_LIMIT)])?;
        Ok(candidates.into_iter().find(|app| {
            string_at(app, "/attributes/bundleId").as_deref() == Some(bundle_id)
        }))
    }

    fn app_store_versions(&mut self, app_id: &str, platform: Platform) -> Result<Vec<Value>> {
        self.fetch_all(
            &format!("/apps/{app_id}/appStoreVersions"),
            &[("filter[platform]", platform.as_str()), ("limit", PAGE_LIMIT)],
        )
    }

    fn builds(&mut self, app_id: &str) -> Result<Vec<Value>> {
        self.fetch_all(
            "/builds",
            &[
                ("filter[app]", app_id),
                ("include", BUILD_INCLUDES),
                ("limit", PAGE_LIMIT),
            ],
        )
    }

    fn pre_release_versions(&mut self, app_id: &str, platform: Platform) -> Result<Vec<Value>> {
        self.fetch_all(
            "/preReleaseVersions",
            &[
                ("filter[app]", app_id),
                ("filter[platform]", platform.as_str()),
                ("limit", PAGE_LIMIT),
            ],
        )
    }

    fn pre_release_version_builds(&mut self, pre_release_version_id: &str) -> Result<Vec<Value>> {
        self.fetch_all(
            &format!("/preReleaseVersions/{pre_release_version_id}/builds"),
            &[("limit", PAGE_LIMIT)],
        )
    }
}
