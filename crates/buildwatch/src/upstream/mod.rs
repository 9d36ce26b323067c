//! Boundary with the App Store Connect API.
//!
//! Everything the report pipeline needs from the platform goes through
//! [`Session`]. Resources are handed over as hydrated JSON:API objects
//! (relationship identifiers replaced by their `included` resources), and the
//! pipeline resolves fields from them defensively.

pub mod auth;
pub mod client;
pub mod document;
pub mod error;

pub use client::ConnectClient;
pub use error::UpstreamError;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "IOS",
        }
    }
}

/// Relationships requested alongside every build listing.
pub const BUILD_INCLUDES: &str = "preReleaseVersion,betaAppReviewSubmission,buildBetaDetail";

/// A live, single-owner session against the platform.
///
/// The session carries the currently selected team, so calls must be
/// serialized through one `&mut` handle.
pub trait Session {
    /// Scopes subsequent calls to `team_id`.
    fn select_team(&mut self, team_id: &str) -> error::Result<()>;

    /// Every app visible to the current team.
    fn list_apps(&mut self) -> error::Result<Vec<Value>>;

    /// Looks an app up by bundle identifier.
    fn find_app(&mut self, bundle_id: &str) -> error::Result<Option<Value>>;

    fn app_store_versions(&mut self, app_id: &str, platform: Platform)
    -> error::Result<Vec<Value>>;

    /// Builds for the app, hydrated with [`BUILD_INCLUDES`].
    fn builds(&mut self, app_id: &str) -> error::Result<Vec<Value>>;

    fn pre_release_versions(
        &mut self,
        app_id: &str,
        platform: Platform,
    ) -> error::Result<Vec<Value>>;

    /// Builds attached to one pre-release version, fetched on demand.
    fn pre_release_version_builds(
        &mut self,
        pre_release_version_id: &str,
    ) -> error::Result<Vec<Value>>;
}
