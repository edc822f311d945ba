//! # Cache Router
//!
//! Owns the set of named, versioned caches and classifies every outgoing
//! request into a handling strategy.
//!
//! Classification is a single ordered table of `(predicate, strategy)` pairs
//! evaluated once per request, so the routing policy can be audited and
//! tested without executing any fetch.

use bridge_traits::http::HttpRequest;
use serde::{Deserialize, Serialize};

/// Naming family shared by every cache generation of this application.
/// Activation garbage-collects any cache carrying this prefix that is not in
/// the currently declared set.
pub const CACHE_PREFIX: &str = "briefcast-";

/// Version tag suffixed to every cache name. Bumping it and redeploying
/// causes all previous-generation caches to be purged on next activation.
pub const CACHE_VERSION: u32 = 1;

// ============================================================================
// Named caches
// ============================================================================

/// The declared set of named caches, partitioned by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheName {
    /// Application shell and generic cache-first entries.
    Shell,
    /// Snapshots of successful page navigations.
    Pages,
    /// Cover images and other non-audio podcast assets.
    Images,
    /// Audio files.
    Audio,
    /// Podcast metadata blobs keyed by derived metadata key.
    PodcastMetadata,
}

impl CacheName {
    /// Every cache in the currently declared set.
    pub fn all() -> [CacheName; 5] {
        [
            CacheName::Shell,
            CacheName::Pages,
            CacheName::Images,
            CacheName::Audio,
            CacheName::PodcastMetadata,
        ]
    }

    fn purpose(self) -> &'static str {
        match self {
            CacheName::Shell => "shell",
            CacheName::Pages => "pages",
            CacheName::Images => "images",
            CacheName::Audio => "audio",
            CacheName::PodcastMetadata => "podcast-metadata",
        }
    }

    /// The version-suffixed storage name, e.g. `briefcast-audio-v1`.
    pub fn storage_name(self) -> String {
        format!("{}{}-v{}", CACHE_PREFIX, self.purpose(), CACHE_VERSION)
    }

    /// Whether `name` belongs to this application's naming family.
    pub fn is_family_name(name: &str) -> bool {
        name.starts_with(CACHE_PREFIX)
    }

    /// Whether `name` is one of the currently declared cache names.
    pub fn is_declared(name: &str) -> bool {
        CacheName::all().iter().any(|c| c.storage_name() == name)
    }
}

/// Cache that holds a prefetched or opportunistically cached podcast asset,
/// chosen from the asset's URL alone so that storage and removal always
/// agree on placement.
pub fn asset_cache_for_url(url: &str) -> CacheName {
    if url.contains(".mp3") || url.contains(".wav") || url.contains("audio") {
        CacheName::Audio
    } else {
        CacheName::Images
    }
}

/// Derived key under which a podcast's metadata blob is stored in the
/// podcast-metadata cache.
pub fn metadata_key(podcast_id: &str) -> String {
    format!("podcast-{}", podcast_id)
}

// ============================================================================
// Strategies
// ============================================================================

/// How an intercepted request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Never touched by the cache layer; passes straight to the network.
    Bypass,
    /// Cache-first lookup in the podcast asset caches, opportunistic store
    /// on miss.
    PodcastAsset,
    /// Network-first for versioned build chunks, shell-cache fallback,
    /// placeholder synthesis as a last resort.
    BuildArtifact,
    /// Network-first page navigation with offline-page fallback.
    Navigation,
    /// Generic cache-first.
    Default,
}

// ============================================================================
// Route table
// ============================================================================

/// URL predicate primitive. Patterns are data, not code, so the table can be
/// inspected and tested in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPattern {
    /// URL contains the fragment anywhere.
    Contains(&'static str),
    /// URL ends with the fragment.
    Suffix(&'static str),
}

impl UrlPattern {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Contains(fragment) => url.contains(fragment),
            UrlPattern::Suffix(fragment) => url.ends_with(fragment),
        }
    }
}

/// URLs the cache layer must never handle: source maps, API endpoints,
/// authentication/sign-in endpoints, generation endpoints, and the identity
/// provider itself.
pub const EXCLUDED_PATTERNS: &[UrlPattern] = &[
    UrlPattern::Suffix(".map"),
    UrlPattern::Contains("/api/"),
    UrlPattern::Contains("/auth"),
    UrlPattern::Contains("/sign-"),
    UrlPattern::Contains("/generate"),
    UrlPattern::Contains("clerk.com"),
];

/// URL shapes that signal a binary podcast asset.
pub const PODCAST_ASSET_PATTERNS: &[UrlPattern] = &[
    UrlPattern::Contains("/files/"),
    UrlPattern::Contains(".mp3"),
    UrlPattern::Contains(".wav"),
];

/// Versioned build-chunk URL shapes.
pub const BUILD_ARTIFACT_PATTERNS: &[UrlPattern] =
    &[UrlPattern::Contains("/_next/static/")];

/// Request predicate for one route-table row.
#[derive(Debug, Clone, Copy)]
pub enum RoutePredicate {
    /// Method is not a read-only retrieval method.
    NonRetrievalMethod,
    /// URL scheme cannot be fetched or stored (data:, blob:, extensions).
    UnfetchableScheme,
    /// URL matches any pattern in the list.
    UrlMatchesAny(&'static [UrlPattern]),
    /// Request is a top-level page navigation.
    Navigation,
    /// Matches everything.
    Always,
}

impl RoutePredicate {
    fn matches(&self, request: &HttpRequest) -> bool {
        match self {
            RoutePredicate::NonRetrievalMethod => !request.method.is_cacheable(),
            RoutePredicate::UnfetchableScheme => !request.has_fetchable_scheme(),
            RoutePredicate::UrlMatchesAny(patterns) => {
                patterns.iter().any(|p| p.matches(&request.url))
            }
            RoutePredicate::Navigation => request.navigation,
            RoutePredicate::Always => true,
        }
    }
}

/// Ordered classification table. The first matching row wins.
#[derive(Debug)]
pub struct RouteTable {
    rules: Vec<(RoutePredicate, Strategy)>,
}

impl RouteTable {
    /// The standard routing policy. Exclusions outrank asset and build
    /// matches; navigation outranks the catch-all.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                (RoutePredicate::NonRetrievalMethod, Strategy::Bypass),
                (RoutePredicate::UnfetchableScheme, Strategy::Bypass),
                (
                    RoutePredicate::UrlMatchesAny(EXCLUDED_PATTERNS),
                    Strategy::Bypass,
                ),
                (
                    RoutePredicate::UrlMatchesAny(PODCAST_ASSET_PATTERNS),
                    Strategy::PodcastAsset,
                ),
                (
                    RoutePredicate::UrlMatchesAny(BUILD_ARTIFACT_PATTERNS),
                    Strategy::BuildArtifact,
                ),
                (RoutePredicate::Navigation, Strategy::Navigation),
                (RoutePredicate::Always, Strategy::Default),
            ],
        }
    }

    /// Classify a request into its handling strategy.
    pub fn classify(&self, request: &HttpRequest) -> Strategy {
        for (predicate, strategy) in &self.rules {
            if predicate.matches(request) {
                return *strategy;
            }
        }
        // The standard table ends with an Always row; a custom table without
        // one falls through to bypass, the safest behavior.
        Strategy::Bypass
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// Tests
// ============================================================================
