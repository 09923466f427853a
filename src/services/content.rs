//! Portfolio content loading.
//!
//! Documents come either from the CMS HTTP query API ([`SanityClient`]) or
//! from a local YAML catalog ([`CatalogFile`]). Both produce raw
//! [`PortfolioDocument`]s which are validated against the portfolio schema
//! and mapped into display-ordered [`PortfolioImage`]s by
//! [`build_portfolio`].
//!
//! Loading never fails from the caller's point of view: [`fetch_portfolio`]
//! logs any error and returns an empty list.

use crate::models::{Category, ContentSettings, PortfolioImage};
use crate::services::asset_url::{AssetRefError, ImageUrlBuilder};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// GROQ query for all portfolio documents ordered by slider position.
pub const PORTFOLIO_QUERY: &str = r#"*[_type == "portfolio"] | order(position asc) {
  _id,
  title,
  category,
  position,
  image
}"#;

/// Errors that can occur while loading portfolio content
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content API answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse query response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to parse catalog: {0}")]
    Catalog(#[from] serde_yaml_ng::Error),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("No project id configured")]
    NotConfigured,

    #[error("Invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Image field of a portfolio document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageField {
    #[serde(default)]
    pub asset: Option<AssetReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// A portfolio document as stored in the CMS or the catalog.
///
/// Every schema field is optional here so one broken document can be skipped
/// without rejecting the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDocument {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub image: Option<ImageField>,
    /// Direct image location, used by local catalogs instead of `image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl PortfolioDocument {
    /// Check the document against the portfolio schema and map it.
    ///
    /// Returns the slider position together with the image.
    pub fn validate(
        &self,
        urls: &ImageUrlBuilder,
    ) -> Result<(u32, PortfolioImage), ContentError> {
        let invalid = |reason: String| ContentError::InvalidDocument {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("missing id".to_string()));
        }

        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("title is required".to_string()))?;

        let category = match self.category.as_deref() {
            Some("photography") => Category::Photography,
            Some("graphic-design") => Category::GraphicDesign,
            Some(other) => return Err(invalid(format!("unknown category {other:?}"))),
            None => return Err(invalid("category is required".to_string())),
        };

        let position = match self.position {
            Some(p) if p.fract() == 0.0 && p >= 1.0 && p <= u32::MAX as f64 => p as u32,
            Some(p) => return Err(invalid(format!("position {p} must be an integer >= 1"))),
            None => return Err(invalid("position is required".to_string())),
        };

        let src = match (&self.src, &self.image) {
            (Some(src), _) if !src.trim().is_empty() => src.trim().to_string(),
            (_, Some(ImageField { asset: Some(asset) })) => urls
                .url_for_ref(&asset.reference)
                .map_err(|e: AssetRefError| invalid(e.to_string()))?,
            _ => return Err(invalid("image is required".to_string())),
        };

        Ok((
            position,
            PortfolioImage::new(self.id.clone(), title, category, src),
        ))
    }
}

/// A place portfolio documents can be fetched from.
pub trait ContentSource: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    fn fetch_documents(
        &self,
    ) -> impl Future<Output = Result<Vec<PortfolioDocument>, ContentError>> + Send;
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

/// Client for the CMS HTTP query API.
pub struct SanityClient {
    client: reqwest::Client,
    query_url: String,
}

impl SanityClient {
    pub fn new(settings: &ContentSettings) -> Result<Self, ContentError> {
        if settings.project_id.trim().is_empty() {
            return Err(ContentError::NotConfigured);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            query_url: Self::query_url(settings),
        })
    }

    /// `https://<project>.api.sanity.io/v<version>/data/query/<dataset>`
    pub fn query_url(settings: &ContentSettings) -> String {
        let host = if settings.use_cdn { "apicdn" } else { "api" };
        format!(
            "https://{}.{}.sanity.io/v{}/data/query/{}",
            settings.project_id,
            host,
            settings.api_version.trim_start_matches('v'),
            settings.dataset
        )
    }
}

impl ContentSource for SanityClient {
    fn name(&self) -> &str {
        "content API"
    }

    async fn fetch_documents(&self) -> Result<Vec<PortfolioDocument>, ContentError> {
        tracing::debug!("Querying {}", self.query_url);
        let response = self
            .client
            .get(&self.query_url)
            .query(&[("query", PORTFOLIO_QUERY)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: self.query_url.clone(),
            });
        }

        let body = response.bytes().await?;
        parse_query_response(&body)
    }
}

/// Parse a `{ "result": [...] }` body, skipping documents of the wrong shape.
pub fn parse_query_response(body: &[u8]) -> Result<Vec<PortfolioDocument>, ContentError> {
    let response: QueryResponse = serde_json::from_slice(body)?;
    let total = response.result.len();

    let documents: Vec<PortfolioDocument> = response
        .result
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Skipping malformed portfolio document: {}", e);
                None
            }
        })
        .collect();

    tracing::debug!("Query returned {} of {} usable documents", documents.len(), total);
    Ok(documents)
}

/// A local YAML catalog of portfolio documents.
pub struct CatalogFile {
    path: Utf8PathBuf,
}

impl CatalogFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ContentSource for CatalogFile {
    fn name(&self) -> &str {
        self.path.as_str()
    }

    async fn fetch_documents(&self) -> Result<Vec<PortfolioDocument>, ContentError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        parse_catalog(&contents)
    }
}

/// Parse a YAML list of portfolio documents, skipping entries of the wrong shape.
pub fn parse_catalog(contents: &str) -> Result<Vec<PortfolioDocument>, ContentError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<serde_yaml_ng::Value> = serde_yaml_ng::from_str(contents)?;
    let total = entries.len();

    let documents: Vec<PortfolioDocument> = entries
        .into_iter()
        .filter_map(|value| match serde_yaml_ng::from_value(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Skipping malformed catalog entry: {}", e);
                None
            }
        })
        .collect();

    tracing::debug!("Catalog has {} of {} usable entries", documents.len(), total);
    Ok(documents)
}

/// Validate documents and order them by slider position.
///
/// Invalid and duplicate documents are skipped with a warning. Documents
/// sharing a position keep their input order.
pub fn build_portfolio(
    documents: Vec<PortfolioDocument>,
    urls: &ImageUrlBuilder,
) -> Vec<PortfolioImage> {
    let mut seen = HashSet::new();
    let mut entries: Vec<(u32, PortfolioImage)> = documents
        .iter()
        .filter_map(|doc| match doc.validate(urls) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .filter(|(_, image)| {
            let fresh = seen.insert(image.id.clone());
            if !fresh {
                tracing::warn!("Skipping duplicate portfolio document {}", image.id);
            }
            fresh
        })
        .collect();

    entries.sort_by_key(|(position, _)| *position);
    entries.into_iter().map(|(_, image)| image).collect()
}

/// Fetch, validate and order the portfolio. Errors yield an empty list.
pub async fn fetch_portfolio<S: ContentSource>(
    source: &S,
    urls: &ImageUrlBuilder,
) -> Vec<PortfolioImage> {
    match source.fetch_documents().await {
        Ok(documents) => {
            let images = build_portfolio(documents, urls);
            tracing::info!("Loaded {} portfolio images from {}", images.len(), source.name());
            images
        }
        Err(e) => {
            tracing::error!("Error fetching portfolio images from {}: {}", source.name(), e);
            Vec::new()
        }
    }
}
