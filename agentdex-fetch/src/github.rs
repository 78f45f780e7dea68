//! GitHub contents-API fetcher.
//!
//! For each configured content path of a source the fetcher lists
//! `repos/<owner>/<name>/contents/<path>?ref=<branch>`, keeps file entries with
//! an agent extension and downloads them through their `download_url`.

use std::sync::Arc;
use std::time::Duration;

use agentdex_core::{FetchConfig, RawFile, Source};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::credentials::CredentialProvider;
use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

// ---------------------------------------------------------------------------
// Listing payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// A contents response is an array for directories and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}

/// Branches tried, in order, for a configured branch.
pub fn branch_candidates(configured: &str) -> Vec<String> {
    const TAIL: [&str; 3] = ["develop", "development", "dev"];
    let mut branches = vec![configured.to_string()];
    let fallback = match configured {
        "main" => Some("master"),
        "master" => Some("main"),
        _ => None,
    };
    if let Some(other) = fallback {
        branches.push(other.to_string());
        branches.extend(TAIL.iter().map(|b| b.to_string()));
    }
    branches
}

// ---------------------------------------------------------------------------
// ContentFetcher
// ---------------------------------------------------------------------------

pub struct ContentFetcher {
    transport: Arc<dyn Transport>,
    token: String,
    api_base: String,
    extensions: Vec<String>,
    file_concurrency: usize,
    request_timeout: Duration,
    source_timeout: Duration,
    retry: RetryPolicy,
}

impl ContentFetcher {
    pub fn new(transport: Arc<dyn Transport>, token: impl Into<String>, config: &FetchConfig) -> Self {
        Self {
            transport,
            token: token.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            file_concurrency: config.file_concurrency.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            source_timeout: Duration::from_secs(config.source_timeout_secs),
            retry: RetryPolicy::from(config),
        }
    }

    /// Production fetcher over `reqwest`. A missing token is an auth failure.
    pub fn from_config(
        config: &FetchConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, FetchError> {
        let token = credentials.token().ok_or_else(|| {
            FetchError::Auth(format!("no access token found in ${}", config.token_env))
        })?;
        let transport = ReqwestTransport::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|e| FetchError::Transport {
            url: config.api_base.clone(),
            message: e.to_string(),
        })?;
        Ok(Self::new(Arc::new(transport), token, config))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch every candidate file of `source`, bounded by the source timeout.
    ///
    /// A content path missing on every candidate branch yields zero files.
    pub async fn fetch(&self, source: &Source) -> Result<Vec<RawFile>, FetchError> {
        let id = source.id();
        match tokio::time::timeout(self.source_timeout, self.fetch_source(source)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                what: format!("source {id}"),
                after: self.source_timeout,
            }),
        }
    }

    async fn fetch_source(&self, source: &Source) -> Result<Vec<RawFile>, FetchError> {
        let id = source.id();
        let Some((branch, entries)) = self.resolve_listing(source).await? else {
            info!(source = %id, "no content paths found on any branch");
            return Ok(Vec::new());
        };
        debug!(source = %id, branch = %branch, candidates = entries.len(), "listing resolved");

        let downloads = stream::iter(entries)
            .map(|entry| {
                let branch = branch.as_str();
                let id = &id;
                async move {
                    let Some(url) = entry.download_url.as_deref() else {
                        return Ok(None);
                    };
                    match self.get(url).await {
                        Ok(resp) => Ok(Some(RawFile::new(
                            id.clone(),
                            entry.path.clone(),
                            branch,
                            resp.body,
                        ))),
                        Err(err) if err.is_fatal() => Err(err),
                        Err(err) => {
                            warn!(source = %id, path = %entry.path, error = %err, "skipping file");
                            Ok(None)
                        }
                    }
                }
            })
            .buffered(self.file_concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut files = Vec::new();
        for download in downloads {
            if let Some(file) = download? {
                files.push(file);
            }
        }
        info!(source = %id, branch = %branch, files = files.len(), "fetched source");
        Ok(files)
    }

    /// Try each candidate branch until one has at least one content path.
    async fn resolve_listing(
        &self,
        source: &Source,
    ) -> Result<Option<(String, Vec<ContentEntry>)>, FetchError> {
        for branch in branch_candidates(&source.branch) {
            let mut found_any = false;
            let mut entries: Vec<ContentEntry> = Vec::new();
            for path in &source.paths {
                let url = self.contents_url(source, path, &branch);
                let listing = match self.get(&url).await {
                    Ok(resp) => decode_listing(&url, &resp)?,
                    Err(err) if err.is_not_found() => {
                        debug!(source = %source.id(), branch = %branch, path = %path, "not found");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                found_any = true;
                for entry in self.candidates(listing) {
                    entries.retain(|e| e.path != entry.path);
                    entries.push(entry);
                }
            }
            if found_any {
                if branch != source.branch {
                    info!(source = %source.id(), configured = %source.branch, resolved = %branch, "using fallback branch");
                }
                return Ok(Some((branch, entries)));
            }
        }
        Ok(None)
    }

    fn candidates(&self, listing: Listing) -> Vec<ContentEntry> {
        let entries = match listing {
            Listing::Directory(entries) => entries,
            Listing::File(entry) => vec![entry],
        };
        entries
            .into_iter()
            .filter(|e| e.kind == "file" && self.has_agent_extension(&e.name))
            .collect()
    }

    fn has_agent_extension(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            }
            _ => false,
        }
    }

    fn contents_url(&self, source: &Source, path: &str, branch: &str) -> String {
        let path = path.trim_matches('/');
        let path = if path == "." { "" } else { path };
        if path.is_empty() {
            format!(
                "{}/repos/{}/{}/contents?ref={branch}",
                self.api_base, source.owner, source.name
            )
        } else {
            format!(
                "{}/repos/{}/{}/contents/{path}?ref={branch}",
                self.api_base, source.owner, source.name
            )
        }
    }

    // -----------------------------------------------------------------------
    // Single request with retry
    // -----------------------------------------------------------------------

    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let request = HttpRequest::get(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28");
        self.retry.retry(|| self.attempt(&request)).await
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = &request.url;
        let response = match tokio::time::timeout(self.request_timeout, self.transport.get(request)).await {
            Err(_) | Ok(Err(TransportError::Timeout)) => {
                return Err(FetchError::Timeout {
                    what: format!("GET {url}"),
                    after: self.request_timeout,
                })
            }
            Ok(Err(err)) => {
                return Err(FetchError::Transport {
                    url: url.clone(),
                    message: err.to_string(),
                })
            }
            Ok(Ok(response)) => response,
        };
        check_status(url, response)
    }
}

/// Map an HTTP response onto the fetch error taxonomy.
fn check_status(url: &str, response: HttpResponse) -> Result<HttpResponse, FetchError> {
    if response.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let exhausted = response.header("x-ratelimit-remaining").map(str::trim) == Some("0");

    match response.status {
        401 => Err(FetchError::Auth(format!("GET {url} returned HTTP 401"))),
        429 => Err(FetchError::RateLimited {
            url: url.to_string(),
            retry_after,
        }),
        403 if exhausted || retry_after.is_some() => Err(FetchError::RateLimited {
            url: url.to_string(),
            retry_after,
        }),
        status => Err(FetchError::Http {
            url: url.to_string(),
            status,
        }),
    }
}

fn decode_listing(url: &str, response: &HttpResponse) -> Result<Listing, FetchError> {
    serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
