//! HTTP transport and the fetch orchestrator.
//!
//! The orchestrator runs the full lookup sequence per attempt:
//! 1. GET the results page and discover its form
//! 2. POST the roll number through the discovered form
//! 3. Fall back to GET with each candidate query parameter
//!
//! Transport failures are retried with exponential backoff; "not found" and
//! format failures are final and returned immediately.

use super::document::Document;
use super::error::ExtractorError;
use super::extract;
use super::form;
use super::rate_limit::RateLimiter;
use super::types::{Extraction, ExtractionOutcome, FetchResult, RollNumber, TransportStatus};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Default results endpoint, overridable via configuration.
const DEFAULT_RESULTS_URL: &str = "https://vishnu.edu.in/Results.php";

/// Query parameter names tried for the GET fallback, in order.
const QUERY_PARAM_CANDIDATES: &[&str] =
    &["rollno", "regno", "htno", "rollnumber", "roll", "hallticket"];

/// One outbound request, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Get {
        url: Url,
    },
    PostForm {
        url: Url,
        fields: Vec<(String, String)>,
    },
}

/// Issues HTTP requests. The trait seam exists so the orchestrator can be
/// tested against a scripted transport with no network.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch(&self, request: FetchRequest) -> FetchResult;
}

/// Configuration for the fetch orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// The results endpoint (page fetch, GET fallback, form-action fallback)
    pub results_url: Url,
    /// Browser-like user agent (anti-blocking heuristic, not correctness)
    pub user_agent: String,
    /// Connect timeout per request
    pub connect_timeout: Duration,
    /// Total timeout per request
    pub request_timeout: Duration,
    /// Maximum number of full fetch attempts
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts
    pub backoff_base: Duration,
    /// Upper bound on a single backoff delay
    pub backoff_cap: Duration,
    /// Minimum gap between outbound requests, across all users
    pub min_request_gap: Duration,
    /// Query parameter names for the GET fallback
    pub query_param_candidates: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            results_url: Url::parse(DEFAULT_RESULTS_URL).unwrap(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(10),
            min_request_gap: Duration::from_secs(1),
            query_param_candidates: QUERY_PARAM_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Real transport over `reqwest`, with cookies and browser-like headers.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &OrchestratorConfig) -> Result<Self, ExtractorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExtractorError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    /// Transport trouble never surfaces as `Err`; it is encoded in the
    /// returned status so the orchestrator can classify it.
    async fn fetch(&self, request: FetchRequest) -> FetchResult {
        let builder = match request {
            FetchRequest::Get { url } => self.client.get(url),
            FetchRequest::PostForm { url, fields } => self.client.post(url).form(&fields),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return FetchResult::failed(TransportStatus::Timeout),
            Err(_) => return FetchResult::failed(TransportStatus::NetworkError),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResult::failed(TransportStatus::BadStatus(status.as_u16()));
        }

        match response.text().await {
            Ok(html) => FetchResult::ok(status.as_u16(), html),
            Err(err) if err.is_timeout() => FetchResult::failed(TransportStatus::Timeout),
            Err(_) => FetchResult::failed(TransportStatus::NetworkError),
        }
    }
}

/// Runs the full validate / rate-limit / fetch / extract / retry sequence.
pub struct FetchOrchestrator<T> {
    transport: T,
    config: OrchestratorConfig,
    rate_limiter: RateLimiter,
}

impl<T: Transport> FetchOrchestrator<T> {
    pub fn new(transport: T, config: OrchestratorConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.min_request_gap);
        Self {
            transport,
            config,
            rate_limiter,
        }
    }

    /// Main entry point: looks up the CGPA for a raw roll-number string.
    ///
    /// Validation failures return immediately without touching the network.
    /// Transport failures are retried up to the attempt ceiling with
    /// exponential backoff; everything else is final. All errors come back
    /// as a failure outcome with a user-facing message, never as a panic or
    /// a propagated fault.
    pub async fn get_cgpa(&self, input: &str) -> ExtractionOutcome {
        let roll = match RollNumber::parse(input) {
            Ok(roll) => roll,
            Err(err) => return ExtractionOutcome::failure(err.user_message()),
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            info!(roll = %roll, attempt, "starting fetch attempt");

            match self.run_attempt(&roll).await {
                Ok(extraction) => {
                    info!(roll = %roll, attempt, cgpa = %extraction.cgpa, "lookup succeeded");
                    return ExtractionOutcome::from_extraction(extraction, &roll);
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        roll = %roll,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(roll = %roll, attempt, error = %err, "lookup failed");
                    return ExtractionOutcome::failure(err.user_message());
                }
            }
        }
    }

    /// One full attempt: form path first, then the GET fallback chain.
    async fn run_attempt(&self, roll: &RollNumber) -> Result<Extraction, ExtractorError> {
        let mut saw_format = false;
        let mut last_transport: Option<ExtractorError> = None;

        // Form path: fetch the results page and replay its form via POST.
        self.rate_limiter.acquire().await;
        let page = self
            .transport
            .fetch(FetchRequest::Get {
                url: self.config.results_url.clone(),
            })
            .await;

        match page.html_if_ok() {
            Some(html) => {
                // Scoped so the parsed document (not `Send`) is dropped
                // before the awaits below; the future must stay `Send`.
                let submission = {
                    let doc = Document::parse(html);
                    form::discover(&doc, &self.config.results_url, &self.config.results_url)
                };
                if let Some(submission) = submission {
                    self.rate_limiter.acquire().await;
                    let response = self
                        .transport
                        .fetch(FetchRequest::PostForm {
                            url: submission.action.clone(),
                            fields: submission.form_fields(roll),
                        })
                        .await;
                    match self.try_extract(&response, roll) {
                        Ok(extraction) => return Ok(extraction),
                        Err(err @ ExtractorError::NotFound { .. }) => return Err(err),
                        Err(ExtractorError::Format) => saw_format = true,
                        Err(err) => last_transport = Some(err),
                    }
                }
            }
            None => {
                last_transport = Some(ExtractorError::Transport {
                    message: page.status.to_string(),
                });
            }
        }

        // GET fallback: substitute the roll number into each candidate
        // query parameter, first successful extraction wins.
        for param in &self.config.query_param_candidates {
            let mut url = self.config.results_url.clone();
            url.query_pairs_mut().append_pair(param, roll.as_str());

            self.rate_limiter.acquire().await;
            let response = self.transport.fetch(FetchRequest::Get { url }).await;
            match self.try_extract(&response, roll) {
                Ok(extraction) => return Ok(extraction),
                Err(err @ ExtractorError::NotFound { .. }) => return Err(err),
                Err(ExtractorError::Format) => saw_format = true,
                Err(err) => last_transport = Some(err),
            }
        }

        // Transport trouble wins the classification: a retry could still
        // help there, while a format mismatch is static.
        if let Some(err) = last_transport {
            Err(err)
        } else if saw_format {
            Err(ExtractorError::Format)
        } else {
            Err(ExtractorError::Transport {
                message: "no submission path produced a response".to_string(),
            })
        }
    }

    fn try_extract(
        &self,
        response: &FetchResult,
        roll: &RollNumber,
    ) -> Result<Extraction, ExtractorError> {
        match response.html_if_ok() {
            Some(html) => extract::extract(&Document::parse(html), roll),
            None => Err(ExtractorError::Transport {
                message: response.status.to_string(),
            }),
        }
    }

    /// Exponential backoff with jitter, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base.as_millis() as u64;
        let exponential = base.saturating_mul(2u64.pow(attempt.saturating_sub(1).min(5)));
        let capped = exponential.min(self.config.backoff_cap.as_millis() as u64);
        // Jitter: 0-20% of the delay
        let jitter = rand::thread_rng().gen_range(0..=(capped / 5));
        Duration::from_millis(capped + jitter)
    }
}
