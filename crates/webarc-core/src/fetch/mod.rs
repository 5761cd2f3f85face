//! Blocking HTTP fetching for archive passes.
//!
//! Uses the curl crate (libcurl) for transfers and encoding_rs for body
//! decoding. A session is created per archive pass, threaded explicitly
//! into the resolver, and dropped when the pass ends.

mod parse;

pub use parse::{decode_body, parse_content_type};

use anyhow::{Context, Result};
use std::time::Duration;

/// User-Agent presented by default: a mainstream browser string, so servers
/// return the same markup they serve real browsers.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux i686; rv:111.0) Gecko/20100101 Firefox/111.0";

/// Options applied to every request of one session.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connect-phase timeout.
    pub connect_timeout: Duration,
    /// Redirect hop limit; `None` leaves the library default.
    pub max_redirects: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(100),
            connect_timeout: Duration::from_secs(15),
            max_redirects: None,
        }
    }
}

/// One fetched resource: the decoded text view next to the verbatim bytes.
/// Callers pick whichever representation fits the content type.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Name of the encoding `text` was decoded with (e.g. `UTF-8`).
    pub encoding: String,
    /// Bare media type from `Content-Type`, parameters stripped, lowercase.
    /// Empty when the server sent none.
    pub content_type: String,
    /// Body decoded with the response charset, falling back to UTF-8.
    pub text: String,
    /// Body bytes as received.
    pub bytes: Vec<u8>,
}

/// Fetch capability handed to the resolver. Tests substitute their own.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<FetchedResource>;
}

/// Blocking libcurl-backed session. One Easy handle lives for the whole
/// pass so connections get reused across asset fetches.
pub struct HttpSession {
    easy: curl::easy::Easy,
}

impl HttpSession {
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let mut easy = curl::easy::Easy::new();
        easy.useragent(&options.user_agent)?;
        easy.follow_location(true)?;
        easy.connect_timeout(options.connect_timeout)?;
        easy.timeout(options.timeout)?;
        if let Some(max) = options.max_redirects {
            easy.max_redirections(max)?;
        }
        Ok(HttpSession { easy })
    }
}

impl Fetch for HttpSession {
    fn fetch(&mut self, url: &str) -> Result<FetchedResource> {
        let mut body: Vec<u8> = Vec::new();

        self.easy.url(url).context("invalid URL")?;
        {
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("GET {url} failed"))?;
        }

        let code = self.easy.response_code().context("no response code")?;
        if code < 200 || code >= 300 {
            anyhow::bail!("GET {} returned HTTP {}", url, code);
        }

        let raw_content_type = self
            .easy
            .content_type()
            .context("no content-type info")?
            .unwrap_or("")
            .to_string();
        let (content_type, charset) = parse_content_type(&raw_content_type);
        let (encoding, text) = decode_body(&body, charset.as_deref());

        tracing::debug!(
            url,
            status = code,
            content_type = %content_type,
            bytes = body.len(),
            "fetched"
        );

        Ok(FetchedResource {
            encoding,
            content_type,
            text,
            bytes: body,
        })
    }
}
