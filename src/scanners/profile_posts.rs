// Recent posts for a social handle.
//
// The analyzer only sees the `PostSource` trait. The shipped implementation
// reads a server-rendered public profile mirror (Nitter markup) so no browser
// process is needed; the response is owned by a single call and dropped on
// every return path.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::{info, warn};
use regex::{Captures, Regex};
use reqwest::{Client, StatusCode};
use std::sync::OnceLock;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::PostRecord;

const SERVICE: &str = "profile mirror";

#[async_trait]
pub trait PostSource: Send + Sync {
    /// Newest-first posts for `handle`, at most `limit` of them.
    async fn fetch_recent_posts(&self, handle: &str, limit: usize) -> AnalyzerResult<Vec<PostRecord>>;
}

pub struct ProfileScraper {
    client: Client,
    mirror_url: String,
}

impl ProfileScraper {
    pub fn new(client: Client, mirror_url: &str) -> Self {
        Self {
            client,
            mirror_url: mirror_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PostSource for ProfileScraper {
    async fn fetch_recent_posts(&self, handle: &str, limit: usize) -> AnalyzerResult<Vec<PostRecord>> {
        if !handle_re().is_match(handle) {
            warn!("Refusing to fetch posts for malformed handle {:?}", handle);
            return Err(AnalyzerError::NoData(format!("invalid handle {:?}", handle)));
        }

        let url = format!("{}/{}", self.mirror_url, handle);
        info!("🐦 Fetching recent posts for @{}", handle);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(AnalyzerError::NoData(format!("account @{} not found", handle)));
            }
            status if !status.is_success() => {
                return Err(AnalyzerError::Upstream { service: SERVICE, status });
            }
            _ => {}
        }

        let html = response.text().await?;
        let posts = parse_timeline(&html, limit);

        if posts.is_empty() {
            warn!("No posts found on the timeline of @{}", handle);
            return Err(AnalyzerError::NoData(format!("no posts for @{}", handle)));
        }

        info!("📝 Read {} posts from @{}", posts.len(), handle);
        Ok(posts)
    }
}

/// Account handles: letters, digits and underscores, at most 15 chars.
fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("static regex"))
}

fn content_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<div class="tweet-content[^"]*"[^>]*>(.*?)</div>"#).expect("static regex")
    })
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<a [^>]*?href="(https?://[^"]+)""#).expect("static regex"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)class="tweet-date"[^>]*>\s*<a [^>]*?title="([^"]+)""#).expect("static regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|quot|apos|amp|lt|gt|nbsp);").expect("static regex")
    })
}

/// Pull post text, outbound links and timestamps out of a timeline page.
/// Pinned posts are skipped so the result stays newest-first.
pub(crate) fn parse_timeline(html: &str, limit: usize) -> Vec<PostRecord> {
    html.split(r#"class="timeline-item"#)
        .skip(1)
        .filter(|item| !item.contains(r#"class="pinned""#))
        .filter_map(parse_item)
        .take(limit)
        .collect()
}

fn parse_item(item: &str) -> Option<PostRecord> {
    let content = content_re().captures(item)?.get(1)?.as_str();

    let links = href_re()
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()))
        .collect();

    let text = decode_entities(&tag_re().replace_all(content, ""));
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let date = date_re()
        .captures(item)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_post_date(m.as_str()));

    Some(PostRecord::new(text, links, date))
}

/// Mirror titles look like `Apr 13, 2023 · 12:01 PM UTC`.
fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = decode_entities(raw).replace('·', " ");
    let cleaned = cleaned.trim().trim_end_matches("UTC").split_whitespace().collect::<Vec<_>>().join(" ");

    NaiveDateTime::parse_from_str(&cleaned, "%b %d, %Y %I:%M %p")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Single pass, so `&amp;lt;` stays `&lt;`. Unknown or invalid references
/// are left as written.
fn decode_entities(raw: &str) -> String {
    entity_re()
        .replace_all(raw, |caps: &Captures| {
            let decoded = match &caps[1] {
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "nbsp" => Some(' '),
                numeric => numeric_entity(numeric),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
