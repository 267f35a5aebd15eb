use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{effective_date, map, GameProvider};
use crate::clock::Clock;
use crate::error::{FetchError, RateLimitError};
use crate::store::models::Game;

pub const PROVIDER_NAME: &str = "balldontlie";

const PER_PAGE: u32 = 100;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const BODY_EXCERPT_CHARS: usize = 200;

/// Settings for the balldontlie client.
#[derive(Debug, Clone)]
pub struct BallDontLieConfig {
    pub base_url: String,
    /// Requests go out unauthenticated when no key is configured.
    pub api_key: Option<String>,
    /// Timezone used to resolve "today" when the caller passes none.
    pub default_timezone: String,
    /// Upper bound on pages fetched per call, whatever the upstream claims
    /// its total page count is.
    pub max_pages: u32,
}

/// Game provider backed by the balldontlie NBA statistics API.
/// Docs: <https://docs.balldontlie.io>
pub struct BallDontLie {
    http: Client,
    config: BallDontLieConfig,
    clock: Arc<dyn Clock>,
}

// ── wire shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GamesPage {
    pub data: Vec<GameRow>,
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct GameRow {
    pub id: u64,
    pub date: String,
    pub status: String,
    pub home_team: TeamRow,
    pub visitor_team: TeamRow,
    #[serde(default)]
    pub home_team_score: i64,
    #[serde(default)]
    pub visitor_team_score: i64,
    pub season: i64,
    #[serde(default)]
    pub period: i64,
    #[serde(default)]
    pub postseason: bool,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRow {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub division: String,
}

impl BallDontLie {
    pub fn new(config: BallDontLieConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(BallDontLie {
            http,
            config,
            clock,
        })
    }

    /// Fetch one page, classifying the response: throttling (429/503) becomes
    /// a typed `RateLimitError`, other non-2xx an `Upstream` error with a body
    /// excerpt, and a 2xx body that fails to parse a `Decode` error.
    async fn fetch_page(&self, date: &str, page: u32) -> Result<GamesPage, FetchError> {
        let url = format!("{}/games", self.config.base_url);
        let mut request = self.http.get(&url).query(&[
            ("per_page", PER_PAGE.to_string()),
            ("dates[]", date.to_string()),
            ("page", page.to_string()),
        ]);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let resp = request.send().await?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(rate_limit_error(status, resp.headers(), self.clock.now()).into());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        // Read the body as text first so a malformed payload surfaces as a
        // decode failure rather than a transport one.
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(FetchError::Decode)
    }
}

#[async_trait]
impl GameProvider for BallDontLie {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn resolve_date(&self, date: Option<&str>, timezone: Option<&str>) -> String {
        effective_date(
            self.clock.as_ref(),
            date,
            timezone,
            &self.config.default_timezone,
        )
    }

    /// Page sequentially from page 1 until the upstream-reported total or the
    /// configured cap is exhausted, whichever comes first. Results keep page
    /// order and in-page order; any classified failure discards everything,
    /// no partial results.
    async fn fetch_games(
        &self,
        date: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<Vec<Game>, FetchError> {
        let date = self.resolve_date(date, timezone);
        debug!("Fetching games for {}", date);

        let mut games: Vec<Game> = Vec::new();
        let mut page = 1u32;
        loop {
            let batch = self.fetch_page(&date, page).await?;
            let last_page = batch.meta.total_pages.min(self.config.max_pages).max(1);
            games.extend(batch.data.iter().map(|row| map::map_game(PROVIDER_NAME, row)));
            if page >= last_page {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} games for {} across {} page(s)", games.len(), date, page);
        Ok(games)
    }
}

fn rate_limit_error(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> RateLimitError {
    let retry_after = parse_retry_after(
        headers.get("Retry-After").and_then(|v| v.to_str().ok()),
        now,
    );
    let remaining = headers
        .get("X-Rate-Limit-Remaining")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    RateLimitError {
        status: status.as_u16(),
        retry_after,
        remaining,
        message: format!("upstream throttled the request, retry after {:?}", retry_after),
    }
}

/// Parse a `Retry-After` value: integer seconds first, then an HTTP-date
/// relative to `now`. Past dates, garbage and absence all come out as zero.
fn parse_retry_after(raw: Option<&str>, now: DateTime<Utc>) -> Duration {
    let Some(raw) = raw else {
        return Duration::ZERO;
    };
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Duration::from_secs(secs);
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(raw) {
        return (at.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or(Duration::ZERO);
    }
    Duration::ZERO
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use mockito::{Matcher, Server, ServerGuard};

    fn clock_at(y: i32, mo: u32, d: u32, h: u32) -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap())
    }

    fn provider(server: &ServerGuard, api_key: Option<&str>, max_pages: u32, clock: FixedClock) -> BallDontLie {
        BallDontLie::new(
            BallDontLieConfig {
                base_url: server.url(),
                api_key: api_key.map(str::to_string),
                default_timezone: "America/New_York".to_string(),
                max_pages,
            },
            Arc::new(clock),
        )
        .unwrap()
    }

    fn game_json(id: u64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "date": "2024-01-15T00:00:00.000Z",
            "status": "Final",
            "home_team": {
                "id": 1, "name": "Celtics", "full_name": "Boston Celtics",
                "abbreviation": "BOS", "city": "Boston",
                "conference": "East", "division": "Atlantic"
            },
            "visitor_team": {
                "id": 2, "name": "Knicks", "full_name": "New York Knicks",
                "abbreviation": "NYK", "city": "New York",
                "conference": "East", "division": "Atlantic"
            },
            "home_team_score": 110,
            "visitor_team_score": 102,
            "season": 2023,
            "period": 4,
            "postseason": false,
            "time": "Final"
        })
    }

    fn page_body(ids: &[u64], total_pages: u32) -> String {
        serde_json::json!({
            "data": ids.iter().map(|id| game_json(*id)).collect::<Vec<_>>(),
            "meta": { "total_pages": total_pages }
        })
        .to_string()
    }

    #[tokio::test]
    async fn paginates_until_reported_total() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for page in 1..=3u32 {
            let ids = [page as u64 * 10, page as u64 * 10 + 1];
            let mock = server
                .mock("GET", "/games")
                .match_query(Matcher::UrlEncoded("page".into(), page.to_string()))
                .with_status(200)
                .with_body(page_body(&ids, 3))
                .expect(1)
                .create_async()
                .await;
            mocks.push(mock);
        }

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        let games = provider.fetch_games(Some("2024-01-15"), None).await.unwrap();

        // All pages concatenated in page order, in-page order preserved.
        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "balldontlie-10",
                "balldontlie-11",
                "balldontlie-20",
                "balldontlie-21",
                "balldontlie-30",
                "balldontlie-31"
            ]
        );
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn page_cap_bounds_request_volume() {
        let mut server = Server::new_async().await;
        // Upstream claims 10 pages; the cap of 1 means exactly one request.
        let mock = server
            .mock("GET", "/games")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(page_body(&[1, 2], 10))
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server, None, 1, clock_at(2024, 1, 15, 12));
        let games = provider.fetch_games(Some("2024-01-15"), None).await.unwrap();

        assert_eq!(games.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn explicit_date_wins_over_clock() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/games")
            .match_query(Matcher::UrlEncoded("dates[]".into(), "2023-12-25".into()))
            .with_status(200)
            .with_body(page_body(&[1], 1))
            .create_async()
            .await;

        // Clock says March 2024; the explicit date must be used verbatim.
        let provider = provider(&server, None, 10, clock_at(2024, 3, 2, 12));
        provider
            .fetch_games(Some("2023-12-25"), Some("Asia/Tokyo"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn resolves_today_in_default_timezone() {
        let mut server = Server::new_async().await;
        // 03:00 UTC Jan 15 is Jan 14 in the default America/New_York.
        let mock = server
            .mock("GET", "/games")
            .match_query(Matcher::UrlEncoded("dates[]".into(), "2024-01-14".into()))
            .with_status(200)
            .with_body(page_body(&[1], 1))
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 3));
        provider.fetch_games(None, None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bearer_header_sent_only_when_key_configured() {
        let mut server = Server::new_async().await;
        let with_key = server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(page_body(&[1], 1))
            .create_async()
            .await;

        let provider_with_key = provider(&server, Some("test-key"), 10, clock_at(2024, 1, 15, 12));
        provider_with_key
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap();
        with_key.assert_async().await;

        let without_key = server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(page_body(&[1], 1))
            .create_async()
            .await;

        let provider_without_key = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        provider_without_key
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap();
        without_key.assert_async().await;
    }

    #[tokio::test]
    async fn status_429_is_a_rate_limit_with_parsed_headers() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("Retry-After", "15")
            .with_header("X-Rate-Limit-Remaining", "0")
            .with_body("slow down")
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        let err = provider
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap_err();

        match err {
            FetchError::RateLimited(e) => {
                assert_eq!(e.status, 429);
                assert_eq!(e.retry_after, Duration::from_secs(15));
                assert_eq!(e.remaining.as_deref(), Some("0"));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_503_is_a_rate_limit_with_zero_hint_when_headers_missing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        let err = provider
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap_err();

        match err {
            FetchError::RateLimited(e) => {
                assert_eq!(e.status, 503);
                assert_eq!(e.retry_after, Duration::ZERO);
                assert!(e.remaining.is_none());
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retry_after_http_date_is_relative_to_the_clock() {
        let clock = clock_at(2024, 1, 15, 12);
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header(
                "Retry-After",
                &(clock.0 + chrono::Duration::seconds(90)).to_rfc2822(),
            )
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock);
        let err = provider
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap_err();

        match err {
            FetchError::RateLimited(e) => {
                assert!(
                    e.retry_after >= Duration::from_secs(80) && e.retry_after <= Duration::from_secs(95),
                    "retry_after was {:?}",
                    e.retry_after
                );
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_on_a_later_page_discards_earlier_results() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(page_body(&[1], 2))
            .create_async()
            .await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(429)
            .with_header("Retry-After", "5")
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        let result = provider.fetch_games(Some("2024-01-15"), None).await;
        assert!(matches!(result, Err(FetchError::RateLimited(_))));
    }

    #[tokio::test]
    async fn other_non_2xx_is_an_upstream_error_with_body_excerpt() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        let err = provider
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap_err();

        match err {
            FetchError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/games")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let provider = provider(&server, None, 10, clock_at(2024, 1, 15, 12));
        let err = provider
            .fetch_games(Some("2024-01-15"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn retry_after_parsing_edge_cases() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(parse_retry_after(None, now), Duration::ZERO);
        assert_eq!(parse_retry_after(Some("15"), now), Duration::from_secs(15));
        assert_eq!(parse_retry_after(Some(" 7 "), now), Duration::from_secs(7));
        assert_eq!(parse_retry_after(Some("garbage"), now), Duration::ZERO);
        // A date in the past clamps to zero, never negative.
        let past = (now - chrono::Duration::seconds(30)).to_rfc2822();
        assert_eq!(parse_retry_after(Some(&past), now), Duration::ZERO);
        let future = (now + chrono::Duration::seconds(60)).to_rfc2822();
        assert_eq!(parse_retry_after(Some(&future), now), Duration::from_secs(60));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.len() < 250);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }
}
