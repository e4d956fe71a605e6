//! Yahoo Finance quote provider.
//!
//! Fetches the latest quote and daily bars from Yahoo's v8 chart API in one
//! request. Yahoo has no official API and is subject to unannounced format
//! changes, so every missing field is reported as a typed failure rather
//! than trusted.

use super::provider::{FetchError, QuoteProvider, QuoteRequest, RawBar, RawQuote};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_volume: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance quote provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Use a preconfigured client (proxy settings, TLS roots, user agent).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different chart endpoint (proxies, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Calendar window wide enough to contain `lookback_days` trading days.
    fn lookback_window(lookback_days: u32, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        let calendar_days = i64::from(lookback_days) * 7 / 5 + 14;
        (end - ChronoDuration::days(calendar_days), end)
    }

    /// Build the chart API URL for a symbol and date range.
    ///
    /// The symbol is percent-encoded as one path segment. Directory notation
    /// for preferreds and units (`ABR$D`, `ACAHU.U`) differs from Yahoo's, so
    /// such symbols normally come back as NotFound.
    fn chart_url(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<reqwest::Url, FetchError> {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + ChronoDuration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            FetchError::Transport(format!("invalid chart base URL {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::Transport(format!("chart base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d")
            .append_pair("includeAdjustedClose", "false");
        Ok(url)
    }

    /// Parse the chart API response into a RawQuote.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<RawQuote, FetchError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => FetchError::not_found(symbol),
            Some(err) => FetchError::MalformedResponse(format!("{}: {}", err.code, err.description)),
            None => FetchError::MalformedResponse("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::not_found(symbol))?;

        let price = data
            .meta
            .regular_market_price
            .ok_or_else(|| FetchError::MalformedResponse("missing regularMarketPrice".into()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data.indicators.quote.into_iter().next();

        let mut bars = Vec::with_capacity(timestamps.len());
        if let Some(quote) = quote {
            for (i, &ts) in timestamps.iter().enumerate() {
                let date = chrono::DateTime::from_timestamp(ts, 0)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| {
                        FetchError::MalformedResponse(format!("invalid timestamp: {ts}"))
                    })?;

                let bar = RawBar {
                    date,
                    open: quote.open.get(i).copied().flatten(),
                    high: quote.high.get(i).copied().flatten(),
                    low: quote.low.get(i).copied().flatten(),
                    close: quote.close.get(i).copied().flatten(),
                    volume: quote.volume.get(i).copied().flatten(),
                };

                // Skip bars where all OHLCV are None (holidays/non-trading days)
                if bar.open.is_none()
                    && bar.high.is_none()
                    && bar.low.is_none()
                    && bar.close.is_none()
                    && bar.volume.is_none()
                {
                    continue;
                }
                bars.push(bar);
            }
        }

        if bars.is_empty() {
            return Err(FetchError::not_found(symbol));
        }

        Ok(RawQuote {
            symbol: symbol.to_string(),
            price,
            volume: data.meta.regular_market_volume,
            bars,
        })
    }

    fn classify(err: reqwest::Error, request: &QuoteRequest<'_>) -> FetchError {
        if err.is_timeout() {
            FetchError::timeout(request.timeout)
        } else if err.is_decode() {
            FetchError::MalformedResponse(format!(
                "failed to parse response for {}: {err}",
                request.symbol
            ))
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl QuoteProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn quote_and_history(&self, request: &QuoteRequest<'_>) -> Result<RawQuote, FetchError> {
        let (start, end) = Self::lookback_window(request.lookback_days, Utc::now().date_naive());
        let url = self.chart_url(request.symbol, start, end)?;

        // The response (and its connection) is dropped on every return path.
        let resp = self
            .client
            .get(url)
            .timeout(request.timeout)
            .send()
            .map_err(|e| Self::classify(e, request))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::not_found(request.symbol));
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "HTTP {status} for {}",
                request.symbol
            )));
        }

        let chart: ChartResponse = resp.json().map_err(|e| Self::classify(e, request))?;
        Self::parse_response(request.symbol, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(symbol: &str, json: &str) -> Result<RawQuote, FetchError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response(symbol, resp)
    }

    const OK_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "regularMarketPrice": 231.5, "regularMarketVolume": 51234000},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {"quote": [{
                    "open":   [187.15, 184.22, null],
                    "high":   [188.44, 185.88, null],
                    "low":    [183.89, 183.43, null],
                    "close":  [185.64, 184.25, null],
                    "volume": [82488700, 58414500, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_price_volume_and_bars() {
        let quote = parse("AAPL", OK_BODY).unwrap();
        assert_eq!(quote.price, 231.5);
        assert_eq!(quote.volume, Some(51_234_000));
        // The all-null third bar is dropped
        assert_eq!(quote.bars.len(), 2);
        assert_eq!(quote.bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(quote.bars[1].close, Some(184.25));
    }

    #[test]
    fn not_found_error_maps_to_not_found() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        assert_eq!(parse("ZZZZINVALID", body), Err(FetchError::not_found("ZZZZINVALID")));
    }

    #[test]
    fn other_error_is_malformed() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        assert!(matches!(parse("X", body), Err(FetchError::MalformedResponse(_))));
    }

    #[test]
    fn missing_price_is_malformed() {
        let body = r#"{"chart": {"result": [{"meta": {}, "timestamp": [1704205800],
            "indicators": {"quote": [{"close": [1.0]}]}}], "error": null}}"#;
        match parse("X", body) {
            Err(FetchError::MalformedResponse(msg)) => assert!(msg.contains("regularMarketPrice")),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn no_bars_is_not_found() {
        let body = r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 1.0},
            "indicators": {"quote": [{}]}}], "error": null}}"#;
        assert_eq!(parse("X", body), Err(FetchError::not_found("X")));
    }

    #[test]
    fn lookback_window_covers_trading_days() {
        let end = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let (start, e) = YahooProvider::lookback_window(50, end);
        assert_eq!(e, end);
        assert_eq!((end - start).num_days(), 84);
    }

    #[test]
    fn chart_url_has_period_bounds() {
        let provider = YahooProvider::new(DEFAULT_USER_AGENT)
            .unwrap()
            .with_base_url("http://localhost:9/chart/");
        let url = provider
            .chart_url(
                "MSFT",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9/chart/MSFT?period1=1704067200&period2=1704240000&interval=1d&includeAdjustedClose=false"
        );
    }

    #[test]
    fn chart_url_encodes_symbol_as_one_segment() {
        let provider = YahooProvider::new(DEFAULT_USER_AGENT)
            .unwrap()
            .with_base_url("http://localhost:9/chart");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let url = provider.chart_url("AB/C#D?E F", day, day).unwrap();

        assert_eq!(url.path(), "/chart/AB%2FC%23D%3FE%20F");
        assert_eq!(url.path_segments().unwrap().count(), 2);
        assert!(url.query().unwrap().starts_with("period1="));
    }

    #[test]
    fn invalid_base_url_is_transport_error() {
        let provider = YahooProvider::new(DEFAULT_USER_AGENT)
            .unwrap()
            .with_base_url("not a url");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            provider.chart_url("MSFT", day, day),
            Err(FetchError::Transport(_))
        ));
    }

    // ── HTTP status and transport classification ─────────────────────

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    /// Accepts connections on a loopback port and answers each with
    /// `response`; `None` keeps the connection open without answering.
    fn serve(response: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                // Drain the request head so closing does not reset the socket
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                match &response {
                    Some(r) => {
                        let _ = stream.write_all(r.as_bytes());
                    }
                    None => std::thread::sleep(Duration::from_secs(3)),
                }
            }
        });
        format!("http://{addr}/v8/finance/chart")
    }

    fn http(status: &str, body: &str) -> Option<String> {
        Some(format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
    }

    fn local_provider(base_url: String) -> YahooProvider {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .unwrap();
        YahooProvider::with_client(client).with_base_url(base_url)
    }

    fn fetch(base_url: String, timeout: Duration) -> Result<RawQuote, FetchError> {
        let request = QuoteRequest {
            symbol: "AAPL",
            lookback_days: 60,
            timeout,
        };
        local_provider(base_url).quote_and_history(&request)
    }

    #[test]
    fn http_200_is_parsed() {
        let quote = fetch(serve(http("200 OK", OK_BODY)), Duration::from_secs(5)).unwrap();
        assert_eq!(quote.price, 231.5);
        assert_eq!(quote.bars.len(), 2);
    }

    #[test]
    fn http_404_is_not_found() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let err = fetch(serve(http("404 Not Found", body)), Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, FetchError::not_found("AAPL"));
    }

    #[test]
    fn http_503_is_transport() {
        let err = fetch(serve(http("503 Service Unavailable", "")), Duration::from_secs(5))
            .unwrap_err();
        match err {
            FetchError::Transport(msg) => assert!(msg.contains("503"), "{msg}"),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_body_is_malformed() {
        let err = fetch(serve(http("200 OK", "<html>rate limited</html>")), Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(err.reason(), crate::data::FailureReason::MalformedResponse);
    }

    #[test]
    fn silent_server_is_timeout() {
        let err = fetch(serve(None), Duration::from_millis(200)).unwrap_err();
        assert_eq!(err, FetchError::timeout(Duration::from_millis(200)));
    }

    #[test]
    fn refused_connection_is_transport() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        // listener dropped: nothing accepts on `addr` any more
        let err = fetch(format!("http://{addr}/chart"), Duration::from_secs(5)).unwrap_err();
        assert_eq!(err.reason(), crate::data::FailureReason::Transport);
    }
}
