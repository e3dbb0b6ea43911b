use std::time::Duration;

use reqwest::Url;
use trailscrape::{
    scrape, ApiFetcher, Fetcher, Finish, HttpFetcher, Language, RawFetchResult, ScrapeOptions,
    ScrapePolicy, ScrapeRange, TerminalReason,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPT_PAGE: &str = r#"<!DOCTYPE html><html><body><table class="script"><tbody>
<tr><td><a id="1">1</a></td><td><img alt="Rean"></td><td>Hey.</td><td>おい。</td></tr>
<tr><td><a id="2">2</a></td><td><img alt="Alisa"></td><td>What is it?</td><td>何？</td></tr>
<tr><td><a id="4">4</a></td><td></td><td>(The wind picks up.)</td><td>（風が吹く）</td></tr>
</tbody></table></body></html>"#;

fn quick() -> ScrapeOptions<'static> {
    ScrapeOptions {
        policy: ScrapePolicy {
            retry_delay: Duration::ZERO,
            ..ScrapePolicy::default()
        },
        progress: None,
    }
}

fn page_url(server: &MockServer) -> Url {
    Url::parse(&format!(
        "{}/game-scripts?fname=t5520&game_id=6",
        server.uri()
    ))
    .expect("mock server url")
}

async fn serve(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/game-scripts"))
        .and(query_param("fname", "t5520"))
        .respond_with(
            ResponseTemplate::new(status).set_body_raw(body.to_string(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

// The blocking client owns its own runtime, so it is built and dropped off the async workers.
#[tokio::test(flavor = "multi_thread")]
async fn page_fetcher_returns_body() {
    let server = MockServer::start().await;
    serve(&server, 200, SCRIPT_PAGE).await;
    let url = page_url(&server);

    let result = tokio::task::spawn_blocking(move || {
        let mut fetcher = HttpFetcher::new().expect("client");
        fetcher.fetch(&url, 1)
    })
    .await
    .expect("join");
    match result {
        RawFetchResult::Body(body) => assert!(body.contains("What is it?")),
        other => panic!("expected body, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn page_fetcher_maps_404_to_not_found() {
    let server = MockServer::start().await;
    serve(&server, 404, "not here").await;
    let url = page_url(&server);

    let result = tokio::task::spawn_blocking(move || {
        let mut fetcher = HttpFetcher::new().expect("client");
        fetcher.fetch(&url, 9)
    })
    .await
    .expect("join");
    assert_eq!(result, RawFetchResult::NotFound);
}

#[tokio::test(flavor = "multi_thread")]
async fn page_fetcher_maps_500_to_transient_error() {
    let server = MockServer::start().await;
    serve(&server, 500, "boom").await;
    let url = page_url(&server);

    let result = tokio::task::spawn_blocking(move || {
        let mut fetcher = HttpFetcher::builder()
            .user_agent("trailscrape-test/1.0")
            .timeout_secs(5)
            .build()
            .expect("client");
        fetcher.fetch(&url, 1)
    })
    .await
    .expect("join");
    match result {
        RawFetchResult::TransientError(cause) => assert!(cause.contains("500"), "{}", cause),
        other => panic!("expected transient error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn page_scrape_reads_rows_by_anchor() {
    let server = MockServer::start().await;
    serve(&server, 200, SCRIPT_PAGE).await;
    let url = page_url(&server);

    let outcome = tokio::task::spawn_blocking(move || {
        let mut fetcher = HttpFetcher::new().expect("client");
        let range = ScrapeRange::new(1, Finish::Concrete(4)).expect("range");
        scrape(&mut fetcher, &url, range, Language::English, &quick())
    })
    .await
    .expect("join");

    let lines: Vec<&str> = outcome.lines.iter().map(|l| l.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            r#"1. "Hey.", Rean"#,
            r#"2. "What is it?", Alisa"#,
            r#"4. "(The wind picks up.)", "#,
        ]
    );
    assert_eq!(outcome.not_found_count(), 1);
    assert_eq!(outcome.reason, TerminalReason::RangeExhausted);
}

#[tokio::test(flavor = "multi_thread")]
async fn api_fetcher_downloads_script_once() {
    let server = MockServer::start().await;
    let rows = r#"[
        {"gameId":6,"fname":"t5520","row":1,"engChrName":"Rean","engHtmlText":"Hey.<br/>Over here.","jpnChrName":"リィン","jpnHtmlText":"おい。"},
        {"gameId":6,"fname":"t5520","row":2,"engChrName":"","engHtmlText":"(Silence.)","jpnChrName":"","jpnHtmlText":"（沈黙）"}
    ]"#;
    Mock::given(method("GET"))
        .and(path("/api/script/detail/6/t5520"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rows, "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    let url = page_url(&server);

    let outcome = tokio::task::spawn_blocking(move || {
        let mut fetcher = ApiFetcher::new(&url, None, Some(5)).expect("api fetcher");
        let range = ScrapeRange::new(1, Finish::Unbounded).expect("range");
        scrape(&mut fetcher, &url, range, Language::Japanese, &quick())
    })
    .await
    .expect("join");

    let lines: Vec<&str> = outcome.lines.iter().map(|l| l.as_str()).collect();
    assert_eq!(lines, vec![r#"1. "おい。", リィン"#, r#"2. "（沈黙）", "#]);
    assert_eq!(outcome.reason, TerminalReason::ConsecutiveMissingLimitReached);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn api_fetcher_reports_bad_json_as_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/script/detail/6/t5520"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
        .mount(&server)
        .await;
    let url = page_url(&server);

    let outcome = tokio::task::spawn_blocking(move || {
        let mut fetcher = ApiFetcher::new(&url, None, Some(5)).expect("api fetcher");
        let range = ScrapeRange::new(1, Finish::Concrete(2)).expect("range");
        scrape(&mut fetcher, &url, range, Language::English, &quick())
    })
    .await
    .expect("join");

    assert_eq!(outcome.found(), 0);
    assert_eq!(outcome.fetch_failure_count(), 2);
}
