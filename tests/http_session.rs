use std::time::{Duration, Instant};

use jobscraper::{
    FetchSettings, HttpSessionFactory, PageSession, Readiness, ScrapeError, SessionFactory,
};
use scraper::Selector;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> FetchSettings {
    FetchSettings {
        poll_interval: Duration::from_millis(20),
        request_timeout: Duration::from_secs(2),
        ..FetchSettings::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(format!("<html><body>{body}</body></html>"), "text/html")
}

#[tokio::test]
async fn ready_once_selector_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .respond_with(html("<h1>Title</h1>"))
        .mount(&server)
        .await;

    let mut session = HttpSessionFactory::new(settings()).open().await.unwrap();
    session.navigate(&format!("{}/job", server.uri())).await.unwrap();
    let ready = session
        .wait_for(&Selector::parse("h1").unwrap(), Duration::from_secs(1))
        .await;

    assert_eq!(ready, Readiness::Ready);
    assert!(session.content().await.unwrap().contains("<h1>Title</h1>"));
    session.close().await;
}

#[tokio::test]
async fn becomes_ready_after_a_reload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .respond_with(html("<p>loading</p>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .respond_with(html("<h1>Title</h1>"))
        .mount(&server)
        .await;

    let mut session = HttpSessionFactory::new(settings()).open().await.unwrap();
    session.navigate(&format!("{}/job", server.uri())).await.unwrap();
    let ready = session
        .wait_for(&Selector::parse("h1").unwrap(), Duration::from_secs(2))
        .await;

    assert_eq!(ready, Readiness::Ready);
    assert!(session.content().await.unwrap().contains("Title"));
}

#[tokio::test]
async fn wait_is_bounded_and_keeps_current_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .respond_with(html("<p>never ready</p>"))
        .mount(&server)
        .await;

    let mut session = HttpSessionFactory::new(settings()).open().await.unwrap();
    session.navigate(&format!("{}/job", server.uri())).await.unwrap();

    let started = Instant::now();
    let ready = session
        .wait_for(&Selector::parse("h1").unwrap(), Duration::from_millis(200))
        .await;

    assert_eq!(ready, Readiness::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(session.content().await.unwrap().contains("never ready"));
}

#[tokio::test]
async fn error_status_fails_navigation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let mut session = HttpSessionFactory::new(settings()).open().await.unwrap();
    let err = session.navigate(&format!("{}/gone", server.uri())).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Status { status: 410, .. }));
    assert!(matches!(session.content().await, Err(ScrapeError::NotNavigated)));
}

#[tokio::test]
async fn reloads_back_off_while_waiting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .respond_with(html("<p>never ready</p>"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        poll_interval: Duration::from_millis(20),
        max_poll_interval: Duration::from_millis(160),
        request_timeout: Duration::from_secs(2),
        ..FetchSettings::default()
    };
    let mut session = HttpSessionFactory::new(settings).open().await.unwrap();
    session.navigate(&format!("{}/job", server.uri())).await.unwrap();

    let ready = session
        .wait_for(&Selector::parse("h1").unwrap(), Duration::from_millis(600))
        .await;
    assert_eq!(ready, Readiness::TimedOut);

    // Delays of 20, 40, 80, 160, 160... ms allow about six reloads in 600ms;
    // a fixed 20ms poll would make about thirty.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 3, "expected some reloads, got {}", requests.len());
    assert!(requests.len() <= 9, "too many reloads: {}", requests.len());
}
