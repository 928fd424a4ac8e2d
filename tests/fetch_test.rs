//! HTTP fetcher and image download against a mock server

use std::time::Duration;

use avalon_crawler::content_saver::save_image;
use avalon_crawler::net::{HttpFetch, ReqwestFetcher};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn returns_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("GET", "/apartment-locations")
        .with_status(200)
        .with_body("<div class=\"col-sm\"><a href=\"/ca/x\">X</a></div>")
        .create_async()
        .await;
    let missing = server
        .mock("GET", "/gone")
        .with_status(404)
        .create_async()
        .await;

    let fetcher = ReqwestFetcher::new();
    let response = fetcher
        .get(&format!("{}/apartment-locations", server.url()), TIMEOUT, None)
        .await
        .expect("fetch");
    assert!(response.is_success());
    assert!(response.text().contains("col-sm"));

    let gone = fetcher
        .get(&format!("{}/gone", server.url()), TIMEOUT, None)
        .await
        .expect("non-2xx is still a response");
    assert_eq!(gone.status, 404);
    assert!(!gone.is_success());

    ok.assert_async().await;
    missing.assert_async().await;
}

#[tokio::test]
async fn existing_image_is_not_fetched_again() {
    let mut server = mockito::Server::new_async().await;
    let image = server
        .mock("GET", "/img/204.jpg")
        .with_status(200)
        .with_body(b"\xFF\xD8jpeg")
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("images").join("204.jpg");
    let url = format!("{}/img/204.jpg", server.url());
    let fetcher = ReqwestFetcher::new();

    assert!(save_image(&fetcher, &url, &path, TIMEOUT, None).await.expect("first"));
    assert!(!save_image(&fetcher, &url, &path, TIMEOUT, None).await.expect("second"));
    assert_eq!(std::fs::read(&path).expect("read"), b"\xFF\xD8jpeg");

    image.assert_async().await;
}

#[tokio::test]
async fn failed_image_download_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server
        .mock("GET", "/img/missing.jpg")
        .with_status(404)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.jpg");
    let fetcher = ReqwestFetcher::new();
    let result = save_image(
        &fetcher,
        &format!("{}/img/missing.jpg", server.url()),
        &path,
        TIMEOUT,
        None,
    )
    .await;

    assert!(result.is_err());
    assert!(!path.exists());
}
