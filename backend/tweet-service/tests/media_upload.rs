//! Image uploader against a local stand-in for the image host.

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;

use tweet_service::services::ImageUploader;
use tweet_service::{ErrorKind, ServiceError};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

async fn accept(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let well_formed = content_type.starts_with("multipart/form-data")
        && contains(&body, b"name=\"file\"")
        && contains(&body, b"name=\"upload_preset\"")
        && contains(&body, b"twitter-clone");

    if well_formed {
        HttpResponse::Ok().json(json!({ "secure_url": "https://img.example.com/abc.png" }))
    } else {
        HttpResponse::BadRequest().finish()
    }
}

async fn fail() -> HttpResponse {
    HttpResponse::InternalServerError().finish()
}

async fn no_url() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "public_id": "abc" }))
}

fn start_host() -> (String, actix_web::dev::ServerHandle) {
    let server = HttpServer::new(|| {
        App::new()
            .route("/upload", web::post().to(accept))
            .route("/broken", web::post().to(fail))
            .route("/incomplete", web::post().to(no_url))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);
    (format!("http://{}", addr), handle)
}

#[actix_web::test]
async fn upload_returns_secure_url() {
    let (base, handle) = start_host();
    let uploader = ImageUploader::new(format!("{}/upload", base), "twitter-clone").unwrap();

    let url = uploader.upload(vec![0x89, b'P', b'N', b'G'], "image/png").await.unwrap();
    assert_eq!(url, "https://img.example.com/abc.png");

    handle.stop(true).await;
}

#[actix_web::test]
async fn host_failures_are_upstream_errors() {
    let (base, handle) = start_host();

    for path in ["/broken", "/incomplete"] {
        let uploader = ImageUploader::new(format!("{}{}", base, path), "twitter-clone").unwrap();
        let err = uploader.upload(vec![1, 2, 3], "image/png").await.unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)), "{}", path);
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    handle.stop(true).await;
}

#[actix_web::test]
async fn non_images_never_reach_the_host() {
    let uploader = ImageUploader::new("http://127.0.0.1:9/upload", "twitter-clone").unwrap();
    let err = uploader
        .upload(b"plain text".to_vec(), "text/plain")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
