use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appshelf_core::{HubClient, RegistryConfig};
use appshelf_http::AppShelf;

fn config(hub: &str, registry: &str) -> RegistryConfig {
    RegistryConfig {
        namespace: "acme".to_string(),
        hub_url: hub.to_string(),
        registry_url: registry.to_string(),
        auth_url: registry.to_string(),
        auth_service: "registry.test".to_string(),
        page_size: 100,
    }
}

fn router(config: RegistryConfig) -> Router {
    AppShelf::new(HubClient::new(config).unwrap())
        .router()
        .unwrap()
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn mount_listing(server: &MockServer, repositories: &[&str]) {
    let results: Vec<_> = repositories.iter().map(|r| json!({ "name": r })).collect();
    Mock::given(method("GET"))
        .and(path("/v2/repositories/acme/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": results,
            "next": null
        })))
        .mount(server)
        .await;
}

async fn mount_info(server: &MockServer, repository: &str, tags: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/repositories/acme/{repository}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": repository,
            "description": format!("{repository} from the hub"),
            "star_count": 0,
            "pull_count": 10,
            "last_updated": "2024-01-01T00:00:00Z",
            "is_private": false
        })))
        .mount(server)
        .await;
    let results: Vec<_> = tags.iter().map(|t| json!({ "name": t })).collect();
    Mock::given(method("GET"))
        .and(path(format!("/v2/repositories/acme/{repository}/tags")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, repository: &str, title: &str, bearer: Option<&str>) {
    let digest = format!("sha256:{repository}0cfg");
    let manifest = json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": 512,
            "digest": digest
        },
        "layers": []
    });
    let config = json!({
        "architecture": "amd64",
        "os": "linux",
        "config": {
            "Labels": {
                "org.opencontainers.image.title": title,
                "org.opencontainers.image.picture-url": format!("https://img.test/{repository}.png")
            }
        }
    });

    let manifest_path = format!("/v2/acme/{repository}/manifests/latest");
    let blob_path = format!("/v2/acme/{repository}/blobs/{digest}");
    match bearer {
        None => {
            Mock::given(method("GET"))
                .and(path(manifest_path))
                .respond_with(ResponseTemplate::new(200).set_body_json(manifest))
                .mount(server)
                .await;
            Mock::given(method("GET"))
                .and(path(blob_path))
                .respond_with(ResponseTemplate::new(200).set_body_json(config))
                .mount(server)
                .await;
        }
        Some(token) => {
            let authorization = format!("Bearer {token}");
            Mock::given(method("GET"))
                .and(path("/token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
                .mount(server)
                .await;
            for (p, body) in [(manifest_path, manifest), (blob_path, config)] {
                Mock::given(method("GET"))
                    .and(path(p.clone()))
                    .and(header("authorization", authorization.as_str()))
                    .respond_with(ResponseTemplate::new(200).set_body_json(body))
                    .mount(server)
                    .await;
                Mock::given(method("GET"))
                    .and(path(p))
                    .respond_with(ResponseTemplate::new(401))
                    .mount(server)
                    .await;
            }
        }
    }
}

#[tokio::test]
async fn tagged_repositories_take_names_from_labels() {
    let server = MockServer::start().await;
    mount_listing(&server, &["web", "worker"]).await;
    mount_info(&server, "web", &["latest"]).await;
    mount_info(&server, "worker", &["v1", "latest"]).await;
    mount_image(&server, "web", "Web Frontend", None).await;
    mount_image(&server, "worker", "Background Worker", None).await;

    let (status, body) = get(router(config(&server.uri(), &server.uri())), "/apps").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "name": "Web Frontend",
                "location": "acme/web",
                "description": "web from the hub",
                "pictureUrl": "https://img.test/web.png"
            },
            {
                "name": "Background Worker",
                "location": "acme/worker",
                "description": "worker from the hub",
                "pictureUrl": "https://img.test/worker.png"
            }
        ])
    );
}

#[tokio::test]
async fn untagged_repository_uses_placeholders() {
    let server = MockServer::start().await;
    mount_listing(&server, &["scratch"]).await;
    Mock::given(method("GET"))
        .and(path("/v2/repositories/acme/scratch/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "scratch",
            "description": "",
            "is_private": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/repositories/acme/scratch/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let (status, body) = get(router(config(&server.uri(), &server.uri())), "/apps").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "name": "scratch",
            "location": "acme/scratch",
            "description": "No description provided.",
            "pictureUrl": "https://via.placeholder.com/150"
        }])
    );
}

#[tokio::test]
async fn tags_are_fetched_once_per_repository() {
    let server = MockServer::start().await;
    mount_listing(&server, &["web"]).await;
    Mock::given(method("GET"))
        .and(path("/v2/repositories/acme/web/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "web",
            "description": "web from the hub"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/repositories/acme/web/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "name": "v1" }, { "name": "latest" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_image(&server, "web", "Web Frontend", None).await;

    let (status, body) = get(router(config(&server.uri(), &server.uri())), "/apps").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Web Frontend");
}

#[tokio::test]
async fn listing_transport_error_returns_empty_array() {
    // nothing listens on port 1
    let unreachable = "http://127.0.0.1:1";

    let (status, body) = get(router(config(unreachable, unreachable)), "/apps").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn token_retry_yields_same_record_as_anonymous_pull() {
    let anonymous = MockServer::start().await;
    mount_listing(&anonymous, &["web"]).await;
    mount_info(&anonymous, "web", &["latest"]).await;
    mount_image(&anonymous, "web", "Web Frontend", None).await;

    let protected = MockServer::start().await;
    mount_listing(&protected, &["web"]).await;
    mount_info(&protected, "web", &["latest"]).await;
    mount_image(&protected, "web", "Web Frontend", Some("s3cr3t")).await;

    let (_, expected) = get(router(config(&anonymous.uri(), &anonymous.uri())), "/apps").await;
    let (status, actual) = get(router(config(&protected.uri(), &protected.uri())), "/apps").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(actual, expected);
    assert_eq!(actual[0]["name"], "Web Frontend");
}

#[tokio::test]
async fn missing_repository_is_omitted() {
    let server = MockServer::start().await;
    mount_listing(&server, &["gone", "web"]).await;
    Mock::given(method("GET"))
        .and(path("/v2/repositories/acme/gone/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_info(&server, "web", &["latest"]).await;
    mount_image(&server, "web", "Web Frontend", None).await;

    let (_, body) = get(router(config(&server.uri(), &server.uri())), "/apps").await;

    let locations: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|app| app["location"].clone())
        .collect();
    assert_eq!(locations, vec![json!("acme/web")]);
}

#[tokio::test]
async fn openapi_document_describes_apps() {
    let (status, body) = get(router(RegistryConfig::default()), "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/apps"]["get"].is_object());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body) = get(router(RegistryConfig::default()), "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "not found" }));
}
