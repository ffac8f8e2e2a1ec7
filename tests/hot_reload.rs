//! Reload and shutdown tests against a host on a real socket.

use std::time::Duration;

use study_router::config::watcher::ConfigWatcher;
use study_router::config::{RouteConfig, RouterConfig};

mod common;

fn exam_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.routes.insert(
        0,
        RouteConfig {
            path: "/exam/:paper".into(),
            name: Some("Exam".into()),
            view: Some("views/Exam.vue".into()),
            title: Some("Exam - Study Quiz".into()),
            ..Default::default()
        },
    );
    config
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_reload_swaps_table() {
    let host = common::start_host(RouterConfig::default()).await;
    let client = client();
    let url = format!("http://{}/exam/2024", host.addr);

    let res = client.get(&url).send().await.expect("host unreachable");
    assert_eq!(res.status(), 404);

    host.updates.send(exam_config()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["route"], "Exam");
    assert_eq!(body["params"]["paper"], "2024");

    host.shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_reload_keeps_table() {
    let host = common::start_host(RouterConfig::default()).await;

    let mut broken = RouterConfig::default();
    broken.routes.retain(|r| r.name.as_deref() != Some("NotFound"));
    host.updates.send(broken).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client()
        .get(format!("http://{}/nowhere", host.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(host.services.navigator.table().len(), 26);

    host.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let host = common::start_host(RouterConfig::default()).await;
    assert_eq!(host.shutdown.receiver_count(), 1);

    host.shutdown.trigger();
    assert!(host.shutdown.drain(Duration::from_secs(2)).await);

    let res = client().get(format!("http://{}/quiz", host.addr)).send().await;
    assert!(res.is_err(), "host should stop accepting after shutdown");
}

#[tokio::test]
async fn test_file_watcher_emits_valid_config() {
    let path =
        std::env::temp_dir().join(format!("study-router-watch-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "[navigation]\ndefault_title = \"Before\"\n").unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _guard = watcher.run().unwrap();

    std::fs::write(&path, "[navigation]\ndefault_title = \"After\"\n").unwrap();

    // A write can surface as several events; wait for the one with the new content.
    let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(config) = updates.recv().await {
            if config.navigation.default_title == "After" {
                return true;
            }
        }
        false
    })
    .await
    .expect("no reload within 5s");
    assert!(reloaded);

    let _ = std::fs::remove_file(&path);
}
