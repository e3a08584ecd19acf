use actix_web::{App, http::StatusCode, test, web};
use cryptosim_miner_rs::utils::ClientError;
use cryptosim_miner_rs::{
    ComputeService, Coordinator, HashOutcome, LoopSettings, MemoryStore, SharedStore, api,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const DIGEST: &str = "2c624232cdd221771294dfbb310aca000a0df6ac8b66b696d90ef06fdefb64a3";

/// Succeeds `budget` times with a fixed computation time, then the random
/// source reports 503
struct FixedCompute {
    budget: AtomicUsize,
    time: f64,
}

impl FixedCompute {
    fn new(budget: usize, time: f64) -> Self {
        FixedCompute {
            budget: AtomicUsize::new(budget),
            time,
        }
    }
}

impl ComputeService for FixedCompute {
    async fn fetch_random(&self) -> Result<u64, ClientError> {
        let left = self.budget.load(Ordering::SeqCst);
        if left == 0 {
            return Err(ClientError::Status {
                service: "rng",
                status: 503,
            });
        }
        self.budget.store(left - 1, Ordering::SeqCst);
        Ok(left as u64)
    }

    async fn compute_hash(&self, _number: u64, _difficulty: u32) -> Result<HashOutcome, ClientError> {
        Ok(HashOutcome {
            hash_hex: DIGEST.to_string(),
            computation_time: self.time,
        })
    }
}

type TestCoordinator = Coordinator<FixedCompute, MemoryStore>;

fn coordinator(budget: usize) -> (TestCoordinator, MemoryStore) {
    let store = MemoryStore::new();
    let settings = LoopSettings {
        pacing: Duration::from_millis(2),
        ..Default::default()
    };
    (
        Coordinator::new(FixedCompute::new(budget, 0.25), store.clone(), settings),
        store,
    )
}

async fn wait_for_blocks(coordinator: &TestCoordinator, blocks: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while coordinator.snapshot().total_blocks < blocks {
        assert!(Instant::now() < deadline, "loop did not mine {} blocks", blocks);
        actix_web::rt::time::sleep(Duration::from_millis(2)).await;
    }
}

macro_rules! app {
    ($coordinator:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($coordinator.clone()))
                .configure(api::init_routes::<FixedCompute, MemoryStore>),
        )
        .await
    };
}

#[actix_web::test]
async fn health_reports_idle() {
    let (coordinator, _) = coordinator(0);
    let app = app!(coordinator);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["is_mining"], false);
}

#[actix_web::test]
async fn start_stop_statuses() {
    let (coordinator, _) = coordinator(0);
    let app = app!(coordinator);

    let expected = [
        ("/stop", "not_running"),
        ("/start", "started"),
        ("/start", "already_running"),
        ("/stop", "stopped"),
        ("/stop", "not_running"),
    ];
    for (uri, status) in expected {
        let req = test::TestRequest::post().uri(uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], status, "POST {}", uri);
    }
    coordinator.join_loop().await;
}

#[actix_web::test]
async fn stats_follow_the_loop() {
    let (coordinator, _) = coordinator(4);
    coordinator.reset().await.unwrap();
    let app = app!(coordinator);

    let req = test::TestRequest::get().uri("/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        serde_json::json!({"total_blocks": 0, "mining_rate": 0.0, "is_mining": false})
    );

    let req = test::TestRequest::post().uri("/start").to_request();
    test::call_service(&app, req).await;
    wait_for_blocks(&coordinator, 4).await;

    let req = test::TestRequest::get().uri("/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total_blocks"], 4);
    assert_eq!(body["mining_rate"], 4.0);
    assert_eq!(body["is_mining"], true);
    assert!(body.get("degraded").is_none());

    let req = test::TestRequest::post().uri("/stop").to_request();
    test::call_service(&app, req).await;
    coordinator.join_loop().await;

    let req = test::TestRequest::get().uri("/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total_blocks"], 4);
    assert_eq!(body["mining_rate"], 0.0);
    assert_eq!(body["is_mining"], false);
}

#[actix_web::test]
async fn stats_degrade_when_store_is_down() {
    let (coordinator, store) = coordinator(2);
    coordinator.mine_once().await.unwrap();
    store.set_available(false);
    let app = app!(coordinator);

    let req = test::TestRequest::get().uri("/stats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["degraded"], true);
    assert_eq!(body["total_blocks"], 1);
}

#[actix_web::test]
async fn recent_lists_results_or_503() {
    let (coordinator, store) = coordinator(2);
    coordinator.mine_once().await.unwrap();
    coordinator.mine_once().await.unwrap();
    let app = app!(coordinator);

    let req = test::TestRequest::get().uri("/recent").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["hash_hex"], DIGEST);
    assert_eq!(results[0]["input_number"], 2);
    assert_eq!(results[1]["input_number"], 1);

    store.set_available(false);
    let req = test::TestRequest::get().uri("/recent").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn metrics_are_exposed() {
    let (coordinator, _) = coordinator(1);
    coordinator.mine_once().await.unwrap();
    let app = app!(coordinator);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("cryptosim_blocks_mined_total"));
}

#[actix_web::test]
async fn mining_persists_to_store() {
    let (coordinator, store) = coordinator(3);
    let app = app!(coordinator);

    let req = test::TestRequest::post().uri("/start").to_request();
    test::call_service(&app, req).await;
    wait_for_blocks(&coordinator, 3).await;

    assert_eq!(store.get("mining_active").await.unwrap().as_deref(), Some("1"));
    assert_eq!(store.get("total_blocks").await.unwrap().as_deref(), Some("3"));
    assert!(store.get("mining_result:3").await.unwrap().is_some());

    let req = test::TestRequest::post().uri("/stop").to_request();
    test::call_service(&app, req).await;
    coordinator.join_loop().await;
}
