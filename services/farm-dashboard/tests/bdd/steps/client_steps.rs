//! BDD step definitions for the API client feature

use std::sync::Arc;

use cucumber::gherkin::Step;
use cucumber::{given, then, when};

use farm_dashboard::io::HttpResponse;
use farm_dashboard::{ClientConfig, DashboardClient, DashboardError, ErrorKind};

use crate::world::{reading, CannedAnswer, CannedHttpClient, DashboardWorld};

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "Timeout" => ErrorKind::Timeout,
        "Unreachable" => ErrorKind::Unreachable,
        "ServerError" => ErrorKind::ServerError,
        "InvalidInput" => ErrorKind::InvalidInput,
        "Decode" => ErrorKind::Decode,
        other => panic!("Unknown error kind: {}", other),
    }
}

fn client(world: &DashboardWorld) -> DashboardClient {
    let http = Arc::clone(world.http.as_ref().expect("backend not set"));
    DashboardClient::new(&ClientConfig::default(), http).expect("valid default config")
}

#[given(expr = "the backend responds with status {int} and body:")]
fn backend_responds(world: &mut DashboardWorld, status: u16, step: &Step) {
    let body = step.docstring.clone().expect("body docstring missing");
    world.http = Some(Arc::new(CannedHttpClient::new(CannedAnswer::Response(
        HttpResponse {
            status,
            body: body.trim().to_string(),
        },
    ))));
}

#[given("the backend is unreachable")]
fn backend_unreachable(world: &mut DashboardWorld) {
    world.http = Some(Arc::new(CannedHttpClient::new(CannedAnswer::Unreachable)));
}

#[given("the backend does not answer in time")]
fn backend_times_out(world: &mut DashboardWorld) {
    world.http = Some(Arc::new(CannedHttpClient::new(CannedAnswer::Timeout)));
}

#[when("the latest readings are fetched")]
async fn fetch_latest(world: &mut DashboardWorld) {
    world.readings = Some(client(world).fetch_latest().await);
}

#[when(expr = "the readings for sensor {string} are fetched")]
async fn fetch_by_sensor(world: &mut DashboardWorld, sensor_id: String) {
    world.readings = Some(client(world).fetch_by_sensor(&sensor_id).await);
}

#[then(expr = "the result should be a single reading for {string} with moisture {float}")]
fn single_reading(world: &mut DashboardWorld, sensor_id: String, moisture: f64) {
    let result = world.readings.as_ref().expect("nothing fetched");
    let readings = result.as_ref().expect("fetch failed");
    assert_eq!(readings, &vec![reading(&sensor_id, moisture)]);
}

#[then("the result should be empty")]
fn empty_result(world: &mut DashboardWorld) {
    let result = world.readings.as_ref().expect("nothing fetched");
    assert!(result.as_ref().expect("fetch failed").is_empty());
}

#[then(expr = "the fetch should fail with {word}")]
fn fetch_fails_with(world: &mut DashboardWorld, kind: String) {
    let result = world.readings.as_ref().expect("nothing fetched");
    let err = result.as_ref().expect_err("fetch succeeded");
    assert_eq!(err.kind(), parse_kind(&kind));
}

#[then(expr = "the server error message should be {string}")]
fn server_message(world: &mut DashboardWorld, expected: String) {
    let result = world.readings.as_ref().expect("nothing fetched");
    match result.as_ref().expect_err("fetch succeeded") {
        DashboardError::Server { message, .. } => assert_eq!(message, &expected),
        other => panic!("expected a server error, got {other:?}"),
    }
}

#[then(expr = "the error should read {string}")]
fn error_reads(world: &mut DashboardWorld, expected: String) {
    let result = world.readings.as_ref().expect("nothing fetched");
    let err = result.as_ref().expect_err("fetch succeeded");
    assert_eq!(err.to_string(), expected);
}

#[then(expr = "the backend should have received {int} request(s)")]
fn request_count(world: &mut DashboardWorld, expected: usize) {
    let http = world.http.as_ref().expect("backend not set");
    assert_eq!(http.request_count(), expected);
}
