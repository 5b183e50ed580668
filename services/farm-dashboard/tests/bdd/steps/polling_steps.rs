//! BDD step definitions for the polling feature

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio::time::sleep;

use farm_dashboard::Poller;

use crate::world::{reading, DashboardWorld, Outcome, ScriptedReadings};

#[given(expr = "the next fetch returns a reading for {string} with moisture {float}")]
fn next_fetch_reading(world: &mut DashboardWorld, sensor_id: String, moisture: f64) {
    world.outcomes.push(Outcome::Reading {
        sensor_id,
        moisture,
    });
}

#[given("the next fetch cannot reach the backend")]
fn next_fetch_unreachable(world: &mut DashboardWorld) {
    world.outcomes.push(Outcome::Unreachable);
}

#[given("the next fetch times out")]
fn next_fetch_timeout(world: &mut DashboardWorld) {
    world.outcomes.push(Outcome::Timeout);
}

#[given(expr = "every fetch takes {int} milliseconds")]
fn fetch_delay(world: &mut DashboardWorld, millis: u64) {
    world.fetch_delay = Duration::from_millis(millis);
}

#[given(expr = "a poller with a period of {int} milliseconds")]
fn poller_with_period(world: &mut DashboardWorld, millis: u64) {
    let source = ScriptedReadings::new(std::mem::take(&mut world.outcomes), world.fetch_delay);
    world.fetches = Some(Arc::clone(&source.fetches));
    let poller = Poller::new(source, Duration::from_millis(millis)).expect("valid period");
    world.updates = Some(poller.subscribe());
    world.poller = Some(poller);
}

#[when("the poller is started")]
fn start_poller(world: &mut DashboardWorld) {
    world.poller.as_mut().expect("poller not set").start();
}

#[when("the poller is stopped")]
fn stop_poller(world: &mut DashboardWorld) {
    world.poller.as_mut().expect("poller not set").stop();
}

#[when(expr = "{int} milliseconds pass")]
async fn time_passes(_world: &mut DashboardWorld, millis: u64) {
    sleep(Duration::from_millis(millis)).await;
}

#[then("the published state should be loading")]
fn state_loading(world: &mut DashboardWorld) {
    let state = world.published();
    assert!(state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());
}

#[then("the published state should not be loading")]
fn state_not_loading(world: &mut DashboardWorld) {
    assert!(!world.published().loading);
}

#[then(expr = "the published data should be a reading for {string} with moisture {float}")]
fn data_is_reading(world: &mut DashboardWorld, sensor_id: String, moisture: f64) {
    assert_eq!(
        world.published().data,
        Some(vec![reading(&sensor_id, moisture)])
    );
}

#[then("the published data should be empty")]
fn data_empty(world: &mut DashboardWorld) {
    assert!(world.published().data.is_none());
}

#[then(expr = "the published error should be {string}")]
fn error_is(world: &mut DashboardWorld, expected: String) {
    assert_eq!(world.published().error.as_deref(), Some(expected.as_str()));
}

#[then("the published error should be cleared")]
fn error_cleared(world: &mut DashboardWorld) {
    assert!(world.published().error.is_none());
}

#[then("nothing should have been published")]
fn nothing_published(world: &mut DashboardWorld) {
    let updates = world.updates.as_ref().expect("poller not set");
    assert!(!updates.has_changed().expect("poller dropped"));
}

#[then(expr = "the backend should have been fetched {int} time(s)")]
fn fetch_count(world: &mut DashboardWorld, expected: usize) {
    let fetches = world.fetches.as_ref().expect("poller not set");
    assert_eq!(fetches.load(Ordering::SeqCst), expected);
}

#[then("the poller should be active")]
fn poller_active(world: &mut DashboardWorld) {
    assert!(world.poller.as_ref().expect("poller not set").is_active());
}

#[then("the poller should be idle")]
fn poller_idle(world: &mut DashboardWorld) {
    assert!(!world.poller.as_ref().expect("poller not set").is_active());
}
