//! BDD step definitions for the configuration feature

use std::time::Duration;

use cucumber::{given, then, when};

use tws_sentinel::config::Config;
use tws_sentinel::{SentinelBuilder, SentinelError};

use crate::world::SentinelWorld;

#[given("a clean environment")]
fn clean_environment(world: &mut SentinelWorld) {
    world.env.clear();
}

#[given(expr = "the environment variable {word} is {string}")]
fn env_var(world: &mut SentinelWorld, name: String, value: String) {
    world.env.insert(name, value);
}

#[when("the configuration is resolved and the sentinel is built")]
fn resolve_and_build(world: &mut SentinelWorld) {
    let mut config = Config::default();
    let env = world.env.clone();
    let resolved = config
        .apply_env(|key| env.get(key).cloned())
        .and_then(|_| SentinelBuilder::new(config.clone()).build().map(|_| ()));

    world.config = config;
    world.config_error = resolved.err();
}

#[then("the sentinel should be built")]
fn built(world: &mut SentinelWorld) {
    assert!(
        world.config_error.is_none(),
        "unexpected error: {:?}",
        world.config_error
    );
}

#[then(expr = "startup should fail with {string}")]
fn startup_fails(world: &mut SentinelWorld, expected: String) {
    let err = world.config_error.as_ref().expect("expected an error");
    assert!(
        matches!(err, SentinelError::Config(_)),
        "{:?} should be a configuration error",
        err
    );
    assert!(
        err.to_string().contains(&expected),
        "'{}' does not contain '{}'",
        err,
        expected
    );
}

#[then(expr = "the gateway address should be {string}")]
fn gateway_address(world: &mut SentinelWorld, address: String) {
    assert_eq!(world.config.gateway.address(), address);
}

#[then(expr = "the gateway client id should be {int}")]
fn gateway_client_id(world: &mut SentinelWorld, client_id: i32) {
    assert_eq!(world.config.gateway.client_id, client_id);
}

#[then(expr = "the reminder interval should be {int} seconds")]
fn reminder_interval(world: &mut SentinelWorld, secs: u64) {
    assert_eq!(world.config.reminder_interval, Duration::from_secs(secs));
}

#[then(expr = "the label should be {string}")]
fn label(world: &mut SentinelWorld, expected: String) {
    assert_eq!(world.config.label, expected);
}
