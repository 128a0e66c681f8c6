//! `jobctl start` / double-start conflict.

use crate::prelude::Workspace;

#[test]
fn start_then_start_again_conflicts() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&[
            "start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1",
        ])
        .passes()
        .stdout_has("app1/zone-us/1");

    ws.jobctl()
        .args(&[
            "start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1",
        ])
        .fails()
        .stderr_has("still active");
}

#[test]
fn start_assigns_monotonically_increasing_run_numbers_across_types() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&["start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes()
        .stdout_has("app1/zone-us/1");

    // A different job type under the same application starts its own
    // independent run-number sequence: numbers are per (app, type), not
    // global.
    ws.jobctl()
        .args(&["start", "app1", "zone-eu", "--platform", "8.400.10", "--build", "1"])
        .passes()
        .stdout_has("app1/zone-eu/1");
}

#[test]
fn start_rejects_an_empty_step_chain() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&[
            "start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1", "--steps", "",
        ])
        .fails()
        .stderr_has("at least one step");
}
