//! Read-only query commands.

use crate::prelude::Workspace;

#[test]
fn active_lists_only_in_flight_runs() {
    let ws = Workspace::empty();

    ws.jobctl().args(&["active"]).passes().stdout_has("(no runs)");

    ws.jobctl()
        .args(&["start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes();

    ws.jobctl()
        .args(&["active"])
        .passes()
        .stdout_has("app1/zone-us/1");

    ws.jobctl()
        .args(&["active-app", "app1"])
        .passes()
        .stdout_has("app1/zone-us/1");
}

#[test]
fn deployment_status_reflects_the_active_run() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&["deployment-status", "app1", "zone-us"])
        .passes()
        .stdout_has("(none)");

    ws.jobctl()
        .args(&["start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes();

    ws.jobctl()
        .args(&["deployment-status", "app1", "zone-us"])
        .passes()
        .stdout_has("running");
}

#[test]
fn run_json_output_round_trips_through_serde() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&["start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes();

    let stdout = ws
        .jobctl()
        .args(&["-o", "json", "run", "app1/zone-us/1"])
        .passes()
        .stdout();

    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["id"]["number"], 1);
    assert_eq!(value["status"], "running");
}

#[test]
fn run_rejects_a_malformed_run_id() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&["run", "not-a-run-id"])
        .fails()
        .stderr_has("app/jobType/number");
}
