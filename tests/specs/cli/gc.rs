//! `jobctl gc` live-application retention.

use crate::prelude::Workspace;

#[test]
fn gc_is_a_no_op_for_an_application_named_as_live() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&["start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes();

    ws.jobctl().args(&["gc", "app1"]).passes();

    ws.jobctl()
        .args(&["last", "app1", "zone-us"])
        .passes()
        .stdout_has("app1/zone-us/1");
}

#[test]
fn gc_removes_data_for_an_application_not_named_as_live() {
    let ws = Workspace::empty();

    ws.jobctl()
        .args(&["start", "stale-app", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes();

    // "app1" is live; "stale-app" is not named, so it is collected.
    ws.jobctl().args(&["gc", "app1"]).passes();

    ws.jobctl()
        .args(&["last", "stale-app", "zone-us"])
        .passes()
        .stdout_has("(none)");
}
