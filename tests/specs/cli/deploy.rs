//! `jobctl deploy` replacement and redeployment detection.

use crate::prelude::Workspace;

#[test]
fn deploy_aborts_and_replaces_an_active_run() {
    let ws = Workspace::empty();
    let package = ws.package("v1.pkg", b"package-v1");

    ws.jobctl()
        .args(&["start", "app1", "zone-us", "--platform", "8.400.10", "--build", "1"])
        .passes();

    // Deploying over an active run aborts it first rather
    // than conflicting, unlike a second `start`.
    ws.jobctl()
        .args(&[
            "deploy",
            "app1",
            "zone-us",
            package.to_str().unwrap(),
            "--known-platform",
            "8.400.10",
        ])
        .passes()
        .stdout_has("app1/zone-us/2");

    ws.jobctl()
        .args(&["run", "app1/zone-us/1"])
        .passes()
        .stdout_has("aborted");
}

#[test]
fn deploy_without_any_known_platform_reports_no_deployable_version() {
    let ws = Workspace::empty();
    let package = ws.package("v1.pkg", b"package-v1");

    ws.jobctl()
        .args(&["deploy", "app1", "zone-us", package.to_str().unwrap()])
        .fails()
        .stderr_has("no deployable");
}

#[test]
fn deploy_dry_run_produces_a_deploy_only_profile() {
    let ws = Workspace::empty();
    let package = ws.package("v1.pkg", b"package-v1");

    ws.jobctl()
        .args(&[
            "deploy",
            "app1",
            "zone-us",
            package.to_str().unwrap(),
            "--known-platform",
            "8.400.10",
            "--dry-run",
        ])
        .passes()
        .stdout_has("deploy:unfinished");
}
