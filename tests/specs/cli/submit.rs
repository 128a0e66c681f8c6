//! `jobctl submit` build numbering.

use crate::prelude::Workspace;

#[test]
fn submit_assigns_monotonically_increasing_build_numbers() {
    let ws = Workspace::empty();
    let v1 = ws.package("v1.pkg", b"package-v1");
    let v2 = ws.package("v2.pkg", b"package-v2");

    ws.jobctl()
        .args(&["submit", "app1", v1.to_str().unwrap()])
        .passes()
        .stdout_has("1");

    ws.jobctl()
        .args(&["submit", "app1", v2.to_str().unwrap()])
        .passes()
        .stdout_has("2");
}

#[test]
fn submit_accepts_a_paired_test_package() {
    let ws = Workspace::empty();
    let v1 = ws.package("v1.pkg", b"package-v1");
    let t1 = ws.package("v1-tests.pkg", b"tests-v1");

    ws.jobctl()
        .args(&[
            "submit",
            "app1",
            v1.to_str().unwrap(),
            "--test-package",
            t1.to_str().unwrap(),
        ])
        .passes()
        .stdout_has("1");
}

#[test]
fn submit_rejects_unreadable_metadata_file() {
    let ws = Workspace::empty();
    let v1 = ws.package("v1.pkg", b"package-v1");

    ws.jobctl()
        .args(&[
            "submit",
            "app1",
            v1.to_str().unwrap(),
            "--meta",
            "does-not-exist.json",
        ])
        .fails();
}
