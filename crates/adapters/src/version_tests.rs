use super::*;

fn v(s: &str) -> PlatformVersion {
    PlatformVersion::new(s)
}

#[test]
fn latest_is_the_maximum_version() {
    let status = FakeVersionStatus::new()
        .with_version(v("8.1.0"), true)
        .with_version(v("8.2.0"), false)
        .with_version(v("7.9.0"), true);
    assert_eq!(status.latest(), Some(v("8.2.0")));
}

#[test]
fn latest_on_major_filters_by_major_component() {
    let status = FakeVersionStatus::new()
        .with_version(v("8.1.0"), true)
        .with_version(v("8.5.0"), true)
        .with_version(v("9.0.0"), false);
    assert_eq!(status.latest_on_major(8), Some(v("8.5.0")));
}

#[test]
fn latest_on_unknown_major_is_none() {
    let status = FakeVersionStatus::new().with_version(v("8.1.0"), true);
    assert_eq!(status.latest_on_major(9), None);
}

#[test]
fn is_active_reflects_construction() {
    let status = FakeVersionStatus::new()
        .with_version(v("8.1.0"), true)
        .with_version(v("8.2.0"), false);
    assert!(status.is_active(&v("8.1.0")));
    assert!(!status.is_active(&v("8.2.0")));
}

#[test]
fn untabled_pair_is_neither_accepted_nor_refused() {
    let compat = FakeVersionCompatibility::new();
    assert!(!compat.accept(&v("8.1.0"), &v("8.1.0")));
    assert!(!compat.refuse(&v("8.1.0"), &v("8.1.0")));
}

#[test]
fn accepted_pair_is_accepted_and_not_refused() {
    let compat = FakeVersionCompatibility::new().accept_pair(v("8.1.0"), v("8.1.0"));
    assert!(compat.accept(&v("8.1.0"), &v("8.1.0")));
    assert!(!compat.refuse(&v("8.1.0"), &v("8.1.0")));
}

#[test]
fn refused_pair_is_refused() {
    let compat = FakeVersionCompatibility::new().refuse_pair(v("8.1.0"), v("7.0.0"));
    assert!(compat.refuse(&v("8.1.0"), &v("7.0.0")));
}
