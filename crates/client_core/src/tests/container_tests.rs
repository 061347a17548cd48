use super::*;
use chrono::Duration;
use shared::domain::{Quality, QualityId};

fn quality(id: &str, name: &str) -> Quality {
    Quality {
        id: QualityId::from(id),
        name: name.into(),
        color: "primary".into(),
    }
}

fn loaded(items: Vec<Quality>) -> EntityContainer<Quality> {
    let mut container = EntityContainer::new();
    container.requested();
    container.received(items, Utc::now());
    container
}

#[test]
fn starts_empty_and_idle() {
    let container: EntityContainer<Quality> = EntityContainer::new();
    assert!(container.entities().is_none());
    assert!(!container.is_loading());
    assert!(container.error().is_none());
    assert!(!container.has_received());
}

#[test]
fn requested_keeps_existing_entities_while_loading() {
    let mut container = loaded(vec![quality("q1", "calm")]);
    container.requested();
    assert!(container.is_loading());
    assert_eq!(container.entities().map(<[_]>::len), Some(1));
}

#[test]
fn received_replaces_entities_and_clears_error() {
    let mut container = loaded(vec![quality("q1", "calm")]);
    container.requested();
    container.failed(ErrorInfo::message("timeout"));
    container.requested();
    container.received(vec![quality("q2", "bold")], Utc::now());

    assert!(!container.is_loading());
    assert!(container.error().is_none());
    assert_eq!(container.entities(), Some(&[quality("q2", "bold")][..]));
}

#[test]
fn failure_keeps_stale_entities() {
    let mut container = loaded(vec![quality("a", "calm"), quality("b", "bold")]);
    container.requested();
    container.failed(ErrorInfo::message("network down"));

    assert!(!container.is_loading());
    assert_eq!(container.error(), Some(&ErrorInfo::message("network down")));
    assert_eq!(
        container.entities(),
        Some(&[quality("a", "calm"), quality("b", "bold")][..])
    );
}

#[test]
fn appended_item_is_found_by_id() {
    let mut container = loaded(Vec::new());
    container.appended(quality("q9", "kind"));
    assert_eq!(container.find_by_id("q9"), Some(&quality("q9", "kind")));
}

#[test]
fn appended_before_first_receipt_creates_collection() {
    let mut container = EntityContainer::new();
    container.appended(quality("q1", "calm"));
    assert_eq!(container.entities(), Some(&[quality("q1", "calm")][..]));
}

#[test]
fn removing_same_id_twice_is_a_no_op_the_second_time() {
    let mut container = loaded(vec![quality("a", "calm"), quality("b", "bold")]);
    container.removed_by_id("a");
    let after_first = container.clone();
    container.removed_by_id("a");
    assert_eq!(container, after_first);
    assert_eq!(container.entities(), Some(&[quality("b", "bold")][..]));
}

#[test]
fn replace_overwrites_in_place() {
    let mut container = loaded(vec![quality("a", "calm"), quality("b", "bold")]);
    assert!(container.replaced_by_id(quality("a", "serene")));
    assert_eq!(
        container.entities(),
        Some(&[quality("a", "serene"), quality("b", "bold")][..])
    );
}

#[test]
fn replace_of_unknown_id_changes_nothing() {
    let mut container = loaded(vec![quality("a", "calm")]);
    let before = container.clone();
    assert!(!container.replaced_by_id(quality("zzz", "ghost")));
    assert_eq!(container, before);

    let mut never_loaded: EntityContainer<Quality> = EntityContainer::new();
    assert!(!never_loaded.replaced_by_id(quality("a", "calm")));
    assert!(never_loaded.entities().is_none());
}

#[test]
fn only_cacheable_containers_stamp_last_fetch() {
    let at = Utc::now() - Duration::minutes(3);

    let mut plain: EntityContainer<Quality> = EntityContainer::new();
    plain.received(Vec::new(), at);
    assert!(plain.last_fetch().is_none());

    let mut cached: EntityContainer<Quality> = EntityContainer::cacheable();
    cached.received(Vec::new(), at);
    assert_eq!(cached.last_fetch(), Some(at));
}

#[test]
fn mutation_marker_changes_nothing() {
    let mut container = loaded(vec![quality("a", "calm")]);
    let before = container.clone();
    assert!(container.apply(ContainerEvent::MutationRequested(Mutation::Remove), Utc::now()));
    assert_eq!(container, before);
}

#[test]
fn loading_flag_tracks_every_interleaving_of_two_requests() {
    let mut container: EntityContainer<Quality> = EntityContainer::new();
    container.apply(ContainerEvent::Requested, Utc::now());
    container.apply(ContainerEvent::Requested, Utc::now());
    assert!(container.is_loading());

    container.apply(ContainerEvent::Received(vec![quality("first", "a")]), Utc::now());
    assert!(!container.is_loading());

    // The terminal event that lands last wins.
    container.apply(
        ContainerEvent::Failed(ErrorInfo::message("second failed")),
        Utc::now(),
    );
    assert!(!container.is_loading());
    assert_eq!(container.entities(), Some(&[quality("first", "a")][..]));
    assert_eq!(container.error(), Some(&ErrorInfo::message("second failed")));
}

#[test]
fn reset_returns_to_initial_state() {
    let mut container: EntityContainer<Quality> = EntityContainer::cacheable();
    container.received(vec![quality("a", "calm")], Utc::now());
    container.failed(ErrorInfo::message("boom"));
    container.reset();
    assert_eq!(container, EntityContainer::cacheable());
}
