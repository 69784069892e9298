use super::*;

#[test]
fn no_modals_when_nothing_is_open() {
    assert!(modal_layers(false, false).is_empty());
}

#[test]
fn record_editor_stacks_above_view_all() {
    assert_eq!(modal_layers(true, true), vec![ModalLayer::ViewAll, ModalLayer::Record]);
}

#[test]
fn each_modal_renders_alone() {
    assert_eq!(modal_layers(true, false), vec![ModalLayer::ViewAll]);
    assert_eq!(modal_layers(false, true), vec![ModalLayer::Record]);
}
