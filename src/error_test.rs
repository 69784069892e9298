use super::*;

#[test]
fn application_error_displays_message_only() {
    let err = GatewayError::application("Invoice number already used");
    assert_eq!(err.to_string(), "Invoice number already used");
    assert_eq!(err.field_errors().map(BTreeMap::len), Some(0));
}

#[test]
fn transport_error_has_no_field_errors() {
    let err = GatewayError::Transport("server returned status 502".to_owned());
    assert!(err.field_errors().is_none());
}

#[test]
fn store_error_names_the_section() {
    assert_eq!(StoreError::NotFound("Invoices".to_owned()).to_string(), "section not found: Invoices");
}

#[test]
fn form_error_editability() {
    assert!(FormError::ValidationFailed(2).is_editable());
    assert!(FormError::SaveRejected("nope".to_owned()).is_editable());
    assert!(!FormError::SchemaLoadFailed("down".to_owned()).is_editable());
    assert!(!FormError::RecordLoadFailed("gone".to_owned()).is_editable());
}

#[test]
fn form_error_messages_are_user_legible() {
    assert_eq!(FormError::ValidationFailed(3).to_string(), "3 field(s) need attention");
    assert_eq!(FormError::SaveRejected("duplicate".to_owned()).to_string(), "save failed: duplicate");
}
