pub mod field_input;
pub mod load_sentinel;
pub mod notice;
pub mod record_modal;
pub mod search_panel;
pub mod section_card;
pub mod view_all_modal;
