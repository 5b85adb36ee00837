pub mod create_dialog;
pub mod key_table;
pub mod toast;
