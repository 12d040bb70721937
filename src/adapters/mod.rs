//! Concrete adapter implementations of the port traits.

pub mod alpha_vantage_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod report_tables;
pub mod sheets_report_adapter;
pub mod telegram_adapter;
