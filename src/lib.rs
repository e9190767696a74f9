pub mod config;
pub mod db;
pub mod errors;
pub mod i18n;
pub mod license;
pub mod package;
