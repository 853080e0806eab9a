//! Library banner

use chrono::NaiveDate;
use crate::date::format_date;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LICENSE: &str = env!("CARGO_PKG_LICENSE");

/// Libraries the operations delegate to
pub const BACKENDS: [&str; 3] = ["lopdf 0.38", "pdfium-render 0.8", "image 0.25"];

/// Date of the last functional change, ISO 8601
pub const LAST_UPDATE: &str = "2026-10-18";

/// Multi-line description of the library: name, version, backends, last
/// update and license
pub fn banner() -> String {
    let authors = env!("CARGO_PKG_AUTHORS").replace(':', ", ");
    let updated = LAST_UPDATE
        .parse::<NaiveDate>()
        .map(|date| format_date(&date))
        .unwrap_or_else(|_| LAST_UPDATE.to_string());

    format!(
        "{} by {}\n{} version: {}\nRelies on {}\nLast Update: {}\nLicense: {}",
        NAME,
        authors,
        NAME,
        VERSION,
        BACKENDS.join(", "),
        updated,
        LICENSE,
    )
}
