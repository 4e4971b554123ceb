/// Quarterly [Financial Statement Data Sets] archives: download, extraction,
/// and member verification.
///
/// [Financial Statement Data Sets]: https://www.sec.gov/dera/data/financial-statement-data-sets
pub mod statements;

/// Structured outcome of a fetch, and its flat run-log record.
pub mod run;
