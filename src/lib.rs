//! Normalize broker investment reports into canonical tables and render them
//! as spreadsheets.
//!
//! A [`broker::Broker`] opens a file into a [`report::ReportHandle`], which
//! parses each [`table::TableKind`] at most once. [`view::export`] renders a
//! parsed table into a [`sheet::Sheet`] with a total row and styling.

pub mod broker;
pub mod cash_flow;
pub mod error;
pub mod headers;
pub mod raw;
pub mod report;
pub mod settings;
pub mod sheet;
pub mod table;
pub mod view;
