//! Output artifact writers: HTML reports, XLSX workbooks, console tables

pub mod html;
pub mod tables;
pub mod xlsx;
