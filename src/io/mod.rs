//! Spreadsheet adapters: reading uploaded invoice workbooks into the
//! canonical model and writing a finished audit back out as a report
//! workbook.

pub mod excel_read;
pub mod excel_write;
