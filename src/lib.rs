//! S3 Data Dashboard Library
//!
//! Core functionality for the browser dashboard: S3 access, file viewers,
//! tabular frames with statistics, and the axum application that renders
//! them.

pub mod dashboard;
pub mod frame;
pub mod s3;
pub mod settings;
pub mod viewers;
