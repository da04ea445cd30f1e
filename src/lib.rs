//! SmartDrive report generation: simulated driving metrics, charts, a one-page
//! PDF and optional delivery by mail.

pub mod builder;
pub mod charts;
pub mod config;
pub mod controller;
pub mod fonts;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod report;

pub use controller::{Feedback, FeedbackLevel, FormController, SubmissionOutcome, SubmissionState};
pub use metrics::{MetricSet, Tip};
pub use report::ReportBytes;
