//! Orchestration of a single form submission.
//!
//! A submission walks a fixed sequence of states. Chart failures are reported
//! and the flow carries on; a document failure ends the flow before sending
//! because there is nothing to download or mail.

use std::error::Error;
use std::fmt;

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::builder::DocumentError;
use crate::charts::{self, ChartPair, RenderError};
use crate::metrics::{select_tip, MetricSet, Tip};
use crate::notify::{Notifier, SendError};
use crate::report::{self, ReportBytes, PDF_FILE_NAME};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    Idle,
    Validating,
    Rejected,
    Generating,
    Rendering,
    Building,
    Sending,
    Done,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid email address.")]
    EmptyRecipient,
}

/// Accepts any non-empty recipient unchanged; the relay decides the rest.
pub fn validate_recipient(recipient: &str) -> Result<&str, ValidationError> {
    if recipient.is_empty() {
        Err(ValidationError::EmptyRecipient)
    } else {
        Ok(recipient)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible message produced while handling a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
    /// Error source chain, one cause per line.
    pub detail: Option<String>,
}

impl Feedback {
    pub fn new(level: FeedbackLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            detail: None,
        }
    }

    /// Error feedback of the form `"{context}: {err}"` with the causes of
    /// `err` as detail.
    pub fn from_error(context: &str, err: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        Self {
            level: FeedbackLevel::Error,
            message: format!("{context}: {err}"),
            detail: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

/// Everything shown to the user after one submission.
#[derive(Clone, Debug)]
pub struct SubmissionOutcome {
    pub recipient: String,
    /// States entered, in order, excluding the surrounding `Idle`.
    pub trail: Vec<SubmissionState>,
    pub metrics: Option<MetricSet>,
    pub tip: Option<Tip>,
    pub charts: Option<ChartPair>,
    pub report: Option<ReportBytes>,
    pub sent: bool,
    pub feedback: Vec<Feedback>,
}

impl SubmissionOutcome {
    fn new(recipient: &str) -> Self {
        Self {
            recipient: recipient.to_owned(),
            trail: Vec::new(),
            metrics: None,
            tip: None,
            charts: None,
            report: None,
            sent: false,
            feedback: Vec::new(),
        }
    }

    /// The last state reached before returning to `Idle`.
    pub fn final_state(&self) -> SubmissionState {
        self.trail.last().copied().unwrap_or(SubmissionState::Idle)
    }

    pub fn is_rejected(&self) -> bool {
        self.final_state() == SubmissionState::Rejected
    }

    /// Messages at `level`, in the order they were raised.
    pub fn messages(&self, level: FeedbackLevel) -> impl Iterator<Item = &Feedback> + '_ {
        self.feedback.iter().filter(move |item| item.level == level)
    }
}

pub type ChartRenderer = fn(&MetricSet) -> Result<ChartPair, RenderError>;
pub type ReportRenderer =
    fn(&MetricSet, &Tip, NaiveDateTime) -> Result<ReportBytes, DocumentError>;

/// Runs submissions one at a time; nothing but the current state survives
/// between them.
pub struct FormController {
    notifier: Option<Box<dyn Notifier>>,
    render_charts: ChartRenderer,
    render_report: ReportRenderer,
    state: SubmissionState,
}

impl FormController {
    /// Creates a controller. Without a notifier every send attempt fails with
    /// [`SendError::NotConfigured`].
    pub fn new(notifier: Option<Box<dyn Notifier>>) -> Self {
        Self {
            notifier,
            render_charts: charts::render_charts,
            render_report: report::build_report,
            state: SubmissionState::Idle,
        }
    }

    /// Replaces the chart step and returns the updated controller.
    pub fn with_chart_renderer(mut self, render: ChartRenderer) -> Self {
        self.render_charts = render;
        self
    }

    /// Replaces the document step and returns the updated controller.
    pub fn with_report_renderer(mut self, render: ReportRenderer) -> Self {
        self.render_report = render;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Handles one submission stamped with the current local time.
    pub fn submit<R: Rng + ?Sized>(&mut self, recipient: &str, rng: &mut R) -> SubmissionOutcome {
        self.submit_at(recipient, rng, Local::now().naive_local())
    }

    /// Handles one submission with an explicit report timestamp.
    pub fn submit_at<R: Rng + ?Sized>(
        &mut self,
        recipient: &str,
        rng: &mut R,
        timestamp: NaiveDateTime,
    ) -> SubmissionOutcome {
        let mut outcome = SubmissionOutcome::new(recipient);
        self.run(&mut outcome, recipient, rng, timestamp);
        self.state = SubmissionState::Idle;
        debug!("submission finished: {:?}", outcome.trail);
        outcome
    }

    fn enter(&mut self, outcome: &mut SubmissionOutcome, state: SubmissionState) {
        debug!("submission state {} -> {}", self.state, state);
        self.state = state;
        outcome.trail.push(state);
    }

    /// Generates, charts and builds a report without a recipient. Nothing is
    /// validated or sent.
    pub fn preview<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SubmissionOutcome {
        self.preview_at(rng, Local::now().naive_local())
    }

    /// Like [`FormController::preview`] with an explicit report timestamp.
    pub fn preview_at<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        timestamp: NaiveDateTime,
    ) -> SubmissionOutcome {
        let mut outcome = SubmissionOutcome::new("");
        let report = self.produce(&mut outcome, rng, timestamp);
        outcome.report = report;
        self.enter(&mut outcome, SubmissionState::Done);
        self.state = SubmissionState::Idle;
        debug!("preview finished: {:?}", outcome.trail);
        outcome
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        outcome: &mut SubmissionOutcome,
        recipient: &str,
        rng: &mut R,
        timestamp: NaiveDateTime,
    ) {
        self.enter(outcome, SubmissionState::Validating);
        let recipient = match validate_recipient(recipient) {
            Ok(recipient) => recipient,
            Err(err) => {
                warn!("submission rejected: {err}");
                self.enter(outcome, SubmissionState::Rejected);
                outcome
                    .feedback
                    .push(Feedback::new(FeedbackLevel::Warning, err.to_string()));
                return;
            }
        };

        let Some(report) = self.produce(outcome, rng, timestamp) else {
            self.enter(outcome, SubmissionState::Done);
            return;
        };

        self.enter(outcome, SubmissionState::Sending);
        let sent = match &self.notifier {
            Some(notifier) => notifier.send(recipient, report.as_bytes()),
            None => Err(SendError::NotConfigured),
        };
        match sent {
            Ok(()) => {
                outcome.sent = true;
                outcome.feedback.push(Feedback::new(
                    FeedbackLevel::Success,
                    format!("Report sent to: {recipient}"),
                ));
            }
            Err(err) => {
                error!("sending report failed: {err}");
                outcome.feedback.push(Feedback::from_error("Failed to send", &err));
            }
        }
        outcome.report = Some(report);

        self.enter(outcome, SubmissionState::Done);
    }

    /// Generating, Rendering and Building. `None` means the flow stops here.
    fn produce<R: Rng + ?Sized>(
        &mut self,
        outcome: &mut SubmissionOutcome,
        rng: &mut R,
        timestamp: NaiveDateTime,
    ) -> Option<ReportBytes> {
        self.enter(outcome, SubmissionState::Generating);
        let metrics = MetricSet::generate(rng);
        let tip = match select_tip(&metrics) {
            Ok(tip) => tip,
            Err(err) => {
                error!("tip selection failed: {err}");
                outcome
                    .feedback
                    .push(Feedback::from_error("An error occurred", &err));
                outcome.metrics = Some(metrics);
                return None;
            }
        };
        info!("generated metrics; weakest is {} ({}%)", tip.metric(), tip.value());
        outcome
            .feedback
            .push(Feedback::new(FeedbackLevel::Success, tip.text()));

        self.enter(outcome, SubmissionState::Rendering);
        match (self.render_charts)(&metrics) {
            Ok(charts) => outcome.charts = Some(charts),
            Err(err) => {
                error!("chart generation failed: {err}");
                outcome
                    .feedback
                    .push(Feedback::from_error("Chart generation error", &err));
            }
        }

        self.enter(outcome, SubmissionState::Building);
        let built = (self.render_report)(&metrics, &tip, timestamp);
        outcome.metrics = Some(metrics);
        outcome.tip = Some(tip);
        match built {
            Ok(report) => {
                outcome.feedback.push(Feedback::new(
                    FeedbackLevel::Info,
                    format!("Report ready: {PDF_FILE_NAME} ({} bytes)", report.len()),
                ));
                Some(report)
            }
            Err(err) => {
                error!("PDF generation failed: {err}");
                outcome
                    .feedback
                    .push(Feedback::from_error("PDF generation error", &err));
                None
            }
        }
    }
}
