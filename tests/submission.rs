use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use smartdrive_report::controller::{FeedbackLevel, FormController, SubmissionState};
use smartdrive_report::fonts;
use smartdrive_report::metrics::Metric;
use smartdrive_report::notify::{Notifier, SendError};

#[derive(Clone, Default)]
struct Outbox(Rc<RefCell<Vec<(String, Vec<u8>)>>>);

impl Notifier for Outbox {
    fn send(&self, recipient: &str, report: &[u8]) -> Result<(), SendError> {
        self.0.borrow_mut().push((recipient.to_owned(), report.to_vec()));
        Ok(())
    }
}

#[test]
fn submission_produces_and_sends_one_report() {
    if !fonts::default_fonts_available() {
        eprintln!(
            "Skipping submission_produces_and_sends_one_report: no report font family found. Set {}.",
            fonts::FONTS_DIR_ENV
        );
        return;
    }
    let outbox = Outbox::default();
    let mut controller = FormController::new(Some(Box::new(outbox.clone())));
    let outcome = controller.submit("user@example.com", &mut StdRng::seed_from_u64(2024));

    assert_eq!(outcome.final_state(), SubmissionState::Done);
    assert_eq!(controller.state(), SubmissionState::Idle);

    let metrics = outcome.metrics.as_ref().expect("metrics generated");
    assert_eq!(metrics.len(), 6);
    for (metric, (name, value)) in Metric::ALL.iter().zip(metrics.iter()) {
        assert_eq!(metric.label(), name);
        assert!(metric.range().contains(&value), "{name} out of range: {value}");
    }

    let tip = outcome.tip.as_ref().expect("tip selected");
    let lowest = metrics.iter().map(|(_, value)| value).min();
    assert_eq!(Some(tip.value()), lowest);
    assert_eq!(metrics.get(tip.metric()), Some(tip.value()));

    let report = outcome.report.as_ref().expect("report built");
    assert!(report.as_bytes().starts_with(b"%PDF-"));

    let sent = outbox.0.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "user@example.com");
    assert_eq!(sent[0].1, report.as_bytes());

    assert!(outcome.sent);
    assert!(outcome.messages(FeedbackLevel::Error).next().is_none());
}

#[test]
fn rejected_submission_sends_nothing() {
    let outbox = Outbox::default();
    let mut controller = FormController::new(Some(Box::new(outbox.clone())));
    let outcome = controller.submit("", &mut StdRng::seed_from_u64(1));

    assert!(outcome.is_rejected());
    assert!(outcome.report.is_none());
    assert!(outbox.0.borrow().is_empty());
}
