//! The one-page SmartDrive report.

use chrono::NaiveDateTime;
use log::info;

use crate::builder::{DocumentBuilder, DocumentError};
use crate::metrics::{MetricSet, Tip};
use crate::model::{Block, ReportLayout, TextStyle};

pub const REPORT_TITLE: &str = "SmartDrive - Smart Driving Report";
pub const REPORT_SUBTITLE: &str = "Prototype - Simulated Data";

/// File name offered for download and used for the mail attachment.
pub const PDF_FILE_NAME: &str = "smartdrive_report.pdf";

/// MIME type of [`ReportBytes`].
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Finished PDF for one submission.
#[derive(Clone, PartialEq, Eq)]
pub struct ReportBytes(Vec<u8>);

impl ReportBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for ReportBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ReportBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for ReportBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportBytes({} bytes)", self.0.len())
    }
}

/// Arranges title, results, tip and timestamp into the fixed page layout.
pub fn report_layout(metrics: &MetricSet, tip: &Tip, timestamp: NaiveDateTime) -> ReportLayout {
    ReportLayout::new(REPORT_TITLE)
        .with_block(Block::centered(REPORT_TITLE, TextStyle::bold(24)))
        .with_block(Block::centered(REPORT_SUBTITLE, TextStyle::regular(16)))
        .with_block(Block::spacing(3.0))
        .with_block(Block::paragraph("Results:", TextStyle::bold(18)))
        .with_blocks(metrics.iter().map(|(name, value)| {
            Block::paragraph(format!("{name}: {value}%"), TextStyle::regular(14))
        }))
        .with_block(Block::spacing(2.0))
        .with_block(Block::paragraph("Tip:", TextStyle::bold(16)))
        .with_block(Block::paragraph(tip.text(), TextStyle::regular(14)))
        .with_block(Block::spacing(2.0))
        .with_block(Block::paragraph(
            format!("Date: {}", timestamp.format(TIMESTAMP_FORMAT)),
            TextStyle::italic(12),
        ))
}

/// Renders the report for `metrics` and `tip` stamped with `timestamp`.
pub fn build_report(
    metrics: &MetricSet,
    tip: &Tip,
    timestamp: NaiveDateTime,
) -> Result<ReportBytes, DocumentError> {
    let layout = report_layout(metrics, tip, timestamp);
    let bytes = DocumentBuilder::new().render(&layout)?;
    info!("rendered report ({} bytes)", bytes.len());
    Ok(ReportBytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::select_tip;
    use crate::model::HorizontalAlignment;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|date| date.and_hms_opt(8, 5, 0))
            .unwrap()
    }

    #[test]
    fn layout_follows_page_order() {
        let metrics = MetricSet::from_scores([("Smart Driving", 90), ("Safe Stops", 55)]);
        let tip = select_tip(&metrics).unwrap();
        let layout = report_layout(&metrics, &tip, timestamp());

        assert_eq!(
            layout.visible_text(),
            vec![
                REPORT_TITLE,
                REPORT_SUBTITLE,
                "Results:",
                "Smart Driving: 90%",
                "Safe Stops: 55%",
                "Tip:",
                "Tip: Focus on improving Safe Stops (55%)",
                "Date: 2024-05-17 08:05",
            ]
        );
    }

    #[test]
    fn headings_are_centered_and_styled() {
        let metrics = MetricSet::from_scores([("Smart Driving", 90)]);
        let tip = select_tip(&metrics).unwrap();
        let layout = report_layout(&metrics, &tip, timestamp());
        let texts: Vec<_> = layout
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Text(text) => Some(text),
                Block::Break(_) => None,
            })
            .collect();

        assert_eq!(texts[0].alignment(), HorizontalAlignment::Center);
        assert_eq!(texts[0].style(), TextStyle::bold(24));
        assert_eq!(texts[1].alignment(), HorizontalAlignment::Center);
        assert_eq!(texts[2].alignment(), HorizontalAlignment::Left);
        assert_eq!(texts.last().map(|text| text.style()), Some(TextStyle::italic(12)));
        assert_eq!(
            layout.blocks().iter().filter(|block| matches!(block, Block::Break(_))).count(),
            3
        );
    }

    #[test]
    fn report_bytes_are_a_pdf() {
        if !crate::fonts::default_fonts_available() {
            eprintln!("Skipping report_bytes_are_a_pdf: no report font family found.");
            return;
        }
        let metrics = MetricSet::from_scores([("Smart Driving", 90), ("Safe Stops", 55)]);
        let tip = select_tip(&metrics).unwrap();
        let report = build_report(&metrics, &tip, timestamp()).unwrap();

        assert!(report.as_bytes().starts_with(b"%PDF-"));
        assert_eq!(format!("{report:?}"), format!("ReportBytes({} bytes)", report.len()));
    }
}
