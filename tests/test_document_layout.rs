//! Document layout tests
//!
//! Block accounting, page breaking, decorator invocation and deterministic
//! output of the page-flowing document builder driven by content actions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use receipt_composer::actions::{ContentAction, NColumnTable, TableFonts};
use receipt_composer::config::PageMargins;
use receipt_composer::decorator::{BandDecorator, PageContext, PageDecorator};
use receipt_composer::error::Error;
use receipt_composer::style::{Alignment, Color, FontDescriptor};
use receipt_composer::writer::{DocumentBuilder, DocumentMetadata, ImageSource, PageCanvas, PageSize};

/// Records the page number of every invocation.
#[derive(Clone, Default)]
struct PageRecorder {
    pages: Arc<Mutex<Vec<usize>>>,
}

impl PageDecorator for PageRecorder {
    fn on_end_page(&self, page: &PageContext<'_>, _canvas: &mut PageCanvas<'_>) {
        self.pages.lock().unwrap().push(page.page_number);
    }
}

struct Counter(Arc<AtomicUsize>);

impl PageDecorator for Counter {
    fn on_end_page(&self, _page: &PageContext<'_>, _canvas: &mut PageCanvas<'_>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn builder() -> DocumentBuilder {
    DocumentBuilder::new(PageSize::A4, PageMargins::default())
        .with_creation_date(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn statement(rows: usize) -> NColumnTable {
    let data = (0..rows)
        .map(|i| strings(&[&i.to_string(), "rrn", "₹100", "₹1", "Success"]))
        .collect();
    NColumnTable::new(
        strings(&["TXN No.", "RRN No.", "Amount", "Fee", "Status"]),
        data,
        TableFonts::default(),
    )
    .unwrap()
}

mod block_count_tests {
    use super::*;

    #[test]
    fn test_one_block_per_non_table_action() {
        let font = FontDescriptor::helvetica(12.0).shared();
        let long_text = "A paragraph long enough to wrap across several lines of the page. ".repeat(8);
        let actions = vec![
            ContentAction::title("Receipt", font.clone(), Alignment::Center),
            ContentAction::title(long_text, font.clone(), Alignment::Left),
            ContentAction::banner("Aadhaar Enabled Payment System", 25.0),
            ContentAction::two_column("Amount", "Rs. 2500.00", font.clone()),
            ContentAction::key_value("Bank Name", "SBI", font.clone()),
            ContentAction::alternating("Status", "Success", font.clone(), 0),
            ContentAction::alternating("Status", "Success", font.clone(), 1),
            ContentAction::image(ImageSource::path("/nonexistent/logo.png"), 100, 75, Alignment::Center),
            ContentAction::separator(1.0, Color::BLACK, 80.0, Alignment::Center),
            ContentAction::spacer(),
        ];

        let mut doc = builder();
        for action in &actions {
            assert_eq!(action.block_count(), 1);
            action.apply(&mut doc);
        }
        assert_eq!(doc.block_count(), actions.len());

        let finished = doc.finish().unwrap();
        assert_eq!(finished.block_count, actions.len());
        assert_eq!(finished.page_count, 1);
    }

    #[test]
    fn test_table_blocks_are_header_rows_and_totals() {
        let action = ContentAction::from(statement(4));
        assert_eq!(action.block_count(), 6);

        let mut doc = builder();
        action.apply(&mut doc);
        assert_eq!(doc.block_count(), 6);
    }

    #[test]
    fn test_table_without_headers_adds_nothing() {
        let table = NColumnTable::new(Vec::new(), Vec::new(), TableFonts::default()).unwrap();
        let action = ContentAction::from(table);
        assert_eq!(action.block_count(), 0);

        let mut doc = builder();
        action.apply(&mut doc);
        assert_eq!(doc.block_count(), 0);
        assert_eq!(doc.finish().unwrap().page_count, 1);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = NColumnTable::new(
            strings(&["TXN No.", "Amount", "Fee"]),
            vec![strings(&["1", "5000", "50"]), strings(&["2", "3000"])],
            TableFonts::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_weight_count_must_match_headers() {
        let err = statement(1).with_weights(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::ColumnSpec { expected: 5, found: 2 }));
        assert!(statement(1).with_weights(vec![1.0, 1.0, 2.0, 1.0, 1.0]).is_ok());
    }
}

mod pagination_tests {
    use super::*;

    #[test]
    fn test_spacers_fill_pages() {
        // 770pt of content height holds 42 spacers of 18pt.
        let recorder = PageRecorder::default();
        let mut doc = builder();
        doc.set_decorator(Some(Box::new(recorder.clone())));
        for _ in 0..100 {
            ContentAction::spacer().apply(&mut doc);
        }
        assert_eq!(doc.page_count(), 3);

        let finished = doc.finish().unwrap();
        assert_eq!(finished.page_count, 3);
        assert_eq!(finished.decorations, 3);
        assert_eq!(*recorder.pages.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_count_matches_content_height() {
        // Letter leaves 720pt between the margins: exactly 40 units of 18pt,
        // so line content packs without slack.
        let font = FontDescriptor::helvetica(12.0);
        assert_eq!(font.leading(), 18.0);

        let cases = [(0, 1), (40, 0), (40, 1), (39, 2), (10, 100), (0, 80), (0, 81), (25, 56)];
        for (spacers, lines) in cases {
            let mut doc = DocumentBuilder::new(PageSize::Letter, PageMargins::default());
            let usable = doc.usable_height();
            for _ in 0..spacers {
                ContentAction::spacer().apply(&mut doc);
            }
            if lines > 0 {
                let text = (0..lines).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
                doc.add_paragraph(&text, &font, Alignment::Left);
            }

            let content = (spacers + lines) as f32 * 18.0;
            let expected = ((content / usable).ceil() as usize).max(1);
            assert_eq!(doc.page_count(), expected, "{} spacers, {} lines", spacers, lines);
        }
    }

    #[test]
    fn test_unit_slack_accumulates_per_page() {
        // 770pt holds 42 spacers with 14pt to spare on every page.
        let mut doc = builder();
        for _ in 0..2000 {
            ContentAction::spacer().apply(&mut doc);
        }
        assert_eq!(doc.usable_height(), 770.0);
        assert_eq!(doc.page_count(), (2000 + 41) / 42);
    }

    #[test]
    fn test_long_title_text_flows_inside_margins() {
        let text = vec!["word"; 2000].join(" ");
        let font = FontDescriptor::helvetica(12.0).shared();
        let mut doc = builder();
        ContentAction::title(text, font, Alignment::Left).apply(&mut doc);

        let finished = doc.finish().unwrap();
        assert!(finished.page_count > 1);
        assert_eq!(finished.block_count, 1);

        let pdf = String::from_utf8_lossy(&finished.bytes);
        let mut baselines = 0;
        for line in pdf.lines().filter(|l| l.ends_with(" Tm")) {
            let y: f32 = line.split_whitespace().nth(5).unwrap().parse().unwrap();
            assert!(y >= 36.0, "baseline {} below the bottom margin", y);
            assert!(y <= 842.0 - 36.0);
            baselines += 1;
        }
        assert!(baselines > 0);
        let words: usize = pdf
            .lines()
            .filter(|l| l.ends_with(" Tj"))
            .map(|l| l.matches("word").count())
            .sum();
        assert_eq!(words, 2000);
    }

    #[test]
    fn test_decorator_fires_once_for_single_page() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut doc = builder();
        doc.set_decorator(Some(Box::new(Counter(Arc::clone(&count)))));
        ContentAction::banner("Receipt", 25.0).apply(&mut doc);
        let finished = doc.finish().unwrap();
        assert_eq!(finished.decorations, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_document_is_one_decorated_page() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut doc = builder();
        doc.set_decorator(Some(Box::new(Counter(Arc::clone(&count)))));
        let finished = doc.finish().unwrap();
        assert_eq!(finished.page_count, 1);
        assert_eq!(finished.block_count, 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_long_table_spans_pages_and_decorates_each() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut doc = builder();
        doc.set_decorator(Some(Box::new(Counter(Arc::clone(&count)))));
        ContentAction::from(statement(120)).apply(&mut doc);
        let finished = doc.finish().unwrap();
        assert!(finished.page_count > 1);
        assert_eq!(finished.block_count, 122);
        assert_eq!(count.load(Ordering::SeqCst), finished.page_count);
    }

    #[test]
    fn test_swapped_decorator_draws_last_page() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut doc = builder();
        doc.set_decorator(Some(Box::new(Counter(Arc::clone(&first)))));
        for _ in 0..50 {
            ContentAction::spacer().apply(&mut doc);
        }
        let previous = doc.set_decorator(Some(Box::new(Counter(Arc::clone(&second)))));
        assert!(previous.is_some());
        doc.finish().unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}

mod output_tests {
    use super::*;

    fn receipt(compress: bool) -> Vec<u8> {
        let font = FontDescriptor::helvetica(18.0).shared();
        let mut doc = builder()
            .with_metadata(DocumentMetadata::new().title("Receipt"))
            .with_compression(compress);
        doc.set_decorator(Some(Box::new(BandDecorator::edge_footer("Page {page}"))));
        for action in [
            ContentAction::banner("Aadhaar Enabled Payment System", 25.0),
            ContentAction::key_value("Transaction Amount", "₹2500.00", font.clone()),
            ContentAction::alternating("Bank Name", "SBI", font, 2),
            ContentAction::from(statement(3)),
        ] {
            action.apply(&mut doc);
        }
        doc.finish().unwrap().bytes
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = receipt(false);
        let b = receipt(false);
        assert_eq!(a.len(), b.len());
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_structure() {
        let bytes = receipt(false);
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Receipt)"));
        assert!(text.contains("/BaseFont /Times-Roman"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("Rs.2500.00"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_compression_shrinks_content() {
        let plain = receipt(false);
        let packed = receipt(true);
        assert!(String::from_utf8_lossy(&packed).contains("/FlateDecode"));
        assert!(packed.len() < plain.len());
    }
}
