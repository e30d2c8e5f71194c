//! Reference content providers.
//!
//! Ready-made documents used by the demo binary and the integration tests:
//! a payment receipt with banded edge decorations, a compact receipt led by
//! images, and a transaction statement with a totals row.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::actions::{ContentAction, ContentProvider, NColumnTable, TableFonts};
use crate::aggregate::CurrencyFormat;
use crate::decorator::{BandDecorator, PageDecorator};
use crate::style::{Alignment, Color, FontDescriptor};
use crate::writer::{BorderStyle, ImageSource};

fn body_font() -> FontDescriptor {
    FontDescriptor::helvetica(18.0)
}

/// Aadhaar payment receipt: banner, key/value rows, alternating rows, and
/// a right-aligned sign-off. Decorated with orange/purple bands at the top
/// edge, replaced by a footer band before the last page closes.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    /// Lines shown as label/value pairs
    pub entries: Vec<(String, String)>,
    /// Sign-off below the entries
    pub company: String,
    /// Note printed in the footer band
    pub footer_note: String,
}

impl Default for PaymentReceipt {
    fn default() -> Self {
        Self {
            entries: vec![
                ("Status".to_string(), "Success".to_string()),
                ("Transaction Amount".to_string(), "Rs. 2500.00".to_string()),
                ("Bank Name".to_string(), "SBI".to_string()),
            ],
            company: "SOME-COMPANY".to_string(),
            footer_note: "Page {page}".to_string(),
        }
    }
}

impl ContentProvider for PaymentReceipt {
    fn actions(&self) -> Vec<Option<ContentAction>> {
        let font = body_font().shared();
        let mut actions = vec![
            Some(ContentAction::banner("Aadhaar Enabled Payment System", 25.0)),
            Some(ContentAction::spacer()),
            Some(ContentAction::spacer()),
            Some(ContentAction::separator(1.0, Color::BLACK.over_white(68), 100.0, Alignment::Center)),
        ];
        actions.extend(
            self.entries
                .iter()
                .map(|(label, value)| Some(ContentAction::key_value(label, value, font.clone()))),
        );
        actions.extend(self.entries.iter().enumerate().map(|(i, (label, value))| {
            Some(ContentAction::alternating(label, value, font.clone(), i))
        }));
        actions.push(Some(ContentAction::spacer()));
        actions.push(Some(ContentAction::title(
            "Thank You",
            FontDescriptor::times(22.0).with_color(Color::ACCENT).shared(),
            Alignment::Right,
        )));
        actions.push(Some(ContentAction::title(
            &self.company,
            FontDescriptor::times(24.0).shared(),
            Alignment::Right,
        )));
        actions
    }

    fn opening_decorator(&self) -> Option<Box<dyn PageDecorator>> {
        Some(Box::new(BandDecorator::edge_header()))
    }

    fn closing_decorator(&self) -> Option<Box<dyn PageDecorator>> {
        Some(Box::new(BandDecorator::edge_footer(&self.footer_note)))
    }
}

/// Small generated icon: a filled disc of `color` on a transparent square.
pub fn icon(size: u32, color: Color) -> DynamicImage {
    let center = size as f32 / 2.0;
    let radius = center * 0.9;
    let image = RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        if dx * dx + dy * dy <= radius * radius {
            Rgba([color.r, color.g, color.b, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    DynamicImage::ImageRgba8(image)
}

/// Receipt led by two icons side by side and a centered logo, followed by
/// label/value rows in the 2:3:1:1 layout.
#[derive(Debug, Clone)]
pub struct CompactReceipt {
    /// Label/value rows
    pub entries: Vec<(String, String)>,
}

impl Default for CompactReceipt {
    fn default() -> Self {
        let entries = [
            ("Status", "Success"),
            ("Amount", "Rs. 2500.00"),
            ("Bank Name", "SBI"),
            ("Status2", "Success"),
            ("Amount2", "Rs. 2500.00"),
            ("Bank Name2", "SBI"),
        ];
        Self {
            entries: entries
                .iter()
                .map(|(l, v)| (l.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ContentProvider for CompactReceipt {
    fn actions(&self) -> Vec<Option<ContentAction>> {
        let font = body_font().shared();
        let mut actions = vec![
            Some(ContentAction::image_pair(
                ImageSource::pixels(icon(24, Color::BLACK)),
                ImageSource::pixels(icon(48, Color::rgb(61, 220, 132))),
                100,
                75,
            )),
            Some(ContentAction::image(
                ImageSource::pixels(icon(24, Color::ORANGE)),
                100,
                75,
                Alignment::Center,
            )),
            Some(ContentAction::banner("Something-- Receipt", 25.0)),
            Some(ContentAction::spacer()),
        ];
        actions.extend(
            self.entries
                .iter()
                .map(|(label, value)| Some(ContentAction::two_column(label, value, font.clone()))),
        );
        actions.push(Some(ContentAction::spacer()));
        actions
    }
}

/// Table of transactions with amount and fee totals.
#[derive(Debug, Clone)]
pub struct TransactionStatement {
    /// Rows of `TXN No., RRN No., Amount, Fee, Status`
    pub rows: Vec<Vec<String>>,
    /// Marker stripped from amounts and used for totals
    pub currency: CurrencyFormat,
}

impl TransactionStatement {
    /// Column headers.
    pub const HEADERS: [&'static str; 5] = ["TXN No.", "RRN No.", "Amount", "Fee", "Status"];

    /// Statement over `rows`.
    pub fn new(rows: Vec<Vec<String>>, currency: CurrencyFormat) -> Self {
        Self { rows, currency }
    }
}

impl ContentProvider for TransactionStatement {
    fn actions(&self) -> Vec<Option<ContentAction>> {
        let headers = Self::HEADERS.iter().map(|h| h.to_string()).collect();
        let table = NColumnTable::new(headers, self.rows.clone(), TableFonts::default())
            .map(|t| {
                t.with_currency(self.currency.clone())
                    .with_rule(BorderStyle::new(0.5, Color::LIGHT_GREY))
            });
        let table = match table {
            Ok(t) => Some(ContentAction::from(t)),
            Err(e) => {
                log::warn!("Skipping statement table: {}", e);
                None
            },
        };
        vec![
            Some(ContentAction::banner("Transaction Statement", 25.0)),
            Some(ContentAction::spacer()),
            table,
        ]
    }

    fn opening_decorator(&self) -> Option<Box<dyn PageDecorator>> {
        Some(Box::new(
            BandDecorator::footer(
                "{title} - page {page}",
                FontDescriptor::helvetica(9.0).shared(),
                Color::ORANGE,
                Color::PURPLE,
                1.0,
            )
            .with_outline(2.0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_receipt_actions() {
        let receipt = PaymentReceipt::default();
        let actions = receipt.actions();
        assert_eq!(actions.len(), 13);
        assert!(actions.iter().all(Option::is_some));
        let alternating: Vec<usize> = actions
            .iter()
            .flatten()
            .filter_map(|a| match a {
                ContentAction::AlternatingRow(r) => Some(r.row_index),
                _ => None,
            })
            .collect();
        assert_eq!(alternating, vec![0, 1, 2]);
        assert!(receipt.opening_decorator().is_some());
        assert!(receipt.closing_decorator().is_some());
    }

    #[test]
    fn test_compact_receipt_actions() {
        let actions = CompactReceipt::default().actions();
        assert_eq!(actions.len(), 11);
        assert!(matches!(actions[0], Some(ContentAction::ImagePair(_))));
        assert!(matches!(actions[1], Some(ContentAction::Image(_))));
    }

    #[test]
    fn test_icon_is_transparent_outside_disc() {
        let img = icon(24, Color::BLACK).to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(12, 12)[3], 255);
    }

    #[test]
    fn test_ragged_statement_skips_table() {
        let statement = TransactionStatement::new(
            vec![vec!["1".to_string(), "r1".to_string()]],
            CurrencyFormat::default(),
        );
        let actions = statement.actions();
        assert_eq!(actions.len(), 3);
        assert!(actions[2].is_none());
    }
}
