//! Template Fill Engine — template string + field mapping → final markup.
//!
//! Order: logo resolution, placeholder substitution, fallbacks, label sizing.
//! Substitution and fallbacks share one scan of the original template so no
//! replacement value is ever matched as a placeholder.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::fetch::AssetFetcher;
use crate::template::fields::{FieldMapping, LOGO_BLOCK_FIELD, LOGO_FIELD};
use crate::template::logo::{LogoMode, LogoResolver, ResolvedLogo};
use crate::template::placeholder::Template;
use crate::template::schema::{FallbackTable, FieldSchema};
use crate::template::sizing::apply_label_sizing;

/// Per-render options.
#[derive(Debug, Clone)]
pub struct FillOptions {
    pub logo_mode: LogoMode,
    /// Date used for the `generation_date` fallback.
    pub generation_date: NaiveDate,
}

/// What the engine did, for logs and diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    pub logo: &'static str,
    pub placeholders_replaced: usize,
    pub fallbacks_applied: Vec<String>,
    pub left_untouched: Vec<String>,
    pub labels_sized: usize,
}

#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub html: String,
    pub report: FillReport,
}

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    schema: FieldSchema,
    logo: LogoResolver,
    accent_color: String,
}

impl TemplateEngine {
    pub fn new(schema: FieldSchema, logo: LogoResolver, accent_color: impl Into<String>) -> Self {
        Self {
            schema,
            logo,
            accent_color: accent_color.into(),
        }
    }

    pub async fn fill(
        &self,
        template: &str,
        mapping: &FieldMapping,
        options: &FillOptions,
        fetcher: &dyn AssetFetcher,
    ) -> FilledDocument {
        debug!(
            fields = mapping.len(),
            keys = ?mapping.keys().collect::<Vec<_>>(),
            "Filling template"
        );
        let requested_logo = mapping.logo_url();
        let logo = self
            .logo
            .resolve(options.logo_mode, requested_logo.as_deref(), fetcher)
            .await;

        let fallbacks = FallbackTable::term_sheet(&self.accent_color, options.generation_date);
        let substituted = substitute(template, mapping, &logo, &fallbacks, &self.schema);

        info!(
            replaced = substituted.placeholders_replaced,
            fallbacks = substituted.fallbacks_applied.len(),
            untouched = substituted.left_untouched.len(),
            "Placeholders substituted"
        );
        if !substituted.left_untouched.is_empty() {
            debug!(names = ?substituted.left_untouched, "Unknown placeholders left in output");
        }

        let sized = apply_label_sizing(&substituted.html);
        debug!(labels_sized = sized.labels_sized, "Label sizing applied");

        FilledDocument {
            html: sized.html,
            report: FillReport {
                logo: logo.kind(),
                placeholders_replaced: substituted.placeholders_replaced,
                fallbacks_applied: substituted.fallbacks_applied,
                left_untouched: substituted.left_untouched,
                labels_sized: sized.labels_sized,
            },
        }
    }
}

struct Substituted {
    html: String,
    placeholders_replaced: usize,
    fallbacks_applied: Vec<String>,
    left_untouched: Vec<String>,
}

/// One pass over the template. Per placeholder name:
/// `logo_url`/`logo` → resolved logo; key in mapping → its display string;
/// fallback entry → default; other declared field → ""; anything else is left as-is.
fn substitute(
    source: &str,
    mapping: &FieldMapping,
    logo: &ResolvedLogo,
    fallbacks: &FallbackTable,
    schema: &FieldSchema,
) -> Substituted {
    let template = Template::parse(source);
    let mut fallbacks_applied = Vec::new();

    let result = template.substitute(|name| {
        if name == LOGO_FIELD {
            return Some(Cow::Borrowed(logo.as_replacement()));
        }
        if name == LOGO_BLOCK_FIELD {
            return Some(logo.as_block());
        }
        if let Some(value) = mapping.display(name) {
            return Some(Cow::Owned(value));
        }
        if let Some(default) = fallbacks.lookup(name, mapping) {
            fallbacks_applied.push(name.to_string());
            return Some(Cow::Borrowed(default));
        }
        schema.is_declared(name).then_some(Cow::Borrowed(""))
    });

    Substituted {
        html: result.output,
        placeholders_replaced: result.replaced,
        fallbacks_applied,
        left_untouched: result.untouched.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;
    use serde_json::json;

    const DEFAULT_LOGO: &str = "https://example.com/logo.svg";
    const FALLBACK_MARKUP: &str = "<div class=\"logo-fallback\">BRRRR LOANS</div>";
    const SCENARIO: &str = "<div>{{ logo_url }}</div><span class='data-label'>Lender Fee - Diligence & Legal Review Period</span>";

    fn engine() -> TemplateEngine {
        TemplateEngine::new(
            FieldSchema::term_sheet(),
            LogoResolver::new(DEFAULT_LOGO, FALLBACK_MARKUP),
            "#f97316",
        )
    }

    fn options(mode: LogoMode) -> FillOptions {
        FillOptions {
            logo_mode: mode,
            generation_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        }
    }

    fn mapping(value: serde_json::Value) -> FieldMapping {
        FieldMapping::from_value(value).unwrap()
    }

    async fn fill(template: &str, m: serde_json::Value, mode: LogoMode) -> FilledDocument {
        engine()
            .fill(template, &mapping(m), &options(mode), &FakeFetcher::new())
            .await
    }

    #[tokio::test]
    async fn test_url_passthrough_scenario() {
        let doc = fill(SCENARIO, json!({}), LogoMode::Url).await;
        assert!(doc.html.contains("<div>https://example.com/logo.svg</div>"));
        assert!(doc.html.contains(
            "<span class=\"data-label\" style=\"font-size: 10px\">Lender Fee - Diligence &amp; Legal Review Period</span>"
        ));
        assert_eq!(doc.report.logo, "url");
        assert_eq!(doc.report.labels_sized, 1);
    }

    #[tokio::test]
    async fn test_inline_logo_404_falls_back_to_literal_markup() {
        let fetcher = FakeFetcher::new().respond(DEFAULT_LOGO, 404, "text/plain", b"nope");
        let doc = engine()
            .fill(SCENARIO, &mapping(json!({})), &options(LogoMode::Inline), &fetcher)
            .await;
        assert!(doc.html.contains(&format!("<div>{FALLBACK_MARKUP}</div>")));
        assert!(!doc.html.contains(DEFAULT_LOGO));
        assert_eq!(doc.report.logo, "markup");
    }

    #[tokio::test]
    async fn test_inline_logo_is_used_for_every_occurrence() {
        let fetcher = FakeFetcher::new().respond(DEFAULT_LOGO, 200, "image/svg+xml", b"<svg/>");
        let template = "<img src=\"{{ logo_url }}\"><footer><img src=\"{{logo_url}}\"></footer>";
        let doc = engine()
            .fill(template, &mapping(json!({})), &options(LogoMode::Inline), &fetcher)
            .await;

        assert_eq!(doc.html.matches("data:image/svg+xml;base64,PHN2Zy8+").count(), 2);
        assert!(!doc.html.contains("https://"));
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_caller_logo_replaces_default() {
        let doc = fill(
            "<img src=\"{{ logo_url }}\">",
            json!({"logo_url": "https://cdn.test/brand.png"}),
            LogoMode::Url,
        )
        .await;
        assert_eq!(doc.html, "<img src=\"https://cdn.test/brand.png\">");
    }

    #[tokio::test]
    async fn test_empty_caller_logo_uses_default() {
        let doc = fill("{{ logo_url }}", json!({"logo_url": ""}), LogoMode::Url).await;
        assert_eq!(doc.html, DEFAULT_LOGO);
    }

    #[tokio::test]
    async fn test_supplied_fields_replaced_everywhere() {
        let doc = fill(
            "<h1>{{ borrower_name }}</h1><p>{{borrower_name}} / {{ loan_amount }}</p>",
            json!({"borrower_name": "Sarah Johnson", "loan_amount": "$450,000"}),
            LogoMode::Url,
        )
        .await;
        assert_eq!(
            doc.html,
            "<h1>Sarah Johnson</h1><p>Sarah Johnson / $450,000</p>"
        );
        assert_eq!(doc.report.placeholders_replaced, 3);
    }

    #[tokio::test]
    async fn test_fallbacks_fill_absent_fields_only() {
        let template = "<h2 style=\"color: {{ program_color }}\">{{ generation_date }}</h2>";

        let absent = fill(template, json!({}), LogoMode::Url).await;
        assert_eq!(
            absent.html,
            "<h2 style=\"color: #f97316\">October 18, 2026</h2>"
        );
        assert_eq!(
            absent.report.fallbacks_applied,
            vec!["program_color".to_string(), "generation_date".to_string()]
        );

        let explicit_empty = fill(
            template,
            json!({"program_color": "", "generation_date": "Jan 1"}),
            LogoMode::Url,
        )
        .await;
        assert_eq!(explicit_empty.html, "<h2 style=\"color: \">Jan 1</h2>");
        assert!(explicit_empty.report.fallbacks_applied.is_empty());
    }

    #[tokio::test]
    async fn test_fill_is_idempotent_on_its_output() {
        let doc = fill(SCENARIO, json!({}), LogoMode::Url).await;
        let again = fill(&doc.html, json!({}), LogoMode::Url).await;
        assert_eq!(doc.html, again.html);
    }

    #[tokio::test]
    async fn test_declared_field_without_value_renders_empty() {
        let doc = fill("[{{ guarantor_name }}]", json!({}), LogoMode::Url).await;
        assert_eq!(doc.html, "[]");
    }

    #[tokio::test]
    async fn test_unknown_placeholder_left_untouched() {
        let doc = fill("<p>{{ mystery_field }}</p>", json!({}), LogoMode::Url).await;
        assert_eq!(doc.html, "<p>{{ mystery_field }}</p>");
        assert_eq!(doc.report.left_untouched, vec!["mystery_field".to_string()]);
    }

    #[tokio::test]
    async fn test_caller_keys_outside_schema_are_substituted() {
        let doc = fill("{{ broker_notes }}", json!({"broker_notes": "rush"}), LogoMode::Url).await;
        assert_eq!(doc.html, "rush");
    }

    #[tokio::test]
    async fn test_values_are_not_rescanned() {
        let doc = fill(
            "{{ borrower_name }}|{{ guarantor_name }}",
            json!({"borrower_name": "{{ guarantor_name }}", "guarantor_name": "G"}),
            LogoMode::Url,
        )
        .await;
        assert_eq!(doc.html, "{{ guarantor_name }}|G");
    }

    #[tokio::test]
    async fn test_substituted_labels_are_sized_but_amounts_are_not() {
        let template = "<table><tr><td>{{ loan_purpose }}</td><td>{{ loan_amount }}</td></tr></table>";
        let doc = fill(
            template,
            json!({
                "loan_purpose": "Cash-Out Refinance of Existing Rental With Rehab Holdback",
                "loan_amount": "$375,000"
            }),
            LogoMode::Url,
        )
        .await;
        assert!(doc.html.contains("<td style=\"font-size: 9px\">Cash-Out"));
        assert!(doc.html.contains("<td>$375,000</td>"));
    }

    #[tokio::test]
    async fn test_shipped_term_sheet_fills_every_placeholder() {
        let doc = fill(
            SHIPPED,
            json!({
                "borrower_name": "Chris Lesnik",
                "loan_amount": "$375,000",
                "program": "DSCR Rental 30yr"
            }),
            LogoMode::Url,
        )
        .await;

        assert!(!doc.html.contains("{{"));
        assert!(doc.report.left_untouched.is_empty());
        assert!(doc
            .html
            .contains("<div class=\"logo\"><img src=\"https://example.com/logo.svg\" alt=\"Logo\"></div>"));
        assert!(doc.html.contains("Prepared October 18, 2026"));
        assert!(doc.html.contains("background: #f97316"));
        assert!(doc.html.contains("<span class=\"value\">$375,000</span>"));
        assert!(doc.report.labels_sized > 0);
    }

    const SHIPPED: &str = include_str!("../../templates/dscr-term-sheet.html");

    fn assert_logo_slot(html: &str, expected: &str) {
        assert!(!html.contains("{{"));
        assert!(!html.contains("src=\"<"), "markup leaked into an attribute");
        assert!(
            html.contains(&format!("<div class=\"logo\">{expected}</div>")),
            "logo slot not found in output"
        );
    }

    #[tokio::test]
    async fn test_shipped_term_sheet_with_literal_logo() {
        let doc = fill(SHIPPED, json!({}), LogoMode::Literal).await;
        assert_logo_slot(&doc.html, FALLBACK_MARKUP);
        assert_eq!(doc.report.logo, "markup");
    }

    #[tokio::test]
    async fn test_shipped_term_sheet_when_inline_logo_fetch_fails() {
        let fetcher = FakeFetcher::new().respond(DEFAULT_LOGO, 404, "text/plain", b"nope");
        let doc = engine()
            .fill(SHIPPED, &mapping(json!({})), &options(LogoMode::Inline), &fetcher)
            .await;
        assert_logo_slot(&doc.html, FALLBACK_MARKUP);
        assert!(!doc.html.contains(DEFAULT_LOGO));
    }

    #[tokio::test]
    async fn test_shipped_term_sheet_with_inline_logo() {
        let fetcher = FakeFetcher::new().respond(DEFAULT_LOGO, 200, "image/svg+xml", b"<svg/>");
        let doc = engine()
            .fill(SHIPPED, &mapping(json!({})), &options(LogoMode::Inline), &fetcher)
            .await;
        assert_logo_slot(
            &doc.html,
            "<img src=\"data:image/svg+xml;base64,PHN2Zy8+\" alt=\"Logo\">",
        );
    }
}
