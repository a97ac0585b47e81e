//! CSS-selector and regex based price extractor for raw listing markup.
//!
//! Rules are compiled once per retailer into a [`RuleSet`] and then applied to
//! every page fetched for that retailer. Every rule contributes the fragments
//! it matches; a rule that matches nothing contributes nothing. Fragments are
//! reduced to digits and decimal points and parsed, and fragments that do not
//! survive parsing are dropped without aborting the pass.
//!
//! `scraper`'s DOM types are `!Send`, so [`RuleSet::extract`] parses and drops
//! the document synchronously and must not be held across an `.await`.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{ValueIndexError, ValueIndexResult};
use crate::types::ExtractionRule;

/// Default currency-shaped pattern: a pound, dollar or euro sign followed by
/// an amount with optional thousands separators and pence.
pub const DEFAULT_CURRENCY_PATTERN: &str = r"[£$€]\s*\d[\d,]*(?:\.\d{1,2})?";

/// Region scanned by a text-scan rule that names no scope.
const DEFAULT_SCAN_SCOPE: &str = "body";

/// A single rule ready to run against a parsed document.
#[derive(Debug, Clone)]
enum CompiledRule {
    Element { tag: Selector, class: Regex },
    Css(Selector),
    TextScan { pattern: Regex, scope: Selector },
}

/// An ordered, pre-compiled sequence of extraction rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile a rule list, rejecting unparsable selectors and patterns.
    pub fn compile(rules: &[ExtractionRule]) -> ValueIndexResult<Self> {
        let rules = rules
            .iter()
            .map(compile_rule)
            .collect::<ValueIndexResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Extract every parsable amount from `html`, in rule order.
    ///
    /// Returns an empty vector when nothing matches; that is not an error.
    pub fn extract(&self, html: &str) -> Vec<f64> {
        let document = Html::parse_document(html);
        let mut amounts = Vec::new();

        for rule in &self.rules {
            match rule {
                CompiledRule::Element { tag, class } => {
                    for el in document.select(tag) {
                        let class_matches = el.value().classes().any(|c| class.is_match(c));
                        if class_matches {
                            amounts.extend(parse_amount(&element_text(&el)));
                        }
                    }
                }
                CompiledRule::Css(selector) => {
                    for el in document.select(selector) {
                        amounts.extend(parse_amount(&element_text(&el)));
                    }
                }
                CompiledRule::TextScan { pattern, scope } => {
                    for el in document.select(scope) {
                        let text = visible_text(&el);
                        amounts.extend(
                            pattern
                                .find_iter(&text)
                                .filter_map(|m| parse_amount(m.as_str())),
                        );
                    }
                }
            }
        }

        amounts
    }
}

/// One-shot convenience: compile `rules` and extract from `html`.
pub fn extract_prices(html: &str, rules: &[ExtractionRule]) -> ValueIndexResult<Vec<f64>> {
    Ok(RuleSet::compile(rules)?.extract(html))
}

/// Strip everything but digits and `.` from a fragment and parse it.
///
/// Returns `None` for fragments that are empty after stripping, that do not
/// form a valid number (e.g. two decimal points), or that are negative or
/// non-finite.
pub fn parse_amount(fragment: &str) -> Option<f64> {
    let cleaned: String = fragment
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn compile_rule(rule: &ExtractionRule) -> ValueIndexResult<CompiledRule> {
    match rule {
        ExtractionRule::Element { tag, class } => Ok(CompiledRule::Element {
            tag: parse_selector(tag)?,
            class: Regex::new(class)?,
        }),
        ExtractionRule::Css { selector } => Ok(CompiledRule::Css(parse_selector(selector)?)),
        ExtractionRule::TextScan { pattern, scope } => Ok(CompiledRule::TextScan {
            pattern: Regex::new(pattern)?,
            scope: parse_selector(scope.as_deref().unwrap_or(DEFAULT_SCAN_SCOPE))?,
        }),
    }
}

fn parse_selector(selector: &str) -> ValueIndexResult<Selector> {
    Selector::parse(selector).map_err(|e| ValueIndexError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text of an element minus script, style and template contents.
///
/// Inline JSON and analytics blobs carry currency-shaped strings that are not
/// listings.
fn visible_text(el: &ElementRef) -> String {
    el.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            let hidden = matches!(
                parent.value().name(),
                "script" | "style" | "noscript" | "template"
            );
            (!hidden).then_some(&**text)
        })
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenated text of an element, whitespace-collapsed.
fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
