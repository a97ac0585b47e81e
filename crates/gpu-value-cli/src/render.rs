//! Plain-text rendering of the baseline banner, value table and probe report.

use gpu_value::{BaselineGpu, BaselineSnapshot, ProbeOutcome, ValueRow};

/// Format an amount in pounds with two decimals.
pub fn format_price(amount: f64) -> String {
    format!("£{amount:.2}")
}

/// Signed distance between a card's value target and its market price.
fn format_headroom(row: &ValueRow) -> String {
    let headroom = row.value_target - row.market_price;
    if headroom >= 0.0 {
        format!("+{}", format_price(headroom))
    } else {
        format!("-{}", format_price(-headroom))
    }
}

/// Header lines describing where the baseline came from.
pub fn render_banner(snapshot: &BaselineSnapshot, baseline: &BaselineGpu) -> String {
    let mut out = format!(
        "Market baseline: {} @ {}\n",
        baseline.name,
        format_price(snapshot.price)
    );

    match &snapshot.source_url {
        Some(url) => out.push_str(&format!("  Source: {} ({url})\n", snapshot.retailer_name)),
        None => {
            out.push_str("  Warning: no retailer returned a price; using the fallback baseline.\n")
        }
    }
    out.push_str(&format!(
        "  Resolved: {}\n",
        snapshot.resolved_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out
}

/// The comparison table, one row per catalog card.
pub fn render_table(rows: &[ValueRow]) -> String {
    let headers = ["Card", "Value Target", "Market Price", "Headroom"];
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|r| {
            [
                r.name.clone(),
                format_price(r.value_target),
                format_price(r.market_price),
                format_headroom(r),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &headers.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, row: &[String; 4], widths: &[usize; 4]) {
    let mut line = String::new();
    for (i, (cell, width)) in row.iter().zip(widths.iter()).enumerate() {
        let pad = width - cell.chars().count();
        if i == 0 {
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
        } else {
            line.push_str("  ");
            line.push_str(&" ".repeat(pad));
            line.push_str(cell);
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// One line per retailer probe.
pub fn render_probes(outcomes: &[ProbeOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        match outcome {
            ProbeOutcome::Quote(q) => out.push_str(&format!(
                "  ok    {:<20} {}  {}\n",
                q.retailer_name,
                format_price(q.price),
                q.source_url
            )),
            ProbeOutcome::NoQuote {
                retailer_name,
                reason,
            } => out.push_str(&format!("  none  {retailer_name:<20} {reason}\n")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gpu_value::{NoQuoteReason, PriceQuote};

    fn baseline_gpu() -> BaselineGpu {
        BaselineGpu {
            name: "RX 9060 XT (16GB)".to_string(),
            url: "https://www.amd.com/".to_string(),
        }
    }

    fn row(name: &str, target: f64, market: f64) -> ValueRow {
        ValueRow {
            name: name.to_string(),
            value_target: target,
            market_price: market,
            url: String::new(),
            is_deal: market <= target,
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(329.99), "£329.99");
        assert_eq!(format_price(362.6043), "£362.60");
        assert_eq!(format_price(330.0), "£330.00");
    }

    #[test]
    fn test_banner_with_source() {
        let at = Utc.with_ymd_and_hms(2025, 11, 3, 9, 30, 0).unwrap();
        let snapshot = BaselineSnapshot {
            price: 305.5,
            source_url: Some("https://ebuyer.example/gpu".to_string()),
            retailer_name: "Ebuyer".to_string(),
            resolved_at: at,
        };
        let banner = render_banner(&snapshot, &baseline_gpu());
        assert!(banner.starts_with("Market baseline: RX 9060 XT (16GB) @ £305.50\n"));
        assert!(banner.contains("Source: Ebuyer (https://ebuyer.example/gpu)"));
        assert!(banner.contains("Resolved: 2025-11-03 09:30 UTC"));
        assert!(!banner.contains("Warning"));
    }

    #[test]
    fn test_banner_warns_on_fallback() {
        let snapshot = BaselineSnapshot::fallback(330.0, Utc::now());
        let banner = render_banner(&snapshot, &baseline_gpu());
        assert!(banner.contains("£330.00"));
        assert!(banner.contains("Warning"));
    }

    #[test]
    fn test_table_alignment() {
        let table = render_table(&[
            row("RX 7800 XT (16GB)", 363.36, 449.0),
            row("RX 6800 (16GB)", 260.18, 259.0),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Card"));
        assert!(lines[1].chars().all(|c| c == '-' || c == ' '));
        assert!(lines[2].contains("£363.36") && lines[2].ends_with("-£85.64"));
        assert!(lines[3].ends_with("+£1.18"));
        // Right-aligned numeric columns end at the same offset.
        assert_eq!(lines[2].chars().count(), lines[3].chars().count());
        assert_eq!(lines[0].chars().count(), lines[2].chars().count());
    }

    #[test]
    fn test_probe_report() {
        let outcomes = vec![
            ProbeOutcome::Quote(PriceQuote {
                price: 329.99,
                source_url: "https://scan.example".to_string(),
                retailer_name: "Scan".to_string(),
            }),
            ProbeOutcome::NoQuote {
                retailer_name: "Ebuyer".to_string(),
                reason: NoQuoteReason::Status(403),
            },
        ];
        let report = render_probes(&outcomes);
        assert!(report.contains("ok    Scan"));
        assert!(report.contains("£329.99"));
        assert!(report.contains("none  Ebuyer"));
        assert!(report.contains("unexpected HTTP status 403"));
    }
}
