//! Measurement-outcome histograms for the terminal and as SVG.

use std::fmt::Write as _;

use qrun_hal::Counts;

/// Width of the longest terminal bar, in cells.
pub const BAR_WIDTH: usize = 40;

/// One bar of the histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar<'a> {
    pub bitstring: &'a str,
    pub count: u64,
    pub probability: f64,
}

/// Bars ordered by bitstring.
pub fn bars(counts: &Counts) -> Vec<Bar<'_>> {
    let total = counts.total_shots().max(1) as f64;
    counts
        .sorted_by_key()
        .into_iter()
        .map(|(bitstring, count)| Bar {
            bitstring,
            count,
            probability: count as f64 / total,
        })
        .collect()
}

/// Plain text histogram, one line per outcome:
///
/// ```text
/// 000 │██████████████████████████████████████   1022  24.95%
/// ```
pub fn render_text(counts: &Counts) -> Vec<String> {
    let bars = bars(counts);
    let max = bars.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let count_width = max.to_string().len();

    bars.iter()
        .map(|bar| {
            let len = ((bar.count as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
            format!(
                "{} │{:<BAR_WIDTH$} {:>count_width$} {:>6.2}%",
                bar.bitstring,
                "█".repeat(len),
                bar.count,
                bar.probability * 100.0,
            )
        })
        .collect()
}

const SVG_BAR: f64 = 48.0;
const SVG_GAP: f64 = 16.0;
const SVG_PLOT_HEIGHT: f64 = 240.0;
const SVG_MARGIN_LEFT: f64 = 56.0;
const SVG_MARGIN_TOP: f64 = 48.0;
const SVG_MARGIN_BOTTOM: f64 = 56.0;

/// Standalone SVG bar chart of counts, bars labelled with their counts.
pub fn render_svg(counts: &Counts, title: &str) -> String {
    let bars = bars(counts);
    let max = bars.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let width = SVG_MARGIN_LEFT + SVG_GAP + bars.len().max(1) as f64 * (SVG_BAR + SVG_GAP);
    let height = SVG_MARGIN_TOP + SVG_PLOT_HEIGHT + SVG_MARGIN_BOTTOM;
    let baseline = SVG_MARGIN_TOP + SVG_PLOT_HEIGHT;

    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="28" font-size="16" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape(title)
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{SVG_MARGIN_LEFT}" y1="{baseline}" x2="{width}" y2="{baseline}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"  <text x="16" y="{}" font-size="12" transform="rotate(-90 16 {})" text-anchor="middle">Counts</text>"#,
        SVG_MARGIN_TOP + SVG_PLOT_HEIGHT / 2.0,
        SVG_MARGIN_TOP + SVG_PLOT_HEIGHT / 2.0
    );

    for (i, bar) in bars.iter().enumerate() {
        let x = SVG_MARGIN_LEFT + SVG_GAP + i as f64 * (SVG_BAR + SVG_GAP);
        let h = bar.count as f64 / max * SVG_PLOT_HEIGHT;
        let y = baseline - h;
        let center = x + SVG_BAR / 2.0;
        let _ = writeln!(
            svg,
            r##"  <rect x="{x}" y="{y:.2}" width="{SVG_BAR}" height="{h:.2}" fill="#6929c4"><title>{}: {}</title></rect>"##,
            escape(bar.bitstring),
            bar.count
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{center}" y="{:.2}" font-size="11" text-anchor="middle">{}</text>"#,
            y - 4.0,
            bar.count
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{center}" y="{}" font-size="12" text-anchor="middle" font-family="monospace">{}</text>"#,
            baseline + 18.0,
            escape(bar.bitstring)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> Counts {
        [("111", 1000u64), ("000", 1022), ("101", 1081), ("010", 993)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_bars_sorted_by_bitstring() {
        let counts = counts();
        let bars = bars(&counts);
        let keys: Vec<_> = bars.iter().map(|b| b.bitstring).collect();
        assert_eq!(keys, ["000", "010", "101", "111"]);
        let total: f64 = bars.iter().map(|b| b.probability).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_render_text_scales_to_largest() {
        let lines = render_text(&counts());
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("000 │"));
        // 101 has the most counts and gets the full bar
        assert_eq!(lines[2].matches('█').count(), BAR_WIDTH);
        assert!(lines[2].contains("1081"));
        assert!(lines[2].ends_with("26.39%"));
    }

    #[test]
    fn test_render_text_empty() {
        assert!(render_text(&Counts::new()).is_empty());
    }

    #[test]
    fn test_render_svg() {
        let svg = render_svg(&counts(), "ibm_torino <4096 shots>");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("fill=\"#6929c4\"").count(), 4);
        assert!(svg.contains("ibm_torino &lt;4096 shots&gt;"));
        assert!(svg.contains(">101<"));
    }
}
