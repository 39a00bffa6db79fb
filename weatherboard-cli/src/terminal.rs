use std::io::Write;

use tracing::debug;
use weatherboard_core::{CityRow, ForecastView, OutputSink, SearchCandidate};

/// Renders dashboard output as plain text lines.
///
/// While muted, everything is dropped; one-shot commands use this to hide the
/// startup forecast they did not ask for.
pub struct TerminalSink<W: Write> {
    out: W,
    muted: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, muted: false }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if self.muted {
            return;
        }
        if let Err(err) = writeln!(self.out, "{text}") {
            debug!(error = %err, "Dropped terminal output");
        }
    }
}

pub fn render_cities(rows: &[CityRow]) -> String {
    if rows.is_empty() {
        return "No saved cities.".to_string();
    }

    let mut out = String::from("Cities:");
    for row in rows {
        let marker = if row.active { '*' } else { ' ' };
        out.push_str(&format!("\n {marker} [{}] {}", row.index, row.label));
        if !row.removable {
            out.push_str(" (device)");
        }
    }
    out
}

pub fn render_forecast(view: &ForecastView) -> String {
    let mut out = format!("== {} ==", view.city);
    for day in &view.days {
        let icon = day.weather.icon();
        let weather = if icon.is_empty() {
            day.weather.description().to_string()
        } else {
            format!("{} {icon}", day.weather.description())
        };

        out.push_str(&format!("\n\n{}", day.title));
        out.push_str(&format!("\n  {:<10}{weather}", "Weather"));
        out.push_str(&format!("\n  {:<10}{}", "Max temp", day.max));
        out.push_str(&format!("\n  {:<10}{}", "Min temp", day.min));
    }
    out
}

impl<W: Write> OutputSink for TerminalSink<W> {
    fn cities(&mut self, rows: &[CityRow]) {
        self.emit(&render_cities(rows));
    }

    fn loading(&mut self) {
        self.emit("Loading...");
    }

    fn forecast(&mut self, view: &ForecastView) {
        self.emit(&render_forecast(view));
    }

    fn forecast_error(&mut self, message: &str) {
        self.emit(message);
    }

    fn notice(&mut self, message: &str) {
        self.emit(message);
    }

    fn clear_forecast(&mut self) {}

    fn add_city_visible(&mut self, _visible: bool) {}

    fn candidates(&mut self, candidates: &[SearchCandidate]) {
        for c in candidates {
            self.emit(&format!("  [{}] {}", c.index, c.label()));
        }
    }

    fn picked(&mut self, label: &str) {
        self.emit(&format!("Selected: {label}"));
    }

    fn inline_error(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            self.emit(&format!("! {message}"));
        }
    }
}
