use forecast_core::{BLANK, ForecastState};
use std::fmt;

/// Console panel for one forecast state.
pub struct Panel<'a>(pub &'a ForecastState);

impl fmt::Display for Panel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        let time = state
            .time
            .as_ref()
            .map_or_else(|| BLANK.to_string(), |time| time.format("%Y-%m-%d %H:%M %Z").to_string());

        let rows = [
            ("Time", time),
            ("Source", state.source.clone()),
            ("Issued", state.issued.clone()),
            ("Valid until", state.valid.clone()),
            ("Weather", state.weather.clone()),
            ("Temperature", state.temp.to_string()),
            ("Wind", format!("{} {}", state.wind_dir, state.wind_spd)),
            ("Precip", precip(&state.precip)),
        ];

        for (label, value) in rows {
            writeln!(f, "{label:<12} {value}")?;
        }

        Ok(())
    }
}

fn precip(value: &str) -> String {
    if value == BLANK { value.to_string() } else { format!("{value}%") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_state_renders_placeholders() {
        let out = Panel(&ForecastState::new()).to_string();

        assert!(out.contains("Time         --"));
        assert!(out.contains("Weather      ForecastUnavailable"));
        assert!(out.contains("Wind         -- --"));
        assert!(out.contains("Precip       --\n"));
    }

    #[test]
    fn panel_writes_one_line_per_field() {
        let mut state = ForecastState::new();
        state.precip = "40".into();

        let out = format!("{}", Panel(&state));

        assert_eq!(out.lines().count(), 8);
        assert!(out.starts_with("Time "));
        assert!(out.ends_with("Precip       40%\n"));
    }
}
