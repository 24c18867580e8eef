//! Askama templates for the web frontend.

use askama::Template;

use crate::board::{BoardSnapshot, StopBoardState};
use crate::domain::{Departure, LineType};

/// The departure board page.
#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub board: BoardView,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Board view model for templates.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub active: bool,
    pub refresh_interval_secs: u64,
    pub last_update: Option<String>,
    pub stops: Vec<StopView>,
}

impl BoardView {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            active: snapshot.active,
            refresh_interval_secs: snapshot.refresh_interval_secs,
            last_update: snapshot.last_global_update.clone(),
            stops: snapshot.stops.iter().map(StopView::from_state).collect(),
        }
    }
}

/// One stop's section of the board.
#[derive(Debug, Clone)]
pub struct StopView {
    pub id: String,
    pub name: String,
    pub platforms: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_update: Option<String>,
    pub departures: Vec<DepartureView>,
}

impl StopView {
    pub fn from_state(state: &StopBoardState) -> Self {
        Self {
            id: state.config.id.clone(),
            name: state.config.display_name().to_string(),
            platforms: state.config.platforms.join(", "),
            is_loading: state.is_loading,
            error: state.error.as_ref().map(|e| e.message.clone()),
            last_update: state.last_update.clone(),
            departures: state.departures.iter().map(DepartureView::from_departure).collect(),
        }
    }
}

/// Departure row view model.
#[derive(Debug, Clone)]
pub struct DepartureView {
    pub line: String,
    pub line_class: &'static str,
    pub line_type: &'static str,
    pub destination: String,
    pub platform: String,
    pub countdown: String,
    pub scheduled_time: String,
    pub delay: Option<String>,
}

impl DepartureView {
    pub fn from_departure(departure: &Departure) -> Self {
        Self {
            line: departure.line.clone(),
            line_class: line_class(departure.line_type),
            line_type: departure.line_type.label(),
            destination: departure.destination.clone(),
            platform: departure.platform.clone(),
            countdown: countdown(departure.minutes_until),
            scheduled_time: departure.scheduled_time.clone(),
            delay: format_delay(departure.delay_minutes),
        }
    }
}

/// CSS class for a line badge.
fn line_class(line_type: LineType) -> &'static str {
    match line_type {
        LineType::UBahn => "line-ubahn",
        LineType::SBahn => "line-sbahn",
        LineType::Strassenbahn => "line-tram",
        LineType::Bus => "line-bus",
        LineType::Regional => "line-regional",
        LineType::Other => "line-other",
    }
}

fn countdown(minutes_until: i64) -> String {
    if minutes_until <= 0 {
        "now".to_string()
    } else {
        format!("{minutes_until} min")
    }
}

fn format_delay(delay_minutes: i64) -> Option<String> {
    match delay_minutes {
        0 => None,
        d if d > 0 => Some(format!("+{d}")),
        d => Some(d.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopConfig;

    fn departure(minutes_until: i64, delay_minutes: i64) -> Departure {
        Departure {
            line: "SB15".into(),
            destination: "Essen Hbf".into(),
            platform: "4".into(),
            line_type: LineType::SBahn,
            minutes_until,
            delay_minutes,
            scheduled_time: "08:05".into(),
        }
    }

    #[test]
    fn departure_view_formatting() {
        let view = DepartureView::from_departure(&departure(5, 2));
        assert_eq!(view.countdown, "5 min");
        assert_eq!(view.delay.as_deref(), Some("+2"));
        assert_eq!(view.line_class, "line-sbahn");

        let view = DepartureView::from_departure(&departure(0, 0));
        assert_eq!(view.countdown, "now");
        assert!(view.delay.is_none());

        let view = DepartureView::from_departure(&departure(-1, -1));
        assert_eq!(view.countdown, "now");
        assert_eq!(view.delay.as_deref(), Some("-1"));
    }

    #[test]
    fn board_renders_stops_and_departures() {
        let mut snapshot = BoardSnapshot::new(30, 10);
        snapshot.sync_stops(&[
            StopConfig::new("1", "Essen Hbf").with_label("Work"),
            StopConfig::new("2", "Bochum Hbf"),
        ]);
        let stop = snapshot.stop_mut("1").unwrap();
        let seq = stop.begin_request();
        stop.complete(seq, Ok(vec![departure(5, 2)]), "08:00:00");

        let html = BoardTemplate {
            board: BoardView::from_snapshot(&snapshot),
        }
        .render()
        .unwrap();

        assert!(html.contains("Work"));
        assert!(html.contains("Bochum Hbf"));
        assert!(html.contains("SB15"));
        assert!(html.contains("5 min"));
        assert!(html.contains("+2"));
    }

    #[test]
    fn board_renders_empty_state() {
        let html = BoardTemplate {
            board: BoardView::from_snapshot(&BoardSnapshot::new(30, 10)),
        }
        .render()
        .unwrap();

        assert!(html.contains("No stops configured"));
    }
}
