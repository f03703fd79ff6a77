use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use battery_doctor_core::types::Sample;

use crate::render;
use crate::tui::Dashboard;

pub fn draw(f: &mut Frame, dash: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_level(f, dash, chunks[0]);
    draw_details(f, dash, chunks[1]);
    draw_status(f, dash, chunks[2]);
}

fn level_color(level: u8, alert_level: u8) -> Color {
    if level >= alert_level {
        Color::Cyan
    } else if level <= 20 {
        Color::Red
    } else if level <= 40 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn draw_level(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" battery-doctor ");
    let Some(sample) = &dash.status.last_sample else {
        let para = Paragraph::new(Line::from(Span::styled(
            "waiting for first sample...",
            Style::default().dim(),
        )))
        .block(block);
        f.render_widget(para, area);
        return;
    };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(level_color(sample.level, dash.alert_level_pct)))
        .percent(u16::from(sample.level))
        .label(format!("{}% {}", sample.level, sample.status.as_db_str()));
    f.render_widget(gauge, area);
}

fn detail_lines<'a>(dash: &'a Dashboard, sample: &'a Sample) -> Vec<Line<'a>> {
    let label = |s: &'static str| Span::styled(format!("{s:<13}"), Style::default().fg(Color::DarkGray));
    let status = &dash.status;
    vec![
        Line::from(vec![
            label("temperature"),
            Span::raw(format!(
                "{:.1}°C {}",
                sample.temperature,
                render::temp_indicator(sample.temperature)
            )),
        ]),
        Line::from(vec![
            label("power"),
            Span::raw(status.plugged.map_or("unknown", render::plug_label)),
        ]),
        Line::from(vec![label("health"), Span::raw(render::health_label(sample))]),
        Line::from(vec![
            label("cycles"),
            Span::raw(status.cycles.map_or_else(|| "?".to_string(), |c| c.to_string())),
        ]),
        Line::from(vec![
            label("recent health"),
            Span::styled(format!("[{}]", status.sparkline), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            label("sampled"),
            Span::raw(sample.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]),
    ]
}

fn draw_details(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let mut lines = match &dash.status.last_sample {
        Some(sample) => detail_lines(dash, sample),
        None => Vec::new(),
    };
    if dash.status.notified {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("Charge reached {}%: unplug the charger.", dash.alert_level_pct),
            Style::default().fg(Color::Yellow).bold(),
        )));
    }
    if let Some(err) = &dash.status.last_error {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("last tick failed: {err}"),
            Style::default().fg(Color::Red),
        )));
    }

    let para = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_status(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let status = &dash.status;
    let mut text = format!(
        " tick {}  |  every {}s  |  {}",
        status.tick_count, dash.tick_secs, dash.db_label
    );
    if status.consecutive_failures > 0 {
        text.push_str(&format!("  |  {} failed", status.consecutive_failures));
    }
    text.push_str("  |  q to quit");

    let para = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(para, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use battery_doctor_core::config::AgentCfg;
    use battery_doctor_core::types::{ChargeStatus, MonitorStatus, PlugState};
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(dash: &Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 14)).unwrap();
        terminal.draw(|f| draw(f, dash)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn level_colors() {
        assert_eq!(level_color(85, 80), Color::Cyan);
        assert_eq!(level_color(15, 80), Color::Red);
        assert_eq!(level_color(35, 80), Color::Yellow);
        assert_eq!(level_color(60, 80), Color::Green);
    }

    #[test]
    fn draws_waiting_state() {
        let dash = Dashboard::new(&AgentCfg::default(), "test.db".into());
        let screen = rendered(&dash);
        assert!(screen.contains("waiting for first sample"));
        assert!(screen.contains("tick 0"));
    }

    #[test]
    fn draws_sample_details() {
        let mut dash = Dashboard::new(&AgentCfg::default(), "test.db".into());
        dash.status = MonitorStatus {
            tick_count: 4,
            last_sample: Some(Sample {
                timestamp: Utc.with_ymd_and_hms(2024, 4, 2, 10, 30, 0).unwrap(),
                level: 72,
                capacity_health: 88.5,
                health_estimated: false,
                temperature: 33.0,
                status: ChargeStatus::Charging,
            }),
            plugged: Some(PlugState::Ac),
            cycles: Some(12),
            sparkline: "▂▃".into(),
            ..MonitorStatus::default()
        };
        let screen = rendered(&dash);
        assert!(screen.contains("72% charging"));
        assert!(screen.contains("88.5%"));
        assert!(screen.contains("tick 4"));
    }
}
