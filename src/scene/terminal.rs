//! # Terminal Renderer
//!
//! Draws the live controller view with ratatui in the alternate screen:
//!
//! ```text
//! ┌ Status ──────────────────────────────────────────────┐
//! │ ✅ Wireless Controller connected                     │
//! └──────────────────────────────────────────────────────┘
//! ┌ Model ───────────┐┌ Left stick ──┐┌ Right stick ─┐
//! │ ● button_cross   ││      ·       ││      ·       │
//! │ ● button_circle  ││    ·   o     ││    ·         │
//! │ ...              │└──────────────┘└──────────────┘
//! │                  │┌ L2 ──────────────────────────┐
//! │                  ││██████████           35%      │
//! └──────────────────┘└──────────────────────────────┘
//! ```
//!
//! `q`, `Esc` and `Ctrl-C` request close. Raw mode swallows `SIGINT`, so
//! `Ctrl-C` is handled as a key here. The terminal is restored on drop.

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{info, warn};

use super::{NodeId, Paint, Renderer, SceneGraph};
use crate::display::{StickOffset, StatusPresentation};
use crate::error::{PadscopeError, Result};
use crate::frame::{AssetState, FrameView};

/// Radius of a stick dot, in canvas units.
const DOT_RADIUS: f64 = 2.0;

/// A [`Renderer`] drawing into the terminal.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    scene: Option<SceneGraph>,
    close_requested: bool,
}

impl std::fmt::Debug for TerminalRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalRenderer")
            .field("scene", &self.scene.as_ref().map(SceneGraph::name))
            .field("close_requested", &self.close_requested)
            .finish_non_exhaustive()
    }
}

impl TerminalRenderer {
    /// Switches the terminal to raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns `Render` if the terminal cannot be set up. Raw mode is undone
    /// before returning an error.
    pub fn new() -> Result<Self> {
        enable_raw_mode().map_err(|e| PadscopeError::Render(format!("enable raw mode: {}", e)))?;

        let terminal = execute!(stdout(), EnterAlternateScreen)
            .and_then(|()| Terminal::new(CrosstermBackend::new(stdout())));

        match terminal {
            Ok(terminal) => {
                info!("Terminal renderer started");
                Ok(Self {
                    terminal,
                    scene: None,
                    close_requested: false,
                })
            }
            Err(e) => {
                restore_terminal();
                Err(PadscopeError::Render(format!("terminal setup: {}", e)))
            }
        }
    }

    fn handle_input(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if is_close_key(&key) {
                    info!("Close requested from keyboard");
                    self.close_requested = true;
                }
            }
        }
        Ok(())
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        restore_terminal();
        if let Err(e) = self.terminal.show_cursor() {
            warn!("Failed to show cursor: {}", e);
        }
    }
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = execute!(stdout(), LeaveAlternateScreen) {
        warn!("Failed to leave alternate screen: {}", e);
    }
}

fn is_close_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

impl Renderer for TerminalRenderer {
    fn install_scene(&mut self, scene: SceneGraph) {
        info!("Installed model '{}' ({} nodes)", scene.name(), scene.nodes().len());
        self.scene = Some(scene);
    }

    fn node(&self, name: &str) -> Option<NodeId> {
        self.scene.as_ref()?.find(name)
    }

    fn paint(&self, node: NodeId) -> Option<Paint> {
        self.scene.as_ref()?.paint(node)
    }

    fn set_paint(&mut self, node: NodeId, paint: Paint) {
        if let Some(scene) = self.scene.as_mut() {
            scene.set_paint(node, paint);
        }
    }

    fn redraw(&mut self, view: &FrameView) -> Result<()> {
        self.handle_input()?;

        let scene = self.scene.as_ref();
        self.terminal.draw(|frame| draw(frame, scene, view))?;
        Ok(())
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }
}

fn draw(frame: &mut Frame, scene: Option<&SceneGraph>, view: &FrameView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    draw_status(frame, rows[0], &view.status);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);

    let model = Paragraph::new(model_lines(scene, view.asset)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(scene.map_or("Model", SceneGraph::name).to_string()),
    );
    frame.render_widget(model, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3), Constraint::Length(3)])
        .split(columns[1]);

    let sticks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[0]);

    draw_stick(frame, sticks[0], "Left stick", view.sticks.left, view.stick_scale);
    draw_stick(frame, sticks[1], "Right stick", view.sticks.right, view.stick_scale);
    draw_trigger(frame, right[1], "L2", view.triggers.left);
    draw_trigger(frame, right[2], "R2", view.triggers.right);

    let help = Paragraph::new(format!("Buttons: {}   q/Esc to quit", pressed_summary(&view.buttons)))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn draw_status(frame: &mut Frame, area: Rect, status: &StatusPresentation) {
    let color = if status.is_connected() { Color::Green } else { Color::Yellow };
    let paragraph = Paragraph::new(status.text())
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(paragraph, area);
}

fn draw_stick(frame: &mut Frame, area: Rect, title: &str, offset: StickOffset, scale: f32) {
    let bound = f64::from(scale.max(1.0)) + DOT_RADIUS;
    // Stick y grows downwards, canvas y grows upwards
    let (x, y) = (f64::from(offset.x), -f64::from(offset.y));

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_bounds([-bound, bound])
        .y_bounds([-bound, bound])
        .paint(move |ctx| {
            ctx.draw(&CanvasLine {
                x1: -bound,
                y1: 0.0,
                x2: bound,
                y2: 0.0,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: -bound,
                x2: 0.0,
                y2: bound,
                color: Color::DarkGray,
            });
            ctx.draw(&Circle {
                x,
                y,
                radius: DOT_RADIUS,
                color: Color::Cyan,
            });
        });
    frame.render_widget(canvas, area);
}

fn draw_trigger(frame: &mut Frame, area: Rect, title: &str, fill: f32) {
    let ratio = f64::from(fill).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(ratio);
    frame.render_widget(gauge, area);
}

/// One line per paintable node, coloured by its current paint.
fn model_lines(scene: Option<&SceneGraph>, asset: AssetState) -> Vec<Line<'static>> {
    let Some(scene) = scene else {
        let message = match asset {
            AssetState::Failed => "Model unavailable",
            _ => "Loading model...",
        };
        return vec![Line::from(Span::styled(message, Style::default().fg(Color::DarkGray)))];
    };

    scene
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let paint = scene.paint(NodeId(index))?;
            Some(Line::from(vec![
                Span::raw("  ".repeat(node.depth)),
                Span::styled("● ", Style::default().fg(paint_color(paint))),
                Span::raw(node.name.clone()),
            ]))
        })
        .collect()
}

/// Terminal colour for a paint. Unlit (black) paints are drawn dark grey.
fn paint_color(paint: Paint) -> Color {
    if paint == Paint::rgb(0, 0, 0) {
        Color::DarkGray
    } else {
        Color::Rgb(paint.r, paint.g, paint.b)
    }
}

fn pressed_summary(buttons: &[f32]) -> String {
    let pressed: Vec<String> = buttons
        .iter()
        .enumerate()
        .filter(|&(_, &value)| value > 0.0)
        .map(|(index, value)| format!("{}={:.2}", index, value))
        .collect();

    if pressed.is_empty() {
        "none".to_string()
    } else {
        pressed.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_close_keys() {
        assert!(is_close_key(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_close_key(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_close_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_close_key(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_close_key(&key(KeyCode::Char('x'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_paint_color() {
        assert_eq!(paint_color(Paint::rgb(0, 0, 0)), Color::DarkGray);
        assert_eq!(paint_color(Paint::rgb(0, 255, 0)), Color::Rgb(0, 255, 0));
    }

    #[test]
    fn test_model_lines_without_scene() {
        assert_eq!(model_lines(None, AssetState::Loading).len(), 1);
        assert_eq!(model_lines(None, AssetState::Failed).len(), 1);
    }

    #[test]
    fn test_model_lines_skip_unpaintable_nodes() {
        let scene = SceneGraph::from_json(
            r##"{
            "name": "pad",
            "nodes": [
                { "name": "body", "children": [
                    { "name": "button_cross", "materials": [{ "emissive": "#000000" }] }
                ]},
                { "name": "light_bar", "materials": [{ "emissive": "#1030a0" }] }
            ]
        }"##,
        )
        .unwrap();
        assert_eq!(model_lines(Some(&scene), AssetState::Ready).len(), 2);
    }

    #[test]
    fn test_pressed_summary() {
        assert_eq!(pressed_summary(&[]), "none");
        assert_eq!(pressed_summary(&[0.0, 1.0, 0.0, 0.5]), "1=1.00 3=0.50");
    }
}
