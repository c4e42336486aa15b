//! Input event translation
//!
//! Maps raw host events (buttons, keys, modifier+wheel, single-finger swipes and
//! viewport resizes) onto viewer actions. Only touch tracking carries state.

use crate::config::ViewerConfig;
use crate::fit::{FitMode, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Previous,
    Next,
    ZoomIn,
    ZoomOut,
    FitAuto,
    FitWidth,
    FitPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Plus,
    Equals,
    Minus,
    Home,
    End,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Button(Button),
    Key(Key),
    /// Pointer wheel; `zoom_modifier` is true while Ctrl/Cmd is held.
    Wheel { delta_y: f64, zoom_modifier: bool },
    TouchStart { x: f64, y: f64, touches: u32 },
    TouchEnd { x: f64, y: f64 },
    Resize(Viewport),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    Navigate(i64),
    FirstPage,
    LastPage,
    ZoomBy(f64),
    SetFitMode(FitMode),
    Refit(Viewport),
}

#[derive(Debug, Clone)]
pub struct InputTranslator {
    zoom_step: f64,
    wheel_zoom_step: f64,
    swipe_threshold: f64,
    touch_origin: Option<(f64, f64)>,
}

impl InputTranslator {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            zoom_step: config.zoom_step,
            wheel_zoom_step: config.wheel_zoom_step,
            swipe_threshold: config.swipe_threshold,
            touch_origin: None,
        }
    }

    pub fn translate(&mut self, event: InputEvent) -> Option<ViewerAction> {
        match event {
            InputEvent::Button(button) => Some(self.button(button)),
            InputEvent::Key(key) => self.key(key),
            InputEvent::Wheel { delta_y, zoom_modifier } => {
                if !zoom_modifier || delta_y == 0.0 || !delta_y.is_finite() {
                    return None;
                }

                let factor =
                    if delta_y < 0.0 { self.wheel_zoom_step } else { 1.0 / self.wheel_zoom_step };
                Some(ViewerAction::ZoomBy(factor))
            }
            InputEvent::TouchStart { x, y, touches } => {
                self.touch_origin = (touches == 1).then_some((x, y));
                None
            }
            InputEvent::TouchEnd { x, y } => {
                let (start_x, start_y) = self.touch_origin.take()?;
                let dx = x - start_x;
                let dy = y - start_y;

                if dx.abs() > self.swipe_threshold && dx.abs() > dy.abs() {
                    // Swiping left brings the next page in from the right.
                    Some(ViewerAction::Navigate(if dx < 0.0 { 1 } else { -1 }))
                } else {
                    None
                }
            }
            InputEvent::Resize(viewport) => Some(ViewerAction::Refit(viewport)),
        }
    }

    fn button(&self, button: Button) -> ViewerAction {
        match button {
            Button::Previous => ViewerAction::Navigate(-1),
            Button::Next => ViewerAction::Navigate(1),
            Button::ZoomIn => ViewerAction::ZoomBy(self.zoom_step),
            Button::ZoomOut => ViewerAction::ZoomBy(1.0 / self.zoom_step),
            Button::FitAuto => ViewerAction::SetFitMode(FitMode::Auto),
            Button::FitWidth => ViewerAction::SetFitMode(FitMode::Width),
            Button::FitPage => ViewerAction::SetFitMode(FitMode::Page),
        }
    }

    fn key(&self, key: Key) -> Option<ViewerAction> {
        match key {
            Key::ArrowLeft => Some(ViewerAction::Navigate(-1)),
            Key::ArrowRight => Some(ViewerAction::Navigate(1)),
            Key::Plus | Key::Equals => Some(ViewerAction::ZoomBy(self.zoom_step)),
            Key::Minus => Some(ViewerAction::ZoomBy(1.0 / self.zoom_step)),
            Key::Home => Some(ViewerAction::FirstPage),
            Key::End => Some(ViewerAction::LastPage),
            Key::Other => None,
        }
    }
}
