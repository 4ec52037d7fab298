//! Labeled horizontal slider widget.
//!
//! Renders `label min ━━━●───── max  value` on one line.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use crate::theme;

#[derive(Debug, Clone)]
pub struct Slider<'a> {
    label: &'a str,
    value: u32,
    min: u32,
    max: u32,
    track_style: Style,
    knob_style: Style,
}

impl<'a> Slider<'a> {
    pub fn new(label: &'a str, value: u32, min: u32, max: u32) -> Self {
        Self {
            label,
            value: value.clamp(min, max.max(min)),
            min,
            max: max.max(min),
            track_style: theme::muted(),
            knob_style: theme::accent_bold(),
        }
    }

    pub fn knob_style(mut self, style: Style) -> Self {
        self.knob_style = style;
        self
    }

    /// Knob column within a track of `width` cells.
    fn knob_position(&self, width: u16) -> u16 {
        if width <= 1 || self.max == self.min {
            return 0;
        }
        let frac = (self.value - self.min) as f64 / (self.max - self.min) as f64;
        (frac * (width - 1) as f64).round() as u16
    }
}

impl Widget for Slider<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let y = area.y;
        let right = area.x + area.width;

        let head = format!("{} {} ", self.label, self.min);
        let tail = format!(" {}   {}", self.max, self.value);
        let (x, _) = buf.set_stringn(area.x, y, &head, area.width as usize, theme::muted());

        let tail_len = tail.chars().count() as u16;
        let track_width = right.saturating_sub(x).saturating_sub(tail_len);
        if track_width < 3 {
            return;
        }

        let knob = self.knob_position(track_width);
        for i in 0..track_width {
            let (symbol, style) = if i < knob {
                ("━", self.knob_style)
            } else if i == knob {
                ("●", self.knob_style)
            } else {
                ("─", self.track_style)
            };
            buf.set_string(x + i, y, symbol, style);
        }

        let tail_x = x + track_width;
        buf.set_string(tail_x, y, format!(" {}", self.max), theme::muted());
        let value_text = format!("   {}", self.value);
        buf.set_string(
            tail_x + 1 + self.max.to_string().len() as u16,
            y,
            value_text,
            theme::accent_bold(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_line(slider: Slider, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        slider.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn knob_at_extremes() {
        let s = Slider::new("Years:", 1, 1, 4);
        assert_eq!(s.knob_position(10), 0);
        let s = Slider::new("Years:", 4, 1, 4);
        assert_eq!(s.knob_position(10), 9);
        let s = Slider::new("Years:", 2, 2, 2);
        assert_eq!(s.knob_position(10), 0);
    }

    #[test]
    fn value_is_clamped() {
        let s = Slider::new("Years:", 9, 1, 4);
        assert_eq!(s.value, 4);
    }

    #[test]
    fn renders_label_track_and_value() {
        let line = render_line(Slider::new("Years:", 2, 1, 4), 40);
        assert!(line.starts_with("Years: 1 "));
        assert!(line.contains('●'));
        assert!(line.trim_end().ends_with('2'));
        assert_eq!(line.matches('●').count(), 1);
    }

    #[test]
    fn narrow_area_skips_track() {
        let line = render_line(Slider::new("Years of prediction:", 2, 1, 4), 12);
        assert!(!line.contains('●'));
    }
}
