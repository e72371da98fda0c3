//! RGB / HSL color model and ANSI style codes.
//!
//! Both color types clamp their channels on construction instead of
//! rejecting out-of-range input:
//!
//! - `Rgb`: every channel in `[0, 255]`
//! - `Hsl`: hue in `[0, 359]` degrees, saturation and lightness in `[0, 99]`
//!
//! Saturation and lightness are scaled by their inclusive upper bound, so
//! `99` means fully saturated / fully lit. HSL channels are kept as `f64`,
//! which keeps an `Rgb -> Hsl -> Rgb` round trip within one unit per channel.

use crossterm::style::Color;

/// Upper bound of the saturation and lightness channels.
const SL_MAX: f64 = 99.0;

/// An SGR style code (`ESC [ <code> m`).
///
/// Codes are grouped in three families; the terminal driver checks the
/// family before emitting and silently ignores anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style(pub u8);

#[allow(dead_code)]
impl Style {
    pub const FG_BLACK: Style = Style(30);
    pub const FG_RED: Style = Style(31);
    pub const FG_GREEN: Style = Style(32);
    pub const FG_YELLOW: Style = Style(33);
    pub const FG_BLUE: Style = Style(34);
    pub const FG_MAGENTA: Style = Style(35);
    pub const FG_CYAN: Style = Style(36);
    pub const FG_WHITE: Style = Style(37);
    pub const FG_DEFAULT: Style = Style(39);

    pub const FG_BRIGHT_BLACK: Style = Style(90);
    pub const FG_BRIGHT_RED: Style = Style(91);
    pub const FG_BRIGHT_GREEN: Style = Style(92);
    pub const FG_BRIGHT_YELLOW: Style = Style(93);
    pub const FG_BRIGHT_BLUE: Style = Style(94);
    pub const FG_BRIGHT_MAGENTA: Style = Style(95);
    pub const FG_BRIGHT_CYAN: Style = Style(96);
    pub const FG_BRIGHT_WHITE: Style = Style(97);

    pub const BG_BLACK: Style = Style(40);
    pub const BG_RED: Style = Style(41);
    pub const BG_GREEN: Style = Style(42);
    pub const BG_YELLOW: Style = Style(43);
    pub const BG_BLUE: Style = Style(44);
    pub const BG_MAGENTA: Style = Style(45);
    pub const BG_CYAN: Style = Style(46);
    pub const BG_WHITE: Style = Style(47);
    pub const BG_DEFAULT: Style = Style(49);

    pub const BG_BRIGHT_BLACK: Style = Style(100);
    pub const BG_BRIGHT_RED: Style = Style(101);
    pub const BG_BRIGHT_GREEN: Style = Style(102);
    pub const BG_BRIGHT_YELLOW: Style = Style(103);
    pub const BG_BRIGHT_BLUE: Style = Style(104);
    pub const BG_BRIGHT_MAGENTA: Style = Style(105);
    pub const BG_BRIGHT_CYAN: Style = Style(106);
    pub const BG_BRIGHT_WHITE: Style = Style(107);

    pub const TEXT_DEFAULT: Style = Style(0);
    pub const TEXT_BOLD: Style = Style(1);
    pub const TEXT_FAINT: Style = Style(2);
    pub const TEXT_ITALIC: Style = Style(3);
    pub const TEXT_UNDERLINE: Style = Style(4);
    pub const TEXT_BLINKING: Style = Style(5);
    pub const TEXT_REVERSE: Style = Style(7);
    pub const TEXT_HIDDEN: Style = Style(8);
    pub const TEXT_STRIKETHROUGH: Style = Style(9);

    /// Foreground codes: 30-39 and 90-97.
    pub fn is_foreground(self) -> bool {
        matches!(self.0, 30..=39 | 90..=97)
    }

    /// Background codes: 40-49 and 100-107.
    pub fn is_background(self) -> bool {
        matches!(self.0, 40..=49 | 100..=107)
    }

    /// Text attribute codes: 0-9.
    pub fn is_text(self) -> bool {
        self.0 <= 9
    }
}

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A color in hue / saturation / lightness space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    h: f64,
    s: f64,
    l: f64,
}

impl Rgb {
    /// Build a color, clamping each channel into `[0, 255]`.
    pub fn new(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
        }
    }

    #[allow(dead_code)]
    /// Fully saturated, mid-lightness color for a hue in degrees.
    pub fn from_hue(hue: f64) -> Self {
        Hsl::new(hue, SL_MAX, SL_MAX / 2.0).to_rgb()
    }

    pub fn to_hsl(self) -> Hsl {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l: l * SL_MAX };
        }

        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        // h * 60 lies in [0, 360); the stored value keeps the fraction past
        // 359 so conversion back stays within one step, `hue()` clamps it
        Hsl {
            h: h * 60.0,
            s: s * SL_MAX,
            l: l * SL_MAX,
        }
    }
}

impl Hsl {
    /// Build a color, clamping hue into `[0, 359]` and saturation and
    /// lightness into `[0, 99]`.
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Self {
            h: h.clamp(0.0, 359.0),
            s: s.clamp(0.0, SL_MAX),
            l: l.clamp(0.0, SL_MAX),
        }
    }

    /// Hue in degrees, within `[0, 359]`
    pub fn hue(&self) -> f64 {
        self.h.min(359.0)
    }

    pub fn saturation(&self) -> f64 {
        self.s
    }

    pub fn lightness(&self) -> f64 {
        self.l
    }

    pub fn to_rgb(self) -> Rgb {
        let h = self.h / 360.0;
        let s = self.s / SL_MAX;
        let l = self.l / SL_MAX;

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_channel(p, q, h + 1.0 / 3.0),
                hue_channel(p, q, h),
                hue_channel(p, q, h - 1.0 / 3.0),
            )
        };

        Rgb::new(
            (r * 255.0).round() as i32,
            (g * 255.0).round() as i32,
            (b * 255.0).round() as i32,
        )
    }
}

fn hue_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl From<Rgb> for Hsl {
    fn from(color: Rgb) -> Self {
        color.to_hsl()
    }
}

impl From<Hsl> for Rgb {
    fn from(color: Hsl) -> Self {
        color.to_rgb()
    }
}

impl From<Rgb> for Color {
    fn from(color: Rgb) -> Self {
        Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgb, b: Rgb) {
        let diff = |x: u8, y: u8| (i32::from(x) - i32::from(y)).abs();
        assert!(
            diff(a.r, b.r) <= 1 && diff(a.g, b.g) <= 1 && diff(a.b, b.b) <= 1,
            "{:?} vs {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_rgb_clamping() {
        assert_eq!(Rgb::new(300, -5, 10), Rgb { r: 255, g: 0, b: 10 });
    }

    #[test]
    fn test_hsl_clamping() {
        let hsl = Hsl::new(400.0, 150.0, -1.0);
        assert_eq!(hsl.hue(), 359.0);
        assert_eq!(hsl.saturation(), 99.0);
        assert_eq!(hsl.lightness(), 0.0);
    }

    #[test]
    fn test_round_trip_within_one() {
        for r in (0..=255).step_by(15) {
            for g in (0..=255).step_by(17) {
                for b in (0..=255).step_by(5) {
                    let color = Rgb::new(r, g, b);
                    assert_close(color.to_hsl().to_rgb(), color);
                }
            }
        }
        for edge in [Rgb::new(255, 0, 1), Rgb::new(1, 1, 1), Rgb::new(254, 255, 255)] {
            assert_close(edge.to_hsl().to_rgb(), edge);
        }
    }

    #[test]
    fn test_hue_stays_in_range() {
        let hsl = Rgb::new(255, 0, 1).to_hsl();
        assert_eq!(hsl.hue(), 359.0);
        assert_close(hsl.to_rgb(), Rgb::new(255, 0, 1));

        for b in 1..=255 {
            let hue = Rgb::new(255, 0, b).to_hsl().hue();
            assert!((0.0..=359.0).contains(&hue), "hue {} for b={}", hue, b);
        }
    }

    #[test]
    fn test_achromatic() {
        let hsl = Rgb::new(128, 128, 128).to_hsl();
        assert_eq!(hsl.saturation(), 0.0);
        assert_eq!(hsl.hue(), 0.0);
        assert_eq!(Hsl::new(0.0, 0.0, 99.0).to_rgb(), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_from_hue() {
        assert_eq!(Rgb::from_hue(0.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hue(120.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hue(240.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_style_families() {
        assert!(Style::FG_RED.is_foreground());
        assert!(Style::FG_BRIGHT_WHITE.is_foreground());
        assert!(!Style::BG_RED.is_foreground());
        assert!(Style::BG_BRIGHT_BLUE.is_background());
        assert!(Style::TEXT_REVERSE.is_text());
        assert!(!Style(98).is_foreground());
        assert!(!Style(12).is_text());
    }
}
