use plotters::style::RGBColor;

use crate::config::PlotStyle;

pub type Color = RGBColor;

pub const WHITE: Color = RGBColor(255, 255, 255);
pub const BLACK: Color = RGBColor(0, 0, 0);
pub const RETRO_FACE: Color = RGBColor(192, 192, 192);
pub const RETRO_LIGHT: Color = RGBColor(255, 255, 255);
pub const RETRO_SHADOW: Color = RGBColor(128, 128, 128);
pub const RETRO_DARK: Color = RGBColor(64, 64, 64);
pub const RETRO_TITLE: Color = RGBColor(0, 0, 128);

const MODERN_CLASSES: [[u8; 3]; 10] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

const RETRO_CLASSES: [[u8; 3]; 8] = [
    [0, 0, 255],
    [255, 0, 0],
    [0, 128, 0],
    [128, 0, 128],
    [0, 128, 128],
    [128, 128, 0],
    [255, 0, 255],
    [0, 0, 0],
];

/// Colours for one plot style.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub style: PlotStyle,
    pub background: Color,
    pub plot_background: Color,
    pub axis: Color,
    pub text: Color,
    pub curve: Color,
    pub accent: Color,
    pub good: Color,
    pub bad: Color,
}

impl Palette {
    pub fn for_style(style: PlotStyle) -> Palette {
        match style {
            PlotStyle::Modern => Palette {
                style,
                background: RGBColor(248, 248, 250),
                plot_background: WHITE,
                axis: RGBColor(90, 90, 100),
                text: RGBColor(40, 40, 48),
                curve: RGBColor(20, 20, 20),
                accent: RGBColor(31, 119, 180),
                good: RGBColor(44, 160, 44),
                bad: RGBColor(214, 39, 40),
            },
            PlotStyle::Retro95 => Palette {
                style,
                background: RETRO_FACE,
                plot_background: WHITE,
                axis: BLACK,
                text: BLACK,
                curve: BLACK,
                accent: RETRO_TITLE,
                good: RGBColor(0, 128, 0),
                bad: RGBColor(255, 0, 0),
            },
        }
    }

    pub fn class_color(&self, idx: usize) -> Color {
        match self.style {
            PlotStyle::Modern => from_array(MODERN_CLASSES[idx % MODERN_CLASSES.len()]),
            PlotStyle::Retro95 => from_array(RETRO_CLASSES[idx % RETRO_CLASSES.len()]),
        }
    }
}

fn from_array([r, g, b]: [u8; 3]) -> Color {
    RGBColor(r, g, b)
}

pub fn lerp(a: Color, b: Color, t: f64) -> Color {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Mixes `c` toward white.
pub fn lighten(c: Color, amount: f64) -> Color {
    lerp(c, WHITE, amount)
}

/// Perceptual-ish sequential map over `t` in [0, 1].
pub fn sequential(t: f64) -> Color {
    const STOPS: [[u8; 3]; 5] = [[68, 1, 84], [59, 82, 139], [33, 145, 140], [94, 201, 98], [253, 231, 37]];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (STOPS.len() - 1) as f64;
    let i = (pos.floor() as usize).min(STOPS.len() - 2);
    lerp(from_array(STOPS[i]), from_array(STOPS[i + 1]), pos - i as f64)
}

/// Blue through white to red over `t` in [-1, 1].
pub fn diverging(t: f64) -> Color {
    let blue = RGBColor(33, 102, 172);
    let red = RGBColor(178, 24, 43);
    let mid = RGBColor(247, 247, 247);
    if t < 0.0 {
        lerp(mid, blue, -t)
    } else {
        lerp(mid, red, t)
    }
}
