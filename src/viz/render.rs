//! Live plot rendering. Each frame is drawn with plotters into an
//! in-memory RGB buffer, encoded to PNG and swapped into place atomically.

use std::error::Error;
use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageOutputFormat, RgbImage};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, ChartBuilder, ChartContext, Circle, DashedLineSeries, DrawingArea, IntoDrawingArea, IntoFont,
    LineSeries, PathElement, Rectangle, ShapeStyle, TextStyle,
};
use plotters::style::Color as _;
use tracing::debug;

use crate::config::PlotStyle;
use crate::error::{FitError, Result};
use crate::fsio::atomic_write;
use crate::task::{Targets, TaskKind};
use crate::train::predictor::{argmax, Predictor, Scores};
use crate::train::progress::ProgressEvent;
use crate::viz::color::{
    diverging, lerp, lighten, sequential, Color, Palette, RETRO_DARK, RETRO_LIGHT, RETRO_SHADOW, RETRO_TITLE, WHITE,
};
use crate::viz::projection::Projection;

pub const WIDTH: u32 = 720;
const MODERN_HEIGHT: u32 = 540;
const RETRO_HEIGHT: u32 = 640;

const CURVE_SAMPLES: usize = 240;
const GRID_W: usize = 96;
const GRID_H: usize = 72;
const PAD: f64 = 0.05;

type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DrawResult<T = ()> = std::result::Result<T, Box<dyn Error>>;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub path: PathBuf,
    pub style: PlotStyle,
    pub projection: Projection,
    /// Render every n-th epoch; 0 renders the final epoch only.
    pub frame_every: usize,
    pub seed: u64,
}

/// True on every `frame_every`-th epoch and always on the last one.
pub fn should_render(epoch: usize, epochs_total: usize, frame_every: usize) -> bool {
    epoch >= epochs_total || (frame_every > 0 && epoch % frame_every == 0)
}

/// Keeps the data to plot, the cached embedding and the score history
/// for one run.
pub struct Renderer {
    opts: RenderOptions,
    x: Vec<Vec<f64>>,
    y: Targets,
    embedding: Option<Vec<[f64; 2]>>,
    history: Vec<f64>,
    frames: usize,
}

impl Renderer {
    pub fn new(opts: RenderOptions, x: Vec<Vec<f64>>, y: Targets) -> Renderer {
        Renderer { opts, x, y, embedding: None, history: Vec::new(), frames: 0 }
    }

    /// Per-epoch scores clamped to [0, 1].
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    pub fn path(&self) -> &std::path::Path {
        &self.opts.path
    }

    /// Records the event and writes a frame when one is due. Returns
    /// whether a frame was written.
    pub fn observe(&mut self, event: &ProgressEvent, model: &dyn Predictor) -> Result<bool> {
        let s = if event.score.is_finite() { event.score.clamp(0.0, 1.0) } else { 0.0 };
        self.history.push(s);
        if !should_render(event.epoch, event.epochs_total, self.opts.frame_every) {
            return Ok(false);
        }
        let frame = self.draw(event, model)?;
        atomic_write(&self.opts.path, &encode_png(&frame)?)?;
        self.frames += 1;
        debug!(epoch = event.epoch, path = %self.opts.path.display(), "plot frame written");
        Ok(true)
    }

    /// Draws one frame without writing it.
    pub fn draw(&mut self, event: &ProgressEvent, model: &dyn Predictor) -> Result<RgbImage> {
        self.ensure_embedding();
        let pal = Palette::for_style(self.opts.style);
        let height = match self.opts.style {
            PlotStyle::Modern => MODERN_HEIGHT,
            PlotStyle::Retro95 => RETRO_HEIGHT,
        };
        let mut buf = vec![0u8; WIDTH as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, height)).into_drawing_area();
            self.paint(&root, event, model, &pal).map_err(|e| FitError::Plot(e.to_string()))?;
        }
        RgbImage::from_raw(WIDTH, height, buf)
            .ok_or_else(|| FitError::Plot("frame buffer does not match the frame size".to_string()))
    }

    fn ensure_embedding(&mut self) {
        let d = self.x.first().map_or(0, Vec::len);
        if self.embedding.is_none() && d >= 3 {
            debug!(projection = %self.opts.projection, rows = self.x.len(), "projecting features");
            self.embedding = Some(self.opts.projection.project(&self.x, self.opts.seed));
        }
    }

    fn paint(&self, root: &Area, event: &ProgressEvent, model: &dyn Predictor, pal: &Palette) -> DrawResult {
        root.fill(&pal.background)?;
        match self.opts.style {
            PlotStyle::Modern => self.draw_modern(root, event, model, pal)?,
            PlotStyle::Retro95 => self.draw_retro(root, event, model, pal)?,
        }
        root.present()?;
        Ok(())
    }

    fn draw_modern(&self, root: &Area, event: &ProgressEvent, model: &dyn Predictor, pal: &Palette) -> DrawResult {
        root.draw_text(&caption(event), &text_style(pal.text, 20, pal), (48, 12))?;
        let view = root.clone().shrink((24, 40), (680, 456));
        self.draw_view(&view, model, pal)?;
        progress_bar(root, (48, 508, 652, 12), event, pal.accent, false)
    }

    fn draw_retro(&self, root: &Area, event: &ProgressEvent, model: &dyn Predictor, pal: &Palette) -> DrawResult {
        bevel(root, (0, 0, WIDTH as i32, RETRO_HEIGHT as i32), true)?;
        root.draw(&Rectangle::new([(4, 4), (WIDTH as i32 - 5, 24)], RETRO_TITLE.filled()))?;
        root.draw_text(&caption(event), &text_style(WHITE, 14, pal), (10, 8))?;

        let strip = root.clone().shrink((12, 30), (696, 110));
        strip.fill(&WHITE)?;
        self.draw_strip(&strip, event.epochs_total, pal)?;
        bevel(root, (12, 30, 696, 110), false)?;

        let view = root.clone().shrink((14, 152), (692, 426));
        self.draw_view(&view, model, pal)?;
        bevel(root, (12, 150, 696, 430), false)?;

        bevel(root, (12, 592, 696, 24), false)?;
        progress_bar(root, (15, 595, 690, 18), event, RETRO_TITLE, true)
    }

    /// Score history as bars quantized to whole percent.
    fn draw_strip(&self, area: &Area, epochs_total: usize, pal: &Palette) -> DrawResult {
        let slots = epochs_total.max(self.history.len()).max(1) as f64;
        let mut chart = ChartBuilder::on(area)
            .margin(4)
            .y_label_area_size(36)
            .x_label_area_size(16)
            .caption("score", text_style(pal.text, 12, pal))
            .build_cartesian_2d(0.0..slots, 0.0..100.0)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(2)
            .y_labels(5)
            .y_label_formatter(&percent)
            .label_style(text_style(pal.text, 11, pal))
            .axis_style(pal.axis)
            .bold_line_style(lighten(pal.axis, 0.7))
            .light_line_style(WHITE)
            .draw()?;
        chart.draw_series(self.history.iter().enumerate().map(|(k, s)| {
            let pct = (s * 100.0).round();
            Rectangle::new([(k as f64, 0.0), ((k + 1) as f64, pct)], pal.accent.filled())
        }))?;
        Ok(())
    }

    fn draw_view(&self, area: &Area, model: &dyn Predictor, pal: &Palette) -> DrawResult {
        area.fill(&pal.plot_background)?;
        if self.x.is_empty() {
            return Ok(());
        }
        let scores = model.predict_scores(&self.x);
        let d = self.x[0].len();
        let task = model.task();

        match (task.kind, d) {
            (TaskKind::MultilabelClassification, _) => {
                let coords = self.coords_for_labels();
                self.side_by_side_multilabel(area, &coords, &scores, pal)
            }
            (_, 1) => self.one_d(area, model, &scores, pal),
            (_, 2) => self.two_d(area, model, &scores, pal),
            _ => {
                let coords = self.embedding.clone().unwrap_or_default();
                self.side_by_side(area, &coords, &scores, pal)
            }
        }
    }

    /// Plot coordinates for multilabel views: raw features up to two
    /// dimensions, the embedding beyond. With one feature the vertical
    /// axis is the number of active labels.
    fn coords_for_labels(&self) -> Vec<[f64; 2]> {
        match self.x[0].len() {
            1 => {
                let active: Vec<f64> = match &self.y {
                    Targets::Indicators(rows) => rows.iter().map(|r| r.iter().map(|&b| b as f64).sum()).collect(),
                    _ => vec![0.0; self.x.len()],
                };
                self.x.iter().zip(active).map(|(r, a)| [r[0], a]).collect()
            }
            2 => self.x.iter().map(|r| [r[0], r[1]]).collect(),
            _ => self.embedding.clone().unwrap_or_default(),
        }
    }

    // -----------------------------------------------------------------------
    // One feature
    // -----------------------------------------------------------------------

    fn one_d(&self, area: &Area, model: &dyn Predictor, scores: &Scores, pal: &Palette) -> DrawResult {
        let xs: Vec<f64> = self.x.iter().map(|r| r[0]).collect();
        let data_x = bounds(xs.iter().copied());
        let (lo, hi) = window(data_x);
        let grid_x: Vec<f64> =
            (0..CURVE_SAMPLES).map(|i| lo + (hi - lo) * i as f64 / (CURVE_SAMPLES - 1) as f64).collect();
        let grid: Vec<Vec<f64>> = grid_x.iter().map(|&g| vec![g]).collect();
        let curve = model.predict_scores(&grid);

        match (&self.y, &curve) {
            (Targets::Values(truth), Scores::Regression(fit)) => {
                let data_y = bounds(truth.iter().chain(fit).copied());
                let mut chart = chart(area, None, data_x, data_y, pal)?;
                let (y_lo, y_hi) = window(data_y);
                let points: Vec<_> =
                    xs.iter().zip(truth).map(|(&vx, &vy)| ((vx, vy), lighten(pal.accent, 0.3))).collect();
                scatter(&mut chart, &points, 2, pal.accent)?;
                chart.draw_series(LineSeries::new(
                    grid_x.iter().zip(fit).filter(|(_, v)| v.is_finite()).map(|(&gx, &v)| (gx, v.clamp(y_lo, y_hi))),
                    pal.curve.stroke_width(2),
                ))?;
            }
            (Targets::Classes(truth), Scores::Binary(p)) => {
                let mut chart = chart(area, None, data_x, (0.0, 1.0), pal)?;
                let (y_lo, y_hi) = window((0.0, 1.0));
                chart.draw_series(DashedLineSeries::new(
                    [(lo, 0.5), (hi, 0.5)],
                    6,
                    4,
                    ShapeStyle::from(pal.axis),
                ))?;
                let points: Vec<_> =
                    xs.iter().zip(truth).map(|(&vx, &cls)| ((vx, cls as f64), pal.class_color(cls))).collect();
                scatter(&mut chart, &points, 2, pal.curve)?;
                let pts: Vec<(f64, f64)> = grid_x.iter().copied().zip(p.iter().copied()).collect();
                chart.draw_series(LineSeries::new(
                    pts.iter().copied().filter(|(_, v)| v.is_finite()),
                    pal.curve.stroke_width(2),
                ))?;
                let crossings = pts
                    .windows(2)
                    .filter(|pair| (pair[0].1 - 0.5).signum() != (pair[1].1 - 0.5).signum())
                    .map(|pair| (pair[0].0 + pair[1].0) / 2.0);
                chart.draw_series(crossings.map(|mx| PathElement::new(vec![(mx, y_lo), (mx, y_hi)], pal.bad)))?;
            }
            (Targets::Classes(truth), Scores::Multiclass(probs)) => {
                let mut chart = chart(area, None, data_x, (0.0, 1.0), pal)?;
                let n_classes = probs.first().map_or(0, Vec::len);
                for k in 0..n_classes {
                    let pts = grid_x.iter().copied().zip(probs.iter().map(|p| p[k]));
                    chart.draw_series(LineSeries::new(
                        pts.filter(|(_, v)| v.is_finite()),
                        pal.class_color(k).stroke_width(2),
                    ))?;
                }
                if let Scores::Multiclass(row_probs) = scores {
                    let points: Vec<_> = xs
                        .iter()
                        .zip(truth)
                        .zip(row_probs)
                        .map(|((&vx, &cls), p)| ((vx, p.get(cls).copied().unwrap_or(0.0)), pal.class_color(cls)))
                        .collect();
                    scatter(&mut chart, &points, 2, pal.curve)?;
                }
            }
            _ => {
                chart(area, None, data_x, (0.0, 1.0), pal)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Two features
    // -----------------------------------------------------------------------

    fn two_d(&self, area: &Area, model: &dyn Predictor, scores: &Scores, pal: &Palette) -> DrawResult {
        let data_x = bounds(self.x.iter().map(|r| r[0]));
        let data_y = bounds(self.x.iter().map(|r| r[1]));
        let mut chart = chart(area, None, data_x, data_y, pal)?;

        match &self.y {
            Targets::Classes(truth) => {
                let ((x_lo, x_hi), (y_lo, y_hi)) = (window(data_x), window(data_y));
                let (dx, dy) = ((x_hi - x_lo) / GRID_W as f64, (y_hi - y_lo) / GRID_H as f64);
                let corners: Vec<(f64, f64)> = (0..GRID_H)
                    .flat_map(|j| (0..GRID_W).map(move |i| (x_lo + i as f64 * dx, y_lo + j as f64 * dy)))
                    .collect();
                let centres: Vec<Vec<f64>> = corners.iter().map(|&(cx, cy)| vec![cx + dx / 2.0, cy + dy / 2.0]).collect();
                let surface = model.predict_scores(&centres);
                chart.draw_series(corners.iter().enumerate().map(|(idx, &(cx, cy))| {
                    Rectangle::new([(cx, cy), (cx + dx, cy + dy)], surface_color(&surface, idx, pal).filled())
                }))?;
                let points: Vec<_> =
                    self.x.iter().zip(truth).map(|(row, &cls)| ((row[0], row[1]), pal.class_color(cls))).collect();
                scatter(&mut chart, &points, 3, pal.curve)?;
            }
            Targets::Values(truth) => {
                if let Scores::Regression(pred) = scores {
                    let residuals: Vec<f64> = pred.iter().zip(truth).map(|(p, t)| p - t).collect();
                    let scale = residuals.iter().map(|r| r.abs()).filter(|r| r.is_finite()).fold(0.0, f64::max);
                    let points: Vec<_> = self
                        .x
                        .iter()
                        .zip(&residuals)
                        .map(|(row, r)| ((row[0], row[1]), diverging(if scale > 0.0 { r / scale } else { 0.0 })))
                        .collect();
                    scatter(&mut chart, &points, 3, pal.axis)?;
                }
            }
            Targets::Indicators(_) => {}
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Projected views
    // -----------------------------------------------------------------------

    fn side_by_side(&self, area: &Area, coords: &[[f64; 2]], scores: &Scores, pal: &Palette) -> DrawResult {
        let pred = scores.to_targets();
        let (truth_colors, pred_colors): (Vec<Color>, Vec<Color>) = match (&self.y, &pred) {
            (Targets::Classes(t), Targets::Classes(p)) => (
                t.iter().map(|&k| pal.class_color(k)).collect(),
                p.iter().map(|&k| pal.class_color(k)).collect(),
            ),
            (Targets::Values(t), Targets::Values(p)) => {
                let (lo, hi) = bounds(t.iter().chain(p).copied());
                let norm = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
                (t.iter().map(|&v| sequential(norm(v))).collect(), p.iter().map(|&v| sequential(norm(v))).collect())
            }
            _ => (Vec::new(), Vec::new()),
        };
        panels(area, coords, &truth_colors, &pred_colors, pal)
    }

    fn side_by_side_multilabel(&self, area: &Area, coords: &[[f64; 2]], scores: &Scores, pal: &Palette) -> DrawResult {
        let (Targets::Indicators(truth), Targets::Indicators(pred)) = (&self.y, scores.to_targets()) else {
            return panels(area, coords, &[], &[], pal);
        };
        let labels = truth.first().map_or(1, Vec::len).max(1) as f64;
        let truth_colors: Vec<Color> = truth
            .iter()
            .map(|r| sequential(r.iter().map(|&b| b as f64).sum::<f64>() / labels))
            .collect();
        let pred_colors: Vec<Color> =
            truth.iter().zip(&pred).map(|(t, p)| if t == p { pal.good } else { pal.bad }).collect();
        panels(area, coords, &truth_colors, &pred_colors, pal)
    }
}

/// Two scatter charts over the same coordinates: truth on the left,
/// prediction on the right.
fn panels(area: &Area, coords: &[[f64; 2]], left: &[Color], right: &[Color], pal: &Palette) -> DrawResult {
    let (w, _) = area.dim_in_pixel();
    let (left_area, right_area) = area.split_horizontally(w / 2);
    let xb = bounds(coords.iter().map(|p| p[0]));
    let yb = bounds(coords.iter().map(|p| p[1]));
    for (panel, title, colors) in [(&left_area, "true", left), (&right_area, "predicted", right)] {
        let mut chart = chart(panel, Some(title), xb, yb, pal)?;
        let points: Vec<_> = coords.iter().zip(colors).map(|(p, &c)| ((p[0], p[1]), c)).collect();
        scatter(&mut chart, &points, 2, pal.axis)?;
    }
    Ok(())
}

/// Cartesian chart over the padded data window with labelled axes.
fn chart<'a, 'b>(
    area: &'a Area<'b>,
    title: Option<&str>,
    xs: (f64, f64),
    ys: (f64, f64),
    pal: &Palette,
) -> DrawResult<Chart<'a, 'b>> {
    let (x_lo, x_hi) = window(xs);
    let (y_lo, y_hi) = window(ys);
    let mut builder = ChartBuilder::on(area);
    builder.margin(8).x_label_area_size(24).y_label_area_size(52);
    if let Some(title) = title {
        builder.caption(title, text_style(pal.text, 16, pal));
    }
    let mut chart = builder.build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_labels(5)
        .y_labels(5)
        .x_label_formatter(&tick)
        .y_label_formatter(&tick)
        .label_style(text_style(pal.text, 12, pal))
        .axis_style(pal.axis)
        .bold_line_style(lighten(pal.axis, 0.8))
        .light_line_style(lighten(pal.axis, 0.93))
        .draw()?;
    Ok(chart)
}

/// Ringed markers: a slightly larger circle in `ring` under each fill.
fn scatter(chart: &mut Chart, points: &[((f64, f64), Color)], radius: i32, ring: Color) -> DrawResult {
    chart.draw_series(points.iter().map(|&(p, _)| Circle::new(p, radius + 1, ring.filled())))?;
    chart.draw_series(points.iter().map(|&(p, fill)| Circle::new(p, radius, fill.filled())))?;
    Ok(())
}

fn surface_color(surface: &Scores, idx: usize, pal: &Palette) -> Color {
    match surface {
        Scores::Binary(p) => lighten(lerp(pal.class_color(0), pal.class_color(1), p[idx]), 0.65),
        Scores::Multiclass(rows) => lighten(pal.class_color(argmax(&rows[idx])), 0.65),
        _ => pal.plot_background,
    }
}

/// Two-pixel 3D edge; raised panels are lit top-left, sunken ones
/// bottom-right.
fn bevel(area: &Area, (x, y, w, h): (i32, i32, i32, i32), raised: bool) -> DrawResult {
    let (outer_lit, outer_dark) = if raised { (RETRO_LIGHT, RETRO_DARK) } else { (RETRO_SHADOW, RETRO_LIGHT) };
    let (inner_lit, inner_dark) = if raised { (RETRO_LIGHT, RETRO_SHADOW) } else { (RETRO_DARK, RETRO_SHADOW) };
    let (r, b) = (x + w - 1, y + h - 1);
    let edges = [
        (vec![(x, b), (x, y), (r, y)], outer_lit),
        (vec![(x, b), (r, b), (r, y)], outer_dark),
        (vec![(x + 1, b - 1), (x + 1, y + 1), (r - 1, y + 1)], inner_lit),
        (vec![(x + 1, b - 1), (r - 1, b - 1), (r - 1, y + 1)], inner_dark),
    ];
    for (points, color) in edges {
        area.draw(&PathElement::new(points, color))?;
    }
    Ok(())
}

fn progress_bar(
    area: &Area,
    (x, y, w, h): (i32, i32, i32, i32),
    event: &ProgressEvent,
    fill: Color,
    chunked: bool,
) -> DrawResult {
    let frac = event.epoch as f64 / event.epochs_total.max(1) as f64;
    let filled = (frac.clamp(0.0, 1.0) * w as f64).round() as i32;
    if chunked {
        let block = 10;
        let mut bx = x;
        while bx + block <= x + filled {
            area.draw(&Rectangle::new([(bx + 1, y + 1), (bx + block - 2, y + h - 2)], fill.filled()))?;
            bx += block;
        }
    } else {
        area.draw(&Rectangle::new([(x, y), (x + w, y + h)], lighten(fill, 0.8).filled()))?;
        if filled > 0 {
            area.draw(&Rectangle::new([(x, y), (x + filled, y + h)], fill.filled()))?;
        }
    }
    Ok(())
}

fn caption(event: &ProgressEvent) -> String {
    format!("Epoch {}/{}  score {:.4}", event.epoch, event.epochs_total, event.score)
}

fn text_style(color: Color, size: u32, pal: &Palette) -> TextStyle<'static> {
    let family = match pal.style {
        PlotStyle::Modern => "sans-serif",
        PlotStyle::Retro95 => "monospace",
    };
    (family, size).into_font().color(&color)
}

fn tick(v: &f64) -> String {
    format!("{v:.2}")
}

fn percent(v: &f64) -> String {
    format!("{v:.0}%")
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

/// `(min, max)` of finite values, or `(0, 1)` when there are none.
pub fn bounds(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        (0.0, 1.0)
    } else {
        (lo, hi)
    }
}

/// Pads a data range by `PAD` of its span on each side; a degenerate span
/// is widened to one unit.
fn window((lo, hi): (f64, f64)) -> (f64, f64) {
    let (lo, hi) = if lo.is_finite() && hi.is_finite() { (lo, hi) } else { (0.0, 1.0) };
    let span = hi - lo;
    if span <= f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo - span * PAD, hi + span * PAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSpec;

    struct Line(TaskSpec);

    impl Predictor for Line {
        fn task(&self) -> &TaskSpec {
            &self.0
        }

        fn predict_scores(&self, x: &[Vec<f64>]) -> Scores {
            Scores::Regression(x.iter().map(|r| r.iter().sum()).collect())
        }
    }

    fn opts(dir: &std::path::Path, style: PlotStyle) -> RenderOptions {
        RenderOptions {
            path: dir.join("plot.png"),
            style,
            projection: Projection::Pca2,
            frame_every: 5,
            seed: 1,
        }
    }

    #[test]
    fn cadence_includes_final_epoch() {
        assert!(should_render(5, 12, 5));
        assert!(!should_render(6, 12, 5));
        assert!(should_render(12, 12, 5));
        assert!(!should_render(3, 12, 0));
        assert!(should_render(12, 12, 0));
    }

    #[test]
    fn windows_pad_and_widen() {
        assert_eq!(window((2.0, 2.0)), (1.5, 2.5));
        assert_eq!(window((0.0, 10.0)), (-0.5, 10.5));
        assert_eq!(bounds([f64::NAN]), (0.0, 1.0));
        assert_eq!(bounds([3.0, -1.0, f64::INFINITY]), (-1.0, 3.0));
    }

    #[test]
    fn writes_frames_on_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = Targets::Values(x.iter().map(|r| r[0]).collect());
        let mut r = Renderer::new(opts(dir.path(), PlotStyle::Modern), x, y);
        let model = Line(TaskSpec::regression(1));
        for epoch in 1..=7 {
            let e = ProgressEvent { epoch, epochs_total: 7, loss: 0.0, score: 1.5 };
            r.observe(&e, &model).unwrap();
        }
        assert_eq!(r.frames_written(), 2);
        assert_eq!(r.history(), &[1.0; 7]);
        let bytes = std::fs::read(dir.path().join("plot.png")).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
        assert!(!dir.path().join("plot.png.tmp").exists());
    }

    #[test]
    fn retro_frame_is_taller_and_projects_wide_data() {
        let dir = tempfile::tempdir().unwrap();
        let x: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64, (i * 2) as f64, (i % 3) as f64]).collect();
        let y = Targets::Values(x.iter().map(|r| r[0]).collect());
        let mut r = Renderer::new(opts(dir.path(), PlotStyle::Retro95), x, y);
        let e = ProgressEvent { epoch: 1, epochs_total: 1, loss: 0.0, score: 0.5 };
        let frame = r.draw(&e, &Line(TaskSpec::regression(3))).unwrap();
        assert_eq!((frame.width(), frame.height()), (WIDTH, RETRO_HEIGHT));
        assert!(r.embedding.as_ref().is_some_and(|e| e.len() == 12));
    }
}
