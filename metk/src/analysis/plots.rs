//! Scatter and error-histogram pages in kcal/mol and in IC50 units, collected
//! into one two-page PDF.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref};
use plotters::coord::Shift;
use plotters::prelude::*;
use svg2pdf::usvg;
use tracing::info;

use crate::analysis::error_metrics::{
    bin_errors, fold_errors, kcal_errors, normalized_histogram, FOLD_ERROR_BINS, KCAL_ERROR_BINS,
};
use crate::config::{PlotFormat, PlotOptions};
use crate::error::{plot_err, MetkError, Result};
use crate::helper_functions::basic_stats;
use crate::models::{ErrorBin, PairedSamples};

const PAGE_WIDTH: u32 = 700;
const PAGE_HEIGHT: u32 = 700;
const PLOT_MARGIN: i32 = 15;
const FONT_SIZE_TITLE: u32 = 20;
const FONT_SIZE_AXIS: u32 = 15;
const POINT_SIZE: i32 = 6;
const PAGE_XOBJECT: Name<'static> = Name(b"Page");

fn bin_colour(bin: ErrorBin) -> RGBColor {
    match bin {
        ErrorBin::Low => GREEN,
        ErrorBin::Medium => YELLOW,
        ErrorBin::High => RED,
    }
}

/// Draws the kcal/mol page and the IC50 page into `<prefix>.pdf`.
///
/// When `options.extra_format` is set, each page is also written as
/// `<prefix>_kcal.<ext>` and `<prefix>_ic50.<ext>`. Returns the paths written,
/// the PDF first.
pub fn draw_plots(
    samples: &PairedSamples,
    prefix: &str,
    options: &PlotOptions,
) -> Result<Vec<PathBuf>> {
    let concentrations = samples.to_concentration(options.units)?;
    let unit_label = options.units.label();

    let kcal_svg = svg_page(|root| draw_kcal_page(root, samples))?;
    let ic50_svg = svg_page(|root| draw_ic50_page(root, &concentrations, unit_label))?;

    let pdf_path = PathBuf::from(format!("{prefix}.pdf"));
    write_pdf(&[kcal_svg.as_str(), ic50_svg.as_str()], &pdf_path)?;
    info!("Plots saved: {}", pdf_path.display());
    let mut written = vec![pdf_path];

    if let Some(format) = options.extra_format {
        let ext = format.extension();
        let kcal_path = PathBuf::from(format!("{prefix}_kcal.{ext}"));
        let ic50_path = PathBuf::from(format!("{prefix}_ic50.{ext}"));
        match format {
            PlotFormat::Png => {
                let root = BitMapBackend::new(&kcal_path, (PAGE_WIDTH, PAGE_HEIGHT)).into_drawing_area();
                draw_kcal_page(&root, samples)?;
                root.present().map_err(plot_err)?;

                let root = BitMapBackend::new(&ic50_path, (PAGE_WIDTH, PAGE_HEIGHT)).into_drawing_area();
                draw_ic50_page(&root, &concentrations, unit_label)?;
                root.present().map_err(plot_err)?;
            }
            PlotFormat::Svg => {
                fs::write(&kcal_path, &kcal_svg)?;
                fs::write(&ic50_path, &ic50_svg)?;
            }
        }
        info!("Page images saved: {} and {}", kcal_path.display(), ic50_path.display());
        written.push(kcal_path);
        written.push(ic50_path);
    }

    Ok(written)
}

/// Renders one page into an in-memory SVG document.
fn svg_page<F>(draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (PAGE_WIDTH, PAGE_HEIGHT)).into_drawing_area();
        draw(&root)?;
        root.present().map_err(plot_err)?;
    }
    Ok(svg)
}

/// Writes each SVG document as one page of a single PDF file.
fn write_pdf(pages: &[&str], path: &Path) -> Result<()> {
    let mut svg_options = usvg::Options::default();
    svg_options.fontdb_mut().load_system_fonts();

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let mut pdf = Pdf::new();
    let mut page_ids = Vec::with_capacity(pages.len());

    for svg in pages {
        let tree = usvg::Tree::from_str(svg, &svg_options).map_err(plot_err)?;
        let (chunk, svg_id) =
            svg2pdf::to_chunk(&tree, svg2pdf::ConversionOptions::default()).map_err(plot_err)?;

        // Move the page's objects past the ids already in use
        let mut renumbered = HashMap::new();
        let chunk = chunk.renumber(|old| *renumbered.entry(old).or_insert_with(|| alloc.bump()));
        let svg_id = renumbered
            .get(&svg_id)
            .copied()
            .ok_or_else(|| MetkError::Plot("page image missing from PDF chunk".to_string()))?;

        let page_id = alloc.bump();
        let content_id = alloc.bump();
        let (width, height) = (tree.size().width(), tree.size().height());

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, width, height));
        page.parent(page_tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(PAGE_XOBJECT, svg_id);
        page.finish();

        // The converted SVG is a 1x1 form; scale it to the page
        let mut content = Content::new();
        content.save_state();
        content.transform([width, 0.0, 0.0, height, 0.0, 0.0]);
        content.x_object(PAGE_XOBJECT);
        content.restore_state();
        pdf.stream(content_id, &content.finish());
        pdf.extend(&chunk);

        page_ids.push(page_id);
    }

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    fs::write(path, pdf.finish())?;
    Ok(())
}

/// Axis range padded by one unit and truncated toward zero.
pub(crate) fn kcal_axis_range(values: &[f64]) -> (f64, f64) {
    let (min_v, max_v, _) = basic_stats(values);
    ((min_v - 1.0).trunc(), (max_v + 1.0).trunc())
}

/// Axis range padded by one decade on each side.
pub(crate) fn log_axis_range(values: &[f64]) -> (f64, f64) {
    let (min_v, max_v, _) = basic_stats(values);
    (min_v / 10.0, max_v * 10.0)
}

/// Segment of `y = x + offset` inside the box `x_range` × `y_range`.
pub(crate) fn band_segment(
    x_range: (f64, f64),
    y_range: (f64, f64),
    offset: f64,
) -> Option<[(f64, f64); 2]> {
    let start = x_range.0.max(y_range.0 - offset);
    let end = x_range.1.min(y_range.1 - offset);
    if start >= end {
        return None;
    }
    Some([(start, start + offset), (end, end + offset)])
}

/// Segment of `y = fold * x` inside a log-log box.
pub(crate) fn fold_band_segment(
    x_range: (f64, f64),
    y_range: (f64, f64),
    fold: f64,
) -> Option<[(f64, f64); 2]> {
    let log = |(a, b): (f64, f64)| (a.log10(), b.log10());
    band_segment(log(x_range), log(y_range), fold.log10()).map(|seg| {
        seg.map(|(x, y)| (10f64.powf(x), 10f64.powf(y)))
    })
}

fn draw_kcal_page<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    samples: &PairedSamples,
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((2, 1));

    let exp = samples.experimental();
    let pred = samples.predicted();
    let x_range = kcal_axis_range(exp);
    let y_range = kcal_axis_range(pred);
    let errors = kcal_errors(pred, exp)?;
    let bins = bin_errors(&errors, KCAL_ERROR_BINS);

    let mut chart = ChartBuilder::on(&panels[0])
        .margin(PLOT_MARGIN)
        .caption(format!("N = {}", samples.len()), ("sans-serif", FONT_SIZE_TITLE))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Experimental ΔG (kcal/mol)")
        .y_desc("Predicted ΔG (kcal/mol)")
        .axis_desc_style(("sans-serif", FONT_SIZE_AXIS))
        .draw()
        .map_err(plot_err)?;

    // y = x, ±1 kcal dashed, ±2 kcal solid
    if let Some(seg) = band_segment(x_range, y_range, 0.0) {
        chart
            .draw_series(LineSeries::new(seg, BLACK.stroke_width(2)))
            .map_err(plot_err)?;
    }
    for offset in [-1.0, 1.0] {
        if let Some(seg) = band_segment(x_range, y_range, offset) {
            chart
                .draw_series(DashedLineSeries::new(seg, 6, 4, BLUE.stroke_width(1)))
                .map_err(plot_err)?;
        }
    }
    for offset in [-2.0, 2.0] {
        if let Some(seg) = band_segment(x_range, y_range, offset) {
            chart
                .draw_series(LineSeries::new(seg, BLACK.stroke_width(1)))
                .map_err(plot_err)?;
        }
    }

    draw_points(&mut chart, exp, pred, &bins)?;
    draw_error_histogram(
        &panels[1],
        normalized_histogram(&errors, KCAL_ERROR_BINS),
        ["<1", "1-2", ">2"],
        "ΔG Error (kcal/mol)",
    )
}

fn draw_ic50_page<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    concentrations: &PairedSamples,
    unit_label: &str,
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((2, 1));

    let exp = concentrations.experimental();
    let pred = concentrations.predicted();
    let x_range = log_axis_range(exp);
    let y_range = log_axis_range(pred);
    let errors = fold_errors(pred, exp)?;
    let bins = bin_errors(&errors, FOLD_ERROR_BINS);

    let mut chart = ChartBuilder::on(&panels[0])
        .margin(PLOT_MARGIN)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (x_range.0..x_range.1).log_scale(),
            (y_range.0..y_range.1).log_scale(),
        )
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(format!("Experimental IC50 ({unit_label})"))
        .y_desc(format!("Predicted IC50 ({unit_label})"))
        .axis_desc_style(("sans-serif", FONT_SIZE_AXIS))
        .draw()
        .map_err(plot_err)?;

    if let Some(seg) = fold_band_segment(x_range, y_range, 1.0) {
        chart
            .draw_series(LineSeries::new(seg, BLACK.stroke_width(2)))
            .map_err(plot_err)?;
    }
    for fold in [5.0, 1.0 / 5.0] {
        if let Some(seg) = fold_band_segment(x_range, y_range, fold) {
            chart
                .draw_series(DashedLineSeries::new(seg, 6, 4, BLUE.stroke_width(1)))
                .map_err(plot_err)?;
        }
    }
    for fold in [10.0, 1.0 / 10.0] {
        if let Some(seg) = fold_band_segment(x_range, y_range, fold) {
            chart
                .draw_series(LineSeries::new(seg, BLACK.stroke_width(1)))
                .map_err(plot_err)?;
        }
    }

    draw_points(&mut chart, exp, pred, &bins)?;
    draw_error_histogram(
        &panels[1],
        normalized_histogram(&errors, FOLD_ERROR_BINS),
        ["<5", "5-10", ">10"],
        "Fold Error",
    )
}

fn draw_points<DB, CT>(
    chart: &mut ChartContext<'_, DB, CT>,
    xs: &[f64],
    ys: &[f64],
    bins: &[ErrorBin],
) -> Result<()>
where
    DB: DrawingBackend,
    CT: CoordTranslate<From = (f64, f64)>,
{
    chart
        .draw_series(xs.iter().zip(ys).zip(bins).map(|((&x, &y), &bin)| {
            Circle::new((x, y), POINT_SIZE, bin_colour(bin).mix(0.5).filled())
        }))
        .map_err(plot_err)?;
    chart
        .draw_series(
            xs.iter()
                .zip(ys)
                .map(|(&x, &y)| Circle::new((x, y), POINT_SIZE, BLACK.stroke_width(1))),
        )
        .map_err(plot_err)?;
    Ok(())
}

/// Three-bar normalized histogram with fixed labels.
fn draw_error_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    fractions: [f64; 3],
    labels: [&str; 3],
    x_label: &str,
) -> Result<()> {
    let y_max = fractions.iter().cloned().fold(0.0, f64::max).max(0.1) * 1.1;

    let mut chart = ChartBuilder::on(area)
        .margin(PLOT_MARGIN)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.5f64..3.5f64, 0f64..y_max)
        .map_err(plot_err)?;

    let label_for = |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || !(1.0..=3.0).contains(&idx) {
            return String::new();
        }
        labels[idx as usize - 1].to_string()
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(3)
        .x_label_formatter(&label_for)
        .x_desc(x_label)
        .y_desc("Normalized Count")
        .axis_desc_style(("sans-serif", FONT_SIZE_AXIS))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(fractions.iter().enumerate().map(|(i, &h)| {
            let centre = i as f64 + 1.0;
            Rectangle::new([(centre - 0.4, 0.0), (centre + 0.4, h)], BLUE.mix(0.5).filled())
        }))
        .map_err(plot_err)?;
    chart
        .draw_series(fractions.iter().enumerate().map(|(i, &h)| {
            let centre = i as f64 + 1.0;
            Rectangle::new([(centre - 0.4, 0.0), (centre + 0.4, h)], BLACK.stroke_width(1))
        }))
        .map_err(plot_err)?;
    Ok(())
}
