use analysis_core::AnalysisError;
use plotters::prelude::*;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use technical_analysis::{Column, IndicatorFrame};

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Named colour schemes for the rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    #[default]
    Default,
    Classic,
    DarkBackground,
    Ggplot,
    Grayscale,
    FiveThirtyEight,
}

impl ChartStyle {
    pub const ALL: [ChartStyle; 6] = [
        ChartStyle::Default,
        ChartStyle::Classic,
        ChartStyle::DarkBackground,
        ChartStyle::Ggplot,
        ChartStyle::Grayscale,
        ChartStyle::FiveThirtyEight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartStyle::Default => "default",
            ChartStyle::Classic => "classic",
            ChartStyle::DarkBackground => "dark_background",
            ChartStyle::Ggplot => "ggplot",
            ChartStyle::Grayscale => "grayscale",
            ChartStyle::FiveThirtyEight => "fivethirtyeight",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.name()).collect()
    }

    fn theme(&self) -> Theme {
        match self {
            ChartStyle::Default => Theme {
                background: WHITE,
                text: BLACK,
                grid: RGBColor(220, 220, 220),
                price: RGBColor(31, 119, 180),
                average: RGBColor(255, 127, 14),
                histogram: RGBColor(128, 128, 128),
                overbought: RGBColor(214, 39, 40),
                oversold: RGBColor(44, 160, 44),
            },
            ChartStyle::Classic => Theme {
                background: WHITE,
                text: BLACK,
                grid: RGBColor(200, 200, 200),
                price: RGBColor(0, 0, 255),
                average: RGBColor(0, 128, 0),
                histogram: RGBColor(128, 128, 128),
                overbought: RGBColor(255, 0, 0),
                oversold: RGBColor(0, 128, 0),
            },
            ChartStyle::DarkBackground => Theme {
                background: BLACK,
                text: WHITE,
                grid: RGBColor(60, 60, 60),
                price: RGBColor(141, 211, 199),
                average: RGBColor(254, 255, 179),
                histogram: RGBColor(190, 190, 190),
                overbought: RGBColor(250, 129, 116),
                oversold: RGBColor(129, 177, 210),
            },
            ChartStyle::Ggplot => Theme {
                background: RGBColor(229, 229, 229),
                text: RGBColor(85, 85, 85),
                grid: WHITE,
                price: RGBColor(226, 74, 51),
                average: RGBColor(52, 138, 189),
                histogram: RGBColor(119, 119, 119),
                overbought: RGBColor(226, 74, 51),
                oversold: RGBColor(52, 138, 189),
            },
            ChartStyle::Grayscale => Theme {
                background: WHITE,
                text: BLACK,
                grid: RGBColor(210, 210, 210),
                price: BLACK,
                average: RGBColor(110, 110, 110),
                histogram: RGBColor(170, 170, 170),
                overbought: RGBColor(60, 60, 60),
                oversold: RGBColor(140, 140, 140),
            },
            ChartStyle::FiveThirtyEight => Theme {
                background: RGBColor(240, 240, 240),
                text: RGBColor(60, 60, 60),
                grid: RGBColor(203, 203, 203),
                price: RGBColor(0, 143, 213),
                average: RGBColor(252, 79, 48),
                histogram: RGBColor(139, 139, 139),
                overbought: RGBColor(252, 79, 48),
                oversold: RGBColor(109, 144, 79),
            },
        }
    }
}

impl FromStr for ChartStyle {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ChartStyle::ALL
            .iter()
            .copied()
            .find(|style| style.name() == name)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("unknown chart style '{}'", name)))
    }
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy)]
struct Theme {
    background: RGBColor,
    text: RGBColor,
    grid: RGBColor,
    price: RGBColor,
    average: RGBColor,
    histogram: RGBColor,
    overbought: RGBColor,
    oversold: RGBColor,
}

/// `{ticker}_{label}_stock_price_chart.png`
pub fn default_filename(ticker: &str, period_label: &str) -> String {
    format!("{}_{}_stock_price_chart.png", ticker, period_label)
}

/// Render price/MA, MACD and RSI panels stacked vertically and save a PNG.
///
/// Panels for columns the frame does not carry are left blank. Refuses to
/// draw when there are no bars or the dates cannot drive an ordered x axis.
pub fn render_and_save(
    frame: &IndicatorFrame,
    ticker: &str,
    period_label: &str,
    style: ChartStyle,
    filename: Option<&Path>,
    size: (u32, u32),
) -> Result<PathBuf, AnalysisError> {
    let series = frame.series();
    if series.is_empty() {
        return Err(AnalysisError::InvalidInput("no data to chart".to_string()));
    }
    if !series.has_ordered_dates() {
        return Err(AnalysisError::InvalidInput(
            "date information is missing or not in a recognizable order".to_string(),
        ));
    }
    let closes = series.closes()?;

    let path = filename
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_filename(ticker, period_label)));
    let dates: Vec<String> = series
        .bars
        .iter()
        .map(|b| b.timestamp.format("%Y-%m-%d").to_string())
        .collect();

    draw(&path, frame, ticker, &closes, &dates, &style.theme(), size)
        .map_err(|e| AnalysisError::RenderError(e.to_string()))?;

    tracing::info!("chart for {} saved to {} (style {})", ticker, path.display(), style);
    Ok(path)
}

fn draw(
    path: &Path,
    frame: &IndicatorFrame,
    ticker: &str,
    closes: &[f64],
    dates: &[String],
    theme: &Theme,
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&theme.background)?;
    let panels = root.split_evenly((3, 1));

    let x_range = -0.5f64..(closes.len() as f64 - 0.5);
    let date_label = |x: &f64| -> String {
        let idx = x.round();
        if idx < 0.0 {
            return String::new();
        }
        dates.get(idx as usize).cloned().unwrap_or_default()
    };

    // Price + moving average
    let average = defined_points(frame.column(Column::MovingAverage));
    let (lo, hi) = value_bounds(closes.iter().copied().chain(average.iter().map(|p| p.1)));
    let mut chart = ChartBuilder::on(&panels[0])
        .caption(format!("{} price over time", ticker), caption_style(theme))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), lo..hi)?;
    configure_mesh(&mut chart, theme, &date_label, "Price")?;

    let price_color = theme.price;
    chart
        .draw_series(LineSeries::new(
            closes.iter().enumerate().map(|(i, &c)| (i as f64, c)),
            &theme.price,
        ))?
        .label("Close Price")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], price_color));

    let average_color = theme.average;
    chart
        .draw_series(LineSeries::new(average, &theme.average))?
        .label("Moving Average")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], average_color));
    draw_legend(&mut chart, theme)?;

    // MACD triad
    if let (Some(macd), Some(signal), Some(hist)) = (
        frame.column(Column::Macd),
        frame.column(Column::SignalLine),
        frame.column(Column::MacdHistogram),
    ) {
        let macd = defined_points(Some(macd));
        let signal = defined_points(Some(signal));
        let hist = defined_points(Some(hist));
        let (lo, hi) = value_bounds(
            macd.iter()
                .chain(&signal)
                .chain(&hist)
                .map(|p| p.1)
                .chain(std::iter::once(0.0)),
        );

        let mut chart = ChartBuilder::on(&panels[1])
            .caption(format!("{} MACD and Signal Line", ticker), caption_style(theme))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), lo..hi)?;
        configure_mesh(&mut chart, theme, &date_label, "Value")?;

        let hist_color = theme.histogram;
        chart
            .draw_series(hist.iter().map(|&(x, h)| {
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, h)], hist_color.filled())
            }))?
            .label("MACD Histogram")
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 20, y + 4)], hist_color.filled()));
        chart
            .draw_series(LineSeries::new(macd, &theme.price))?
            .label("MACD")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], price_color));
        chart
            .draw_series(LineSeries::new(signal, &theme.average))?
            .label("Signal Line")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], average_color));
        draw_legend(&mut chart, theme)?;
    }

    // RSI with overbought/oversold guides
    if let Some(rsi) = frame.column(Column::Rsi) {
        let rsi = defined_points(Some(rsi));

        let mut chart = ChartBuilder::on(&panels[2])
            .caption(format!("{} RSI", ticker), caption_style(theme))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), 0.0..100.0)?;
        configure_mesh(&mut chart, theme, &date_label, "Value")?;

        chart
            .draw_series(LineSeries::new(rsi, &theme.price))?
            .label("RSI")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], price_color));
        let dash = (closes.len() as f64 / 60.0).max(0.2);
        for (level, color) in [(RSI_OVERBOUGHT, theme.overbought), (RSI_OVERSOLD, theme.oversold)] {
            chart.draw_series(dashed_line(level, &x_range, dash, color.mix(0.7)))?;
        }
        draw_legend(&mut chart, theme)?;
    }

    root.present()?;
    Ok(())
}

type Chart<'a, 'b> = ChartContext<
    'a,
    BitMapBackend<'b>,
    Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>,
>;

fn configure_mesh(
    chart: &mut Chart<'_, '_>,
    theme: &Theme,
    date_label: &dyn Fn(&f64) -> String,
    y_desc: &str,
) -> Result<(), Box<dyn Error>> {
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(date_label)
        .x_desc("Date")
        .y_desc(y_desc)
        .axis_style(theme.text)
        .bold_line_style(theme.grid)
        .light_line_style(theme.grid.mix(0.3))
        .label_style(("sans-serif", 12).into_font().color(&theme.text))
        .draw()?;
    Ok(())
}

fn draw_legend<'a>(chart: &mut Chart<'a, 'a>, theme: &Theme) -> Result<(), Box<dyn Error>> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(theme.background.mix(0.8))
        .border_style(theme.text)
        .label_font(("sans-serif", 12).into_font().color(&theme.text))
        .draw()?;
    Ok(())
}

fn caption_style(theme: &Theme) -> TextStyle<'static> {
    ("sans-serif", 20).into_font().color(&theme.text)
}

fn defined_points(values: Option<&[Option<f64>]>) -> Vec<(f64, f64)> {
    values
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
        .collect()
}

/// Min/max of finite values with a little headroom; flat data gets a unit band.
fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn dashed_line(
    y: f64,
    x_range: &std::ops::Range<f64>,
    dash: f64,
    color: RGBAColor,
) -> Vec<PathElement<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut x = x_range.start;
    while x < x_range.end {
        let end = (x + dash).min(x_range.end);
        segments.push(PathElement::new(vec![(x, y), (end, y)], color));
        x += dash * 2.0;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Bar, PriceSeries};
    use chrono::{Duration, TimeZone, Utc};

    fn frame_with_days(days: &[i64]) -> IndicatorFrame {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = days
            .iter()
            .map(|&d| Bar {
                timestamp: start + Duration::days(d),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + d as f64,
                volume: 100.0,
                vwap: None,
            })
            .collect();
        IndicatorFrame::new(PriceSeries::new("CHRT", bars))
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in ChartStyle::ALL {
            assert_eq!(style.name().parse::<ChartStyle>().unwrap(), style);
        }
        assert_eq!(" ggplot ".parse::<ChartStyle>().unwrap(), ChartStyle::Ggplot);
        assert!("seaborn-pastel".parse::<ChartStyle>().is_err());
        assert_eq!(ChartStyle::default(), ChartStyle::Default);
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(default_filename("AAPL", "1mo"), "AAPL_1mo_stock_price_chart.png");
    }

    #[test]
    fn test_refuses_empty_series() {
        let frame = IndicatorFrame::new(PriceSeries::empty("NONE"));
        let result = render_and_save(&frame, "NONE", "1mo", ChartStyle::Default, None, (800, 600));

        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_refuses_unordered_dates() {
        let frame = frame_with_days(&[0, 2, 1]);
        let result = render_and_save(&frame, "CHRT", "1mo", ChartStyle::Default, None, (800, 600));

        match result {
            Err(AnalysisError::InvalidInput(msg)) => assert!(msg.contains("date")),
            other => panic!("expected refusal, got {:?}", other),
        }
    }

    #[test]
    fn test_renders_all_panels_to_png() {
        let days: Vec<i64> = (0..40).collect();
        let frame = frame_with_days(&days)
            .with_all(&technical_analysis::IndicatorSettings::default())
            .unwrap();
        let dir = std::env::temp_dir().join(format!("stock-analyzer-chart-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("all_panels.png");

        let written = render_and_save(
            &frame,
            "CHRT",
            "1mo",
            ChartStyle::DarkBackground,
            Some(&path),
            (800, 900),
        )
        .unwrap();

        assert_eq!(written, path);
        assert!(std::fs::metadata(&written).unwrap().len() > 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_single_bar_without_indicators_renders() {
        let frame = frame_with_days(&[0]);
        let path = std::env::temp_dir().join(format!("stock-analyzer-one-bar-{}.png", std::process::id()));

        let written = render_and_save(&frame, "ONE", "1d", ChartStyle::Default, Some(&path), (400, 450)).unwrap();

        assert!(std::fs::metadata(&written).unwrap().len() > 0);
        std::fs::remove_file(&written).ok();
    }

    #[test]
    fn test_default_filename_used_when_none_given() {
        let frame = frame_with_days(&[0, 1, 2]).with_moving_average(2).unwrap();
        let label = format!("dflt{}", std::process::id());

        let written = render_and_save(&frame, "CHRT", &label, ChartStyle::Ggplot, None, (400, 450)).unwrap();

        assert_eq!(written, PathBuf::from(default_filename("CHRT", &label)));
        assert!(written.exists());
        std::fs::remove_file(&written).ok();
    }

    #[test]
    fn test_value_bounds() {
        assert_eq!(value_bounds([5.0, 5.0].into_iter()), (4.0, 6.0));
        assert_eq!(value_bounds(std::iter::empty()), (0.0, 1.0));

        let (lo, hi) = value_bounds([10.0, f64::NAN, 20.0].into_iter());
        assert!((lo - 9.5).abs() < 1e-9);
        assert!((hi - 20.5).abs() < 1e-9);
    }

    #[test]
    fn test_defined_points_skip_warm_up() {
        let frame = frame_with_days(&[0, 1, 2, 3]).with_moving_average(3).unwrap();
        let points = defined_points(frame.column(Column::MovingAverage));

        assert_eq!(points, vec![(2.0, 11.0), (3.0, 12.0)]);
        assert!(defined_points(None).is_empty());
    }

    #[test]
    fn test_dashed_line_covers_range() {
        let segments = dashed_line(70.0, &(-0.5..9.5), 0.5, RED.mix(0.7));
        assert_eq!(segments.len(), 10);
    }
}
