use analysis_core::AnalysisError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use technical_analysis::IndicatorFrame;

const BASE_HEADERS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// `{ticker}_{label}_stock_data.csv`
pub fn default_filename(ticker: &str, label: &str) -> String {
    format!("{}_{}_stock_data.csv", ticker, label)
}

/// Write one row per bar with every derived column currently attached.
///
/// Undefined indicator values are written as empty cells.
pub fn write_csv<W: Write>(frame: &IndicatorFrame, writer: W) -> Result<(), AnalysisError> {
    if frame.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "series is empty, nothing to export".to_string(),
        ));
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    let columns: Vec<_> = frame.columns().collect();

    let mut header: Vec<&str> = BASE_HEADERS.to_vec();
    header.extend(columns.iter().map(|(c, _)| c.name()));
    csv_writer.write_record(&header).map_err(export_err)?;

    for (i, bar) in frame.series().bars.iter().enumerate() {
        let mut record = vec![
            bar.timestamp.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            format_value(Some(bar.close)),
            bar.volume.to_string(),
        ];
        record.extend(columns.iter().map(|(_, values)| format_value(values[i])));
        csv_writer.write_record(&record).map_err(export_err)?;
    }

    csv_writer.flush().map_err(|e| AnalysisError::ExportError(e.to_string()))?;
    Ok(())
}

/// Export to `path`, returning the written path.
pub fn export_csv(frame: &IndicatorFrame, path: &Path) -> Result<PathBuf, AnalysisError> {
    if frame.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "series is empty, nothing to export".to_string(),
        ));
    }

    let file = File::create(path)
        .map_err(|e| AnalysisError::ExportError(format!("{}: {}", path.display(), e)))?;
    write_csv(frame, file)?;

    tracing::debug!("wrote {} rows to {}", frame.len(), path.display());
    Ok(path.to_path_buf())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

fn export_err(e: csv::Error) -> AnalysisError {
    AnalysisError::ExportError(e.to_string())
}
