//! Text tables and JSON reports for analysis, calibration and comparison
//! results.

use crate::calibration::{CalibrationSet, ReferenceSample, TemperatureReport};
use crate::comparison::ParameterComparison;
use crate::config::AnalysisConfig;
use crate::domain::{Band, RamanError};
use crate::peaks::{CalibrationParameter, DerivedParameters, PeakAnalysis};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const MISSING: &str = "N/A";

pub fn format_fixed_f64(value: f64, width: usize, precision: usize) -> String {
    format!(
        "{value:>width$.precision$}",
        width = width,
        precision = precision
    )
}

/// Like [`format_fixed_f64`], with `N/A` for missing values.
pub fn format_optional_f64(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        Some(value) => format_fixed_f64(value, width, precision),
        None => format!("{MISSING:>width$}"),
    }
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> Result<(), ReportError> {
    fs::write(path, normalize_text_artifact(content)).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed JSON with a trailing newline.
pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<(), ReportError> {
    let rendered = serde_json::to_string_pretty(report).map_err(ReportError::Serialize)?;
    write_text_artifact(path, &rendered)
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(serde_json::Error),
}

impl From<ReportError> for RamanError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::Write { .. } => RamanError::io_system("IO.REPORT_WRITE", error.to_string()),
            ReportError::Serialize(_) => {
                RamanError::internal("RUN.REPORT_SERIALIZE", error.to_string())
            }
        }
    }
}

/// Analysis outcome for one spectrum, as written to JSON reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleReport {
    pub name: String,
    pub analysis: PeakAnalysis,
    pub parameters: DerivedParameters,
}

impl SampleReport {
    pub fn new(name: impl Into<String>, analysis: PeakAnalysis) -> Self {
        let parameters = analysis.derived();
        Self {
            name: name.into(),
            analysis,
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownSampleReport {
    pub name: String,
    pub parameters: DerivedParameters,
    pub temperatures: Vec<TemperatureReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    pub config: AnalysisConfig,
    pub references: Vec<ReferenceSample>,
    pub calibration: CalibrationSet,
    pub unknowns: Vec<UnknownSampleReport>,
}

pub fn render_peak_table(samples: &[SampleReport]) -> String {
    let name_width = samples
        .iter()
        .map(|sample| sample.name.len())
        .max()
        .unwrap_or(0)
        .max("sample".len());

    let mut table = format!(
        "{:<name_width$} {:>10} {:>10} {:>8} {:>10} {:>10} {:>8}\n",
        "sample", "D pos", "G pos", "HD/HG", "D width", "G width", "WD/WG"
    );
    for sample in samples {
        let position = |band: Band| sample.analysis.peak(band).map(|peak| peak.wavelength);
        let _ = write!(
            table,
            "{:<name_width$} {} {} {} {} {} {}",
            sample.name,
            format_optional_f64(position(Band::D), 10, 1),
            format_optional_f64(position(Band::G), 10, 1),
            format_optional_f64(sample.parameters.hd_hg, 8, 3),
            format_optional_f64(sample.parameters.d_width, 10, 1),
            format_optional_f64(sample.parameters.g_width, 10, 1),
            format_optional_f64(sample.parameters.wd_wg, 8, 3),
        );
        if sample.analysis.deferred {
            table.push_str("  (deferred)");
        }
        table.push('\n');
    }
    table
}

pub fn render_calibration_table(set: &CalibrationSet) -> String {
    let mut table = String::new();
    for parameter in CalibrationParameter::ALL {
        let _ = writeln!(table, "{parameter}");
        let points = set.points(parameter);
        if points.is_empty() {
            table.push_str("  no calibration data\n");
            continue;
        }
        for point in points {
            let _ = writeln!(
                table,
                "  {} C  {} ± {}  (n={})",
                format_fixed_f64(point.temperature, 6, 0),
                format_fixed_f64(point.mean_value, 10, 3),
                format_fixed_f64(point.std_dev, 8, 3),
                point.sample_count
            );
        }
    }
    table
}

pub fn render_temperature_reports(name: &str, reports: &[TemperatureReport]) -> String {
    let mut rendered = format!("{name}\n");
    for report in reports {
        let estimates = if report.estimates.is_empty() {
            MISSING.to_string()
        } else {
            report
                .estimates
                .iter()
                .map(|estimate| format!("{:.0} C ({})", estimate.temperature, estimate.uncertainty))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let ranges = if report.sd_ranges.is_empty() {
            MISSING.to_string()
        } else {
            report
                .sd_ranges
                .iter()
                .map(|range| format!("{:.0}-{:.0} C", range.start, range.end))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            rendered,
            "  {:<8} value {}  estimate {estimates}  within SD {ranges}",
            report.parameter.label(),
            format_fixed_f64(report.value, 9, 3),
        );
    }
    rendered
}

pub fn render_comparison_table(rows: &[ParameterComparison]) -> String {
    let mut table = format!(
        "{:<8} {:>3} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8} {:>10} {}\n",
        "param", "n", "mean A", "mean B", "mean diff", "SD diff", "SE diff", "t", "p", "significant"
    );
    for row in rows {
        let p_value = row
            .p_value
            .map(|p| format!("{p:>10.2e}"))
            .unwrap_or_else(|| format!("{MISSING:>10}"));
        let _ = writeln!(
            table,
            "{:<8} {:>3} {} {} {} {} {} {} {} {}",
            row.parameter.label(),
            row.pairs,
            format_optional_f64(row.mean_baseline, 10, 3),
            format_optional_f64(row.mean_candidate, 10, 3),
            format_optional_f64(row.mean_difference, 10, 3),
            format_optional_f64(row.std_dev_difference, 10, 3),
            format_optional_f64(row.std_error, 10, 3),
            format_optional_f64(row.t_statistic, 8, 2),
            p_value,
            if row.significant { "yes" } else { "no" },
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::{
        SampleReport, format_fixed_f64, format_optional_f64, normalize_text_artifact,
        render_calibration_table, render_peak_table, write_json_report, write_text_artifact,
    };
    use crate::calibration::{CalibrationSet, ReferenceSample};
    use crate::domain::{AnalysisMethod, PeakRecord};
    use crate::peaks::{DerivedParameters, PeakAnalysis};
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn analysis(d: Option<PeakRecord>, g: Option<PeakRecord>) -> PeakAnalysis {
        PeakAnalysis {
            method: AnalysisMethod::Simple,
            top_peaks: [d, g],
            fitted_curves: Vec::new(),
            division_point: None,
            deferred: false,
        }
    }

    #[test]
    fn fixed_width_float_formatting_is_deterministic() {
        assert_eq!(format_fixed_f64(1.23, 13, 5), "      1.23000");
        assert_eq!(format_optional_f64(None, 5, 2), "  N/A");
    }

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        assert_eq!(
            normalize_text_artifact("alpha\r\nbeta\rgamma"),
            "alpha\nbeta\ngamma\n"
        );
    }

    #[test]
    fn repeated_text_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("table.txt");
        write_text_artifact(&path, "a\r\nb").expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");
        write_text_artifact(&path, "a\r\nb").expect("second write should succeed");
        assert_eq!(first, fs::read(&path).expect("artifact should be readable"));
        assert_eq!(first, b"a\nb\n");
    }

    #[test]
    fn peak_table_marks_missing_values() {
        let d = PeakRecord::new(1350.0, 20.0).with_width(1314.0, 1386.0, 10.0);
        let rows = vec![
            SampleReport::new("pine_600.txt", analysis(Some(d), None)),
            SampleReport::new("x.txt", analysis(None, None)),
        ];
        let table = render_peak_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("sample"));
        assert!(lines[1].contains("1350.0"));
        assert!(lines[1].contains("72.0"));
        assert!(lines[1].contains("N/A"));
        assert_eq!(lines[2].matches("N/A").count(), 6);
    }

    #[test]
    fn calibration_table_lists_each_parameter() {
        let samples = vec![ReferenceSample::new(
            "oak_700.txt",
            DerivedParameters {
                hd_hg: Some(1.25),
                ..DerivedParameters::default()
            },
        )];
        let included: BTreeSet<String> = ["oak_700.txt".to_string()].into_iter().collect();
        let table = render_calibration_table(&CalibrationSet::build(&samples, &included));
        assert!(table.contains("HD/HG"));
        assert!(table.contains("1.250"));
        assert_eq!(table.matches("no calibration data").count(), 3);
    }

    #[test]
    fn json_report_is_pretty_and_newline_terminated() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("report.json");
        let report = SampleReport::new("a.txt", analysis(None, None));
        write_json_report(&path, &report).expect("report should be written");

        let text = fs::read_to_string(&path).expect("report should be readable");
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["name"], "a.txt");
        assert_eq!(value["analysis"]["method"], "simple");
        assert!(value["parameters"]["hdHg"].is_null());
    }
}
