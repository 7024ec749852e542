use super::CliError;
use anyhow::Context;
use globset::Glob;
use raman_core::calibration::ReferenceSample;
use raman_core::config::{AnalysisConfig, DIntervalPreset, load_analysis_config};
use raman_core::domain::{AnalysisMethod, Interval, RamanError};
use raman_core::peaks::analyze_spectrum;
use raman_core::report::SampleReport;
use raman_core::spectrum::{BaselineAnchors, load_spectrum, subtract_linear_baseline};
use std::fs;
use std::path::{Path, PathBuf};

/// Analysis settings shared by every command that runs peak extraction.
#[derive(clap::Args, Default)]
pub(super) struct AnalysisFlags {
    /// JSON analysis config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Peak extraction method: simple, voigt or voigt5d
    #[arg(long)]
    method: Option<AnalysisMethod>,

    /// Use the narrow conventional D interval [1349, 1352]
    #[arg(long)]
    conventional_d: bool,

    /// D search interval start (cm-1)
    #[arg(long)]
    d_start: Option<f64>,

    /// D search interval end (cm-1)
    #[arg(long)]
    d_end: Option<f64>,

    /// G search interval start (cm-1)
    #[arg(long)]
    g_start: Option<f64>,

    /// G search interval end (cm-1)
    #[arg(long)]
    g_end: Option<f64>,

    /// D width measurement height, percent of peak height
    #[arg(long)]
    d_height: Option<f64>,

    /// G width measurement height, percent of peak height
    #[arg(long)]
    g_height: Option<f64>,

    /// Run the 5-band D-complex fit when the method is voigt5d
    #[arg(long)]
    run_expensive_fit: bool,

    /// Subtract a linear baseline (850-2150 cm-1 anchors unless configured)
    #[arg(long)]
    subtract_baseline: bool,
}

impl AnalysisFlags {
    pub(super) fn resolve(&self) -> Result<AnalysisConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_analysis_config(path).map_err(CliError::compute)?,
            None => AnalysisConfig::default(),
        };

        if let Some(method) = self.method {
            config = config.for_method(method);
        }
        if self.conventional_d {
            config = config.with_d_preset(DIntervalPreset::Conventional);
        }
        config.d_interval = override_interval(config.d_interval, self.d_start, self.d_end);
        config.g_interval = override_interval(config.g_interval, self.g_start, self.g_end);
        if let Some(percent) = self.d_height {
            config.d_width_height_percent = percent;
        }
        if let Some(percent) = self.g_height {
            config.g_width_height_percent = percent;
        }
        config.run_expensive_fit |= self.run_expensive_fit;
        if self.subtract_baseline && config.baseline.is_none() {
            config.baseline = Some(BaselineAnchors::default());
        }

        config.validate().map_err(CliError::compute)?;
        tracing::debug!(method = config.method.as_str(), "resolved analysis config");
        Ok(config)
    }
}

fn override_interval(interval: Interval, start: Option<f64>, end: Option<f64>) -> Interval {
    Interval::new(start.unwrap_or(interval.start), end.unwrap_or(interval.end))
}

pub(super) fn sample_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Loads, optionally baseline-corrects, and analyzes one spectrum file.
pub(super) fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<SampleReport, RamanError> {
    let mut spectrum = load_spectrum(path)?;
    if let Some(anchors) = config.baseline {
        spectrum = subtract_linear_baseline(&spectrum, anchors)?.corrected;
    }
    let analysis = analyze_spectrum(&spectrum, config)?;
    Ok(SampleReport::new(sample_name(path), analysis))
}

/// Regular files directly inside `dir` whose names match `pattern`, sorted.
pub(super) fn select_spectrum_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            CliError::Usage(format!("invalid file pattern '{pattern}': {source}"))
        })?
        .compile_matcher();

    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read reference directory '{}'", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to list reference directory '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_file() && matcher.is_match(entry.file_name()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Analyzes every reference file. Files that fail to load or analyze are
/// logged and left out so one bad spectrum does not stop the batch.
pub(super) fn analyze_references(
    files: &[PathBuf],
    config: &AnalysisConfig,
) -> Vec<ReferenceSample> {
    files
        .iter()
        .filter_map(|path| match analyze_file(path, config) {
            Ok(report) => {
                let sample = ReferenceSample::new(report.name, report.parameters);
                if sample.temperature_label.is_none() {
                    tracing::warn!(
                        sample = sample.name.as_str(),
                        "no temperature in reference file name"
                    );
                }
                Some(sample)
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping reference spectrum");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{AnalysisFlags, select_spectrum_files};
    use raman_core::domain::{AnalysisMethod, Interval};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn flags_override_method_and_intervals() {
        let flags = AnalysisFlags {
            method: Some(AnalysisMethod::Voigt),
            d_start: Some(1310.0),
            g_height: Some(40.0),
            ..AnalysisFlags::default()
        };
        let config = flags.resolve().expect("config should resolve");
        assert_eq!(config.method, AnalysisMethod::Voigt);
        assert_eq!(config.d_interval, Interval::new(1310.0, 1400.0));
        assert_eq!(config.width_fractions(), [0.5, 0.4]);
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let flags = AnalysisFlags {
            g_start: Some(1700.0),
            ..AnalysisFlags::default()
        };
        assert!(flags.resolve().is_err());
    }

    #[test]
    fn glob_selects_matching_files_in_name_order() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in ["b_700.txt", "a_500.txt", "notes.md"] {
            fs::write(temp.path().join(name), "1\t2\n").expect("file should be written");
        }
        fs::create_dir(temp.path().join("sub.txt")).expect("dir should be created");

        let files = select_spectrum_files(temp.path(), "*.txt").expect("selection");
        let names: Vec<_> = files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_500.txt", "b_700.txt"]);
    }
}
