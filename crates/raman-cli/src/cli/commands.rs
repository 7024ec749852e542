use super::CliError;
use super::helpers::*;
use raman_core::calibration::{CalibrationCache, estimate_temperatures};
use raman_core::comparison::compare_methods;
use raman_core::domain::{AnalysisMethod, RamanError};
use raman_core::peaks::CalibrationParameter;
use raman_core::report::{
    CalibrationReport, UnknownSampleReport, render_calibration_table,
    render_comparison_table, render_peak_table, render_temperature_reports, write_json_report,
    write_text_artifact,
};
use raman_core::spectrum::{BaselineAnchors, load_spectrum, subtract_linear_baseline};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct AnalyzeArgs {
    /// Tab-separated spectrum files (wavelength, intensity)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    analysis: AnalysisFlags,

    /// Write the full analysis as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct CalibrateArgs {
    /// Directory holding reference spectra named with their temperature
    #[arg(long)]
    reference_dir: PathBuf,

    /// Glob selecting reference files inside the directory
    #[arg(long, default_value = "*.txt")]
    pattern: String,

    /// Reference file name to leave out of the calibration (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Spectrum of unknown thermal history to estimate (repeatable)
    #[arg(long)]
    unknown: Vec<PathBuf>,

    #[command(flatten)]
    analysis: AnalysisFlags,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct CompareArgs {
    /// Tab-separated spectrum files analyzed with both methods
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    analysis: AnalysisFlags,

    /// Write the comparison rows as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct BaselineArgs {
    /// Tab-separated spectrum file
    file: PathBuf,

    /// Corrected spectrum output path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Low anchor wavelength (cm-1)
    #[arg(long, default_value_t = 850.0)]
    low: f64,

    /// High anchor wavelength (cm-1)
    #[arg(long, default_value_t = 2150.0)]
    high: f64,
}

pub(super) fn run_analyze_command(args: AnalyzeArgs) -> Result<i32, CliError> {
    let config = args.analysis.resolve()?;
    let mut samples = Vec::with_capacity(args.files.len());
    for path in &args.files {
        samples.push(analyze_file(path, &config).map_err(CliError::Compute)?);
    }

    print!("{}", render_peak_table(&samples));
    if let Some(path) = &args.json {
        write_json_report(path, &samples).map_err(CliError::compute)?;
        println!("JSON report: {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_calibrate_command(args: CalibrateArgs) -> Result<i32, CliError> {
    let config = args.analysis.resolve()?;
    let files = select_spectrum_files(&args.reference_dir, &args.pattern)?;
    let references = analyze_references(&files, &config);
    if references.is_empty() {
        return Err(CliError::Compute(RamanError::input_validation(
            "INPUT.CALIBRATION_REFERENCES",
            format!(
                "no reference spectra matching '{}' could be analyzed in '{}'",
                args.pattern,
                args.reference_dir.display()
            ),
        )));
    }

    let mut included: BTreeSet<String> =
        references.iter().map(|sample| sample.name.clone()).collect();
    for name in &args.exclude {
        if !included.remove(name) {
            tracing::warn!(sample = name.as_str(), "excluded reference not found");
        }
    }
    println!(
        "Calibration from {} of {} reference spectra ({} method)",
        included.len(),
        references.len(),
        config.method
    );

    let mut cache = CalibrationCache::new();
    let calibration = cache.get_or_build(&config, &references, &included).clone();
    if config.defers_expensive_fit() {
        tracing::warn!(
            method = config.method.as_str(),
            "every reference was deferred; pass --run-expensive-fit to build a voigt5d calibration"
        );
    } else if calibration.is_empty() {
        tracing::warn!(
            method = config.method.as_str(),
            "no reference produced a calibration point"
        );
    }
    print!("{}", render_calibration_table(&calibration));

    let mut unknowns = Vec::with_capacity(args.unknown.len());
    for path in &args.unknown {
        let sample = analyze_file(path, &config).map_err(CliError::Compute)?;
        let temperatures: Vec<_> = CalibrationParameter::ALL
            .into_iter()
            .filter_map(|parameter| {
                let value = sample.parameters.value(parameter)?;
                Some(estimate_temperatures(&calibration, parameter, value))
            })
            .collect();
        print!("{}", render_temperature_reports(&sample.name, &temperatures));
        unknowns.push(UnknownSampleReport {
            name: sample.name,
            parameters: sample.parameters,
            temperatures,
        });
    }

    if let Some(path) = &args.report {
        let report = CalibrationReport {
            config,
            references,
            calibration,
            unknowns,
        };
        write_json_report(path, &report).map_err(CliError::compute)?;
        println!("JSON report: {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_compare_command(args: CompareArgs) -> Result<i32, CliError> {
    let config = args.analysis.resolve()?;
    let mut by_method = Vec::with_capacity(2);
    for method in [AnalysisMethod::Simple, AnalysisMethod::Voigt] {
        let method_config = config.clone().for_method(method);
        by_method.push(analyze_references(&args.files, &method_config));
    }

    let rows = compare_methods(&by_method[0], &by_method[1]);
    println!("Method comparison: A = simple, B = voigt (B - A)");
    print!("{}", render_comparison_table(&rows));
    println!("p-values use a rough t-distribution approximation.");
    if let Some(path) = &args.json {
        write_json_report(path, &rows).map_err(CliError::compute)?;
        println!("JSON report: {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_baseline_command(args: BaselineArgs) -> Result<i32, CliError> {
    let spectrum = load_spectrum(&args.file).map_err(CliError::compute)?;
    let anchors = BaselineAnchors {
        low_anchor: args.low,
        high_anchor: args.high,
    };
    let correction = subtract_linear_baseline(&spectrum, anchors).map_err(CliError::compute)?;
    let rendered = correction.corrected.to_tsv();

    match &args.output {
        Some(path) => {
            write_text_artifact(path, &rendered).map_err(CliError::compute)?;
            println!(
                "Baseline slope {:.6} intercept {:.6}; wrote {} points to {}",
                correction.slope,
                correction.intercept,
                correction.corrected.len(),
                path.display()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(0)
}
