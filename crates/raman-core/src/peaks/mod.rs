//! D/G peak extraction.
//!
//! One [`PeakExtractor`] per [`AnalysisMethod`], selected once per call by
//! [`extractor_for`]. Degenerate data (an interval without samples, an empty
//! fitting window) yields `None` peaks rather than an error, so a batch keeps
//! going past a bad spectrum.

pub mod derived;
pub mod fit;
pub mod locator;
pub mod multi;
pub mod voigt;
pub mod width;

pub use derived::{CalibrationParameter, DerivedParameters, guarded_ratio};
pub use fit::{VoigtFit, fit_pseudo_voigt};
pub use locator::{division_point, fitting_windows, locate_approximate_peaks};
pub use multi::{MultiPeakFit, MultiPeakOptions, fit_d_complex_and_g};
pub use voigt::{
    VoigtParams, WidthCrossing, approximate_voigt_fwhm, find_width_at_height_voigt, pseudo_voigt,
};
pub use width::{WidthAtHeight, width_at_height};

use crate::config::AnalysisConfig;
use crate::domain::{
    AnalysisMethod, AnalysisResult, Band, CurveKind, FittedCurve, Interval, PeakRecord,
};
use crate::numerics::{SavitzkyGolay, default_smoother};
use crate::spectrum::Spectrum;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakAnalysis {
    pub method: AnalysisMethod,
    /// D then G.
    pub top_peaks: [Option<PeakRecord>; 2],
    pub fitted_curves: Vec<FittedCurve>,
    /// Valley between the bands; only computed by fitting methods.
    pub division_point: Option<f64>,
    /// The expensive fit was requested by method but not triggered.
    pub deferred: bool,
}

impl PeakAnalysis {
    fn empty(method: AnalysisMethod) -> Self {
        Self {
            method,
            top_peaks: [None, None],
            fitted_curves: Vec::new(),
            division_point: None,
            deferred: false,
        }
    }

    pub fn peak(&self, band: Band) -> Option<&PeakRecord> {
        self.top_peaks[band.index()].as_ref()
    }

    pub fn derived(&self) -> DerivedParameters {
        DerivedParameters::from_analysis(self)
    }
}

pub trait PeakExtractor {
    fn method(&self) -> AnalysisMethod;

    fn extract(&self, spectrum: &Spectrum, config: &AnalysisConfig)
    -> AnalysisResult<PeakAnalysis>;
}

/// Maximum raw intensity per interval, width walked on raw samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleExtractor;

/// One pseudo-Voigt per band, fitted on smoothed data inside the broad
/// windows either side of the division point.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoigtExtractor;

/// Five D sub-bands plus G, fitted jointly. Only runs when the config's
/// `run_expensive_fit` gate is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DComplexExtractor {
    pub options: MultiPeakOptions,
}

pub fn extractor_for(method: AnalysisMethod) -> Box<dyn PeakExtractor> {
    match method {
        AnalysisMethod::Simple => Box::new(SimpleExtractor),
        AnalysisMethod::Voigt => Box::new(VoigtExtractor),
        AnalysisMethod::Voigt5d => Box::new(DComplexExtractor::default()),
    }
}

pub fn analyze_spectrum(
    spectrum: &Spectrum,
    config: &AnalysisConfig,
) -> AnalysisResult<PeakAnalysis> {
    config.validate()?;
    extractor_for(config.method).extract(spectrum, config)
}

impl PeakExtractor for SimpleExtractor {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Simple
    }

    fn extract(
        &self,
        spectrum: &Spectrum,
        config: &AnalysisConfig,
    ) -> AnalysisResult<PeakAnalysis> {
        let fractions = config.width_fractions();
        let mut analysis = PeakAnalysis::empty(self.method());

        for (band, interval) in Band::BOTH.into_iter().zip(config.intervals()) {
            let Some((wavelength, intensity)) =
                locator::locate_peak(spectrum, interval, spectrum.intensities())
            else {
                warn_empty_interval(band, interval);
                continue;
            };
            let mut record = PeakRecord::new(wavelength, intensity);
            if let Some(width) =
                width_at_height(spectrum, wavelength, intensity, fractions[band.index()])
            {
                record = record.with_width(width.left_x, width.right_x, width.target_height);
            }
            analysis.top_peaks[band.index()] = Some(record);
        }

        Ok(analysis)
    }
}

/// Smoothed intensities, approximate centres and division point shared by
/// both fitting methods.
struct FittingContext {
    smoother: SavitzkyGolay,
    smoothed: Vec<f64>,
    centers: [Option<f64>; 2],
    division_point: f64,
}

impl FittingContext {
    fn prepare(spectrum: &Spectrum, config: &AnalysisConfig) -> AnalysisResult<Self> {
        let smoother = default_smoother()?;
        let smoothed = smoother.smooth(spectrum.intensities());
        let centers = locate_approximate_peaks(spectrum, config.intervals(), &smoothed);
        for (band, interval) in Band::BOTH.into_iter().zip(config.intervals()) {
            if centers[band.index()].is_none() {
                warn_empty_interval(band, interval);
            }
        }
        let division_point = division_point(spectrum, &smoothed, centers);
        tracing::debug!(
            d_center = ?centers[0],
            g_center = ?centers[1],
            division_point,
            "located approximate peaks"
        );
        Ok(Self {
            smoother,
            smoothed,
            centers,
            division_point,
        })
    }

    fn window(&self, spectrum: &Spectrum, band: Band) -> (Vec<f64>, Vec<f64>) {
        spectrum.window(
            locator::fitting_window(band, self.division_point),
            &self.smoothed,
        )
    }
}

impl PeakExtractor for VoigtExtractor {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Voigt
    }

    fn extract(
        &self,
        spectrum: &Spectrum,
        config: &AnalysisConfig,
    ) -> AnalysisResult<PeakAnalysis> {
        let context = FittingContext::prepare(spectrum, config)?;
        let fractions = config.width_fractions();
        let mut analysis = PeakAnalysis::empty(self.method());
        analysis.division_point = Some(context.division_point);

        for band in Band::BOTH {
            if context.centers[band.index()].is_none() {
                continue;
            }
            let (x, y) = context.window(spectrum, band);
            let Some(fit) =
                fit_pseudo_voigt(&x, &y, band, fractions[band.index()], &context.smoother)
            else {
                tracing::warn!(band = band.label(), "fitting window has no samples");
                continue;
            };

            analysis.top_peaks[band.index()] = Some(
                PeakRecord::new(fit.params.center, fit.params.amplitude).with_width(
                    fit.left_x,
                    fit.right_x,
                    fit.target_height,
                ),
            );
            analysis.fitted_curves.push(FittedCurve {
                y: x.iter().map(|x| fit.params.evaluate(*x)).collect(),
                x,
                label: format!("{} fit", band.label()),
                kind: CurveKind::Fit,
            });
        }

        Ok(analysis)
    }
}

impl PeakExtractor for DComplexExtractor {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Voigt5d
    }

    fn extract(
        &self,
        spectrum: &Spectrum,
        config: &AnalysisConfig,
    ) -> AnalysisResult<PeakAnalysis> {
        let mut analysis = PeakAnalysis::empty(self.method());
        if !config.run_expensive_fit {
            tracing::debug!("D-complex fit deferred until explicitly requested");
            analysis.deferred = true;
            return Ok(analysis);
        }

        let context = FittingContext::prepare(spectrum, config)?;
        analysis.division_point = Some(context.division_point);
        if context.centers.iter().any(Option::is_none) {
            return Ok(analysis);
        }

        let (x_d, y_d) = context.window(spectrum, Band::D);
        let (x_g, y_g) = context.window(spectrum, Band::G);
        let Some(fit) = fit_d_complex_and_g(
            (x_d.as_slice(), y_d.as_slice()),
            (x_g.as_slice(), y_g.as_slice()),
            config.width_fractions(),
            &self.options,
        ) else {
            tracing::warn!("D-complex fitting windows have no samples");
            return Ok(analysis);
        };

        analysis.top_peaks = [Some(fit.d1), Some(fit.g)];
        analysis.fitted_curves = fit.curves;
        Ok(analysis)
    }
}

fn warn_empty_interval(band: Band, interval: Interval) {
    tracing::warn!(
        band = band.label(),
        start = interval.start,
        end = interval.end,
        "no spectrum samples inside peak interval; peak skipped"
    );
}

#[cfg(test)]
mod tests {
    use super::{
        DComplexExtractor, MultiPeakOptions, PeakExtractor, analyze_spectrum, extractor_for,
    };
    use crate::config::AnalysisConfig;
    use crate::domain::{AnalysisMethod, Band, Interval};
    use crate::spectrum::Spectrum;

    fn two_band_spectrum(step: f64) -> Spectrum {
        Spectrum::sampled(1000.0, 1800.0, step, |x| {
            20.0 * (-((x - 1350.0) / 30.0).powi(2) / 2.0).exp()
                + 15.0 * (-((x - 1590.0) / 30.0).powi(2) / 2.0).exp()
        })
        .expect("spectrum")
    }

    #[test]
    fn dispatch_selects_one_extractor_per_method() {
        for method in AnalysisMethod::ALL {
            assert_eq!(extractor_for(method).method(), method);
        }
    }

    #[test]
    fn simple_method_reports_raw_maxima_and_widths() {
        let analysis =
            analyze_spectrum(&two_band_spectrum(1.0), &AnalysisConfig::default()).expect("analysis");
        let d = analysis.peak(Band::D).expect("d peak");
        let g = analysis.peak(Band::G).expect("g peak");
        assert_eq!((d.wavelength, d.height), (1350.0, 20.0));
        assert_eq!((g.wavelength, g.height), (1590.0, 15.0));
        assert_eq!(d.width, Some(72.0));
        assert!(analysis.fitted_curves.is_empty());
        assert_eq!(analysis.division_point, None);
    }

    #[test]
    fn empty_interval_yields_null_peak_and_null_ratios() {
        let config = AnalysisConfig {
            d_interval: Interval::new(100.0, 200.0),
            ..AnalysisConfig::default()
        };
        let analysis = analyze_spectrum(&two_band_spectrum(1.0), &config).expect("analysis");
        assert!(analysis.peak(Band::D).is_none());
        assert!(analysis.peak(Band::G).is_some());
        let derived = analysis.derived();
        assert_eq!(derived.hd_hg, None);
        assert_eq!(derived.wd_wg, None);
    }

    #[test]
    fn voigt_method_fits_both_bands() {
        let config = AnalysisConfig::default().for_method(AnalysisMethod::Voigt);
        let analysis = analyze_spectrum(&two_band_spectrum(1.0), &config).expect("analysis");
        let d = analysis.peak(Band::D).expect("d peak");
        let g = analysis.peak(Band::G).expect("g peak");
        assert!((d.wavelength - 1350.0).abs() <= 2.0);
        assert!((g.wavelength - 1590.0).abs() <= 2.0);
        assert_eq!(analysis.fitted_curves.len(), 2);
        let division = analysis.division_point.expect("division point");
        assert!((1400.0..=1540.0).contains(&division));
    }

    #[test]
    fn voigt5d_without_gate_is_deferred() {
        let config = AnalysisConfig::default().for_method(AnalysisMethod::Voigt5d);
        let analysis = analyze_spectrum(&two_band_spectrum(2.0), &config).expect("analysis");
        assert!(analysis.deferred);
        assert_eq!(analysis.top_peaks, [None, None]);
        assert!(analysis.fitted_curves.is_empty());
    }

    #[test]
    fn voigt5d_with_gate_returns_d1_and_g() {
        let config = AnalysisConfig {
            run_expensive_fit: true,
            ..AnalysisConfig::default().for_method(AnalysisMethod::Voigt5d)
        };
        let extractor = DComplexExtractor {
            options: MultiPeakOptions {
                max_iterations: 20,
                ..MultiPeakOptions::default()
            },
        };
        let analysis = extractor
            .extract(&two_band_spectrum(2.0), &config)
            .expect("analysis");
        assert!(!analysis.deferred);
        let d1 = analysis.peak(Band::D).expect("d1");
        let g = analysis.peak(Band::G).expect("g");
        assert!((1320.0..=1390.0).contains(&d1.wavelength));
        assert!((1570.0..=1630.0).contains(&g.wavelength));
        assert_eq!(analysis.fitted_curves.len(), 7);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = AnalysisConfig {
            g_interval: Interval::new(1650.0, 1550.0),
            ..AnalysisConfig::default()
        };
        let error = analyze_spectrum(&two_band_spectrum(1.0), &config).expect_err("inverted");
        assert_eq!(error.placeholder(), "INPUT.CONFIG_INVALID");
    }
}
