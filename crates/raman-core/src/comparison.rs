//! Paired comparison of derived parameters produced by two analysis methods.

use crate::calibration::ReferenceSample;
use crate::numerics::{mean, population_std_dev};
use crate::peaks::CalibrationParameter;
use serde::Serialize;
use std::collections::HashMap;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterComparison {
    pub parameter: CalibrationParameter,
    pub pairs: usize,
    pub mean_baseline: Option<f64>,
    pub mean_candidate: Option<f64>,
    /// Mean of `candidate - baseline` over the pairs.
    pub mean_difference: Option<f64>,
    pub std_dev_difference: Option<f64>,
    pub std_error: Option<f64>,
    pub t_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub significant: bool,
}

/// Pairs samples by name and compares every [`CalibrationParameter`].
/// A sample contributes to a parameter only when both methods produced a
/// value for it.
pub fn compare_methods(
    baseline: &[ReferenceSample],
    candidate: &[ReferenceSample],
) -> Vec<ParameterComparison> {
    let candidate_by_name: HashMap<&str, &ReferenceSample> = candidate
        .iter()
        .map(|sample| (sample.name.as_str(), sample))
        .collect();

    CalibrationParameter::ALL
        .into_iter()
        .map(|parameter| {
            let mut baseline_values = Vec::new();
            let mut candidate_values = Vec::new();
            for sample in baseline {
                let Some(matched) = candidate_by_name.get(sample.name.as_str()) else {
                    continue;
                };
                if let (Some(left), Some(right)) = (sample.value(parameter), matched.value(parameter))
                {
                    baseline_values.push(left);
                    candidate_values.push(right);
                }
            }
            compare_paired(parameter, &baseline_values, &candidate_values)
        })
        .collect()
}

fn compare_paired(
    parameter: CalibrationParameter,
    baseline: &[f64],
    candidate: &[f64],
) -> ParameterComparison {
    let differences: Vec<f64> = baseline
        .iter()
        .zip(candidate)
        .map(|(left, right)| right - left)
        .collect();
    let pairs = differences.len();
    let mean_difference = mean(&differences);
    let std_dev_difference = population_std_dev(&differences);
    let std_error = std_dev_difference.map(|std_dev| std_dev / (pairs as f64).sqrt());

    let t_statistic = match (mean_difference, std_error) {
        (Some(difference), Some(error)) if pairs >= 2 && error > 0.0 => Some(difference / error),
        _ => None,
    };
    let p_value = t_statistic
        .map(|t| 2.0 * (1.0 - approximate_t_cdf(t.abs(), (pairs - 1) as f64)));

    ParameterComparison {
        parameter,
        pairs,
        mean_baseline: mean(baseline),
        mean_candidate: mean(candidate),
        mean_difference,
        std_dev_difference,
        std_error,
        t_statistic,
        p_value,
        significant: p_value.is_some_and(|p| p < SIGNIFICANCE_LEVEL),
    }
}

/// Rough closed-form stand-in for the Student's t CDF,
/// `1 - 0.5 * (df / (t² + df))^(df / 2)`.
///
/// This is an approximation only. It is reasonable for moderate `df` and
/// should not be read as an exact significance test.
pub fn approximate_t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (t * t + df);
    1.0 - 0.5 * x.powf(df / 2.0)
}

#[cfg(test)]
mod tests {
    use super::{approximate_t_cdf, compare_methods};
    use crate::calibration::ReferenceSample;
    use crate::peaks::{CalibrationParameter, DerivedParameters};

    fn sample(name: &str, hd_hg: Option<f64>, d_width: Option<f64>) -> ReferenceSample {
        ReferenceSample::new(
            name,
            DerivedParameters {
                hd_hg,
                d_width,
                ..DerivedParameters::default()
            },
        )
    }

    #[test]
    fn approximation_is_half_at_zero_and_rises() {
        assert_eq!(approximate_t_cdf(0.0, 4.0), 0.5);
        assert!(approximate_t_cdf(1.0, 4.0) > 0.5);
        assert!(approximate_t_cdf(3.0, 4.0) > approximate_t_cdf(1.0, 4.0));
        assert!(approximate_t_cdf(50.0, 4.0) < 1.0);
    }

    #[test]
    fn pairs_by_name_and_reports_statistics() {
        let simple = vec![
            sample("a.txt", Some(1.0), Some(100.0)),
            sample("b.txt", Some(2.0), Some(110.0)),
            sample("c.txt", Some(3.0), None),
            sample("only_simple.txt", Some(9.0), Some(1.0)),
        ];
        let voigt = vec![
            sample("c.txt", Some(3.4), Some(120.0)),
            sample("a.txt", Some(1.2), Some(104.0)),
            sample("b.txt", Some(2.3), Some(114.0)),
        ];

        let rows = compare_methods(&simple, &voigt);
        assert_eq!(rows.len(), CalibrationParameter::ALL.len());

        let hd_hg = &rows[0];
        assert_eq!(hd_hg.parameter, CalibrationParameter::HdHg);
        assert_eq!(hd_hg.pairs, 3);
        assert!((hd_hg.mean_baseline.expect("mean") - 2.0).abs() < 1.0e-12);
        assert!((hd_hg.mean_difference.expect("mean diff") - 0.3).abs() < 1.0e-12);
        let t = hd_hg.t_statistic.expect("t statistic");
        assert!(t > 0.0);
        let p = hd_hg.p_value.expect("p value");
        assert!((0.0..=1.0).contains(&p));

        let d_width = &rows[1];
        assert_eq!(d_width.pairs, 2);
        assert_eq!(d_width.std_dev_difference, Some(0.0));
        assert_eq!(d_width.t_statistic, None);
        assert!(!d_width.significant);

        let g_width = &rows[2];
        assert_eq!(g_width.pairs, 0);
        assert_eq!(g_width.mean_difference, None);
        assert_eq!(g_width.p_value, None);
    }

    #[test]
    fn large_consistent_shift_is_significant() {
        let simple: Vec<_> = (0..8)
            .map(|index| sample(&format!("s{index}.txt"), Some(1.0 + index as f64 * 0.01), None))
            .collect();
        let voigt: Vec<_> = (0..8)
            .map(|index| {
                let jitter = if index % 2 == 0 { 0.001 } else { -0.001 };
                sample(
                    &format!("s{index}.txt"),
                    Some(1.5 + index as f64 * 0.01 + jitter),
                    None,
                )
            })
            .collect();
        let rows = compare_methods(&simple, &voigt);
        assert!(rows[0].significant);
        assert!(rows[0].p_value.expect("p value") < 0.05);
    }
}
