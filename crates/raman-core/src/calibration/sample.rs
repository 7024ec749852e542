use crate::peaks::{CalibrationParameter, DerivedParameters};
use serde::Serialize;

/// A reference spectrum's derived parameters, tagged with the temperature
/// read from its file name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSample {
    pub name: String,
    pub temperature_label: Option<String>,
    pub parameters: DerivedParameters,
}

impl ReferenceSample {
    pub fn new(name: impl Into<String>, parameters: DerivedParameters) -> Self {
        let name = name.into();
        let temperature_label = temperature_label_from_name(&name);
        Self {
            name,
            temperature_label,
            parameters,
        }
    }

    pub fn temperature(&self) -> Option<u32> {
        self.temperature_label.as_deref()?.parse().ok()
    }

    pub fn value(&self, parameter: CalibrationParameter) -> Option<f64> {
        self.parameters.value(parameter)
    }
}

/// First run of exactly three or four ASCII digits in `name`.
///
/// Longer digit runs are skipped entirely, so `sample_12345` has no label
/// while `run2_600C` yields `600`.
pub fn temperature_label_from_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if !bytes[index].is_ascii_digit() {
            index += 1;
            continue;
        }
        let start = index;
        while index < bytes.len() && bytes[index].is_ascii_digit() {
            index += 1;
        }
        if (3..=4).contains(&(index - start)) {
            return Some(name[start..index].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{ReferenceSample, temperature_label_from_name};
    use crate::peaks::DerivedParameters;

    #[test]
    fn label_is_first_three_or_four_digit_run() {
        assert_eq!(temperature_label_from_name("oak_600C.txt").as_deref(), Some("600"));
        assert_eq!(temperature_label_from_name("1000-pine.txt").as_deref(), Some("1000"));
        assert_eq!(temperature_label_from_name("s1_12345_700.txt").as_deref(), Some("700"));
        assert_eq!(temperature_label_from_name("r2_45.txt"), None);
        assert_eq!(temperature_label_from_name("unknown.txt"), None);
    }

    #[test]
    fn sample_parses_numeric_temperature() {
        let sample = ReferenceSample::new("beech_0800.txt", DerivedParameters::default());
        assert_eq!(sample.temperature_label.as_deref(), Some("0800"));
        assert_eq!(sample.temperature(), Some(800));
    }
}
