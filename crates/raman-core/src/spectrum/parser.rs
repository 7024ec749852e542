use super::{Spectrum, SpectrumError};
use std::fs;
use std::path::Path;

impl Spectrum {
    /// Parses two-column tab-separated text.
    ///
    /// Blank lines are ignored. Lines without exactly two tab-separated
    /// numeric fields are skipped and counted; a warning is logged if any were
    /// dropped. Fails only when no row survives.
    pub fn from_tsv(text: &str) -> Result<Self, SpectrumError> {
        let mut wavelengths = Vec::new();
        let mut intensities = Vec::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_row(trimmed) {
                Some((wavelength, intensity)) => {
                    wavelengths.push(wavelength);
                    intensities.push(intensity);
                }
                None => skipped += 1,
            }
        }

        if wavelengths.is_empty() {
            return Err(SpectrumError::NoRows { skipped });
        }
        if skipped > 0 {
            tracing::warn!(skipped, "skipped malformed spectrum lines");
        }
        Spectrum::new(wavelengths, intensities)
    }
}

fn parse_row(line: &str) -> Option<(f64, f64)> {
    let mut fields = line.split('\t');
    let wavelength = fields.next()?.trim().parse::<f64>().ok()?;
    let intensity = fields.next()?.trim().parse::<f64>().ok()?;
    if fields.next().is_some() || !wavelength.is_finite() || !intensity.is_finite() {
        return None;
    }
    Some((wavelength, intensity))
}

pub fn load_spectrum(path: impl AsRef<Path>) -> Result<Spectrum, SpectrumError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SpectrumError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Spectrum::from_tsv(&text)
}

#[cfg(test)]
mod tests {
    use super::load_spectrum;
    use crate::spectrum::{Spectrum, SpectrumError};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_tab_separated_rows_and_skips_noise() {
        let text = "1000\t5.5\r\n\n# header\n1001\t6\n1002 7\n1003\t7.5\textra\n1004\t8\n";
        let spectrum = Spectrum::from_tsv(text).expect("spectrum should parse");
        assert_eq!(spectrum.wavelengths(), &[1000.0, 1001.0, 1004.0]);
        assert_eq!(spectrum.intensities(), &[5.5, 6.0, 8.0]);
    }

    #[test]
    fn text_without_rows_is_rejected() {
        let error = Spectrum::from_tsv("wavelength\tintensity\n\n").expect_err("no rows");
        assert!(matches!(error, SpectrumError::NoRows { skipped: 1 }));
    }

    #[test]
    fn load_spectrum_reads_from_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("sample_600.txt");
        fs::write(&path, "1300\t1\n1350\t4\n1400\t2\n").expect("spectrum should be written");

        let spectrum = load_spectrum(&path).expect("spectrum should load");
        assert_eq!(spectrum.len(), 3);

        let missing = load_spectrum(temp.path().join("missing.txt")).expect_err("missing file");
        assert!(matches!(missing, SpectrumError::Read { .. }));
    }
}
