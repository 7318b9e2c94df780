use std::fmt;

use log::info;
use serde::Serialize;

use crate::error::{AnalysisError, ClassificationError};

// ---------------------------------------------------------------------------
// Attribute vocabularies
// ---------------------------------------------------------------------------

/// Detector site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Detector {
    #[serde(rename = "FD")]
    Fd,
    #[serde(rename = "ND")]
    Nd,
}

/// Horn polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Horn {
    #[serde(rename = "FHC")]
    Fhc,
    #[serde(rename = "RHC")]
    Rhc,
}

/// Flux configuration of a simulated sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Flux {
    Fluxswap,
    Nonswap,
    Combined,
}

/// Which of the three attributes failed to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Detector,
    Horn,
    Flux,
}

impl Detector {
    pub fn as_str(self) -> &'static str {
        match self {
            Detector::Fd => "FD",
            Detector::Nd => "ND",
        }
    }
}

impl Horn {
    pub fn as_str(self) -> &'static str {
        match self {
            Horn::Fhc => "FHC",
            Horn::Rhc => "RHC",
        }
    }
}

impl Flux {
    pub fn as_str(self) -> &'static str {
        match self {
            Flux::Fluxswap => "Fluxswap",
            Flux::Nonswap => "Nonswap",
            Flux::Combined => "Combined",
        }
    }

    /// Short neutrino-flavor tag used in plot and file labels.
    /// A combined sample has no single flavor.
    pub fn flavor_label(self) -> Option<&'static str> {
        match self {
            Flux::Nonswap => Some("numus"),
            Flux::Fluxswap => Some("nues"),
            Flux::Combined => None,
        }
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Horn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Flux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Detector => "detector",
            Attribute::Horn => "horn",
            Attribute::Flux => "flux",
        })
    }
}

// ---------------------------------------------------------------------------
// Identification – the resolved (detector, horn, flux) triple
// ---------------------------------------------------------------------------

/// Sample identity derived once from a path or filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Identification {
    pub detector: Detector,
    pub horn: Horn,
    pub flux: Flux,
}

/// Concrete sample to run inference on when the flux is `Combined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceSample {
    Nonswap,
    Fluxswap,
}

/// Determine detector, horn and flux from an identifying string.
///
/// Matching is an ordered, case-sensitive substring search and the first
/// match wins: `"FD"` before `"ND"`, `"FHC"` before `"RHC"`, then
/// `"Fluxswap"`, `"Nonswap"`, `"Combined"`.
pub fn resolve(input: &str) -> Result<Identification, ClassificationError> {
    info!("Determining detector, horn and flux from {input:?}");

    let fail = |attribute| ClassificationError {
        attribute,
        input: input.to_string(),
    };

    let detector = if input.contains("FD") {
        Detector::Fd
    } else if input.contains("ND") {
        Detector::Nd
    } else {
        return Err(fail(Attribute::Detector));
    };
    info!("detector: {detector}");

    let horn = if input.contains("FHC") {
        Horn::Fhc
    } else if input.contains("RHC") {
        Horn::Rhc
    } else {
        return Err(fail(Attribute::Horn));
    };
    info!("horn: {horn}");

    let flux = if input.contains("Fluxswap") {
        Flux::Fluxswap
    } else if input.contains("Nonswap") {
        Flux::Nonswap
    } else if input.contains("Combined") {
        Flux::Combined
    } else {
        return Err(fail(Attribute::Flux));
    };
    info!("flux: {flux}");

    Ok(Identification {
        detector,
        horn,
        flux,
    })
}

impl Identification {
    /// Narrow a `Combined` flux to the sample inference was run on.
    /// Non-combined identities are returned unchanged and `sample` is ignored.
    pub fn for_inference(
        self,
        sample: Option<InferenceSample>,
    ) -> Result<Identification, AnalysisError> {
        if self.flux != Flux::Combined {
            return Ok(self);
        }
        let flux = match sample {
            Some(InferenceSample::Nonswap) => Flux::Nonswap,
            Some(InferenceSample::Fluxswap) => Flux::Fluxswap,
            None => return Err(AnalysisError::MissingInferenceSample),
        };
        Ok(Identification { flux, ..self })
    }

    /// Replace each successive `{}` in `template` with detector, horn and
    /// flux, cycling through the three.
    pub fn fill_template(&self, template: &str) -> String {
        let values = [self.detector.as_str(), self.horn.as_str(), self.flux.as_str()];
        let mut out = String::with_capacity(template.len());
        let mut pieces = template.split("{}");
        if let Some(first) = pieces.next() {
            out.push_str(first);
        }
        for (i, piece) in pieces.enumerate() {
            out.push_str(values[i % values.len()]);
            out.push_str(piece);
        }
        out
    }

    /// `<DET>_<HORN>_<flavor>`, falling back to the flux name for combined samples.
    pub fn label(&self) -> String {
        let tail = self.flux.flavor_label().unwrap_or(self.flux.as_str());
        format!("{}_{}_{}", self.detector, self.horn, tail)
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.detector, self.horn, self.flux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(detector: Detector, horn: Horn, flux: Flux) -> Identification {
        Identification {
            detector,
            horn,
            flux,
        }
    }

    #[test]
    fn resolves_far_detector_fluxswap() {
        assert_eq!(
            resolve("FD-FHC-Fluxswap-something").unwrap(),
            id(Detector::Fd, Horn::Fhc, Flux::Fluxswap)
        );
    }

    #[test]
    fn resolves_near_detector_nonswap() {
        assert_eq!(
            resolve("ND_RHC_Nonswap_run2").unwrap(),
            id(Detector::Nd, Horn::Rhc, Flux::Nonswap)
        );
    }

    #[test]
    fn resolves_combined_from_full_path() {
        let got = resolve("/data/FD-Nominal-RHC-Combined/test/preds.csv").unwrap();
        assert_eq!(got, id(Detector::Fd, Horn::Rhc, Flux::Combined));
    }

    #[test]
    fn missing_detector_fails_on_detector() {
        let err = resolve("XX-FHC-Fluxswap").unwrap_err();
        assert_eq!(err.attribute, Attribute::Detector);
        assert_eq!(err.input, "XX-FHC-Fluxswap");
    }

    #[test]
    fn missing_horn_fails_on_horn() {
        let err = resolve("FD-XHC-Fluxswap").unwrap_err();
        assert_eq!(err.attribute, Attribute::Horn);
    }

    #[test]
    fn unknown_flux_fails_on_flux() {
        let err = resolve("FD-FHC-Unknown").unwrap_err();
        assert_eq!(err.attribute, Attribute::Flux);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let err = resolve("fd-fhc-fluxswap").unwrap_err();
        assert_eq!(err.attribute, Attribute::Detector);
    }

    #[test]
    fn first_match_wins() {
        // Both detectors and both horns appear; FD and FHC are checked first.
        let got = resolve("ND-RHC-FD-FHC-Nonswap-Fluxswap").unwrap();
        assert_eq!(got, id(Detector::Fd, Horn::Fhc, Flux::Fluxswap));
    }

    #[test]
    fn combined_needs_an_inference_sample() {
        let combined = id(Detector::Fd, Horn::Fhc, Flux::Combined);
        assert!(matches!(
            combined.for_inference(None),
            Err(AnalysisError::MissingInferenceSample)
        ));
        let narrowed = combined
            .for_inference(Some(InferenceSample::Nonswap))
            .unwrap();
        assert_eq!(narrowed.flux, Flux::Nonswap);
    }

    #[test]
    fn concrete_flux_ignores_inference_sample() {
        let swap = id(Detector::Nd, Horn::Rhc, Flux::Fluxswap);
        let got = swap.for_inference(Some(InferenceSample::Nonswap)).unwrap();
        assert_eq!(got, swap);
    }

    #[test]
    fn fill_template_cycles_attributes() {
        let ident = id(Detector::Fd, Horn::Fhc, Flux::Nonswap);
        let path = ident.fill_template("{}-Nominal-{}-{}/test/j_{}-Nominal-{}-{}_27.parquet");
        assert_eq!(
            path,
            "FD-Nominal-FHC-Nonswap/test/j_FD-Nominal-FHC-Nonswap_27.parquet"
        );
        assert_eq!(ident.fill_template("no placeholders"), "no placeholders");
    }

    #[test]
    fn label_uses_flavor() {
        assert_eq!(id(Detector::Fd, Horn::Fhc, Flux::Fluxswap).label(), "FD_FHC_nues");
        assert_eq!(id(Detector::Nd, Horn::Rhc, Flux::Nonswap).label(), "ND_RHC_numus");
        assert_eq!(
            id(Detector::Fd, Horn::Rhc, Flux::Combined).label(),
            "FD_RHC_Combined"
        );
    }
}
