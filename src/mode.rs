use std::fmt;

use serde::Serialize;

/// Neutrino interaction category, as stored in the `mode` column.
///
/// The code `-1` marks an unknown interaction and has no variant here.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum InteractionMode {
    QE,
    Res,
    DIS,
    Coh,
    CohElastic,
    ElectronScattering,
    IMDAnnihilation,
    InverseBetaDecay,
    GlashowResonance,
    AMNuGamma,
    MEC,
    Diffractive,
    EM,
    WeakMix,
}

/// Code used for events whose interaction could not be classified.
pub const UNKNOWN_MODE_CODE: i32 = -1;

impl InteractionMode {
    /// All known modes, ordered by code.
    pub const KNOWN: [InteractionMode; 14] = [
        InteractionMode::QE,
        InteractionMode::Res,
        InteractionMode::DIS,
        InteractionMode::Coh,
        InteractionMode::CohElastic,
        InteractionMode::ElectronScattering,
        InteractionMode::IMDAnnihilation,
        InteractionMode::InverseBetaDecay,
        InteractionMode::GlashowResonance,
        InteractionMode::AMNuGamma,
        InteractionMode::MEC,
        InteractionMode::Diffractive,
        InteractionMode::EM,
        InteractionMode::WeakMix,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::KNOWN.get(i).copied())
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            InteractionMode::QE => "QE",
            InteractionMode::Res => "Res",
            InteractionMode::DIS => "DIS",
            InteractionMode::Coh => "Coh",
            InteractionMode::CohElastic => "CohElastic",
            InteractionMode::ElectronScattering => "ElectronScattering",
            InteractionMode::IMDAnnihilation => "IMDAnnihilation",
            InteractionMode::InverseBetaDecay => "InverseBetaDecay",
            InteractionMode::GlashowResonance => "GlashowResonance",
            InteractionMode::AMNuGamma => "AMNuGamma",
            InteractionMode::MEC => "MEC",
            InteractionMode::Diffractive => "Diffractive",
            InteractionMode::EM => "EM",
            InteractionMode::WeakMix => "WeakMix",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
