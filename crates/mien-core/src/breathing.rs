//! Guided-breathing schedules: pure timing model, no UI.
//!
//! A technique is a fixed inhale/hold/exhale/rest cycle in whole
//! seconds; whoever drives the screen or terminal animates it.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    Rest,
}

impl Phase {
    /// Operator-facing cue for this phase.
    pub fn instruction(&self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe out",
            Phase::Rest => "Rest",
        }
    }
}

/// One timed phase within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStep {
    pub phase: Phase,
    pub secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technique {
    /// Inhale 4, hold 7, exhale 8.
    FourSevenEight,
    /// Inhale 4, hold 4, exhale 4, rest 4.
    Box,
    /// Inhale 5, exhale 5.
    Diaphragmatic,
}

impl Technique {
    /// Per-phase durations as (inhale, hold, exhale, rest) seconds.
    fn durations(&self) -> (u64, u64, u64, u64) {
        match self {
            Technique::FourSevenEight => (4, 7, 8, 0),
            Technique::Box => (4, 4, 4, 4),
            Technique::Diaphragmatic => (5, 0, 5, 0),
        }
    }

    /// The non-zero phases of one cycle, in order.
    pub fn phases(&self) -> Vec<PhaseStep> {
        let (inhale, hold, exhale, rest) = self.durations();
        [
            (Phase::Inhale, inhale),
            (Phase::Hold, hold),
            (Phase::Exhale, exhale),
            (Phase::Rest, rest),
        ]
        .into_iter()
        .filter(|(_, secs)| *secs > 0)
        .map(|(phase, secs)| PhaseStep { phase, secs })
        .collect()
    }

    /// Total length of one cycle in seconds.
    pub fn cycle_secs(&self) -> u64 {
        let (inhale, hold, exhale, rest) = self.durations();
        inhale + hold + exhale + rest
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Technique::FourSevenEight => "4-7-8 breathing",
            Technique::Box => "box breathing",
            Technique::Diaphragmatic => "diaphragmatic breathing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown breathing technique '{0}' (expected 478, box, or diaphragmatic)")]
pub struct UnknownTechnique(String);

impl FromStr for Technique {
    type Err = UnknownTechnique;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "478" | "4-7-8" => Ok(Technique::FourSevenEight),
            "box" => Ok(Technique::Box),
            "diaphragmatic" => Ok(Technique::Diaphragmatic),
            other => Err(UnknownTechnique(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_seven_eight_phases() {
        let phases = Technique::FourSevenEight.phases();
        assert_eq!(
            phases,
            vec![
                PhaseStep { phase: Phase::Inhale, secs: 4 },
                PhaseStep { phase: Phase::Hold, secs: 7 },
                PhaseStep { phase: Phase::Exhale, secs: 8 },
            ]
        );
        assert_eq!(Technique::FourSevenEight.cycle_secs(), 19);
    }

    #[test]
    fn test_box_has_trailing_rest() {
        let phases = Technique::Box.phases();
        assert_eq!(phases.len(), 4);
        assert_eq!(phases[3].phase, Phase::Rest);
        assert!(phases.iter().all(|step| step.secs == 4));
        assert_eq!(Technique::Box.cycle_secs(), 16);
    }

    #[test]
    fn test_diaphragmatic_skips_zero_phases() {
        let phases = Technique::Diaphragmatic.phases();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].phase, Phase::Inhale);
        assert_eq!(phases[1].phase, Phase::Exhale);
        assert_eq!(Technique::Diaphragmatic.cycle_secs(), 10);
    }

    #[test]
    fn test_from_str_accepts_cli_names() {
        assert_eq!("478".parse::<Technique>().unwrap(), Technique::FourSevenEight);
        assert_eq!("4-7-8".parse::<Technique>().unwrap(), Technique::FourSevenEight);
        assert_eq!("box".parse::<Technique>().unwrap(), Technique::Box);
        assert_eq!("BOX".parse::<Technique>().unwrap(), Technique::Box);
        assert_eq!(
            " diaphragmatic ".parse::<Technique>().unwrap(),
            Technique::Diaphragmatic
        );
        assert!("pranayama".parse::<Technique>().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Technique::FourSevenEight.to_string(), "4-7-8 breathing");
        assert_eq!(Technique::Box.to_string(), "box breathing");
        assert_eq!(Technique::Diaphragmatic.to_string(), "diaphragmatic breathing");
    }
}
