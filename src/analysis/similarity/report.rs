// Report module - similarity report, verdict level and display helpers

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Detail scores at or above this count as strengths
pub const STRENGTH_THRESHOLD: f32 = 0.8;

/// Detail scores below this count as weaknesses
pub const WEAKNESS_THRESHOLD: f32 = 0.6;

/// Per-feature similarity scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityDetails {
    pub harmonic_structure: f32,
    pub spectral_envelope: f32,
    pub brightness: f32,
    pub formant_match: f32,
    pub mfcc: f32,
    pub spectral: f32,
    pub pitch: f32,
    pub pitch_range: f32,
    pub speed: f32,
    pub pause: f32,
    pub duration_ratio: f32,
    pub energy: f32,
}

impl SimilarityDetails {
    fn uniform(value: f32) -> Self {
        Self {
            harmonic_structure: value,
            spectral_envelope: value,
            brightness: value,
            formant_match: value,
            mfcc: value,
            spectral: value,
            pitch: value,
            pitch_range: value,
            speed: value,
            pause: value,
            duration_ratio: value,
            energy: value,
        }
    }

    /// Detail scores keyed by their display name
    pub fn entries(&self) -> [(&'static str, f32); 12] {
        [
            ("harmonicStructure", self.harmonic_structure),
            ("spectralEnvelope", self.spectral_envelope),
            ("brightness", self.brightness),
            ("formantMatch", self.formant_match),
            ("mfcc", self.mfcc),
            ("spectral", self.spectral),
            ("pitch", self.pitch),
            ("pitchRange", self.pitch_range),
            ("speed", self.speed),
            ("pause", self.pause),
            ("durationRatio", self.duration_ratio),
            ("energy", self.energy),
        ]
    }

    fn sanitized(mut self) -> Self {
        for score in [
            &mut self.harmonic_structure,
            &mut self.spectral_envelope,
            &mut self.brightness,
            &mut self.formant_match,
            &mut self.mfcc,
            &mut self.spectral,
            &mut self.pitch,
            &mut self.pitch_range,
            &mut self.speed,
            &mut self.pause,
            &mut self.duration_ratio,
            &mut self.energy,
        ] {
            *score = sanitize_score(*score);
        }
        self
    }
}

/// Result of comparing two recordings
///
/// Fresh per comparison. Every score is finite and in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityReport {
    pub total: f32,
    pub timbre: f32,
    pub acoustic: f32,
    pub rhythm: f32,
    pub details: SimilarityDetails,
}

impl SimilarityReport {
    /// Build a report, forcing every score into [0, 1]
    pub fn new(
        total: f32,
        timbre: f32,
        acoustic: f32,
        rhythm: f32,
        details: SimilarityDetails,
    ) -> Self {
        Self {
            total: sanitize_score(total),
            timbre: sanitize_score(timbre),
            acoustic: sanitize_score(acoustic),
            rhythm: sanitize_score(rhythm),
            details: details.sanitized(),
        }
    }

    /// Canonical report returned when a comparison cannot be made
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, SimilarityDetails::default())
    }

    /// Report for two identical feature sets
    pub fn perfect() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0, SimilarityDetails::uniform(1.0))
    }

    pub fn level(&self) -> SimilarityLevel {
        SimilarityLevel::from_score(self.total)
    }

    /// Flat key -> rounded percentage view for display
    pub fn to_percentages(&self) -> BTreeMap<String, u32> {
        let mut map = BTreeMap::new();
        for (key, score) in [
            ("total", self.total),
            ("timbre", self.timbre),
            ("acoustic", self.acoustic),
            ("rhythm", self.rhythm),
        ]
        .into_iter()
        .chain(self.details.entries())
        {
            map.insert(key.to_string(), to_percent(score));
        }
        map
    }

    /// Verdict plus the detail scores that stand out either way
    pub fn summary(&self) -> ReportSummary {
        let entries = self.details.entries();
        ReportSummary {
            level: self.level(),
            percent: to_percent(self.total),
            strengths: entries
                .iter()
                .filter(|(_, score)| *score >= STRENGTH_THRESHOLD)
                .map(|(key, _)| *key)
                .collect(),
            weaknesses: entries
                .iter()
                .filter(|(_, score)| *score < WEAKNESS_THRESHOLD)
                .map(|(key, _)| *key)
                .collect(),
        }
    }
}

/// Non-finite scores become 0, everything else is clamped to [0, 1]
pub fn sanitize_score(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn to_percent(score: f32) -> u32 {
    (sanitize_score(score) * 100.0).round() as u32
}

/// Verbal grading of the total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityLevel {
    VeryHigh,
    High,
    Moderate,
    Low,
    Distinct,
}

impl SimilarityLevel {
    pub fn from_score(total: f32) -> Self {
        let percent = to_percent(total);
        if percent >= 90 {
            SimilarityLevel::VeryHigh
        } else if percent >= 80 {
            SimilarityLevel::High
        } else if percent >= 60 {
            SimilarityLevel::Moderate
        } else if percent >= 40 {
            SimilarityLevel::Low
        } else {
            SimilarityLevel::Distinct
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SimilarityLevel::VeryHigh => "very high similarity, likely the same speaker",
            SimilarityLevel::High => "high similarity, voice characteristics largely match",
            SimilarityLevel::Moderate => "moderate similarity, some characteristics match",
            SimilarityLevel::Low => "low similarity, voice characteristics differ",
            SimilarityLevel::Distinct => "distinct voices",
        }
    }
}

impl fmt::Display for SimilarityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Human-oriented reading of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub level: SimilarityLevel,
    pub percent: u32,
    pub strengths: Vec<&'static str>,
    pub weaknesses: Vec<&'static str>,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% - {}", self.percent, self.level)?;
        if !self.strengths.is_empty() {
            write!(f, "; strengths: {}", self.strengths.join(", "))?;
        }
        if !self.weaknesses.is_empty() {
            write!(f, "; weaknesses: {}", self.weaknesses.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_are_sanitized() {
        let details = SimilarityDetails {
            pitch: f32::NAN,
            energy: 3.0,
            ..SimilarityDetails::default()
        };
        let report = SimilarityReport::new(f32::INFINITY, -0.5, 0.5, 1.5, details);
        assert_eq!(report.total, 0.0);
        assert_eq!(report.timbre, 0.0);
        assert_eq!(report.acoustic, 0.5);
        assert_eq!(report.rhythm, 1.0);
        assert_eq!(report.details.pitch, 0.0);
        assert_eq!(report.details.energy, 1.0);
    }

    #[test]
    fn test_percentages() {
        let report = SimilarityReport::new(
            0.876,
            0.5,
            0.0,
            1.0,
            SimilarityDetails::uniform(0.333),
        );
        let map = report.to_percentages();
        assert_eq!(map["total"], 88);
        assert_eq!(map["timbre"], 50);
        assert_eq!(map["rhythm"], 100);
        assert_eq!(map["durationRatio"], 33);
        assert_eq!(map.len(), 16);
    }

    #[test]
    fn test_levels() {
        assert_eq!(SimilarityLevel::from_score(0.95), SimilarityLevel::VeryHigh);
        assert_eq!(SimilarityLevel::from_score(0.85), SimilarityLevel::High);
        assert_eq!(SimilarityLevel::from_score(0.6), SimilarityLevel::Moderate);
        assert_eq!(SimilarityLevel::from_score(0.45), SimilarityLevel::Low);
        assert_eq!(SimilarityLevel::from_score(0.1), SimilarityLevel::Distinct);
        assert_eq!(SimilarityReport::zero().level(), SimilarityLevel::Distinct);
    }

    #[test]
    fn test_summary_strengths_and_weaknesses() {
        let details = SimilarityDetails {
            mfcc: 0.9,
            pitch: 0.3,
            ..SimilarityDetails::uniform(0.7)
        };
        let summary = SimilarityReport::new(0.7, 0.7, 0.7, 0.7, details).summary();
        assert_eq!(summary.strengths, vec!["mfcc"]);
        assert_eq!(summary.weaknesses, vec!["pitch"]);
        assert_eq!(summary.level, SimilarityLevel::Moderate);
        assert!(summary.to_string().starts_with("70%"));
    }

    #[test]
    fn test_perfect_report() {
        let report = SimilarityReport::perfect();
        assert_eq!(report.total, 1.0);
        assert!(report.details.entries().iter().all(|(_, s)| *s == 1.0));
    }
}
