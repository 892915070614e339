use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of pick phase labels.
///
/// `F` marks the coda end, `Ap` the automatic coda start; the remainder are
/// conventional regional phases carried through from upstream converters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickType {
    F,
    A,
    B,
    Pn,
    Pg,
    Sn,
    Lg,
    O,
    Ap,
    Unknown,
}

impl PickType {
    /// Display phase string used on plots and in exported pick files.
    #[must_use]
    pub fn phase(self) -> &'static str {
        match self {
            PickType::F => "f",
            PickType::A => "a",
            PickType::B => "b",
            PickType::Pn => "Pn",
            PickType::Pg => "Pg",
            PickType::Sn => "Sn",
            PickType::Lg => "Lg",
            PickType::O => "o",
            PickType::Ap => "ap",
            PickType::Unknown => "UNK",
        }
    }

    /// Whether `phase` names one of the regional phases (Pn/Pg/Sn/Lg).
    ///
    /// # Example
    /// ```
    /// use coda_model::PickType;
    /// assert!(PickType::is_known_phase("lg"));
    /// assert!(!PickType::is_known_phase("f"));
    /// ```
    #[must_use]
    pub fn is_known_phase(phase: &str) -> bool {
        [PickType::Pn, PickType::Pg, PickType::Sn, PickType::Lg]
            .iter()
            .any(|p| p.phase().eq_ignore_ascii_case(phase))
    }
}

/// Seismic event: origin time and hypocenter. Immutable reference data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub origin_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
}

/// Recording station. Immutable reference data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub network: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A labeled timestamp on a waveform, expressed in seconds from the event
/// origin time.
///
/// The owning waveform is referenced by id only; picks never hold the
/// waveform itself, so replacing a pick list cannot leave dangling
/// back-pointers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveformPick {
    pub pick_type: PickType,
    /// Display phase, normally `pick_type.phase()`.
    pub pick_name: String,
    pub pick_time_sec_from_origin: f64,
    /// Id of the waveform this pick belongs to.
    pub waveform_id: u64,
}

impl WaveformPick {
    /// Build a pick of the given type on waveform `waveform_id`.
    #[must_use]
    pub fn new(pick_type: PickType, waveform_id: u64, sec_from_origin: f64) -> Self {
        Self {
            pick_type,
            pick_name: pick_type.phase().to_owned(),
            pick_time_sec_from_origin: sec_from_origin,
            waveform_id,
        }
    }
}

/// A fixed-rate sampled waveform segment with its reference data.
///
/// Invariant: `begin_time + segment.len() / sample_rate == end_time` (to
/// within one sample). Derived envelope waveforms copy the event/station
/// references from their source and carry the band corners they were
/// filtered to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Waveform {
    pub id: u64,
    pub sample_rate: f64,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Sample buffer. Raw ground velocity for ingested records, log10
    /// envelope amplitude for derived envelope records.
    pub segment: Vec<f64>,
    pub event: Option<Event>,
    pub station: Station,
    /// Band-pass low corner in Hz. 0.0 for unfiltered raw records.
    pub low_frequency: f64,
    /// Band-pass high corner in Hz. 0.0 for unfiltered raw records.
    pub high_frequency: f64,
    pub associated_picks: Vec<WaveformPick>,
}

impl Waveform {
    /// Duration implied by the segment length, in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.segment.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// First pick of the given type, if any.
    #[must_use]
    pub fn pick_of_type(&self, pick_type: PickType) -> Option<&WaveformPick> {
        self.associated_picks
            .iter()
            .find(|p| p.pick_type == pick_type)
    }

    /// Copy reference data (event, station, band, id) into a new record with
    /// an empty segment, for building a derived waveform.
    #[must_use]
    pub fn derived_shell(&self) -> Waveform {
        Waveform {
            id: self.id,
            sample_rate: self.sample_rate,
            begin_time: self.begin_time,
            end_time: self.end_time,
            segment: Vec::new(),
            event: self.event.clone(),
            station: self.station.clone(),
            low_frequency: self.low_frequency,
            high_frequency: self.high_frequency,
            associated_picks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_station() -> Station {
        Station {
            name: "ANMO".to_owned(),
            network: "IU".to_owned(),
            latitude: 34.946,
            longitude: -106.457,
        }
    }

    #[test]
    fn phase_strings_match_legacy_table() {
        assert_eq!(PickType::F.phase(), "f");
        assert_eq!(PickType::Ap.phase(), "ap");
        assert_eq!(PickType::Lg.phase(), "Lg");
        assert_eq!(PickType::Unknown.phase(), "UNK");
    }

    #[test]
    fn known_phases_are_regional_only() {
        for phase in ["Pn", "pg", "SN", "lg"] {
            assert!(PickType::is_known_phase(phase), "{phase} should be known");
        }
        for phase in ["f", "ap", "o", "x"] {
            assert!(!PickType::is_known_phase(phase), "{phase} should be unknown");
        }
    }

    #[test]
    fn duration_follows_segment_length() {
        let begin = Utc
            .with_ymd_and_hms(2023, 5, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let wave = Waveform {
            id: 1,
            sample_rate: 4.0,
            begin_time: begin,
            end_time: begin + chrono::Duration::seconds(25),
            segment: vec![0.0; 100],
            event: None,
            station: test_station(),
            low_frequency: 1.0,
            high_frequency: 2.0,
            associated_picks: Vec::new(),
        };
        assert!((wave.duration_secs() - 25.0).abs() < f64::EPSILON);
    }
}
