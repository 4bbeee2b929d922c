// 📋 Sample Entity - the survey registry
//
// A sample is identified by its natural key (sample_code, the NKS). Samples are
// seeded from the statistics office's allocation file and never edited here.

use serde::{Deserialize, Serialize};

/// Registry entry for one survey sample (census block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Survey the sample belongs to (e.g. "ssn_m25")
    #[serde(default)]
    pub survey: String,

    /// Natural key - unique within a survey
    pub sample_code: String,

    /// Kecamatan
    pub district: String,

    /// Desa / kelurahan
    pub village: String,

    /// Field supervisor (PML)
    pub supervisor: String,

    /// Field enumerator (PPL)
    pub enumerator: String,
}

impl Sample {
    pub fn new(survey: &str, sample_code: &str) -> Self {
        Sample {
            survey: survey.to_string(),
            sample_code: sample_code.to_string(),
            district: String::new(),
            village: String::new(),
            supervisor: String::new(),
            enumerator: String::new(),
        }
    }

    pub fn with_area(mut self, district: &str, village: &str) -> Self {
        self.district = district.to_string();
        self.village = village.to_string();
        self
    }

    pub fn with_staff(mut self, supervisor: &str, enumerator: &str) -> Self {
        self.supervisor = supervisor.to_string();
        self.enumerator = enumerator.to_string();
        self
    }
}
