// Section extraction from free-text discharge notes

pub mod scanner;

pub use scanner::{extract_section, REDACTION_MARKER};

use std::fmt;

use crate::domain::NoteSummary;

/// Section headers commonly found in discharge notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    BriefHospitalCourse,
    DischargeSummary,
    ChiefComplaint,
    HistoryOfPresentIllness,
    PastMedicalHistory,
    DischargeDiagnosis,
    DischargeCondition,
    DischargeInstructions,
    MedicationsOnAdmission,
    DischargeMedications,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 10] = [
        SectionLabel::BriefHospitalCourse,
        SectionLabel::DischargeSummary,
        SectionLabel::ChiefComplaint,
        SectionLabel::HistoryOfPresentIllness,
        SectionLabel::PastMedicalHistory,
        SectionLabel::DischargeDiagnosis,
        SectionLabel::DischargeCondition,
        SectionLabel::DischargeInstructions,
        SectionLabel::MedicationsOnAdmission,
        SectionLabel::DischargeMedications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLabel::BriefHospitalCourse => "Brief Hospital Course",
            SectionLabel::DischargeSummary => "Discharge Summary",
            SectionLabel::ChiefComplaint => "Chief Complaint",
            SectionLabel::HistoryOfPresentIllness => "History of Present Illness",
            SectionLabel::PastMedicalHistory => "Past Medical History",
            SectionLabel::DischargeDiagnosis => "Discharge Diagnosis",
            SectionLabel::DischargeCondition => "Discharge Condition",
            SectionLabel::DischargeInstructions => "Discharge Instructions",
            SectionLabel::MedicationsOnAdmission => "Medications on Admission",
            SectionLabel::DischargeMedications => "Discharge Medications",
        }
    }

    /// Case-insensitive lookup of a known label by its display text.
    pub fn lookup(text: &str) -> Option<SectionLabel> {
        let wanted = text.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(wanted))
    }

    pub fn extract(&self, full_text: &str) -> Option<String> {
        extract_section(full_text, self.as_str())
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull the headline sections out of a note.
pub fn summarize(note_id: &str, full_text: &str) -> NoteSummary {
    NoteSummary {
        note_id: note_id.to_string(),
        chief_complaint: SectionLabel::ChiefComplaint.extract(full_text),
        brief_hospital_course: SectionLabel::BriefHospitalCourse.extract(full_text),
        discharge_diagnosis: SectionLabel::DischargeDiagnosis.extract(full_text),
        text_length: full_text.chars().count(),
    }
}
