use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::cv::{is_present, CvData};

const MAX_SCORE: u8 = 100;
const SUMMARY_MIN_CHARS: usize = 20;
const SKILLS_BONUS_THRESHOLD: usize = 3;

/// Weighted sections of the completeness score, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvSection {
    Identity,
    Contact,
    Summary,
    SocialPhoto,
    Experience,
    Education,
    Skills,
    SkillsBonus,
    Certifications,
    Languages,
}

impl CvSection {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Identity,
            Self::Contact,
            Self::Summary,
            Self::SocialPhoto,
            Self::Experience,
            Self::Education,
            Self::Skills,
            Self::SkillsBonus,
            Self::Certifications,
            Self::Languages,
        ]
    }

    pub const fn max_points(self) -> u8 {
        match self {
            Self::Identity | Self::Contact | Self::Skills => 10,
            Self::Summary
            | Self::SocialPhoto
            | Self::SkillsBonus
            | Self::Certifications
            | Self::Languages => 5,
            Self::Experience => 25,
            Self::Education => 20,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Identity => "Name and e-mail",
            Self::Contact => "Phone and location",
            Self::Summary => "Professional summary",
            Self::SocialPhoto => "Photo or profile links",
            Self::Experience => "Work experience",
            Self::Education => "Education",
            Self::Skills => "Skills",
            Self::SkillsBonus => "Three or more skills",
            Self::Certifications => "Certifications",
            Self::Languages => "Languages",
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            Self::Identity => "Add your full name and e-mail address",
            Self::Contact => "Add a phone number and your city or address",
            Self::Summary => "Write a summary of more than 20 characters",
            Self::SocialPhoto => "Add a photo, LinkedIn profile or portfolio link",
            Self::Experience => "Add at least one work experience",
            Self::Education => "Add your education history",
            Self::Skills => "List at least one skill",
            Self::SkillsBonus => "List at least three skills",
            Self::Certifications => "Add a certification",
            Self::Languages => "Add the languages you speak",
        }
    }

    fn is_satisfied(self, cv: &CvData) -> bool {
        let info = &cv.personal_info;
        match self {
            Self::Identity => is_present(&info.full_name) && is_present(&info.email),
            Self::Contact => {
                is_present(&info.phone) && (is_present(&info.address) || is_present(&info.city))
            }
            Self::Summary => info
                .summary
                .as_deref()
                .map_or(false, |summary| summary.chars().count() > SUMMARY_MIN_CHARS),
            Self::SocialPhoto => {
                is_present(&info.photo_url)
                    || is_present(&info.linkedin)
                    || is_present(&info.portfolio)
            }
            Self::Experience => !cv.experience.is_empty(),
            Self::Education => !cv.education.is_empty(),
            Self::Skills => !cv.skills.is_empty(),
            Self::SkillsBonus => cv.skills.len() >= SKILLS_BONUS_THRESHOLD,
            Self::Certifications => !cv.certifications.is_empty(),
            Self::Languages => !cv.languages.is_empty(),
        }
    }
}

/// Points earned by one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionScore {
    pub section: CvSection,
    pub label: &'static str,
    pub points: u8,
    pub max_points: u8,
    pub satisfied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessLevel {
    VeryComplete,
    FairlyComplete,
    NeedsCompletion,
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletenessStatus {
    pub level: CompletenessLevel,
    pub label: &'static str,
    pub color_token: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub score: u8,
    pub status: CompletenessStatus,
    pub components: Vec<SectionScore>,
    /// Prompts for every unsatisfied section, in display order.
    pub hints: Vec<&'static str>,
}

/// Weighted completeness in `0..=100`. A missing CV scores zero.
pub fn score(cv: Option<&CvData>) -> u8 {
    let Some(cv) = cv else {
        return 0;
    };
    let total: u16 = CvSection::ordered()
        .into_iter()
        .filter(|section| section.is_satisfied(cv))
        .map(|section| u16::from(section.max_points()))
        .sum();
    total.min(u16::from(MAX_SCORE)) as u8
}

/// Reads an untyped payload as a CV. Anything that is not CV-shaped is logged and
/// treated as no CV at all.
pub fn cv_from_value(value: &Value) -> Option<CvData> {
    match CvData::deserialize(value) {
        Ok(cv) => Some(cv),
        Err(err) => {
            warn!(error = %err, "cv payload is not CV-shaped, scoring as empty");
            None
        }
    }
}

pub fn score_value(value: &Value) -> u8 {
    score(cv_from_value(value).as_ref())
}

/// Bands are inclusive lower bounds checked from the top.
pub fn completeness_status(score: u8) -> CompletenessStatus {
    let (level, label, color_token) = match score {
        s if s >= 80 => (CompletenessLevel::VeryComplete, "Very Complete", "success"),
        s if s >= 60 => (CompletenessLevel::FairlyComplete, "Fairly Complete", "info"),
        s if s >= 40 => (CompletenessLevel::NeedsCompletion, "Needs Completion", "warning"),
        _ => (CompletenessLevel::Incomplete, "Incomplete", "danger"),
    };
    CompletenessStatus {
        level,
        label,
        color_token,
    }
}

pub fn completeness_report(cv: Option<&CvData>) -> CompletenessReport {
    let empty = CvData::default();
    let data = cv.unwrap_or(&empty);

    let components: Vec<SectionScore> = CvSection::ordered()
        .into_iter()
        .map(|section| {
            let satisfied = cv.is_some() && section.is_satisfied(data);
            SectionScore {
                section,
                label: section.label(),
                points: if satisfied { section.max_points() } else { 0 },
                max_points: section.max_points(),
                satisfied,
            }
        })
        .collect();
    let hints = components
        .iter()
        .filter(|component| !component.satisfied)
        .map(|component| component.section.hint())
        .collect();

    let score = score(cv);
    CompletenessReport {
        score,
        status: completeness_status(score),
        components,
        hints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn skill(name: &str) -> Value {
        json!({ "name": name })
    }

    fn sample_cv() -> CvData {
        let mut cv = CvData::default();
        cv.personal_info.full_name = text("Rina Hartono");
        cv.personal_info.email = text("rina@example.com");
        cv.personal_info.phone = text("+62 812 0000 0000");
        cv.personal_info.city = text("Bandung");
        cv.personal_info.summary = text("Backend engineer, 6 years");
        cv.personal_info.linkedin = text("https://linkedin.com/in/rina");
        cv.experience = vec![json!({ "company": "Acme" })];
        cv.education = vec![json!({})];
        cv.skills = vec![skill("Rust"), skill("SQL"), skill("Kubernetes")];
        cv
    }

    #[test]
    fn filled_profile_scores_ninety() {
        let cv = sample_cv();
        assert_eq!(score(Some(&cv)), 90);
        assert_eq!(completeness_status(90).label, "Very Complete");
    }

    #[test]
    fn missing_or_empty_cv_scores_zero() {
        assert_eq!(score(None), 0);
        assert_eq!(score(Some(&CvData::default())), 0);
        assert_eq!(completeness_status(0).label, "Incomplete");
    }

    #[test]
    fn summary_must_exceed_twenty_characters() {
        let mut cv = CvData::default();
        cv.personal_info.summary = text("exactly twenty chars");
        assert_eq!(cv.personal_info.summary.as_deref().map(str::len), Some(20));
        assert_eq!(score(Some(&cv)), 0);

        cv.personal_info.summary = text("exactly twenty chars!");
        assert_eq!(score(Some(&cv)), 5);
    }

    #[test]
    fn summary_length_counts_surrounding_spaces() {
        let mut cv = CvData::default();
        cv.personal_info.summary = text(" exactly twenty chars");
        assert_eq!(cv.personal_info.summary.as_deref().map(str::len), Some(21));
        assert_eq!(score(Some(&cv)), 5);
    }

    #[test]
    fn whitespace_only_fields_earn_nothing() {
        let mut cv = CvData::default();
        cv.personal_info.full_name = text("  ");
        cv.personal_info.email = text("rina@example.com");
        cv.personal_info.portfolio = text("\t");
        assert_eq!(score(Some(&cv)), 0);
    }

    #[test]
    fn contact_needs_phone_and_a_location() {
        let mut cv = CvData::default();
        cv.personal_info.phone = text("+62 812");
        assert_eq!(score(Some(&cv)), 0);
        cv.personal_info.address = text("Jl. Merdeka 1");
        assert_eq!(score(Some(&cv)), 10);
    }

    #[test]
    fn full_profile_reaches_the_cap() {
        let mut cv = sample_cv();
        cv.certifications = vec![Default::default()];
        cv.languages = vec![Default::default()];
        assert_eq!(score(Some(&cv)), 100);
    }

    #[test]
    fn adding_any_single_field_never_lowers_the_score() {
        let base = CvData::default();
        let mut variants = Vec::new();
        let setters: [fn(&mut CvData); 9] = [
            |cv| cv.personal_info.full_name = text("Rina"),
            |cv| cv.personal_info.email = text("rina@example.com"),
            |cv| cv.personal_info.phone = text("+62"),
            |cv| cv.personal_info.city = text("Bandung"),
            |cv| cv.personal_info.photo_url = text("https://cdn/p.png"),
            |cv| cv.experience.push(json!({})),
            |cv| cv.education.push(json!({})),
            |cv| cv.skills.push(skill("Go")),
            |cv| cv.languages.push(Default::default()),
        ];
        let mut current = base;
        for setter in setters {
            let before = score(Some(&current));
            setter(&mut current);
            let after = score(Some(&current));
            assert!(after >= before, "score dropped from {before} to {after}");
            variants.push(after);
        }
        assert!(variants.iter().all(|value| *value <= 100));
    }

    #[test]
    fn status_bands_use_inclusive_lower_bounds() {
        assert_eq!(completeness_status(100).level, CompletenessLevel::VeryComplete);
        assert_eq!(completeness_status(80).level, CompletenessLevel::VeryComplete);
        assert_eq!(completeness_status(79).level, CompletenessLevel::FairlyComplete);
        assert_eq!(completeness_status(60).level, CompletenessLevel::FairlyComplete);
        assert_eq!(completeness_status(59).level, CompletenessLevel::NeedsCompletion);
        assert_eq!(completeness_status(40).level, CompletenessLevel::NeedsCompletion);
        assert_eq!(completeness_status(39).level, CompletenessLevel::Incomplete);
    }

    #[test]
    fn malformed_payload_scores_zero() {
        assert_eq!(score_value(&json!({ "personalInfo": "not an object" })), 0);
        assert_eq!(score_value(&json!([1, 2, 3])), 0);
        assert_eq!(
            score_value(&json!({
                "personalInfo": { "fullName": "Rina", "email": "rina@example.com" },
                "experience": [{}]
            })),
            35
        );
    }

    #[test]
    fn skills_listed_as_plain_strings_still_count() {
        let cv = json!({
            "personalInfo": { "fullName": "Rina", "email": "rina@example.com" },
            "experience": [{}],
            "skills": ["Rust", "SQL", "Go"]
        });
        assert_eq!(score_value(&cv), 50);
    }

    #[test]
    fn null_sections_only_lose_their_own_points() {
        let base = json!({
            "personalInfo": { "fullName": "Rina", "email": "rina@example.com" },
            "experience": [{}],
            "certifications": null,
            "languages": null
        });
        assert_eq!(score_value(&base), 35);

        let no_personal_info = json!({ "personalInfo": null, "experience": [{}] });
        assert_eq!(score_value(&no_personal_info), 25);
    }

    #[test]
    fn report_lists_components_and_hints() {
        let report = completeness_report(Some(&sample_cv()));

        assert_eq!(report.score, 90);
        assert_eq!(report.components.len(), CvSection::ordered().len());
        assert_eq!(
            report
                .components
                .iter()
                .map(|component| u32::from(component.points))
                .sum::<u32>(),
            90
        );
        assert_eq!(
            report.hints,
            vec![
                CvSection::Certifications.hint(),
                CvSection::Languages.hint()
            ]
        );

        let empty = completeness_report(None);
        assert_eq!(empty.score, 0);
        assert_eq!(empty.hints.len(), CvSection::ordered().len());
    }
}
