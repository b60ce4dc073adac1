//! Property-based test generators using proptest.
//!
//! Provides strategies for generating resumes that satisfy the envelope
//! invariants (non-empty title, `updated_at >= created_at`).

use folio_core::{
    ColorTheme, Education, Experience, Font, Formatting, Origin, PersonalInfo, Resume,
    ResumeContent, ResumeId, SectionType, Skill, SkillLevel, Template,
};
use proptest::prelude::*;

/// Strategy for generating non-blank titles.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 ()-]{0,40}").expect("Invalid regex")
}

/// Strategy for generating ids from either namespace.
pub fn resume_id_strategy() -> impl Strategy<Value = ResumeId> {
    prop_oneof![
        (1u64..4_000_000_000_000, "[a-z0-9]{9}")
            .prop_map(|(millis, suffix)| ResumeId::new(format!("local_{millis}_{suffix}"))),
        "[a-z0-9-]{6,24}".prop_map(|id| ResumeId::new(id)),
    ]
}

fn formatting_strategy() -> impl Strategy<Value = Formatting> {
    (
        prop_oneof![
            Just(Template::Modern),
            Just(Template::Minimal),
            Just(Template::Creative),
            Just(Template::Professional),
            Just(Template::Ats),
        ],
        prop_oneof![
            Just(Font::Inter),
            Just(Font::Roboto),
            Just(Font::Lora),
            Just(Font::Playfair),
            Just(Font::SourceSans),
        ],
        prop_oneof![
            Just(ColorTheme::Emerald),
            Just(ColorTheme::Slate),
            Just(ColorTheme::Amber),
            Just(ColorTheme::Rose),
            Just(ColorTheme::Blue),
        ],
        Just(SectionType::DEFAULT_ORDER.to_vec()).prop_shuffle(),
    )
        .prop_map(|(template, font, color_theme, section_order)| Formatting {
            template,
            font,
            color_theme,
            section_order,
        })
}

fn skill_level_strategy() -> impl Strategy<Value = SkillLevel> {
    prop_oneof![
        Just(SkillLevel::Beginner),
        Just(SkillLevel::Intermediate),
        Just(SkillLevel::Advanced),
        Just(SkillLevel::Expert),
    ]
}

/// Strategy for generating resume content.
pub fn content_strategy() -> impl Strategy<Value = ResumeContent> {
    (
        ("[A-Za-z ]{0,24}", "[a-z]{1,8}@[a-z]{1,8}\\.com"),
        ".{0,200}",
        prop::collection::vec(("[A-Za-z ]{1,20}", "[A-Za-z ]{0,20}", any::<bool>()), 0..3),
        prop::collection::vec(("[A-Za-z ]{1,20}", ".{0,80}"), 0..3),
        prop::collection::vec(("[A-Za-z+#]{1,12}", skill_level_strategy()), 0..5),
    )
        .prop_map(|((full_name, email), summary, education, experience, skills)| {
            ResumeContent {
                personal_info: PersonalInfo {
                    full_name,
                    email,
                    ..PersonalInfo::default()
                },
                summary,
                education: education
                    .into_iter()
                    .enumerate()
                    .map(|(i, (institution, degree, current))| Education {
                        id: format!("edu{i}"),
                        institution,
                        degree,
                        current,
                        ..Education::default()
                    })
                    .collect(),
                experience: experience
                    .into_iter()
                    .enumerate()
                    .map(|(i, (company, description))| Experience {
                        id: format!("exp{i}"),
                        company,
                        description,
                        ..Experience::default()
                    })
                    .collect(),
                skills: skills
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, level))| Skill {
                        id: format!("skl{i}"),
                        name,
                        level,
                    })
                    .collect(),
                ..ResumeContent::default()
            }
        })
}

/// Strategy for generating whole resumes with valid timestamps.
pub fn resume_strategy() -> impl Strategy<Value = Resume> {
    (
        resume_id_strategy(),
        title_strategy(),
        content_strategy(),
        formatting_strategy(),
        1i64..4_000_000_000_000,
        0i64..1_000_000_000,
    )
        .prop_map(|(id, title, content, formatting, created_at, age)| {
            let origin = if id.is_locally_minted("local_") {
                Origin::LocalOnly
            } else {
                Origin::Remote
            };
            Resume {
                id,
                title,
                content,
                formatting,
                created_at,
                updated_at: created_at + age,
                origin,
            }
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
