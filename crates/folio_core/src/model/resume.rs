//! The resume document and its content.

use super::id::{Origin, ResumeId};
use serde::{Deserialize, Serialize};

/// A resume, the unit of persistence.
///
/// # Invariants
///
/// - `updated_at >= created_at` (see [`Resume::normalize_timestamps`])
/// - `updated_at` is rewritten by the local store on every successful write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    /// Unique id.
    pub id: ResumeId,
    /// User-editable title.
    pub title: String,
    /// Structured content.
    #[serde(default)]
    pub content: ResumeContent,
    /// Presentation directives.
    #[serde(default)]
    pub formatting: Formatting,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Last local write, epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
    /// Whether a remote counterpart exists.
    #[serde(default)]
    pub origin: Origin,
}

impl Resume {
    /// Creates an empty resume with default content and formatting.
    pub fn new(id: ResumeId, title: impl Into<String>, now: i64) -> Self {
        Self {
            id,
            title: title.into(),
            content: ResumeContent::default(),
            formatting: Formatting::default(),
            created_at: now,
            updated_at: now,
            origin: Origin::LocalOnly,
        }
    }

    /// Synthesizes missing timestamps from `now` and restores `updated_at >= created_at`.
    pub fn normalize_timestamps(&mut self, now: i64) {
        if self.created_at <= 0 {
            self.created_at = now;
        }
        if self.updated_at <= 0 {
            self.updated_at = now;
        }
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
        }
    }
}

/// Structured resume content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeContent {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub languages: Vec<Language>,
    pub achievements: Vec<Achievement>,
    pub hobbies: Vec<Hobby>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Base64 data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_shape: Option<PhotoShape>,
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            location: String::new(),
            linked_in: None,
            website: None,
            profile_photo: None,
            photo_shape: Some(PhotoShape::Round),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoShape {
    Square,
    Round,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hobby {
    pub id: String,
    pub name: String,
}

/// Presentation directives consumed by the template renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Formatting {
    pub template: Template,
    pub font: Font,
    pub color_theme: ColorTheme,
    pub section_order: Vec<SectionType>,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            template: Template::Modern,
            font: Font::Inter,
            color_theme: ColorTheme::Emerald,
            section_order: SectionType::DEFAULT_ORDER.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Modern,
    Minimal,
    Creative,
    Professional,
    Ats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Font {
    Inter,
    Roboto,
    Lora,
    Playfair,
    SourceSans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    Emerald,
    Slate,
    Amber,
    Rose,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Summary,
    Education,
    Experience,
    Skills,
    Projects,
    Certifications,
    Languages,
    Achievements,
    Hobbies,
}

impl SectionType {
    /// Section order of a freshly created resume.
    pub const DEFAULT_ORDER: [SectionType; 9] = [
        SectionType::Summary,
        SectionType::Experience,
        SectionType::Education,
        SectionType::Skills,
        SectionType::Projects,
        SectionType::Certifications,
        SectionType::Languages,
        SectionType::Achievements,
        SectionType::Hobbies,
    ];
}
