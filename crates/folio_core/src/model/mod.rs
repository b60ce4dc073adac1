//! Resume data model.
//!
//! Section item structs mirror the editor forms field for field and are
//! otherwise opaque to the store; only [`Resume`]'s envelope (id, title,
//! timestamps, origin) carries invariants.

mod id;
#[allow(missing_docs)]
mod resume;

pub use id::{new_item_id, CallerIdentity, Origin, ResumeId};
pub use resume::{
    Achievement, Certification, ColorTheme, Education, Experience, Font, Formatting, Hobby,
    Language, PersonalInfo, PhotoShape, Project, Resume, ResumeContent, SectionType, Skill,
    SkillLevel, Template,
};
