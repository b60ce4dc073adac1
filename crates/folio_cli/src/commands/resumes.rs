//! Resume commands: list, show, create, rename, duplicate and delete.

use super::{print_json, CliError, CliResult, OutputFormat, Session};
use folio_core::{now_millis, time_ago, Resume, ResumeId};

/// Lists every stored resume, most recently edited first.
pub async fn list(session: &Session, format: OutputFormat) -> CliResult<()> {
    let mut resumes = session.list().await;
    resumes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    match format {
        OutputFormat::Json => print_json(&resumes),
        OutputFormat::Text => {
            if resumes.is_empty() {
                println!("No resumes.");
                return Ok(());
            }
            let now = now_millis();
            for resume in &resumes {
                println!("{}", summary_line(resume, now));
            }
            Ok(())
        }
    }
}

/// Prints one resume.
pub async fn show(session: &Session, id: &str, format: OutputFormat) -> CliResult<()> {
    let resume = session
        .get(&ResumeId::from(id))
        .await
        .ok_or_else(|| CliError::NotFound(id.to_string()))?;

    match format {
        OutputFormat::Json => print_json(&resume),
        OutputFormat::Text => {
            let info = &resume.content.personal_info;
            println!("{}", resume.title);
            println!("{}", "=".repeat(resume.title.chars().count()));
            println!();
            println!("Id:       {}", resume.id);
            println!("Origin:   {}", origin_label(&resume));
            println!("Template: {:?}", resume.formatting.template);
            println!("Edited:   {}", time_ago(Some(resume.updated_at), now_millis()));
            if !info.full_name.is_empty() {
                println!("Name:     {}", info.full_name);
            }
            if !info.email.is_empty() {
                println!("Email:    {}", info.email);
            }
            println!();
            println!("Sections:");
            println!("  Experience:     {}", resume.content.experience.len());
            println!("  Education:      {}", resume.content.education.len());
            println!("  Skills:         {}", resume.content.skills.len());
            println!("  Projects:       {}", resume.content.projects.len());
            println!("  Certifications: {}", resume.content.certifications.len());
            Ok(())
        }
    }
}

/// Creates a resume and prints its id.
pub async fn create(session: &Session, title: &str, format: OutputFormat) -> CliResult<()> {
    let resume = session.create(title).await?;
    report(&resume, "Created", format)
}

/// Renames a resume.
pub async fn rename(session: &Session, id: &str, title: &str, format: OutputFormat) -> CliResult<()> {
    let resume = session.rename(&ResumeId::from(id), title).await?;
    report(&resume, "Renamed", format)
}

/// Duplicates a resume and prints the copy's id.
pub async fn duplicate(session: &Session, id: &str, format: OutputFormat) -> CliResult<()> {
    let copy = session.duplicate(&ResumeId::from(id)).await?;
    report(&copy, "Duplicated as", format)
}

/// Deletes a resume.
pub async fn delete(session: &Session, id: &str) -> CliResult<()> {
    if session.delete(&ResumeId::from(id)).await? {
        println!("Deleted {id}");
        Ok(())
    } else {
        Err(CliError::NotFound(id.to_string()))
    }
}

fn report(resume: &Resume, verb: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(resume),
        OutputFormat::Text => {
            println!("{verb} {} \"{}\"", resume.id, resume.title);
            Ok(())
        }
    }
}

fn origin_label(resume: &Resume) -> &'static str {
    if resume.origin.is_local_only() {
        "local only"
    } else {
        "synced"
    }
}

fn summary_line(resume: &Resume, now: i64) -> String {
    format!(
        "{:<36} {:<32} {:<10} {}",
        resume.id.as_str(),
        resume.title,
        origin_label(resume),
        time_ago(Some(resume.updated_at), now)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::session;

    #[tokio::test]
    async fn create_rename_delete() {
        let (_dir, session) = session(None);
        create(&session, "CV", OutputFormat::Json).await.unwrap();
        let id = session.list().await[0].id.to_string();

        rename(&session, &id, "Renamed", OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(session.store().get(&ResumeId::from(id.as_str())).unwrap().title, "Renamed");

        delete(&session, &id).await.unwrap();
        assert!(matches!(
            delete(&session, &id).await,
            Err(CliError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn show_missing_is_not_found() {
        let (_dir, session) = session(None);
        assert!(matches!(
            show(&session, "nope", OutputFormat::Text).await,
            Err(CliError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (_dir, session) = session(None);
        assert!(matches!(
            create(&session, "   ", OutputFormat::Text).await,
            Err(CliError::Sync(_))
        ));
    }

    #[test]
    fn summary_line_labels_origin() {
        let resume = Resume::new(ResumeId::from("local_1_abcdefghi"), "CV", 0);
        let line = summary_line(&resume, 30_000);
        assert!(line.contains("local only"));
        assert!(line.ends_with("Just now"));
    }
}
