//! Document assembly — builds the `DocumentModel` for one job from the shared
//! personal info and the job's optimised experience content. Deterministic.

use thiserror::Error;
use uuid::Uuid;

use crate::document::markdown::to_lines;
use crate::document::model::{DocumentModel, Header, LineItem, Section, SectionLayout};
use crate::document::segment::segment;
use crate::models::batch::{BatchConfig, Education, PersonalInfo};
use crate::models::job::SourceRecord;
use crate::pipeline::OptimizedContent;

pub const SUMMARY_TITLE: &str = "Professional Summary";
pub const SKILLS_TITLE: &str = "Skills";
pub const LANGUAGES_TITLE: &str = "Languages";
pub const EDUCATION_TITLE: &str = "Education";
pub const CERTIFICATES_TITLE: &str = "Certifications";
pub const EXPERIENCE_TITLE: &str = "Professional Experience";

const SKILLS_PER_LINE: usize = 5;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("full name is required for the document header")]
    MissingFullName,

    #[error("optimised content references unknown source record {0}")]
    UnknownRecord(Uuid),
}

/// Assembles the document. `optimized` must already be in display order
/// (most-recent-first) and reference records from `records`.
pub fn assemble(
    config: &BatchConfig,
    records: &[SourceRecord],
    optimized: &[OptimizedContent],
) -> Result<DocumentModel, AssemblyError> {
    let info = &config.personal_info;

    let header = if config.include_personal_info {
        Some(build_header(info)?)
    } else {
        None
    };

    let mut sections = Vec::new();

    if config.include_summary {
        push_if_any(
            &mut sections,
            SUMMARY_TITLE,
            SectionLayout::Bulleted,
            non_blank(&info.summary).map(LineItem::text).collect(),
        );
    }

    if config.include_skills {
        push_if_any(
            &mut sections,
            SKILLS_TITLE,
            SectionLayout::Plain,
            chunked_lines(&info.technical_skills),
        );
        push_if_any(
            &mut sections,
            LANGUAGES_TITLE,
            SectionLayout::Plain,
            chunked_lines(&info.languages),
        );
    }

    if config.include_education {
        push_if_any(
            &mut sections,
            EDUCATION_TITLE,
            SectionLayout::Plain,
            info.education
                .iter()
                .filter(|e| !e.degree.trim().is_empty() || !e.institution.trim().is_empty())
                .map(education_item)
                .collect(),
        );
    }

    if config.include_certificates {
        push_if_any(
            &mut sections,
            CERTIFICATES_TITLE,
            SectionLayout::Plain,
            non_blank(&info.certificates).map(LineItem::text).collect(),
        );
    }

    if config.include_experiences {
        push_if_any(
            &mut sections,
            EXPERIENCE_TITLE,
            SectionLayout::Bulleted,
            experience_items(records, optimized)?,
        );
    }

    Ok(DocumentModel { header, sections })
}

fn build_header(info: &PersonalInfo) -> Result<Header, AssemblyError> {
    let full_name = info.full_name.trim();
    if full_name.is_empty() {
        return Err(AssemblyError::MissingFullName);
    }

    let contact_lines = [
        vec![&info.email, &info.phone, &info.location],
        vec![&info.linkedin, &info.website],
    ]
    .into_iter()
    .map(|line| {
        line.into_iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect::<Vec<_>>()
    })
    .filter(|line| !line.is_empty())
    .collect();

    Ok(Header {
        full_name: full_name.to_string(),
        contact_lines,
    })
}

fn experience_items(
    records: &[SourceRecord],
    optimized: &[OptimizedContent],
) -> Result<Vec<LineItem>, AssemblyError> {
    let mut items = Vec::new();

    for content in optimized {
        let record = records
            .iter()
            .find(|r| r.id == content.record_id)
            .ok_or(AssemblyError::UnknownRecord(content.record_id))?;

        let mut first = true;
        for section in segment(&content.text) {
            let lines = to_lines(&section);
            if lines.is_empty() {
                continue;
            }
            let mut item = LineItem {
                lines,
                ..LineItem::default()
            };
            if first {
                item.heading = Some(record_heading(record));
                item.meta = record
                    .time_range
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from);
                first = false;
            }
            items.push(item);
        }
    }

    Ok(items)
}

fn record_heading(record: &SourceRecord) -> String {
    [record.organization.trim(), record.title.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" — ")
}

fn education_item(edu: &Education) -> LineItem {
    let heading = [edu.degree.trim(), edu.institution.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" — ");

    let mut meta = edu.year.trim().to_string();
    if let Some(gpa) = edu.gpa.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        if !meta.is_empty() {
            meta.push_str(" · ");
        }
        meta.push_str(&format!("GPA: {gpa}"));
    }

    LineItem {
        heading: Some(heading),
        meta: (!meta.is_empty()).then_some(meta),
        lines: Vec::new(),
    }
}

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn chunked_lines(values: &[String]) -> Vec<LineItem> {
    let valid: Vec<&str> = non_blank(values).collect();
    valid
        .chunks(SKILLS_PER_LINE)
        .map(|chunk| LineItem::text(chunk.join(" · ")))
        .collect()
}

fn push_if_any(
    sections: &mut Vec<Section>,
    title: &str,
    layout: SectionLayout,
    items: Vec<LineItem>,
) {
    if !items.is_empty() {
        sections.push(Section {
            title: title.to_string(),
            layout,
            items,
        });
    }
}
