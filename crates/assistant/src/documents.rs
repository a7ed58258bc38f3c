//! Profile documents: the retrieval corpus.
//!
//! The profile is flattened into one short first-person document per fact
//! group. The mapping is total (every array element yields exactly one
//! document) and deterministic, so documents are rebuilt on demand rather
//! than stored.

use folio_core::profile::Profile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The profile section a document was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Basics,
    Contact,
    Skills,
    Project,
    Experience,
    Education,
    Certification,
    Honor,
    Language,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basics => "basics",
            Self::Contact => "contact",
            Self::Skills => "skills",
            Self::Project => "project",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Certification => "certification",
            Self::Honor => "honor",
            Self::Language => "language",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of retrievable text derived from the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Stable slug, unique within one build
    pub id: String,
    pub category: Category,
    /// Natural key of the source entry (skill category, project title, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub content: String,
}

impl ProfileDocument {
    /// Page anchor for the section this document came from.
    pub fn anchor(&self) -> String {
        format!("#{}", self.id)
    }

    /// The text that gets embedded for ranking.
    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.category, self.content)
    }
}

/// Flatten a profile into its document set, in profile order.
pub fn build_documents(profile: &Profile) -> Vec<ProfileDocument> {
    let mut builder = DocumentBuilder::default();
    let b = &profile.basics;

    builder.push(
        "basics",
        Category::Basics,
        None,
        format!(
            "My name is {}. I am a {} based in {}. {}",
            b.name, b.title, b.location, b.bio
        ),
    );
    builder.push(
        "contact",
        Category::Contact,
        None,
        format!(
            "You can contact me at {}. My GitHub is {} and LinkedIn is {}.",
            b.email, b.github, b.linkedin
        ),
    );

    for skill in &profile.skills {
        builder.push(
            &format!("skills-{}", skill.category),
            Category::Skills,
            Some(&skill.category),
            format!(
                "In {}, I am skilled in: {}",
                skill.category,
                skill.items.join(", ")
            ),
        );
    }

    for project in &profile.projects {
        builder.push(
            &format!("project-{}", project.title),
            Category::Project,
            Some(&project.title),
            format!(
                "{}: {} (Technologies used: {})",
                project.title,
                project.description,
                project.technologies.join(", ")
            ),
        );
    }

    for exp in &profile.experience {
        builder.push(
            &format!("experience-{}", exp.company),
            Category::Experience,
            Some(&exp.company),
            format!(
                "{} at {} ({}): {}",
                exp.position, exp.company, exp.duration, exp.description
            ),
        );
    }

    for edu in &profile.education {
        builder.push(
            &format!("education-{}", edu.institution),
            Category::Education,
            Some(&edu.institution),
            format!("{} from {} ({})", edu.degree, edu.institution, edu.duration),
        );
    }

    for cert in &profile.certifications {
        builder.push(
            &format!("certification-{cert}"),
            Category::Certification,
            Some(cert),
            format!("I hold the {cert} certification."),
        );
    }

    for honor in &profile.honors {
        builder.push(
            &format!("honor-{honor}"),
            Category::Honor,
            Some(honor),
            format!("One of my honors: {honor}."),
        );
    }

    for lang in &profile.languages {
        let content = if lang.level.trim().is_empty() {
            format!("I speak {}.", lang.name)
        } else {
            format!("I speak {} ({}).", lang.name, lang.level)
        };
        builder.push(
            &format!("language-{}", lang.name),
            Category::Language,
            Some(&lang.name),
            content,
        );
    }

    builder.documents
}

#[derive(Default)]
struct DocumentBuilder {
    documents: Vec<ProfileDocument>,
    used: HashSet<String>,
}

impl DocumentBuilder {
    fn push(&mut self, key: &str, category: Category, label: Option<&str>, content: String) {
        let id = self.unique_id(slug(key));
        self.documents.push(ProfileDocument {
            id,
            category,
            label: label.map(str::to_string),
            content,
        });
    }

    fn unique_id(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes one `-`.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}
