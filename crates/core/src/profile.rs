//! Profile — the static, structured document the assistant answers about.
//!
//! Loaded once at startup from JSON and validated eagerly so that a missing
//! field fails fast instead of silently producing partial documents later.

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full profile of the portfolio owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub basics: Basics,
    pub skills: Vec<SkillCategory>,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub honors: Vec<String>,
    #[serde(default)]
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basics {
    pub name: String,
    pub title: String,
    pub location: String,
    pub bio: String,
    pub email: String,
    pub github: String,
    pub linkedin: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub level: String,
}

impl Profile {
    /// Load and validate a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = std::fs::read_to_string(path).map_err(|e| ProfileError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let profile = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            name = %profile.basics.name,
            projects = profile.projects.len(),
            "Profile loaded"
        );
        Ok(profile)
    }

    /// Parse and validate a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profile: Self =
            serde_json::from_str(json).map_err(|e| ProfileError::Parse(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check that every natural key and required text field is present.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let b = &self.basics;
        require("basics.name", &b.name)?;
        require("basics.title", &b.title)?;
        require("basics.location", &b.location)?;
        require("basics.bio", &b.bio)?;
        require("basics.email", &b.email)?;
        require("basics.github", &b.github)?;
        require("basics.linkedin", &b.linkedin)?;

        for (i, skill) in self.skills.iter().enumerate() {
            require(&format!("skills[{i}].category"), &skill.category)?;
        }
        for (i, project) in self.projects.iter().enumerate() {
            require(&format!("projects[{i}].title"), &project.title)?;
            require(&format!("projects[{i}].description"), &project.description)?;
        }
        for (i, exp) in self.experience.iter().enumerate() {
            require(&format!("experience[{i}].company"), &exp.company)?;
            require(&format!("experience[{i}].position"), &exp.position)?;
        }
        for (i, edu) in self.education.iter().enumerate() {
            require(&format!("education[{i}].degree"), &edu.degree)?;
            require(&format!("education[{i}].institution"), &edu.institution)?;
        }
        for (i, cert) in self.certifications.iter().enumerate() {
            require(&format!("certifications[{i}]"), cert)?;
        }
        for (i, honor) in self.honors.iter().enumerate() {
            require(&format!("honors[{i}]"), honor)?;
        }
        for (i, lang) in self.languages.iter().enumerate() {
            require(&format!("languages[{i}].name"), &lang.name)?;
        }
        Ok(())
    }

    /// Every skill item across all categories, in profile order.
    pub fn all_skills(&self) -> impl Iterator<Item = &str> {
        self.skills
            .iter()
            .flat_map(|c| c.items.iter().map(String::as_str))
    }
}

fn require(field: &str, value: &str) -> Result<(), ProfileError> {
    if value.trim().is_empty() {
        return Err(ProfileError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "basics": {
            "name": "Ada Lovelace",
            "title": "Software Engineer",
            "location": "London",
            "bio": "I write programs for the Analytical Engine.",
            "email": "ada@example.com",
            "github": "https://github.com/ada",
            "linkedin": "https://linkedin.com/in/ada",
            "avatar": ""
        },
        "skills": [{"category": "Languages", "items": ["JavaScript", "Python"]}],
        "projects": [],
        "experience": [],
        "education": []
    }"#;

    #[test]
    fn parses_minimal_profile_with_defaults() {
        let profile = Profile::from_json(MINIMAL).unwrap();
        assert_eq!(profile.basics.name, "Ada Lovelace");
        assert!(profile.certifications.is_empty());
        assert!(profile.languages.is_empty());
        let skills: Vec<_> = profile.all_skills().collect();
        assert_eq!(skills, vec!["JavaScript", "Python"]);
    }

    #[test]
    fn empty_name_is_rejected() {
        let json = MINIMAL.replace("Ada Lovelace", " ");
        let err = Profile::from_json(&json).unwrap_err();
        match err {
            ProfileError::MissingField { field } => assert_eq!(field, "basics.name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_required_key_is_a_parse_error() {
        let json = MINIMAL.replace(r#""email": "ada@example.com","#, "");
        let err = Profile::from_json(&json).unwrap_err();
        assert!(matches!(err, ProfileError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, MINIMAL).unwrap();
        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.basics.email, "ada@example.com");
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = Profile::load(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/profile.json"));
    }
}
