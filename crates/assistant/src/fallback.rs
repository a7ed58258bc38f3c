//! Keyword search over the profile, used when retrieval is unavailable.

use folio_core::profile::Profile;

/// Answer by case-insensitive keyword matching. Never fails.
///
/// Every matching rule contributes its lines; the results are joined by
/// blank lines. With no match, a generic introduction is returned.
pub fn fallback_search(query: &str, profile: &Profile) -> String {
    let q = query.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| q.contains(w));
    let b = &profile.basics;
    let mut results: Vec<String> = Vec::new();

    if has(&["name", "who"]) {
        results.push(format!("{} is a {} based in {}.", b.name, b.title, b.location));
    }

    if has(&["about", "bio"]) {
        results.push(b.bio.clone());
    }

    if has(&["skill", "know"]) {
        results.extend(
            profile
                .skills
                .iter()
                .map(|c| format!("{} skills: {}", c.category, c.items.join(", "))),
        );
    }

    if has(&["project", "work", "built"]) {
        results.extend(profile.projects.iter().map(|p| {
            format!(
                "{}: {} (Technologies: {})",
                p.title,
                p.description,
                p.technologies.join(", ")
            )
        }));
    }

    if has(&["experience", "job"]) {
        results.extend(profile.experience.iter().map(|e| {
            format!(
                "{} at {} ({}): {}",
                e.position, e.company, e.duration, e.description
            )
        }));
    }

    if has(&["education", "study", "degree"]) {
        results.extend(
            profile
                .education
                .iter()
                .map(|e| format!("{} from {} ({})", e.degree, e.institution, e.duration)),
        );
    }

    if has(&["how many years", "experience in"]) {
        let technology = profile
            .all_skills()
            .filter(|s| !s.trim().is_empty())
            .find(|s| q.contains(&s.to_lowercase()));
        if let Some(technology) = technology {
            results.push(format!(
                "I have several years of experience with {technology} as part of my work as a {}.",
                b.title
            ));
        }
    }

    if results.is_empty() {
        return format!(
            "I'm an AI assistant for {}. You can ask me about their skills, projects, experience, education, or contact information.",
            b.name
        );
    }

    results.join("\n\n")
}
