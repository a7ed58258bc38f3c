//! Template composer — answers without a generative model.
//!
//! The query is classified into an [`Intent`] by the first keyword match in a
//! fixed, ordered table. Each intent draws on certain document categories; if
//! none of those documents scored well enough, a sentence is built straight
//! from profile fields instead.

use crate::documents::Category;
use crate::ranker::ScoredDocument;
use folio_core::profile::Profile;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};

/// What the visitor is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Introduction,
    Contact,
    Skills,
    Projects,
    Experience,
    Education,
    Location,
    CurrentFocus,
    Leadership,
    Hobbies,
    Other,
}

/// Evaluated in order; the first intent with a matching keyword wins.
const INTENTS: &[(Intent, &[&str])] = &[
    (
        Intent::Introduction,
        &["who are you", "tell me about yourself", "about you", "introduce yourself"],
    ),
    (Intent::Contact, &["contact", "email", "reach"]),
    (Intent::Skills, &["skill", "know", "capable"]),
    (Intent::Projects, &["project", "portfolio", "built"]),
    (Intent::Experience, &["experience", "work", "job"]),
    (Intent::Education, &["education", "degree", "study"]),
    (Intent::Location, &["location", "where", "based"]),
    (Intent::CurrentFocus, &["focus", "current", "working on"]),
    (Intent::Leadership, &["lead", "manage", "mentor"]),
    (
        Intent::Hobbies,
        &["hobby", "hobbies", "free time", "for fun", "interests"],
    ),
];

impl Intent {
    /// Classify a query. Matching is case-insensitive.
    pub fn classify(query: &str) -> Self {
        let lower = query.to_lowercase();
        INTENTS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map_or(Self::Other, |(intent, _)| *intent)
    }

    /// Document categories this intent answers from.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Self::Introduction => &[Category::Basics],
            Self::Contact => &[Category::Contact],
            Self::Skills => &[Category::Skills],
            Self::Projects => &[Category::Project],
            Self::Experience | Self::Leadership => &[Category::Experience],
            Self::Education => &[Category::Education],
            Self::Hobbies => &[Category::Language],
            Self::Location | Self::CurrentFocus | Self::Other => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::Contact => "contact",
            Self::Skills => "skills",
            Self::Projects => "projects",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Location => "location",
            Self::CurrentFocus => "current_focus",
            Self::Leadership => "leadership",
            Self::Hobbies => "hobbies",
            Self::Other => "other",
        }
    }
}

pub const STARTERS: &[&str] = &[
    "Great question!",
    "Happy to share.",
    "Sure thing.",
    "Glad you asked.",
];

pub const PERSONAL_TOUCHES: &[&str] = &[
    "Feel free to ask me anything else!",
    "Let me know if you'd like more detail.",
    "I'm always happy to talk more about it.",
];

/// Chooses optional decorative phrases.
///
/// Returning `None` means "no phrase this time".
pub trait PhrasePicker: Send + Sync {
    fn pick(&self, pool: &'static [&'static str]) -> Option<&'static str>;
}

/// Never decorates. Makes template output fully deterministic.
pub struct NoPhrases;

impl PhrasePicker for NoPhrases {
    fn pick(&self, _pool: &'static [&'static str]) -> Option<&'static str> {
        None
    }
}

/// Picks a phrase half of the time, uniformly from the pool.
pub struct RandomPhrases {
    rng: Mutex<StdRng>,
}

impl RandomPhrases {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Seeded, for reproducible output.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Default for RandomPhrases {
    fn default() -> Self {
        Self::new()
    }
}

impl PhrasePicker for RandomPhrases {
    fn pick(&self, pool: &'static [&'static str]) -> Option<&'static str> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if !rng.random_bool(0.5) {
            return None;
        }
        pool.choose(&mut *rng).copied()
    }
}

/// Composes answers from ranked documents and profile fields.
pub struct TemplateComposer {
    min_score: f32,
    personal_touches: bool,
    picker: Arc<dyn PhrasePicker>,
}

impl TemplateComposer {
    pub fn new(min_score: f32, personal_touches: bool, picker: Arc<dyn PhrasePicker>) -> Self {
        Self {
            min_score,
            personal_touches,
            picker,
        }
    }

    /// Answer `query` from `scored` (ranked, best first) and `profile`.
    pub fn compose(&self, query: &str, scored: &[ScoredDocument], profile: &Profile) -> String {
        let intent = Intent::classify(query);
        tracing::debug!(intent = intent.as_str(), "Template intent");

        let body = match intent {
            Intent::Other => {
                let top: Vec<&str> = scored
                    .iter()
                    .take(2)
                    .map(|s| s.document.content.as_str())
                    .collect();
                if top.is_empty() {
                    structural(Intent::Introduction, profile)
                } else {
                    top.join("\n\n")
                }
            }
            _ => {
                let categories = intent.categories();
                let matched: Vec<&str> = scored
                    .iter()
                    .filter(|s| categories.contains(&s.document.category))
                    .filter(|s| s.score >= self.min_score)
                    .take(3)
                    .map(|s| s.document.content.as_str())
                    .collect();
                if matched.is_empty() {
                    structural(intent, profile)
                } else {
                    matched.join("\n\n")
                }
            }
        };

        let mut response = contract(&body);
        if self.personal_touches {
            if let Some(starter) = self.picker.pick(STARTERS) {
                response = format!("{starter} {response}");
            }
            if let Some(touch) = self.picker.pick(PERSONAL_TOUCHES) {
                response = format!("{response} {touch}");
            }
        }
        response
    }
}

/// An answer built from profile fields alone.
fn structural(intent: Intent, profile: &Profile) -> String {
    let b = &profile.basics;
    let top_skills = |n: usize| profile.all_skills().take(n).collect::<Vec<_>>().join(", ");

    match intent {
        Intent::Introduction | Intent::Other => format!(
            "I am {}, a {} based in {}. {}",
            b.name, b.title, b.location, b.bio
        ),
        Intent::Contact => format!(
            "You can contact me at {}. You can also find me on GitHub at {} and LinkedIn at {}.",
            b.email, b.github, b.linkedin
        ),
        Intent::Skills => {
            if profile.skills.is_empty() {
                format!("As a {}, I am always picking up new skills.", b.title)
            } else {
                format!("My key skills include {} and more.", top_skills(5))
            }
        }
        Intent::Projects => {
            if profile.projects.is_empty() {
                "I am working on some new projects right now.".to_string()
            } else {
                let titles: Vec<&str> = profile
                    .projects
                    .iter()
                    .take(3)
                    .map(|p| p.title.as_str())
                    .collect();
                format!(
                    "I have worked on various projects including {} and others.",
                    titles.join(", ")
                )
            }
        }
        Intent::Experience => match profile.experience.first() {
            Some(current) => format!(
                "I currently work as a {} at {}. I have experience in {} and other technologies.",
                current.position,
                current.company,
                top_skills(3)
            ),
            None => format!("I work as a {} based in {}.", b.title, b.location),
        },
        Intent::Education => match profile.education.first() {
            Some(edu) => format!("I studied {} at {}.", edu.degree, edu.institution),
            None => "I continue to learn through practical experience and self-study.".to_string(),
        },
        Intent::Location => format!("I am based in {}.", b.location),
        Intent::CurrentFocus => match profile.experience.first() {
            Some(current) => format!(
                "I am currently focused on my work as {} at {}. My work involves using {} and other technologies.",
                current.position,
                current.company,
                top_skills(3)
            ),
            None => format!("I am currently focused on my work as a {}.", b.title),
        },
        Intent::Leadership => format!(
            "As a {}, I enjoy collaborating with my team and helping others grow.",
            b.title
        ),
        Intent::Hobbies => {
            if profile.languages.is_empty() {
                "Outside of work, I love exploring new technologies and building side projects."
                    .to_string()
            } else {
                let names: Vec<&str> = profile.languages.iter().map(|l| l.name.as_str()).collect();
                format!(
                    "Outside of work, I enjoy languages and speak {}.",
                    names.join(", ")
                )
            }
        }
    }
}

const CONTRACTIONS: &[(&str, &str)] = &[
    ("I am", "I'm"),
    ("I have", "I've"),
    ("I will", "I'll"),
    ("I would", "I'd"),
    ("do not", "don't"),
    ("Do not", "Don't"),
    ("it is", "it's"),
    ("It is", "It's"),
];

/// Rewrite common phrases into contractions, whole words only.
pub fn contract(text: &str) -> String {
    CONTRACTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| {
            replace_words(&acc, from, to)
        })
}

fn replace_words(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(from) {
        let before = rest[..pos].chars().next_back();
        let after = rest[pos + from.len()..].chars().next();
        let bounded = !before.is_some_and(char::is_alphanumeric)
            && !after.is_some_and(char::is_alphanumeric);
        out.push_str(&rest[..pos]);
        out.push_str(if bounded { to } else { from });
        rest = &rest[pos + from.len()..];
    }
    out.push_str(rest);
    out
}
