//! Curated questions to ask at a company booth.

use std::fmt;
use std::str::FromStr;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::error::Error;

/// Topic a booth question belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Culture,
    Technical,
    Growth,
    Environment,
    Hiring,
    Benefits,
    Impact,
}

impl Theme {
    pub const ALL: [Self; 7] = [
        Self::Culture,
        Self::Technical,
        Self::Growth,
        Self::Environment,
        Self::Hiring,
        Self::Benefits,
        Self::Impact,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Culture => "culture",
            Self::Technical => "technical",
            Self::Growth => "growth",
            Self::Environment => "environment",
            Self::Hiring => "hiring",
            Self::Benefits => "benefits",
            Self::Impact => "impact",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown question theme: {s}")))
    }
}

const QUESTIONS: &[(Theme, &str)] = &[
    (Theme::Culture, "How would you describe the company culture?"),
    (Theme::Culture, "What do people on the team enjoy most about working here?"),
    (Theme::Culture, "How does the company support work-life balance?"),
    (Theme::Culture, "What sets you apart from similar companies?"),
    (Theme::Culture, "What do you value most in the people you hire?"),
    (Theme::Technical, "What does your tech stack look like?"),
    (Theme::Technical, "How do you approach code review and testing?"),
    (Theme::Technical, "How do you keep technical debt under control?"),
    (Theme::Technical, "How often do you ship to production?"),
    (Theme::Technical, "Which development process do teams follow?"),
    (Theme::Growth, "What does career progression look like for this role?"),
    (Theme::Growth, "Is there a mentorship program?"),
    (Theme::Growth, "Is there a learning budget or time set aside for it?"),
    (Theme::Growth, "Where have people in this role moved on to internally?"),
    (Theme::Environment, "Can the role be done remotely?"),
    (Theme::Environment, "How big is the team I would join?"),
    (Theme::Environment, "What does a typical day look like?"),
    (Theme::Environment, "How do teams work together across locations?"),
    (Theme::Hiring, "What are the stages of your interview process?"),
    (Theme::Hiring, "What makes a candidate stand out to you?"),
    (Theme::Hiring, "What is the hiring timeline for this position?"),
    (Theme::Hiring, "What should I do next if I am interested?"),
    (Theme::Benefits, "Which benefits come with the position?"),
    (Theme::Benefits, "Is equity part of the offer?"),
    (Theme::Benefits, "How much paid time off do employees get?"),
    (Theme::Benefits, "Do you help with relocation?"),
    (Theme::Benefits, "What salary range do you have in mind for this role?"),
    (Theme::Impact, "Which projects would a new hire work on first?"),
    (Theme::Impact, "What is the hardest problem the team is facing right now?"),
    (Theme::Impact, "How is success measured in this role?"),
    (Theme::Impact, "What would a great first six months look like?"),
    (Theme::Impact, "What are the company's goals for this year?"),
];

/// Every question, optionally limited to one theme
pub fn questions(theme: Option<Theme>) -> Vec<&'static str> {
    QUESTIONS
        .iter()
        .filter(|(question_theme, _)| theme.is_none_or(|theme| theme == *question_theme))
        .map(|(_, question)| *question)
        .collect()
}

/// Up to `count` distinct questions in random order
pub fn random_questions(count: usize, theme: Option<Theme>) -> Vec<&'static str> {
    random_questions_with(&mut rand::rng(), count, theme)
}

pub fn random_questions_with<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    theme: Option<Theme>,
) -> Vec<&'static str> {
    questions(theme)
        .choose_multiple(rng, count)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn every_theme_has_questions() {
        for theme in Theme::ALL {
            assert!(!questions(Some(theme)).is_empty(), "{theme} is empty");
        }
        assert_eq!(questions(None).len(), QUESTIONS.len());
    }

    #[test]
    fn random_questions_come_from_the_theme() {
        let mut rng = StdRng::seed_from_u64(7);
        let hiring = questions(Some(Theme::Hiring));
        for question in random_questions_with(&mut rng, 2, Some(Theme::Hiring)) {
            assert!(hiring.contains(&question));
        }
    }

    #[test]
    fn random_questions_are_distinct() {
        let mut rng = StdRng::seed_from_u64(42);
        let picked = random_questions_with(&mut rng, 5, None);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(picked.len(), 5);
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn random_questions_clamp_to_theme_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let available = questions(Some(Theme::Growth)).len();
        let picked = random_questions_with(&mut rng, 100, Some(Theme::Growth));
        assert_eq!(picked.len(), available);
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("Hiring".parse::<Theme>().unwrap(), Theme::Hiring);
        assert!("snacks".parse::<Theme>().is_err());
    }
}
