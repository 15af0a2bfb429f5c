use std::io::{self, Write};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Minimum skim score before a near-miss is offered as a suggestion.
const MATCH_THRESHOLD: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    Exact { id: i64, title: String },
    Suggestion { id: i64, title: String },
    None,
}

/// Match a user-typed title against existing task titles: exact
/// (case-insensitive) first, otherwise the best fuzzy candidate above
/// the threshold.
pub fn find_best_match(input: &str, candidates: &[(i64, String)]) -> TitleMatch {
    if let Some((id, title)) = candidates
        .iter()
        .find(|(_, title)| title.eq_ignore_ascii_case(input))
    {
        return TitleMatch::Exact {
            id: *id,
            title: title.clone(),
        };
    }

    let matcher = SkimMatcherV2::default();
    let best = candidates
        .iter()
        .filter_map(|(id, title)| {
            matcher
                .fuzzy_match(title, input)
                .map(|score| (score, *id, title))
        })
        .max_by_key(|(score, _, _)| *score);

    match best {
        Some((score, id, title)) if score >= MATCH_THRESHOLD => TitleMatch::Suggestion {
            id,
            title: title.clone(),
        },
        _ => TitleMatch::None,
    }
}

fn ask_user_confirmation(input_name: &str, suggested_name: &str) -> bool {
    print!(
        "'{}' not found. Did you mean '{}'? (y/n): ",
        input_name, suggested_name
    );
    io::stdout().flush().unwrap();

    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes"
}

/// Resolve a typed title to an id, prompting before accepting a fuzzy
/// suggestion. Returns None when nothing matches or the user declines
/// the suggestion.
pub fn resolve_title(input: &str, candidates: &[(i64, String)]) -> Option<(i64, String)> {
    match find_best_match(input, candidates) {
        TitleMatch::Exact { id, title } => Some((id, title)),
        TitleMatch::Suggestion { id, title } => {
            if ask_user_confirmation(input, &title) {
                Some((id, title))
            } else {
                println!("Operation cancelled.");
                None
            }
        }
        TitleMatch::None => None,
    }
}
