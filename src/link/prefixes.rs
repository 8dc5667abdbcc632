//! Interwiki prefix tables
//!
//! Link prefixes are either language codes (`en:`) or project aliases
//! (`b:`, `wikibooks:`). Only the small fixed set below is recognized; any
//! other leading segment belongs to the title (e.g. `Help:` or `Template:`).

/// Language codes recognized as link prefixes
const LANGUAGES: &[&str] = &["pl", "en", "de", "es", "fr", "it"];

/// Project aliases and the project segment of the host they resolve to
const PROJECTS: &[(&str, &str)] = &[
    ("w", "wikipedia"),
    ("b", "wikibooks"),
    ("c", "commons.wikimedia"),
    ("wikt", "wiktionary"),
    ("s", "wikisource"),
    ("q", "wikiquote"),
    ("species", "wikispecies"),
    ("voy", "wikivoyage"),
    ("v", "wikiversity"),
    ("wikipedia", "wikipedia"),
    ("wikibooks", "wikibooks"),
    ("commons", "commons.wikimedia"),
    ("wiktionary", "wiktionary"),
    ("wikisource", "wikisource"),
    ("wikiquote", "wikiquote"),
    ("wikispecies", "wikispecies"),
    ("wikivoyage", "wikivoyage"),
    ("wikiversity", "wikiversity"),
];

/// Returns true if `segment` is a recognized language prefix
pub fn is_language(segment: &str) -> bool {
    LANGUAGES.contains(&segment)
}

/// Resolves a project alias to its canonical project name
pub fn project(segment: &str) -> Option<&'static str> {
    PROJECTS
        .iter()
        .find(|(alias, _)| *alias == segment)
        .map(|(_, name)| *name)
}
