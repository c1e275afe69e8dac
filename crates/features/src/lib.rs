//! Match-signal extraction for app identity resolution.
//!
//! Provides pure functions for comparing a lookup query against a store
//! listing:
//! - Title fuzzy equality (exact, suffix-boundary, delimiter segments)
//! - Category compatibility via an explicit taxonomy table
//! - Description similarity from tagline tokens
//! - Developer name similarity

/// Stop-words excluded from tagline tokenization.
const TAGLINE_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "your", "app", "best", "free", "new", "get", "all",
];

/// Additional stop-words when building search keywords (not scoring).
const KEYWORD_STOP_WORDS: &[&str] = &["powered", "based"];

/// Delimiters that split a listing title into segments, e.g.
/// "Notion: Notes & Docs" or "Slack - Team Communication".
/// Each must be followed by whitespace to count as a segment break.
const TITLE_DELIMITERS: &[char] = &[':', '-', '—', '–', '|'];

fn normalize(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

/// Split a normalized title into segments on delimiter-plus-whitespace.
fn title_segments(title: &str) -> Vec<String> {
    let chars: Vec<char> = title.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next_is_space = chars.get(i + 1).is_some_and(|n| n.is_whitespace());
        if TITLE_DELIMITERS.contains(&c) && next_is_space {
            segments.push(current.trim().to_string());
            current = String::new();
            i += 2;
        } else {
            current.push(c);
            i += 1;
        }
    }
    segments.push(current.trim().to_string());
    segments.retain(|s| !s.is_empty());
    segments
}

/// True when `prefix` starts `text` and ends at a letter boundary, so
/// "binance" matches "binance.us" but not "binancer".
fn prefix_at_boundary(text: &str, prefix: &str) -> bool {
    if !text.starts_with(prefix) {
        return false;
    }
    match text[prefix.len()..].chars().next() {
        None => true,
        Some(c) => !c.is_alphabetic(),
    }
}

/// Robust fuzzy-equality test between the searched name and an actual
/// listing title. A candidate failing every variant is dropped before
/// scoring.
pub fn title_matches(searched: &str, actual: &str) -> bool {
    if searched.trim().is_empty() || actual.trim().is_empty() {
        return false;
    }

    let s = normalize(searched);
    let a = normalize(actual);

    // 1. Exact match after normalization
    if s == a {
        return true;
    }

    // 2. Actual is the searched name plus a non-letter suffix ("Binance.US")
    if prefix_at_boundary(&a, &s) {
        return true;
    }

    // 3. Shared segment after splitting on title delimiters:
    //    "Name: Subtitle" matches a search for "Name" and vice versa
    let s_parts = title_segments(&s);
    let a_parts = title_segments(&a);
    if let Some(first) = s_parts.first() {
        if a_parts.iter().any(|p| p == first) {
            return true;
        }
    }
    if let Some(first) = a_parts.first() {
        if s_parts.iter().any(|p| p == first) {
            return true;
        }
    }

    // 4. First segment of the actual title starts with the searched name at
    //    a letter boundary ("Binance.US: Buy Bitcoin" for "Binance")
    if let Some(first) = a_parts.first() {
        if prefix_at_boundary(first, &s) {
            return true;
        }
    }

    false
}

/// One row of the query-taxonomy -> platform-taxonomy category table.
struct CategoryMapping {
    query: &'static str,
    app_store: &'static [&'static str],
    play: &'static [&'static str],
}

/// Enumerated category compatibility table. Keys are the query taxonomy;
/// values are the categories each platform may report for that key.
const CATEGORY_MAP: &[CategoryMapping] = &[
    CategoryMapping { query: "ai", app_store: &["developer tools", "productivity"], play: &["tools", "productivity"] },
    CategoryMapping { query: "business", app_store: &["business"], play: &["business"] },
    CategoryMapping { query: "collaboration", app_store: &["productivity"], play: &["productivity", "communication"] },
    CategoryMapping { query: "communication", app_store: &["social networking"], play: &["communication"] },
    CategoryMapping { query: "crm", app_store: &["business"], play: &["business"] },
    CategoryMapping { query: "crypto & web3", app_store: &["finance"], play: &["finance"] },
    CategoryMapping { query: "developer tools", app_store: &["developer tools"], play: &["tools"] },
    CategoryMapping { query: "education", app_store: &["education"], play: &["education", "libraries & demo"] },
    CategoryMapping { query: "entertainment", app_store: &["entertainment"], play: &["entertainment", "events"] },
    CategoryMapping { query: "finance", app_store: &["finance"], play: &["finance"] },
    CategoryMapping { query: "food & drink", app_store: &["food & drink"], play: &["food & drink"] },
    CategoryMapping { query: "graphics & design", app_store: &["graphics & design"], play: &["art & design"] },
    CategoryMapping { query: "health & fitness", app_store: &["health & fitness"], play: &["health & fitness"] },
    CategoryMapping { query: "jobs & recruitment", app_store: &["business"], play: &["business"] },
    CategoryMapping { query: "lifestyle", app_store: &["lifestyle"], play: &["lifestyle", "beauty", "dating", "parenting", "personalization"] },
    CategoryMapping { query: "medical", app_store: &["medical"], play: &["medical"] },
    CategoryMapping { query: "music & audio", app_store: &["music"], play: &["music & audio"] },
    CategoryMapping { query: "maps & navigation", app_store: &["navigation"], play: &["maps & navigation"] },
    CategoryMapping { query: "news", app_store: &["news", "magazines & newspapers"], play: &["news & magazines", "comics"] },
    CategoryMapping { query: "photo & video", app_store: &["photo & video"], play: &["photography", "video players & editors"] },
    CategoryMapping { query: "productivity", app_store: &["productivity"], play: &["productivity"] },
    CategoryMapping { query: "real estate", app_store: &["business"], play: &["house & home"] },
    CategoryMapping { query: "reference", app_store: &["reference", "books"], play: &["books & reference"] },
    CategoryMapping { query: "shopping", app_store: &["shopping"], play: &["shopping"] },
    CategoryMapping { query: "social networking", app_store: &["social networking"], play: &["social"] },
    CategoryMapping { query: "sports", app_store: &["sports"], play: &["sports"] },
    CategoryMapping { query: "travel & transportation", app_store: &["travel"], play: &["travel & local", "auto & vehicles"] },
    CategoryMapping { query: "utilities", app_store: &["utilities", "weather"], play: &["tools", "weather"] },
];

/// Store platform selector for the category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTaxonomy {
    AppStore,
    Play,
}

fn category_tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '&' || c == '/')
        .filter(|w| w.len() >= 3)
        .collect()
}

/// Category compatibility between the query taxonomy and a store category.
///
/// - No query category: accept unconditionally.
/// - Query category but no store category: reject (cannot safely confirm).
/// - Table hit: store category must equal or contain/be contained by one of
///   the allowed entries.
/// - Table miss: fall back to a shared 4-character token prefix, which
///   handles pairs like Finance/Financial.
pub fn category_matches(
    query_category: Option<&str>,
    store_category: Option<&str>,
    taxonomy: StoreTaxonomy,
) -> bool {
    let Some(query_category) = query_category else {
        return true;
    };
    let Some(store_category) = store_category else {
        return false;
    };

    let query_key = normalize(query_category);
    let store_value = normalize(store_category);

    if let Some(mapping) = CATEGORY_MAP.iter().find(|m| m.query == query_key) {
        let allowed = match taxonomy {
            StoreTaxonomy::AppStore => mapping.app_store,
            StoreTaxonomy::Play => mapping.play,
        };
        return allowed.iter().any(|candidate| {
            store_value == *candidate
                || store_value.contains(candidate)
                || candidate.contains(store_value.as_str())
        });
    }

    // Unmapped query category: shared token prefix of up to 4 chars
    for query_word in category_tokens(&query_key) {
        for store_word in category_tokens(&store_value) {
            let overlap = query_word.len().min(store_word.len()).min(4);
            if query_word.is_char_boundary(overlap)
                && store_word.is_char_boundary(overlap)
                && query_word[..overlap] == store_word[..overlap]
            {
                return true;
            }
        }
    }

    false
}

fn tagline_tokens(tagline: &str) -> Vec<String> {
    tagline
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !TAGLINE_STOP_WORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// Fraction of tagline tokens present as substrings of the listing
/// description, in [0, 1]. Returns 0 when either input is missing.
pub fn description_score(tagline: Option<&str>, description: &str) -> f64 {
    let Some(tagline) = tagline else {
        return 0.0;
    };
    if description.is_empty() {
        return 0.0;
    }

    let tokens = tagline_tokens(tagline);
    if tokens.is_empty() {
        return 0.0;
    }

    let haystack = description.to_lowercase();
    let matched = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
    matched as f64 / tokens.len() as f64
}

/// Developer name similarity: exact or containment either way scores 1.0
/// ("Google LLC" vs "Google"), a shared significant token scores 0.9
/// ("Meta Platforms, Inc." vs "Meta"), anything else 0.
pub fn developer_score(hint: Option<&str>, developer: &str) -> f64 {
    let Some(hint) = hint else {
        return 0.0;
    };
    if hint.trim().is_empty() || developer.trim().is_empty() {
        return 0.0;
    }

    let h = normalize(hint);
    let d = normalize(developer);

    if h == d {
        return 1.0;
    }
    if h.contains(&d) || d.contains(&h) {
        return 1.0;
    }

    let h_words: Vec<&str> = h.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 2).collect();
    let d_words: Vec<&str> = d.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 2).collect();
    if h_words.iter().any(|w| d_words.contains(w)) {
        return 0.9;
    }

    0.0
}

/// Extract up to `max_words` significant keywords from a tagline, for
/// augmenting a store search query with context ("Craft" alone is too
/// generic to surface the right listing).
pub fn tagline_keywords(tagline: &str, max_words: usize) -> String {
    tagline
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| {
            w.len() > 2 && !TAGLINE_STOP_WORDS.contains(w) && !KEYWORD_STOP_WORDS.contains(w)
        })
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
