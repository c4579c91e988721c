//! Vocabulary: static, read-mostly lookup structures shared read-only by all
//! filters. Loaded once at startup from plain-text files (one term per line,
//! case-insensitive) or from the compiled-in defaults.
//!
//! Name/city dictionaries carry two pre-built indexes: an exact case-folded
//! hash set for O(1) hits and a symmetric-deletion neighborhood for fuzzy
//! lookup, with a Jaro-Winkler post-check and a Double Metaphone fallback.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use rphonetic::{DoubleMetaphone, Encoder};

use crate::error::{RedactError, Result};

const MAX_EDIT_DISTANCE: usize = 2;
const MIN_JARO_WINKLER: f64 = 0.88;

/// How a fuzzy lookup matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchSource {
    Exact,
    Deletion,
    Phonetic,
}

/// A successful dictionary lookup.
#[derive(Clone, Debug)]
pub struct DictMatch {
    pub term: String,
    pub distance: usize,
    pub similarity: f64,
    pub source: MatchSource,
}

#[derive(Clone, Debug)]
struct DeletionEntry {
    term: String,
    distance: usize,
}

/// Exact + deletion-neighborhood + phonetic index over one term list.
#[derive(Debug)]
pub struct FuzzyIndex {
    exact: HashSet<String>,
    deletions: HashMap<String, Vec<DeletionEntry>>,
    phonetic: HashMap<String, Vec<String>>,
    min_term_len: usize,
}

impl FuzzyIndex {
    pub fn build(terms: impl IntoIterator<Item = String>, min_term_len: usize) -> Self {
        let mut index = FuzzyIndex {
            exact: HashSet::new(),
            deletions: HashMap::new(),
            phonetic: HashMap::new(),
            min_term_len,
        };

        let dm = DoubleMetaphone::default();
        for raw in terms {
            let term = raw.trim().to_lowercase();
            if term.len() < min_term_len {
                continue;
            }
            if !index.exact.insert(term.clone()) {
                continue;
            }

            for deletion in generate_deletions(&term, MAX_EDIT_DISTANCE, min_term_len) {
                index
                    .deletions
                    .entry(deletion.text)
                    .or_default()
                    .push(DeletionEntry {
                        term: term.clone(),
                        distance: deletion.distance,
                    });
            }

            let primary = dm.encode(&term);
            if !primary.is_empty() {
                index.phonetic.entry(primary.clone()).or_default().push(term.clone());
            }
            let secondary = dm.encode_alternate(&term);
            if !secondary.is_empty() && secondary != primary {
                index.phonetic.entry(secondary).or_default().push(term.clone());
            }
        }

        index
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Exact case-folded membership only.
    pub fn contains_exact(&self, query: &str) -> bool {
        self.exact.contains(query.trim().to_lowercase().as_str())
    }

    /// Full lookup: exact, then deletion neighborhood (edit distance <= 2,
    /// Jaro-Winkler >= 0.88), then phonetic fallback.
    pub fn lookup(&self, query: &str) -> Option<DictMatch> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }

        if self.exact.contains(&q) {
            return Some(DictMatch {
                term: q,
                distance: 0,
                similarity: 1.0,
                source: MatchSource::Exact,
            });
        }
        if q.len() < self.min_term_len {
            return None;
        }

        if let Some(best) = self.lookup_deletions(&q) {
            return Some(best);
        }
        self.lookup_phonetic(&q)
    }

    fn candidates(&self, q: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out: Vec<String> = Vec::new();
        let mut push = |term: &str, seen: &mut HashSet<String>, out: &mut Vec<String>| {
            if seen.insert(term.to_string()) {
                out.push(term.to_string());
            }
        };

        if let Some(direct) = self.deletions.get(q) {
            for entry in direct {
                push(&entry.term, &mut seen, &mut out);
            }
        }
        for del in generate_deletions(q, MAX_EDIT_DISTANCE, self.min_term_len) {
            // A deletion of the query may itself be a dictionary term, or may
            // collide with a dictionary term's own deletion neighborhood.
            if self.exact.contains(&del.text) {
                push(&del.text, &mut seen, &mut out);
            }
            if let Some(entries) = self.deletions.get(&del.text) {
                for entry in entries {
                    push(&entry.term, &mut seen, &mut out);
                }
            }
        }
        out
    }

    fn lookup_deletions(&self, q: &str) -> Option<DictMatch> {
        let mut best: Option<(String, usize)> = None;
        for term in self.candidates(q) {
            let distance = damerau_levenshtein(q, &term);
            if distance > MAX_EDIT_DISTANCE {
                continue;
            }
            match &best {
                Some((_, d)) if *d <= distance => {}
                _ => best = Some((term, distance)),
            }
        }
        let (term, distance) = best?;
        let similarity = jaro_winkler(q, &term);
        if similarity < MIN_JARO_WINKLER {
            return None;
        }
        Some(DictMatch {
            term,
            distance,
            similarity,
            source: MatchSource::Deletion,
        })
    }

    fn lookup_phonetic(&self, q: &str) -> Option<DictMatch> {
        let dm = DoubleMetaphone::default();
        let code = dm.encode(q);
        if code.is_empty() {
            return None;
        }
        let pool = self.phonetic.get(&code)?;

        let mut best: Option<(String, usize)> = None;
        for term in pool {
            let distance = damerau_levenshtein(q, term);
            match &best {
                Some((_, d)) if *d <= distance => {}
                _ => best = Some((term.clone(), distance)),
            }
        }
        let (term, distance) = best?;
        if distance > MAX_EDIT_DISTANCE + 1 {
            return None;
        }
        let similarity = jaro_winkler(q, &term) * 0.9;
        if similarity < MIN_JARO_WINKLER {
            return None;
        }
        Some(DictMatch {
            term,
            distance,
            similarity,
            source: MatchSource::Phonetic,
        })
    }
}

#[derive(Clone)]
struct DeletionText {
    text: String,
    distance: usize,
}

/// All deletions of `term` up to `max_distance` edits, SymSpell-style.
fn generate_deletions(term: &str, max_distance: usize, min_term_len: usize) -> Vec<DeletionText> {
    let floor = min_term_len.saturating_sub(max_distance).max(1);
    let mut out: Vec<DeletionText> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue = vec![DeletionText {
        text: term.to_string(),
        distance: 0,
    }];

    while let Some(current) = queue.pop() {
        if current.distance > 0 {
            out.push(current.clone());
        }
        if current.distance >= max_distance {
            continue;
        }
        let chars: Vec<char> = current.text.chars().collect();
        for i in 0..chars.len() {
            let deletion: String = chars[..i].iter().chain(chars[i + 1..].iter()).collect();
            if deletion.chars().count() >= floor && seen.insert(deletion.clone()) {
                queue.push(DeletionText {
                    text: deletion,
                    distance: current.distance + 1,
                });
            }
        }
    }

    out
}

/// Damerau-Levenshtein distance with transpositions and an early exit on
/// large length differences.
pub(crate) fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let diff = a.len().abs_diff(b.len());
    if diff > MAX_EDIT_DISTANCE {
        return diff;
    }

    let mut prev_prev = vec![0usize; b.len() + 1];
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                curr[j] = curr[j].min(prev_prev[j - 2] + cost);
            }
        }
        std::mem::swap(&mut prev_prev, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Jaro-Winkler similarity in [0, 1] with the standard 4-char prefix bonus.
pub(crate) fn jaro_winkler(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut b_taken = vec![false; b.len()];
    let mut a_matched: Vec<char> = Vec::with_capacity(a.len());
    for (i, &ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_taken[j] && b[j] == ca {
                b_taken[j] = true;
                a_matched.push(ca);
                break;
            }
        }
    }
    if a_matched.is_empty() {
        return 0.0;
    }

    let b_matched: Vec<char> = b
        .iter()
        .zip(b_taken.iter())
        .filter(|(_, &taken)| taken)
        .map(|(&c, _)| c)
        .collect();
    let transpositions = a_matched
        .iter()
        .zip(b_matched.iter())
        .filter(|(x, y)| x != y)
        .count() as f64
        / 2.0;

    let m = a_matched.len() as f64;
    let jaro =
        (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions) / m) / 3.0;
    let prefix = a
        .iter()
        .zip(b.iter())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count() as f64;
    jaro + prefix * 0.1 * (1.0 - jaro)
}

// =============================================================================
// Vocabulary
// =============================================================================

/// All startup-loaded term lists, shared immutably across the process.
#[derive(Debug)]
pub struct Vocabulary {
    pub first_names: FuzzyIndex,
    pub surnames: FuzzyIndex,
    pub cities: FuzzyIndex,
    pub states: HashSet<String>,
    pub field_labels: HashSet<String>,
    pub medical_phrases: HashSet<String>,
    pub structure_words: HashSet<String>,
    pub geographic_terms: HashSet<String>,
    pub section_headings: HashSet<String>,
}

fn fold_set(terms: &[&str]) -> HashSet<String> {
    terms.iter().map(|t| t.trim().to_lowercase()).collect()
}

fn read_terms(dir: &Path, file: &str) -> Result<Vec<String>> {
    let path = dir.join(file);
    let content = fs::read_to_string(&path).map_err(|e| RedactError::DictionaryLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect())
}

impl Vocabulary {
    /// Compiled-in defaults; used when no vocabulary directory is configured.
    pub fn builtin() -> Self {
        Vocabulary {
            first_names: FuzzyIndex::build(
                BUILTIN_FIRST_NAMES.iter().map(|s| s.to_string()),
                2,
            ),
            surnames: FuzzyIndex::build(BUILTIN_SURNAMES.iter().map(|s| s.to_string()), 2),
            cities: FuzzyIndex::build(BUILTIN_CITIES.iter().map(|s| s.to_string()), 3),
            states: fold_set(BUILTIN_STATES),
            field_labels: fold_set(BUILTIN_FIELD_LABELS),
            medical_phrases: fold_set(BUILTIN_MEDICAL_PHRASES),
            structure_words: fold_set(BUILTIN_STRUCTURE_WORDS),
            geographic_terms: fold_set(BUILTIN_GEO_TERMS),
            section_headings: fold_set(BUILTIN_SECTION_HEADINGS),
        }
    }

    /// Load every list from `dir`. Any missing or unreadable file is fatal
    /// here; runtime reloads go through [`Vocabulary::reload_dir`].
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let to_set = |terms: Vec<String>| -> HashSet<String> {
            terms.into_iter().map(|t| t.to_lowercase()).collect()
        };
        Ok(Vocabulary {
            first_names: FuzzyIndex::build(read_terms(dir, "first_names.txt")?, 2),
            surnames: FuzzyIndex::build(read_terms(dir, "surnames.txt")?, 2),
            cities: FuzzyIndex::build(read_terms(dir, "cities.txt")?, 3),
            states: to_set(read_terms(dir, "states.txt")?),
            field_labels: to_set(read_terms(dir, "field_labels.txt")?),
            medical_phrases: to_set(read_terms(dir, "medical_phrases.txt")?),
            structure_words: to_set(read_terms(dir, "structure_words.txt")?),
            geographic_terms: to_set(read_terms(dir, "geographic_terms.txt")?),
            section_headings: to_set(read_terms(dir, "section_headings.txt")?),
        })
    }

    /// Reload from `dir`, keeping the current tables if anything fails.
    pub fn reload_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        match Vocabulary::load_dir(dir) {
            Ok(fresh) => {
                *self = fresh;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "vocabulary reload failed, keeping previous tables");
                Err(e)
            }
        }
    }
}

// =============================================================================
// Compiled-in defaults
// =============================================================================

static BUILTIN_FIRST_NAMES: &[&str] = &[
    "james", "john", "robert", "michael", "william", "david", "richard", "joseph", "thomas",
    "charles", "christopher", "daniel", "matthew", "anthony", "mark", "donald", "steven", "paul",
    "andrew", "joshua", "kenneth", "kevin", "brian", "george", "timothy", "ronald", "edward",
    "jason", "jeffrey", "ryan", "jacob", "gary", "nicholas", "eric", "jonathan", "stephen",
    "larry", "justin", "scott", "brandon", "benjamin", "samuel", "gregory", "alexander", "frank",
    "patrick", "raymond", "jack", "dennis", "jerry", "tyler", "aaron", "jose", "adam", "nathan",
    "henry", "douglas", "zachary", "peter", "kyle", "ethan", "walter", "noah", "jeremy",
    "christian", "keith", "roger", "terry", "austin", "sean", "gerald", "carl", "harold", "mary",
    "patricia", "jennifer", "linda", "elizabeth", "barbara", "susan", "jessica", "sarah", "karen",
    "lisa", "nancy", "betty", "margaret", "sandra", "ashley", "kimberly", "emily", "donna",
    "michelle", "carol", "amanda", "dorothy", "melissa", "deborah", "stephanie", "rebecca",
    "sharon", "laura", "cynthia", "kathleen", "amy", "angela", "shirley", "anna", "brenda",
    "pamela", "emma", "nicole", "helen", "samantha", "katherine", "christine", "debra", "rachel",
    "carolyn", "janet", "catherine", "maria", "heather", "diane", "ruth", "julie", "olivia",
    "joyce", "virginia", "victoria", "kelly", "lauren", "christina", "joan", "evelyn", "judith",
    "megan", "andrea", "cheryl", "hannah", "jacqueline", "martha", "gloria", "teresa", "ann",
    "sara", "madison", "frances", "kathryn", "janice", "jean", "alice", "abigail", "julia",
    "judy", "sophia", "grace", "denise", "amber", "doris", "marilyn", "danielle", "beverly",
    "isabella", "theresa", "diana", "natalie", "brittany", "charlotte", "marie", "kayla",
    "alexis", "lori", "jose", "juan", "carlos", "luis", "miguel", "jorge", "pedro", "maria",
];

static BUILTIN_SURNAMES: &[&str] = &[
    "smith", "johnson", "williams", "brown", "jones", "garcia", "miller", "davis", "rodriguez",
    "martinez", "hernandez", "lopez", "gonzalez", "wilson", "anderson", "thomas", "taylor",
    "moore", "jackson", "martin", "lee", "perez", "thompson", "white", "harris", "sanchez",
    "clark", "ramirez", "lewis", "robinson", "walker", "young", "allen", "king", "wright",
    "scott", "torres", "nguyen", "hill", "flores", "green", "adams", "nelson", "baker", "hall",
    "rivera", "campbell", "mitchell", "carter", "roberts", "gomez", "phillips", "evans",
    "turner", "diaz", "parker", "cruz", "edwards", "collins", "reyes", "stewart", "morris",
    "morales", "murphy", "cook", "rogers", "gutierrez", "ortiz", "morgan", "cooper", "peterson",
    "bailey", "reed", "kelly", "howard", "ramos", "kim", "cox", "ward", "richardson", "watson",
    "brooks", "chavez", "wood", "james", "bennett", "gray", "mendoza", "ruiz", "hughes", "price",
    "alvarez", "castillo", "sanders", "patel", "myers", "long", "ross", "foster", "jimenez",
    "powell", "jenkins", "perry", "russell", "sullivan", "bell", "coleman", "butler",
    "henderson", "barnes", "fisher", "vasquez", "simmons", "romero", "jordan", "patterson",
    "alexander", "hamilton", "graham", "reynolds", "griffin", "wallace", "moreno", "west",
    "cole", "hayes", "bryant", "herrera", "gibson", "ellis", "tran", "medina", "aguilar",
    "stevens", "murray", "ford", "castro", "marshall", "owens", "harrison", "fernandez",
    "mcdonald", "woods", "washington", "kennedy", "wells", "vargas", "henry", "chen", "freeman",
    "webb", "tucker", "guzman", "burns", "crawford", "olson", "simpson", "porter", "hunter",
    "gordon", "mendez", "silva", "shaw", "snyder", "mason", "dixon", "munoz", "hunt", "hicks",
    "holmes", "palmer", "wagner", "black", "robertson", "boyd", "rose", "stone", "salazar",
    "fox", "warren", "mills", "meyer", "rice", "schmidt", "daniels", "ferguson", "nichols",
    "stephens", "soto", "weaver", "ryan", "gardner", "payne", "grant", "dunn", "kelley",
    "spencer", "hawkins", "arnold", "pierce", "vazquez", "hansen", "peters", "santos", "hart",
    "bradley", "knight", "elliott", "cunningham", "duncan", "armstrong", "hudson", "carroll",
    "lane", "riley", "andrews", "alvarado", "ray", "delgado", "berry", "perkins", "hoffman",
    "johnston", "matthews", "pena", "richards", "contreras", "willis", "carpenter", "lawrence",
    "sandoval", "guerrero", "george", "chapman", "rios", "estrada", "ortega", "watkins",
    "greene", "nunez", "wheeler", "valdez", "harper", "burke", "larson", "santiago", "maldonado",
    "morrison", "franklin", "carlson", "austin", "dominguez", "carr", "lawson", "jacobs",
    "obrien", "lynch", "singh", "vega", "bishop", "montgomery", "oliver", "jensen", "harvey",
    "williamson", "gilbert", "dean", "sims", "espinoza", "howell", "li", "wong", "reid",
    "hanson", "le", "mccoy", "garrett", "burton", "fuller", "wang", "weber", "welch", "rojas",
    "lucas", "marquez", "fields", "park", "yang", "little", "banks", "padilla", "day", "walsh",
    "bowman", "schultz", "luna", "fowler", "mejia",
];

static BUILTIN_CITIES: &[&str] = &[
    "boston", "denver", "boulder", "chicago", "houston", "phoenix", "philadelphia",
    "san antonio", "san diego", "dallas", "austin", "jacksonville", "columbus", "charlotte",
    "indianapolis", "seattle", "nashville", "memphis", "baltimore", "portland", "milwaukee",
    "albuquerque", "tucson", "fresno", "sacramento", "atlanta", "omaha", "raleigh", "miami",
    "cleveland", "tulsa", "oakland", "minneapolis", "wichita", "arlington", "tampa", "aurora",
    "pittsburgh", "cincinnati", "lexington", "anchorage", "stockton", "saint paul", "toledo",
    "springfield", "lincoln", "durham", "madison", "buffalo", "louisville",
];

static BUILTIN_STATES: &[&str] = &[
    "al", "ak", "az", "ar", "ca", "co", "ct", "de", "fl", "ga", "hi", "id", "il", "in", "ia",
    "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne", "nv", "nh", "nj",
    "nm", "ny", "nc", "nd", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut", "vt",
    "va", "wa", "wv", "wi", "wy", "dc", "alabama", "alaska", "arizona", "arkansas",
    "california", "colorado", "connecticut", "delaware", "florida", "georgia", "hawaii",
    "idaho", "illinois", "indiana", "iowa", "kansas", "kentucky", "louisiana", "maine",
    "maryland", "massachusetts", "michigan", "minnesota", "mississippi", "missouri", "montana",
    "nebraska", "nevada", "new hampshire", "new jersey", "new mexico", "new york",
    "north carolina", "north dakota", "ohio", "oklahoma", "oregon", "pennsylvania",
    "rhode island", "south carolina", "south dakota", "tennessee", "texas", "utah", "vermont",
    "virginia", "washington", "west virginia", "wisconsin", "wyoming",
];

static BUILTIN_FIELD_LABELS: &[&str] = &[
    "spouse name", "sister name", "brother name", "mother name", "father name",
    "employer name", "employer contact", "spouse phone", "spouse email", "sister contact",
    "referring physician", "personal website", "admitting physician", "nurse manager",
    "last visit", "next scheduled", "health journal", "patient education", "document created",
    "last updated", "signature location", "emergency contact", "primary care provider",
];

static BUILTIN_MEDICAL_PHRASES: &[&str] = &[
    "the patient", "the doctor", "emergency department", "intensive care", "medical history",
    "physical examination", "diabetes mellitus", "depressive disorder", "bipolar disorder",
    "blood pressure", "heart rate", "respiratory rate", "oxygen saturation", "vital signs",
    "lab results", "test results", "unstable angina", "acute coronary", "oxygen support",
    "discharge planning", "nursing education", "complete blood", "metabolic panel",
    "imaging studies", "lab work", "acute management", "telemetry unit", "cranial nerves",
    "home phone", "cell phone", "work phone", "fax number", "home address", "work address",
    "email address", "patient portal", "insurance portal", "physical therapy",
    "professional license", "retinal pattern", "patient photo", "security camera",
    "waiting room", "telehealth session", "living situation", "tobacco history",
    "alcohol use", "drug history", "stress level", "zip code", "chief complaint",
    "present illness", "general appearance", "privacy notice", "patient rights",
    "advance directive", "consent for treatment", "financial responsibility",
    "allergic rhinitis", "current medications", "complete blood count",
    "comprehensive metabolic panel", "blood count", "prothrombin time", "hemoglobin a1c",
    "past medical history", "family history", "social history", "review of systems",
    "clinical impressions", "diagnostic tests", "treatment plan", "provider information",
    "contact information", "device information", "implant information",
    "biometric characteristics", "identifying characteristics", "current address",
    "location information", "symptom onset", "history of", "npo pending",
    "education materials", "paternal grandmother", "paternal grandfather",
    "maternal grandmother", "maternal grandfather", "consulting cardiologist",
    "admitting physician",
];

static BUILTIN_STRUCTURE_WORDS: &[&str] = &[
    "record", "information", "section", "notes", "history", "department", "number", "account",
    "routing", "bank", "policy", "group", "member", "status", "date", "format", "phone",
    "address", "email", "contact", "portal", "examination", "results", "signs", "rate",
    "pressure", "vehicle", "license", "device", "serial", "model", "identifiers",
    "characteristics", "guide", "table", "category", "definition", "example", "examples",
    "documentation", "records", "files", "data", "media", "images", "photographs",
    "authentication", "credentials", "biometric", "geographic", "transportation", "redaction",
    "compliance", "harbor", "beneficiary", "certificate", "dob", "mrn", "ssn",
];

static BUILTIN_GEO_TERMS: &[&str] = &[
    "boulder", "boston", "denver", "colorado", "texas", "california", "regional", "downtown",
    "north", "south", "east", "west", "central", "metro", "urban", "rural",
];

static BUILTIN_SECTION_HEADINGS: &[&str] = &[
    "clinical information", "comparison", "contrast", "technique", "findings", "impression",
    "history", "examination", "assessment", "plan", "medications", "allergies", "diagnosis",
    "procedure", "results", "conclusion", "recommendations", "summary", "chief complaint",
    "present illness", "past medical history", "family history", "social history",
    "review of systems", "physical examination", "laboratory data", "imaging studies",
    "patient information", "visit information", "provider information", "discharge summary",
    "operative report", "progress note", "consultation report", "radiology report",
    "pathology report", "emergency contact", "emergency contacts", "billing information",
    "insurance information", "geographic data", "telephone numbers", "email addresses",
    "social security number", "medical record number", "health plan beneficiary",
    "account numbers", "vehicle identifiers", "device identifiers", "serial numbers",
    "web urls", "ip addresses", "biometric identifiers", "treatment plan",
    "diagnostic tests", "vital signs", "lab results", "test results", "current address",
    "contact information", "demographics", "specimen",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn names_index() -> FuzzyIndex {
        FuzzyIndex::build(
            ["patricia", "johnson", "margaret", "wong"]
                .iter()
                .map(|s| s.to_string()),
            2,
        )
    }

    #[test]
    fn exact_lookup_is_case_folded() {
        let idx = names_index();
        let hit = idx.lookup("PATRICIA").unwrap();
        assert_eq!(hit.source, MatchSource::Exact);
        assert_eq!(hit.distance, 0);
        assert!(idx.contains_exact("Wong"));
    }

    #[test]
    fn single_deletion_matches() {
        let idx = names_index();
        let hit = idx.lookup("patrica").unwrap();
        assert_eq!(hit.term, "patricia");
        assert_eq!(hit.distance, 1);
        assert!(hit.similarity >= 0.88);
    }

    #[test]
    fn transposition_matches_within_distance() {
        let idx = names_index();
        let hit = idx.lookup("johsnon").unwrap();
        assert_eq!(hit.term, "johnson");
        assert!(hit.distance <= 2);
    }

    #[test]
    fn unrelated_word_misses() {
        let idx = names_index();
        assert!(idx.lookup("ventricle").is_none());
        assert!(idx.lookup("xy").is_none());
    }

    #[test]
    fn jaro_winkler_basics() {
        assert!((jaro_winkler("martha", "martha") - 1.0).abs() < 1e-9);
        assert!(jaro_winkler("martha", "marhta") > 0.94);
        assert!(jaro_winkler("abc", "xyz") < 0.1);
    }

    #[test]
    fn damerau_counts_transposition_as_one() {
        assert_eq!(damerau_levenshtein("smith", "simth"), 1);
        assert_eq!(damerau_levenshtein("smith", "smith"), 0);
        assert_eq!(damerau_levenshtein("smith", "smythe"), 2);
    }

    #[test]
    fn builtin_vocabulary_loads() {
        let vocab = Vocabulary::builtin();
        assert!(vocab.first_names.lookup("john").is_some());
        assert!(vocab.surnames.lookup("wilson").is_some());
        assert!(vocab.cities.contains_exact("boston"));
        assert!(vocab.states.contains("co"));
        assert!(vocab.section_headings.contains("chief complaint"));
    }

    #[test]
    fn load_dir_missing_file_is_dictionary_load_error() {
        let err = Vocabulary::load_dir("/nonexistent/vocab/dir").unwrap_err();
        assert!(matches!(err, crate::error::RedactError::DictionaryLoad { .. }));
    }
}
