use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Canonical subject names keyed by the lower-cased spellings students
/// actually type. Order matters: the substring fallback in
/// `canonicalize_subject` takes the first entry that matches.
const SUBJECT_ALIASES: &[(&str, &str)] = &[
    // English variations
    ("english lit", "English Literature"),
    ("english literature", "English Literature"),
    ("english lang", "English Language"),
    ("english language", "English Language"),
    ("english", "English Language"),
    // Maths variations
    ("maths", "Mathematics"),
    ("mathematics", "Mathematics"),
    ("math", "Mathematics"),
    // Sciences
    ("biology", "Biology"),
    ("chemistry", "Chemistry"),
    ("physics", "Physics"),
    ("combined science", "Combined Science"),
    ("applied science", "Applied Science"),
    ("btec applied science", "BTEC Applied Science"),
    ("science", "Science"),
    // Social subjects
    ("history", "History"),
    ("geography", "Geography"),
    ("psychology", "Psychology"),
    ("sociology", "Sociology"),
    ("sociolgy", "Sociology"), // common typo
    ("socio", "Sociology"),
    ("religious studies", "Religious Studies"),
    ("religious study", "Religious Studies"),
    ("re", "Religious Studies"),
    ("ethics", "Ethics"),
    // Business & economics
    ("business", "Business Studies"),
    ("business studies", "Business Studies"),
    ("economics", "Economics"),
    ("criminology", "Criminology"),
    ("criminolgy", "Criminology"), // common typo
    ("finance", "Finance"),
    // Languages
    ("french", "French"),
    ("spanish", "Spanish"),
    ("german", "German"),
    // Arts & creative
    ("art", "Art"),
    ("music", "Music"),
    ("drama", "Drama"),
    // Technology & computing
    ("ict", "ICT"),
    ("it", "ICT"),
    ("computing", "Computing"),
    ("creative computing", "Creative Computing"),
    ("computer science", "Computer Science"),
    // PE & sports
    ("pe", "Physical Education"),
    ("physical education", "Physical Education"),
    ("sport", "Sport"),
    ("btec sport", "BTEC Sport"),
    ("sports", "Sport"),
    // Health & social care
    ("health and social care", "Health & Social Care"),
    ("health & social care", "Health & Social Care"),
    ("health and social", "Health & Social Care"),
    ("child development", "Child Development"),
    ("sports and nutrition", "Sports & Nutrition"),
    ("sports & nutrition", "Sports & Nutrition"),
    // Other subjects
    ("politics", "Politics"),
    ("media", "Media Studies"),
    ("law", "Law"),
    ("philosophy", "Philosophy"),
    ("engineering", "Engineering"),
];

// Ranks are only comparable within a single scale.
const GCSE_RANKS: &[(&str, u32)] = &[
    ("U", 0),
    ("1", 1),
    ("2", 2),
    ("3", 3),
    ("4", 4),
    ("5", 5),
    ("6", 6),
    ("7", 7),
    ("8", 8),
    ("9", 9),
];

const ALEVEL_RANKS: &[(&str, u32)] = &[
    ("U", 0),
    ("E", 1),
    ("D", 2),
    ("C", 3),
    ("B", 4),
    ("A", 5),
    ("A*", 6),
];

const BTEC_RANKS: &[(&str, u32)] = &[
    ("Pass", 1),
    ("Merit", 2),
    ("Distinction", 3),
    ("D*", 4),
];

/// Static lookup tables for subject and grade normalization.
/// Built once at startup and shared read-only by the pipeline components;
/// combined BTEC codes like "DMM" are deliberately absent from the rank
/// tables (multi-unit awards have no agreed single-grade equivalence).
pub struct Lexicon {
    pub subject_aliases: &'static [(&'static str, &'static str)],
    gcse: HashMap<&'static str, u32>,
    alevel: HashMap<&'static str, u32>,
    btec: HashMap<&'static str, u32>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self {
            subject_aliases: SUBJECT_ALIASES,
            gcse: GCSE_RANKS.iter().copied().collect(),
            alevel: ALEVEL_RANKS.iter().copied().collect(),
            btec: BTEC_RANKS.iter().copied().collect(),
        }
    }
}

/// How a student's current grade in one subject relates to their
/// predicted/target grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeStatus {
    NoData,
    TargetOnly,
    CurrentOnly,
    Exceeding,
    Meeting,
    Below,
    Incomparable,
}

impl GradeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GradeStatus::NoData => "No Data",
            GradeStatus::TargetOnly => "Target Set",
            GradeStatus::CurrentOnly => "Current Only",
            GradeStatus::Exceeding => "Exceeding Target",
            GradeStatus::Meeting => "Meeting Target",
            GradeStatus::Below => "Below Target",
            GradeStatus::Incomparable => "Different Systems",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            GradeStatus::NoData => "❓",
            GradeStatus::TargetOnly => "🎯",
            GradeStatus::CurrentOnly => "📈",
            GradeStatus::Exceeding => "🎉",
            GradeStatus::Meeting => "✅",
            GradeStatus::Below => "⚠️",
            GradeStatus::Incomparable => "📊",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            GradeStatus::NoData => "status-gray",
            GradeStatus::TargetOnly => "status-blue",
            GradeStatus::CurrentOnly => "status-green",
            GradeStatus::Exceeding => "status-darkgreen",
            GradeStatus::Meeting => "status-green",
            GradeStatus::Below => "status-red",
            GradeStatus::Incomparable => "status-yellow",
        }
    }
}

impl std::fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Maps raw subject/grade fragments onto canonical names and tokens, and
/// ranks two canonical grade tokens within whichever scale holds both.
/// Every operation is total: unknown input degrades, it never errors.
pub struct Canonicalizer<'a> {
    lexicon: &'a Lexicon,
    prefix_re: Regex,
    suffix_re: Regex,
    parens_re: Regex,
    punct_re: Regex,
    whitespace_re: Regex,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            prefix_re: Regex::new(r"(?i)^(btec|level \d+|l\d+)\s*").unwrap(),
            suffix_re: Regex::new(r"(?i)\s*(gcse|a-level|as)$").unwrap(),
            parens_re: Regex::new(r"\s*\([^)]*\)$").unwrap(),
            punct_re: Regex::new(r"[^\w\s&]").unwrap(),
            whitespace_re: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Resolve a raw subject fragment to its canonical name.
    ///
    /// Aliases like "btec sport" carry the qualification level as part of
    /// the subject identity, so the alias table is consulted before the
    /// level prefix is stripped.
    pub fn canonicalize_subject(&self, fragment: &str) -> String {
        let raw = fragment.trim().to_lowercase();
        if let Some(name) = self.exact_alias(&raw) {
            return name.to_string();
        }

        let subject = self.prefix_re.replace(&raw, "");
        let subject = self.suffix_re.replace(&subject, "");
        let subject = self.parens_re.replace(&subject, "");
        let subject = self.punct_re.replace_all(&subject, "");
        let subject = self.whitespace_re.replace_all(&subject, " ");
        let subject = subject.trim();

        if subject.is_empty() {
            return "Unknown Subject".to_string();
        }
        if let Some(name) = self.exact_alias(subject) {
            return name.to_string();
        }
        for &(alias, name) in self.lexicon.subject_aliases {
            if subject.contains(alias) || alias.contains(subject) {
                return name.to_string();
            }
        }
        title_case(subject)
    }

    fn exact_alias(&self, subject: &str) -> Option<&'static str> {
        self.lexicon
            .subject_aliases
            .iter()
            .find(|&&(alias, _)| alias == subject)
            .map(|&(_, name)| name)
    }

    /// Resolve a raw grade fragment to its canonical token. Unrecognized
    /// fragments pass through upper-cased; a bare "d" is always the BTEC
    /// Distinction, never the A-Level D.
    pub fn canonicalize_grade(&self, fragment: &str) -> String {
        let grade = fragment.trim().to_lowercase();
        match grade.as_str() {
            "" | "na" | "n/a" | "-" | "nan" | "no grade" | "no current grade" | "not available" => {
                "N/A".to_string()
            }
            "merit" | "m" => "Merit".to_string(),
            "distinction" | "d" => "Distinction".to_string(),
            "pass" | "p" => "Pass".to_string(),
            "distinction*" | "d*" => "D*".to_string(),
            "dmm" | "ddd" | "mmm" | "ppp" | "dd*" | "dm" | "mp" => grade.to_uppercase(),
            "a*" | "a" | "b" | "c" | "e" | "u" => grade.to_uppercase(),
            "9" | "8" | "7" | "6" | "5" | "4" | "3" | "2" | "1" => grade,
            "l2" | "level 2" => "L2".to_string(),
            _ => fragment.trim().to_uppercase(),
        }
    }

    /// Rank `current` against `predicted` within the first scale that holds
    /// both tokens (GCSE, then A-Level, then BTEC). Tokens from different
    /// scales are an expected, reportable outcome, not an error.
    pub fn compare(&self, current: &str, predicted: &str) -> GradeStatus {
        match (current == "N/A", predicted == "N/A") {
            (true, true) => return GradeStatus::NoData,
            (true, false) => return GradeStatus::TargetOnly,
            (false, true) => return GradeStatus::CurrentOnly,
            (false, false) => {}
        }

        for scale in [
            &self.lexicon.gcse,
            &self.lexicon.alevel,
            &self.lexicon.btec,
        ] {
            if let (Some(current_rank), Some(predicted_rank)) =
                (scale.get(current), scale.get(predicted))
            {
                return match current_rank.cmp(predicted_rank) {
                    Ordering::Greater => GradeStatus::Exceeding,
                    Ordering::Equal => GradeStatus::Meeting,
                    Ordering::Less => GradeStatus::Below,
                };
            }
        }

        // Unranked but identical tokens (combined BTEC codes, passthroughs)
        // still count as a match.
        if current.eq_ignore_ascii_case(predicted) {
            GradeStatus::Meeting
        } else {
            GradeStatus::Incomparable
        }
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonicalizer(lexicon: &Lexicon) -> Canonicalizer<'_> {
        Canonicalizer::new(lexicon)
    }

    #[test]
    fn test_subject_aliases_resolve() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_subject("Maths"), "Mathematics");
        assert_eq!(canon.canonicalize_subject("english lit"), "English Literature");
        assert_eq!(canon.canonicalize_subject("Sociolgy"), "Sociology");
        assert_eq!(canon.canonicalize_subject("PE"), "Physical Education");
        assert_eq!(canon.canonicalize_subject("it"), "ICT");
    }

    #[test]
    fn test_subject_prefix_and_suffix_stripped() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_subject("Level 3 Criminology"), "Criminology");
        assert_eq!(canon.canonicalize_subject("Maths GCSE"), "Mathematics");
        assert_eq!(canon.canonicalize_subject("History A-Level"), "History");
        assert_eq!(canon.canonicalize_subject("Biology (triple)"), "Biology");
    }

    #[test]
    fn test_btec_subjects_keep_their_level() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_subject("BTEC Sport"), "BTEC Sport");
        assert_eq!(
            canon.canonicalize_subject("btec applied science"),
            "BTEC Applied Science"
        );
        // A plain level prefix still strips down to the base subject.
        assert_eq!(canon.canonicalize_subject("BTEC Engineering"), "Engineering");
    }

    #[test]
    fn test_unknown_subject_falls_back_to_title_case() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_subject("astronomy"), "Astronomy");
        assert_eq!(canon.canonicalize_subject("   "), "Unknown Subject");
        assert_eq!(canon.canonicalize_subject("(9)"), "Unknown Subject");
    }

    #[test]
    fn test_subject_canonicalization_idempotent() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        for &(_, name) in SUBJECT_ALIASES {
            assert_eq!(canon.canonicalize_subject(name), name, "not idempotent: {}", name);
        }
    }

    #[test]
    fn test_grade_aliases_resolve() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_grade("A*"), "A*");
        assert_eq!(canon.canonicalize_grade("a"), "A");
        assert_eq!(canon.canonicalize_grade("m"), "Merit");
        assert_eq!(canon.canonicalize_grade("p"), "Pass");
        assert_eq!(canon.canonicalize_grade("distinction*"), "D*");
        assert_eq!(canon.canonicalize_grade("dmm"), "DMM");
        assert_eq!(canon.canonicalize_grade("7"), "7");
        assert_eq!(canon.canonicalize_grade("level 2"), "L2");
        for not_available in ["na", "N/A", "-", "", "nan", "no grade"] {
            assert_eq!(canon.canonicalize_grade(not_available), "N/A");
        }
    }

    #[test]
    fn test_bare_d_is_btec_distinction() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_grade("d"), "Distinction");
        assert_eq!(canon.canonicalize_grade("D"), "Distinction");
    }

    #[test]
    fn test_grade_canonicalization_is_total() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.canonicalize_grade("ungraded"), "UNGRADED");
        assert_eq!(canon.canonicalize_grade("🎓"), "🎓");
        assert_eq!(canon.canonicalize_grade("grade 9???"), "GRADE 9???");
    }

    #[test]
    fn test_compare_gcse() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.compare("7", "8"), GradeStatus::Below);
        assert_eq!(canon.compare("8", "8"), GradeStatus::Meeting);
        assert_eq!(canon.compare("9", "8"), GradeStatus::Exceeding);
        assert_eq!(canon.compare("U", "4"), GradeStatus::Below);
    }

    #[test]
    fn test_compare_alevel() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.compare("A*", "B"), GradeStatus::Exceeding);
        assert_eq!(canon.compare("C", "A"), GradeStatus::Below);
        assert_eq!(canon.compare("B", "B"), GradeStatus::Meeting);
    }

    #[test]
    fn test_compare_btec() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.compare("Merit", "Distinction"), GradeStatus::Below);
        assert_eq!(canon.compare("D*", "Distinction"), GradeStatus::Exceeding);
        assert_eq!(canon.compare("Pass", "Pass"), GradeStatus::Meeting);
    }

    #[test]
    fn test_compare_across_scales() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.compare("A", "7"), GradeStatus::Incomparable);
        assert_eq!(canon.compare("Merit", "B"), GradeStatus::Incomparable);
    }

    #[test]
    fn test_compare_missing_sides() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        assert_eq!(canon.compare("N/A", "N/A"), GradeStatus::NoData);
        assert_eq!(canon.compare("N/A", "8"), GradeStatus::TargetOnly);
        assert_eq!(canon.compare("8", "N/A"), GradeStatus::CurrentOnly);
    }

    #[test]
    fn test_compare_unranked_tokens() {
        let lexicon = Lexicon::new();
        let canon = canonicalizer(&lexicon);

        // Combined BTEC codes have no rank, but equal codes still match.
        assert_eq!(canon.compare("DMM", "DMM"), GradeStatus::Meeting);
        assert_eq!(canon.compare("DMM", "MMM"), GradeStatus::Incomparable);
        assert_eq!(canon.compare("FOUNDATION", "foundation"), GradeStatus::Meeting);
    }
}
