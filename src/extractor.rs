use crate::canonicalizer::Lexicon;
use crate::models::is_blank_cell;
use regex::Regex;

/// Pulls raw (subject, grade) pairs out of one free-text spreadsheet cell.
///
/// Students type their grades in wildly different shapes ("Maths - 7",
/// "Biology: 8, Physics: 7", "History (6)", one subject per line, bare
/// "AAA"...). The extractor tries an ordered cascade of patterns per entry
/// and stops at the first one that matches; entries nothing matches are
/// dropped, which is accepted data loss rather than an error.
pub struct GradeExtractor<'a> {
    lexicon: &'a Lexicon,
    dash_re: Regex,
    colon_re: Regex,
    parens_re: Regex,
    bare_re: Regex,
    grade_token_re: Regex,
    letters_only_re: Regex,
    comma_guard_re: Regex,
}

impl<'a> GradeExtractor<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            dash_re: Regex::new(
                r"(?i)([A-Za-z\s&']+?)\s*[-–]\s*([A-Z*\d]+|Merit|Distinction|Pass|N/?A|DMM|DDD|MMM|L2|Foundation)",
            )
            .unwrap(),
            colon_re: Regex::new(
                r"(?i)([A-Za-z\s&']+?)\s*:\s*([A-Z*\d]+|Merit|Distinction|Pass|N/?A|DMM|DDD|MMM|L2)",
            )
            .unwrap(),
            parens_re: Regex::new(r"(?i)([A-Za-z\s&']+?)\s*\(([A-Z*\d]+|Merit|Distinction|Pass)\)")
                .unwrap(),
            // Bare "Subject Grade" only counts when a short grade-shaped
            // token closes the entry; a long trailing word is part of the
            // subject name, not a grade.
            bare_re: Regex::new(
                r"(?i)^([A-Za-z\s&']+?)\s+([A-Za-z]{1,3}\*?\d*|\d|Merit|Distinction|Pass)$",
            )
            .unwrap(),
            grade_token_re: Regex::new(r"(?i)^([A-Z]{1,3}\*?\d*|\d|Merit|Distinction|Pass|N/?A)$")
                .unwrap(),
            letters_only_re: Regex::new(r"^[A-Z*]{1,3}$").unwrap(),
            comma_guard_re: Regex::new(r"[A-Za-z]+\s*,\s*[A-Za-z]+\s*-").unwrap(),
        }
    }

    /// Extract every (subject, grade) pair recoverable from `text`.
    /// Blank and placeholder cells yield an empty list.
    pub fn extract(&self, text: &str) -> Vec<(String, String)> {
        let text = text.trim();
        if is_blank_cell(text) {
            return Vec::new();
        }

        let lines: Vec<&str> = text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        // A single line with commas is usually a comma-separated list of
        // entries, unless the comma sits inside one dash-separated entry
        // ("Eng, Maths - 76"), in which case the line stays whole.
        let candidates: Vec<&str> =
            if lines.len() == 1 && lines[0].contains(',') && !self.comma_guard_re.is_match(lines[0])
            {
                lines[0]
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .collect()
            } else {
                lines
            };

        let mut pairs = Vec::new();
        for candidate in candidates {
            self.extract_candidate(candidate, &mut pairs);
        }
        pairs
    }

    fn extract_candidate(&self, candidate: &str, pairs: &mut Vec<(String, String)>) {
        // Degenerate one-token entries: a grade with no subject attached.
        if self.letters_only_re.is_match(&candidate.to_uppercase()) {
            pairs.push(("Combined Subjects".to_string(), candidate.to_uppercase()));
            return;
        }
        if candidate.len() == 1 && candidate.chars().all(|c| c.is_ascii_digit()) {
            pairs.push(("General Target".to_string(), candidate.to_string()));
            return;
        }
        match candidate.to_lowercase().as_str() {
            "merit" => {
                pairs.push(("General Grade".to_string(), "Merit".to_string()));
                return;
            }
            "distinction" => {
                pairs.push(("General Grade".to_string(), "Distinction".to_string()));
                return;
            }
            "pass" => {
                pairs.push(("General Grade".to_string(), "Pass".to_string()));
                return;
            }
            _ => {}
        }

        // Pattern cascade: the first pattern that matches the entry claims
        // it, even when the subject filter leaves nothing usable.
        for pattern in [&self.dash_re, &self.colon_re, &self.parens_re, &self.bare_re] {
            let mut matched = false;
            for caps in pattern.captures_iter(candidate) {
                matched = true;
                let subject = caps[1].trim();
                let grade = caps[2].trim();
                if subject.len() > 1 {
                    pairs.push((subject.to_string(), grade.to_string()));
                }
            }
            if matched {
                return;
            }
        }

        self.keyword_fallback(candidate, pairs);
    }

    /// Last resort: the entry mentions a known subject somewhere. Pair it
    /// with the first grade-shaped token elsewhere in the entry, or "N/A"
    /// when there is none.
    fn keyword_fallback(&self, candidate: &str, pairs: &mut Vec<(String, String)>) {
        let lower = candidate.to_lowercase();
        let found = self
            .lexicon
            .subject_aliases
            .iter()
            .find(|&&(alias, _)| lower.contains(alias));
        let Some(&(alias, _)) = found else {
            return;
        };

        let remaining = lower.replacen(alias, "", 1);
        let grade = remaining
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '*' || c == '/'))
            .find(|token| !token.is_empty() && self.grade_token_re.is_match(token));

        match grade {
            Some(token) => pairs.push((alias.to_string(), token.to_string())),
            None => pairs.push((alias.to_string(), "N/A".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<(String, String)> {
        let lexicon = Lexicon::new();
        let extractor = GradeExtractor::new(&lexicon);
        extractor.extract(text)
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|&(subject, grade)| (subject.to_string(), grade.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_cells_yield_nothing() {
        for text in ["", "  ", "-", "n/a", "N/A", "na", "nan"] {
            assert_eq!(extract(text), pairs(&[]), "input: {:?}", text);
        }
    }

    #[test]
    fn test_dash_format() {
        assert_eq!(extract("Maths - A*"), pairs(&[("Maths", "A*")]));
        assert_eq!(extract("Maths – 7"), pairs(&[("Maths", "7")]));
    }

    #[test]
    fn test_colon_format_with_comma_list() {
        assert_eq!(
            extract("Biology: 8, Physics: 7"),
            pairs(&[("Biology", "8"), ("Physics", "7")])
        );
    }

    #[test]
    fn test_parenthesized_grade() {
        assert_eq!(extract("History (7)"), pairs(&[("History", "7")]));
    }

    #[test]
    fn test_bare_whitespace_format() {
        assert_eq!(extract("Maths 7"), pairs(&[("Maths", "7")]));
        assert_eq!(extract("English Lit A"), pairs(&[("English Lit", "A")]));
        // A long trailing word is not mistaken for a grade.
        assert_eq!(extract("Business Studies"), pairs(&[("business", "N/A")]));
    }

    #[test]
    fn test_multiple_entries_on_one_line() {
        assert_eq!(
            extract("Maths - 7 English - 6"),
            pairs(&[("Maths", "7"), ("English", "6")])
        );
    }

    #[test]
    fn test_newline_separated_entries() {
        assert_eq!(
            extract("Sociology - A\nBTEC Sport - Distinction"),
            pairs(&[("Sociology", "A"), ("BTEC Sport", "Distinction")])
        );
    }

    #[test]
    fn test_comma_inside_dash_entry_is_not_split() {
        // The comma belongs to one entry, so the line must stay whole;
        // the dash pattern then recovers what it can.
        assert_eq!(extract("Eng, Maths - 76"), pairs(&[("Maths", "76")]));
    }

    #[test]
    fn test_degenerate_single_token_lines() {
        assert_eq!(extract("AAA"), pairs(&[("Combined Subjects", "AAA")]));
        assert_eq!(extract("a*"), pairs(&[("Combined Subjects", "A*")]));
        assert_eq!(extract("8"), pairs(&[("General Target", "8")]));
        assert_eq!(extract("Merit"), pairs(&[("General Grade", "Merit")]));
        assert_eq!(extract("distinction"), pairs(&[("General Grade", "Distinction")]));
    }

    #[test]
    fn test_keyword_fallback() {
        assert_eq!(
            extract("taking sociology this autumn"),
            pairs(&[("sociology", "N/A")])
        );
        assert_eq!(
            extract("achieved distinction overall in btec sport"),
            pairs(&[("sport", "distinction")])
        );
    }

    #[test]
    fn test_unparseable_lines_are_dropped() {
        assert_eq!(extract("!!???"), pairs(&[]));
        assert_eq!(extract("Zzyzx Qwrt 123456"), pairs(&[]));
    }
}
