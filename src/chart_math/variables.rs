use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::expression::functions::{allowed_function_names, is_allowed_function};

/// a letter followed by up to 49 letters, digits, dots or underscores
static VARIABLE_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z][a-zA-Z0-9._]{0,49}").expect("variable candidate pattern is valid")
});

/// one variable occurrence and the byte range it covers in the expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMatch<'a> {
    pub name: &'a str,
    pub span: Range<usize>,
}

/// returns the names of all functions a formula may call
pub fn get_allowed_math_functions() -> Vec<&'static str> {
    allowed_function_names()
}

/// Variable occurrences in left-to-right order with their positions.
/// Duplicates are kept, allowed function names are dropped.
pub fn variable_matches(expression: &str) -> Vec<VariableMatch<'_>> {
    VARIABLE_CANDIDATE
        .find_iter(expression)
        .filter(|m| !is_allowed_function(m.as_str()))
        .map(|m| VariableMatch {
            name: m.as_str(),
            span: m.range(),
        })
        .collect()
}

/// returns all variable names used in the expression, in order of appearance, duplicates included
pub fn get_variable_names(expression: &str) -> Vec<String> {
    variable_matches(expression)
        .into_iter()
        .map(|m| m.name.to_string())
        .collect()
}

/// number of variable occurrences, not deduplicated
pub fn get_variable_count(expression: &str) -> usize {
    variable_matches(expression).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_names() {
        assert_eq!(get_variable_names("a + b * c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_and_non_matching() {
        assert!(get_variable_names("").is_empty());
        assert!(get_variable_names("1 + 2 * (3 - 4)").is_empty());
        assert_eq!(get_variable_count(""), 0);
    }

    #[test]
    fn test_function_names_are_excluded() {
        assert_eq!(get_variable_names("sqrt(x) + log10(y)"), vec!["x", "y"]);
        assert_eq!(get_variable_names("pow(base, exponent)"), vec!["base", "exponent"]);
    }

    #[test]
    fn test_exclusion_is_exact_match() {
        // only whole candidates are compared with the registry
        assert_eq!(get_variable_names("sinus + Sqrt"), vec!["sinus", "Sqrt"]);
        assert_eq!(get_variable_names("max(a, b)"), vec!["max", "a", "b"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(get_variable_names("a + a * a"), vec!["a", "a", "a"]);
        assert_eq!(get_variable_count("a + a * a"), 3);
    }

    #[test]
    fn test_dots_underscores_and_digits() {
        assert_eq!(
            get_variable_names("device.sensor_1 / plc.t2"),
            vec!["device.sensor_1", "plc.t2"]
        );
        // a candidate has to start with a letter
        assert_eq!(get_variable_names("_x + 2y"), vec!["x", "y"]);
    }

    #[test]
    fn test_candidates_are_at_most_fifty_chars() {
        let long_name = format!("a{}", "b".repeat(59));
        let names = get_variable_names(&long_name);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].len(), 50);
        assert_eq!(names[1].len(), 10);
    }

    #[test]
    fn test_match_spans() {
        let matches = variable_matches("tan(ab) + c");
        assert_eq!(
            matches,
            vec![
                VariableMatch {
                    name: "ab",
                    span: 4..6
                },
                VariableMatch {
                    name: "c",
                    span: 10..11
                },
            ]
        );
    }

    #[test]
    fn test_allowed_functions_are_exposed() {
        let functions = get_allowed_math_functions();
        assert_eq!(functions.len(), 18);
        assert_eq!(functions.first(), Some(&"abs"));
        assert_eq!(functions.last(), Some(&"tan"));
    }
}
