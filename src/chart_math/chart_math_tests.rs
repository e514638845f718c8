//___________________________________TESTS____________________________________
#[cfg(test)]
mod tests {
    use crate::chart_math::prelude::*;
    use crate::chart_math::variables::variable_matches;
    use crate::expression::evaluator::RestrictedEvaluator;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_extraction_is_idempotent() {
        let expression = "sqrt(a.b) + c_1 * a.b - log(d, 2)";
        let first = get_variable_names(expression);
        let second = get_variable_names(expression);
        assert_eq!(first, second);
        assert_eq!(first, vec!["a.b", "c_1", "a.b", "d"]);
    }

    #[test]
    fn test_every_allowed_function_is_excluded() {
        for function in get_allowed_math_functions() {
            let expression = format!("{}(x)", function);
            let names = get_variable_names(&expression);
            assert_eq!(names, vec!["x"], "failed for {}", function);
        }
    }

    #[test]
    fn test_duplicate_preservation() {
        assert_eq!(get_variable_names("a + a"), vec!["a", "a"]);
        assert_eq!(get_variable_count("a + a"), 2);
    }

    #[test]
    fn test_calculation_properties() {
        assert_eq!(calculate("a + b", &Scope::from([("a", 2.0), ("b", 3.0)])), Some(5.0));
        assert_eq!(calculate("1/0", &Scope::new()), None);
        assert_eq!(calculate("a +", &Scope::from([("a", 1.0)])), None);
    }

    #[test]
    fn test_parseability_properties() {
        assert!(can_be_parsed("a * b + sqrt(c)"));
        assert!(!can_be_parsed("a * (b + "));
    }

    #[test]
    fn test_disabled_path_only_when_invoked() {
        let scope = Scope::from([("x", 4.0)]);
        // plain formulas never touch a disabled capability
        assert_eq!(
            RestrictedEvaluator::global().evaluate("sqrt(x) + abs(-x)", &scope),
            Ok(6.0)
        );
        for name in ["import", "createUnit", "evaluate", "parse", "simplify", "derivative"] {
            let expression = format!("{}(x)", name);
            assert_eq!(calculate(&expression, &scope), None, "{}", name);
            assert!(!can_be_parsed(&expression), "{}", name);
        }
    }

    #[test]
    fn test_scope_default_fill() {
        let mut table: SeriesTable = HashMap::new();
        table.insert(
            "x_avg".to_string(),
            vec![DataPoint(0, Some(1.0)), DataPoint(1, Some(2.0))],
        );
        let scope = get_scope(5, &["x"], &["avg"], &table);
        assert_eq!(scope, Scope::from([("x_avg", 0.0)]));
    }

    #[test]
    fn test_rewrite_and_scope_round_trip() {
        let expression = "(temp.in - temp.out) * flow / 2 + square(temp.in)";
        let names = get_variable_names(expression);
        let aggregations = ["avg", "min", "sum", "max"];
        assert_eq!(names.len(), aggregations.len());

        let rewritten = add_aggs_to_expression(expression, &aggregations);
        let rewritten_names = get_variable_names(&rewritten);
        let expected_names: Vec<String> = names
            .iter()
            .zip(aggregations)
            .map(|(n, a)| format!("{}_{}", n, a))
            .collect();
        assert_eq!(rewritten_names, expected_names);

        let mut table: SeriesTable = HashMap::new();
        table.insert("temp.in_avg".to_string(), vec![DataPoint(0, Some(21.5))]);
        table.insert("temp.out_min".to_string(), vec![DataPoint(0, Some(4.0))]);
        table.insert("flow_sum".to_string(), vec![DataPoint(0, Some(3.0))]);
        table.insert("temp.in_max".to_string(), vec![DataPoint(0, Some(23.0))]);
        let scope = get_scope(0, &names, &aggregations, &table);
        let computed = calculate(&rewritten, &scope).unwrap();
        let manual = (21.5 - 4.0) * 3.0 / 2.0 + 23.0 * 23.0;
        assert_relative_eq!(computed, manual);
    }

    #[test]
    fn test_dot_in_identifier() {
        assert!(get_variable_names("device.sensor + 1").contains(&"device.sensor".to_string()));
        assert_eq!(
            calculate("device.sensor + 1", &Scope::from([("device.sensor", 4.0)])),
            Some(5.0)
        );
    }

    #[test]
    fn test_rewrite_positions_match_extraction() {
        let expression = "tan(a) + cos(s) * ab";
        let matches = variable_matches(expression);
        let rewritten = add_aggs_to_expression(expression, &["x", "y", "z"]);
        assert_eq!(matches.len(), 3);
        assert_eq!(rewritten, "tan(a_x) + cos(s_y) * ab_z");
        assert!(can_be_parsed(&rewritten));
    }

    #[test]
    fn test_precedence_follows_convention() {
        let scope = Scope::new();
        assert_eq!(calculate("2 + 3 * 4", &scope), Some(14.0));
        assert_eq!(calculate("10 - 4 - 3", &scope), Some(3.0));
        assert_eq!(calculate("64 / 4 / 2", &scope), Some(8.0));
        assert_eq!(calculate("2 ^ 3 ^ 2", &scope), Some(512.0));
        assert_eq!(calculate("-2 ^ 2", &scope), Some(-4.0));
        assert_eq!(calculate("7 % 4", &scope), Some(3.0));
        assert_eq!(calculate("2 * (3 + 4)", &scope), Some(14.0));
    }
}
