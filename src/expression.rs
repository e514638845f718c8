/// restricted arithmetic expression language used by chart calculations
///
/// # Example
/// ```
/// use chart_math::expression::evaluator::RestrictedEvaluator;
/// use chart_math::chart_math::scope::Scope;
/// let evaluator = RestrictedEvaluator::global();
/// let scope = Scope::from([("a_avg", 2.0), ("b_sum", 3.0)]);
/// let result = evaluator.evaluate("sqrt(square(a_avg) + b_sum^2)", &scope).unwrap();
/// assert!((result - 13.0_f64.sqrt()).abs() < 1e-12);
/// // capabilities of a general purpose math language are switched off
/// assert!(evaluator.evaluate("evaluate(1)", &scope).is_err());
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod error;
/// the list of functions a formula may call and the list of capabilities that are switched off
pub mod functions;
/// turns a formula string into positioned tokens, dots are identifier characters
pub mod tokenizer;
///____________________________________________________________________________________________________________________________
/// # Parser
/// recursive descent parser with the usual precedence of arithmetic operators
/// ```
/// use chart_math::expression::evaluator::RestrictedEvaluator;
/// let parsed = RestrictedEvaluator::global().parse("2x + device.temp / 4").unwrap();
/// println!("parsed expression {}", parsed);
/// ```
pub mod parse_expr;
/// expression tree and its evaluation against a scope
pub mod expr;
/// ________________________________________________________________________________________________________________________________________________
/// the evaluator/parser pair sharing one restricted namespace, plus the process-wide instance
pub mod evaluator;
