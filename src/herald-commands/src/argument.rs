//! Typed argument validators.
//!
//! An [`Argument`] is a named slot that consumes a prefix of the remaining
//! command input and turns it into an [`ArgValue`]. Three kinds exist:
//!
//! - `string` - the next whitespace-delimited token
//! - `rest` - everything that is left
//! - `number` - the next token, parsed as a signed decimal
//!
//! Arguments are assembled with [`TextArgument`] / [`NumberArgument`]
//! builders and converted into an [`Argument`] when added to a command.
//!
//! ```rust
//! use herald_commands::{ArgValue, Argument};
//!
//! let arg: Argument = Argument::number("sides").min(2.0).integer().into();
//! let (value, rest) = arg.validate("20 extra").unwrap();
//! assert_eq!(value, ArgValue::Integer(20));
//! assert_eq!(rest, " extra");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ArgumentError, ParseError};

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("number pattern is valid"));

/// A validated argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Text from a `string` or `rest` argument.
    Text(String),
    /// A decimal number.
    Number(f64),
    /// A number from an argument configured with `integer()`.
    Integer(i64),
}

impl ArgValue {
    /// The text value, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            Self::Text(_) => None,
        }
    }

    /// The integer value, if this is a number without fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Number(n) if n.fract() == 0.0 && fits_i64(*n) => Some(*n as i64),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Type tag used to create arguments by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    /// Single whitespace-delimited token.
    String,
    /// Signed decimal number.
    Number,
    /// All remaining input.
    Rest,
}

impl FromStr for ArgumentType {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "rest" => Ok(Self::Rest),
            _ => Err(ArgumentError::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Rest => "rest",
        };
        f.write_str(name)
    }
}

/// Case folding applied to text before any other check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFold {
    Upper,
    Lower,
}

impl CaseFold {
    fn apply(self, text: &str) -> String {
        match self {
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
        }
    }
}

/// Sign a number argument is forced to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Strictly greater than zero.
    Positive,
    /// Strictly less than zero.
    Negative,
}

/// Constraints shared by `string` and `rest` arguments.
#[derive(Debug, Clone, Default)]
pub struct TextConstraints {
    case: Option<CaseFold>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    whitelist: Option<Vec<String>>,
    pattern: Option<Regex>,
}

/// Constraints of `number` arguments.
#[derive(Debug, Clone, Default)]
pub struct NumberConstraints {
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
    sign: Option<Sign>,
}

/// Kind of an argument together with its constraint set.
#[derive(Debug, Clone)]
pub enum ArgumentKind {
    String(TextConstraints),
    Number(NumberConstraints),
    Rest(TextConstraints),
}

/// Attributes every argument kind carries.
#[derive(Debug, Clone)]
struct Slot {
    name: String,
    display: Option<String>,
    optional: bool,
    default: Option<ArgValue>,
    show_default: bool,
}

impl Slot {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display: None,
            optional: false,
            default: None,
            show_default: true,
        }
    }
}

/// A named, typed, positionally consumed input slot of a command.
#[derive(Debug, Clone)]
pub struct Argument {
    slot: Slot,
    kind: ArgumentKind,
}

impl Argument {
    /// Start a `string` argument.
    pub fn string(name: impl Into<String>) -> TextArgument {
        TextArgument::new(name, false)
    }

    /// Start a `rest` argument.
    pub fn rest(name: impl Into<String>) -> TextArgument {
        TextArgument::new(name, true)
    }

    /// Start a `number` argument.
    pub fn number(name: impl Into<String>) -> NumberArgument {
        NumberArgument::new(name)
    }

    /// Create an unconstrained argument from a type tag.
    pub fn of_type(kind: ArgumentType, name: impl Into<String>) -> Self {
        match kind {
            ArgumentType::String => Self::string(name).into(),
            ArgumentType::Rest => Self::rest(name).into(),
            ArgumentType::Number => Self::number(name).into(),
        }
    }

    /// Create an unconstrained argument from a textual type tag.
    pub fn from_tag(tag: &str, name: impl Into<String>) -> Result<Self, ArgumentError> {
        Ok(Self::of_type(tag.parse()?, name))
    }

    /// Identifier the parsed value is stored under.
    pub fn name(&self) -> &str {
        &self.slot.name
    }

    /// Label shown in usage and error messages.
    pub fn display(&self) -> &str {
        self.slot.display.as_deref().unwrap_or(&self.slot.name)
    }

    pub fn is_optional(&self) -> bool {
        self.slot.optional
    }

    pub fn default_value(&self) -> Option<&ArgValue> {
        self.slot.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.slot.default.is_some()
    }

    pub fn kind(&self) -> &ArgumentKind {
        &self.kind
    }

    pub fn argument_type(&self) -> ArgumentType {
        match self.kind {
            ArgumentKind::String(_) => ArgumentType::String,
            ArgumentKind::Number(_) => ArgumentType::Number,
            ArgumentKind::Rest(_) => ArgumentType::Rest,
        }
    }

    /// Usage fragment, e.g. `<text>`, `[count=1]` or `<message...>`.
    pub fn usage(&self) -> String {
        let ellipsis = if matches!(self.kind, ArgumentKind::Rest(_)) {
            "..."
        } else {
            ""
        };
        if !self.slot.optional {
            return format!("<{}{}>", self.display(), ellipsis);
        }
        match (&self.slot.default, self.slot.show_default) {
            (Some(default), true) => format!("[{}{}={}]", self.display(), ellipsis, default),
            _ => format!("[{}{}]", self.display(), ellipsis),
        }
    }

    /// Validate the start of `input`.
    ///
    /// Returns the value and the unconsumed tail of `input`.
    pub fn validate<'a>(&self, input: &'a str) -> Result<(ArgValue, &'a str), ParseError> {
        match &self.kind {
            ArgumentKind::String(constraints) => {
                let (token, rest) = split_token(input);
                let value = self.check_text(constraints, token)?;
                Ok((ArgValue::Text(value), rest))
            }
            ArgumentKind::Rest(constraints) => {
                let value = self.check_text(constraints, input.trim())?;
                Ok((ArgValue::Text(value), ""))
            }
            ArgumentKind::Number(constraints) => {
                let (token, rest) = split_token(input);
                let value = self.check_number(constraints, token)?;
                Ok((value, rest))
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self, message)
    }

    fn check_text(&self, constraints: &TextConstraints, token: &str) -> Result<String, ParseError> {
        if token.is_empty() {
            return Err(self.error("a value is required"));
        }

        let value = match constraints.case {
            Some(case) => case.apply(token),
            None => token.to_string(),
        };
        let length = value.chars().count();

        if let Some(min) = constraints.min_length
            && length < min
        {
            return Err(self.error(format!("must be at least {min} characters long")));
        }
        if let Some(max) = constraints.max_length
            && length > max
        {
            return Err(self.error(format!("must be at most {max} characters long")));
        }
        if let Some(whitelist) = &constraints.whitelist {
            let allowed = whitelist.iter().any(|entry| match constraints.case {
                Some(case) => case.apply(entry) == value,
                None => *entry == value,
            });
            if !allowed {
                return Err(self.error(format!("must be one of: {}", whitelist.join(", "))));
            }
        }
        if let Some(pattern) = &constraints.pattern
            && !pattern.is_match(&value)
        {
            return Err(self.error("is not in the expected format"));
        }

        Ok(value)
    }

    fn check_number(
        &self,
        constraints: &NumberConstraints,
        token: &str,
    ) -> Result<ArgValue, ParseError> {
        if token.is_empty() {
            return Err(self.error("a number is required"));
        }
        if !NUMBER_PATTERN.is_match(token) {
            return Err(self.error(format!("`{token}` is not a valid number")));
        }
        let value: f64 = token
            .parse()
            .ok()
            .filter(|n: &f64| n.is_finite())
            .ok_or_else(|| self.error(format!("`{token}` is not a valid number")))?;

        if let Some(min) = constraints.min
            && value < min
        {
            return Err(self.error(format!("must be at least {min}")));
        }
        if let Some(max) = constraints.max
            && value > max
        {
            return Err(self.error(format!("must be at most {max}")));
        }
        if constraints.integer && value.fract() != 0.0 {
            return Err(self.error("must be a whole number"));
        }
        if constraints.integer && !fits_i64(value) {
            return Err(self.error("is out of range"));
        }
        match constraints.sign {
            Some(Sign::Positive) if value <= 0.0 => {
                return Err(self.error("must be positive"));
            }
            Some(Sign::Negative) if value >= 0.0 => {
                return Err(self.error("must be negative"));
            }
            _ => {}
        }

        if constraints.integer {
            Ok(ArgValue::Integer(value as i64))
        } else {
            Ok(ArgValue::Number(value))
        }
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn fits_i64(value: f64) -> bool {
    (i64::MIN as f64..i64::MAX as f64).contains(&value)
}

/// Split off the first whitespace-delimited token.
fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], &input[end..]),
        None => (input, ""),
    }
}

/// Check an argument identifier against `[A-Za-z0-9_]+`.
pub fn is_valid_argument_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

macro_rules! slot_methods {
    () => {
        /// Label shown in usage and error messages.
        pub fn display(mut self, label: impl Into<String>) -> Self {
            self.slot.display = Some(label.into());
            self
        }

        /// Allow the argument to be absent, without a default value.
        pub fn optional(mut self) -> Self {
            self.slot.optional = true;
            self
        }

        /// Keep the default value out of usage text.
        pub fn hide_default(mut self) -> Self {
            self.slot.show_default = false;
            self
        }
    };
}

/// Builder for `string` and `rest` arguments.
#[derive(Debug, Clone)]
pub struct TextArgument {
    slot: Slot,
    rest: bool,
    constraints: TextConstraints,
}

impl TextArgument {
    fn new(name: impl Into<String>, rest: bool) -> Self {
        Self {
            slot: Slot::new(name),
            rest,
            constraints: TextConstraints::default(),
        }
    }

    slot_methods!();

    /// Make the argument optional with a default value.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.slot.optional = true;
        self.slot.default = Some(ArgValue::Text(value.into()));
        self
    }

    /// Fold the value to upper case. Replaces a previous `lowercase()`.
    pub fn uppercase(mut self) -> Self {
        self.constraints.case = Some(CaseFold::Upper);
        self
    }

    /// Fold the value to lower case. Replaces a previous `uppercase()`.
    pub fn lowercase(mut self) -> Self {
        self.constraints.case = Some(CaseFold::Lower);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.constraints.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.constraints.max_length = Some(max);
        self
    }

    /// Accept only the listed values.
    pub fn whitelist<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.whitelist = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Require the value to match `pattern`.
    pub fn matching(mut self, pattern: Regex) -> Self {
        self.constraints.pattern = Some(pattern);
        self
    }
}

impl From<TextArgument> for Argument {
    fn from(builder: TextArgument) -> Self {
        let kind = if builder.rest {
            ArgumentKind::Rest(builder.constraints)
        } else {
            ArgumentKind::String(builder.constraints)
        };
        Self {
            slot: builder.slot,
            kind,
        }
    }
}

/// Builder for `number` arguments.
#[derive(Debug, Clone)]
pub struct NumberArgument {
    slot: Slot,
    constraints: NumberConstraints,
}

impl NumberArgument {
    fn new(name: impl Into<String>) -> Self {
        Self {
            slot: Slot::new(name),
            constraints: NumberConstraints::default(),
        }
    }

    slot_methods!();

    /// Make the argument optional with a default value.
    pub fn default_value(mut self, value: f64) -> Self {
        self.slot.optional = true;
        self.slot.default = Some(ArgValue::Number(value));
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    /// Reject values with a fractional part; values are yielded as [`ArgValue::Integer`].
    pub fn integer(mut self) -> Self {
        self.constraints.integer = true;
        self
    }

    pub fn positive(mut self) -> Self {
        self.constraints.sign = Some(Sign::Positive);
        self
    }

    pub fn negative(mut self) -> Self {
        self.constraints.sign = Some(Sign::Negative);
        self
    }
}

impl From<NumberArgument> for Argument {
    fn from(mut builder: NumberArgument) -> Self {
        if builder.constraints.integer
            && let Some(ArgValue::Number(n)) = builder.slot.default
            && n.fract() == 0.0
        {
            builder.slot.default = Some(ArgValue::Integer(n as i64));
        }
        Self {
            slot: builder.slot,
            kind: ArgumentKind::Number(builder.constraints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(builder: TextArgument) -> Argument {
        builder.into()
    }

    fn number(builder: NumberArgument) -> Argument {
        builder.into()
    }

    #[test]
    fn test_string_takes_first_token() {
        let arg = text(Argument::string("word"));
        let (value, rest) = arg.validate("hello big world").unwrap();

        assert_eq!(value, ArgValue::Text("hello".to_string()));
        assert_eq!(rest, " big world");
    }

    #[test]
    fn test_string_splits_on_newline() {
        let arg = text(Argument::string("word"));
        let (value, rest) = arg.validate("first\nsecond").unwrap();

        assert_eq!(value.as_str(), Some("first"));
        assert_eq!(rest, "\nsecond");
    }

    #[test]
    fn test_string_length_bounds() {
        let arg = text(Argument::string("name").min_length(2).max_length(4));

        for (input, ok) in [("a", false), ("ab", true), ("abcd", true), ("abcde", false)] {
            assert_eq!(arg.validate(input).is_ok(), ok, "input {input:?}");
        }
    }

    #[test]
    fn test_string_length_counts_characters() {
        let arg = text(Argument::string("name").max_length(2));
        assert!(arg.validate("éé").is_ok());
    }

    #[test]
    fn test_empty_input_is_missing() {
        let arg = text(Argument::string("name"));
        let err = arg.validate("").unwrap_err();
        assert_eq!(err.message(), "a value is required");
        assert_eq!(err.argument().name(), "name");
    }

    #[test]
    fn test_case_folding_last_wins() {
        let arg = text(Argument::string("code").uppercase().lowercase());
        let (value, _) = arg.validate("MiXeD").unwrap();
        assert_eq!(value.as_str(), Some("mixed"));

        let arg = text(Argument::string("code").lowercase().uppercase());
        let (value, _) = arg.validate("MiXeD").unwrap();
        assert_eq!(value.as_str(), Some("MIXED"));
    }

    #[test]
    fn test_whitelist_applies_case_folding() {
        let arg = text(
            Argument::string("mode")
                .lowercase()
                .whitelist(["On", "off"]),
        );

        assert_eq!(arg.validate("ON").unwrap().0.as_str(), Some("on"));
        let err = arg.validate("maybe").unwrap_err();
        assert_eq!(err.message(), "must be one of: On, off");
    }

    #[test]
    fn test_check_order_min_before_whitelist() {
        let arg = text(
            Argument::string("mode")
                .min_length(3)
                .whitelist(["yes", "no"]),
        );
        let err = arg.validate("no").unwrap_err();
        assert_eq!(err.message(), "must be at least 3 characters long");
    }

    #[test]
    fn test_regex_checked_last() {
        let arg = text(
            Argument::string("tag")
                .max_length(3)
                .matching(Regex::new(r"^[a-z]+$").unwrap()),
        );

        assert!(arg.validate("abc").is_ok());
        assert_eq!(
            arg.validate("ab1").unwrap_err().message(),
            "is not in the expected format"
        );
        assert_eq!(
            arg.validate("abcd1").unwrap_err().message(),
            "must be at most 3 characters long"
        );
    }

    #[test]
    fn test_rest_consumes_everything() {
        let arg = text(Argument::rest("message"));
        let (value, rest) = arg.validate("hello big\nworld  ").unwrap();

        assert_eq!(value.as_str(), Some("hello big\nworld"));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_rest_applies_constraints() {
        let arg = text(Argument::rest("message").max_length(5));
        assert!(arg.validate("hello world").is_err());
    }

    #[test]
    fn test_number_format() {
        let arg = number(Argument::number("n"));

        for input in ["1", "-1", "0.5", "-12.75"] {
            assert!(arg.validate(input).is_ok(), "input {input:?}");
        }
        for input in ["1.", ".5", "+1", "1e3", "abc", "--1", "0x10"] {
            let err = arg.validate(input).unwrap_err();
            assert!(err.message().contains("is not a valid number"), "input {input:?}");
        }
    }

    #[test]
    fn test_number_bounds() {
        let arg = number(Argument::number("n").min(1.0).max(10.0));

        assert_eq!(arg.validate("0").unwrap_err().message(), "must be at least 1");
        assert_eq!(arg.validate("11").unwrap_err().message(), "must be at most 10");
        assert_eq!(arg.validate("10").unwrap().0, ArgValue::Number(10.0));
    }

    #[test]
    fn test_integer_accepts_zero_fraction() {
        let arg = number(Argument::number("n").integer());

        assert_eq!(arg.validate("3.0").unwrap().0, ArgValue::Integer(3));
        assert_eq!(
            arg.validate("3.5").unwrap_err().message(),
            "must be a whole number"
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        let arg = number(Argument::number("n").integer());

        assert_eq!(
            arg.validate("100000000000000000000").unwrap_err().message(),
            "is out of range"
        );
        assert_eq!(
            arg.validate("-9223372036854775808").unwrap().0,
            ArgValue::Integer(i64::MIN)
        );
        // plain numbers keep the value but have no integer form
        let plain = number(Argument::number("n"));
        let (value, _) = plain.validate("100000000000000000000").unwrap();
        assert_eq!(value.as_i64(), None);
        assert_eq!(ArgValue::Number(42.0).as_i64(), Some(42));
    }

    #[test]
    fn test_number_check_order() {
        let arg = number(Argument::number("n").max(5.0).integer().positive());

        // max is checked before integer
        assert_eq!(arg.validate("6.5").unwrap_err().message(), "must be at most 5");
        // integer is checked before sign
        assert_eq!(
            arg.validate("-0.5").unwrap_err().message(),
            "must be a whole number"
        );
        assert_eq!(arg.validate("0").unwrap_err().message(), "must be positive");
    }

    #[test]
    fn test_negative_sign() {
        let arg = number(Argument::number("n").negative());
        assert!(arg.validate("-2").is_ok());
        assert_eq!(arg.validate("2").unwrap_err().message(), "must be negative");
    }

    #[test]
    fn test_number_leaves_tail() {
        let arg = number(Argument::number("n"));
        let (value, rest) = arg.validate("4 dice").unwrap();

        assert_eq!(value.as_f64(), Some(4.0));
        assert_eq!(rest, " dice");
    }

    #[test]
    fn test_optional_and_default_are_independent() {
        let arg = text(Argument::string("a").optional());
        assert!(arg.is_optional());
        assert!(!arg.has_default());

        let arg = text(Argument::string("b").default_value("x"));
        assert!(arg.is_optional());
        assert_eq!(arg.default_value(), Some(&ArgValue::Text("x".to_string())));

        let arg = text(Argument::string("c"));
        assert!(!arg.is_optional());
        assert!(!arg.has_default());
    }

    #[test]
    fn test_integer_default_is_integer() {
        let arg = number(Argument::number("sides").integer().default_value(6.0));
        assert_eq!(arg.default_value(), Some(&ArgValue::Integer(6)));
    }

    #[test]
    fn test_usage() {
        assert_eq!(text(Argument::string("text")).usage(), "<text>");
        assert_eq!(text(Argument::rest("message")).usage(), "<message...>");
        assert_eq!(
            number(Argument::number("count").default_value(1.0)).usage(),
            "[count=1]"
        );
        assert_eq!(
            text(Argument::string("user").display("member").optional()).usage(),
            "[member]"
        );
        assert_eq!(
            text(Argument::string("mode").default_value("on").hide_default()).usage(),
            "[mode]"
        );
    }

    #[test]
    fn test_argument_type_tags() {
        assert_eq!("string".parse::<ArgumentType>(), Ok(ArgumentType::String));
        assert_eq!("NUMBER".parse::<ArgumentType>(), Ok(ArgumentType::Number));
        assert_eq!("rest".parse::<ArgumentType>(), Ok(ArgumentType::Rest));
        assert_eq!(
            "boolean".parse::<ArgumentType>(),
            Err(ArgumentError::UnknownType("boolean".to_string()))
        );

        let arg = Argument::from_tag("number", "n").unwrap();
        assert_eq!(arg.argument_type(), ArgumentType::Number);
        assert!(Argument::from_tag("user", "u").is_err());
    }

    #[test]
    fn test_valid_argument_names() {
        assert!(is_valid_argument_name("count_2"));
        assert!(!is_valid_argument_name(""));
        assert!(!is_valid_argument_name("two words"));
        assert!(!is_valid_argument_name("dash-name"));
    }
}
