//! Diagnostic message shapes the conflict resolver knows how to fix.
//!
//! Every regular expression over checker messages lives here. The rest of
//! the pipeline only sees [`ConflictShape`].

use std::sync::LazyLock;

use regex::Regex;

/// A recognised type conflict, with the types the message names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictShape {
    /// Argument of type `found` passed to a parameter of type `expected`
    Argument { found: String, expected: String },
    /// Value of type `found` sent on a channel of `element`
    ChannelSend { found: String, element: String },
    /// Non-integer index, slice bound or size argument
    Index,
    /// Binary operands (or an op-assignment) of types `left` and `right`
    Mismatch { left: String, right: String },
    /// Value of type `found` assigned to a destination of type `expected`
    Assignment { found: String, expected: String },
    /// `%` applied to a non-integer operand
    Remainder,
    /// Returned value does not match the result type
    Return { found: String, expected: String },
    /// Constant truncated when converted to an integer
    Truncation,
}

impl ConflictShape {
    /// Short handler name used in errors and logs.
    pub fn handler(&self) -> &'static str {
        match self {
            ConflictShape::Argument { .. } => "fix_argument",
            ConflictShape::ChannelSend { .. } => "fix_channel",
            ConflictShape::Index => "fix_index",
            ConflictShape::Mismatch { .. } => "fix_mismatch",
            ConflictShape::Assignment { .. } => "fix_assignment",
            ConflictShape::Remainder => "fix_remainder",
            ConflictShape::Return { .. } => "fix_return",
            ConflictShape::Truncation => "fix_truncation",
        }
    }
}

static ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cannot pass argument .+? of type (\*?\w+)\) to parameter of type (\*?\w+)")
        .expect("valid regex")
});
static CHANNEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"cannot send .+?of type (\*?\w+)\) to channel .+? \((?:variable|value) of type chan (\*?\w+)\)",
    )
    .expect("valid regex")
});
static INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"index .+? must be integer").expect("valid regex"));
static MISMATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mismatched types (\w+) and (\w+)").expect("valid regex"));
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"cannot use .+ \(.*?of type (\w+)\) as (\w+) value in (?:assignment|variable declaration)$",
    )
    .expect("valid regex")
});
static REMAINDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"operator [%] not defined").expect("valid regex"));
static RETURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cannot return (.+?) \((?:variable|value) of type (\w+)\) as value of type (\w+)")
        .expect("valid regex")
});
static TRUNCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"truncated to int").expect("valid regex"));

fn captures(re: &Regex, message: &str) -> Option<Vec<String>> {
    re.captures(message).map(|c| {
        c.iter()
            .map(|m| m.map(|m| m.as_str().to_owned()).unwrap_or_default())
            .collect()
    })
}

/// Match a diagnostic message against the known shapes, in priority
/// order. `None` means the conflict is unknown.
pub fn classify(message: &str) -> Option<ConflictShape> {
    if let Some(m) = captures(&ARGUMENT, message) {
        return Some(ConflictShape::Argument {
            found: m[1].clone(),
            expected: m[2].clone(),
        });
    }
    if let Some(m) = captures(&CHANNEL, message) {
        return Some(ConflictShape::ChannelSend {
            found: m[1].clone(),
            element: m[2].clone(),
        });
    }
    if INDEX.is_match(message) {
        return Some(ConflictShape::Index);
    }
    if let Some(m) = captures(&MISMATCH, message) {
        return Some(ConflictShape::Mismatch {
            left: m[1].clone(),
            right: m[2].clone(),
        });
    }
    if let Some(m) = captures(&ASSIGNMENT, message) {
        return Some(ConflictShape::Assignment {
            found: m[1].clone(),
            expected: m[2].clone(),
        });
    }
    if REMAINDER.is_match(message) {
        return Some(ConflictShape::Remainder);
    }
    if let Some(m) = captures(&RETURN, message) {
        return Some(ConflictShape::Return {
            found: m[2].clone(),
            expected: m[3].clone(),
        });
    }
    if TRUNCATION.is_match(message) {
        return Some(ConflictShape::Truncation);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_shape_captures_both_types() {
        assert_eq!(
            classify("cannot pass argument x (variable of type float64) to parameter of type int"),
            Some(ConflictShape::Argument {
                found: "float64".into(),
                expected: "int".into()
            })
        );
    }

    #[test]
    fn channel_shape_captures_element_type() {
        assert_eq!(
            classify(
                "cannot send v (variable of type float64) to channel ch (variable of type chan int)"
            ),
            Some(ConflictShape::ChannelSend {
                found: "float64".into(),
                element: "int".into()
            })
        );
    }

    #[test]
    fn index_and_remainder_shapes() {
        assert_eq!(
            classify("invalid argument: index i (variable of type float64) must be integer"),
            Some(ConflictShape::Index)
        );
        assert_eq!(
            classify("invalid operation: operator % not defined on a (variable of type float64)"),
            Some(ConflictShape::Remainder)
        );
    }

    #[test]
    fn mismatch_shape_reads_operand_types_in_order() {
        assert_eq!(
            classify("invalid operation: i < len(xs) (mismatched types float64 and int)"),
            Some(ConflictShape::Mismatch {
                left: "float64".into(),
                right: "int".into()
            })
        );
    }

    #[test]
    fn assignment_shape_names_destination() {
        assert_eq!(
            classify("cannot use v (variable of type float64) as int value in assignment"),
            Some(ConflictShape::Assignment {
                found: "float64".into(),
                expected: "int".into()
            })
        );
        assert_eq!(
            classify("cannot use v (variable of type float64) as int value in variable declaration"),
            Some(ConflictShape::Assignment {
                found: "float64".into(),
                expected: "int".into()
            })
        );
    }

    #[test]
    fn return_and_truncation_shapes() {
        assert_eq!(
            classify("cannot return v (variable of type float64) as value of type int"),
            Some(ConflictShape::Return {
                found: "float64".into(),
                expected: "int".into()
            })
        );
        assert_eq!(
            classify("2.5 (untyped float constant) truncated to int"),
            Some(ConflictShape::Truncation)
        );
    }

    #[test]
    fn argument_wins_over_later_shapes() {
        let shape = classify(
            "cannot pass argument 2.5 (untyped float constant) truncated to int of type float64) to parameter of type int",
        );
        assert!(matches!(shape, Some(ConflictShape::Argument { .. })));
    }

    #[test]
    fn unknown_messages_are_none() {
        assert_eq!(classify("undefined: z"), None);
        assert_eq!(classify("missing return"), None);
    }
}
