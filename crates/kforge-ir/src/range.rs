//! Iteration-space descriptions attached to [`Loop`](crate::ops::OpKind::Loop)
//! nodes and propagated to their children.

use serde::{Deserialize, Serialize};

/// A loop's iteration space, described textually rather than numerically.
///
/// Two ranges describe the *same* iteration space only when their `start`,
/// `end`, and `step` strings compare equal (see [`LoopRange::same_space_as`]).
/// This is deliberately syntactic, not arithmetic: `"size"` and `"size - 0"`
/// are different ranges even though they are numerically identical.
/// Arithmetic normalization here would be a regression, not a fix: it would
/// require the IR to reason about expression semantics it otherwise treats
/// as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRange {
    /// Name of the induction variable (e.g. `"i"`).
    pub induction_var: String,
    /// Start-bound expression, as written in the source.
    pub start: String,
    /// End-bound expression, as written in the source.
    pub end: String,
    /// Step expression, as written in the source.
    pub step: String,
    /// `true` if the step corresponds to a vector width (the Builder sets
    /// this when the step expression mentions `lanes`, `MaxLanes`, or
    /// `NumLanes`).
    pub is_vectorized: bool,
    /// Lane count for the target, used by the Emitter's vectorized loop
    /// header (`i + LANES <= end`).
    pub lanes: u32,
}

impl LoopRange {
    /// Builds a scalar (non-vectorized) range with `lanes` defaulted to 1.
    pub fn scalar(induction_var: impl Into<String>, start: impl Into<String>, end: impl Into<String>, step: impl Into<String>) -> Self {
        LoopRange {
            induction_var: induction_var.into(),
            start: start.into(),
            end: end.into(),
            step: step.into(),
            is_vectorized: false,
            lanes: 1,
        }
    }

    /// Builds a vectorized range over `lanes` elements per iteration.
    pub fn vectorized(induction_var: impl Into<String>, start: impl Into<String>, end: impl Into<String>, step: impl Into<String>, lanes: u32) -> Self {
        LoopRange {
            induction_var: induction_var.into(),
            start: start.into(),
            end: end.into(),
            step: step.into(),
            is_vectorized: true,
            lanes,
        }
    }

    /// `true` iff `self` and `other` describe the same iteration space:
    /// their start, end, and step expressions compare equal as strings.
    ///
    /// This is the equality the analyzer and planner use throughout fusion
    /// matching. It intentionally does not compare `induction_var`,
    /// `is_vectorized`, or `lanes` -- two loops over the same bounds with
    /// different induction variable names are still considered the same
    /// iteration space for fusion purposes.
    pub fn same_space_as(&self, other: &LoopRange) -> bool {
        self.start == other.start && self.end == other.end && self.step == other.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_ranges_are_same_space() {
        let a = LoopRange::vectorized("i", "0", "size", "lanes", 4);
        let b = LoopRange::vectorized("j", "0", "size", "lanes", 4);
        assert!(a.same_space_as(&b));
    }

    #[test]
    fn textually_different_but_numerically_equal_ranges_are_not_same_space() {
        let a = LoopRange::scalar("i", "0", "size", "1");
        let b = LoopRange::scalar("i", "0", "size - 0", "1");
        assert!(!a.same_space_as(&b));
    }

    #[test]
    fn different_steps_are_not_same_space() {
        let a = LoopRange::vectorized("i", "0", "size", "lanes", 4);
        let b = LoopRange::scalar("i", "0", "size", "1");
        assert!(!a.same_space_as(&b));
    }

    #[test]
    fn serde_roundtrip() {
        let range = LoopRange::vectorized("i", "0", "n", "NumLanes", 8);
        let json = serde_json::to_string(&range).unwrap();
        let back: LoopRange = serde_json::from_str(&json).unwrap();
        assert_eq!(range, back);
    }
}
