//! The two-level security label lattice.

/// An element of the label lattice, or the `Invalid` sentinel used to mark
/// a placeholder that must be filled before the tree is well-formed.
///
/// `Low` and `High` form the lattice proper: `Low ⊑ High`. `Invalid` never
/// participates in a [`join`] on a well-formed tree; it exists only so that
/// freshly parsed nodes have something to put in their `secure` field before
/// the labeller runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Label {
    #[default]
    Invalid,
    Low,
    High,
}

impl Label {
    #[inline]
    #[must_use]
    pub fn flows_to(self, other: Label) -> bool {
        matches!((self, other), (Label::Low, Label::Low | Label::High) | (Label::High, Label::High))
    }
}

/// `join` is associative, commutative, and idempotent; `join()` of nothing is
/// `Low`. Joining with `Invalid` is a logic error in a well-formed tree and
/// panics rather than silently producing a wrong label.
#[must_use]
pub fn join(labels: impl IntoIterator<Item = Label>) -> Label {
    let mut result = Label::Low;
    for label in labels {
        result = join2(result, label);
    }
    result
}

#[inline]
#[must_use]
pub fn join2(a: Label, b: Label) -> Label {
    match (a, b) {
        (Label::Invalid, _) | (_, Label::Invalid) => {
            panic!("join() of an Invalid label: the tree is not well-formed")
        }
        (Label::High, _) | (_, Label::High) => Label::High,
        (Label::Low, Label::Low) => Label::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_high_iff_any_argument_is_high() {
        assert_eq!(join2(Label::Low, Label::Low), Label::Low);
        assert_eq!(join2(Label::Low, Label::High), Label::High);
        assert_eq!(join2(Label::High, Label::High), Label::High);
    }

    #[test]
    fn join_of_empty_is_low() {
        assert_eq!(join(std::iter::empty()), Label::Low);
    }

    #[test]
    fn join_is_idempotent_and_commutative() {
        assert_eq!(join2(Label::High, Label::Low), join2(Label::Low, Label::High));
        assert_eq!(join2(Label::High, Label::High), Label::High);
    }

    #[test]
    #[should_panic]
    fn join_of_invalid_panics() {
        join2(Label::Invalid, Label::Low);
    }
}
