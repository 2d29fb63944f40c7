//! Ordered first-match rule tables.
//!
//! Every classification stage is a static list of [`Rule`]s. The first rule
//! whose predicate holds decides the outcome; list order is priority.

use tracing::trace;

use super::Probe;

/// Outcome of a classification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<T> {
    /// Classified.
    Resolved(T),
    /// A needed capability was momentarily unreadable; try again next tick.
    Retry,
    /// No category applies. The entity becomes unclassifiable.
    Miss,
}

/// What a matching rule produces.
#[derive(Clone, Copy)]
pub enum Then<T: 'static> {
    /// A fixed category.
    Is(T),
    /// The entity is known to be uninteresting.
    Miss,
    /// The category needs a capability that is not readable right now.
    Retry,
    /// Decide with a further function.
    Resolve(fn(&Probe<'_>) -> Verdict<T>),
}

/// One entry of a rule table.
pub struct Rule<T: 'static> {
    /// Name reported in trace logs.
    pub name: &'static str,
    /// Predicate.
    pub when: fn(&Probe<'_>) -> bool,
    /// Outcome when `when` holds.
    pub then: Then<T>,
}

/// Evaluate `rules` in order. No match is a [`Verdict::Miss`].
pub fn evaluate<T: Copy>(stage: &'static str, rules: &[Rule<T>], probe: &Probe<'_>) -> Verdict<T> {
    for rule in rules {
        if (rule.when)(probe) {
            trace!(stage, rule = rule.name, path = probe.path, "rule matched");
            return match rule.then {
                Then::Is(value) => Verdict::Resolved(value),
                Then::Miss => Verdict::Miss,
                Then::Retry => Verdict::Retry,
                Then::Resolve(resolve) => resolve(probe),
            };
        }
    }
    trace!(stage, path = probe.path, "no rule matched");
    Verdict::Miss
}

/// A path prefix and the value it maps to.
pub type PathRule<T> = (&'static str, T);

/// Value of the first entry whose prefix `path` starts with.
pub fn first_prefix<T: Copy>(table: &[PathRule<T>], path: &str) -> Option<T> {
    table
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, value)| *value)
}

/// Value of the first entry whose needle `haystack` contains.
pub fn first_contains<T: Copy>(table: &[PathRule<T>], haystack: &str) -> Option<T> {
    table
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_tables_are_ordered() {
        let table: &[PathRule<u8>] = &[("Metadata/A/B", 1), ("Metadata/A", 2)];
        assert_eq!(first_prefix(table, "Metadata/A/B/C"), Some(1));
        assert_eq!(first_prefix(table, "Metadata/A/X"), Some(2));
        assert_eq!(first_prefix(table, "Metadata/Z"), None);
    }

    #[test]
    fn contains_tables() {
        let table: &[PathRule<u8>] = &[("wisp_primal_sml", 1), ("wisp_primal", 2)];
        assert_eq!(first_contains(table, "Art/wisp_primal_sml.ao"), Some(1));
        assert_eq!(first_contains(table, "Art/wisp_primal_big.ao"), Some(2));
    }
}
