//! The flow analyser's per-call, per-program-entry context (§4.7).
//!
//! A `SecurityContext` tracks the *flow-sensitive* label of every variable
//! and array element seen so far along one straight-line analysis: one is
//! created fresh for the top-level program and another fresh one for every
//! call site re-analysed. It never outlives the pass that created it —
//! `Symbol::decl_label` stays the one durable, immutable label on a symbol.

use rustc_hash::FxHashMap;

use palisade_ast::{join2, Label, SymbolId};

/// Flow-sensitive labels for scalars and array elements, live only for the
/// duration of one `SecurityContext`-threaded analysis.
#[derive(Clone, Default)]
pub struct SecurityContext {
    vars: FxHashMap<SymbolId, Label>,
    arrays: FxHashMap<SymbolId, Vec<Label>>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current flow-sensitive label of `sym`, or `decl_label` if nothing
    /// has been recorded for it yet (e.g. it was never assigned along this
    /// path).
    pub fn label_of_var(&self, sym: SymbolId, decl_label: Label) -> Label {
        self.vars.get(&sym).copied().unwrap_or(decl_label)
    }

    /// The current flow-sensitive label of element `index` of array `sym`.
    pub fn label_of_array_index(&self, sym: SymbolId, index: usize, decl_label: Label) -> Label {
        self.arrays
            .get(&sym)
            .and_then(|labels| labels.get(index))
            .copied()
            .unwrap_or(decl_label)
    }

    /// All recorded per-element labels of array `sym`, if it has been
    /// registered in this context.
    pub fn labels_of_array(&self, sym: SymbolId) -> Option<&[Label]> {
        self.arrays.get(&sym).map(Vec::as_slice)
    }

    pub fn register_var(&mut self, sym: SymbolId, label: Label) {
        self.vars.insert(sym, label);
    }

    pub fn register_array(&mut self, sym: SymbolId, labels: Vec<Label>) {
        self.arrays.insert(sym, labels);
    }

    /// Overwrites `sym`'s label, returning whether it actually changed (used
    /// to decide whether to emit a note).
    pub fn relabel_var(&mut self, sym: SymbolId, label: Label) -> bool {
        let changed = self.vars.get(&sym).copied() != Some(label);
        self.vars.insert(sym, label);
        changed
    }

    /// Precise update of a single element, for a write through a literal
    /// index.
    pub fn relabel_array_index(&mut self, sym: SymbolId, index: usize, label: Label) -> bool {
        let entry = self.arrays.entry(sym).or_default();
        if entry.len() <= index {
            entry.resize(index + 1, Label::Low);
        }
        let changed = entry[index] != label;
        entry[index] = label;
        changed
    }

    /// Conservative update for a write through a dynamic index: every
    /// element is raised to `label` since the written-to slot is not
    /// statically known.
    pub fn relabel_array(&mut self, sym: SymbolId, label: Label) -> bool {
        let entry = self.arrays.entry(sym).or_default();
        let mut changed = false;
        for slot in entry.iter_mut() {
            if *slot != label {
                *slot = join2(*slot, label);
                changed = true;
            }
        }
        changed
    }

    /// A deep snapshot, taken before analysing a branch whose sibling branch
    /// must see the pre-branch state.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Pointwise join of `other` into `self`, used to reconcile two branches
    /// on exit from an `if`/`try`-`catch`.
    pub fn merge(&mut self, other: &Self) {
        for (&sym, &label) in &other.vars {
            let current = self.vars.get(&sym).copied().unwrap_or(label);
            self.vars.insert(sym, join2(current, label));
        }
        for (&sym, labels) in &other.arrays {
            let entry = self.arrays.entry(sym).or_insert_with(|| labels.clone());
            if entry.len() < labels.len() {
                entry.resize(labels.len(), Label::Low);
            }
            for (slot, &other_label) in entry.iter_mut().zip(labels) {
                *slot = join2(*slot, other_label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_var_falls_back_to_decl_label() {
        let ctx = SecurityContext::new();
        assert_eq!(ctx.label_of_var(SymbolId(0), Label::Low), Label::Low);
        assert_eq!(ctx.label_of_var(SymbolId(0), Label::High), Label::High);
    }

    #[test]
    fn relabel_reports_whether_it_changed() {
        let mut ctx = SecurityContext::new();
        ctx.register_var(SymbolId(0), Label::Low);
        assert!(!ctx.relabel_var(SymbolId(0), Label::Low));
        assert!(ctx.relabel_var(SymbolId(0), Label::High));
    }

    #[test]
    fn literal_index_write_touches_only_that_element() {
        let mut ctx = SecurityContext::new();
        ctx.register_array(SymbolId(0), vec![Label::Low, Label::Low, Label::Low]);
        ctx.relabel_array_index(SymbolId(0), 1, Label::High);
        assert_eq!(ctx.labels_of_array(SymbolId(0)).unwrap(), &[Label::Low, Label::High, Label::Low]);
    }

    #[test]
    fn dynamic_index_write_raises_every_element() {
        let mut ctx = SecurityContext::new();
        ctx.register_array(SymbolId(0), vec![Label::Low, Label::Low]);
        ctx.relabel_array(SymbolId(0), Label::High);
        assert_eq!(ctx.labels_of_array(SymbolId(0)).unwrap(), &[Label::High, Label::High]);
    }

    #[test]
    fn merge_joins_pointwise() {
        let mut a = SecurityContext::new();
        a.register_var(SymbolId(0), Label::Low);
        let mut b = SecurityContext::new();
        b.register_var(SymbolId(0), Label::High);
        a.merge(&b);
        assert_eq!(a.label_of_var(SymbolId(0), Label::Low), Label::High);
    }
}
