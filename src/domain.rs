use bit_set::BitSet;

use crate::crossword::{Crossword, VariableId, WordId};

/// The candidate words still available to each variable, as a set of `WordId`s per variable.
/// Iteration is always in ascending `WordId` order, which keeps every ordering decision made from
/// a domain reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<BitSet>,
}

impl Domains {
    /// Seed every variable with the whole dictionary. Each variable gets its own copy, so pruning
    /// one domain never touches another.
    pub fn initialize(crossword: &Crossword) -> Domains {
        let all_words: BitSet = (0..crossword.words().len()).collect();

        Domains { options: crossword.variables().iter().map(|_| all_words.clone()).collect() }
    }

    pub fn variable_count(&self) -> usize {
        self.options.len()
    }

    /// How many options remain for the variable?
    pub fn len(&self, variable_id: VariableId) -> usize {
        self.options[variable_id].len()
    }

    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.options[variable_id].is_empty()
    }

    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.options[variable_id].contains(word_id)
    }

    /// Remove a word from the variable's domain, returning whether it was present.
    pub fn remove(&mut self, variable_id: VariableId, word_id: WordId) -> bool {
        self.options[variable_id].remove(word_id)
    }

    /// Keep only the words for which `keep` returns true. Returns the number of words removed.
    pub fn retain<F>(&mut self, variable_id: VariableId, mut keep: F) -> usize
    where
        F: FnMut(WordId) -> bool,
    {
        let removed: Vec<WordId> =
            self.options[variable_id].iter().filter(|&word_id| !keep(word_id)).collect();

        for &word_id in &removed {
            self.options[variable_id].remove(word_id);
        }

        removed.len()
    }

    /// Shrink the variable's domain to exactly one word.
    pub fn restrict_to(&mut self, variable_id: VariableId, word_id: WordId) {
        let options = &mut self.options[variable_id];
        options.clear();
        options.insert(word_id);
    }

    pub fn iter(&self, variable_id: VariableId) -> impl Iterator<Item = WordId> + '_ {
        self.options[variable_id].iter()
    }
}
