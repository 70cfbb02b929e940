use std::collections::{HashMap, VecDeque};

use bit_set::BitSet;
use log::{debug, trace};

use crate::crossword::{Crossword, VariableId, WordId};
use crate::domain::Domains;

/// An ordered pair `(x, y)`: the constraint that every word left for `x` has a compatible word
/// left for `y`.
pub type Arc = (VariableId, VariableId);

/// Remove every word whose length differs from its variable's length.
pub fn enforce_node_consistency(crossword: &Crossword, domains: &mut Domains) {
    for (variable_id, variable) in crossword.variables().iter().enumerate() {
        let removed =
            domains.retain(variable_id, |word_id| crossword.word(word_id).len() == variable.length);

        trace!("node consistency removed {} words from variable {}", removed, variable_id);
    }
}

/// Make `x` arc-consistent with `y`: drop each word of `x` that has no partner in `y` with the
/// same letter at the shared cell. A word never counts as its own partner, since two variables
/// can't hold the same word. Returns whether anything was removed.
pub fn revise(crossword: &Crossword, domains: &mut Domains, x: VariableId, y: VariableId) -> bool {
    let Some((i, j)) = crossword.overlap(x, y) else {
        return false;
    };

    // For each glyph at cell `j` of y's options, how many options carry it, and one of them. A
    // word of x is supported unless the only option with its glyph is the word itself.
    let mut support: HashMap<char, (usize, WordId)> = HashMap::new();
    for word_id in domains.iter(y) {
        if let Some(&glyph) = crossword.word(word_id).glyphs.get(j) {
            support.entry(glyph).and_modify(|(count, _)| *count += 1).or_insert((1, word_id));
        }
    }

    let removed = domains.retain(x, |word_id| {
        let glyph = crossword.word(word_id).glyphs.get(i);

        match glyph.and_then(|glyph| support.get(glyph)) {
            Some(&(count, only_word_id)) => count > 1 || only_word_id != word_id,
            None => false,
        }
    });

    if removed > 0 {
        trace!("revise({}, {}) removed {} words", x, y, removed);
    }

    removed > 0
}

/// Worklist for `ac3`. An arc is never queued twice at the same time.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    queued: BitSet,
    variable_count: usize,
}

impl ArcQueue {
    fn with_initial_arcs<Arcs>(variable_count: usize, arcs: Arcs) -> ArcQueue
    where
        Arcs: IntoIterator<Item = Arc>,
    {
        let mut queue = ArcQueue {
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(variable_count * variable_count),
            variable_count,
        };

        for arc in arcs {
            queue.enqueue(arc);
        }

        queue
    }

    fn enqueue(&mut self, (x, y): Arc) {
        if self.queued.insert(x * self.variable_count + y) {
            self.queue.push_back((x, y));
        }
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let (x, y) = self.queue.pop_front()?;
        self.queued.remove(x * self.variable_count + y);

        Some((x, y))
    }
}

/// Enforce arc consistency with the AC-3 algorithm. If `arcs` is `None` the worklist starts with
/// every arc in the puzzle, otherwise with just the given arcs.
///
/// Returns false as soon as any domain is emptied, in which case the puzzle has no solution under
/// these domains. Returning true doesn't mean a solution exists.
pub fn ac3(crossword: &Crossword, domains: &mut Domains, arcs: Option<Vec<Arc>>) -> bool {
    let variable_count = crossword.variables().len();

    let mut queue = match arcs {
        Some(arcs) => ArcQueue::with_initial_arcs(variable_count, arcs),
        None => ArcQueue::with_initial_arcs(variable_count, crossword.arcs()),
    };

    while let Some((x, y)) = queue.pop_front() {
        if !revise(crossword, domains, x, y) {
            continue;
        }

        if domains.is_empty(x) {
            debug!("arc consistency emptied the domain of variable {}", x);
            return false;
        }

        // Narrowing x may leave words of x's other neighbors without support.
        for neighbor in crossword.neighbors(x) {
            if neighbor != y {
                queue.enqueue((neighbor, x));
            }
        }
    }

    true
}
