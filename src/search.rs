use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use instant::{Duration, Instant};
use log::{debug, info, trace};
use thiserror::Error;

use crate::consistency::{ac3, enforce_node_consistency, Arc};
use crate::crossword::{Crossword, Variable, VariableId, WordId};
use crate::domain::Domains;

/// Knobs for the search.
///
/// ```
/// use fillgrid::SolverOptions;
///
/// let options = SolverOptions::default()
///     .with_inference(false)
///     .with_timeout(instant::Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Try the values that rule out the fewest neighbor options first. When disabled, values are
    /// tried in dictionary order.
    pub least_constraining_value: bool,

    /// After each tentative assignment, run AC-3 on the arcs pointing at the assigned variable
    /// and reject the value if any domain empties. The pruning is undone on backtrack.
    pub inference: bool,

    /// Give up with `FillFailure::DeadlineExceeded` once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions { least_constraining_value: true, inference: true, deadline: None }
    }
}

impl SolverOptions {
    pub fn with_least_constraining_value(mut self, enabled: bool) -> Self {
        self.least_constraining_value = enabled;
        self
    }

    pub fn with_inference(mut self, enabled: bool) -> Self {
        self.inference = enabled;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

/// A (possibly partial) mapping from variables to words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    choices: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    pub fn empty(variable_count: usize) -> Assignment {
        Assignment { choices: vec![None; variable_count], assigned_count: 0 }
    }

    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.choices[variable_id]
    }

    pub fn is_assigned(&self, variable_id: VariableId) -> bool {
        self.choices[variable_id].is_some()
    }

    /// Number of variables holding a word.
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    pub fn assign(&mut self, variable_id: VariableId, word_id: WordId) {
        if self.choices[variable_id].replace(word_id).is_none() {
            self.assigned_count += 1;
        }
    }

    pub fn unassign(&mut self, variable_id: VariableId) -> Option<WordId> {
        let previous = self.choices[variable_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    /// Assigned `(variable, word)` pairs in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, WordId)> + '_ {
        self.choices
            .iter()
            .enumerate()
            .filter_map(|(variable_id, choice)| choice.map(|word_id| (variable_id, word_id)))
    }

    pub fn word<'a>(&self, crossword: &'a Crossword, variable_id: VariableId) -> Option<&'a str> {
        self.choices[variable_id].map(|word_id| crossword.word(word_id).string.as_str())
    }

    pub fn to_map(&self, crossword: &Crossword) -> HashMap<Variable, String> {
        self.iter()
            .map(|(variable_id, word_id)| {
                (*crossword.variable(variable_id), crossword.word(word_id).string.clone())
            })
            .collect()
    }
}

/// A struct tracking statistics about the search.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Tentative assignments tried.
    pub states: u64,
    pub backtracks: u64,
    pub solutions: u64,
    pub duration: Duration,
}

/// A struct representing the results of a successful search.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Why a search produced no assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Arc consistency emptied a domain before search started.
    #[error("no solution: arc consistency emptied a domain")]
    Unsatisfiable,

    /// Every branch of the search was exhausted.
    #[error("no solution: every assignment was exhausted")]
    NoAssignmentFound,

    #[error("search deadline exceeded")]
    DeadlineExceeded,
}

/// True if every variable holds a word from the dictionary.
pub fn is_complete(crossword: &Crossword, assignment: &Assignment) -> bool {
    let word_count = crossword.words().len();

    (0..crossword.variables().len())
        .all(|variable_id| assignment.get(variable_id).is_some_and(|word_id| word_id < word_count))
}

/// True if every assigned word has the right length, no word is used twice, and every pair of
/// assigned neighbors agrees on their shared cell.
pub fn is_consistent(crossword: &Crossword, assignment: &Assignment) -> bool {
    let mut used: HashSet<WordId> = HashSet::with_capacity(assignment.len());

    for (variable_id, word_id) in assignment.iter() {
        if !used.insert(word_id) {
            return false;
        }

        let word = crossword.word(word_id);
        if word.len() != crossword.variable(variable_id).length {
            return false;
        }

        for crossing in crossword.crossings(variable_id) {
            if let Some(other_word_id) = assignment.get(crossing.other) {
                let other_word = crossword.word(other_word_id);
                if word.glyphs.get(crossing.cell) != other_word.glyphs.get(crossing.other_cell) {
                    return false;
                }
            }
        }
    }

    true
}

/// Would assigning `word_id` to the unassigned `variable_id` keep a consistent assignment
/// consistent? Checks only the constraints that involve the new variable.
fn is_consistent_with(
    crossword: &Crossword,
    assignment: &Assignment,
    variable_id: VariableId,
    word_id: WordId,
) -> bool {
    let word = crossword.word(word_id);
    if word.len() != crossword.variable(variable_id).length {
        return false;
    }

    if assignment.iter().any(|(_, other_word_id)| other_word_id == word_id) {
        return false;
    }

    crossword.crossings(variable_id).iter().all(|crossing| {
        assignment.get(crossing.other).map_or(true, |other_word_id| {
            word.glyphs.get(crossing.cell)
                == crossword.word(other_word_id).glyphs.get(crossing.other_cell)
        })
    })
}

/// Pick the unassigned variable with the fewest remaining options, breaking ties by the most
/// neighbors and then by input order.
pub fn select_unassigned_variable(
    crossword: &Crossword,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<VariableId> {
    (0..crossword.variables().len())
        .filter(|&variable_id| !assignment.is_assigned(variable_id))
        .min_by_key(|&variable_id| {
            (domains.len(variable_id), Reverse(crossword.degree(variable_id)))
        })
}

/// The variable's options ordered by how many unassigned neighbors also have that word as an
/// option, fewest first. Equal counts keep dictionary order.
pub fn order_domain_values(
    crossword: &Crossword,
    domains: &Domains,
    assignment: &Assignment,
    variable_id: VariableId,
) -> Vec<WordId> {
    let mut values: Vec<(usize, WordId)> = domains
        .iter(variable_id)
        .map(|word_id| {
            let ruled_out = crossword
                .neighbors(variable_id)
                .filter(|&neighbor| {
                    !assignment.is_assigned(neighbor) && domains.contains(neighbor, word_id)
                })
                .count();

            (ruled_out, word_id)
        })
        .collect();

    values.sort_by_key(|&(ruled_out, _)| ruled_out);

    values.into_iter().map(|(_, word_id)| word_id).collect()
}

/// One choice point on the search stack.
#[derive(Debug)]
struct Frame {
    variable_id: VariableId,
    values: Vec<WordId>,

    /// Index of the next value to try.
    next: usize,

    /// Domains as narrowed by inference after assigning this frame's current value. `None` when
    /// inference is off or no value is assigned yet.
    pruned: Option<Domains>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Check for a complete assignment, otherwise push a new choice point.
    Descend,

    /// Try the next value of the top choice point, popping it when it runs out.
    Advance,

    Exhausted,
}

/// Resumable backtracking search. Each call to `next_solution` continues from where the last one
/// stopped, so iterating a `Search` enumerates every distinct solution.
#[derive(Debug)]
pub struct Search<'a> {
    crossword: &'a Crossword,
    options: SolverOptions,
    domains: Domains,
    frames: Vec<Frame>,
    assignment: Assignment,
    phase: Phase,
    statistics: Statistics,
    start: Instant,

    /// What ended the search when it was exhausted: `NoAssignmentFound`, or `Unsatisfiable` when
    /// arc consistency ruled the puzzle out before the search began.
    exhausted_by: FillFailure,

    /// Why the most recent call to `next_solution` returned no assignment.
    failure: Option<FillFailure>,
}

impl<'a> Search<'a> {
    /// Start a search over the given domains, which are read but never modified.
    pub fn new(crossword: &'a Crossword, domains: Domains, options: SolverOptions) -> Search<'a> {
        Search {
            crossword,
            options,
            domains,
            frames: vec![],
            assignment: Assignment::empty(crossword.variables().len()),
            phase: Phase::Descend,
            statistics: Statistics::default(),
            start: Instant::now(),
            exhausted_by: FillFailure::NoAssignmentFound,
            failure: None,
        }
    }

    fn unsatisfiable(
        crossword: &'a Crossword,
        domains: Domains,
        options: SolverOptions,
    ) -> Search<'a> {
        let mut search = Search::new(crossword, domains, options);
        search.phase = Phase::Exhausted;
        search.exhausted_by = FillFailure::Unsatisfiable;
        search
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Why the last call to `next_solution` (or `next`) came back empty, if it did. After an
    /// iterator is drained this tells a finished enumeration apart from one cut off by the
    /// deadline.
    pub fn failure(&self) -> Option<FillFailure> {
        self.failure
    }

    fn fail(&mut self, failure: FillFailure) -> Result<Assignment, FillFailure> {
        self.statistics.duration = self.start.elapsed();
        self.failure = Some(failure);
        Err(failure)
    }

    /// The domains in effect below the first `depth` choice points.
    fn domains_at(&self, depth: usize) -> &Domains {
        self.frames[..depth]
            .iter()
            .rev()
            .find_map(|frame| frame.pruned.as_ref())
            .unwrap_or(&self.domains)
    }

    /// Continue the search until the next complete, consistent assignment.
    pub fn next_solution(&mut self) -> Result<Assignment, FillFailure> {
        loop {
            if let Some(deadline) = self.options.deadline {
                if Instant::now() >= deadline {
                    debug!("search deadline exceeded after {} states", self.statistics.states);
                    return self.fail(FillFailure::DeadlineExceeded);
                }
            }

            match self.phase {
                Phase::Exhausted => return self.fail(self.exhausted_by),
                Phase::Descend => {
                    if is_complete(self.crossword, &self.assignment) {
                        self.statistics.solutions += 1;
                        self.statistics.duration = self.start.elapsed();
                        self.phase =
                            if self.frames.is_empty() { Phase::Exhausted } else { Phase::Advance };
                        self.failure = None;

                        return Ok(self.assignment.clone());
                    }

                    self.push_frame();
                    self.phase = Phase::Advance;
                }
                Phase::Advance => self.advance(),
            }
        }
    }

    fn push_frame(&mut self) {
        let domains = self.domains_at(self.frames.len());

        let Some(variable_id) =
            select_unassigned_variable(self.crossword, domains, &self.assignment)
        else {
            return;
        };

        let values = if self.options.least_constraining_value {
            order_domain_values(self.crossword, domains, &self.assignment, variable_id)
        } else {
            domains.iter(variable_id).collect()
        };

        trace!(
            "depth {}: variable {} with {} options",
            self.frames.len(),
            variable_id,
            values.len()
        );

        self.frames.push(Frame { variable_id, values, next: 0, pruned: None });
    }

    /// Undo the top choice point's current value and try its next one. On success the phase
    /// becomes `Descend`; when the values run out the choice point is popped.
    fn advance(&mut self) {
        let depth = self.frames.len();
        let Some(frame) = self.frames.last_mut() else {
            self.phase = Phase::Exhausted;
            return;
        };

        let variable_id = frame.variable_id;
        self.assignment.unassign(variable_id);
        frame.pruned = None;

        if frame.next >= frame.values.len() {
            self.frames.pop();
            self.statistics.backtracks += 1;
            trace!("backtracking from variable {}", variable_id);
            return;
        }

        let word_id = frame.values[frame.next];
        frame.next += 1;
        self.statistics.states += 1;

        if !is_consistent_with(self.crossword, &self.assignment, variable_id, word_id) {
            return;
        }
        self.assignment.assign(variable_id, word_id);

        if self.options.inference {
            let mut pruned = self.domains_at(depth - 1).clone();
            pruned.restrict_to(variable_id, word_id);

            let arcs: Vec<Arc> = self
                .crossword
                .neighbors(variable_id)
                .map(|neighbor| (neighbor, variable_id))
                .collect();

            if !ac3(self.crossword, &mut pruned, Some(arcs)) {
                self.assignment.unassign(variable_id);
                return;
            }

            self.frames[depth - 1].pruned = Some(pruned);
        }

        self.phase = Phase::Descend;
    }
}

impl Iterator for Search<'_> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        self.next_solution().ok()
    }
}

/// Owns the pruned domains for one puzzle. Construction runs node consistency and AC-3; `solve`
/// and `solutions` search from the result.
#[derive(Debug)]
pub struct Solver<'a> {
    crossword: &'a Crossword,
    options: SolverOptions,
    domains: Domains,
    arc_consistent: bool,
}

impl<'a> Solver<'a> {
    pub fn new(crossword: &'a Crossword, options: SolverOptions) -> Solver<'a> {
        let mut domains = Domains::initialize(crossword);
        enforce_node_consistency(crossword, &mut domains);
        let arc_consistent = ac3(crossword, &mut domains, None);

        Solver { crossword, options, domains, arc_consistent }
    }

    /// The domains left by node and arc consistency.
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Did arc consistency leave every domain non-empty?
    pub fn is_arc_consistent(&self) -> bool {
        self.arc_consistent
    }

    pub fn solve(&self) -> Result<FillSuccess, FillFailure> {
        if !self.arc_consistent {
            info!("arc consistency ruled out every fill");
            return Err(FillFailure::Unsatisfiable);
        }

        let mut search = self.solutions();
        let result = search.next_solution();
        let statistics = search.statistics().clone();

        match result {
            Ok(assignment) => {
                info!(
                    "found a fill after {} states and {} backtracks in {:?}",
                    statistics.states, statistics.backtracks, statistics.duration
                );
                Ok(FillSuccess { statistics, assignment })
            }
            Err(failure) => {
                info!("{} after {} states", failure, statistics.states);
                Err(failure)
            }
        }
    }

    /// Iterate over every solution, in search order.
    pub fn solutions(&self) -> Search<'a> {
        if self.arc_consistent {
            Search::new(self.crossword, self.domains.clone(), self.options.clone())
        } else {
            Search::unsatisfiable(self.crossword, self.domains.clone(), self.options.clone())
        }
    }
}

/// Search for a fill for the given crossword with the default options.
pub fn find_fill(crossword: &Crossword) -> Result<FillSuccess, FillFailure> {
    find_fill_with_options(crossword, SolverOptions::default())
}

pub fn find_fill_with_options(
    crossword: &Crossword,
    options: SolverOptions,
) -> Result<FillSuccess, FillFailure> {
    Solver::new(crossword, options).solve()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::crossword::Direction::{Across, Down};

    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Two 3-letter slots crossing at their middle letters.
    fn middle_crossing(words: &[&str]) -> Crossword {
        Crossword::new(
            vec![Variable::new(1, 0, Across, 3), Variable::new(0, 1, Down, 3)],
            words.iter().copied(),
        )
        .unwrap()
    }

    fn all_option_combinations() -> Vec<SolverOptions> {
        [(true, true), (true, false), (false, true), (false, false)]
            .into_iter()
            .map(|(lcv, inference)| {
                SolverOptions::default()
                    .with_least_constraining_value(lcv)
                    .with_inference(inference)
            })
            .collect()
    }

    fn assert_valid_fill(crossword: &Crossword, assignment: &Assignment) {
        assert!(is_complete(crossword, assignment));
        assert!(is_consistent(crossword, assignment));
    }

    #[test]
    fn test_find_fill_for_middle_crossing() {
        init_logging();
        let crossword = middle_crossing(&["cat", "car", "dog"]);

        let result = find_fill(&crossword).expect("Failed to find a fill");
        let fill = result.assignment.to_map(&crossword);

        assert_valid_fill(&crossword, &result.assignment);
        assert_eq!(fill[&Variable::new(1, 0, Across, 3)], "cat");
        assert_eq!(fill[&Variable::new(0, 1, Down, 3)], "car");
        assert_eq!(result.statistics.solutions, 1);
    }

    #[test]
    fn test_fill_fails_gracefully_without_a_matching_pair() {
        init_logging();
        let crossword = middle_crossing(&["cat", "dog", "pin"]);

        assert_eq!(find_fill(&crossword).unwrap_err(), FillFailure::Unsatisfiable);
    }

    #[test]
    fn test_empty_dictionary_reports_failure() {
        init_logging();
        let crossword = middle_crossing(&[]);
        assert!(find_fill(&crossword).is_err());

        let isolated =
            Crossword::new(vec![Variable::new(0, 0, Across, 4)], Vec::<String>::new()).unwrap();
        assert_eq!(find_fill(&isolated).unwrap_err(), FillFailure::NoAssignmentFound);
    }

    #[test]
    fn test_isolated_variable_takes_the_only_fitting_word() {
        let crossword =
            Crossword::new(vec![Variable::new(2, 3, Down, 4)], ["cat", "lion", "tigers"]).unwrap();

        let result = find_fill(&crossword).expect("Failed to find a fill");

        assert_eq!(result.assignment.word(&crossword, 0), Some("lion"));
        assert_eq!(result.assignment.len(), 1);
    }

    #[test]
    fn test_distinctness_rules_out_identical_words() {
        // Both slots would have to hold "aaa".
        let crossword = middle_crossing(&["aaa", "abc"]);

        for options in all_option_combinations() {
            assert!(find_fill_with_options(&crossword, options).is_err());
        }

        // Same structure without arc consistency still finds nothing.
        let mut domains = Domains::initialize(&crossword);
        enforce_node_consistency(&crossword, &mut domains);
        let mut search = Search::new(&crossword, domains, SolverOptions::default());
        assert_eq!(search.next_solution().unwrap_err(), FillFailure::NoAssignmentFound);
    }

    #[test]
    fn test_distinctness_applies_to_non_neighbors() {
        let crossword = Crossword::new(
            vec![Variable::new(0, 0, Across, 3), Variable::new(4, 4, Across, 3)],
            ["cat", "dog"],
        )
        .unwrap();

        let result = find_fill(&crossword).expect("Failed to find a fill");
        let first = result.assignment.get(0);
        let second = result.assignment.get(1);

        assert!(first.is_some() && second.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn test_no_variables_is_trivially_solved() {
        let crossword = Crossword::new(vec![], ["cat"]).unwrap();

        let result = find_fill(&crossword).expect("Failed to find a fill");
        assert!(result.assignment.is_empty());
    }

    #[test]
    fn test_select_unassigned_variable_prefers_small_domains_then_degree() {
        let crossword = Crossword::from_template("___\n_#_\n___", ["abc", "cde", "efg"]).unwrap();
        let mut domains = Domains::initialize(&crossword);
        let mut assignment = Assignment::empty(crossword.variables().len());

        // All domains and degrees are equal: input order wins.
        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(0));

        domains.remove(2, 0);
        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(2));

        assignment.assign(2, 1);
        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(0));
    }

    #[test]
    fn test_select_unassigned_variable_breaks_ties_by_degree() {
        // Variable 0 crosses nothing; variables 1 and 2 cross each other.
        let crossword = Crossword::new(
            vec![
                Variable::new(5, 5, Across, 2),
                Variable::new(0, 0, Across, 2),
                Variable::new(0, 0, Down, 2),
            ],
            ["ab", "ac"],
        )
        .unwrap();
        let domains = Domains::initialize(&crossword);
        let assignment = Assignment::empty(3);

        assert_eq!(select_unassigned_variable(&crossword, &domains, &assignment), Some(1));
    }

    #[test]
    fn test_order_domain_values_puts_least_constraining_first() {
        let crossword = middle_crossing(&["cat", "car", "cab"]);
        let mut domains = Domains::initialize(&crossword);
        let assignment = Assignment::empty(2);

        // "cat" is still an option for the neighbor, the others are not.
        domains.remove(1, 1);
        domains.remove(1, 2);

        assert_eq!(order_domain_values(&crossword, &domains, &assignment, 0), vec![1, 2, 0]);
    }

    #[test]
    fn test_order_domain_values_ignores_assigned_neighbors() {
        let crossword = middle_crossing(&["cat", "car"]);
        let domains = Domains::initialize(&crossword);
        let mut assignment = Assignment::empty(2);
        assignment.assign(1, 1);

        assert_eq!(order_domain_values(&crossword, &domains, &assignment, 0), vec![0, 1]);
    }

    #[test]
    fn test_is_consistent() {
        let crossword = middle_crossing(&["cat", "car", "dog", "ox"]);
        let mut assignment = Assignment::empty(2);

        assignment.assign(0, 0);
        assert!(is_consistent(&crossword, &assignment));
        assert!(!is_complete(&crossword, &assignment));

        assignment.assign(1, 1);
        assert!(is_consistent(&crossword, &assignment));
        assert!(is_complete(&crossword, &assignment));

        assignment.assign(1, 2);
        assert!(!is_consistent(&crossword, &assignment), "letters disagree");

        assignment.assign(1, 0);
        assert!(!is_consistent(&crossword, &assignment), "word used twice");

        assignment.assign(1, 3);
        assert!(!is_consistent(&crossword, &assignment), "wrong length");

        assert_eq!(assignment.unassign(1), Some(3));
        assert_eq!(assignment.len(), 1);
    }

    #[test]
    fn test_solutions_enumerates_every_fill() {
        let crossword = middle_crossing(&["cat", "car", "bar"]);

        for options in all_option_combinations() {
            let solver = Solver::new(&crossword, options);
            let mut fills: Vec<(String, String)> = solver
                .solutions()
                .map(|assignment| {
                    (
                        assignment.word(&crossword, 0).unwrap().to_string(),
                        assignment.word(&crossword, 1).unwrap().to_string(),
                    )
                })
                .collect();
            fills.sort();

            let expected: Vec<(String, String)> = [
                ("bar", "car"),
                ("bar", "cat"),
                ("car", "bar"),
                ("car", "cat"),
                ("cat", "bar"),
                ("cat", "car"),
            ]
            .iter()
            .map(|&(a, b)| (a.to_string(), b.to_string()))
            .collect();

            assert_eq!(fills, expected);
        }
    }

    #[test]
    fn test_search_does_not_modify_solver_domains() {
        let crossword =
            Crossword::from_template("___\n_#_\n___", ["abc", "cde", "efg", "aha", "cxe", "ayg"])
                .unwrap();
        let solver = Solver::new(&crossword, SolverOptions::default());
        let before = solver.domains().clone();

        let _ = solver.solutions().count();

        assert_eq!(solver.domains(), &before);
    }

    #[test]
    fn test_find_fill_for_3x3_square() {
        init_logging();
        let crossword = Crossword::from_template(
            "
            ___
            ___
            ___
            ",
            ["ten", "are", "rat", "tar", "era", "net", "ten", "cat", "sea"],
        )
        .unwrap();

        let result = find_fill(&crossword).expect("Failed to find a fill");

        assert_valid_fill(&crossword, &result.assignment);
    }

    #[test]
    fn test_expired_deadline_stops_search() {
        let crossword = middle_crossing(&["cat", "car"]);
        let options = SolverOptions::default().with_deadline(Instant::now());

        assert_eq!(
            find_fill_with_options(&crossword, options).unwrap_err(),
            FillFailure::DeadlineExceeded
        );
    }

    #[test]
    fn test_expired_deadline_is_reported_after_iterating() {
        let crossword = middle_crossing(&["cat", "car"]);

        let timed = Solver::new(&crossword, SolverOptions::default().with_deadline(Instant::now()));
        let mut search = timed.solutions();
        assert_eq!(search.by_ref().count(), 0);
        assert_eq!(search.failure(), Some(FillFailure::DeadlineExceeded));

        let untimed = Solver::new(&crossword, SolverOptions::default());
        let mut search = untimed.solutions();
        assert_eq!(search.by_ref().count(), 2);
        assert_eq!(search.failure(), Some(FillFailure::NoAssignmentFound));
    }

    #[test]
    fn test_solutions_report_unsatisfiable_puzzles() {
        let crossword = middle_crossing(&["cat", "dog"]);
        let mut search = Solver::new(&crossword, SolverOptions::default()).solutions();

        assert_eq!(search.next(), None);
        assert_eq!(search.failure(), Some(FillFailure::Unsatisfiable));
        assert_eq!(search.next_solution().unwrap_err(), FillFailure::Unsatisfiable);
    }

    fn words_strategy() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[abc]{3}", 0..14)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_returned_fills_are_complete_and_consistent(words in words_strategy()) {
            let crossword = Crossword::from_template("___\n_#_\n___", &words).unwrap();

            if let Ok(result) = find_fill(&crossword) {
                prop_assert!(is_complete(&crossword, &result.assignment));
                prop_assert!(is_consistent(&crossword, &result.assignment));
                for (_, word_id) in result.assignment.iter() {
                    prop_assert!(words.contains(&crossword.word(word_id).string));
                }
            }
        }

        #[test]
        fn prop_options_never_change_satisfiability(words in words_strategy()) {
            let crossword = Crossword::from_template("___\n_#_\n___", &words).unwrap();

            let outcomes: Vec<bool> = all_option_combinations()
                .into_iter()
                .map(|options| find_fill_with_options(&crossword, options).is_ok())
                .collect();

            // Plain backtracking over node-consistent domains, without AC-3 up front.
            let mut domains = Domains::initialize(&crossword);
            enforce_node_consistency(&crossword, &mut domains);
            let plain = SolverOptions::default().with_inference(false);
            let raw = Search::new(&crossword, domains, plain).next_solution().is_ok();

            for outcome in outcomes {
                prop_assert_eq!(outcome, raw);
            }
        }

        #[test]
        fn prop_solution_count_is_independent_of_options(
            words in proptest::collection::vec("[ab]{3}", 0..8)
        ) {
            let crossword = Crossword::from_template("___\n_#_\n___", &words).unwrap();

            let counts: Vec<usize> = all_option_combinations()
                .into_iter()
                .map(|options| Solver::new(&crossword, options).solutions().count())
                .collect();

            for count in &counts {
                prop_assert_eq!(*count, counts[0]);
            }
        }
    }
}
