use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};

use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::MAX_SLOT_LENGTH;

/// An identifier for a variable, based on its index in the Crossword's `variables` field.
pub type VariableId = usize;

/// An identifier for a word, based on its index in the Crossword's `words` field.
pub type WordId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A slot to be filled. Two variables are the same variable only if all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Variable {
        Variable { row, col, direction, length }
    }

    /// Generate the coords for each cell of this variable.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> {
        let Variable { row, col, direction, length } = *self;

        (0..length).map(move |cell_idx| match direction {
            Direction::Across => (row, col + cell_idx),
            Direction::Down => (row + cell_idx, col),
        })
    }
}

/// A dictionary entry. Glyphs are the word's chars, so `glyphs[i]` is the letter the word places
/// in cell `i` of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    pub fn new(string: &str) -> Word {
        Word { string: string.to_string(), glyphs: string.chars().collect() }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// A crossing between one variable and another: cell `cell` of this variable must hold the same
/// letter as cell `other_cell` of variable `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other: VariableId,
    pub cell: usize,
    pub other_cell: usize,
}

/// Ways a puzzle structure can be malformed. These are caught when the `Crossword` is built, never
/// during solving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("variable {0:?} appears more than once")]
    DuplicateVariable(Variable),

    #[error("variable {0:?} has zero length")]
    EmptyVariable(Variable),

    #[error("variable {0:?} runs past the largest representable grid coordinate")]
    OutOfBounds(Variable),

    #[error("{first:?} and {second:?} run in the same direction through cell {cell:?}")]
    ParallelOverlap { first: Variable, second: Variable, cell: GridCoord },

    #[error("more than two variables share cell {0:?}")]
    CrowdedCell(GridCoord),

    #[error("invalid overlap between variables {x} and {y}: {reason}")]
    InvalidOverlap { x: VariableId, y: VariableId, reason: &'static str },

    #[error("unexpected character {ch:?} at row {row}, column {col}")]
    UnexpectedCell { ch: char, row: usize, col: usize },
}

/// The static description of a puzzle: its variables, how they cross, and the candidate words.
/// Nothing here changes once it's built.
pub struct Crossword {
    variables: Vec<Variable>,
    crossings: Vec<SmallVec<[Crossing; MAX_SLOT_LENGTH]>>,
    words: Vec<Word>,
    height: usize,
    width: usize,
}

impl Debug for Crossword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crossword")
            .field("variables", &self.variables)
            .field("crossings", &self.crossings)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .field("height", &self.height)
            .field("width", &self.width)
            .finish()
    }
}

/// Deduplicate the word list, keeping the first occurrence of each word.
fn build_words<I, S>(word_list: I) -> Vec<Word>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();

    word_list
        .into_iter()
        .filter_map(|word| {
            let word = word.as_ref();
            if seen.insert(word.to_string()) {
                Some(Word::new(word))
            } else {
                None
            }
        })
        .collect()
}

fn validate_variables(variables: &[Variable]) -> Result<(), StructureError> {
    let mut seen: HashSet<Variable> = HashSet::with_capacity(variables.len());

    for &variable in variables {
        if variable.length == 0 {
            return Err(StructureError::EmptyVariable(variable));
        }
        let (along, across) = match variable.direction {
            Direction::Across => (variable.col, variable.row),
            Direction::Down => (variable.row, variable.col),
        };
        if along.checked_add(variable.length).is_none() || across.checked_add(1).is_none() {
            return Err(StructureError::OutOfBounds(variable));
        }
        if !seen.insert(variable) {
            return Err(StructureError::DuplicateVariable(variable));
        }
    }

    Ok(())
}

/// Smallest (height, width) that contains every cell of every variable.
fn bounding_box(variables: &[Variable]) -> (usize, usize) {
    variables
        .iter()
        .flat_map(|variable| variable.cells())
        .fold((0, 0), |(height, width), (row, col)| (height.max(row + 1), width.max(col + 1)))
}

impl Crossword {
    /// Build a crossword whose overlaps are derived from the grid geometry of its variables.
    pub fn new<I, S>(variables: Vec<Variable>, word_list: I) -> Result<Crossword, StructureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate_variables(&variables)?;

        // Map each cell to the (variable, cell index) pairs that cover it.
        let mut cell_by_loc: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
            HashMap::new();

        for (variable_id, variable) in variables.iter().enumerate() {
            for (cell_idx, loc) in variable.cells().enumerate() {
                let entries = cell_by_loc.entry(loc).or_insert_with(|| smallvec![]);

                if entries.len() >= 2 {
                    return Err(StructureError::CrowdedCell(loc));
                }
                if let Some(&(other_id, _)) = entries.first() {
                    if variables[other_id].direction == variable.direction {
                        return Err(StructureError::ParallelOverlap {
                            first: variables[other_id],
                            second: *variable,
                            cell: loc,
                        });
                    }
                }
                entries.push((variable_id, cell_idx));
            }
        }

        let crossings: Vec<SmallVec<[Crossing; MAX_SLOT_LENGTH]>> = variables
            .iter()
            .enumerate()
            .map(|(variable_id, variable)| {
                variable
                    .cells()
                    .enumerate()
                    .flat_map(|(cell_idx, loc)| {
                        cell_by_loc[&loc]
                            .iter()
                            .filter(|&&(other, _)| other != variable_id)
                            .map(move |&(other, other_cell)| Crossing {
                                other,
                                cell: cell_idx,
                                other_cell,
                            })
                            .collect::<SmallVec<[Crossing; 1]>>()
                    })
                    .collect()
            })
            .collect();

        let (height, width) = bounding_box(&variables);

        Ok(Crossword { variables, crossings, words: build_words(word_list), height, width })
    }

    /// Build a crossword from explicitly declared overlaps `(x, y, i, j)`, meaning cell `i` of
    /// variable `x` must equal cell `j` of variable `y`. The reverse overlap is implied.
    pub fn with_overlaps<O, I, S>(
        variables: Vec<Variable>,
        overlaps: O,
        word_list: I,
    ) -> Result<Crossword, StructureError>
    where
        O: IntoIterator<Item = (VariableId, VariableId, usize, usize)>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate_variables(&variables)?;

        let invalid = |x, y, reason| StructureError::InvalidOverlap { x, y, reason };
        let mut declared: HashMap<(VariableId, VariableId), (usize, usize)> = HashMap::new();
        let mut crossings: Vec<SmallVec<[Crossing; MAX_SLOT_LENGTH]>> =
            variables.iter().map(|_| smallvec![]).collect();

        for (x, y, i, j) in overlaps {
            if x >= variables.len() || y >= variables.len() {
                return Err(invalid(x, y, "unknown variable"));
            }
            if x == y {
                return Err(invalid(x, y, "a variable cannot overlap itself"));
            }
            if i >= variables[x].length || j >= variables[y].length {
                return Err(invalid(x, y, "offset outside the variable"));
            }

            let (key, offsets) = if x < y { ((x, y), (i, j)) } else { ((y, x), (j, i)) };
            match declared.get(&key) {
                Some(&existing) if existing == offsets => continue,
                Some(_) => return Err(invalid(x, y, "pair declared with conflicting offsets")),
                None => {
                    declared.insert(key, offsets);
                }
            }

            crossings[x].push(Crossing { other: y, cell: i, other_cell: j });
            crossings[y].push(Crossing { other: x, cell: j, other_cell: i });
        }

        for variable_crossings in &mut crossings {
            variable_crossings.sort_by_key(|crossing| (crossing.cell, crossing.other));
        }

        let (height, width) = bounding_box(&variables);

        Ok(Crossword { variables, crossings, words: build_words(word_list), height, width })
    }

    /// Build a crossword from a text template, with `_` or `.` representing open cells and `#`
    /// representing blocks. Lines are trimmed and blank lines are skipped; a short line is padded
    /// with blocks. Every run of two or more open cells becomes a variable.
    pub fn from_template<I, S>(template: &str, word_list: I) -> Result<Crossword, StructureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<&str> =
            template.lines().map(|line| line.trim()).filter(|line| !line.is_empty()).collect();

        let mut open: Vec<Vec<bool>> = Vec::with_capacity(lines.len());
        for (row, line) in lines.iter().enumerate() {
            let cells = line
                .chars()
                .enumerate()
                .map(|(col, ch)| match ch {
                    '_' | '.' => Ok(true),
                    '#' => Ok(false),
                    _ => Err(StructureError::UnexpectedCell { ch, row, col }),
                })
                .collect::<Result<Vec<bool>, StructureError>>()?;
            open.push(cells);
        }

        let height = open.len();
        let width = open.iter().map(|cells| cells.len()).max().unwrap_or(0);
        let is_open = |row: usize, col: usize| open[row].get(col).copied().unwrap_or(false);

        fn push_run(
            variables: &mut Vec<Variable>,
            start: Option<GridCoord>,
            length: usize,
            direction: Direction,
        ) {
            if let Some((row, col)) = start {
                if length > 1 {
                    variables.push(Variable::new(row, col, direction, length));
                }
            }
        }

        let mut variables: Vec<Variable> = vec![];

        for row in 0..height {
            let mut start: Option<GridCoord> = None;
            let mut length = 0;
            for col in 0..width {
                if is_open(row, col) {
                    if start.is_none() {
                        start = Some((row, col));
                    }
                    length += 1;
                } else {
                    push_run(&mut variables, start.take(), length, Direction::Across);
                    length = 0;
                }
            }
            push_run(&mut variables, start, length, Direction::Across);
        }

        for col in 0..width {
            let mut start: Option<GridCoord> = None;
            let mut length = 0;
            for row in 0..height {
                if is_open(row, col) {
                    if start.is_none() {
                        start = Some((row, col));
                    }
                    length += 1;
                } else {
                    push_run(&mut variables, start.take(), length, Direction::Down);
                    length = 0;
                }
            }
            push_run(&mut variables, start, length, Direction::Down);
        }

        let mut crossword = Crossword::new(variables, word_list)?;
        crossword.height = height;
        crossword.width = width;

        Ok(crossword)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variables[variable_id]
    }

    /// Look up a variable's id from its identity.
    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variables.iter().position(|candidate| candidate == variable)
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn crossings(&self, variable_id: VariableId) -> &[Crossing] {
        &self.crossings[variable_id]
    }

    /// The offsets `(i, j)` at which `x` and `y` share a cell, if they do.
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<(usize, usize)> {
        self.crossings[x]
            .iter()
            .find(|crossing| crossing.other == y)
            .map(|crossing| (crossing.cell, crossing.other_cell))
    }

    /// Every variable sharing a cell with `variable_id`.
    pub fn neighbors(&self, variable_id: VariableId) -> impl Iterator<Item = VariableId> + '_ {
        self.crossings[variable_id].iter().map(|crossing| crossing.other)
    }

    pub fn degree(&self, variable_id: VariableId) -> usize {
        self.crossings[variable_id].len()
    }

    /// Every ordered pair `(x, y)` where `y` is a neighbor of `x`.
    pub fn arcs(&self) -> impl Iterator<Item = (VariableId, VariableId)> + '_ {
        (0..self.variables.len()).flat_map(move |x| self.neighbors(x).map(move |y| (x, y)))
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }
}
