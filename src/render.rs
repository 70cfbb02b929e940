use std::collections::HashSet;

use crate::crossword::{Crossword, GridCoord};
use crate::search::Assignment;

/// Character drawn for cells that aren't part of any variable.
pub const BLOCK: char = '█';

/// Lay the assigned words out on the grid. Cells no assigned word covers are `None`.
pub fn letter_grid(crossword: &Crossword, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; crossword.width()]; crossword.height()];

    for (variable_id, word_id) in assignment.iter() {
        let word = crossword.word(word_id);

        for ((row, col), &glyph) in crossword.variable(variable_id).cells().zip(&word.glyphs) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Every cell covered by at least one variable.
pub(crate) fn open_cells(crossword: &Crossword) -> HashSet<GridCoord> {
    crossword.variables().iter().flat_map(|variable| variable.cells()).collect()
}

/// Turn the given crossword and assignment into a rendered string: letters where words were
/// placed, a space for open cells left empty, and `BLOCK` everywhere else.
pub fn render_grid(crossword: &Crossword, assignment: &Assignment) -> String {
    let open = open_cells(crossword);

    letter_grid(crossword, assignment)
        .iter()
        .enumerate()
        .map(|(row, letters)| {
            letters
                .iter()
                .enumerate()
                .map(|(col, letter)| match letter {
                    Some(glyph) => *glyph,
                    None if open.contains(&(row, col)) => ' ',
                    None => BLOCK,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::crossword::Crossword;
    use crate::search::{find_fill, Assignment};

    use super::*;

    #[test]
    fn test_render_grid() {
        let crossword = Crossword::from_template(
            "
            #___
            #_##
            ",
            ["cat", "cx", "dog"],
        )
        .unwrap();

        let result = find_fill(&crossword).expect("Failed to find a fill");

        assert_eq!(render_grid(&crossword, &result.assignment), "█cat\n█x██");
    }

    #[test]
    fn test_render_partial_assignment() {
        let crossword = Crossword::from_template("___\n_##", ["abc", "ax"]).unwrap();
        let mut assignment = Assignment::empty(crossword.variables().len());
        assignment.assign(1, 1);

        assert_eq!(letter_grid(&crossword, &assignment)[1], vec![Some('x'), None, None]);
        assert_eq!(render_grid(&crossword, &assignment), "a  \nx██");
    }
}
