//! A constraint-satisfaction solver for filling crossword grids.
//!
//! A [`Crossword`] describes the slots to fill, how they cross, and the candidate words. The
//! [`Solver`] prunes each slot's options with node and arc consistency (AC-3), then runs a
//! backtracking search ordered by minimum remaining values, degree, and least constraining value.
//!
//! ```
//! use fillgrid::{find_fill, Crossword};
//!
//! let crossword = Crossword::from_template(
//!     "
//!     #___
//!     #_##
//!     ",
//!     ["cat", "cx", "dog"],
//! )
//! .unwrap();
//!
//! let result = find_fill(&crossword).expect("Failed to find a fill");
//! println!("{}", fillgrid::render_grid(&crossword, &result.assignment));
//! ```

pub mod consistency;
pub mod crossword;
pub mod domain;
pub mod image;
pub mod render;
pub mod search;

/// The expected maximum length for a single slot. Longer slots still work, they just spill their
/// glyphs and crossings onto the heap.
pub const MAX_SLOT_LENGTH: usize = 21;

pub use consistency::{ac3, enforce_node_consistency, revise};
pub use crossword::{
    Crossing, Crossword, Direction, GridCoord, StructureError, Variable, VariableId, Word, WordId,
};
pub use domain::Domains;
pub use image::{load_font, render_image, write_png, Canvas, ImageError};
pub use render::{letter_grid, render_grid};
pub use search::{
    find_fill, find_fill_with_options, is_complete, is_consistent, order_domain_values,
    select_unassigned_variable, Assignment, FillFailure, FillSuccess, Search, Solver,
    SolverOptions, Statistics,
};
