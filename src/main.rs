use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use fillgrid::{
    load_font, render_grid, render_image, write_png, Assignment, Crossword, FillFailure,
    ImageError, Solver, SolverOptions,
};
use instant::Duration;
use log::{error, info};

/// Fill a crossword grid from a word list.
#[derive(Parser, Debug)]
#[command(name = "fillgrid")]
struct Args {
    /// Grid template: `_` or `.` for open cells, `#` for blocks.
    structure: PathBuf,

    /// Word list, one word per line.
    words: PathBuf,

    /// Also write the rendered grid to this file. A `.png` path gets an image, anything else
    /// gets the text rendering.
    output: Option<PathBuf>,

    /// TrueType font used for the letters of a `.png` output.
    #[arg(long, default_value = "assets/fonts/OpenSans-Regular.ttf")]
    font: PathBuf,

    /// Don't run arc consistency after each tentative assignment.
    #[arg(long)]
    no_inference: bool,

    /// Try values in dictionary order instead of least-constraining first.
    #[arg(long)]
    no_lcv: bool,

    /// Give up after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Count every solution instead of stopping at the first.
    #[arg(long)]
    all: bool,
}

fn load_dictionary(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect())
}

fn is_png(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn save_image(
    crossword: &Crossword,
    assignment: &Assignment,
    font: &Path,
    output: &Path,
) -> Result<(), ImageError> {
    let font = load_font(font)?;
    let canvas = render_image(crossword, assignment, Some(&font));
    write_png(&canvas, BufWriter::new(File::create(output)?))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let template = match fs::read_to_string(&args.structure) {
        Ok(template) => template,
        Err(err) => {
            error!("can't read {}: {}", args.structure.display(), err);
            return ExitCode::from(2);
        }
    };
    let words = match load_dictionary(&args.words) {
        Ok(words) => words,
        Err(err) => {
            error!("can't read {}: {}", args.words.display(), err);
            return ExitCode::from(2);
        }
    };
    let crossword = match Crossword::from_template(&template, &words) {
        Ok(crossword) => crossword,
        Err(err) => {
            error!("bad structure in {}: {}", args.structure.display(), err);
            return ExitCode::from(2);
        }
    };
    info!(
        "{} slots, {} distinct words",
        crossword.variables().len(),
        crossword.words().len()
    );

    let mut options = SolverOptions::default()
        .with_inference(!args.no_inference)
        .with_least_constraining_value(!args.no_lcv);
    if let Some(timeout_ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(timeout_ms));
    }

    let solver = Solver::new(&crossword, options);

    if args.all {
        let mut search = solver.solutions();
        let mut count = 0;
        let failure = loop {
            match search.next_solution() {
                Ok(_) => count += 1,
                Err(failure) => break failure,
            }
        };
        info!("{:?}", search.statistics());
        if failure == FillFailure::DeadlineExceeded {
            println!("{} solutions before the time limit, search incomplete.", count);
            return ExitCode::from(1);
        }
        println!("{} solutions", count);
        return if count > 0 { ExitCode::SUCCESS } else { ExitCode::from(1) };
    }

    match solver.solve() {
        Ok(result) => {
            let display_grid = render_grid(&crossword, &result.assignment);
            info!("{:?}", result.statistics);
            println!("{}", display_grid);

            if let Some(output) = &args.output {
                let written = if is_png(output) {
                    save_image(&crossword, &result.assignment, &args.font, output)
                } else {
                    fs::write(output, format!("{}\n", display_grid)).map_err(ImageError::from)
                };
                if let Err(err) = written {
                    error!("can't write {}: {}", output.display(), err);
                    return ExitCode::from(2);
                }
                info!("written grid to {}", output.display());
            }

            ExitCode::SUCCESS
        }
        Err(FillFailure::DeadlineExceeded) => {
            println!("No solution within the time limit.");
            ExitCode::from(1)
        }
        Err(_) => {
            println!("No solution.");
            ExitCode::from(1)
        }
    }
}
