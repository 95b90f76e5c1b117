//! Runs every registered transpose kernel over the tuned shapes, checks
//! the result, and reports simulated cache behavior per kernel.

use std::cell::RefCell;
use std::process::ExitCode;

use rand::prelude::*;

use cachetile::cache::{aligned_span, CacheSim, TracedGrid, TracedGridMut};
use cachetile::transpose::is_transpose;
use cachetile::{Grid, GridMut, Kernel, Result};

/// Tuned shapes as (cols, rows) of the source matrix.
const SHAPES: [(usize, usize); 3] = [(32, 32), (32, 64), (64, 64)];

fn report_shape(m: usize, n: usize, rng: &mut StdRng) -> Result<bool> {
    println!("\n{n} rows x {m} cols");
    println!("{}", "-".repeat(68));

    let a_data: Vec<i32> = (0..n * m).map(|_| rng.random_range(-1000..1000)).collect();
    let mut all_ok = true;

    for kernel in Kernel::ALL.into_iter().filter(|k| k.supports(m, n)) {
        let mut b_data = vec![0i32; m * n];
        let sim = RefCell::new(CacheSim::new());

        {
            let a = TracedGrid::new(Grid::from_slice(n, m, &a_data)?, 0, &sim);
            let mut b = TracedGridMut::new(
                GridMut::from_slice(m, n, &mut b_data)?,
                aligned_span(n * m),
                &sim,
            );
            kernel.run(&a, &mut b);
        }

        let a = Grid::from_slice(n, m, &a_data)?;
        let b = Grid::from_slice(m, n, &b_data)?;
        let ok = is_transpose(&a, &b);
        all_ok &= ok;

        let sim = sim.borrow();
        println!(
            "  {:<40} {:>6} misses {:>7} hits  {}",
            kernel.label(),
            sim.misses(),
            sim.hits(),
            if ok { "ok" } else { "WRONG RESULT" },
        );
    }

    Ok(all_ok)
}

fn run() -> Result<bool> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut all_ok = true;

    for (m, n) in SHAPES {
        all_ok &= report_shape(m, n, &mut rng)?;
    }

    Ok(all_ok)
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("\nat least one kernel produced a wrong result");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
