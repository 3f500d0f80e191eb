use clap::Parser;
use matrix_mul::{Config, GridPolicy, Matrix, MatrixMul, PaddingPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Multiply two random square matrices on a simulated process grid.
#[derive(Debug, Parser)]
#[command(name = "matrix-mul", version)]
struct Args {
    /// Number of ranks to launch
    #[arg(short, long, default_value_t = 4)]
    procs: usize,

    /// Matrix dimension N
    #[arg(short = 'n', long, default_value_t = 8)]
    size: usize,

    /// Seed for the random operands
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Multiply identity matrices instead of random ones
    #[arg(long)]
    identity: bool,

    #[arg(long, value_enum, default_value_t = PaddingPolicy::PowerOfTwo)]
    padding: PaddingPolicy,

    /// Fail unless the process count is a perfect square
    #[arg(long)]
    strict: bool,

    /// Compare against a sequential product
    #[arg(long)]
    verify: bool,

    /// Print the operands and the result
    #[arg(long)]
    print: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (a, b) = if args.identity {
        (Matrix::identity(args.size), Matrix::identity(args.size))
    } else {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let a = Matrix::random(args.size, &mut rng);
        let b = Matrix::random(args.size, &mut rng);
        (a, b)
    };

    let grid = if args.strict {
        GridPolicy::RequireSquare
    } else {
        GridPolicy::ExcludeExtra
    };
    let config = Config::new().with_padding(args.padding).with_grid(grid);
    let mm = MatrixMul::new(args.procs).with_config(config);

    println!(
        "Multiplying {n}x{n} matrices on a {q}x{q} grid ({p} processes, {padding:?} padding)",
        n = args.size,
        q = mm.grid_dim(),
        p = mm.procs(),
        padding = mm.config().padding,
    );
    if args.print {
        print_matrix("Matrix A", &a);
        print_matrix("Matrix B", &b);
    }

    let c = mm.multiply(&a, &b).await?;

    if args.print {
        print_matrix("Result", &c);
    }

    if args.verify {
        let expected = a.reference_product(&b)?;
        let err = c.max_relative_error(&expected);
        println!("Max relative error vs sequential product: {:e}", err);
        if err > 1e-6 {
            eprintln!("Verification failed");
            std::process::exit(1);
        }
        println!("Verification passed");
    }

    Ok(())
}

fn print_matrix(label: &str, m: &Matrix) {
    println!("{}:", label);
    for row in m.clone().into_rows() {
        println!("  {:?}", row);
    }
}
