use mbgen::base::{Config, Hypothesis};
use mbgen::compiler::{BehaviourCompiler, BehaviourInput};
use mbgen::solver::NonLinearSolver;
use mbgen::Error;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "mbgen",
    about = "Assembles the implicit system of a material behaviour from its bricks"
)]
struct Options {
    /// JSON file describing the behaviour
    input: String,

    /// Writes the generated behaviour to this JSON file (prints the slot listing otherwise)
    #[structopt(short, long)]
    output: Option<String>,

    /// Non-linear solver used when the input does not select one
    #[structopt(short, long)]
    solver: Option<NonLinearSolver>,

    /// Modelling hypotheses used when the input does not select them
    #[structopt(short = "H", long)]
    hypotheses: Vec<Hypothesis>,

    /// Overrides a parameter (e.g. -p theta=1)
    #[structopt(short, long = "parameter")]
    parameters: Vec<String>,

    /// Prints the lifecycle phases
    #[structopt(short, long)]
    verbose: bool,

    /// Prints one line per brick and phase
    #[structopt(long)]
    verbose_bricks: bool,

    /// Prints the generated behaviour as JSON
    #[structopt(long)]
    json: bool,
}

fn parse_parameter(text: &str) -> Result<(String, f64), Error> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| Error::Input(format!("parameter '{}' must be given as name=value", text)))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::Input(format!("the value of parameter '{}' is not a number", name.trim())))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<(), Error> {
    // parse options
    let options = Options::from_args();

    // configuration
    let mut config = Config::new();
    config.set_verbose(options.verbose, options.verbose_bricks)?;
    if let Some(solver) = options.solver {
        config.set_solver(solver)?;
    }
    if !options.hypotheses.is_empty() {
        config.set_hypotheses(&options.hypotheses)?;
    }
    for text in &options.parameters {
        let (name, value) = parse_parameter(text)?;
        config.set_parameter(&name, value)?;
    }
    if options.verbose {
        println!("{}", config);
    }

    // compile
    let input = BehaviourInput::read_json(&options.input)?;
    let compiler = BehaviourCompiler::new(&config)?;
    let generated = compiler.compile(&input)?;

    // output
    match &options.output {
        Some(path) => {
            generated.write_json(path)?;
            let thin_line = format!("{:─^1$}", "", path.len());
            println!("\n{}", thin_line);
            println!("generated behaviour written to:");
            println!("{}", path);
            println!("{}\n", thin_line);
        }
        None => {
            if options.json {
                println!("{}", generated.to_json()?);
            } else {
                print!("{}", generated);
            }
        }
    }
    Ok(())
}
