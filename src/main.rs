use std::{collections::HashSet, path::PathBuf, process::ExitCode, time::Instant};

use clap::{Parser as ClapParser, ValueEnum};
use colored::Colorize;

use bfwasm::{
    codegen::{assemble, disassemble, generate},
    lexer::{lexer::Lexer, TokenKind},
    optimizer::optimize,
    parser::parser::Parser,
    Optimizations,
};

/// Brainf**k to WebAssembly AOT compiler
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The file to compile
    #[arg()]
    file: PathBuf,

    /// Extra things to dump along the way
    #[arg(value_enum)]
    commands: Vec<Commands>,

    /// Optimizations to enable; replaces the default set when given
    #[arg(short = 'O', long, value_enum)]
    optimizations: Vec<OptFlag>,

    #[arg(short, long)]
    all_optimizations: bool,

    #[arg(short, long)]
    no_optimizations: bool,

    /// Where to write the module; defaults to the input path with `.wasm`
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Hash, PartialEq, Eq)]
pub enum OptFlag {
    /// Fold runs of pointer moves or cell bumps into one op
    CombineOps,
    /// `[-]` becomes a direct clear
    ClearLoop,
    /// Redistribute loops become multiply-accumulates
    CopyLoop,
    /// Single-target redistribute only
    MoveLoop,
    /// Adds to provably-zero destinations become sets
    AddToZeroAsSet,
    /// Merge store+reload of the pointer local into local.tee
    LocalTeeFusion,
}

impl OptFlag {
    fn bit(&self) -> Optimizations {
        match self {
            OptFlag::CombineOps => Optimizations::COMBINE_OPS,
            OptFlag::ClearLoop => Optimizations::CLEAR_LOOP,
            OptFlag::CopyLoop => Optimizations::COPY_LOOP,
            OptFlag::MoveLoop => Optimizations::MOVE_LOOP,
            OptFlag::AddToZeroAsSet => Optimizations::ADD_TO_ZERO_AS_SET,
            OptFlag::LocalTeeFusion => Optimizations::LOCAL_TEE_FUSION,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Hash, PartialEq, Eq)]
enum Commands {
    /// Output the tokens
    Tokens,
    /// Output the ast
    Ast,
    /// Output the optimized MIR ast
    Mir,
    /// Output the wasm instruction listing
    Asm,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let commands: HashSet<Commands> = HashSet::from_iter(args.commands.into_iter());

    let optimizations = if args.no_optimizations {
        Optimizations::empty()
    } else if args.all_optimizations {
        Optimizations::all()
    } else if args.optimizations.is_empty() {
        Optimizations::default()
    } else {
        args.optimizations
            .iter()
            .fold(Optimizations::empty(), |acc, flag| acc | flag.bit())
    };

    println!("Compiling {}", args.file.display());

    let text = match std::fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{} {}: {e}", "Error reading".red(), args.file.display());
            return ExitCode::FAILURE;
        }
    };

    println!("{}", "Starting lexing".blue());
    let now = Instant::now();
    let tokens = Lexer::new(&text).collect_tokens();
    println!("{} {:.2?}", "Finished lexing in".green(), now.elapsed());

    if commands.contains(&Commands::Tokens) {
        for token in tokens.iter() {
            print!(
                "{}",
                match &token.kind {
                    TokenKind::PointerRight => ">",
                    TokenKind::PointerLeft => "<",
                    TokenKind::Increment => "+",
                    TokenKind::Decrement => "-",
                    TokenKind::Output => ".",
                    TokenKind::Input => ",",
                    TokenKind::LoopStart => "[",
                    TokenKind::LoopEnd => "]",
                    TokenKind::Comment(c) => {
                        print!("\t\t");
                        c.as_str()
                    }
                }
            );
        }
        println!();
    }

    println!("{}", "Starting parsing".blue());
    let mut now = Instant::now();
    let program = match Parser::new(&tokens).parse_program() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}: {e}", "Error".red());
            return ExitCode::FAILURE;
        }
    };
    println!("{} {:.2?}", "Finished parsing in".green(), now.elapsed());

    if commands.contains(&Commands::Ast) {
        print!("{program}");
    }

    println!("{} {optimizations:?}", "Starting optimizations".blue());
    now = Instant::now();
    let mir = optimize(&program, optimizations);
    println!(
        "{} {} -> {} nodes in {:.2?}",
        "Finished optimizations with".green(),
        program.len(),
        mir.len(),
        now.elapsed()
    );

    if commands.contains(&Commands::Mir) {
        print!("{mir}");
    }

    println!("{}", "Starting codegen".blue());
    now = Instant::now();
    let body = generate(&mir, optimizations);
    let module = assemble(&body);
    println!(
        "{} {} bytes in {:.2?}",
        "Finished codegen with".green(),
        module.len(),
        now.elapsed()
    );

    if commands.contains(&Commands::Asm) {
        println!("{}", disassemble(&mir, optimizations));
    }

    let output = args
        .output
        .unwrap_or_else(|| args.file.with_extension("wasm"));
    if let Err(e) = std::fs::write(&output, &module) {
        eprintln!("{} {}: {e}", "Error writing".red(), output.display());
        return ExitCode::FAILURE;
    }
    println!("{} {}", "Wrote".green(), output.display());

    ExitCode::SUCCESS
}
