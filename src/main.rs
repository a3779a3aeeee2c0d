use std::io::{self, Read};

use rlisp::eval::{Machine, DEFAULT_CAPACITY};
use rlisp::heap::MAX_CAPACITY;
use rlisp::reader::Reader;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut capacity = DEFAULT_CAPACITY;
    let mut show_stats = false;
    let mut source: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" => {
                match args.get(i + 1).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n > 0 && n <= MAX_CAPACITY => capacity = n,
                    _ => {
                        eprintln!(
                            "--capacity requires a cell count between 1 and {}",
                            MAX_CAPACITY
                        );
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--stats" => {
                show_stats = true;
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: rlisp [OPTIONS] [FILE]");
                println!();
                println!("Evaluates every expression in FILE (or standard input if FILE is");
                println!("omitted or '-') and prints each result on its own line.");
                println!();
                println!("Options:");
                println!("  --capacity <n>   Arena size in cells (default {})", DEFAULT_CAPACITY);
                println!("  --stats          Print arena statistics to stderr when done");
                println!("  --help, -h       Show this help message");
                println!();
                println!("Environment variables:");
                println!("  RUST_LOG=debug   Log every collection");
                std::process::exit(0);
            }
            other if source.is_none() && (other == "-" || !other.starts_with("--")) => {
                source = Some(other.to_string());
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'rlisp --help' for usage information.");
                std::process::exit(1);
            }
        }
    }

    let input = match source.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                eprintln!("Error reading standard input: {}", e);
                std::process::exit(1);
            }
            buf
        }
        Some(path) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading {}: {}", path, e);
                std::process::exit(1);
            }
        },
    };

    let mut machine = Machine::new(capacity);
    let ok = run(&mut machine, &input);

    if show_stats {
        print_stats(&machine);
    }
    if !ok {
        std::process::exit(1);
    }
}

/// Read and evaluate one expression at a time so no parsed but unevaluated
/// tree sits outside the collector's view. Returns false if anything failed.
fn run(machine: &mut Machine, input: &str) -> bool {
    let mut reader = Reader::new(input);
    let mut ok = true;
    let mut count = 0;
    loop {
        match reader.read(machine) {
            Ok(Some(expr)) => {
                count += 1;
                match machine.eval(expr) {
                    Ok(val) => println!("{}", machine.print(val)),
                    Err(e) => {
                        eprintln!("Expression {}: {}", count, e);
                        ok = false;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("{}", e);
                return false;
            }
        }
    }
    log::info!("evaluated {} expressions", count);
    ok
}

fn print_stats(machine: &Machine) {
    let heap = &machine.heap;
    eprintln!(
        "  Heap: {} of {} cells used, {} free, {} collections, {} cells reclaimed",
        heap.used(),
        heap.capacity(),
        heap.free_count(),
        heap.stats.collections,
        heap.stats.reclaimed
    );
    eprintln!(
        "  Atoms: {} interned, Roots: {} pinned",
        machine.atoms.count(),
        machine.root_count()
    );
}
