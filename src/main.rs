use std::{env, fs, path::Path, process};

use pebble::bytecode::{check, disasm, image};
use pebble::{Bytecode, Vm, VmConfig, compile};

struct Options {
    filename: String,
    asm: bool,
    bytecode: bool,
    check_only: bool,
    image: bool,
    max_steps: Option<usize>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() == 1 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let options = match parse_args(&args[1..]) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_usage();
            process::exit(1);
        }
    };

    ensure_extension(&options.filename, if options.asm { "pasm" } else { "pbl" });

    let source = match fs::read_to_string(&options.filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", options.filename, e);
            process::exit(1);
        }
    };

    let program = load_program(&source, options.asm);

    if options.bytecode {
        disasm::print_bc(&program);
    }

    if options.image {
        print_image(&program);
    }

    if options.check_only {
        match check::check(&program) {
            Ok(()) => println!("ok: {} cells", program.len()),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
        return;
    }

    run_program(&program, options.max_steps);
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut filename = None;
    let mut options = Options {
        filename: String::new(),
        asm: false,
        bytecode: false,
        check_only: false,
        image: false,
        max_steps: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--asm" => options.asm = true,
            "--bc" | "--bytecode" => options.bytecode = true,
            "--check" => options.check_only = true,
            "--image" => options.image = true,
            "--max-steps" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--max-steps needs a value".to_string())?;
                let steps = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid --max-steps value '{}'", value))?;
                options.max_steps = Some(steps);
            }
            flag if flag.starts_with('-') => return Err(format!("unknown flag '{}'", flag)),
            // first non-flag argument is the filename
            name if filename.is_none() => filename = Some(name.to_string()),
            extra => return Err(format!("unexpected argument '{}'", extra)),
        }
    }

    options.filename = filename.ok_or_else(|| "no input file".to_string())?;
    Ok(options)
}

fn ensure_extension(filename: &str, expected: &str) {
    let path = Path::new(filename);
    if path.extension().and_then(|e| e.to_str()) != Some(expected) {
        eprintln!("Error: expected a .{} file, got {}", expected, filename);
        process::exit(1);
    }
}

fn load_program(source: &str, asm: bool) -> Bytecode {
    if asm {
        match source.parse::<Bytecode>() {
            Ok(program) => program,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
    } else {
        match compile(source) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
    }
}

fn print_image(program: &Bytecode) {
    match image::encode(program) {
        Ok(bytes) => {
            println!("=== IMAGE ({} bytes) ===", bytes.len());
            print!("{}", image::hex_dump(&bytes));
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn run_program(program: &Bytecode, max_steps: Option<usize>) {
    let config = VmConfig {
        max_steps,
        ..VmConfig::default()
    };
    let mut vm = Vm::with_config(program, config);

    if let Err(e) = vm.run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn print_usage() {
    println!("PEBBLE - tiny compiler and stack machine");
    println!();
    println!("Usage:");
    println!("  pebble <file.pbl>                 Compile and run a program");
    println!("  pebble --bc <file.pbl>            Show bytecode, then run");
    println!("  pebble --asm <file.pasm>          Run assembled bytecode");
    println!("  pebble --check <file>             Verify stack effects only");
    println!("  pebble --image <file>             Show the binary image, then run");
    println!("  pebble --max-steps <n> <file>     Fault after n instructions");
    println!("  pebble --help, -h                 Show this help");
}
