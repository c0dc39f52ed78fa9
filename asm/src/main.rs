use color_print::{cformat, cprintln};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file
    #[clap(default_value = "main.vd8")]
    input: String,

    /// Output file (raw 256-byte memory image)
    #[clap(short, long, default_value = "main.vd8.bin")]
    output: String,

    /// Dump assembly listing
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("VD-8 Assembler");

    println!("  < {}", args.input);
    let source = std::fs::read_to_string(&args.input)
        .expect(&cformat!("<r,s>Failed to open file</>: {}", args.input));

    let assembly = match vd8asm::assemble(&source) {
        Ok(assembly) => assembly,
        Err(err) => {
            err.print_diag(&source);
            std::process::exit(1);
        }
    };

    println!("  > {}", args.output);
    std::fs::write(&args.output, assembly.image())
        .expect(&cformat!("<r,s>Failed to write file</>: {}", args.output));

    if args.dump {
        dump(&assembly);
    }
}

fn dump(assembly: &vd8asm::Assembly) {
    cprintln!("<blue>addr | bytes    | statement</>");
    println!("-----+----------+------------------------------");
    for (&address, &idx) in &assembly.addr_to_stmt {
        let stmt = &assembly.statements[idx];
        let bytes = stmt
            .codes
            .iter()
            .map(|code| format!("{:02X}", code))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{} | {:<8} | {}",
            cformat!("<green>  {:02X}</>", address),
            bytes,
            stmt.cformat()
        );
    }
}
