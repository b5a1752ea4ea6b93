#[macro_use]
extern crate clap;

use clap::{App, Arg};
use pcpu::{Machine, Word};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug)]
enum IoContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Compile(pcc::Error),
    Assemble(pasm::Error),
    Exec(pcpu::ExecError, Option<u32>),
    Io(std::io::Error, IoContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Compile(err) => write!(f, "Compiling input failed: {}", err),
            Error::Assemble(err) => {
                writeln!(f, "Assembling input failed:")?;
                write!(f, "{}", err)
            }
            Error::Exec(err, line) => {
                write!(f, "Execution failed: {}", err)?;
                if let Some(line) = line {
                    write!(f, " (assembly line {})", line)?;
                }
                Ok(())
            }
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IoContext::ReadInput => "Reading input",
                    IoContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
        }
    }
}

fn main() {
    let matches = App::new("pico")
        .version(crate_version!())
        .about("Compiles, assembles and runs pico programs")
        .arg(
            Arg::with_name("INPUT")
                .help("Source (.pico), assembly (.pasm) or image (.pimg) file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("emit_asm")
                .short("a")
                .long("emit-asm")
                .help("Stop after compiling and write the assembly listing"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Write the produced artifact instead of running"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");
    let emit_asm = matches.is_present("emit_asm");

    if let Err(err) = pico(input, output, emit_asm) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn read_input(path: &Path) -> Result<String, Error> {
    let file = File::open(path)
        .map_err(|err| Error::Io(err, IoContext::ReadInput, path.to_owned()))?;
    let mut text = String::new();
    BufReader::new(file)
        .read_to_string(&mut text)
        .map_err(|err| Error::Io(err, IoContext::ReadInput, path.to_owned()))?;
    Ok(text)
}

fn write_text(path: &Path, text: &str) -> Result<(), Error> {
    let file = File::create(path)
        .map_err(|err| Error::Io(err, IoContext::WriteOutput, path.to_owned()))?;
    BufWriter::new(file)
        .write_all(text.as_bytes())
        .map_err(|err| Error::Io(err, IoContext::WriteOutput, path.to_owned()))
}

fn pico(input: &str, output: Option<&str>, emit_asm: bool) -> Result<(), Error> {
    let input_path = Path::new(input);
    let extension = input_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    // A saved image resumes directly.
    if extension == "pimg" {
        let image = pimg::read_file(input_path)
            .map_err(|err| Error::Io(err, IoContext::ReadInput, input_path.to_owned()))?;
        return run(image.restore(), &[]);
    }

    let assembly = if extension == "pasm" {
        read_input(input_path)?
    } else {
        let source = read_input(input_path)?;
        let (assembly, _) = pcc::compile(&source).map_err(Error::Compile)?;
        assembly
    };

    if emit_asm {
        let output_path = output
            .map(PathBuf::from)
            .unwrap_or_else(|| input_path.with_extension("pasm"));
        return write_text(&output_path, &assembly);
    }

    let (rom, source_map) = pasm::assemble_with_map(&assembly).map_err(Error::Assemble)?;

    let mut machine = Machine::new();
    machine.install(rom);

    if let Some(output) = output {
        let output_path = PathBuf::from(output);
        return pimg::write_file(&output_path, &pimg::Image::snapshot(&machine))
            .map_err(|err| Error::Io(err, IoContext::WriteOutput, output_path));
    }

    run(machine, &source_map)
}

fn run(mut machine: Machine, source_map: &[u32]) -> Result<(), Error> {
    machine.set_io_handler(|input: &mut Word, output: Word| {
        println!("sync: output = {}", output);
        *input = 0;
    });

    machine.run().map_err(|err| {
        let line = source_map.get(err.pc()).cloned();
        Error::Exec(err, line)
    })?;

    static NAMES: [&str; 8] = ["ra", "sp", "s0", "s1", "s2", "s3", "s4", "s5"];
    for (name, value) in NAMES.iter().zip(machine.registers().iter()) {
        println!("{} = {}", name, value);
    }
    println!("output = {}", machine.output());

    Ok(())
}
