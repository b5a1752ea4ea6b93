use pest_derive::Parser;

/// Pest parser generated from the assembly grammar in `grammar.pest`.
#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct AsmParser;
