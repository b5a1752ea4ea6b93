use crate::parser::Rule;
use crate::{new_parser_error, Result};
use pest::iterators::Pair;
use std::collections::HashMap;

/// Label name to instruction index. A label names the index of the next
/// instruction, so successive labels collapse onto the same index and a
/// trailing label equals the program length (the terminator slot).
pub type LabelMap<'i> = HashMap<&'i str, usize>;

pub fn define_label<'i>(
    labels: &mut LabelMap<'i>,
    pair: &Pair<'i, Rule>,
    index: usize,
) -> Result<()> {
    let identifier = pair.clone().into_inner().next().unwrap();
    let name = identifier.as_str();

    if labels.insert(name, index).is_some() {
        return Err(new_parser_error(
            identifier.as_span(),
            format!("Label \"{}\" is already defined", name),
        ));
    }

    Ok(())
}
