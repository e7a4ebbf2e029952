//! Reader for the `.mdpa` mesh description format.
//!
//! The format is line based. Blocks open with `Begin <Kind> [args]` and close
//! with `End <Kind>`; `//` starts a comment that runs to the end of the line.

use std::path::{Path, PathBuf};

use mp_core::Id;

use crate::error::{ModelError, ModelResult};
use crate::model_part::{ModelPart, SubModelPart};
use crate::variables::Variable;

/// Counts of what one read added to the model part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub nodes: usize,
    pub elements: usize,
    pub conditions: usize,
    pub sub_model_parts: usize,
}

/// Resolve an input filename; a name without extension gets `.mdpa` appended.
pub fn mdpa_path(base_dir: &Path, input_filename: &str) -> PathBuf {
    let mut path = base_dir.join(input_filename);
    if path.extension().is_none() {
        path.set_extension("mdpa");
    }
    path
}

pub fn read_model_part(path: &Path, model_part: &mut ModelPart) -> ModelResult<ImportSummary> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), model_part = model_part.name(), "reading mdpa");
    parse_mdpa(&content, model_part)
}

pub fn parse_mdpa(content: &str, model_part: &mut ModelPart) -> ModelResult<ImportSummary> {
    let mut lines = Lines::new(content);
    let mut summary = ImportSummary::default();

    while let Some((line, tokens)) = lines.next_tokens() {
        match tokens.as_slice() {
            ["Begin", "ModelPartData", ..] => parse_model_part_data(&mut lines, model_part)?,
            ["Begin", "Properties", id, ..] => {
                let id = parse_u32(id, line)?;
                parse_properties(&mut lines, model_part, id)?;
            }
            ["Begin", "Table", ..] => lines.skip_block("Table")?,
            ["Begin", "Nodes", ..] => summary.nodes += parse_nodes(&mut lines, model_part)?,
            ["Begin", "Elements", name, ..] => {
                summary.elements += parse_elements(&mut lines, model_part, name)?
            }
            ["Begin", "Conditions", name, ..] => {
                summary.conditions += parse_conditions(&mut lines, model_part, name)?
            }
            ["Begin", "NodalData", variable, ..] => {
                parse_nodal_data(&mut lines, model_part, variable, line)?
            }
            ["Begin", "SubModelPart", name, ..] => {
                let sub = parse_sub_model_part(&mut lines, model_part, name)?;
                model_part.sub_model_parts.insert(sub.name.clone(), sub);
                summary.sub_model_parts += 1;
            }
            _ => {
                return Err(ModelError::Parse {
                    line,
                    message: format!("unexpected '{}'", tokens.join(" ")),
                });
            }
        }
    }

    tracing::debug!(?summary, "mdpa parsed");
    Ok(summary)
}

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> Lines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            inner: content.lines().enumerate(),
            last_line: 0,
        }
    }

    /// Next non-empty line, comments stripped, as (1-based line number, tokens).
    fn next_tokens(&mut self) -> Option<(usize, Vec<&'a str>)> {
        for (index, raw) in self.inner.by_ref() {
            self.last_line = index + 1;
            let text = match raw.find("//") {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if !tokens.is_empty() {
                return Some((index + 1, tokens));
            }
        }
        None
    }

    /// Feed every line of a block to `f` until its `End <kind>` line.
    fn for_each_in_block(
        &mut self,
        kind: &str,
        mut f: impl FnMut(&mut Self, usize, &[&'a str]) -> ModelResult<()>,
    ) -> ModelResult<()> {
        loop {
            let Some((line, tokens)) = self.next_tokens() else {
                return Err(ModelError::Parse {
                    line: self.last_line,
                    message: format!("missing 'End {kind}'"),
                });
            };
            if tokens.first() == Some(&"End") {
                if tokens.get(1) == Some(&kind) {
                    return Ok(());
                }
                return Err(ModelError::Parse {
                    line,
                    message: format!("expected 'End {kind}', found '{}'", tokens.join(" ")),
                });
            }
            f(self, line, &tokens)?;
        }
    }

    fn skip_block(&mut self, kind: &str) -> ModelResult<()> {
        tracing::debug!(kind, "skipping mdpa block");
        self.for_each_in_block(kind, |_, _, _| Ok(()))
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ModelError {
    ModelError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_id(token: &str, line: usize) -> ModelResult<Id> {
    let value: u64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid id '{token}'")))?;
    Id::new(value).map_err(|e| parse_error(line, e.to_string()))
}

fn parse_u32(token: &str, line: usize) -> ModelResult<u32> {
    token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid integer '{token}'")))
}

fn parse_f64(token: &str, line: usize) -> ModelResult<f64> {
    token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number '{token}'")))
}

fn parse_model_part_data(lines: &mut Lines<'_>, model_part: &mut ModelPart) -> ModelResult<()> {
    lines.for_each_in_block("ModelPartData", |_, line, tokens| match tokens {
        [key, value] => {
            let value = parse_f64(value, line)?;
            model_part.process_info.values.insert(key.to_string(), value);
            Ok(())
        }
        _ => Err(parse_error(line, "expected '<KEY> <value>'")),
    })
}

fn parse_properties(lines: &mut Lines<'_>, model_part: &mut ModelPart, id: u32) -> ModelResult<()> {
    let mut entries = std::collections::BTreeMap::new();
    lines.for_each_in_block("Properties", |lines, line, tokens| match tokens {
        ["Begin", "Table", ..] => lines.skip_block("Table"),
        [key, rest @ ..] if !rest.is_empty() => {
            entries.insert(key.to_string(), rest.join(" "));
            Ok(())
        }
        _ => Err(parse_error(line, "expected '<KEY> <value>'")),
    })?;
    model_part.properties.entry(id).or_default().extend(entries);
    Ok(())
}

fn parse_nodes(lines: &mut Lines<'_>, model_part: &mut ModelPart) -> ModelResult<usize> {
    let mut count = 0;
    lines.for_each_in_block("Nodes", |_, line, tokens| match tokens {
        [id, x, y, z] => {
            let id = parse_id(id, line)?;
            let (x, y, z) = (parse_f64(x, line)?, parse_f64(y, line)?, parse_f64(z, line)?);
            model_part
                .create_new_node(id, x, y, z)
                .map_err(|e| parse_error(line, e.to_string()))?;
            count += 1;
            Ok(())
        }
        _ => Err(parse_error(line, "expected '<id> <x> <y> <z>'")),
    })?;
    Ok(count)
}

/// Split `<id> <properties> <node>...` into its parts.
fn parse_connectivity(tokens: &[&str], line: usize) -> ModelResult<(Id, u32, Vec<Id>)> {
    match tokens {
        [id, properties, nodes @ ..] if !nodes.is_empty() => {
            let id = parse_id(id, line)?;
            let properties = parse_u32(properties, line)?;
            let nodes = nodes
                .iter()
                .map(|n| parse_id(n, line))
                .collect::<ModelResult<Vec<_>>>()?;
            Ok((id, properties, nodes))
        }
        _ => Err(parse_error(line, "expected '<id> <properties> <node>...'")),
    }
}

fn parse_elements(
    lines: &mut Lines<'_>,
    model_part: &mut ModelPart,
    name: &str,
) -> ModelResult<usize> {
    let mut count = 0;
    lines.for_each_in_block("Elements", |_, line, tokens| {
        let (id, properties, nodes) = parse_connectivity(tokens, line)?;
        model_part
            .create_new_element(name, id, properties, nodes)
            .map_err(|e| parse_error(line, e.to_string()))?;
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

fn parse_conditions(
    lines: &mut Lines<'_>,
    model_part: &mut ModelPart,
    name: &str,
) -> ModelResult<usize> {
    let mut count = 0;
    lines.for_each_in_block("Conditions", |_, line, tokens| {
        let (id, properties, nodes) = parse_connectivity(tokens, line)?;
        model_part
            .create_new_condition(name, id, properties, nodes)
            .map_err(|e| parse_error(line, e.to_string()))?;
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

/// Scalar nodal values: `<node id> <fixed flag> <value>`.
///
/// Values for variables the model part does not store are skipped.
fn parse_nodal_data(
    lines: &mut Lines<'_>,
    model_part: &mut ModelPart,
    variable: &str,
    header_line: usize,
) -> ModelResult<()> {
    let variable = Variable::from_name(variable)
        .ok_or_else(|| parse_error(header_line, format!("unknown variable '{variable}'")))?;
    let stored = model_part.has_nodal_solution_step_variable(variable);
    if !stored {
        tracing::warn!(%variable, "nodal data for a variable that is not stored, skipping");
    }

    lines.for_each_in_block("NodalData", |_, line, tokens| match tokens {
        [id, _fixed, value] => {
            let id = parse_id(id, line)?;
            let value = parse_f64(value, line)?;
            if stored {
                model_part
                    .node_mut(id)
                    .and_then(|node| node.set_solution_step_value(variable, value))
                    .map_err(|e| parse_error(line, e.to_string()))?;
            }
            Ok(())
        }
        _ => Err(parse_error(line, "expected '<node> <fixed> <value>'")),
    })
}

#[derive(Clone, Copy)]
enum EntityKind {
    Node,
    Element,
    Condition,
}

fn parse_entity_list(
    lines: &mut Lines<'_>,
    model_part: &ModelPart,
    block: &str,
    kind: EntityKind,
    into: &mut std::collections::BTreeSet<Id>,
) -> ModelResult<()> {
    lines.for_each_in_block(block, |_, line, tokens| {
        for token in tokens {
            let id = parse_id(token, line)?;
            let (known, what) = match kind {
                EntityKind::Node => (model_part.has_node(id), "node"),
                EntityKind::Element => (model_part.has_element(id), "element"),
                EntityKind::Condition => (model_part.has_condition(id), "condition"),
            };
            if !known {
                return Err(parse_error(line, format!("{block} references unknown {what} {id}")));
            }
            into.insert(id);
        }
        Ok(())
    })
}

fn parse_sub_model_part(
    lines: &mut Lines<'_>,
    model_part: &ModelPart,
    name: &str,
) -> ModelResult<SubModelPart> {
    let mut sub = SubModelPart::new(name);
    lines.for_each_in_block("SubModelPart", |lines, line, tokens| match tokens {
        ["Begin", "SubModelPartData", ..] => lines.skip_block("SubModelPartData"),
        ["Begin", "SubModelPartTables", ..] => lines.skip_block("SubModelPartTables"),
        ["Begin", "SubModelPartProperties", ..] => lines.skip_block("SubModelPartProperties"),
        ["Begin", "SubModelPartNodes", ..] => parse_entity_list(
            lines,
            model_part,
            "SubModelPartNodes",
            EntityKind::Node,
            &mut sub.nodes,
        ),
        ["Begin", "SubModelPartElements", ..] => parse_entity_list(
            lines,
            model_part,
            "SubModelPartElements",
            EntityKind::Element,
            &mut sub.elements,
        ),
        ["Begin", "SubModelPartConditions", ..] => parse_entity_list(
            lines,
            model_part,
            "SubModelPartConditions",
            EntityKind::Condition,
            &mut sub.conditions,
        ),
        ["Begin", "SubModelPart", inner, ..] => {
            let inner = parse_sub_model_part(lines, model_part, inner)?;
            sub.sub_model_parts.insert(inner.name.clone(), inner);
            Ok(())
        }
        _ => Err(parse_error(
            line,
            format!("unexpected '{}' in SubModelPart {name}", tokens.join(" ")),
        )),
    })?;
    Ok(sub)
}
