//! Template renderer.
//!
//! Renders the template body against the header namespace with `{variable}`
//! substitution (`{{`/`}}` for literal braces) and resolves hook directives.
//!
//! # Syntax
//!
//! - `{name}` - substitutes the value of variable `name`
//! - `{{` / `}}` - render as literal `{` / `}`
//! - `@inlet <name>`, `@outlet <name>`, `@pipe <name>` - directive lines,
//!   consumed by the renderer; they select registered hooks by name and
//!   never appear in the rendered prompt
//!
//! The engine is fail-safe: undefined variables are an error rather than a
//! silent empty substitution. The pipeline degrades a render error into a
//! diagnostic prompt, so the conversation still receives content.

use crate::error::EngineError;
use crate::hooks::{HookRegistry, HookSet};
use crate::types::Header;
use std::collections::BTreeMap;
use std::path::Path;

/// Rendered template output: the final prompt and the resolved hook set.
pub struct Rendered {
    pub prompt: String,
    pub hooks: HookSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    Inlet,
    Outlet,
    Pipe,
}

/// Render the template body against the header plus the work-area path.
pub fn render(
    body: &str,
    header: &Header,
    workdir: &Path,
    registry: &HookRegistry,
) -> Result<Rendered, EngineError> {
    let mut directives = Vec::new();
    let mut template_lines = Vec::new();

    for line in body.split('\n') {
        match parse_directive(line) {
            Some(directive) => directives.push(directive),
            None => template_lines.push(line),
        }
    }

    let mut vars = header.template_namespace();
    vars.insert("workdir".to_string(), workdir.display().to_string());

    let prompt = substitute(&template_lines.join("\n"), &vars)?;
    let hooks = resolve_hooks(&directives, registry);

    Ok(Rendered { prompt, hooks })
}

fn parse_directive(line: &str) -> Option<(HookKind, String)> {
    let rest = line.trim().strip_prefix('@')?;
    let (kind, name) = rest.split_once(char::is_whitespace)?;
    let kind = match kind {
        "inlet" => HookKind::Inlet,
        "outlet" => HookKind::Outlet,
        "pipe" => HookKind::Pipe,
        _ => return None,
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((kind, name.to_string()))
}

/// Adapt recognized directive names into the fixed three-slot override set.
/// Duplicates resolve last-wins; an unknown name leaves the slot as it was.
fn resolve_hooks(directives: &[(HookKind, String)], registry: &HookRegistry) -> HookSet {
    let mut hooks = HookSet::default();
    for (kind, name) in directives {
        match kind {
            HookKind::Inlet => match registry.inlet(name) {
                Some(hook) => hooks.inlet = Some(hook),
                None => tracing::warn!("unknown inlet hook: {}", name),
            },
            HookKind::Outlet => match registry.outlet(name) {
                Some(hook) => hooks.outlet = Some(hook),
                None => tracing::warn!("unknown outlet hook: {}", name),
            },
            HookKind::Pipe => match registry.pipe(name) {
                Some(hook) => hooks.pipe = Some(hook),
                None => tracing::warn!("unknown pipe hook: {}", name),
            },
        }
    }
    hooks
}

fn substitute(template: &str, vars: &BTreeMap<String, String>) -> Result<String, EngineError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(EngineError::template_render(format!(
                        "unmatched '{{' at position {}",
                        pos
                    )));
                }
                if name.is_empty() {
                    return Err(EngineError::template_render(format!(
                        "empty variable name at position {}",
                        pos
                    )));
                }
                match vars.get(&name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(EngineError::template_render(format!(
                            "undefined variable '{}' at position {}",
                            name, pos
                        )));
                    }
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}
