//! Variable expansion over the merged configuration tree.
//!
//! Expansion is a bounded textual substitution pass: every directive scans
//! all scalar string leaves for `start`…`end` delimited placeholders and
//! replaces the ones its provider resolves. The full directive list re-runs
//! until a complete pass changes nothing; exceeding the iteration budget
//! with changes still pending is a fatal non-convergence error.

use std::sync::Arc;

use tracing::trace;

use crate::error::{StrataError, StrataResult};
use crate::tree::{Kind, Node, Origin, Scalar};

/// Default iteration budget guarding against runaway expansion.
pub(crate) const DEFAULT_MAXIMUM: usize = 10_000;

/// Maps a placeholder's inner text to a replacement.
pub trait Expander: Send + Sync {
    /// Resolve `name` (the text between the delimiters, delimiters
    /// excluded). Return `None` to leave the placeholder untouched.
    fn expand(&self, name: &str) -> Option<String>;
}

impl<F> Expander for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn expand(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Environment variable lookup provider used by `expand_env`.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct EnvExpander;

impl Expander for EnvExpander {
    fn expand(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// One expansion directive: delimiters, provider, origin label and pass
/// budget.
#[derive(Clone)]
pub(crate) struct Directive {
    pub origin: String,
    pub start: String,
    pub end: String,
    pub maximum: usize,
    pub provider: Arc<dyn Expander>,
}

impl std::fmt::Debug for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directive")
            .field("origin", &self.origin)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("maximum", &self.maximum)
            .finish_non_exhaustive()
    }
}

/// Expand variables in `tree` to a fixed point.
///
/// Directives apply in declaration order within each pass; the whole list
/// re-runs until a pass produces no change so that one provider's output can
/// feed another's delimiters regardless of ordering.
///
/// # Errors
///
/// Returns [`StrataError::ExpansionNotConverged`] when the pass budget is
/// exhausted while changes are still being produced.
pub(crate) fn expand_tree(tree: &mut Node, directives: &[Directive]) -> StrataResult<()> {
    if directives.is_empty() {
        return Ok(());
    }

    let budget = directives
        .iter()
        .map(|d| d.maximum)
        .max()
        .unwrap_or(DEFAULT_MAXIMUM);

    let mut changed = true;
    let mut pass = 0;
    let mut last_changed: Option<&Directive> = None;

    while changed && pass < budget {
        changed = false;
        for directive in directives {
            if pass < directive.maximum && apply_directive(tree, directive) {
                changed = true;
                last_changed = Some(directive);
            }
        }
        pass += 1;
        trace!(pass, changed, "expansion pass complete");
    }

    if changed {
        let origin = last_changed.map(|d| d.origin.clone()).unwrap_or_default();
        return Err(Arc::new(StrataError::ExpansionNotConverged {
            origin,
            maximum: budget,
        }));
    }

    Ok(())
}

fn apply_directive(node: &mut Node, directive: &Directive) -> bool {
    match &mut node.kind {
        Kind::Scalar(Scalar::String(value)) => {
            let Some(expanded) = expand_string(value, directive) else {
                return false;
            };
            *value = expanded;
            annotate(node, directive);
            true
        }
        Kind::Scalar(_) => false,
        Kind::Map(entries) => {
            let mut changed = false;
            for child in entries.values_mut() {
                changed |= apply_directive(child, directive);
            }
            changed
        }
        Kind::Array(items) => {
            let mut changed = false;
            for child in items.iter_mut() {
                changed |= apply_directive(child, directive);
            }
            changed
        }
    }
}

/// Record which directive expanded this value so later inspection can tell
/// expanded values from verbatim ones.
fn annotate(node: &mut Node, directive: &Directive) {
    if directive.origin.is_empty() {
        return;
    }
    if node.origins.iter().any(|o| o.file == directive.origin) {
        return;
    }
    node.origins.push(Origin::named(&directive.origin));
}

/// Substitute every resolvable placeholder in `value`. Returns `None` when
/// nothing changed. Unterminated or unresolved placeholders are left as-is.
fn expand_string(value: &str, directive: &Directive) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut changed = false;

    while let Some(start_at) = rest.find(&directive.start) {
        let name_at = start_at + directive.start.len();
        let Some(end_off) = rest[name_at..].find(&directive.end) else {
            // Unterminated placeholder; emit the remainder untouched.
            break;
        };

        let name = &rest[name_at..name_at + end_off];
        let after = name_at + end_off + directive.end.len();
        out.push_str(&rest[..start_at]);
        match directive.provider.expand(name) {
            Some(replacement) => {
                out.push_str(&replacement);
                changed = true;
            }
            None => out.push_str(&rest[start_at..after]),
        }
        rest = &rest[after..];
    }

    if !changed {
        return None;
    }
    out.push_str(rest);
    Some(out)
}
