//! Zips a documentation tree against a compiled tree for annotated
//! rendering.
//!
//! Either side may be absent at any level. The union of documented and
//! compiled children is walked recursively; array-element documentation is
//! attached to the conceptual first element only, and the reserved
//! array/embedded roles are illegal where a struct or map is expected.

use std::collections::BTreeSet;

use crate::docs::{DocKey, DocNode, DocType};
use crate::error::{StrataError, StrataResult};
use crate::render::Encodeable;
use crate::sort::float_cmp;
use crate::tree::{Kind, Node, Scalar};

const NOTICE_DEPRECATED: &str = "!!! DEPRECATED !!!";

/// A documentation node combined with a compiled value.
#[derive(Debug, Default)]
pub(crate) struct Unified {
    doc: Option<DocNode>,
    key: Option<String>,
    value: Option<Scalar>,
    preset: Option<Scalar>,
    inline: Vec<String>,
    indent: i32,
    array: bool,
    children: Vec<(String, Unified)>,
}

impl Unified {
    /// Whether this node renders its children as array elements.
    pub(crate) fn is_array(&self) -> bool {
        self.array
    }
}

/// Build the unified tree for `compiled` with optional documentation and an
/// optional defaults-only tree supplying `default:` header lines.
pub(crate) fn calc_unified(
    doc: Option<&DocNode>,
    compiled: Option<&Node>,
    presets: Option<&Node>,
    with_origins: bool,
) -> StrataResult<Unified> {
    calc(None, -1, doc, compiled, presets, with_origins)
}

fn calc(
    name: Option<&str>,
    indent: i32,
    doc: Option<&DocNode>,
    compiled: Option<&Node>,
    presets: Option<&Node>,
    with_origins: bool,
) -> StrataResult<Unified> {
    let mut u = Unified {
        doc: doc.cloned(),
        key: name.map(str::to_owned),
        indent,
        ..Unified::default()
    };

    let doc_array = doc.is_some_and(|d| d.type_tag == DocType::Array);
    let doc_map_len = doc.map_or(0, |d| {
        if d.type_tag == DocType::Array {
            0
        } else {
            d.children.len()
        }
    });
    let array_len = array_children(compiled).map_or(0, Vec::len);
    let map_len = doc_map_len.max(map_len_of(compiled));

    // A leaf: nothing documented below and nothing compiled below.
    if array_len + map_len == 0 {
        u.value = scalar_of(compiled).cloned();
        u.preset = scalar_of(presets).cloned();
        if with_origins
            && let Some(node) = compiled
        {
            u.inline = node.origins().iter().map(ToString::to_string).collect();
        }
        return Ok(u);
    }

    if (doc_array && map_len > 0) || (map_len > 0 && array_len > 0) {
        return Err(StrataError::type_mismatch(
            name.unwrap_or_default(),
            "conflicting definitions: array and map cannot coexist in the same object",
        ));
    }

    if doc_array || array_len > 0 {
        calc_array(u, indent, compiled, presets, with_origins)
    } else {
        calc_map(u, indent, compiled, presets, with_origins)
    }
}

fn calc_array(
    mut u: Unified,
    indent: i32,
    compiled: Option<&Node>,
    presets: Option<&Node>,
    with_origins: bool,
) -> StrataResult<Unified> {
    u.array = true;

    let mut next_doc = u.doc.as_ref().map(|d| {
        d.children
            .get(&DocKey::ArrayElement)
            .unwrap_or(d)
            .clone()
    });

    let preset_items = array_children(presets);
    if let Some(items) = array_children(compiled) {
        for (i, item) in items.iter().enumerate() {
            let child = calc(
                None,
                indent + 1,
                next_doc.as_ref(),
                Some(item),
                preset_items.and_then(|p| p.get(i)),
                with_origins,
            )?;
            // Documentation attaches to the conceptual first element only.
            next_doc = None;
            u.children.push((i.to_string(), child));
        }
    }

    u.children.sort_by(|a, b| float_cmp(&a.0, &b.0));
    Ok(u)
}

fn calc_map(
    mut u: Unified,
    indent: i32,
    compiled: Option<&Node>,
    presets: Option<&Node>,
    with_origins: bool,
) -> StrataResult<Unified> {
    let mut names: BTreeSet<String> = map_keys(compiled);

    if let Some(d) = &u.doc {
        for key in d.children.keys() {
            match key {
                DocKey::ArrayElement => {
                    return Err(StrataError::type_mismatch(
                        u.key.as_deref().unwrap_or_default(),
                        "array element documentation cannot be used in a map object",
                    ));
                }
                DocKey::Embedded => {
                    return Err(StrataError::type_mismatch(
                        u.key.as_deref().unwrap_or_default(),
                        "embedded documentation cannot be used in a map object",
                    ));
                }
                // Key and value documentation is folded into the map's type
                // description rather than emitted as children.
                DocKey::MapKey | DocKey::MapValue => {}
                DocKey::Named(n) => {
                    names.insert(n.clone());
                }
            }
        }
    }

    for name in names {
        let next_doc = u
            .doc
            .as_ref()
            .and_then(|d| d.children.get(&DocKey::Named(name.clone())))
            .cloned();
        let next_compiled = map_child(compiled, &name);
        let next_preset = map_child(presets, &name);

        let child = calc(
            Some(&name),
            indent + 1,
            next_doc.as_ref(),
            next_compiled,
            next_preset,
            with_origins,
        )?;
        u.children.push((name, child));
    }

    u.children.sort_by(|a, b| float_cmp(&a.0, &b.0));
    Ok(u)
}

fn scalar_of(node: Option<&Node>) -> Option<&Scalar> {
    match node?.kind() {
        Kind::Scalar(s) => Some(s),
        _ => None,
    }
}

fn array_children(node: Option<&Node>) -> Option<&Vec<Node>> {
    match node?.kind() {
        Kind::Array(items) => Some(items),
        _ => None,
    }
}

fn map_len_of(node: Option<&Node>) -> usize {
    match node.map(Node::kind) {
        Some(Kind::Map(entries)) => entries.len(),
        _ => 0,
    }
}

fn map_keys(node: Option<&Node>) -> BTreeSet<String> {
    match node.map(Node::kind) {
        Some(Kind::Map(entries)) => entries.keys().cloned().collect(),
        _ => BTreeSet::new(),
    }
}

fn map_child<'a>(node: Option<&'a Node>, name: &str) -> Option<&'a Node> {
    match node?.kind() {
        Kind::Map(entries) => entries.get(name),
        _ => None,
    }
}

impl Encodeable for Unified {
    fn indent(&self) -> i32 {
        self.indent
    }

    /// Header block, in fixed order: deprecation banner, doc lines, type
    /// line, default line, closing banner.
    fn headers(&self) -> Vec<String> {
        let mut rv: Vec<String> = Vec::new();
        let mut deprecated = false;

        if let Some(doc) = &self.doc {
            rv = doc.doc.split('\n').map(str::to_owned).collect();
            deprecated = doc.deprecated;

            let typ = doc.type_string();
            let mut typs: Vec<String> = typ.split('\n').map(str::to_owned).collect();
            if let Some(first) = typs.first_mut() {
                *first = format!("type: {first}");
            }
            if doc.type_tag == DocType::Root {
                // The root carries no type line.
                typs.remove(0);
            }
            rv.extend(typs);
        }

        if let Some(preset) = &self.preset {
            rv.push(format!("default: {}", preset.render()));
        }

        if deprecated {
            rv.insert(0, NOTICE_DEPRECATED.to_owned());
            rv.push(NOTICE_DEPRECATED.to_owned());
        }

        rv
    }

    fn inline(&self) -> Vec<String> {
        self.inline.clone()
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn value(&self) -> Option<String> {
        self.value.as_ref().map(Scalar::render)
    }

    fn children(&self) -> Vec<&dyn Encodeable> {
        self.children
            .iter()
            .map(|(_, child)| child as &dyn Encodeable)
            .collect()
    }
}
