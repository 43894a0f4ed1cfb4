//! Merge semantics for configuration trees.
//!
//! Records fold left-to-right: the later record wins for scalars, maps take
//! the union of their keys, and arrays are replaced wholesale. Conflicting
//! shapes at the same path are a hard error; there is no coercion.

use super::{Kind, Node};
use crate::error::{StrataError, StrataResult};

/// Merge `later` over `earlier`, returning the combined tree.
///
/// Origins concatenate (earlier retained, later appended) so that a merged
/// value lists every contributing record in order.
///
/// # Errors
///
/// Returns [`StrataError::TypeMismatch`] when the two trees carry
/// conflicting shapes at the same path.
pub(crate) fn merge(earlier: Node, later: Node) -> StrataResult<Node> {
    merge_at(earlier, later, &mut Vec::new())
}

fn merge_at(earlier: Node, later: Node, path: &mut Vec<String>) -> StrataResult<Node> {
    // An empty node is the identity; a deliberate null carries an origin and
    // is merged as a scalar.
    if earlier.is_empty() {
        return Ok(later);
    }
    if later.is_empty() {
        return Ok(earlier);
    }

    let mut origins = earlier.origins;
    origins.extend(later.origins);

    let kind = match (earlier.kind, later.kind) {
        (Kind::Scalar(_), Kind::Scalar(next)) => Kind::Scalar(next),
        (Kind::Array(_), Kind::Array(next)) => Kind::Array(next),
        (Kind::Map(mut base), Kind::Map(next)) => {
            for (key, value) in next {
                let merged = match base.remove(&key) {
                    Some(existing) => {
                        path.push(key.clone());
                        let merged = merge_at(existing, value, path)?;
                        path.pop();
                        merged
                    }
                    None => value,
                };
                base.insert(key, merged);
            }
            Kind::Map(base)
        }
        (a, b) => {
            return Err(StrataError::type_mismatch(
                path.join("."),
                format!("conflicting definitions: cannot merge {} over {}", b.name(), a.name()),
            ));
        }
    };

    Ok(Node {
        kind,
        origins,
        secret: later.secret,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::merge;
    use crate::error::StrataError;
    use crate::tree::{Kind, Node, Origin, Scalar};

    fn leaf(value: &str, from: &str) -> Node {
        Node::scalar(Scalar::String(value.to_owned()), Origin::named(from))
    }

    fn map_of(entries: Vec<(&str, Node)>, from: &str) -> Node {
        let children: BTreeMap<String, Node> = entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();
        Node::map(children, Origin::named(from))
    }

    fn array_of(values: &[i64], from: &str) -> Node {
        let items = values
            .iter()
            .map(|v| {
                Node::scalar(
                    Scalar::Number(crate::tree::Number::from_text(v.to_string())),
                    Origin::named(from),
                )
            })
            .collect();
        Node::array(items, Origin::named(from))
    }

    #[test]
    fn later_scalar_wins_and_origins_accumulate() {
        let merged = merge(leaf("default", "defaults"), leaf("zeta", "z.json"))
            .unwrap_or_else(|e| panic!("merge failed: {e}"));

        assert_eq!(merged.kind, Kind::Scalar(Scalar::String("zeta".to_owned())));
        let files: Vec<&str> = merged.origins.iter().map(|o| o.file.as_str()).collect();
        assert_eq!(files, ["defaults", "z.json"]);
    }

    #[test]
    fn maps_union_and_recurse_on_shared_keys() {
        let a = map_of(
            vec![("status", leaf("default", "a")), ("only_a", leaf("1", "a"))],
            "a",
        );
        let b = map_of(
            vec![("status", leaf("zeta", "b")), ("only_b", leaf("2", "b"))],
            "b",
        );

        let merged = merge(a, b).unwrap_or_else(|e| panic!("merge failed: {e}"));
        let Kind::Map(children) = &merged.kind else {
            panic!("expected a map");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(
            children.get("status").map(|n| n.kind.clone()),
            Some(Kind::Scalar(Scalar::String("zeta".to_owned())))
        );
    }

    #[test]
    fn later_array_replaces_wholesale() {
        let a = map_of(vec![("a", array_of(&[1, 2, 3], "first"))], "first");
        let b = map_of(vec![("a", array_of(&[9], "second"))], "second");

        let merged = merge(a, b).unwrap_or_else(|e| panic!("merge failed: {e}"));
        let inner = merged
            .fetch("a", ".")
            .unwrap_or_else(|e| panic!("fetch failed: {e}"));
        let Kind::Array(items) = &inner.kind else {
            panic!("expected an array");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].kind,
            Kind::Scalar(Scalar::Number(crate::tree::Number::from_text("9")))
        );
    }

    #[test]
    fn conflicting_shapes_are_fatal() {
        let a = map_of(vec![("a", map_of(vec![("x", leaf("1", "l"))], "l"))], "l");
        let b = map_of(vec![("a", array_of(&[1], "r"))], "r");

        let err = merge(a, b).err().unwrap_or_else(|| panic!("expected error"));
        assert!(matches!(&*err, StrataError::TypeMismatch { key, .. } if key == "a"));
    }

    #[test]
    fn empty_nodes_are_the_identity() {
        let merged = merge(Node::default(), leaf("v", "src"))
            .unwrap_or_else(|e| panic!("merge failed: {e}"));
        assert_eq!(merged.kind, Kind::Scalar(Scalar::String("v".to_owned())));

        let merged = merge(leaf("v", "src"), Node::default())
            .unwrap_or_else(|e| panic!("merge failed: {e}"));
        assert_eq!(merged.kind, Kind::Scalar(Scalar::String("v".to_owned())));
    }
}
