use indexmap::IndexMap;

use super::ParsedValue;

/// Fold array-shaped objects below `value` into [`ParsedValue::Array`].
///
/// The value itself is never converted, only what it contains. An object is
/// array-shaped when every key is a distinct non-negative integer, the keys
/// cover `0..len` with no gaps, and every value is itself an object. Empty
/// objects count as empty arrays.
pub fn fold_arrays(value: ParsedValue) -> ParsedValue {
    match value {
        ParsedValue::Object(map) => ParsedValue::Object(
            map.into_iter()
                .map(|(key, child)| (key, fold_member(child)))
                .collect(),
        ),
        other => other,
    }
}

fn fold_member(value: ParsedValue) -> ParsedValue {
    match value {
        ParsedValue::Object(map) => match array_order(&map) {
            Some(order) => {
                let mut slots: Vec<Option<ParsedValue>> = vec![None; map.len()];
                for ((_, element), index) in map.into_iter().zip(order) {
                    slots[index] = Some(fold_arrays(element));
                }
                ParsedValue::Array(slots.into_iter().flatten().collect())
            }
            None => fold_arrays(ParsedValue::Object(map)),
        },
        other => other,
    }
}

/// Array index of each entry, in map order, when `map` is array-shaped
fn array_order(map: &IndexMap<String, ParsedValue>) -> Option<Vec<usize>> {
    let len = map.len();
    let mut seen = vec![false; len];
    let mut order = Vec::with_capacity(len);

    for (key, value) in map {
        if !matches!(value, ParsedValue::Object(_)) {
            return None;
        }

        let index: usize = key.parse().ok()?;
        if index >= len || seen[index] {
            return None;
        }

        seen[index] = true;
        order.push(index);
    }

    // len distinct indices below len cover every slot
    Some(order)
}
