use std::collections::BTreeMap;

/// Swap the keys and values of a label map
pub fn invert_map<K, V>(original: &BTreeMap<K, V>) -> BTreeMap<V, K>
where
    K: Clone,
    V: Clone + Ord,
{
    original
        .iter()
        .map(|(key, value)| (value.clone(), key.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn inverts_a_label_map() {
        let id2label: BTreeMap<usize, String> =
            [(0, "negative".to_string()), (1, "positive".to_string())]
                .into_iter()
                .collect();

        let label2id = invert_map(&id2label);

        assert_eq!(label2id.get("negative"), Some(&0));
        assert_eq!(label2id.get("positive"), Some(&1));
    }
}
