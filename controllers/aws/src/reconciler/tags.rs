//! Tags in the `[{Key, Value}]` list shape shared by ECS, DAX and SageMaker

use std::collections::BTreeMap;

use crds::Tag;

use crate::managed::diff::sort_set;

/// One tag per key, the last value given for a key winning, in key order
pub(crate) fn normalize_tags(tags: &mut Vec<Tag>) {
    let by_key: BTreeMap<&str, &str> = tags.iter().map(|t| (t.key.as_str(), t.value.as_str())).collect();
    *tags = by_key.into_iter().map(|(k, v)| Tag::new(k, v)).collect();
}

pub(crate) fn tags_to_wire(tags: &[Tag]) -> Vec<aws_client::Tag> {
    let mut tags = tags.to_vec();
    normalize_tags(&mut tags);
    tags.iter().map(|t| aws_client::Tag::new(&t.key, &t.value)).collect()
}

/// Tags sorted by key
pub(crate) fn tags_from_wire(tags: &[aws_client::Tag]) -> Vec<Tag> {
    let mut tags: Vec<Tag> = tags.iter().map(|t| Tag::new(&t.key, &t.value)).collect();
    sort_set(&mut tags);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_from_wire_sorted_by_key() {
        let wire = vec![aws_client::Tag::new("b", "2"), aws_client::Tag::new("a", "1")];
        assert_eq!(tags_from_wire(&wire), vec![Tag::new("a", "1"), Tag::new("b", "2")]);
    }

    #[test]
    fn test_tags_to_wire_key_ordered() {
        let tags = tags_to_wire(&[Tag::new("team", "web"), Tag::new("env", "prod")]);
        assert_eq!(tags[0].key, "env");
        assert_eq!(tags[1].value, "web");
    }

    #[test]
    fn test_normalize_tags_last_value_wins() {
        let mut tags = vec![Tag::new("env", "dev"), Tag::new("team", "web"), Tag::new("env", "prod")];
        normalize_tags(&mut tags);
        assert_eq!(tags, vec![Tag::new("env", "prod"), Tag::new("team", "web")]);
    }
}
