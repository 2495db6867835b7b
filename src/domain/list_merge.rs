//! List merge strategies and the raw "delimiter per list" format.
//!
//! A list is turned into an ordered map before merging:
//! - basic lists use each item as a key with an empty value,
//! - delimited lists split each item on the configured delimiter.
//!
//! Maps keep insertion order, so surviving base items stay in place and new
//! override items are appended.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::TK_POST_KEY;

/// List items as key -> value, in insertion order.
pub type MappedList = IndexMap<String, String>;

/// List name -> item delimiter.
pub type DelimiterMap = BTreeMap<String, String>;

const RAW_DPL_POST_KEY: char = ':';
const RAW_DPL_POST_VALUE: char = ',';
const RAW_DPL_ESCAPE: char = '\\';

/// How the items of one list are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStrategy<'a> {
    /// Items are opaque set members
    Basic,
    /// Items are `key<delim>value` pairs
    Delimited(&'a str),
}

impl<'a> ListStrategy<'a> {
    /// Strategy configured for the list called `name`.
    pub fn for_list(delimiters: &'a DelimiterMap, name: &str) -> Self {
        match delimiters.get(name) {
            Some(delim) => ListStrategy::Delimited(delim.as_str()),
            None => ListStrategy::Basic,
        }
    }

    /// Maps list items according to this strategy.
    pub fn map(&self, list: &[String]) -> DomainResult<MappedList> {
        match self {
            ListStrategy::Basic => Ok(list_to_mapped(list)),
            ListStrategy::Delimited(delim) => delimited_to_mapped(list, delim),
        }
    }

    /// Renders a mapped list back into items.
    pub fn render(&self, mapped: &MappedList) -> Vec<String> {
        match self {
            ListStrategy::Basic => mapped.keys().cloned().collect(),
            ListStrategy::Delimited(delim) => mapped
                .iter()
                .map(|(k, v)| format!("{k}{delim}{v}"))
                .collect(),
        }
    }
}

/// Merges `overlay` items into the base list.
///
/// `cached` is the base side from a previous merge into the same node; when
/// absent the base is mapped from `base`. Returns the merged map, which the
/// caller renders and keeps as the next cache entry.
pub fn merge_lists(
    base: &[String],
    cached: Option<MappedList>,
    overlay: &[String],
    strategy: ListStrategy<'_>,
    deletion_token: &str,
) -> DomainResult<MappedList> {
    let mapped_base = match cached {
        Some(mapped) => mapped,
        None => strategy.map(base)?,
    };
    let mapped_overlay = strategy.map(overlay)?;

    Ok(match strategy {
        ListStrategy::Basic => merge_mapped_basic(mapped_base, &mapped_overlay, deletion_token),
        ListStrategy::Delimited(_) => {
            merge_mapped_delimited(mapped_base, &mapped_overlay, deletion_token)
        }
    })
}

/// Set-style merge. An item ending in `:<token>` removes the item before
/// that suffix instead of being added.
pub fn merge_mapped_basic(
    mut base: MappedList,
    overlay: &MappedList,
    deletion_token: &str,
) -> MappedList {
    let suffix = format!("{TK_POST_KEY}{deletion_token}");
    for item in overlay.keys() {
        if !deletion_token.is_empty() {
            if let Some(target) = item.strip_suffix(suffix.as_str()) {
                if !target.is_empty() {
                    base.shift_remove(target);
                    continue;
                }
            }
        }
        base.insert(item.clone(), String::new());
    }
    base
}

/// Key/value merge. An overlay value equal to the token removes the key.
pub fn merge_mapped_delimited(
    mut base: MappedList,
    overlay: &MappedList,
    deletion_token: &str,
) -> MappedList {
    for (key, value) in overlay {
        if !deletion_token.is_empty() && value == deletion_token {
            base.shift_remove(key);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
    base
}

/// Items as keys with empty values; duplicates collapse.
pub fn list_to_mapped(list: &[String]) -> MappedList {
    list.iter().map(|item| (item.clone(), String::new())).collect()
}

/// Splits each item on the first `delim`.
pub fn delimited_to_mapped(list: &[String], delim: &str) -> DomainResult<MappedList> {
    list.iter()
        .map(|item| {
            item.split_once(delim)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| DomainError::MalformedListItem {
                    item: item.clone(),
                    delimiter: delim.to_string(),
                })
        })
        .collect()
}

/// Parses `name1:delim1,name2:delim2[,...]`.
///
/// `\:` and `\,` are literal; an unescaped `:` ends the list name and an
/// unescaped `,` ends the delimiter. A trailing `,` is optional.
pub fn parse_delimiter_map(raw: &str) -> DomainResult<DelimiterMap> {
    let mut map = DelimiterMap::new();
    let mut name = String::new();
    let mut delim = String::new();
    let mut in_delim = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == RAW_DPL_ESCAPE {
            if let Some(&escaped) = chars.peek() {
                if escaped == RAW_DPL_POST_KEY || escaped == RAW_DPL_POST_VALUE {
                    chars.next();
                    (if in_delim { &mut delim } else { &mut name }).push(escaped);
                    continue;
                }
            }
        }

        if !in_delim && c == RAW_DPL_POST_KEY {
            in_delim = true;
        } else if c == RAW_DPL_POST_VALUE {
            if !in_delim {
                return Err(DomainError::InvalidDelimiterSpec(format!(
                    "missing `{RAW_DPL_POST_KEY}` after list name `{name}`"
                )));
            }
            insert_delimiter(&mut map, &mut name, &mut delim)?;
            in_delim = false;
        } else if in_delim {
            delim.push(c);
        } else {
            name.push(c);
        }
    }

    if in_delim {
        insert_delimiter(&mut map, &mut name, &mut delim)?;
    } else if !name.is_empty() {
        return Err(DomainError::InvalidDelimiterSpec(format!(
            "missing `{RAW_DPL_POST_KEY}` after list name `{name}`"
        )));
    }
    Ok(map)
}

fn insert_delimiter(
    map: &mut DelimiterMap,
    name: &mut String,
    delim: &mut String,
) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::InvalidDelimiterSpec(
            "empty list name".to_string(),
        ));
    }
    if delim.is_empty() {
        return Err(DomainError::InvalidDelimiterSpec(format!(
            "empty delimiter for list `{name}`"
        )));
    }
    map.insert(std::mem::take(name), std::mem::take(delim));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn items(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_basic_lists_when_merging_then_adds_and_deletes_items() {
        let merged = merge_lists(
            &items(&["a", "b"]),
            None,
            &items(&["c", "a:nil"]),
            ListStrategy::Basic,
            "nil",
        )
        .unwrap();

        assert_eq!(ListStrategy::Basic.render(&merged), items(&["b", "c"]));
    }

    #[test]
    fn given_basic_item_equal_to_suffix_only_then_it_is_added() {
        let merged = merge_lists(&[], None, &items(&[":nil"]), ListStrategy::Basic, "nil").unwrap();
        assert_eq!(ListStrategy::Basic.render(&merged), items(&[":nil"]));
    }

    #[test]
    fn given_empty_token_then_nothing_is_deleted() {
        let merged = merge_lists(
            &items(&["k=v"]),
            None,
            &items(&["k="]),
            ListStrategy::Delimited("="),
            "",
        )
        .unwrap();
        assert_eq!(ListStrategy::Delimited("=").render(&merged), items(&["k="]));
    }

    #[test]
    fn given_delimited_lists_when_merging_then_overrides_by_key() {
        let strategy = ListStrategy::Delimited("=");
        let merged = merge_lists(
            &items(&["a=1", "b=2"]),
            None,
            &items(&["b=3", "c=nil", "d=x=y"]),
            strategy,
            "nil",
        )
        .unwrap();

        assert_eq!(strategy.render(&merged), items(&["a=1", "b=3", "d=x=y"]));
    }

    #[test]
    fn given_cached_base_when_merging_then_base_values_are_ignored() {
        let strategy = ListStrategy::Delimited("=");
        let mut cached = MappedList::new();
        cached.insert("b".into(), "3".into());

        let merged = merge_lists(
            &items(&["stale"]),
            Some(cached),
            &items(&["c=4"]),
            strategy,
            "nil",
        )
        .unwrap();

        assert_eq!(strategy.render(&merged), items(&["b=3", "c=4"]));
    }

    #[test]
    fn given_item_without_delimiter_then_fails_naming_item() {
        let err = merge_lists(
            &items(&["a=1", "broken"]),
            None,
            &[],
            ListStrategy::Delimited("="),
            "nil",
        )
        .unwrap_err();

        match err {
            DomainError::MalformedListItem { item, delimiter } => {
                assert_eq!(item, "broken");
                assert_eq!(delimiter, "=");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("", &[])]
    #[case("env:=", &[("env", "=")])]
    #[case("env:=,", &[("env", "=")])]
    #[case("env:=,hosts:->", &[("env", "="), ("hosts", "->")])]
    #[case(r"a\:b:=", &[("a:b", "=")])]
    #[case(r"env:\,", &[("env", ",")])]
    #[case(r"env:\:,x:|", &[("env", ":"), ("x", "|")])]
    #[case("env:a:b", &[("env", "a:b")])]
    fn given_raw_dpl_when_parsing_then_builds_map(
        #[case] raw: &str,
        #[case] expected: &[(&str, &str)],
    ) {
        let map = parse_delimiter_map(raw).unwrap();
        let expected: DelimiterMap = expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(map, expected);
    }

    #[rstest]
    #[case("env")]
    #[case("env,x:=")]
    #[case(":=")]
    #[case("env:")]
    fn given_invalid_raw_dpl_when_parsing_then_fails(#[case] raw: &str) {
        assert!(matches!(
            parse_delimiter_map(raw),
            Err(DomainError::InvalidDelimiterSpec(_))
        ));
    }
}
