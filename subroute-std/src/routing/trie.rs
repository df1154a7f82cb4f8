//! Compressed prefix tree over translated subject patterns.
//!
//! Each rank owns one [`Trie`]. Literal fragments are shared between
//! patterns and split where they diverge; wildcards become dedicated child
//! nodes:
//!
//! ```text
//! user.admin         root
//! user.:name          └─ "user."
//! user.:name.*>           ├─ "admin"      (static)
//!                         └─ :name        (param)
//!                             └─ *>       (catch-all, captures ".a.b")
//! ```
//!
//! At every node the children are ordered static first (busiest branch
//! first), then at most one param child, then at most one catch-all child.
//! Lookup probes them in that order and backtracks when a branch dead-ends.
//!
//! A catch-all never shares its position with a route that continues past
//! the same separator: `a.b.>` and `a.>` cannot live in one trie. Overlapping
//! patterns like these are told apart by rank instead.

use crate::routing::pattern::SEPARATOR;
use std::{
    borrow::{Borrow, BorrowMut},
    cmp::Reverse,
    sync::Arc,
};
use subroute_core::{InsertError, Params};

/// What a node matches.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// A literal fragment of one or more patterns.
    Static(String),
    /// One non-empty token, captured under the name.
    Param(Arc<str>),
    /// The separator and everything after it, captured under the name.
    CatchAll(Arc<str>),
}

impl Kind {
    fn order(&self) -> u8 {
        match self {
            Kind::Static(_) => 0,
            Kind::Param(_) => 1,
            Kind::CatchAll(_) => 2,
        }
    }
}

#[derive(Debug)]
struct Node<T> {
    kind: Kind,
    /// Number of values registered at or beneath this node.
    priority: u32,
    children: Vec<Node<T>>,
    value: Option<T>,
}

/// A pattern split at wildcard boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'p> {
    Literal(&'p str),
    Param(&'p str),
    CatchAll(&'p str),
}

/// A successful lookup.
#[derive(Debug)]
pub struct Match<'t, T, B> {
    /// The value bound to the matched pattern.
    pub value: &'t T,
    /// Captured parameters, `None` when nothing was captured or no buffer
    /// factory was supplied.
    pub params: Option<B>,
}

/// Radix tree mapping translated patterns to values.
#[derive(Debug)]
pub struct Trie<T> {
    root: Node<T>,
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Trie<T> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            root: Node::new(Kind::Static(String::new())),
        }
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.root.priority as usize
    }

    /// Whether no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.root.priority == 0
    }

    /// Insert a translated pattern.
    ///
    /// The pattern is parsed and checked against the existing tree before any
    /// node is touched, so a failed insertion leaves the trie unchanged.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<(), InsertError> {
        let segments = parse(pattern)?;
        self.root.check("", &segments)?;
        self.root.insert("", &segments, value);
        Ok(())
    }

    /// Match a subject, capturing parameters into a buffer made by `factory`.
    ///
    /// The buffer is only created once the first parameter is captured, and
    /// never when `factory` is `None`.
    pub fn lookup<B, F>(&self, subject: &str, factory: Option<F>) -> Option<Match<'_, T, B>>
    where
        B: BorrowMut<Params>,
        F: FnOnce() -> B,
    {
        let mut capture = Capture { buf: None, factory };
        let value = self.root.find(subject, &mut capture)?;
        let params = capture
            .buf
            .filter(|buf| !Borrow::<Params>::borrow(buf).is_empty());
        Some(Match { value, params })
    }

    /// Match a subject without capturing anything.
    pub fn get(&self, subject: &str) -> Option<&T> {
        self.lookup::<Params, fn() -> Params>(subject, None)
            .map(|found| found.value)
    }

    /// Whether any pattern matches `subject`.
    pub fn contains(&self, subject: &str) -> bool {
        self.get(subject).is_some()
    }
}

/// Split a translated pattern into literal and wildcard segments.
fn parse(pattern: &str) -> Result<Vec<Segment<'_>>, InsertError> {
    if pattern.is_empty() {
        return Err(InsertError::EmptyPattern);
    }

    let mut segments = Vec::new();
    let mut pos = 0;
    while let Some(offset) = pattern[pos..].find([':', '*']) {
        let start = pos + offset;
        let end = pattern[start..]
            .find(SEPARATOR)
            .map_or(pattern.len(), |i| start + i);
        let token = &pattern[start..end];
        let name = &token[1..];
        if name.is_empty() {
            return Err(InsertError::UnnamedWildcard);
        }
        if name.contains([':', '*']) {
            return Err(InsertError::MultipleWildcards(token.to_owned()));
        }

        if token.starts_with(':') {
            if start > pos {
                segments.push(Segment::Literal(&pattern[pos..start]));
            }
            segments.push(Segment::Param(name));
        } else {
            if end != pattern.len() {
                return Err(InsertError::CatchAllNotLast);
            }
            // The catch-all owns the separator in front of it.
            if !pattern[pos..start].ends_with(SEPARATOR) {
                return Err(InsertError::CatchAllWithoutSeparator);
            }
            let literal_end = start - SEPARATOR.len_utf8();
            if literal_end > pos {
                segments.push(Segment::Literal(&pattern[pos..literal_end]));
            }
            segments.push(Segment::CatchAll(name));
        }
        pos = end;
    }
    if pos < pattern.len() {
        segments.push(Segment::Literal(&pattern[pos..]));
    }
    Ok(segments)
}

/// Byte length of the longest common prefix, on a char boundary of both.
fn common_prefix(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or(a.len().min(b.len()), |((i, _), _)| i)
}

/// Lazily created parameter buffer.
struct Capture<B, F> {
    buf: Option<B>,
    factory: Option<F>,
}

impl<B, F> Capture<B, F>
where
    B: BorrowMut<Params>,
    F: FnOnce() -> B,
{
    fn mark(&self) -> usize {
        self.buf
            .as_ref()
            .map_or(0, |buf| Borrow::<Params>::borrow(buf).len())
    }

    fn push(&mut self, key: &Arc<str>, value: &str) {
        if self.buf.is_none() {
            self.buf = self.factory.take().map(|factory| factory());
        }
        if let Some(buf) = &mut self.buf {
            BorrowMut::<Params>::borrow_mut(buf).push(key, value);
        }
    }

    fn truncate(&mut self, mark: usize) {
        if let Some(buf) = &mut self.buf {
            BorrowMut::<Params>::borrow_mut(buf).truncate(mark);
        }
    }
}

impl<T> Node<T> {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            priority: 0,
            children: Vec::new(),
            value: None,
        }
    }

    fn static_path(&self) -> Option<&str> {
        match &self.kind {
            Kind::Static(path) => Some(path.as_str()),
            _ => None,
        }
    }

    fn static_child(&self, first: char) -> Option<usize> {
        self.children.iter().position(|child| {
            child
                .static_path()
                .is_some_and(|path| path.starts_with(first))
        })
    }

    fn wildcard_child(&self, order: u8) -> Option<&Node<T>> {
        self.children.iter().find(|child| child.kind.order() == order)
    }

    /// Reject a pattern that would conflict with what is already here.
    ///
    /// Walks the same path [`insert`](Node::insert) will take but stops as
    /// soon as the pattern leaves the existing tree: a fresh branch cannot
    /// conflict with anything.
    fn check(&self, pending: &str, segments: &[Segment<'_>]) -> Result<(), InsertError> {
        if let Some(first) = pending.chars().next() {
            if pending.starts_with(SEPARATOR) && self.wildcard_child(2).is_some() {
                return Err(InsertError::CatchAllOverlap);
            }
            let Some(i) = self.static_child(first) else {
                return Ok(());
            };
            let child = &self.children[i];
            let path = child.static_path().unwrap_or_default();
            if let Some(tail) = pending.strip_prefix(path) {
                return child.check(tail, segments);
            }
            // The child will be split where `pending` ends. Its remainder
            // becomes a sibling of whatever follows.
            let common = common_prefix(path, pending);
            let splits_at_separator =
                common == pending.len() && path[common..].starts_with(SEPARATOR);
            return match segments.first() {
                Some(Segment::CatchAll(_)) if splits_at_separator => {
                    Err(InsertError::CatchAllOverlap)
                }
                _ => Ok(()),
            };
        }

        match segments.split_first() {
            None if self.value.is_some() => Err(InsertError::Duplicate),
            None => Ok(()),
            Some((Segment::Literal(literal), rest)) => self.check(literal, rest),
            Some((Segment::Param(name), rest)) => match self.wildcard_child(1) {
                Some(child) => match &child.kind {
                    Kind::Param(existing) if &**existing != *name => {
                        Err(InsertError::WildcardConflict {
                            existing: existing.to_string(),
                            inserted: (*name).to_owned(),
                        })
                    }
                    _ => child.check("", rest),
                },
                None => Ok(()),
            },
            Some((Segment::CatchAll(name), _)) => match self.wildcard_child(2) {
                Some(child) => match &child.kind {
                    Kind::CatchAll(existing) if &**existing != *name => {
                        Err(InsertError::CatchAllConflict {
                            existing: existing.to_string(),
                            inserted: (*name).to_owned(),
                        })
                    }
                    _ => Err(InsertError::Duplicate),
                },
                None if self.continues_past_separator() => Err(InsertError::CatchAllOverlap),
                None => Ok(()),
            },
        }
    }

    fn continues_past_separator(&self) -> bool {
        self.children.iter().any(|child| {
            child
                .static_path()
                .is_some_and(|path| path.starts_with(SEPARATOR))
        })
    }

    /// Insert below this node. `pending` is literal text still to be placed
    /// before `segments`. Must only run after [`check`](Node::check) passed.
    fn insert(&mut self, pending: &str, segments: &[Segment<'_>], value: T) {
        self.priority += 1;

        if let Some(first) = pending.chars().next() {
            self.insert_static(first, pending, segments, value);
        } else {
            match segments.split_first() {
                None => self.value = Some(value),
                Some((Segment::Literal(literal), rest)) => {
                    let first = literal.chars().next().unwrap_or_default();
                    self.insert_static(first, literal, rest, value);
                }
                Some((Segment::Param(name), rest)) => {
                    let i = match self.children.iter().position(|c| c.kind.order() == 1) {
                        Some(i) => i,
                        None => {
                            self.children.push(Node::new(Kind::Param(Arc::from(*name))));
                            self.children.len() - 1
                        }
                    };
                    self.children[i].insert("", rest, value);
                }
                Some((Segment::CatchAll(name), _)) => {
                    let mut leaf = Node::new(Kind::CatchAll(Arc::from(*name)));
                    leaf.priority = 1;
                    leaf.value = Some(value);
                    self.children.push(leaf);
                }
            }
        }

        self.children
            .sort_by_key(|child| (child.kind.order(), Reverse(child.priority)));
    }

    fn insert_static(&mut self, first: char, literal: &str, segments: &[Segment<'_>], value: T) {
        match self.static_child(first) {
            Some(i) => {
                let child = &mut self.children[i];
                let path = child.static_path().unwrap_or_default();
                let common = common_prefix(path, literal);
                if common < path.len() {
                    child.split(common);
                }
                child.insert(&literal[common..], segments, value);
            }
            None => {
                let mut child = Node::new(Kind::Static(literal.to_owned()));
                child.insert("", segments, value);
                self.children.push(child);
            }
        }
    }

    /// Cut a static node after `at` bytes, moving the rest into one child.
    fn split(&mut self, at: usize) {
        let Kind::Static(path) = &mut self.kind else {
            return;
        };
        let suffix = Node {
            kind: Kind::Static(path.split_off(at)),
            priority: self.priority,
            children: std::mem::take(&mut self.children),
            value: self.value.take(),
        };
        self.children.push(suffix);
    }

    /// Match `rest`, the part of the subject left after this node.
    fn find<B, F>(&self, rest: &str, capture: &mut Capture<B, F>) -> Option<&T>
    where
        B: BorrowMut<Params>,
        F: FnOnce() -> B,
    {
        if rest.is_empty() {
            return self.value.as_ref();
        }

        for child in &self.children {
            match &child.kind {
                Kind::Static(path) => {
                    if let Some(tail) = rest.strip_prefix(path.as_str()) {
                        if let Some(found) = child.find(tail, capture) {
                            return Some(found);
                        }
                    }
                }
                Kind::Param(name) => {
                    let end = rest.find(SEPARATOR).unwrap_or(rest.len());
                    if end == 0 {
                        continue;
                    }
                    let mark = capture.mark();
                    capture.push(name, &rest[..end]);
                    if let Some(found) = child.find(&rest[end..], capture) {
                        return Some(found);
                    }
                    capture.truncate(mark);
                }
                Kind::CatchAll(name) => {
                    if rest.starts_with(SEPARATOR) {
                        if let Some(value) = &child.value {
                            capture.push(name, rest);
                            return Some(value);
                        }
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::translate;

    fn trie(patterns: &[&str]) -> Trie<String> {
        let mut trie = Trie::new();
        for pattern in patterns {
            let translated = translate(pattern);
            trie.insert(&translated, (*pattern).to_owned()).unwrap();
        }
        trie
    }

    fn capture(trie: &Trie<String>, subject: &str) -> Option<(String, Vec<(String, String)>)> {
        let found = trie.lookup(subject, Some(Params::new))?;
        let params = found
            .params
            .map(|ps| {
                ps.iter()
                    .map(|p| (p.key().to_owned(), p.value().to_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Some((found.value.clone(), params))
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_static_routes() {
        let t = trie(&["hello", "help", "world", "hell.o"]);
        assert_eq!(t.get("hello"), Some(&"hello".to_owned()));
        assert_eq!(t.get("help"), Some(&"help".to_owned()));
        assert_eq!(t.get("hell.o"), Some(&"hell.o".to_owned()));
        assert_eq!(t.get("hell"), None);
        assert_eq!(t.get("helloworld"), None);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_named_param() {
        let t = trie(&["user.:name"]);
        assert_eq!(
            capture(&t, "user.gopher"),
            Some(("user.:name".to_owned(), pairs(&[("name", "gopher")])))
        );
        assert_eq!(capture(&t, "user."), None);
        assert_eq!(capture(&t, "user.gopher.x"), None);
    }

    #[test]
    fn test_catch_all_keeps_leading_separator() {
        let t = trie(&["user.>"]);
        assert_eq!(
            capture(&t, "user.gopher.star.ok"),
            Some(("user.>".to_owned(), pairs(&[(">", ".gopher.star.ok")])))
        );
        assert_eq!(capture(&t, "user"), None);
        assert_eq!(capture(&t, "username"), None);
    }

    #[test]
    fn test_wildcard_then_catch_all() {
        let t = trie(&["user.*.>"]);
        assert_eq!(
            capture(&t, "user.gopher.star.ok"),
            Some((
                "user.*.>".to_owned(),
                pairs(&[("p1", "gopher"), (">", ".star.ok")])
            ))
        );
    }

    #[test]
    fn test_several_named_params() {
        let t = trie(&[
            "confirm-subscription.:mongoid.:correlationid.:pincode.>",
            "reset-subscription.:mongoid.>",
        ]);
        let (route, params) = capture(&t, "confirm-subscription.1234.5678.1111.>").unwrap();
        assert_eq!(route, "confirm-subscription.:mongoid.:correlationid.:pincode.>");
        assert_eq!(
            params,
            pairs(&[
                ("mongoid", "1234"),
                ("correlationid", "5678"),
                ("pincode", "1111"),
                (">", ".>"),
            ])
        );

        let (route, params) = capture(&t, "reset-subscription.1234.x").unwrap();
        assert_eq!(route, "reset-subscription.:mongoid.>");
        assert_eq!(params, pairs(&[("mongoid", "1234"), (">", ".x")]));
    }

    #[test]
    fn test_static_beats_param() {
        let t = trie(&["user.admin", "user.:name", "user.:name.>"]);
        assert_eq!(t.get("user.admin"), Some(&"user.admin".to_owned()));
        assert_eq!(t.get("user.bob"), Some(&"user.:name".to_owned()));
        assert_eq!(t.get("user.bob.x"), Some(&"user.:name.>".to_owned()));
        assert_eq!(t.get("user.admin.x"), Some(&"user.:name.>".to_owned()));
    }

    #[test]
    fn test_backtracking_drops_abandoned_params() {
        let t = trie(&["a.c.:y.d", "a.:x.:z.e"]);
        assert_eq!(
            capture(&t, "a.c.1.e"),
            Some(("a.:x.:z.e".to_owned(), pairs(&[("x", "c"), ("z", "1")])))
        );
        assert_eq!(
            capture(&t, "a.c.1.d"),
            Some(("a.c.:y.d".to_owned(), pairs(&[("y", "1")])))
        );
    }

    #[test]
    fn test_static_only_match_allocates_nothing() {
        let t = trie(&["user.admin", "user.:name"]);
        let found = t.lookup("user.admin", Some(Params::new)).unwrap();
        assert!(found.params.is_none());
    }

    #[test]
    fn test_split_keeps_existing_routes() {
        let t = trie(&["ROUTING.v2.FEEDBACK.>", "ROUTING.v2.STATUS", "ROUTING.v3"]);
        assert_eq!(t.get("ROUTING.v2.FEEDBACK.x"), Some(&"ROUTING.v2.FEEDBACK.>".to_owned()));
        assert_eq!(t.get("ROUTING.v2.STATUS"), Some(&"ROUTING.v2.STATUS".to_owned()));
        assert_eq!(t.get("ROUTING.v3"), Some(&"ROUTING.v3".to_owned()));
        assert_eq!(t.get("ROUTING.v2.OTHER"), None);
        assert_eq!(t.get("ROUTING.v"), None);
    }

    #[test]
    fn test_catch_all_rejects_overlapping_routes() {
        let mut t = trie(&["ROUTING.v2.FEEDBACK.>"]);
        assert_eq!(
            t.insert(&translate("ROUTING.v2.>"), String::new()),
            Err(InsertError::CatchAllOverlap)
        );

        let mut t = trie(&["a.b", "ac"]);
        assert_eq!(t.insert("a.*>", String::new()), Err(InsertError::CatchAllOverlap));

        let mut t = trie(&["user.:name"]);
        assert_eq!(t.insert("user.*>", String::new()), Err(InsertError::CatchAllOverlap));

        // The other way round: nothing may continue past an existing catch-all.
        let mut t = trie(&["user.>"]);
        for pattern in ["user.admin", "user.:name", "user.*rest.x"] {
            assert!(t.insert(pattern, String::new()).is_err(), "{pattern}");
        }
        assert_eq!(t.insert("user.admin", String::new()), Err(InsertError::CatchAllOverlap));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("user.admin"), Some(&"user.>".to_owned()));
    }

    #[test]
    fn test_catch_all_beside_unrelated_routes() {
        let t = trie(&["user", "username", "user:id", "user.>"]);
        assert_eq!(t.get("user"), Some(&"user".to_owned()));
        assert_eq!(t.get("username"), Some(&"username".to_owned()));
        assert_eq!(t.get("user7"), Some(&"user:id".to_owned()));
        assert_eq!(t.get("user.x.y"), Some(&"user.>".to_owned()));
    }

    #[test]
    fn test_multibyte_literals_split_on_char_boundaries() {
        let t = trie(&["café.è", "café.é", "caf.:x"]);
        assert_eq!(t.get("café.è"), Some(&"café.è".to_owned()));
        assert_eq!(t.get("café.é"), Some(&"café.é".to_owned()));
        assert_eq!(t.get("caf.x"), Some(&"caf.:x".to_owned()));
    }

    #[test]
    fn test_parse_errors() {
        let mut t: Trie<()> = Trie::new();
        assert_eq!(t.insert("", ()), Err(InsertError::EmptyPattern));
        assert_eq!(t.insert("user.:", ()), Err(InsertError::UnnamedWildcard));
        assert_eq!(
            t.insert("user.:a:b", ()),
            Err(InsertError::MultipleWildcards(":a:b".to_owned()))
        );
        assert_eq!(t.insert("user.*>.x", ()), Err(InsertError::CatchAllNotLast));
        assert_eq!(t.insert("*>", ()), Err(InsertError::CatchAllWithoutSeparator));
        assert_eq!(t.insert("user*>", ()), Err(InsertError::CatchAllWithoutSeparator));
        assert_eq!(t.insert("café*rest", ()), Err(InsertError::CatchAllWithoutSeparator));
        assert_eq!(t.insert("é*>", ()), Err(InsertError::CatchAllWithoutSeparator));
        assert!(t.is_empty());
        assert_eq!(t.insert("café.*>", ()), Ok(()));
    }

    #[test]
    fn test_conflicts_leave_tree_untouched() {
        let mut t = trie(&["user.:name", "order.*>"]);
        assert_eq!(
            t.insert("user.:id", "x".to_owned()),
            Err(InsertError::WildcardConflict {
                existing: "name".to_owned(),
                inserted: "id".to_owned(),
            })
        );
        assert_eq!(
            t.insert("order.*rest", "x".to_owned()),
            Err(InsertError::CatchAllConflict {
                existing: ">".to_owned(),
                inserted: "rest".to_owned(),
            })
        );
        assert_eq!(t.insert("order.*>", "x".to_owned()), Err(InsertError::Duplicate));
        assert_eq!(t.insert("user.:name", "x".to_owned()), Err(InsertError::Duplicate));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("user.bob"), Some(&"user.:name".to_owned()));
    }

    #[test]
    fn test_same_param_name_extends_branch() {
        let t = trie(&["user.:name", "user.:name.orders"]);
        assert_eq!(
            capture(&t, "user.bob.orders"),
            Some(("user.:name.orders".to_owned(), pairs(&[("name", "bob")])))
        );
    }

    #[test]
    fn test_children_ordered_by_kind_then_priority() {
        let t = trie(&["a.>", "ab.:x", "ab.c.1", "ab.c.2", "ab.d"]);
        let a = &t.root.children[0];
        let kinds: Vec<u8> = a.children.iter().map(|c| c.kind.order()).collect();
        assert_eq!(kinds, vec![0, 2]);
        let dot = &a.children[0];
        assert_eq!(dot.static_path(), Some("b."));
        let order: Vec<(u8, u32)> = dot
            .children
            .iter()
            .map(|c| (c.kind.order(), c.priority))
            .collect();
        assert_eq!(order, vec![(0, 2), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_existence_check_never_calls_factory() {
        let t = trie(&["user.:name"]);
        let found = t.lookup::<Params, _>("user.bob", None::<fn() -> Params>);
        assert!(found.unwrap().params.is_none());
        assert!(t.contains("user.bob"));
        assert!(!t.contains("order.bob"));
    }
}
