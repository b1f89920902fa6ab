use super::SyntaxError;
use crate::types::ByteRange;
use serde::Serialize;
use std::collections::VecDeque;

/// Closed vocabulary of structural node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureKind {
    // Statements
    Brace,
    ForEach,
    If,
    Guard,
    While,
    RepeatWhile,
    Switch,
    Case,
    // Expressions
    Call,
    Array,
    Dictionary,
    Closure,
    // Declarations
    Class,
    Struct,
    Enum,
    Extension,
    Protocol,
    FunctionFree,
    FunctionMethod,
    VarGlobal,
    VarInstance,
    VarLocal,
    VarParameter,
}

/// Sub-ranges of a node that are not nodes themselves, such as the pattern
/// bound by a `for` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    /// Bound-variable pattern (`(idx, item)` in `for (idx, item) in ...`).
    Id,
    /// Sequence expression of a loop.
    Expr,
    /// One clause of a condition list.
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StructureElement {
    pub kind: ElementKind,
    pub range: ByteRange,
}

/// Declaration attributes as normalized by the frontend.
///
/// Normalization loses spelling: `weak` and `unowned` both become
/// [`AttributeKind::Weak`]. Rules that care about the spelling must read the
/// source text under the attribute's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeKind {
    Weak,
    Lazy,
    Final,
    Static,
    Override,
    Mutating,
    AccessControl,
    /// `@name` attributes.
    Custom,
}

impl AttributeKind {
    /// Map a modifier spelling to its normalized kind.
    pub fn from_modifier(word: &str) -> Option<Self> {
        let kind = match word {
            "weak" | "unowned" => AttributeKind::Weak,
            "lazy" => AttributeKind::Lazy,
            "final" => AttributeKind::Final,
            "static" | "class" => AttributeKind::Static,
            "override" => AttributeKind::Override,
            "mutating" | "nonmutating" => AttributeKind::Mutating,
            "private" | "fileprivate" | "internal" | "public" | "open" => AttributeKind::AccessControl,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub range: ByteRange,
}

/// One syntactic unit.
///
/// Every child's range lies within its parent's range and siblings never
/// overlap; children are in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureNode {
    pub kind: StructureKind,
    pub range: ByteRange,
    pub name: Option<String>,
    pub name_range: Option<ByteRange>,
    /// Content strictly between the node's delimiters (braces, brackets, parens).
    pub body_range: Option<ByteRange>,
    pub elements: Vec<StructureElement>,
    pub attributes: Vec<Attribute>,
    pub substructure: Vec<StructureNode>,
}

impl StructureNode {
    pub fn new(kind: StructureKind, range: ByteRange) -> Self {
        Self {
            kind,
            range,
            name: None,
            name_range: None,
            body_range: None,
            elements: Vec::new(),
            attributes: Vec::new(),
            substructure: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>, range: Option<ByteRange>) -> Self {
        self.name = Some(name.into());
        self.name_range = range;
        self
    }

    pub fn with_body(mut self, body: ByteRange) -> Self {
        self.body_range = Some(body);
        self
    }

    pub fn with_children(mut self, children: Vec<StructureNode>) -> Self {
        self.substructure = children;
        self
    }

    /// Range of the first element of `kind`.
    pub fn element_range(&self, kind: ElementKind) -> Option<ByteRange> {
        self.elements.iter().find(|e| e.kind == kind).map(|e| e.range)
    }

    /// This node and all of its descendants, depth-first, pre-order.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    fn check(&self, parent: ByteRange, path: &str) -> Result<(), SyntaxError> {
        if self.range.checked_upper_bound().is_none() || !parent.contains_range(&self.range) {
            return Err(SyntaxError::Contract(format!(
                "{path}: {:?} at {} escapes its parent {parent}",
                self.kind, self.range
            )));
        }
        check_siblings(&self.substructure, self.range, path)
    }
}

fn check_siblings(nodes: &[StructureNode], parent: ByteRange, path: &str) -> Result<(), SyntaxError> {
    let mut previous_end = parent.location;
    for (idx, node) in nodes.iter().enumerate() {
        if node.range.location < previous_end {
            return Err(SyntaxError::Contract(format!(
                "{path}/{idx}: {:?} at {} overlaps its previous sibling",
                node.kind, node.range
            )));
        }
        node.check(parent, &format!("{path}/{idx}"))?;
        previous_end = node.range.upper_bound();
    }
    Ok(())
}

/// The top-level structure of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureTree {
    pub nodes: Vec<StructureNode>,
}

impl StructureTree {
    pub fn new(nodes: Vec<StructureNode>) -> Self {
        Self { nodes }
    }

    /// All nodes depth-first, pre-order, in source order.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.nodes.iter().rev().collect(),
        }
    }

    /// All nodes level by level.
    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            queue: self.nodes.iter().collect(),
        }
    }

    pub(super) fn check_invariants(&self, source_len: usize) -> Result<(), SyntaxError> {
        check_siblings(&self.nodes, ByteRange::new(0, source_len), "")
    }
}

pub struct PreOrder<'a> {
    stack: Vec<&'a StructureNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a StructureNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.substructure.iter().rev());
        Some(node)
    }
}

pub struct BreadthFirst<'a> {
    queue: VecDeque<&'a StructureNode>,
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = &'a StructureNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.substructure.iter());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StructureTree {
        // class A { func f() { g() } }  let x = 1
        let call = StructureNode::new(StructureKind::Call, ByteRange::new(21, 3)).with_name("g", None);
        let func = StructureNode::new(StructureKind::FunctionMethod, ByteRange::new(10, 16)).with_children(vec![call]);
        let class = StructureNode::new(StructureKind::Class, ByteRange::new(0, 28)).with_children(vec![func]);
        let var = StructureNode::new(StructureKind::VarGlobal, ByteRange::new(30, 9));
        StructureTree::new(vec![class, var])
    }

    #[test]
    fn test_pre_order_visits_parents_first() {
        let kinds: Vec<_> = sample().pre_order().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StructureKind::Class,
                StructureKind::FunctionMethod,
                StructureKind::Call,
                StructureKind::VarGlobal
            ]
        );
    }

    #[test]
    fn test_breadth_first_visits_levels() {
        let kinds: Vec<_> = sample().breadth_first().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StructureKind::Class,
                StructureKind::VarGlobal,
                StructureKind::FunctionMethod,
                StructureKind::Call
            ]
        );
    }

    #[test]
    fn test_invariants() {
        assert!(sample().check_invariants(40).is_ok());
        // Source too short for the last node
        assert!(sample().check_invariants(30).is_err());

        let escaping = StructureNode::new(StructureKind::Call, ByteRange::new(5, 10));
        let parent = StructureNode::new(StructureKind::Closure, ByteRange::new(0, 8)).with_children(vec![escaping]);
        assert!(StructureTree::new(vec![parent]).check_invariants(20).is_err());
    }

    #[test]
    fn test_overflowing_node_range_is_a_contract_error() {
        let node = StructureNode::new(StructureKind::Call, ByteRange::new(1, usize::MAX));
        assert!(matches!(
            StructureTree::new(vec![node]).check_invariants(10),
            Err(SyntaxError::Contract(_))
        ));
    }

    #[test]
    fn test_weak_and_unowned_normalize_together() {
        assert_eq!(AttributeKind::from_modifier("weak"), Some(AttributeKind::Weak));
        assert_eq!(AttributeKind::from_modifier("unowned"), Some(AttributeKind::Weak));
        assert_eq!(AttributeKind::from_modifier("let"), None);
    }
}
