use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, Class, Expression, Function, JSXAttributeItem, JSXAttributeName,
    JSXAttributeValue, JSXElementName, JSXMemberExpression, JSXMemberExpressionObject,
    JSXOpeningElement, VariableDeclarator,
};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use oxc_syntax::scope::ScopeFlags;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

// ============================================================================
// Arena model
// ============================================================================

/// Stable index of an opening tag within one parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub usize);

/// One markup opening tag as found in source.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub id: ElementId,

    /// Tag as written, e.g. "button", "Card.Header", "svg:path"
    pub tag: String,

    /// Byte offset of `<`
    pub start: u32,

    /// 1-based line of `<`
    pub line: u32,

    /// 0-based column of `<`, in UTF-16 code units
    pub column: u32,

    pub attributes: Vec<AttributeNode>,

    /// Byte offset just past the tag name (and type arguments, if any)
    pub name_end: u32,

    /// Nearest enclosing declared component
    pub component: Option<String>,

    /// Enclosing declared components, outermost first
    pub component_chain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeNode {
    /// `name="value"`, `name={expr}` or bare `name`. `value` is set only for
    /// string-literal values.
    Named {
        name: String,
        value: Option<String>,
        end: u32,
    },
    /// `{...props}`
    Spread { end: u32 },
}

impl AttributeNode {
    pub fn end(&self) -> u32 {
        match self {
            AttributeNode::Named { end, .. } | AttributeNode::Spread { end } => *end,
        }
    }

    pub fn is_spread(&self) -> bool {
        matches!(self, AttributeNode::Spread { .. })
    }
}

impl ElementNode {
    pub fn attribute(&self, name: &str) -> Option<&AttributeNode> {
        self.attributes
            .iter()
            .find(|a| matches!(a, AttributeNode::Named { name: n, .. } if n == name))
    }

    /// String value of a named attribute, if it has one.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        match self.attribute(name) {
            Some(AttributeNode::Named { value, .. }) => value.as_deref(),
            _ => None,
        }
    }

    /// Where a new attribute belongs: right after the last spread, else at the end.
    pub fn attribute_insert_index(&self) -> usize {
        self.attributes
            .iter()
            .rposition(AttributeNode::is_spread)
            .map(|i| i + 1)
            .unwrap_or(self.attributes.len())
    }
}

/// How a component was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Function,
    Arrow,
    Class,
    /// Wrapped in a call such as `memo(...)` or `forwardRef(...)`
    Wrapped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDecl {
    pub name: String,
    pub kind: ComponentKind,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone)]
struct PendingInsertion {
    offset: u32,
    seq: usize,
    text: String,
}

// ============================================================================
// Source document: parse / mutate / print
// ============================================================================

/// A parsed source file. Holds the original text untouched; mutations are
/// recorded as insertions and spliced in by `print`.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    text: String,
    elements: Vec<ElementNode>,
    components: Vec<ComponentDecl>,
    insertions: Vec<PendingInsertion>,
}

impl SourceDocument {
    /// Parse `text` as JSX (TSX for `.ts`/`.tsx` paths).
    ///
    /// Fails with `EngineError::Syntax` on any parser diagnostic; a document is
    /// never partially built.
    pub fn parse(path: &Path, text: &str) -> EngineResult<Self> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, text, source_type_for(path)).parse();

        if ret.panicked || !ret.errors.is_empty() {
            let message = ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parser aborted".to_string());
            return Err(EngineError::Syntax {
                path: path.to_path_buf(),
                message,
            });
        }

        let lines = LineIndex::new(text);
        let mut collector = MarkupCollector::new(&lines);
        collector.visit_program(&ret.program);

        let mut components = collector.components;
        components.sort_by_key(|c| (c.start_line, c.end_line));

        Ok(Self {
            path: path.to_path_buf(),
            text: text.to_string(),
            elements: collector.elements,
            components,
            insertions: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original, unmodified text.
    pub fn original(&self) -> &str {
        &self.text
    }

    pub fn elements(&self) -> &[ElementNode] {
        &self.elements
    }

    pub fn components(&self) -> &[ComponentDecl] {
        &self.components
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementNode> {
        self.elements.get(id.0)
    }

    /// Opening tag starting exactly at (line, column).
    pub fn element_at(&self, line: u32, column: u32) -> Option<&ElementNode> {
        self.elements
            .iter()
            .find(|e| e.line == line && e.column == column)
    }

    pub fn is_modified(&self) -> bool {
        !self.insertions.is_empty()
    }

    /// Insert `name="value"` at attribute position `index` of `element`.
    ///
    /// The arena is updated in place so later lookups see the new attribute.
    pub fn insert_attribute_at(
        &mut self,
        element: ElementId,
        index: usize,
        name: &str,
        value: &str,
    ) -> Option<usize> {
        let node = self.elements.get_mut(element.0)?;
        let index = index.min(node.attributes.len());
        let offset = if index == 0 {
            node.name_end
        } else {
            node.attributes[index - 1].end()
        };

        node.attributes.insert(
            index,
            AttributeNode::Named {
                name: name.to_string(),
                value: Some(value.to_string()),
                end: offset,
            },
        );

        let seq = self.insertions.len();
        self.insertions.push(PendingInsertion {
            offset,
            seq,
            text: format!(" {}=\"{}\"", name, escape_attribute(value)),
        });
        Some(index)
    }

    /// Insert an attribute at its conventional position (after the last spread,
    /// else appended).
    pub fn insert_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Option<usize> {
        let index = self.element(element)?.attribute_insert_index();
        self.insert_attribute_at(element, index, name, value)
    }

    /// Render the document. Untouched bytes are identical to the input.
    pub fn print(&self) -> String {
        let mut pending: Vec<&PendingInsertion> = self.insertions.iter().collect();
        // Descending offset; equal offsets keep recording order in the output.
        pending.sort_by(|a, b| b.offset.cmp(&a.offset).then(b.seq.cmp(&a.seq)));

        let mut out = self.text.clone();
        for insertion in pending {
            out.insert_str(insertion.offset as usize, &insertion.text);
        }
        out
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let typescript = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts") | Some("tsx") | Some("mts") | Some("cts")
    );
    SourceType::default()
        .with_module(true)
        .with_typescript(typescript)
        .with_jsx(true)
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

// ============================================================================
// Line/column mapping
// ============================================================================

struct LineIndex<'s> {
    text: &'s str,
    starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    fn new(text: &'s str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, starts }
    }

    /// (1-based line, 0-based UTF-16 column) of a byte offset.
    fn position(&self, offset: u32) -> (u32, u32) {
        let offset = offset as usize;
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let column = self.text[self.starts[line]..offset].encode_utf16().count();
        (line as u32 + 1, column as u32)
    }

    fn line(&self, offset: u32) -> u32 {
        self.position(offset).0
    }
}

// ============================================================================
// AST walk
// ============================================================================

struct OpenComponent {
    name: String,
    kind: ComponentKind,
    start: u32,
    end: u32,
    elements_before: usize,
}

struct MarkupCollector<'s> {
    lines: &'s LineIndex<'s>,
    elements: Vec<ElementNode>,
    components: Vec<ComponentDecl>,
    stack: Vec<OpenComponent>,
}

impl<'s> MarkupCollector<'s> {
    fn new(lines: &'s LineIndex<'s>) -> Self {
        Self {
            lines,
            elements: Vec::new(),
            components: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn enter(&mut self, name: &str, kind: ComponentKind, start: u32, end: u32) {
        self.stack.push(OpenComponent {
            name: name.to_string(),
            kind,
            start,
            end,
            elements_before: self.elements.len(),
        });
    }

    /// `const Card = memo(function Card() {..})`: the inner declaration names the
    /// component its declarator already opened.
    fn reopens_current(&self, name: &str, start: u32, end: u32) -> bool {
        self.stack
            .last()
            .is_some_and(|open| open.name == name && open.start <= start && end <= open.end)
    }

    fn exit(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        // Only declarations that render markup count as components.
        if self.elements.len() > open.elements_before {
            self.components.push(ComponentDecl {
                name: open.name,
                kind: open.kind,
                start_line: self.lines.line(open.start),
                end_line: self.lines.line(open.end),
            });
        }
    }

    fn record_element(&mut self, opening: &JSXOpeningElement) {
        let start = opening.span.start;
        let (line, column) = self.lines.position(start);

        let name_end = match &opening.type_arguments {
            Some(args) => args.span.end,
            None => opening.name.span().end,
        };

        let attributes = opening
            .attributes
            .iter()
            .map(|item| match item {
                JSXAttributeItem::Attribute(attr) => AttributeNode::Named {
                    name: attribute_name(&attr.name),
                    value: match &attr.value {
                        Some(JSXAttributeValue::StringLiteral(s)) => Some(s.value.to_string()),
                        _ => None,
                    },
                    end: attr.span.end,
                },
                JSXAttributeItem::SpreadAttribute(spread) => AttributeNode::Spread {
                    end: spread.span.end,
                },
            })
            .collect();

        let component_chain: Vec<String> = self.stack.iter().map(|c| c.name.clone()).collect();

        self.elements.push(ElementNode {
            id: ElementId(self.elements.len()),
            tag: tag_name(&opening.name),
            start,
            line,
            column,
            attributes,
            name_end,
            component: component_chain.last().cloned(),
            component_chain,
        });
    }
}

impl<'a, 's> Visit<'a> for MarkupCollector<'s> {
    fn visit_jsx_opening_element(&mut self, it: &JSXOpeningElement<'a>) {
        self.record_element(it);
        oxc_ast_visit::walk::walk_jsx_opening_element(self, it);
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        let name = it
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .filter(|n| is_component_name(n))
            .filter(|n| !self.reopens_current(n, it.span.start, it.span.end));

        match name {
            Some(name) => {
                self.enter(&name, ComponentKind::Function, it.span.start, it.span.end);
                oxc_ast_visit::walk::walk_function(self, it, flags);
                self.exit();
            }
            None => oxc_ast_visit::walk::walk_function(self, it, flags),
        }
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        let name = it
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .filter(|n| is_component_name(n))
            .filter(|n| !self.reopens_current(n, it.span.start, it.span.end));

        match name {
            Some(name) => {
                self.enter(&name, ComponentKind::Class, it.span.start, it.span.end);
                oxc_ast_visit::walk::walk_class(self, it);
                self.exit();
            }
            None => oxc_ast_visit::walk::walk_class(self, it),
        }
    }

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        let declared = match (&it.id, &it.init) {
            (BindingPattern::BindingIdentifier(id), Some(init)) if is_component_name(&id.name) => {
                component_initializer(init).map(|kind| (id.name.to_string(), kind))
            }
            _ => None,
        };

        match declared {
            Some((name, kind)) => {
                self.enter(&name, kind, it.span.start, it.span.end);
                oxc_ast_visit::walk::walk_variable_declarator(self, it);
                self.exit();
            }
            None => oxc_ast_visit::walk::walk_variable_declarator(self, it),
        }
    }
}

/// PascalCase names are component candidates.
fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn component_initializer(expr: &Expression) -> Option<ComponentKind> {
    match expr {
        Expression::ArrowFunctionExpression(_) => Some(ComponentKind::Arrow),
        Expression::FunctionExpression(_) => Some(ComponentKind::Function),
        Expression::ClassExpression(_) => Some(ComponentKind::Class),
        Expression::ParenthesizedExpression(p) => component_initializer(&p.expression),
        Expression::CallExpression(call) => call
            .arguments
            .first()
            .and_then(|arg| arg.as_expression())
            .and_then(component_initializer)
            .map(|_| ComponentKind::Wrapped),
        _ => None,
    }
}

fn tag_name(name: &JSXElementName) -> String {
    match name {
        JSXElementName::Identifier(id) => id.name.to_string(),
        JSXElementName::IdentifierReference(id) => id.name.to_string(),
        JSXElementName::NamespacedName(ns) => format!("{}:{}", ns.namespace.name, ns.name.name),
        JSXElementName::MemberExpression(me) => member_name(me),
        JSXElementName::ThisExpression(_) => "this".to_string(),
    }
}

fn member_name(me: &JSXMemberExpression) -> String {
    let object = match &me.object {
        JSXMemberExpressionObject::IdentifierReference(id) => id.name.to_string(),
        JSXMemberExpressionObject::MemberExpression(inner) => member_name(inner),
        _ => "this".to_string(),
    };
    format!("{}.{}", object, me.property.name)
}

fn attribute_name(name: &JSXAttributeName) -> String {
    match name {
        JSXAttributeName::Identifier(id) => id.name.to_string(),
        JSXAttributeName::NamespacedName(ns) => format!("{}:{}", ns.namespace.name, ns.name.name),
    }
}
