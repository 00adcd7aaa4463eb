//! Lowering of the tree-sitter syntax tree into the declaration model.
//!
//! Lowering runs in two passes. The first walks every declaration context
//! (namespaces, linkage blocks, class bodies) and records the qualified name
//! of every declared type, the class definitions and the namespace-scope
//! functions. The second lowers the collected records and functions; by then
//! every type name is known, so written names can be qualified.

use implementor_common::{SourceLocation, SourceRange};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::{debug, trace};
use tree_sitter::{Node, Tree};

use crate::ast::{
    AccessSpecifier, Attr, AttrSyntax, CxxBaseSpecifier, CxxMethodDecl, CxxRecordDecl,
    FunctionDecl, MethodKind, ParmVarDecl, RecordId, RefQualifierKind, TagKind,
};
use crate::lexer::{Lexer, TokenKind};
use crate::source_manager::SourceManager;
use crate::types::{
    CppType, NamedType, PrintingPolicy, QualType, TemplateArgument, TemplateSpecialization,
};

/// Scope component used for members of an unnamed namespace.
pub(crate) const ANONYMOUS_NAMESPACE: &str = "(anonymous namespace)";

pub(crate) struct Lowered {
    pub(crate) records: Vec<CxxRecordDecl>,
    pub(crate) functions: Vec<FunctionDecl>,
}

/// Lower a parsed translation unit.
pub(crate) fn lower(tree: &Tree, sm: &SourceManager) -> Lowered {
    let mut ctx = LoweringContext::new(sm);
    ctx.collect(tree.root_node(), &[], false);
    debug!(
        types = ctx.type_names.len(),
        records = ctx.pending_records.len(),
        functions = ctx.pending_functions.len(),
        "collected declarations"
    );

    let records = ctx.lower_records();
    let functions = ctx.lower_functions();
    Lowered { records, functions }
}

struct PendingRecord<'t> {
    id: RecordId,
    node: Node<'t>,
    body: Node<'t>,
    /// Enclosing scope, outermost first
    scope: Vec<SmolStr>,
    name: SmolStr,
    qualified_name: String,
}

struct PendingFunction<'t> {
    node: Node<'t>,
    declarator: Node<'t>,
    scope: Vec<SmolStr>,
}

/// Specifiers written before the declarator of a function.
#[derive(Default)]
struct DeclSpecifiers {
    is_virtual: bool,
    is_static: bool,
    is_const: bool,
    is_volatile: bool,
}

/// A function as lowered from one declarator, before it is attached to a
/// record.
struct LoweredFunction {
    decl: FunctionDecl,
    kind: MethodKind,
    specifiers: DeclSpecifiers,
    is_pure: bool,
    is_const: bool,
    is_volatile: bool,
    ref_qualifier: RefQualifierKind,
}

/// The parts of a declarator that declares a function.
struct FunctionDeclarator<'t> {
    /// Pointer and reference declarators around the function, outermost first
    wrappers: Vec<Node<'t>>,
    /// `function_declarator`, or `abstract_function_declarator` for conversions
    function: Node<'t>,
    /// Name node; the `operator_cast` itself for conversion functions
    name: Node<'t>,
    attributes: Vec<Node<'t>>,
}

struct LoweringContext<'a, 't> {
    sm: &'a SourceManager,
    /// Every declared type name, qualified; records map to their definition
    type_names: IndexMap<String, Option<RecordId>>,
    pending_records: Vec<PendingRecord<'t>>,
    pending_functions: Vec<PendingFunction<'t>>,
    /// Resolved direct bases per record, available once bases are lowered
    record_bases: Vec<Vec<RecordId>>,
}

impl<'a, 't> LoweringContext<'a, 't> {
    fn new(sm: &'a SourceManager) -> Self {
        Self {
            sm,
            type_names: IndexMap::new(),
            pending_records: Vec::new(),
            pending_functions: Vec::new(),
            record_bases: Vec::new(),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.sm.buffer().as_bytes()).unwrap_or("")
    }

    fn range(&self, node: Node) -> SourceRange {
        SourceRange::from_offsets(node.start_byte() as u32, node.end_byte() as u32)
    }

    // ---------------------------------------------------------------------
    // Pass 1: collection
    // ---------------------------------------------------------------------

    fn collect(&mut self, node: Node<'t>, scope: &[SmolStr], in_record: bool) {
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.collect_item(child, scope, in_record);
        }
    }

    fn collect_item(&mut self, node: Node<'t>, scope: &[SmolStr], in_record: bool) {
        match node.kind() {
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.collect_record(node, scope)
            }
            "enum_specifier" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare_type_name(name, scope);
                }
            }
            "namespace_definition" => {
                let mut inner = scope.to_vec();
                match node.child_by_field_name("name") {
                    Some(name) => inner.extend(
                        self.text(name)
                            .split("::")
                            .map(|part| {
                                let part = part.trim();
                                part.strip_prefix("inline ").unwrap_or(part).trim()
                            })
                            .filter(|part| !part.is_empty())
                            .map(SmolStr::new),
                    ),
                    None => inner.push(SmolStr::new(ANONYMOUS_NAMESPACE)),
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.collect(body, &inner, false);
                }
            }
            "declaration" | "field_declaration" | "function_definition" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.collect_item(ty, scope, in_record);
                }
                if !in_record && node.kind() != "field_declaration" {
                    self.collect_function(node, scope);
                }
            }
            "type_definition" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.collect_item(ty, scope, in_record);
                }
                let mut cursor = node.walk();
                let declarators: Vec<Node<'t>> = node
                    .children_by_field_name("declarator", &mut cursor)
                    .collect();
                for declarator in declarators {
                    if let Some(name) = declarator_name(declarator) {
                        self.declare_type_name(name, scope);
                    }
                }
            }
            "alias_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare_type_name(name, scope);
                }
            }
            "template_declaration" => {
                // Templates only contribute their names.
                let mut cursor = node.walk();
                let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
                for child in children {
                    let name = match child.kind() {
                        "class_specifier" | "struct_specifier" | "union_specifier"
                        | "alias_declaration" => child.child_by_field_name("name"),
                        "declaration" => child
                            .child_by_field_name("type")
                            .filter(|ty| ty.child_by_field_name("body").is_some())
                            .and_then(|ty| ty.child_by_field_name("name")),
                        _ => None,
                    };
                    if let Some(name) = name.filter(|name| name.kind() == "type_identifier") {
                        self.declare_type_name(name, scope);
                    }
                }
            }
            "linkage_specification" => {
                if let Some(body) = node.child_by_field_name("body") {
                    if body.kind() == "declaration_list" {
                        self.collect(body, scope, in_record);
                    } else {
                        self.collect_item(body, scope, in_record);
                    }
                }
            }
            "declaration_list" | "preproc_if" | "preproc_ifdef" | "preproc_else"
            | "preproc_elif" | "preproc_elifdef" => self.collect(node, scope, in_record),
            _ => {}
        }
    }

    fn collect_record(&mut self, node: Node<'t>, scope: &[SmolStr]) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        if name_node.kind() != "type_identifier" {
            // Specializations and out-of-line nested definitions.
            return;
        }
        let name = SmolStr::new(self.text(name_node));
        let qualified_name = qualify(&scope.join("::"), &name);
        let body = node.child_by_field_name("body");

        let id = (body.is_some() && node.kind() != "union_specifier")
            .then(|| RecordId::new(self.pending_records.len()));
        let slot = self.type_names.entry(qualified_name.clone()).or_insert(None);
        if slot.is_none() {
            *slot = id;
        }

        let Some(body) = body else {
            return;
        };
        if let Some(id) = id {
            trace!(record = %qualified_name, "collected record");
            self.pending_records.push(PendingRecord {
                id,
                node,
                body,
                scope: scope.to_vec(),
                name: name.clone(),
                qualified_name,
            });
        }

        let mut inner = scope.to_vec();
        inner.push(name);
        self.collect(body, &inner, true);
    }

    fn collect_function(&mut self, node: Node<'t>, scope: &[SmolStr]) {
        let mut cursor = node.walk();
        let declarators: Vec<Node<'t>> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let Some(parts) = split_function_declarator(declarator) else {
                continue;
            };
            if matches!(parts.name.kind(), "identifier" | "operator_name") {
                self.pending_functions.push(PendingFunction {
                    node,
                    declarator,
                    scope: scope.to_vec(),
                });
            }
        }
    }

    fn declare_type_name(&mut self, name: Node, scope: &[SmolStr]) {
        if !matches!(name.kind(), "type_identifier" | "primitive_type") {
            return;
        }
        let qualified_name = qualify(&scope.join("::"), self.text(name));
        self.type_names.entry(qualified_name).or_insert(None);
    }

    // ---------------------------------------------------------------------
    // Name lookup
    // ---------------------------------------------------------------------

    /// Qualify a written type name by searching the scope chain innermost-out,
    /// including the bases of enclosing records.
    fn resolve_type_name(&self, written: &str, scope: &[SmolStr]) -> Option<String> {
        if let Some(global) = written.strip_prefix("::") {
            return self
                .type_names
                .contains_key(global)
                .then(|| global.to_string());
        }

        let mut seen = FxHashSet::default();
        for depth in (0..=scope.len()).rev() {
            let prefix = scope[..depth].join("::");
            let candidates = [
                qualify(&prefix, written),
                qualify(&qualify(&prefix, ANONYMOUS_NAMESPACE), written),
            ];
            if let Some(found) = candidates
                .into_iter()
                .find(|candidate| self.type_names.contains_key(candidate))
            {
                return Some(found);
            }
            if let Some(Some(record)) = self.type_names.get(&prefix) {
                if let Some(found) = self.lookup_in_bases(*record, written, &mut seen) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn lookup_in_bases(
        &self,
        record: RecordId,
        written: &str,
        seen: &mut FxHashSet<RecordId>,
    ) -> Option<String> {
        for &base in self.record_bases.get(record.index())? {
            if !seen.insert(base) {
                continue;
            }
            let candidate = qualify(&self.pending_records[base.index()].qualified_name, written);
            if self.type_names.contains_key(&candidate) {
                return Some(candidate);
            }
            if let Some(found) = self.lookup_in_bases(base, written, seen) {
                return Some(found);
            }
        }
        None
    }

    fn resolve_record(&self, written: &str, scope: &[SmolStr]) -> Option<RecordId> {
        let qualified = self.resolve_type_name(written, scope)?;
        self.type_names.get(&qualified).copied().flatten()
    }

    fn named_type(&self, written: &str, scope: &[SmolStr]) -> NamedType {
        let qualified = self.resolve_type_name(written, scope);
        let written = written.strip_prefix("::").unwrap_or(written);
        NamedType::new(written, qualified)
    }

    // ---------------------------------------------------------------------
    // Pass 2: records
    // ---------------------------------------------------------------------

    fn lower_records(&mut self) -> Vec<CxxRecordDecl> {
        let bases: Vec<Vec<CxxBaseSpecifier>> = self
            .pending_records
            .iter()
            .map(|record| self.lower_bases(record))
            .collect();
        self.record_bases = bases
            .iter()
            .map(|specifiers| specifiers.iter().filter_map(|b| b.record).collect())
            .collect();

        let mut records: Vec<CxxRecordDecl> = self
            .pending_records
            .iter()
            .zip(bases)
            .map(|(pending, bases)| self.lower_record(pending, bases))
            .collect();

        let dynamic = compute_dynamic(&records);
        for (record, is_dynamic) in records.iter_mut().zip(dynamic) {
            record.is_dynamic = is_dynamic;
            if is_dynamic {
                declare_implicit_members(record);
            }
        }
        records
    }

    fn lower_record(
        &self,
        pending: &PendingRecord<'t>,
        bases: Vec<CxxBaseSpecifier>,
    ) -> CxxRecordDecl {
        let tag = if pending.node.kind() == "struct_specifier" {
            TagKind::Struct
        } else {
            TagKind::Class
        };
        let mut member_scope = pending.scope.clone();
        member_scope.push(pending.name.clone());

        let mut access = tag.default_access();
        let mut methods = Vec::new();
        self.lower_members(pending, pending.body, &member_scope, &mut access, &mut methods);

        let end_loc = Lexer::tokenize(self.range(pending.body), self.sm)
            .last()
            .map(|token| token.location())
            .unwrap_or(SourceLocation::new(pending.body.end_byte() as u32));

        debug!(
            record = %pending.qualified_name,
            bases = bases.len(),
            methods = methods.len(),
            "lowered record"
        );
        CxxRecordDecl {
            id: pending.id,
            name: pending.name.clone(),
            qualified_name: pending.qualified_name.clone(),
            tag,
            begin_loc: SourceLocation::new(pending.node.start_byte() as u32),
            end_loc,
            bases,
            methods,
            is_dynamic: false,
        }
    }

    fn lower_bases(&self, pending: &PendingRecord<'t>) -> Vec<CxxBaseSpecifier> {
        let mut cursor = pending.node.walk();
        let Some(clause) = pending
            .node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "base_class_clause")
        else {
            return Vec::new();
        };

        let default_access = if pending.node.kind() == "struct_specifier" {
            AccessSpecifier::Public
        } else {
            AccessSpecifier::Private
        };

        let mut bases = Vec::new();
        let mut access = None;
        let mut is_virtual = false;
        let mut start = None;
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                ":" | "," => {
                    access = None;
                    is_virtual = false;
                    start = None;
                }
                "access_specifier" => {
                    access = AccessSpecifier::from_keyword(self.text(child).trim());
                    start.get_or_insert(child.start_byte());
                }
                "virtual" => {
                    is_virtual = true;
                    start.get_or_insert(child.start_byte());
                }
                "attribute_declaration" | "comment" | "ERROR" | "..." => {}
                _ if child.is_named() => {
                    let written_name = normalize_spelling(self.text(child));
                    let record = self.resolve_record(&written_name, &pending.scope);
                    if record.is_none() {
                        trace!(base = %written_name, "base is not defined in the translation unit");
                    }
                    let begin = start.unwrap_or(child.start_byte()) as u32;
                    bases.push(CxxBaseSpecifier {
                        written_name,
                        access: access.unwrap_or(default_access),
                        is_virtual,
                        range: SourceRange::from_offsets(begin, child.end_byte() as u32),
                        record,
                    });
                }
                _ => {}
            }
        }
        bases
    }

    /// Lower the member list of a class body, following access labels and
    /// conditional compilation blocks.
    fn lower_members(
        &self,
        pending: &PendingRecord<'t>,
        list: Node<'t>,
        scope: &[SmolStr],
        access: &mut AccessSpecifier,
        methods: &mut Vec<CxxMethodDecl>,
    ) {
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "access_specifier" => {
                    if let Some(label) = AccessSpecifier::from_keyword(self.text(child).trim()) {
                        *access = label;
                    }
                }
                "field_declaration" | "declaration" | "function_definition" => {
                    let mut declarators = child.walk();
                    for declarator in child.children_by_field_name("declarator", &mut declarators) {
                        if let Some(method) =
                            self.lower_method(pending, child, declarator, scope, *access)
                        {
                            methods.push(method);
                        }
                    }
                }
                "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
                | "preproc_elifdef" => self.lower_members(pending, child, scope, access, methods),
                _ => {}
            }
        }
    }

    fn lower_method(
        &self,
        pending: &PendingRecord<'t>,
        decl: Node<'t>,
        declarator: Node<'t>,
        scope: &[SmolStr],
        access: AccessSpecifier,
    ) -> Option<CxxMethodDecl> {
        let lowered = self.lower_function(decl, declarator, scope, &pending.qualified_name)?;
        if lowered.decl.name.contains("::") {
            // Out-of-line style names are not members of this class.
            return None;
        }
        let kind = match lowered.kind {
            MethodKind::Ordinary if lowered.decl.return_type_range.is_invalid()
                && lowered.decl.name == pending.name =>
            {
                MethodKind::Constructor
            }
            kind => kind,
        };
        Some(CxxMethodDecl {
            function: lowered.decl,
            parent: pending.id,
            kind,
            access,
            is_virtual: lowered.specifiers.is_virtual,
            is_pure: lowered.is_pure,
            is_static: lowered.specifiers.is_static,
            is_const: lowered.is_const,
            is_volatile: lowered.is_volatile,
            ref_qualifier: lowered.ref_qualifier,
            is_implicit: false,
        })
    }

    // ---------------------------------------------------------------------
    // Pass 2: functions
    // ---------------------------------------------------------------------

    fn lower_functions(&self) -> Vec<FunctionDecl> {
        self.pending_functions
            .iter()
            .filter_map(|pending| {
                let prefix = pending.scope.join("::");
                self.lower_function(pending.node, pending.declarator, &pending.scope, &prefix)
                    .map(|lowered| lowered.decl)
            })
            .collect()
    }

    /// Lower one function declarator of `decl`. `qualifier` is the qualified
    /// name of the enclosing scope.
    fn lower_function(
        &self,
        decl: Node<'t>,
        declarator: Node<'t>,
        scope: &[SmolStr],
        qualifier: &str,
    ) -> Option<LoweredFunction> {
        let parts = split_function_declarator(declarator)?;
        let function = parts.function;

        let mut specifiers = DeclSpecifiers::default();
        let mut attrs = Vec::new();
        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            match child.kind() {
                "virtual" => specifiers.is_virtual = true,
                "storage_class_specifier" => {
                    specifiers.is_static |= self.text(child).trim() == "static";
                }
                "type_qualifier" => match self.text(child).trim() {
                    "const" => specifiers.is_const = true,
                    "volatile" => specifiers.is_volatile = true,
                    _ => {}
                },
                "attribute_declaration" | "attribute_specifier" | "ms_declspec_modifier" => {
                    attrs.extend(self.lower_attributes(child));
                }
                _ => {}
            }
        }
        for attribute in &parts.attributes {
            attrs.extend(self.lower_attributes(*attribute));
        }

        let mut is_const = false;
        let mut is_volatile = false;
        let mut ref_qualifier = RefQualifierKind::None;
        let mut exception_spec_range = SourceRange::invalid();
        let mut trailing_return = None;
        let mut cursor = function.walk();
        for child in function.children(&mut cursor) {
            match child.kind() {
                "type_qualifier" => match self.text(child).trim() {
                    "const" => is_const = true,
                    "volatile" => is_volatile = true,
                    _ => {}
                },
                "ref_qualifier" => {
                    ref_qualifier = if self.text(child).trim() == "&&" {
                        RefQualifierKind::RValue
                    } else {
                        RefQualifierKind::LValue
                    };
                }
                "noexcept" | "throw_specifier" => exception_spec_range = self.range(child),
                "virtual_specifier" => attrs.push(Attr {
                    name: SmolStr::new(self.text(child).trim()),
                    syntax: AttrSyntax::Keyword,
                    range: self.range(child),
                }),
                "attribute_declaration" | "attribute_specifier" => {
                    attrs.extend(self.lower_attributes(child));
                }
                "trailing_return_type" => trailing_return = child.named_child(0),
                _ => {}
            }
        }

        let (name, kind) = self.function_name(&parts, scope);

        let (return_type, return_type_range) = match (kind, decl.child_by_field_name("type")) {
            (MethodKind::Conversion, _) | (_, None) => {
                (QualType::new(CppType::Void), SourceRange::invalid())
            }
            (_, Some(_)) if trailing_return.is_some() => {
                let descriptor = trailing_return?;
                (
                    self.lower_type_descriptor(descriptor, scope),
                    self.range(descriptor),
                )
            }
            (_, Some(type_node)) => {
                let base = QualType::new(self.lower_type_specifier(type_node, scope))
                    .with_qualifiers(specifiers.is_const, specifiers.is_volatile);
                let ty = parts
                    .wrappers
                    .iter()
                    .fold(base, |ty, wrapper| self.wrap_type(ty, *wrapper));
                (ty, self.range(type_node))
            }
        };

        let (params, is_variadic) = match function.child_by_field_name("parameters") {
            Some(list) => self.lower_parameters(list, scope),
            None => (Vec::new(), false),
        };

        let is_pure = is_pure_declaration(decl, self.sm);
        let (begin_loc, end_loc) = self.declaration_bounds(decl);

        Some(LoweredFunction {
            decl: FunctionDecl {
                qualified_name: qualify(qualifier, &name),
                name,
                return_type,
                return_type_range,
                params,
                is_variadic,
                exception_spec_range,
                attrs,
                begin_loc,
                end_loc,
            },
            kind,
            specifiers,
            is_pure,
            is_const,
            is_volatile,
            ref_qualifier,
        })
    }

    fn function_name(
        &self,
        parts: &FunctionDeclarator<'t>,
        scope: &[SmolStr],
    ) -> (SmolStr, MethodKind) {
        let name = parts.name;
        match name.kind() {
            "operator_cast" => {
                let mut ty = QualType::new(
                    name.child_by_field_name("type")
                        .map(|ty| self.lower_type_specifier(ty, scope))
                        .unwrap_or(CppType::Void),
                );
                let mut cursor = name.walk();
                for child in name.children(&mut cursor) {
                    if child.kind() == "type_qualifier" {
                        let text = self.text(child).trim();
                        ty = ty.with_qualifiers(text == "const", text == "volatile");
                    }
                }
                let mut current = name.child_by_field_name("declarator");
                while let Some(node) = current.filter(|n| n.kind() != "abstract_function_declarator") {
                    ty = self.wrap_type(ty, node);
                    current = inner_declarator(node);
                }
                let spelled = ty.as_string(&PrintingPolicy::as_written());
                (SmolStr::new(format!("operator {spelled}")), MethodKind::Conversion)
            }
            "destructor_name" => (
                SmolStr::new(normalize_spelling(self.text(name)).replace(' ', "")),
                MethodKind::Destructor,
            ),
            "operator_name" => (
                SmolStr::new(normalize_operator_name(self.text(name))),
                MethodKind::Ordinary,
            ),
            _ => (
                SmolStr::new(normalize_spelling(self.text(name))),
                MethodKind::Ordinary,
            ),
        }
    }

    /// First token of the declaration and its last token before any `;`.
    fn declaration_bounds(&self, decl: Node) -> (SourceLocation, SourceLocation) {
        let tokens = Lexer::tokenize(self.range(decl), self.sm);
        let begin = tokens
            .first()
            .map(|token| token.location())
            .unwrap_or(SourceLocation::new(decl.start_byte() as u32));
        let end = tokens
            .iter()
            .rev()
            .find(|token| token.is_not(TokenKind::Semi))
            .map(|token| token.location())
            .unwrap_or(begin);
        (begin, end)
    }

    fn lower_attributes(&self, node: Node) -> Vec<Attr> {
        match node.kind() {
            "attribute_declaration" => {
                let mut cursor = node.walk();
                node.named_children(&mut cursor)
                    .filter(|child| child.kind() == "attribute")
                    .map(|attribute| Attr {
                        name: SmolStr::new(
                            attribute
                                .child_by_field_name("name")
                                .map(|name| self.text(name))
                                .unwrap_or_default(),
                        ),
                        syntax: AttrSyntax::Cxx11,
                        range: self.range(attribute),
                    })
                    .collect()
            }
            "attribute_specifier" => {
                let inner = node
                    .named_child(0)
                    .and_then(|args| args.named_child(0))
                    .unwrap_or(node);
                vec![Attr {
                    name: SmolStr::new(attribute_word(self.text(inner))),
                    syntax: AttrSyntax::Gnu,
                    range: self.range(inner),
                }]
            }
            "ms_declspec_modifier" => {
                let inner = node.named_child(0).unwrap_or(node);
                vec![Attr {
                    name: SmolStr::new(self.text(inner)),
                    syntax: AttrSyntax::Declspec,
                    range: self.range(inner),
                }]
            }
            _ => Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    fn lower_parameters(&self, list: Node, scope: &[SmolStr]) -> (Vec<ParmVarDecl>, bool) {
        let mut params = Vec::new();
        let mut is_variadic = false;
        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            match child.kind() {
                "..." => is_variadic = true,
                "parameter_declaration" | "optional_parameter_declaration" => {
                    let base = self.specified_type(child, scope);
                    let (ty, name) = self.apply_declarator(
                        base,
                        child.child_by_field_name("declarator"),
                        scope,
                    );
                    let ty = ty.decayed();
                    // `(void)` declares no parameters.
                    if name.is_none() && ty == QualType::new(CppType::Void) {
                        continue;
                    }
                    params.push(ParmVarDecl {
                        name: SmolStr::new(name.map(|n| self.text(n)).unwrap_or_default()),
                        ty,
                        range: self.range(child),
                    });
                }
                "variadic_parameter_declaration" => {
                    let declarator = child.child_by_field_name("declarator");
                    let type_text = child
                        .child_by_field_name("type")
                        .map(|ty| normalize_spelling(self.text(ty)))
                        .unwrap_or_default();
                    let sigil = match declarator.map(|d| d.kind()) {
                        Some("reference_declarator") => declarator
                            .and_then(|d| d.child(0))
                            .map(|token| self.text(token))
                            .unwrap_or("&"),
                        _ => "",
                    };
                    let name = declarator
                        .and_then(declarator_name)
                        .map(|name| self.text(name))
                        .unwrap_or_default();
                    let spelled = if sigil.is_empty() {
                        format!("{type_text}...")
                    } else {
                        format!("{type_text} {sigil}...")
                    };
                    params.push(ParmVarDecl {
                        name: SmolStr::new(name),
                        ty: QualType::new(CppType::Spelled(spelled)),
                        range: self.range(child),
                    });
                }
                _ => {}
            }
        }
        (params, is_variadic)
    }

    /// The type named by the specifiers of a declaration, with its
    /// cv-qualifiers.
    fn specified_type(&self, node: Node, scope: &[SmolStr]) -> QualType {
        let ty = node
            .child_by_field_name("type")
            .map(|ty| self.lower_type_specifier(ty, scope))
            .unwrap_or_else(|| CppType::Int { signed: true });
        let mut is_const = false;
        let mut is_volatile = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                match self.text(child).trim() {
                    "const" => is_const = true,
                    "volatile" => is_volatile = true,
                    _ => {}
                }
            }
        }
        QualType::new(ty).with_qualifiers(is_const, is_volatile)
    }

    fn lower_type_descriptor(&self, node: Node, scope: &[SmolStr]) -> QualType {
        let base = self.specified_type(node, scope);
        self.apply_declarator(base, node.child_by_field_name("declarator"), scope)
            .0
    }

    /// Apply a (possibly abstract) declarator to `base`, outermost first.
    /// Returns the declared type and the name node, if any.
    fn apply_declarator<'n>(
        &self,
        base: QualType,
        declarator: Option<Node<'n>>,
        scope: &[SmolStr],
    ) -> (QualType, Option<Node<'n>>) {
        let mut ty = base;
        let mut current = declarator;
        while let Some(node) = current {
            match node.kind() {
                "identifier" | "field_identifier" | "type_identifier" => return (ty, Some(node)),
                "pointer_declarator"
                | "abstract_pointer_declarator"
                | "reference_declarator"
                | "abstract_reference_declarator" => ty = self.wrap_type(ty, node),
                "array_declarator" | "abstract_array_declarator" => {
                    let size = node
                        .child_by_field_name("size")
                        .map(|size| normalize_spelling(self.text(size)));
                    ty = QualType::new(CppType::Array {
                        element: Box::new(ty),
                        size,
                    });
                }
                "function_declarator" | "abstract_function_declarator" => {
                    let (params, is_variadic) = match node.child_by_field_name("parameters") {
                        Some(list) => self.lower_parameters(list, scope),
                        None => (Vec::new(), false),
                    };
                    ty = QualType::new(CppType::Function {
                        return_type: Box::new(ty),
                        params: params.into_iter().map(|param| param.ty).collect(),
                        is_variadic,
                    });
                }
                "variadic_declarator" => return (ty, node.named_child(0)),
                "parenthesized_declarator"
                | "abstract_parenthesized_declarator"
                | "attributed_declarator" => {}
                _ => break,
            }
            current = inner_declarator(node);
        }
        (ty, None)
    }

    /// Wrap `ty` in the pointer or reference a declarator node denotes.
    fn wrap_type(&self, ty: QualType, declarator: Node) -> QualType {
        match declarator.kind() {
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let mut is_const = false;
                let mut is_volatile = false;
                let mut cursor = declarator.walk();
                for child in declarator.children(&mut cursor) {
                    if child.kind() == "type_qualifier" {
                        match self.text(child).trim() {
                            "const" => is_const = true,
                            "volatile" => is_volatile = true,
                            _ => {}
                        }
                    }
                }
                ty.pointer_to().with_qualifiers(is_const, is_volatile)
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let is_rvalue = declarator.child(0).is_some_and(|sigil| sigil.kind() == "&&");
                if is_rvalue {
                    QualType::new(CppType::RValueReference(Box::new(ty)))
                } else {
                    QualType::new(CppType::LValueReference(Box::new(ty)))
                }
            }
            _ => ty,
        }
    }

    fn lower_type_specifier(&self, node: Node, scope: &[SmolStr]) -> CppType {
        match node.kind() {
            "primitive_type" => CppType::from_primitive(self.text(node).trim()),
            "sized_type_specifier" => self.lower_sized_type(node),
            "type_identifier" => CppType::Named(self.named_type(self.text(node), scope)),
            "qualified_identifier" => self.lower_qualified_type(node, scope),
            "template_type" => self.lower_template_type(node, "", scope),
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => {
                match node.child_by_field_name("name") {
                    Some(name) => self.lower_type_specifier(name, scope),
                    None => CppType::Spelled(normalize_spelling(self.text(node))),
                }
            }
            _ => CppType::Spelled(normalize_spelling(self.text(node))),
        }
    }

    fn lower_sized_type(&self, node: Node) -> CppType {
        let mut unsigned = false;
        let mut signed = false;
        let mut longs = 0;
        let mut short = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "unsigned" => unsigned = true,
                "signed" => signed = true,
                "long" => longs += 1,
                "short" => short = true,
                _ => {}
            }
        }
        let base = node.child_by_field_name("type").map(|ty| self.text(ty).trim());
        match (base, longs) {
            (Some("char"), _) => CppType::Char {
                signed: if unsigned {
                    Some(false)
                } else if signed {
                    Some(true)
                } else {
                    None
                },
            },
            (Some("double"), 0) => CppType::Double,
            (Some("double"), _) => CppType::LongDouble,
            _ if short => CppType::Short { signed: !unsigned },
            (_, 0) => CppType::Int { signed: !unsigned },
            (_, 1) => CppType::Long { signed: !unsigned },
            _ => CppType::LongLong { signed: !unsigned },
        }
    }

    /// `a::b::C` or `a::b::C<T>`: the scope is kept as written and the whole
    /// name is qualified as one unit.
    fn lower_qualified_type(&self, node: Node, scope: &[SmolStr]) -> CppType {
        let mut prefix = String::new();
        let mut current = node;
        while current.kind() == "qualified_identifier" {
            if let Some(scope_node) = current.child_by_field_name("scope") {
                prefix.push_str(&normalize_spelling(self.text(scope_node)));
            }
            prefix.push_str("::");
            match current.child_by_field_name("name") {
                Some(name) => current = name,
                None => return CppType::Spelled(normalize_spelling(self.text(node))),
            }
        }
        match current.kind() {
            "type_identifier" => {
                let written = format!("{prefix}{}", self.text(current));
                CppType::Named(self.named_type(&written, scope))
            }
            "template_type" => self.lower_template_type(current, &prefix, scope),
            _ => CppType::Spelled(normalize_spelling(self.text(node))),
        }
    }

    fn lower_template_type(&self, node: Node, prefix: &str, scope: &[SmolStr]) -> CppType {
        let name = node
            .child_by_field_name("name")
            .map(|name| self.text(name))
            .unwrap_or_default();
        let template = self.named_type(&format!("{prefix}{name}"), scope);

        let mut args = Vec::new();
        if let Some(list) = node.child_by_field_name("arguments") {
            let mut cursor = list.walk();
            for arg in list.named_children(&mut cursor) {
                let arg = match arg.kind() {
                    "type_descriptor" => TemplateArgument::Type(self.lower_type_descriptor(arg, scope)),
                    "comment" => continue,
                    _ => TemplateArgument::Expression(normalize_spelling(self.text(arg))),
                };
                args.push(arg);
            }
        }
        CppType::TemplateSpecialization(TemplateSpecialization::new(template, args))
    }
}

// -------------------------------------------------------------------------
// Free helpers
// -------------------------------------------------------------------------

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}::{name}")
    }
}

/// The declarator nested inside a declarator node.
fn inner_declarator(node: Node) -> Option<Node> {
    if let Some(inner) = node.child_by_field_name("declarator") {
        return Some(inner);
    }
    match node.kind() {
        "reference_declarator"
        | "abstract_reference_declarator"
        | "parenthesized_declarator"
        | "abstract_parenthesized_declarator"
        | "attributed_declarator"
        | "variadic_declarator" => node.named_children(&mut node.walk()).find(|child| {
            !matches!(
                child.kind(),
                "attribute_declaration" | "comment" | "ms_call_modifier"
            )
        }),
        _ => None,
    }
}

/// Innermost name of a declarator.
fn declarator_name(node: Node) -> Option<Node> {
    let mut current = node;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "primitive_type" => {
                return Some(current)
            }
            _ => current = inner_declarator(current)?,
        }
    }
}

fn split_function_declarator<'t>(declarator: Node<'t>) -> Option<FunctionDeclarator<'t>> {
    let mut wrappers = Vec::new();
    let mut attributes = Vec::new();
    let mut current = declarator;
    loop {
        match current.kind() {
            "function_declarator" => {
                let name = current.child_by_field_name("declarator")?;
                let is_function_name = matches!(
                    name.kind(),
                    "identifier"
                        | "field_identifier"
                        | "destructor_name"
                        | "operator_name"
                        | "qualified_identifier"
                        | "template_function"
                );
                return is_function_name.then_some(FunctionDeclarator {
                    wrappers,
                    function: current,
                    name,
                    attributes,
                });
            }
            "operator_cast" => {
                let mut function = current.child_by_field_name("declarator")?;
                while function.kind() != "abstract_function_declarator" {
                    function = inner_declarator(function)?;
                }
                return Some(FunctionDeclarator {
                    wrappers,
                    function,
                    name: current,
                    attributes,
                });
            }
            "pointer_declarator" | "reference_declarator" => wrappers.push(current),
            "attributed_declarator" => attributes.extend(
                current
                    .named_children(&mut current.walk())
                    .filter(|child| child.kind() == "attribute_declaration"),
            ),
            "parenthesized_declarator" => {}
            _ => return None,
        }
        current = inner_declarator(current)?;
    }
}

/// Whether the declaration carries a pure specifier, either as its own
/// clause or as a `= 0` initializer of a member declarator.
fn is_pure_declaration(decl: Node, sm: &SourceManager) -> bool {
    let mut cursor = decl.walk();
    let has_clause = decl
        .children(&mut cursor)
        .any(|child| child.kind() == "pure_virtual_clause");
    let has_zero_initializer = decl.kind() == "field_declaration"
        && decl
            .child_by_field_name("default_value")
            .is_some_and(|value| {
                value.kind() == "number_literal" && sm.text(range_of(value)).trim() == "0"
            });
    has_clause || has_zero_initializer
}

fn range_of(node: Node) -> SourceRange {
    SourceRange::from_offsets(node.start_byte() as u32, node.end_byte() as u32)
}

/// Collapse whitespace runs to one space and drop spaces around `::` and
/// inside angle brackets.
fn normalize_spelling(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(" ::", "::")
        .replace(":: ", "::")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" <", "<")
        .replace(" ,", ",")
}

/// `operator ==` -> `operator==`, `operator new []` -> `operator new[]`.
fn normalize_operator_name(text: &str) -> String {
    let rest = text.trim().trim_start_matches("operator").trim();
    let rest = normalize_spelling(rest);
    let is_word = rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '"');
    if is_word {
        format!("operator {}", rest.replace(" [", "[").replace("[ ", "["))
    } else {
        format!("operator{}", rest.replace(' ', ""))
    }
}

/// Name of the first attribute inside `__attribute__((...))`.
fn attribute_word(text: &str) -> &str {
    let text = text.trim_start_matches('(').trim();
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

/// Whether each record is dynamic: it declares virtual or pure methods, has a
/// virtual base, or derives from a dynamic record.
fn compute_dynamic(records: &[CxxRecordDecl]) -> Vec<bool> {
    fn visit(records: &[CxxRecordDecl], index: usize, state: &mut [Option<bool>]) -> bool {
        if let Some(known) = state[index] {
            return known;
        }
        // Provisional value breaks cycles in malformed input.
        state[index] = Some(false);
        let record = &records[index];
        let dynamic = record
            .methods
            .iter()
            .any(|method| method.is_virtual || method.is_pure)
            || record.bases.iter().any(|base| {
                base.is_virtual
                    || base
                        .record
                        .is_some_and(|id| visit(records, id.index(), state))
            });
        state[index] = Some(dynamic);
        dynamic
    }

    let mut state = vec![None; records.len()];
    (0..records.len())
        .map(|index| visit(records, index, &mut state))
        .collect()
}

/// Declare the copy assignment, move assignment and destructor a dynamic
/// class gets from the compiler, unless the user declared them.
fn declare_implicit_members(record: &mut CxxRecordDecl) {
    let refers_to_record = |ty: &QualType| {
        ty.pointee().is_some_and(|pointee| match pointee.ty() {
            CppType::Named(named) => named.unqualified_name() == record.name.as_str(),
            _ => false,
        })
    };
    let is_rvalue = |ty: &QualType| matches!(ty.ty(), CppType::RValueReference(_));
    let single_param = |method: &CxxMethodDecl| match method.function.params.as_slice() {
        [param] if refers_to_record(&param.ty) => Some(is_rvalue(&param.ty)),
        _ => None,
    };

    let mut has_copy_assignment = false;
    let mut has_move_assignment = false;
    let mut has_copy_or_move_constructor = false;
    let mut has_destructor = false;
    for method in &record.methods {
        match method.kind {
            MethodKind::Destructor => has_destructor = true,
            MethodKind::Constructor => has_copy_or_move_constructor |= single_param(method).is_some(),
            _ if method.function.name == "operator=" => match single_param(method) {
                Some(true) => has_move_assignment = true,
                Some(false) => has_copy_assignment = true,
                None => {}
            },
            _ => {}
        }
    }

    let class_type = || {
        QualType::new(CppType::Named(NamedType::new(
            record.name.to_string(),
            Some(record.qualified_name.clone()),
        )))
    };
    let implicit = |name: String, return_type: QualType, params: Vec<QualType>, kind| {
        CxxMethodDecl {
            function: FunctionDecl {
                qualified_name: qualify(&record.qualified_name, &name),
                name: SmolStr::new(name),
                return_type,
                return_type_range: SourceRange::invalid(),
                params: params
                    .into_iter()
                    .map(|ty| ParmVarDecl {
                        name: SmolStr::default(),
                        ty,
                        range: SourceRange::invalid(),
                    })
                    .collect(),
                is_variadic: false,
                exception_spec_range: SourceRange::invalid(),
                attrs: Vec::new(),
                begin_loc: record.begin_loc,
                end_loc: record.begin_loc,
            },
            parent: record.id,
            kind,
            access: AccessSpecifier::Public,
            is_virtual: false,
            is_pure: false,
            is_static: false,
            is_const: false,
            is_volatile: false,
            ref_qualifier: RefQualifierKind::None,
            is_implicit: true,
        }
    };
    let lvalue = |ty: QualType| QualType::new(CppType::LValueReference(Box::new(ty)));
    let rvalue = |ty: QualType| QualType::new(CppType::RValueReference(Box::new(ty)));

    let mut implicit_members = Vec::new();
    if !has_copy_assignment {
        implicit_members.push(implicit(
            "operator=".into(),
            lvalue(class_type()),
            vec![lvalue(class_type().with_qualifiers(true, false))],
            MethodKind::Ordinary,
        ));
    }
    let suppresses_move = has_copy_or_move_constructor
        || has_copy_assignment
        || has_move_assignment
        || has_destructor;
    if !suppresses_move {
        implicit_members.push(implicit(
            "operator=".into(),
            lvalue(class_type()),
            vec![rvalue(class_type())],
            MethodKind::Ordinary,
        ));
    }
    if !has_destructor {
        implicit_members.push(implicit(
            format!("~{}", record.name),
            QualType::new(CppType::Void),
            Vec::new(),
            MethodKind::Destructor,
        ));
    }

    if !implicit_members.is_empty() {
        trace!(
            record = %record.qualified_name,
            count = implicit_members.len(),
            "declared implicit members"
        );
    }
    record.methods.extend(implicit_members);
}
