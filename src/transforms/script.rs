// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! JavaScript transpiling and minification via swc

use std::path::Path;

use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::util::take::Take;
use swc_common::{sync::Lrc, BytePos, FileName, LineCol, SourceMap, Spanned, SyntaxContext};
use swc_ecma_ast::{
    ArrowExpr, BinExpr, BinaryOp, BlockStmt, BlockStmtOrExpr, CallExpr, Callee, Class, EsVersion,
    Expr, ExprOrSpread, FnExpr, Function, Ident, IdentName, KeyValueProp, Lit, MemberExpr,
    MemberProp, MetaPropExpr, MetaPropKind, Param, ParenExpr, Program, Prop, PropName,
    ReturnStmt, Stmt, Str, Super, ThisExpr, Tpl, TplElement,
};
use swc_ecma_codegen::{text_writer::JsWriter, Config as CodegenConfig, Emitter};
use swc_ecma_parser::{parse_file_as_program, Syntax};
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use super::{FileBuf, Transform};
use crate::errors::AssetflowError;

type Parsed = (Lrc<SourceMap>, Program);

fn parse(
    step: &str,
    path: &Path,
    code: &str,
    comments: Option<&dyn Comments>,
) -> Result<Parsed, AssetflowError> {
    let source_map = Lrc::new(SourceMap::default());
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Real(path.to_path_buf())),
        code.to_owned(),
    );

    let mut recovered = vec![];
    let result = parse_file_as_program(
        &source_file,
        Syntax::Es(Default::default()),
        EsVersion::Es2022,
        comments,
        &mut recovered,
    );

    let error = match result {
        Ok(program) if recovered.is_empty() => return Ok((source_map, program)),
        Ok(_) => recovered.remove(0),
        Err(e) => e,
    };

    let loc = source_map.lookup_char_pos(error.span().lo);
    Err(AssetflowError::transform_failed(
        step,
        path,
        format!(
            "{} (line {}, column {})",
            error.kind().msg(),
            loc.line,
            loc.col_display + 1
        ),
    ))
}

fn emit(
    step: &str,
    path: &Path,
    (source_map, program): &Parsed,
    cfg: CodegenConfig,
    comments: Option<&dyn Comments>,
    positions: Option<&mut Vec<(BytePos, LineCol)>>,
) -> Result<String, AssetflowError> {
    let mut buf = vec![];
    {
        let writer = JsWriter::new(Lrc::clone(source_map), "\n", &mut buf, positions);
        let mut emitter = Emitter {
            cfg,
            cm: Lrc::clone(source_map),
            comments,
            wr: writer,
        };
        emitter
            .emit_program(program)
            .map_err(|e| AssetflowError::transform_failed(step, path, e.to_string()))?;
    }

    String::from_utf8(buf)
        .map_err(|e| AssetflowError::transform_failed(step, path, e.to_string()))
}

/// Original zero-based line of the first token printed on each output line
fn line_origins(
    source_map: &SourceMap,
    positions: &[(BytePos, LineCol)],
    line_count: usize,
) -> Vec<Option<u32>> {
    let mut origins = vec![None; line_count];
    for (pos, generated) in positions {
        if *pos == BytePos::DUMMY {
            continue;
        }
        if let Some(slot @ None) = origins.get_mut(generated.line as usize) {
            *slot = Some(source_map.lookup_char_pos(*pos).line.saturating_sub(1) as u32);
        }
    }
    origins
}

/// Lower ES2015 expression syntax to ES5.
///
/// Arrow functions become function expressions (bound to the outer `this`
/// when they use it), untagged template literals become string
/// concatenation and shorthand properties get an explicit value. Arrows
/// that read `arguments`, `super` or `new.target` are left alone since a
/// plain function would rebind them. Comments survive; the source map is
/// carried through line by line.
#[derive(Debug, Default)]
pub struct Transpile;

impl Transform for Transpile {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        files
            .into_iter()
            .map(|mut file| {
                let comments = SingleThreadedComments::default();
                let (source_map, mut program) =
                    parse(self.name(), &file.path, file.text(self.name())?, Some(&comments))?;

                program.visit_mut_with(&mut Downlevel);

                let mut positions = vec![];
                let parsed = (source_map, program);
                let code = emit(
                    self.name(),
                    &file.path,
                    &parsed,
                    CodegenConfig::default().with_minify(false),
                    Some(&comments),
                    Some(&mut positions),
                )?;

                if let Some(map) = file.source_map.take() {
                    let origins = line_origins(&parsed.0, &positions, code.split('\n').count());
                    file.source_map = Some(map.remap(&origins));
                }
                file.contents = code.into_bytes();
                Ok(file)
            })
            .collect()
    }
}

struct Downlevel;

impl VisitMut for Downlevel {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        // Inner nodes first, so an outer arrow sees `.bind(this)` of lowered
        // inner arrows
        expr.visit_mut_children_with(self);

        let lowered = match expr {
            Expr::Tpl(tpl) => Some(concat_template(tpl)),
            Expr::Arrow(arrow) => arrow_to_function(arrow),
            _ => None,
        };
        if let Some(lowered) = lowered {
            *expr = lowered;
        }
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        prop.visit_mut_children_with(self);

        if let Prop::Shorthand(ident) = prop {
            let value = ident.clone();
            *prop = Prop::KeyValue(KeyValueProp {
                key: PropName::Ident(IdentName::new(value.sym.clone(), value.span)),
                value: Box::new(Expr::Ident(value)),
            });
        }
    }
}

fn paren(expr: Expr) -> Expr {
    Expr::Paren(ParenExpr {
        span: expr.span(),
        expr: Box::new(expr),
    })
}

fn string(element: TplElement) -> Expr {
    Expr::Lit(Lit::Str(Str {
        span: element.span,
        value: element.cooked.unwrap_or(element.raw),
        raw: None,
    }))
}

fn add(left: Expr, right: Expr) -> Expr {
    Expr::Bin(BinExpr {
        span: left.span().with_hi(right.span().hi),
        op: BinaryOp::Add,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// `` `a${b}c` `` → `("a" + b + "c")`; `` `a` `` → `"a"`
fn concat_template(tpl: &mut Tpl) -> Expr {
    let span = tpl.span;
    let mut quasis = std::mem::take(&mut tpl.quasis).into_iter();
    let exprs = std::mem::take(&mut tpl.exprs);
    let plain = exprs.is_empty();

    // Always start from a string so `+` concatenates
    let mut out = match quasis.next() {
        Some(head) => string(head),
        None => Expr::Lit(Lit::Str(Str {
            span,
            value: "".into(),
            raw: None,
        })),
    };

    for (expr, quasi) in exprs.into_iter().zip(quasis) {
        let expr = match *expr {
            e @ (Expr::Ident(_)
            | Expr::Lit(_)
            | Expr::Member(_)
            | Expr::Call(_)
            | Expr::This(_)
            | Expr::Paren(_)) => e,
            e => paren(e),
        };
        out = add(out, expr);

        let empty = quasi.cooked.as_ref().unwrap_or(&quasi.raw).is_empty();
        if !empty {
            out = add(out, string(quasi));
        }
    }

    if plain {
        out
    } else {
        paren(out)
    }
}

/// Which outer bindings a function body depends on
#[derive(Default)]
struct LexicalUses {
    this: bool,
    rebinds: bool,
}

impl Visit for LexicalUses {
    fn visit_this_expr(&mut self, _: &ThisExpr) {
        self.this = true;
    }

    fn visit_ident(&mut self, ident: &Ident) {
        if &*ident.sym == "arguments" {
            self.rebinds = true;
        }
    }

    fn visit_super(&mut self, _: &Super) {
        self.rebinds = true;
    }

    fn visit_meta_prop_expr(&mut self, meta: &MetaPropExpr) {
        if meta.kind == MetaPropKind::NewTarget {
            self.rebinds = true;
        }
    }

    // Own `this` from here down
    fn visit_function(&mut self, _: &Function) {}

    fn visit_class(&mut self, _: &Class) {}
}

fn arrow_to_function(arrow: &mut ArrowExpr) -> Option<Expr> {
    let mut uses = LexicalUses::default();
    arrow.visit_children_with(&mut uses);
    if uses.rebinds {
        return None;
    }

    let span = arrow.span;
    let body = match BlockStmtOrExpr::take(&mut arrow.body) {
        BlockStmtOrExpr::BlockStmt(block) => block,
        BlockStmtOrExpr::Expr(expr) => BlockStmt {
            span: expr.span(),
            ctxt: SyntaxContext::empty(),
            stmts: vec![Stmt::Return(ReturnStmt {
                span: expr.span(),
                arg: Some(expr),
            })],
        },
    };

    let function = Function {
        params: std::mem::take(&mut arrow.params)
            .into_iter()
            .map(Param::from)
            .collect(),
        decorators: Vec::new(),
        span,
        ctxt: arrow.ctxt,
        body: Some(body),
        is_generator: false,
        is_async: arrow.is_async,
        type_params: None,
        return_type: None,
    };
    let function = paren(Expr::Fn(FnExpr {
        ident: None,
        function: Box::new(function),
    }));

    if !uses.this {
        return Some(function);
    }

    Some(Expr::Call(CallExpr {
        span,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(Expr::Member(MemberExpr {
            span,
            obj: Box::new(function),
            prop: MemberProp::Ident(IdentName::new("bind".into(), span)),
        }))),
        args: vec![ExprOrSpread {
            spread: None,
            expr: Box::new(Expr::This(ThisExpr { span })),
        }],
        type_args: None,
    }))
}

/// Whitespace/comment-stripping minification; drops any source map
#[derive(Debug, Default)]
pub struct MinifyJs;

impl Transform for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        files
            .into_iter()
            .map(|mut file| {
                let parsed = parse(self.name(), &file.path, file.text(self.name())?, None)?;
                let code = emit(
                    self.name(),
                    &file.path,
                    &parsed,
                    CodegenConfig::default().with_minify(true),
                    None,
                    None,
                )?;
                file.contents = code.into_bytes();
                file.source_map = None;
                Ok(file)
            })
            .collect()
    }
}
