//! Line-oriented shader source scanner
//!
//! Recognizes three kinds of lines and ignores everything else:
//!
//! - `uniform <type> <name>;`
//! - `struct <Name> { ... };`
//! - `layout (std140) uniform <Name> { ... };`
//!
//! Struct and block bodies hold one or more `<type> <name>;` members per
//! line. The opening brace may share the header line, and a short body may
//! sit entirely on it.

use std::str::Lines;

use log::{debug, info};

use crate::declaration::{is_identifier, parse_declaration, ParseContext, Uniform};
use crate::error::{BodyKind, GlueError, Result};
use crate::layout::{compute_layout, BlockLayout};
use crate::registry::{Registration, StructDef, StructRegistry};

/// Longest accepted source line, in bytes
pub const MAX_LINE_LEN: usize = 1024;

/// Everything one target's sources declare
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    /// Top-level uniforms in declaration order
    pub uniforms: Vec<Uniform>,
    /// std140 blocks in declaration order
    pub blocks: Vec<BlockLayout>,
}

impl ShaderInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty() && self.blocks.is_empty()
    }

    fn add_uniform(&mut self, uniform: Uniform, ctx: &ParseContext) -> Result<()> {
        match self.uniforms.iter().find(|u| u.name == uniform.name) {
            // Vertex and fragment stages commonly share uniforms.
            Some(existing) if *existing == uniform => {
                debug!("{}:{}: uniform '{}' already declared", ctx.current_file, ctx.current_line, uniform.name);
                Ok(())
            }
            Some(_) => Err(GlueError::ConflictingDeclaration {
                kind: "uniform",
                name: uniform.name,
                file: ctx.current_file.clone(),
                line: ctx.current_line,
            }),
            None => {
                self.uniforms.push(uniform);
                Ok(())
            }
        }
    }

    fn add_block(&mut self, block: BlockLayout, ctx: &ParseContext) -> Result<()> {
        match self.blocks.iter().find(|b| b.name == block.name) {
            Some(existing) if *existing == block => Ok(()),
            Some(_) => Err(GlueError::ConflictingDeclaration {
                kind: "uniform block",
                name: block.name,
                file: ctx.current_file.clone(),
                line: ctx.current_line,
            }),
            None => {
                self.blocks.push(block);
                Ok(())
            }
        }
    }
}

/// State of one generation run
///
/// The struct registry lives here rather than in a global so independent
/// runs never see each other's definitions. It is shared by every target of
/// the run; uniforms and blocks are collected per target.
#[derive(Debug, Default)]
pub struct ScanSession {
    registry: StructRegistry,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &StructRegistry {
        &self.registry
    }

    /// Scan one source, adding its declarations to `interface`
    pub fn scan_source(&mut self, file: &str, text: &str, interface: &mut ShaderInterface) -> Result<()> {
        let base = ParseContext::new(file);
        let mut lines = NumberedLines::new(text);
        let (uniforms_before, blocks_before) = (interface.uniforms.len(), interface.blocks.len());

        while let Some((number, raw)) = lines.next_line(&base)? {
            let ctx = base.at(number);
            let line = strip_comment(raw).trim();

            if let Some(rest) = strip_keyword(line, "uniform") {
                let uniform = parse_declaration(rest, &self.registry, &ctx)?;
                debug!("{}:{}: uniform {} {}", file, number, uniform.ty, uniform.name);
                interface.add_uniform(uniform, &ctx)?;
            } else if let Some(rest) = strip_keyword(line, "struct") {
                let (name, remainder) = split_header(rest, &ctx)?;
                let members =
                    self.scan_body(BodyKind::Struct, name, remainder, &mut lines, &ctx)?;
                let def = StructDef::new(name, members);
                match self.registry.define(def, &ctx)? {
                    Registration::Added => debug!("{}:{}: struct {}", file, number, name),
                    Registration::AlreadyKnown => {
                        debug!("{}:{}: struct {} already known", file, number, name)
                    }
                }
            } else if let Some(rest) = strip_block_header(line) {
                let (name, remainder) = split_header(rest, &ctx)?;
                let members = self.scan_body(BodyKind::Block, name, remainder, &mut lines, &ctx)?;
                let block = compute_layout(name, members)?;
                debug!(
                    "{}:{}: block {} ({} bytes, {} padding)",
                    file,
                    number,
                    name,
                    block.total_size,
                    block.padding_bytes()
                );
                interface.add_block(block, &ctx)?;
            }
        }

        info!(
            "Scanned {}: {} uniform(s), {} block(s)",
            file,
            interface.uniforms.len() - uniforms_before,
            interface.blocks.len() - blocks_before
        );
        Ok(())
    }

    /// Collect the members of a struct or block body up to its `};`
    ///
    /// `remainder` is whatever followed the name on the header line.
    fn scan_body(
        &self,
        kind: BodyKind,
        name: &str,
        remainder: &str,
        lines: &mut NumberedLines<'_>,
        header: &ParseContext,
    ) -> Result<Vec<Uniform>> {
        let unterminated = || GlueError::UnterminatedBody {
            kind,
            name: name.to_string(),
            file: header.current_file.clone(),
            line: header.current_line,
        };

        let mut members = Vec::new();
        let mut opened = false;
        let mut segment = remainder.to_string();
        let mut ctx = header.clone();

        loop {
            let mut text = segment.trim();

            if !opened && !text.is_empty() {
                let Some(body) = text.strip_prefix('{') else {
                    return Err(ctx.malformed(text, "expected '{' after the type name"));
                };
                text = body.trim_start();
                opened = true;
            }

            if let Some(close) = text.find('}') {
                self.parse_members(&text[..close], &ctx, &mut members)?;
                let tail = text[close + 1..].trim();
                if closes_body(tail) {
                    return Ok(members);
                }
                if tail.contains(';') {
                    return Err(ctx.malformed(tail, "unexpected text after '};'"));
                }
                return Err(unterminated());
            }
            self.parse_members(text, &ctx, &mut members)?;

            let Some((number, raw)) = lines.next_line(header)? else {
                return Err(unterminated());
            };
            ctx = header.at(number);
            segment = strip_comment(raw).to_string();
        }
    }

    /// Parse every `;`-terminated declaration in `text`
    fn parse_members(&self, text: &str, ctx: &ParseContext, members: &mut Vec<Uniform>) -> Result<()> {
        let mut rest = text.trim();
        while let Some(semi) = rest.find(';') {
            let decl = &rest[..=semi];
            if decl.len() > 1 {
                members.push(parse_declaration(decl, &self.registry, ctx)?);
            }
            rest = rest[semi + 1..].trim_start();
        }
        if !rest.is_empty() {
            // Fails with a missing-terminator error.
            members.push(parse_declaration(rest, &self.registry, ctx)?);
        }
        Ok(())
    }
}

/// Source lines numbered from 1, with the length limit enforced
struct NumberedLines<'a> {
    lines: Lines<'a>,
    number: u32,
}

impl<'a> NumberedLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            number: 0,
        }
    }

    fn next_line(&mut self, base: &ParseContext) -> Result<Option<(u32, &'a str)>> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        self.number += 1;
        if line.len() > MAX_LINE_LEN {
            return Err(GlueError::LineTooLong {
                file: base.current_file.clone(),
                line: self.number,
                length: line.len(),
                limit: MAX_LINE_LEN,
            });
        }
        Ok(Some((self.number, line)))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(start) => &line[..start],
        None => line,
    }
}

/// `line` without `keyword` and the whitespace after it
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.starts_with(|c: char| c.is_whitespace())
        .then(|| rest.trim_start())
}

/// Match `layout (std140) uniform` and return what follows
///
/// Extra qualifiers such as `binding = 0` are allowed next to `std140`.
fn strip_block_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("layout")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let (qualifiers, rest) = rest.split_once(')')?;
    if !qualifiers.split(',').any(|q| q.trim() == "std140") {
        return None;
    }
    strip_keyword(rest.trim_start(), "uniform")
}

/// Split `Name { ...` into the name and whatever follows it
fn split_header<'a>(rest: &'a str, ctx: &ParseContext) -> Result<(&'a str, &'a str)> {
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(rest.len());
    let (name, remainder) = rest.split_at(end);
    if !is_identifier(name) {
        return Err(ctx.malformed(rest, "expected a type name"));
    }
    Ok((name, remainder))
}

/// True for the text after `}` that ends a body: `;` or `instance;`
fn closes_body(tail: &str) -> bool {
    match tail.strip_suffix(';') {
        Some(instance) => {
            let instance = instance.trim();
            instance.is_empty() || is_identifier(instance)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::types::{Primitive, TypeName};

    fn scan(text: &str) -> Result<(ScanSession, ShaderInterface)> {
        let mut session = ScanSession::new();
        let mut interface = ShaderInterface::new();
        session.scan_source("test.glsl", text, &mut interface)?;
        Ok((session, interface))
    }

    #[test]
    fn test_plain_uniforms() {
        let (_, interface) = scan(
            "#version 330 core\n\
             uniform vec3 foo;\n\
             uniform float bar; // brightness\n\
             in vec2 uv;\n\
             uniform mat4 baz;\n",
        )
        .unwrap();
        let names: Vec<_> = interface.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["foo", "bar", "baz"]);
        assert_eq!(interface.uniforms[1].ty, TypeName::Primitive(Primitive::Float32));
    }

    #[test]
    fn test_single_line_struct_then_uniform() {
        let (session, interface) =
            scan("struct Light { vec3 pos; float intensity; };\nuniform Light light;\n").unwrap();
        let light = &interface.uniforms[0];
        assert_eq!(light.ty, TypeName::Struct("Light".to_string()));

        let leaves = flatten(light, session.registry()).unwrap();
        let ids: Vec<_> = leaves.iter().map(|u| (u.name.as_str(), u.cache_id.as_str())).collect();
        assert_eq!(
            ids,
            [("light.pos", "light_pos_location"), ("light.intensity", "light_intensity_location")]
        );
    }

    #[test]
    fn test_multi_line_struct() {
        let (session, _) = scan(
            "struct Material\n\
             {\n\
                 vec4 albedo;   // base colour\n\
             \n\
                 float roughness;\n\
             };\n",
        )
        .unwrap();
        let def = session.registry().get("Material").unwrap();
        assert_eq!(def.members.len(), 2);
        assert_eq!(def.members[1].name, "roughness");
    }

    #[test]
    fn test_std140_block() {
        let (_, interface) = scan(
            "layout (std140) uniform Stuff {\n\
                 float fuu;\n\
                 vec4 fee;\n\
                 vec3 bag;\n\
                 mat4 too;\n\
             };\n",
        )
        .unwrap();
        let block = &interface.blocks[0];
        assert_eq!(block.name, "Stuff");
        assert_eq!(block.offsets, [0, 16, 32, 48]);
        assert_eq!(block.total_size, 112);
    }

    #[test]
    fn test_block_header_variants() {
        assert_eq!(strip_block_header("layout(std140) uniform Foo {"), Some("Foo {"));
        assert_eq!(strip_block_header("layout (std140, binding = 2) uniform Foo"), Some("Foo"));
        assert_eq!(strip_block_header("layout(location = 0) in vec3 pos;"), None);
        assert_eq!(strip_block_header("layout(std430) buffer Data {"), None);
    }

    #[test]
    fn test_block_with_instance_name() {
        let (_, interface) = scan("layout(std140) uniform Camera {\n    mat4 view;\n} camera;\n").unwrap();
        assert_eq!(interface.blocks[0].members[0].name, "view");
    }

    #[test]
    fn test_struct_inside_block_is_rejected() {
        let err = scan(
            "struct Light { vec3 pos; };\n\
             layout (std140) uniform Lights {\n\
                 Light key;\n\
             };\n",
        )
        .unwrap_err();
        assert!(matches!(err, GlueError::NonPrimitiveBlockMember { .. }));
    }

    #[test]
    fn test_unknown_type_aborts() {
        let err = scan("uniform vec3 ok;\nuniform Bloop foo;\n").unwrap_err();
        assert!(matches!(err, GlueError::UnrecognizedType { line: 2, ref token, .. } if token == "Bloop"));
    }

    #[test]
    fn test_use_before_definition_is_unrecognized() {
        let err = scan("uniform Light light;\nstruct Light { vec3 pos; };\n").unwrap_err();
        assert!(matches!(err, GlueError::UnrecognizedType { line: 1, .. }));
    }

    #[test]
    fn test_struct_missing_semicolon_is_unterminated() {
        let err = scan("struct Foo { vec3 a; }\n").unwrap_err();
        assert!(matches!(
            err,
            GlueError::UnterminatedBody { kind: BodyKind::Struct, ref name, line: 1, .. } if name == "Foo"
        ));
    }

    #[test]
    fn test_text_after_closed_body_is_malformed() {
        let err = scan("layout (std140) uniform B { float a; }; uniform float x;\n").unwrap_err();
        assert!(matches!(
            err,
            GlueError::MalformedDeclaration { line: 1, ref reason, .. } if reason.contains("after '};'")
        ));

        let err = scan("struct Foo {\n    vec3 a;\n} foo bar;\n").unwrap_err();
        assert!(matches!(err, GlueError::MalformedDeclaration { line: 3, .. }));
    }

    #[test]
    fn test_struct_at_eof_is_unterminated() {
        let err = scan("uniform float t;\nstruct Foo {\n    vec3 a;\n").unwrap_err();
        assert!(matches!(err, GlueError::UnterminatedBody { line: 2, .. }));
    }

    #[test]
    fn test_block_at_eof_is_unterminated() {
        let err = scan("layout (std140) uniform B {\n    vec3 a;\n").unwrap_err();
        assert!(matches!(err, GlueError::UnterminatedBody { kind: BodyKind::Block, .. }));
    }

    #[test]
    fn test_malformed_member_reports_its_line() {
        let err = scan("struct Foo {\n    vec3 a;\n    vec3 b\n};\n").unwrap_err();
        assert!(matches!(err, GlueError::MalformedDeclaration { line: 3, .. }));
    }

    #[test]
    fn test_malformed_uniform() {
        let err = scan("uniform vec3foo;\n").unwrap_err();
        assert!(matches!(err, GlueError::MalformedDeclaration { line: 1, .. }));
    }

    #[test]
    fn test_long_line_is_rejected() {
        let text = format!("// {}\n", "x".repeat(MAX_LINE_LEN));
        let err = scan(&text).unwrap_err();
        assert!(matches!(err, GlueError::LineTooLong { line: 1, limit: MAX_LINE_LEN, .. }));
    }

    #[test]
    fn test_shared_uniforms_across_stages() {
        let mut session = ScanSession::new();
        let mut interface = ShaderInterface::new();
        session
            .scan_source("a.vert", "uniform mat4 mvp;\nuniform vec3 tint;\n", &mut interface)
            .unwrap();
        session
            .scan_source("a.frag", "uniform vec3 tint;\nuniform float time;\n", &mut interface)
            .unwrap();
        let names: Vec<_> = interface.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["mvp", "tint", "time"]);

        let err = session
            .scan_source("b.frag", "uniform vec4 tint;\n", &mut interface)
            .unwrap_err();
        assert!(matches!(err, GlueError::ConflictingDeclaration { kind: "uniform", .. }));
    }

    #[test]
    fn test_shared_blocks_across_stages() {
        let mut session = ScanSession::new();
        let mut interface = ShaderInterface::new();
        let camera = "layout (std140) uniform Camera {\n    mat4 view;\n    vec3 eye;\n};\n";
        session.scan_source("a.vert", camera, &mut interface).unwrap();
        session.scan_source("a.frag", camera, &mut interface).unwrap();
        assert_eq!(interface.blocks.len(), 1);

        let err = session
            .scan_source(
                "b.frag",
                "layout (std140) uniform Camera {\n    vec3 eye;\n    mat4 view;\n};\n",
                &mut interface,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            GlueError::ConflictingDeclaration { kind: "uniform block", ref name, line: 1, .. } if name == "Camera"
        ));
    }

    #[test]
    fn test_registry_is_shared_across_interfaces() {
        let mut session = ScanSession::new();
        let mut first = ShaderInterface::new();
        session
            .scan_source("common.glsl", "struct Light { vec3 pos; };\n", &mut first)
            .unwrap();
        assert!(first.is_empty());

        let mut second = ShaderInterface::new();
        session
            .scan_source("lit.frag", "uniform Light sun;\n", &mut second)
            .unwrap();
        assert_eq!(second.uniforms.len(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut first = ScanSession::new();
        first
            .scan_source("a.glsl", "struct Light { vec3 pos; };\n", &mut ShaderInterface::new())
            .unwrap();
        assert!(first.registry().contains("Light"));
        assert!(!ScanSession::new().registry().contains("Light"));
    }
}
