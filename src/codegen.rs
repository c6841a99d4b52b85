//! Rust glue generation
//!
//! Produces, for one target:
//! - a mirror struct for every user struct its uniforms reference,
//! - a `#[repr(C)]` mirror plus a buffer handle for every std140 block,
//! - a `<Name>Shader` program accessor with cached uniform locations.
//!
//! The text targets the `gl` crate's bindings and is meant to be pulled in
//! with `include!`.

use hashbrown::HashSet;
use log::debug;

use crate::config::GeneratorConfig;
use crate::declaration::Uniform;
use crate::error::{GlueError, Result};
use crate::flatten::flatten_all;
use crate::layout::BlockLayout;
use crate::registry::{StructDef, StructRegistry};
use crate::scanner::ShaderInterface;
use crate::types::TypeName;
use crate::writer::Writer;

pub const GENERATED_HEADER: &str = "// Warning: This file has been autogenerated by shader_glue!";

const GLUINT: &str = "gl::types::GLuint";
const GLINT: &str = "gl::types::GLint";

/// Methods every program accessor defines besides its uniform setters
const RESERVED_PROGRAM_METHODS: [&str; 4] = ["new", "use_program", "set_locations", "uniforms"];

/// Methods every block handle defines besides its member setters
const RESERVED_BLOCK_METHODS: [&str; 4] = ["create", "bind", "bind_base", "data"];

/// Rust keywords that are valid GLSL names; emitted as raw identifiers
const RUST_KEYWORDS: [&str; 48] = [
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Names that cannot be written even as raw identifiers
const UNESCAPABLE: [&str; 5] = ["self", "Self", "super", "crate", "_"];

/// Code generator for one target
pub struct CodeGenerator<'a> {
    registry: &'a StructRegistry,
    config: &'a GeneratorConfig,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(registry: &'a StructRegistry, config: &'a GeneratorConfig) -> Self {
        Self { registry, config }
    }

    /// Generate the full text for `interface`, naming the accessor `<type_name>Shader`
    pub fn generate(&self, type_name: &str, interface: &ShaderInterface) -> Result<String> {
        let structs = self.referenced_structs(&interface.uniforms)?;
        check_identifiers(&structs, interface)?;
        check_item_names(type_name, &structs, &interface.blocks)?;
        for block in &interface.blocks {
            check_block_names(block)?;
        }

        let mut w = Writer::new(self.config.tab_width);
        w.line(GENERATED_HEADER);

        for def in structs {
            w.blank();
            self.write_struct_mirror(&mut w, def);
        }

        for block in &interface.blocks {
            w.blank();
            self.write_block_mirror(&mut w, block)?;
            w.blank();
            self.write_block_handle(&mut w, block)?;
        }

        w.blank();
        self.write_program(&mut w, type_name, &interface.uniforms)?;

        debug!(
            "Generated {}Shader: {} uniform(s), {} block(s)",
            type_name,
            interface.uniforms.len(),
            interface.blocks.len()
        );
        Ok(w.finish())
    }

    /// Structs reachable from `uniforms`, each after the structs it contains
    fn referenced_structs(&self, uniforms: &[Uniform]) -> Result<Vec<&'a StructDef>> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        let mut path = Vec::new();
        for uniform in uniforms {
            self.collect_struct(&uniform.ty, &uniform.name, &mut ordered, &mut seen, &mut path)?;
        }
        Ok(ordered)
    }

    fn collect_struct(
        &self,
        ty: &TypeName,
        uniform: &str,
        ordered: &mut Vec<&'a StructDef>,
        seen: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        let TypeName::Struct(name) = ty else {
            return Ok(());
        };
        let registry = self.registry;
        let def = registry.get(name).ok_or_else(|| GlueError::UnknownStruct {
            uniform: uniform.to_string(),
            name: name.clone(),
        })?;

        if path.contains(&def.name.as_str()) {
            return Err(GlueError::CyclicStruct {
                name: def.name.clone(),
                path: path.join("."),
            });
        }
        if seen.contains(def.name.as_str()) {
            return Ok(());
        }

        path.push(&def.name);
        for member in &def.members {
            self.collect_struct(&member.ty, uniform, ordered, seen, path)?;
        }
        path.pop();

        seen.insert(&def.name);
        ordered.push(def);
        Ok(())
    }

    fn write_struct_mirror(&self, w: &mut Writer, def: &StructDef) {
        w.line("#[derive(Debug, Clone, Copy, Default, PartialEq)]");
        w.open(format!("pub struct {}", ident(&def.name)));
        for member in &def.members {
            w.line(format!("pub {}: {},", ident(&member.name), type_text(&member.ty)));
        }
        w.close();
    }

    fn write_block_mirror(&self, w: &mut Writer, block: &BlockLayout) -> Result<()> {
        let name = ident(&block.name);
        let placed = block.placed()?;

        w.line("#[repr(C)]");
        w.line("#[allow(dead_code)]");
        w.line("#[derive(Debug, Clone, Copy, Default, PartialEq)]");
        w.open(format!("pub struct {}", name));
        let mut padding = 0;
        for member in &placed {
            if member.pad_before > 0 {
                w.line(format!("_padding_{}: [u8; {}],", padding, member.pad_before));
                padding += 1;
            }
            w.line(format!("pub {}: {},", ident(&member.uniform.name), member.primitive.rust_type()));
        }
        w.close();

        w.blank();
        w.open(format!("impl {}", name));
        for member in &placed {
            w.line(format!("pub const {}: u32 = {};", offset_const(member.uniform), member.offset));
        }
        w.line(format!("pub const SIZE: u32 = {};", block.total_size));
        w.close();

        if self.config.emit_layout_assertions {
            w.blank();
            for member in &placed {
                w.line(format!(
                    "const _: () = assert!(std::mem::offset_of!({name}, {}) == {name}::{} as usize);",
                    ident(&member.uniform.name),
                    offset_const(member.uniform),
                ));
            }
            w.line(format!(
                "const _: () = assert!(std::mem::size_of::<{name}>() == {name}::SIZE as usize);"
            ));
        }
        Ok(())
    }

    fn write_block_handle(&self, w: &mut Writer, block: &BlockLayout) -> Result<()> {
        let name = ident(&block.name);
        let handle = format!("{}Block", block.name);

        w.line("#[derive(Debug, Default)]");
        w.open(format!("pub struct {}", handle));
        w.line(format!("pub id: {},", GLUINT));
        w.line(format!("pub binding_point: {},", GLUINT));
        w.close();

        w.blank();
        w.open(format!("impl {}", handle));

        w.open("pub fn create(&mut self)");
        w.open("unsafe");
        w.line("gl::GenBuffers(1, &mut self.id);");
        w.line("gl::BindBuffer(gl::UNIFORM_BUFFER, self.id);");
        w.line(format!(
            "gl::BufferData(gl::UNIFORM_BUFFER, {}::SIZE as gl::types::GLsizeiptr, std::ptr::null(), gl::DYNAMIC_DRAW);",
            name
        ));
        w.close();
        w.close();

        w.blank();
        w.open("pub fn bind(&self)");
        w.line("unsafe { gl::BindBuffer(gl::UNIFORM_BUFFER, self.id) };");
        w.close();

        w.blank();
        w.open(format!("pub fn bind_base(&mut self, binding_point: {})", GLUINT));
        w.line("self.binding_point = binding_point;");
        w.line("unsafe { gl::BindBufferBase(gl::UNIFORM_BUFFER, binding_point, self.id) };");
        w.close();

        w.blank();
        w.open(format!("pub fn data(&self, data: &{})", name));
        w.open("unsafe");
        w.line(format!(
            "gl::BufferData(gl::UNIFORM_BUFFER, {name}::SIZE as gl::types::GLsizeiptr, (data as *const {name}).cast(), gl::DYNAMIC_DRAW);"
        ));
        w.close();
        w.close();

        for member in block.placed()? {
            let ty = member.primitive.rust_type();
            let field = ident(&member.uniform.name);
            w.blank();
            w.open(format!("pub fn {field}(&self, {field}: &{ty})"));
            w.open("unsafe");
            w.line("gl::BufferSubData(");
            w.indent();
            w.line("gl::UNIFORM_BUFFER,");
            w.line(format!("{}::{} as gl::types::GLintptr,", name, offset_const(member.uniform)));
            w.line(format!("std::mem::size_of::<{ty}>() as gl::types::GLsizeiptr,"));
            w.line(format!("({field} as *const {ty}).cast(),"));
            w.unindent();
            w.line(");");
            w.close();
            w.close();
        }

        w.close();
        Ok(())
    }

    fn write_program(&self, w: &mut Writer, type_name: &str, uniforms: &[Uniform]) -> Result<()> {
        let shader = format!("{}Shader", type_name);
        self.check_program_names(uniforms)?;

        // Location fields.
        w.line("#[derive(Debug, Default)]");
        w.open(format!("pub struct {}", shader));
        w.line(format!("pub id: {},", GLUINT));
        for leaf in flatten_all(uniforms, self.registry)? {
            w.line(format!("pub {}: {},", leaf.cache_id, GLINT));
        }
        w.close();

        w.blank();
        w.open(format!("impl {}", shader));

        w.open(format!("pub fn new(id: {}) -> Self", GLUINT));
        w.line("let mut shader = Self { id, ..Default::default() };");
        w.line("shader.set_locations();");
        w.line("shader");
        w.close();

        w.blank();
        w.open("pub fn use_program(&self)");
        w.line("unsafe { gl::UseProgram(self.id) };");
        w.close();

        // Location queries.
        w.blank();
        w.open("pub fn set_locations(&mut self)");
        let leaves = flatten_all(uniforms, self.registry)?;
        if !leaves.is_empty() {
            w.open("unsafe");
            for leaf in &leaves {
                w.line(format!(
                    "self.{} = gl::GetUniformLocation(self.id, c\"{}\".as_ptr());",
                    leaf.cache_id, leaf.name
                ));
            }
            w.close();
        }
        w.close();

        // Leaf setters.
        for leaf in flatten_all(uniforms, self.registry)? {
            let primitive = leaf.ty.as_primitive().ok_or_else(|| GlueError::NonPrimitiveLeaf {
                uniform: leaf.name.clone(),
                ty: leaf.ty.to_string(),
            })?;
            let param = ident(&leaf.accessor());
            let location = format!("self.{}", leaf.cache_id);
            w.blank();
            w.open(format!("pub fn {}(&self, {}: {})", param, param, primitive.rust_type()));
            w.line(format!("unsafe {{ {} }};", primitive.setter_call(&location, &param)));
            w.close();
        }

        // Struct setters dispatch to their leaves.
        for uniform in uniforms.iter().filter(|u| !u.ty.is_primitive()) {
            w.blank();
            w.open(format!(
                "pub fn {}(&self, {}: &{})",
                ident(&uniform.accessor()),
                ident(&uniform.name),
                type_text(&uniform.ty)
            ));
            for leaf in flatten_all(std::slice::from_ref(uniform), self.registry)? {
                w.line(format!("self.{}({});", ident(&leaf.accessor()), path_expr(&leaf.name)));
            }
            w.close();
        }

        // Bulk setter in top-level declaration order.
        let params: Vec<String> = std::iter::once("&self".to_string())
            .chain(uniforms.iter().map(|u| format!("{}: {}", ident(&u.name), parameter_type(&u.ty))))
            .collect();
        w.blank();
        w.open(format!("pub fn uniforms({})", params.join(", ")));
        for uniform in uniforms {
            w.line(format!("self.{}({});", ident(&uniform.accessor()), ident(&uniform.name)));
        }
        w.close();

        w.close();
        Ok(())
    }

    /// Reject uniforms whose generated methods or fields would collide
    fn check_program_names(&self, uniforms: &[Uniform]) -> Result<()> {
        let mut methods: HashSet<String> =
            RESERVED_PROGRAM_METHODS.iter().map(|s| s.to_string()).collect();
        let mut fields: HashSet<String> = HashSet::new();
        fields.insert("id".to_string());

        let collision = |name: String, item: &str| GlueError::NameCollision {
            name,
            item: item.to_string(),
        };

        for uniform in uniforms {
            if !uniform.ty.is_primitive() && !methods.insert(uniform.accessor()) {
                return Err(collision(uniform.accessor(), &uniform.name));
            }
            for leaf in flatten_all(std::slice::from_ref(uniform), self.registry)? {
                if !methods.insert(leaf.accessor()) {
                    return Err(collision(leaf.accessor(), &leaf.name));
                }
                if !fields.insert(leaf.cache_id.clone()) {
                    return Err(collision(leaf.cache_id, &leaf.name));
                }
            }
        }
        Ok(())
    }
}

/// Reject GLSL names that cannot become Rust identifiers at all
fn check_identifiers(structs: &[&StructDef], interface: &ShaderInterface) -> Result<()> {
    let reserved = |name: &str, item: String| -> Result<()> {
        if UNESCAPABLE.contains(&name) {
            return Err(GlueError::ReservedIdentifier {
                name: name.to_string(),
                item,
            });
        }
        Ok(())
    };

    for def in structs {
        reserved(def.name.as_str(), format!("struct {}", def.name))?;
        for member in &def.members {
            reserved(member.name.as_str(), format!("{}.{}", def.name, member.name))?;
        }
    }
    for uniform in &interface.uniforms {
        reserved(uniform.name.as_str(), format!("uniform {}", uniform.name))?;
    }
    for block in &interface.blocks {
        reserved(block.name.as_str(), format!("uniform block {}", block.name))?;
        for member in &block.members {
            reserved(member.name.as_str(), format!("{}.{}", block.name, member.name))?;
        }
    }
    Ok(())
}

/// Reject top-level items that would share a name in the generated module
fn check_item_names(type_name: &str, structs: &[&StructDef], blocks: &[BlockLayout]) -> Result<()> {
    let mut items: HashSet<String> = HashSet::new();
    items.insert(format!("{}Shader", type_name));

    for def in structs {
        if !items.insert(def.name.clone()) {
            return Err(GlueError::NameCollision {
                name: def.name.clone(),
                item: format!("struct {}", def.name),
            });
        }
    }
    for block in blocks {
        for item in [block.name.clone(), format!("{}Block", block.name)] {
            if !items.insert(item.clone()) {
                return Err(GlueError::NameCollision {
                    name: item,
                    item: format!("uniform block {}", block.name),
                });
            }
        }
    }
    Ok(())
}

/// Reject block members whose field, offset constant or setter would collide
fn check_block_names(block: &BlockLayout) -> Result<()> {
    let mut fields: HashSet<&str> = HashSet::new();
    let mut consts: HashSet<String> = HashSet::new();
    consts.insert("SIZE".to_string());

    for member in &block.members {
        let collision = |name: String| GlueError::NameCollision {
            name,
            item: format!("{}.{}", block.name, member.name),
        };
        if RESERVED_BLOCK_METHODS.contains(&member.name.as_str())
            || member.name.starts_with("_padding_")
            || !fields.insert(&member.name)
        {
            return Err(collision(member.name.clone()));
        }
        let offset = offset_const(member);
        if !consts.insert(offset.clone()) {
            return Err(collision(offset));
        }
    }
    Ok(())
}

/// `FOO_OFFSET` for member `foo`
fn offset_const(member: &Uniform) -> String {
    format!("{}_OFFSET", member.name.to_ascii_uppercase())
}

/// `name` as a Rust identifier, raw if it is a keyword
fn ident(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Field access expression for a dotted uniform path
fn path_expr(path: &str) -> String {
    path.split('.').map(ident).collect::<Vec<_>>().join(".")
}

fn type_text(ty: &TypeName) -> String {
    match ty {
        TypeName::Primitive(p) => p.rust_type().to_string(),
        TypeName::Struct(name) => ident(name),
    }
}

/// Primitives are passed by value, structs by reference
fn parameter_type(ty: &TypeName) -> String {
    match ty {
        TypeName::Primitive(_) => type_text(ty),
        TypeName::Struct(_) => format!("&{}", type_text(ty)),
    }
}
