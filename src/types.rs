//! Primitive type table
//!
//! Maps GLSL type tokens onto the primitive types the generator knows how to
//! mirror, together with their std140 size and base alignment and the text
//! used for them in generated code.

use std::fmt;

/// A primitive GLSL type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Float32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl Primitive {
    /// Every primitive, in table order
    pub const ALL: [Primitive; 5] = [
        Primitive::Float32,
        Primitive::Vec2,
        Primitive::Vec3,
        Primitive::Vec4,
        Primitive::Mat4,
    ];

    /// Look up a GLSL token. `float` is canonicalized to `Float32`.
    pub fn from_glsl(token: &str) -> Option<Self> {
        match token {
            "float" => Some(Primitive::Float32),
            "vec2" => Some(Primitive::Vec2),
            "vec3" => Some(Primitive::Vec3),
            "vec4" => Some(Primitive::Vec4),
            "mat4" => Some(Primitive::Mat4),
            _ => None,
        }
    }

    /// The GLSL spelling of this type
    pub fn glsl_name(self) -> &'static str {
        match self {
            Primitive::Float32 => "float",
            Primitive::Vec2 => "vec2",
            Primitive::Vec3 => "vec3",
            Primitive::Vec4 => "vec4",
            Primitive::Mat4 => "mat4",
        }
    }

    /// Size in bytes under std140
    pub fn size(self) -> u32 {
        match self {
            Primitive::Float32 => 4,
            Primitive::Vec2 => 8,
            Primitive::Vec3 => 12,
            Primitive::Vec4 => 16,
            Primitive::Mat4 => 64,
        }
    }

    /// Base alignment in bytes under std140
    ///
    /// Three- and four-component vectors occupy a full 16-byte slot, and a
    /// matrix is aligned like its column vectors.
    pub fn base_alignment(self) -> u32 {
        match self {
            Primitive::Float32 => 4,
            Primitive::Vec2 => 8,
            Primitive::Vec3 | Primitive::Vec4 | Primitive::Mat4 => 16,
        }
    }

    /// Rust type used for this primitive in generated mirrors
    pub fn rust_type(self) -> &'static str {
        match self {
            Primitive::Float32 => "f32",
            Primitive::Vec2 => "[f32; 2]",
            Primitive::Vec3 => "[f32; 3]",
            Primitive::Vec4 => "[f32; 4]",
            Primitive::Mat4 => "[[f32; 4]; 4]",
        }
    }

    /// The `gl` call that uploads a value of this type to `location`
    ///
    /// `value` is an expression of [`Primitive::rust_type`].
    pub fn setter_call(self, location: &str, value: &str) -> String {
        match self {
            Primitive::Float32 => format!("gl::Uniform1f({}, {})", location, value),
            Primitive::Vec2 => format!("gl::Uniform2fv({}, 1, {}.as_ptr())", location, value),
            Primitive::Vec3 => format!("gl::Uniform3fv({}, 1, {}.as_ptr())", location, value),
            Primitive::Vec4 => format!("gl::Uniform4fv({}, 1, {}.as_ptr())", location, value),
            Primitive::Mat4 => format!(
                "gl::UniformMatrix4fv({}, 1, gl::FALSE, {}.as_ptr().cast())",
                location, value
            ),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

/// The resolved type of a uniform or struct member
///
/// Struct types are referenced by name; the name has been checked against
/// the struct registry when the declaration was parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Primitive(Primitive),
    Struct(String),
}

impl TypeName {
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            TypeName::Primitive(p) => Some(*p),
            TypeName::Struct(_) => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeName::Primitive(_))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Primitive(p) => p.fmt(f),
            TypeName::Struct(name) => f.write_str(name),
        }
    }
}
