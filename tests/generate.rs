use std::fs;
use std::path::PathBuf;

use shader_glue::{Generator, GeneratorConfig, GlueError, Target};

/// Fresh scratch directory under the system temp dir
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shader_glue_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const VERTEX: &str = "\
#version 330 core
// camera
uniform mat4 mvp;
uniform vec3 foo;

layout (std140) uniform Stuff {
    float fee;
    vec4 fi;
    vec3 fo;
    mat4 bag;
};

void main() {}
";

const FRAGMENT: &str = "\
#version 330 core
struct Light {
    vec3 pos;
    float intensity;
};

uniform vec3 foo;
uniform Light light;

void main() {}
";

#[test]
fn test_full_run_writes_accessor() {
    let dir = scratch("full_run");
    fs::write(dir.join("example.vert"), VERTEX).unwrap();
    fs::write(dir.join("example.frag"), FRAGMENT).unwrap();
    let output = dir.join("example.rs");

    let target = Target::new(&output)
        .with_input(dir.join("example.vert"))
        .with_input(dir.join("example.frag"));
    let written = Generator::new().run(&[target]).unwrap();
    assert_eq!(written, vec![output.clone()]);

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("// Warning: This file has been autogenerated by shader_glue!"));
    assert!(text.contains("pub struct ExampleShader {"));
    assert!(text.contains("pub struct Light {"));
    assert!(text.contains("#[repr(C)]"));
    assert!(text.contains("pub struct Stuff {"));
    assert!(text.contains("pub struct StuffBlock {"));
    assert!(text.contains("pub const FI_OFFSET: u32 = 16;"));
    assert!(text.contains("pub const BAG_OFFSET: u32 = 48;"));
    assert!(text.contains("_padding_0: [u8; 12],"));
    assert!(text.contains("_padding_1: [u8; 4],"));
    assert!(text.contains("pub const SIZE: u32 = 112;"));
    assert!(text.contains("pub light_pos_location: gl::types::GLint,"));
    assert!(text.contains("pub light_intensity_location: gl::types::GLint,"));
    assert!(text.contains("pub fn uniforms(&self, mvp: [[f32; 4]; 4], foo: [f32; 3], light: &Light) {"));

    // foo is declared by both stages but only generated once
    assert_eq!(text.matches("pub foo_location:").count(), 1);
    assert!(!dir.join("example.rs.tmp").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unrecognized_type_writes_nothing() {
    let dir = scratch("bloop");
    fs::write(dir.join("good.frag"), "uniform float alpha;\n").unwrap();
    fs::write(dir.join("bad.frag"), "uniform float alpha;\nuniform Bloop foo;\n").unwrap();

    let good = Target::new(dir.join("good.rs")).with_input(dir.join("good.frag"));
    let bad = Target::new(dir.join("bad.rs")).with_input(dir.join("bad.frag"));
    let err = Generator::new().run(&[good, bad]).unwrap_err();

    match err {
        GlueError::UnrecognizedType { line, token, .. } => {
            assert_eq!(line, 2);
            assert_eq!(token, "Bloop");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!dir.join("good.rs").exists());
    assert!(!dir.join("bad.rs").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unterminated_struct_is_reported() {
    let dir = scratch("unterminated");
    fs::write(dir.join("open.frag"), "struct Foo {\n    vec3 a;\n}\nuniform Foo f;\n").unwrap();

    let target = Target::new(dir.join("open.rs")).with_input(dir.join("open.frag"));
    let err = Generator::new().run(&[target]).unwrap_err();
    assert!(matches!(err, GlueError::UnterminatedBody { line: 1, .. }));
    assert!(err.is_source_error());
    assert!(!dir.join("open.rs").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_structs_are_shared_between_targets() {
    let dir = scratch("shared");
    fs::write(dir.join("common.glsl"), "struct Light {\n    vec3 pos;\n    float intensity;\n};\n").unwrap();
    fs::write(dir.join("lit.frag"), "uniform Light sun;\n").unwrap();

    let common = Target::new(dir.join("common.rs")).with_input(dir.join("common.glsl"));
    let lit = Target::new(dir.join("lit.rs")).with_input(dir.join("lit.frag"));
    let config = GeneratorConfig::new().with_tab_width(2);
    Generator::with_config(config).run(&[common, lit]).unwrap();

    let lit_text = fs::read_to_string(dir.join("lit.rs")).unwrap();
    assert!(lit_text.contains("pub struct LitShader {"));
    assert!(lit_text.contains("  pub sun_pos_location: gl::types::GLint,"));
    assert!(lit_text.contains("pub fn sun(&self, sun: &Light) {"));

    let common_text = fs::read_to_string(dir.join("common.rs")).unwrap();
    assert!(common_text.contains("pub struct CommonShader {"));

    fs::remove_dir_all(&dir).unwrap();
}
