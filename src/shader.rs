// shader.rs
use crate::error::{Error, Result};

// VERTEX STAGE (ViewProjection transform + color passthrough)
// Paired with a passthrough fragment stage so the module links on its own.
pub const VERTEX_STAGE_WGSL: &str = r#"
@group(0) @binding(0) var<uniform> ViewProjection: mat4x4<f32>;

struct VS_INPUT {
    @location(0) Position: vec3<f32>,
    @location(1) Color: vec3<f32>,
};

struct VS_OUTPUT {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) Color: vec3<f32>,
};

@vertex
fn vs_main(input: VS_INPUT) -> VS_OUTPUT {
    var out: VS_OUTPUT;
    out.clip_position = ViewProjection * vec4<f32>(input.Position, 1.0);
    out.Color = input.Color;
    return out;
}

@fragment
fn fs_main(input: VS_OUTPUT) -> @location(0) vec4<f32> {
    return vec4<f32>(input.Color, 1.0);
}
"#;

// Same interface for OpenGL 3.3 hosts
pub const VERTEX_STAGE_GLSL: &str = r#"#version 330 core

layout (location = 0) in vec3 Position;
layout (location = 1) in vec3 Color;

uniform mat4 ViewProjection;

out VS_OUTPUT {
    vec3 Color;
} OUT;

void main()
{
    gl_Position = ViewProjection * vec4(Position, 1.0);
    OUT.Color = Color;
}
"#;

pub const FRAGMENT_STAGE_GLSL: &str = r#"#version 330 core

in VS_OUTPUT {
    vec3 Color;
} IN;

out vec4 Color;

void main()
{
    Color = vec4(IN.Color, 1.0f);
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Core,
    Compatibility,
    Es,
}

/// The `#version` directive of a GLSL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceVersion {
    pub number: u32,
    pub profile: Profile,
}

impl SourceVersion {
    /// Reads the `#version` directive, which has to come before any other code.
    pub fn parse(source: &str) -> Result<Self> {
        let line = source
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with("//"))
            .ok_or_else(|| Error::ShaderVersion("empty source".into()))?;

        let rest = line
            .strip_prefix("#version")
            .ok_or_else(|| Error::ShaderVersion(format!("expected #version, found `{line}`")))?;

        let mut tokens = rest.split_whitespace();
        let number: u32 = tokens
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| Error::ShaderVersion(format!("missing version number in `{line}`")))?;

        let profile = match tokens.next() {
            // Desktop GLSL before 150 has no profiles; treat it as compatibility
            None if number >= 150 => Profile::Core,
            None if number == 100 => Profile::Es,
            None => Profile::Compatibility,
            Some("core") => Profile::Core,
            Some("compatibility") => Profile::Compatibility,
            Some("es") => Profile::Es,
            Some(other) => return Err(Error::ShaderVersion(format!("unknown profile `{other}`"))),
        };

        if let Some(extra) = tokens.next() {
            return Err(Error::ShaderVersion(format!("unexpected token `{extra}` after profile")));
        }

        Ok(Self { number, profile })
    }

    /// Lowest (major, minor) OpenGL or OpenGL ES context that accepts this source.
    pub fn min_gl_version(&self) -> Option<(u32, u32)> {
        match (self.profile, self.number) {
            (Profile::Es, 100) => Some((2, 0)),
            (Profile::Es, 300 | 310 | 320) => Some((3, (self.number - 300) / 10)),
            (Profile::Es, _) => None,
            (_, 110) => Some((2, 0)),
            (_, 120) => Some((2, 1)),
            (_, 130 | 140 | 150) => Some((3, (self.number - 130) / 10)),
            (_, 330) => Some((3, 3)),
            (_, 400 | 410 | 420 | 430 | 440 | 450 | 460) => Some((4, (self.number - 400) / 10)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_glsl_targets_gl_33_core() {
        for src in [VERTEX_STAGE_GLSL, FRAGMENT_STAGE_GLSL] {
            let version = SourceVersion::parse(src).unwrap();
            assert_eq!(version, SourceVersion { number: 330, profile: Profile::Core });
            assert_eq!(version.min_gl_version(), Some((3, 3)));
        }
    }

    #[test]
    fn skips_leading_comments() {
        let src = "\n// generated\n  #version 450\nvoid main() {}";
        let version = SourceVersion::parse(src).unwrap();
        assert_eq!(version.number, 450);
        assert_eq!(version.profile, Profile::Core);
        assert_eq!(version.min_gl_version(), Some((4, 5)));
    }

    #[test]
    fn es_versions() {
        let version = SourceVersion::parse("#version 300 es").unwrap();
        assert_eq!(version.profile, Profile::Es);
        assert_eq!(version.min_gl_version(), Some((3, 0)));
        assert_eq!(SourceVersion::parse("#version 100").unwrap().min_gl_version(), Some((2, 0)));
    }

    #[test]
    fn old_desktop_versions() {
        assert_eq!(SourceVersion::parse("#version 120").unwrap().min_gl_version(), Some((2, 1)));
        assert_eq!(SourceVersion::parse("#version 150").unwrap().min_gl_version(), Some((3, 2)));
    }

    #[test]
    fn rejects_missing_or_malformed_marker() {
        assert!(SourceVersion::parse("").is_err());
        assert!(SourceVersion::parse("void main() {}").is_err());
        assert!(SourceVersion::parse("#version").is_err());
        assert!(SourceVersion::parse("#version abc").is_err());
        assert!(SourceVersion::parse("#version 330 legacy").is_err());
        assert!(SourceVersion::parse("#version 330 core extra").is_err());
    }

    #[test]
    fn unknown_number_has_no_context() {
        let version = SourceVersion::parse("#version 335 core").unwrap();
        assert_eq!(version.min_gl_version(), None);
    }

    #[test]
    fn wgsl_declares_the_stage_interface() {
        assert!(VERTEX_STAGE_WGSL.contains("var<uniform> ViewProjection: mat4x4<f32>"));
        assert!(VERTEX_STAGE_WGSL.contains("struct VS_OUTPUT"));
    }

    // Declarations in order, ignoring whitespace and blank lines
    fn declarations(src: &str) -> Vec<String> {
        src.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect()
    }

    #[test]
    fn glsl_vertex_stage_declares_the_stage_interface() {
        let lines = declarations(VERTEX_STAGE_GLSL);
        let expected = [
            "layout (location = 0) in vec3 Position;",
            "layout (location = 1) in vec3 Color;",
            "uniform mat4 ViewProjection;",
            "out VS_OUTPUT {",
            "vec3 Color;",
            "} OUT;",
        ];
        let start = lines.iter().position(|l| l == expected[0]).unwrap();
        assert_eq!(&lines[start..start + expected.len()], &expected);
        assert!(lines.iter().any(|l| l == "gl_Position = ViewProjection * vec4(Position, 1.0);"));
        assert!(lines.iter().any(|l| l == "OUT.Color = Color;"));
    }

    #[test]
    fn glsl_fragment_stage_reads_the_vertex_block() {
        let lines = declarations(FRAGMENT_STAGE_GLSL);
        let start = lines.iter().position(|l| l == "in VS_OUTPUT {").unwrap();
        assert_eq!(&lines[start..start + 3], &["in VS_OUTPUT {", "vec3 Color;", "} IN;"]);
    }
}
