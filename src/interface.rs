// interface.rs
//! Reflection of the shader stage interface.
//!
//! wgpu binds attributes by location and uniforms by group/binding, so the
//! names the stage is written against (`Position`, `Color`, `ViewProjection`,
//! `VS_OUTPUT`) are recovered from the shader module itself with naga. This is
//! also where mismatches between the stage and the host layout, or between
//! the vertex and fragment stages, are turned into load-time errors.

use std::fmt;
use naga::{Binding, ScalarKind, ShaderStage, TypeInner, VectorSize};
use crate::{config, error::{Error, Result}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Other,
}

impl ValueType {
    fn from_inner(inner: &TypeInner) -> Self {
        let is_f32 = |kind: ScalarKind, width: u8| kind == ScalarKind::Float && width == 4;
        match *inner {
            TypeInner::Scalar(s) if is_f32(s.kind, s.width) => Self::F32,
            TypeInner::Vector { size, scalar } if is_f32(scalar.kind, scalar.width) => match size {
                VectorSize::Bi => Self::Vec2,
                VectorSize::Tri => Self::Vec3,
                VectorSize::Quad => Self::Vec4,
            },
            TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, scalar }
                if is_f32(scalar.kind, scalar.width) => Self::Mat4,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "f32",
            Self::Vec2 => "vec2<f32>",
            Self::Vec3 => "vec3<f32>",
            Self::Vec4 => "vec4<f32>",
            Self::Mat4 => "mat4x4<f32>",
            Self::Other => "<unsupported>",
        };
        f.write_str(name)
    }
}

/// A user-defined stage input or output bound to a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub name: String,
    pub location: u32,
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub ty: ValueType,
}

#[derive(Debug, Clone, Default)]
pub struct StageIo {
    pub entry_point: String,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub output_block: Option<String>,
    pub writes_position: bool,
}

impl StageIo {
    pub fn input(&self, location: u32) -> Option<&Varying> {
        self.inputs.iter().find(|v| v.location == location)
    }

    pub fn output(&self, location: u32) -> Option<&Varying> {
        self.outputs.iter().find(|v| v.location == location)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShaderInterface {
    pub vertex: Option<StageIo>,
    pub fragment: Option<StageIo>,
    pub uniforms: Vec<Uniform>,
}

impl ShaderInterface {
    /// Parses and validates a WGSL module, then collects the interface of its
    /// `vs_main` and `fs_main` entry points.
    pub fn reflect(source: &str) -> Result<Self> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| Error::ShaderCompile(e.emit_to_string(source)))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| Error::ShaderCompile(format!("validation error: {e}")))?;

        let uniforms = module
            .global_variables
            .iter()
            .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
            .filter_map(|(_, var)| {
                let binding = var.binding.as_ref()?;
                Some(Uniform {
                    name: var.name.clone().unwrap_or_default(),
                    group: binding.group,
                    binding: binding.binding,
                    ty: ValueType::from_inner(&module.types[var.ty].inner),
                })
            })
            .collect();

        let stage = |stage: ShaderStage, name: &str| {
            module
                .entry_points
                .iter()
                .find(|ep| ep.stage == stage && ep.name == name)
                .map(|ep| reflect_entry_point(&module, ep))
        };

        Ok(Self {
            vertex: stage(ShaderStage::Vertex, config::VERTEX_ENTRY),
            fragment: stage(ShaderStage::Fragment, config::FRAGMENT_ENTRY),
            uniforms,
        })
    }

    /// Name lookup of a uniform's (group, binding).
    pub fn uniform_binding(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    /// Checks the vertex stage against the layout the host binds:
    /// `Position`/`Color` at locations 0/1, a `ViewProjection` matrix and a
    /// `VS_OUTPUT` block carrying `Color`.
    pub fn check_vertex_stage(&self) -> Result<()> {
        let vs = self
            .vertex
            .as_ref()
            .ok_or_else(|| Error::Interface(format!("no vertex entry point `{}`", config::VERTEX_ENTRY)))?;

        expect_varying(vs.input(config::POSITION_LOCATION), "input", "Position", config::POSITION_LOCATION, ValueType::Vec3)?;
        expect_varying(vs.input(config::COLOR_LOCATION), "input", "Color", config::COLOR_LOCATION, ValueType::Vec3)?;

        match self.uniform_binding(config::VIEW_PROJECTION_UNIFORM) {
            Some(u) if u.ty == ValueType::Mat4 => {}
            Some(u) => {
                return Err(Error::Interface(format!(
                    "uniform `{}` is {}, expected {}",
                    u.name, u.ty, ValueType::Mat4
                )));
            }
            None => {
                return Err(Error::Interface(format!(
                    "uniform `{}` not declared",
                    config::VIEW_PROJECTION_UNIFORM
                )));
            }
        }

        if vs.output_block.as_deref() != Some(config::OUTPUT_BLOCK) {
            return Err(Error::Interface(format!(
                "vertex output block is {:?}, expected `{}`",
                vs.output_block,
                config::OUTPUT_BLOCK
            )));
        }
        if !vs.writes_position {
            return Err(Error::Interface("vertex stage does not write the clip position".into()));
        }
        let color = vs.outputs.iter().find(|v| v.name == "Color");
        match color {
            Some(v) if v.ty == ValueType::Vec3 => Ok(()),
            Some(v) => Err(Error::Interface(format!("output `Color` is {}, expected {}", v.ty, ValueType::Vec3))),
            None => Err(Error::Interface(format!("`{}` has no `Color` field", config::OUTPUT_BLOCK))),
        }
    }
}

fn expect_varying(found: Option<&Varying>, kind: &str, name: &str, location: u32, ty: ValueType) -> Result<()> {
    match found {
        Some(v) if v.name == name && v.ty == ty => Ok(()),
        Some(v) => Err(Error::Interface(format!(
            "{kind} at location {location} is `{}: {}`, expected `{name}: {ty}`",
            v.name, v.ty
        ))),
        None => Err(Error::Interface(format!("no {kind} at location {location}, expected `{name}: {ty}`"))),
    }
}

/// Matches fragment inputs against vertex outputs by location and type.
pub fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<()> {
    let vs = vertex
        .vertex
        .as_ref()
        .ok_or_else(|| Error::Link(format!("no vertex entry point `{}`", config::VERTEX_ENTRY)))?;
    let fs = fragment
        .fragment
        .as_ref()
        .ok_or_else(|| Error::Link(format!("no fragment entry point `{}`", config::FRAGMENT_ENTRY)))?;

    for input in &fs.inputs {
        match vs.output(input.location) {
            Some(out) if out.ty == input.ty => {}
            Some(out) => {
                return Err(Error::Link(format!(
                    "location {}: vertex writes `{}: {}`, fragment reads `{}: {}`",
                    input.location, out.name, out.ty, input.name, input.ty
                )));
            }
            None => {
                return Err(Error::Link(format!(
                    "fragment input `{}` at location {} is not written by the vertex stage",
                    input.name, input.location
                )));
            }
        }
    }

    log::debug!(
        "linked {} -> {} ({} varyings)",
        vs.entry_point,
        fs.entry_point,
        fs.inputs.len()
    );
    Ok(())
}

fn reflect_entry_point(module: &naga::Module, ep: &naga::EntryPoint) -> StageIo {
    let mut io = StageIo { entry_point: ep.name.clone(), ..Default::default() };

    for arg in &ep.function.arguments {
        collect(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut io.inputs, &mut false);
    }

    if let Some(result) = &ep.function.result {
        let ty = &module.types[result.ty];
        if matches!(ty.inner, TypeInner::Struct { .. }) {
            io.output_block = ty.name.clone();
        }
        collect(module, None, result.ty, result.binding.as_ref(), &mut io.outputs, &mut io.writes_position);
    }

    io
}

// Flattens one argument/result into location-bound varyings, descending into
// structs the way WGSL entry points declare their IO.
fn collect(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
    writes_position: &mut bool,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name.unwrap_or_default().to_string(),
            location: *location,
            ty: ValueType::from_inner(&module.types[ty].inner),
        }),
        Some(Binding::BuiltIn(naga::BuiltIn::Position { .. })) => *writes_position = true,
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { ref members, .. } = module.types[ty].inner {
                for member in members {
                    collect(module, member.name.as_deref(), member.ty, member.binding.as_ref(), out, writes_position);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::VERTEX_STAGE_WGSL;

    #[test]
    fn bundled_stage_passes_checks() {
        let iface = ShaderInterface::reflect(VERTEX_STAGE_WGSL).unwrap();
        iface.check_vertex_stage().unwrap();
        link(&iface, &iface).unwrap();

        let vs = iface.vertex.as_ref().unwrap();
        assert_eq!(vs.inputs.len(), 2);
        assert_eq!(vs.output_block.as_deref(), Some("VS_OUTPUT"));
        assert!(vs.writes_position);

        let fs = iface.fragment.as_ref().unwrap();
        assert_eq!(fs.inputs, vec![Varying { name: "Color".into(), location: 0, ty: ValueType::Vec3 }]);
    }

    #[test]
    fn view_projection_resolves_by_name() {
        let iface = ShaderInterface::reflect(VERTEX_STAGE_WGSL).unwrap();
        let u = iface.uniform_binding("ViewProjection").unwrap();
        assert_eq!((u.group, u.binding, u.ty), (0, 0, ValueType::Mat4));
        assert!(iface.uniform_binding("Model").is_none());
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = ShaderInterface::reflect("@vertex fn vs_main( -> {").unwrap_err();
        assert!(matches!(err, Error::ShaderCompile(_)));
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let src = r#"
            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return p;
            }
        "#;
        let err = ShaderInterface::reflect(src).unwrap_err();
        assert!(matches!(err, Error::ShaderCompile(_)));
    }

    #[test]
    fn moved_position_location_is_rejected() {
        let src = VERTEX_STAGE_WGSL.replace("@location(0) Position", "@location(7) Position");
        let iface = ShaderInterface::reflect(&src).unwrap();
        let err = iface.check_vertex_stage().unwrap_err();
        assert!(matches!(err, Error::Interface(_)), "{err}");
    }

    #[test]
    fn wrong_uniform_type_is_rejected() {
        let src = r#"
            @group(0) @binding(0) var<uniform> ViewProjection: vec4<f32>;

            struct VS_OUTPUT {
                @builtin(position) clip_position: vec4<f32>,
                @location(0) Color: vec3<f32>,
            };

            @vertex
            fn vs_main(@location(0) Position: vec3<f32>, @location(1) Color: vec3<f32>) -> VS_OUTPUT {
                var out: VS_OUTPUT;
                out.clip_position = ViewProjection * Position.x;
                out.Color = Color;
                return out;
            }
        "#;
        let iface = ShaderInterface::reflect(src).unwrap();
        // Arguments declared inline still count as stage inputs
        assert_eq!(iface.vertex.as_ref().unwrap().inputs.len(), 2);
        let err = iface.check_vertex_stage().unwrap_err();
        assert!(err.to_string().contains("ViewProjection"), "{err}");
    }

    #[test]
    fn fragment_reading_unwritten_location_fails_to_link() {
        let vertex = ShaderInterface::reflect(VERTEX_STAGE_WGSL).unwrap();
        let fragment = ShaderInterface::reflect(
            r#"
            @fragment
            fn fs_main(@location(1) Normal: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(Normal, 1.0);
            }
        "#,
        )
        .unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(matches!(err, Error::Link(_)));
    }

    #[test]
    fn fragment_type_mismatch_fails_to_link() {
        let vertex = ShaderInterface::reflect(VERTEX_STAGE_WGSL).unwrap();
        let fragment = ShaderInterface::reflect(
            r#"
            @fragment
            fn fs_main(@location(0) Color: vec4<f32>) -> @location(0) vec4<f32> {
                return Color;
            }
        "#,
        )
        .unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(err.to_string().contains("location 0"), "{err}");
    }

    #[test]
    fn module_without_fragment_cannot_link_as_fragment() {
        let vertex_only = ShaderInterface::reflect(
            r#"
            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, 1.0);
            }
        "#,
        )
        .unwrap();
        assert!(vertex_only.fragment.is_none());
        assert!(link(&vertex_only, &vertex_only).is_err());
        // No output block, no uniform
        assert!(vertex_only.check_vertex_stage().is_err());
    }
}
