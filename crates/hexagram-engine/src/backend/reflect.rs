//! WGSL validation and interface reflection.
//!
//! wgpu needs vertex layouts and bind group layouts up front, while the
//! backend contract resolves attributes and uniforms by name after linking.
//! Reflecting the parsed module bridges the two: names map to shader
//! locations and to byte offsets inside uniform blocks.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Interpolation, Module, Sampling, Type, TypeInner};

use super::{BackendError, ProgramId, ShaderStage, UniformLocation};

/// A `@location` input or output of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Varying {
    pub name: Option<String>,
    pub location: u32,
    pub ty: TypeInner,
    pub interpolation: Option<Interpolation>,
    pub sampling: Option<Sampling>,
}

impl Varying {
    /// Whether a fragment input declared as `self` can read `output`.
    fn accepts(&self, output: &Varying) -> bool {
        self.ty == output.ty
            && self.interpolation == output.interpolation
            && self.sampling == output.sampling
    }
}

/// Shader capabilities a device created with `features` and `downlevel`
/// accepts.
///
/// Anything not listed stays disabled, so a shader passing validation with
/// these capabilities is never rejected by the device for a capability.
pub(crate) fn shader_capabilities(
    features: wgpu::Features,
    downlevel: wgpu::DownlevelFlags,
) -> Capabilities {
    let mut caps = Capabilities::empty();
    caps.set(Capabilities::IMMEDIATES, features.contains(wgpu::Features::IMMEDIATES));
    caps.set(Capabilities::FLOAT64, features.contains(wgpu::Features::SHADER_F64));
    caps.set(Capabilities::SHADER_FLOAT16, features.contains(wgpu::Features::SHADER_F16));
    caps.set(
        Capabilities::SHADER_FLOAT16_IN_FLOAT32,
        downlevel.contains(wgpu::DownlevelFlags::SHADER_F16_IN_F32),
    );
    caps.set(Capabilities::SHADER_INT64, features.contains(wgpu::Features::SHADER_INT64));
    caps.set(
        Capabilities::PRIMITIVE_INDEX,
        features.contains(wgpu::Features::SHADER_PRIMITIVE_INDEX),
    );
    caps.set(Capabilities::CLIP_DISTANCE, features.contains(wgpu::Features::CLIP_DISTANCES));
    caps.set(
        Capabilities::DUAL_SOURCE_BLENDING,
        features.contains(wgpu::Features::DUAL_SOURCE_BLENDING),
    );
    caps.set(
        Capabilities::EARLY_DEPTH_TEST,
        features.contains(wgpu::Features::SHADER_EARLY_DEPTH_TEST),
    );
    caps.set(
        Capabilities::MULTISAMPLED_SHADING,
        downlevel.contains(wgpu::DownlevelFlags::MULTISAMPLED_SHADING),
    );
    caps.set(
        Capabilities::CUBE_ARRAY_TEXTURES,
        downlevel.contains(wgpu::DownlevelFlags::CUBE_ARRAY_TEXTURES),
    );
    caps
}

/// One field of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformField {
    pub name: String,
    pub offset: u32,
    pub is_f32: bool,
}

/// A `var<uniform>` binding and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    pub size: u64,
    pub fields: Vec<UniformField>,
}

/// Interface of a single compiled stage.
#[derive(Debug, Clone)]
pub(crate) struct StageInterface {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub uniforms: Vec<UniformBlock>,
}

/// Parses and validates `source` against `capabilities`, then extracts the
/// interface of the first entry point for `stage`.
pub(crate) fn reflect_wgsl(
    source: &str,
    stage: ShaderStage,
    capabilities: Capabilities,
) -> Result<StageInterface, BackendError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| BackendError::Compile {
        stage,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), capabilities)
        .validate(&module)
        .map_err(|e| BackendError::Compile {
            stage,
            message: e.to_string(),
        })?;

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage)
        .ok_or_else(|| BackendError::Compile {
            stage,
            message: format!("no @{stage} entry point"),
        })?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_varyings(&module, arg.name.as_ref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    Ok(StageInterface {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms: collect_uniforms(&module),
    })
}

fn collect_varyings(
    module: &Module,
    name: Option<&String>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => out.push(Varying {
            name: name.cloned(),
            location: *location,
            ty: module.types[ty].inner.clone(),
            interpolation: *interpolation,
            sampling: *sampling,
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(module, member.name.as_ref(), member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn collect_uniforms(module: &Module) -> Vec<UniformBlock> {
    let mut blocks = Vec::new();

    for (_, var) in module.global_variables.iter() {
        if !matches!(var.space, AddressSpace::Uniform) {
            continue;
        }
        let Some(rb) = &var.binding else { continue };

        let (size, fields) = match &module.types[var.ty].inner {
            TypeInner::Struct { members, span } => {
                let fields = members
                    .iter()
                    .filter_map(|m| {
                        Some(UniformField {
                            name: m.name.clone()?,
                            offset: m.offset,
                            is_f32: is_f32(module, m.ty),
                        })
                    })
                    .collect();
                (u64::from(*span), fields)
            }
            TypeInner::Scalar(_) => {
                let fields = var
                    .name
                    .iter()
                    .map(|name| UniformField {
                        name: name.clone(),
                        offset: 0,
                        is_f32: is_f32(module, var.ty),
                    })
                    .collect();
                (4, fields)
            }
            _ => continue,
        };

        blocks.push(UniformBlock {
            group: rb.group,
            binding: rb.binding,
            size,
            fields,
        });
    }

    blocks
}

fn is_f32(module: &Module, ty: Handle<Type>) -> bool {
    matches!(module.types[ty].inner, TypeInner::Scalar(s) if s == naga::Scalar::F32)
}

/// Linked interface of a vertex + fragment pair.
#[derive(Debug, Clone)]
pub(crate) struct ProgramInterface {
    pub attributes: Vec<Varying>,
    pub uniforms: Vec<UniformBlock>,
}

impl ProgramInterface {
    /// Checks the stage pairing and merges the uniform blocks of both stages.
    ///
    /// Blocks declared by both stages at the same `(group, binding)` are the
    /// same buffer; the merged block takes the larger size and the union of
    /// field names. Only bind group 0 is supported.
    pub fn link(vertex: &StageInterface, fragment: &StageInterface) -> Result<Self, BackendError> {
        if vertex.stage != ShaderStage::Vertex {
            return Err(BackendError::Link(format!(
                "expected a vertex shader, got a {} shader",
                vertex.stage
            )));
        }
        if fragment.stage != ShaderStage::Fragment {
            return Err(BackendError::Link(format!(
                "expected a fragment shader, got a {} shader",
                fragment.stage
            )));
        }

        for input in &fragment.inputs {
            let Some(output) = vertex.outputs.iter().find(|o| o.location == input.location) else {
                return Err(BackendError::Link(format!(
                    "fragment input at location {} has no matching vertex output",
                    input.location
                )));
            };
            if !input.accepts(output) {
                return Err(BackendError::Link(format!(
                    "varying at location {}: vertex writes {:?} ({:?}), fragment reads {:?} ({:?})",
                    input.location, output.ty, output.interpolation, input.ty, input.interpolation
                )));
            }
        }

        let mut uniforms: Vec<UniformBlock> = Vec::new();
        for block in vertex.uniforms.iter().chain(&fragment.uniforms) {
            if block.group != 0 {
                return Err(BackendError::Link(format!(
                    "uniform at group {} binding {}: only bind group 0 is supported",
                    block.group, block.binding
                )));
            }

            match uniforms.iter_mut().find(|b| b.binding == block.binding) {
                Some(existing) => {
                    existing.size = existing.size.max(block.size);
                    for field in &block.fields {
                        if !existing.fields.iter().any(|f| f.name == field.name) {
                            existing.fields.push(field.clone());
                        }
                    }
                }
                None => uniforms.push(block.clone()),
            }
        }
        uniforms.sort_by_key(|b| b.binding);

        Ok(Self {
            attributes: vertex.inputs.clone(),
            uniforms,
        })
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.location)
    }

    /// Returns `(block index, field)` for the uniform field `name`.
    pub fn uniform(&self, name: &str) -> Option<(usize, &UniformField)> {
        self.uniforms.iter().enumerate().find_map(|(i, block)| {
            block.fields.iter().find(|f| f.name == name).map(|f| (i, f))
        })
    }

    /// Resolves `name` to the location of a scalar `f32` uniform of `program`.
    pub fn scalar_uniform(&self, program: ProgramId, name: &str) -> Result<UniformLocation, BackendError> {
        let (block, field) = self
            .uniform(name)
            .ok_or_else(|| BackendError::UnknownUniform(name.to_string()))?;
        if !field.is_f32 {
            return Err(BackendError::UniformType(name.to_string()));
        }
        Ok(UniformLocation {
            program,
            block,
            offset: field.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = include_str!("../render/shaders/main.vert.wgsl");
    const FRAGMENT: &str = include_str!("../render/shaders/main.frag.wgsl");

    fn reflect(source: &str, stage: ShaderStage) -> Result<StageInterface, BackendError> {
        reflect_wgsl(source, stage, Capabilities::empty())
    }

    fn linked() -> ProgramInterface {
        let vs = reflect(VERTEX, ShaderStage::Vertex).unwrap();
        let fs = reflect(FRAGMENT, ShaderStage::Fragment).unwrap();
        ProgramInterface::link(&vs, &fs).unwrap()
    }

    fn names_and_locations(varyings: &[Varying]) -> Vec<(Option<&str>, u32)> {
        varyings.iter().map(|v| (v.name.as_deref(), v.location)).collect()
    }

    // ── stage reflection ──────────────────────────────────────────────────

    #[test]
    fn vertex_stage_inputs_and_outputs() {
        let vs = reflect(VERTEX, ShaderStage::Vertex).unwrap();
        assert_eq!(vs.entry_point, "vs_main");
        assert_eq!(
            names_and_locations(&vs.inputs),
            vec![(Some("position"), 0), (Some("color"), 1)]
        );
        // The builtin position is not a varying.
        assert_eq!(names_and_locations(&vs.outputs), vec![(Some("color"), 0)]);
        assert_eq!(vs.outputs[0].interpolation, Some(Interpolation::Perspective));
    }

    #[test]
    fn fragment_stage_entry_point() {
        let fs = reflect(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert_eq!(fs.entry_point, "fs_main");
        assert_eq!(fs.inputs.len(), 1);
        assert_eq!(fs.inputs[0].location, 0);
    }

    #[test]
    fn uniform_block_is_reflected() {
        let vs = reflect(VERTEX, ShaderStage::Vertex).unwrap();
        assert_eq!(vs.uniforms.len(), 1);
        let block = &vs.uniforms[0];
        assert_eq!((block.group, block.binding, block.size), (0, 0, 16));
        assert_eq!(
            block.fields[0],
            UniformField { name: "time".into(), offset: 0, is_f32: true }
        );
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = reflect("fn broken( {", ShaderStage::Vertex).unwrap_err();
        assert!(matches!(err, BackendError::Compile { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn validation_error_is_a_compile_error() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = reflect(src, ShaderStage::Fragment).unwrap_err();
        assert!(matches!(err, BackendError::Compile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = reflect(FRAGMENT, ShaderStage::Vertex).unwrap_err();
        assert!(matches!(err, BackendError::Compile { stage: ShaderStage::Vertex, .. }));
    }

    // ── linking ───────────────────────────────────────────────────────────

    #[test]
    fn link_resolves_names() {
        let program = linked();
        assert_eq!(program.attribute_location("position"), Some(0));
        assert_eq!(program.attribute_location("color"), Some(1));
        assert_eq!(program.attribute_location("normal"), None);

        let (block, field) = program.uniform("time").unwrap();
        assert_eq!((block, field.offset), (0, 0));
        assert!(program.uniform("resolution").is_none());
    }

    #[test]
    fn scalar_uniform_location() {
        let program = linked();
        let loc = program.scalar_uniform(ProgramId(7), "time").unwrap();
        assert_eq!(loc, UniformLocation { program: ProgramId(7), block: 0, offset: 0 });
        assert_eq!(
            program.scalar_uniform(ProgramId(7), "missing"),
            Err(BackendError::UnknownUniform("missing".into()))
        );
    }

    #[test]
    fn non_scalar_uniform_is_rejected() {
        let vs_src = "
            struct G { tint: vec4<f32> }
            @group(0) @binding(0) var<uniform> g: G;
            @vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, 1.0) * g.tint;
            }";
        let fs_src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let vs = reflect(vs_src, ShaderStage::Vertex).unwrap();
        let fs = reflect(fs_src, ShaderStage::Fragment).unwrap();
        let program = ProgramInterface::link(&vs, &fs).unwrap();
        assert_eq!(
            program.scalar_uniform(ProgramId(0), "tint"),
            Err(BackendError::UniformType("tint".into()))
        );
    }

    #[test]
    fn shared_uniform_block_is_merged() {
        assert_eq!(linked().uniforms.len(), 1);
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let vs = reflect(VERTEX, ShaderStage::Vertex).unwrap();
        let fs = reflect(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert!(matches!(ProgramInterface::link(&fs, &vs), Err(BackendError::Link(_))));
    }

    #[test]
    fn link_rejects_unmatched_fragment_input() {
        let vs = reflect(VERTEX, ShaderStage::Vertex).unwrap();
        let fs_src = "@fragment fn fs_main(@location(3) c: vec4<f32>) -> @location(0) vec4<f32> { return c; }";
        let fs = reflect(fs_src, ShaderStage::Fragment).unwrap();
        assert!(matches!(ProgramInterface::link(&vs, &fs), Err(BackendError::Link(_))));
    }

    #[test]
    fn link_rejects_varying_type_mismatch() {
        let vs = reflect(VERTEX, ShaderStage::Vertex).unwrap();
        let fs_src = "
            @fragment fn fs_main(@location(0) @interpolate(flat) c: u32) -> @location(0) vec4<f32> {
                return vec4<f32>(f32(c));
            }";
        let fs = reflect(fs_src, ShaderStage::Fragment).unwrap();
        assert!(matches!(ProgramInterface::link(&vs, &fs), Err(BackendError::Link(_))));
    }

    #[test]
    fn link_rejects_interpolation_mismatch() {
        let vs_src = "
            struct Out {
                @builtin(position) pos: vec4<f32>,
                @location(0) @interpolate(linear) color: vec4<f32>,
            }
            @vertex fn vs_main(@location(0) p: vec3<f32>) -> Out {
                return Out(vec4<f32>(p, 1.0), vec4<f32>(1.0));
            }";
        let vs = reflect(vs_src, ShaderStage::Vertex).unwrap();
        let fs = reflect(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert!(matches!(ProgramInterface::link(&vs, &fs), Err(BackendError::Link(_))));
    }

    // ── device capabilities ───────────────────────────────────────────────

    const F64_VERTEX: &str = "
        @vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
            let scale: f64 = 2.0lf;
            return vec4<f32>(p * f32(scale), 1.0);
        }";

    #[test]
    fn shader_needing_missing_capability_is_a_compile_error() {
        let caps = shader_capabilities(wgpu::Features::empty(), wgpu::DownlevelFlags::empty());
        let err = reflect_wgsl(F64_VERTEX, ShaderStage::Vertex, caps).unwrap_err();
        assert!(matches!(err, BackendError::Compile { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn device_feature_enables_capability() {
        let caps = shader_capabilities(wgpu::Features::SHADER_F64, wgpu::DownlevelFlags::empty());
        assert!(caps.contains(Capabilities::FLOAT64));
        assert!(reflect_wgsl(F64_VERTEX, ShaderStage::Vertex, caps).is_ok());
    }

    #[test]
    fn builtin_shaders_need_no_capabilities() {
        let caps = shader_capabilities(wgpu::Features::empty(), wgpu::DownlevelFlags::empty());
        assert_eq!(caps, Capabilities::empty());
        assert!(reflect_wgsl(VERTEX, ShaderStage::Vertex, caps).is_ok());
        assert!(reflect_wgsl(FRAGMENT, ShaderStage::Fragment, caps).is_ok());
    }
}
