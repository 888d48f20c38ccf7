//! WGSL front-end checks shared by every backend
//!
//! Parsing and validation go through naga so a broken shader fails at
//! construction with a readable diagnostic instead of at draw time.

use super::ShaderStage;

/// Entry point name each stage must define
pub fn entry_point(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vs_main",
        ShaderStage::Fragment => "fs_main",
    }
}

/// Parse and validate `source` as a module for `stage`
///
/// Returns the diagnostic log on failure.
pub fn check(stage: ShaderStage, source: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| e.into_inner().to_string())?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let name = entry_point(stage);
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.stage == wanted && ep.name == name)
    {
        return Err(format!("missing {stage:?} entry point `{name}`"));
    }

    Ok(())
}
