//! Shader programs described by a stage list.
//!
//! A `.shader` file names one source file per stage, relative to itself:
//!
//! ```text
//! # lit surface
//! vertex   surface.vert
//! fragment surface.frag
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::AssetResult;
use crate::importer::{AssetImporter, ImportContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertex" | "vert" => Ok(ShaderStage::Vertex),
            "fragment" | "frag" => Ok(ShaderStage::Fragment),
            "compute" | "comp" => Ok(ShaderStage::Compute),
            other => Err(format!("Unknown shader stage '{}'", other)),
        }
    }
}

/// One compiled stage of a [`Shader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderModule {
    pub stage: ShaderStage,
    /// Stage file as written in the stage list.
    pub file: String,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct Shader {
    modules: Vec<ShaderModule>,
}

impl Shader {
    pub fn new(modules: Vec<ShaderModule>) -> Self {
        Self { modules }
    }

    pub fn modules(&self) -> &[ShaderModule] {
        &self.modules
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderModule> {
        self.modules.iter().find(|m| m.stage == stage)
    }

    pub fn is_compiled(&self) -> bool {
        !self.modules.is_empty()
    }
}

pub struct ShaderImporter;

impl AssetImporter for ShaderImporter {
    type Asset = Shader;

    fn extensions(&self) -> &[&str] {
        &["shader"]
    }

    fn read_asset_data(&self, asset: &mut Shader, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        let stages = parse_stage_list(ctx.text()?).map_err(|message| ctx.malformed(message))?;

        let mut modules = Vec::with_capacity(stages.len());
        for (stage, file) in stages {
            let bytes = ctx.read_sibling(&file)?;
            let source = String::from_utf8(bytes)
                .map_err(|_| ctx.malformed(format!("{} stage '{}' is not UTF-8", stage, file)))?;
            modules.push(compile(stage, file, source).map_err(|message| ctx.malformed(message))?);
        }

        *asset = Shader::new(modules);
        Ok(())
    }
}

fn parse_stage_list(text: &str) -> Result<Vec<(ShaderStage, String)>, String> {
    let mut stages: Vec<(ShaderStage, String)> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(stage), Some(file), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("line {}: expected '<stage> <file>'", line_no + 1));
        };
        let stage: ShaderStage = stage
            .parse()
            .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
        if stages.iter().any(|(s, _)| *s == stage) {
            return Err(format!("line {}: duplicate {} stage", line_no + 1, stage));
        }
        stages.push((stage, file.to_string()));
    }
    if stages.is_empty() {
        return Err("Shader declares no stages".to_string());
    }
    Ok(stages)
}

/// Validate a stage source. Backend compilation happens at pipeline creation.
fn compile(stage: ShaderStage, file: String, source: String) -> Result<ShaderModule, String> {
    if source.trim().is_empty() {
        return Err(format!("{} stage '{}' is empty", stage, file));
    }
    Ok(ShaderModule {
        stage,
        file,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_list() {
        let stages = parse_stage_list("# comment\nvertex a.vert\n\nfrag a.frag # trailing\n").unwrap();
        assert_eq!(
            stages,
            vec![
                (ShaderStage::Vertex, "a.vert".to_string()),
                (ShaderStage::Fragment, "a.frag".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let err = parse_stage_list("tessellation a.tess").unwrap_err();
        assert!(err.contains("Unknown shader stage"));
    }

    #[test]
    fn test_duplicate_stage_is_rejected() {
        assert!(parse_stage_list("vertex a.vert\nvertex b.vert").is_err());
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(parse_stage_list("# nothing\n").is_err());
    }

    #[test]
    fn test_compile_rejects_empty_source() {
        assert!(compile(ShaderStage::Vertex, "a.vert".into(), "  \n".into()).is_err());
        assert!(compile(ShaderStage::Vertex, "a.vert".into(), "void main() {}".into()).is_ok());
    }
}
