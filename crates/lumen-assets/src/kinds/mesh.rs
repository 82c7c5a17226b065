use lumen_core::math::{Vec2, Vec3};
use lumen_core::alloc::HashMap;

use crate::error::AssetResult;
use crate::importer::{AssetImporter, ImportContext};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
}

/// Triangle mesh with an indexed vertex buffer, ready for upload.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Wavefront OBJ importer. Polygons are fan-triangulated; materials and
/// groups are ignored.
pub struct MeshImporter;

impl AssetImporter for MeshImporter {
    type Asset = Mesh;

    fn extensions(&self) -> &[&str] {
        &["obj"]
    }

    fn read_asset_data(&self, asset: &mut Mesh, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        *asset = parse_obj(ctx.text()?).map_err(|message| ctx.malformed(message))?;
        Ok(())
    }
}

#[derive(Default)]
struct ObjBuilder {
    positions: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    normals: Vec<Vec3>,
    unique: HashMap<(usize, Option<usize>, Option<usize>), u32>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl ObjBuilder {
    fn corner(&mut self, token: &str) -> Result<u32, String> {
        let mut parts = token.split('/');
        let pos = resolve_index(parts.next(), self.positions.len())?
            .ok_or_else(|| format!("Face corner '{}' has no position", token))?;
        let tex = resolve_index(parts.next(), self.texcoords.len())?;
        let normal = resolve_index(parts.next(), self.normals.len())?;

        let key = (pos, tex, normal);
        if let Some(&index) = self.unique.get(&key) {
            return Ok(index);
        }
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            pos: self.positions[pos],
            normal: normal.map(|n| self.normals[n]).unwrap_or(Vec3::ZERO),
            texcoord: tex.map(|t| self.texcoords[t]).unwrap_or(Vec2::ZERO),
        });
        self.unique.insert(key, index);
        Ok(index)
    }
}

/// Resolve a 1-based (or negative, relative) OBJ index to a 0-based one.
fn resolve_index(token: Option<&str>, len: usize) -> Result<Option<usize>, String> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let raw: i64 = token
        .parse()
        .map_err(|_| format!("Invalid index '{}'", token))?;
    let resolved = match raw {
        0 => None,
        n if n > 0 => Some(n as usize - 1),
        n => (len as i64 + n).try_into().ok(),
    };
    match resolved {
        Some(index) if index < len => Ok(Some(index)),
        _ => Err(format!("Index {} out of range ({} entries)", raw, len)),
    }
}

fn parse_floats<const N: usize>(parts: &mut std::str::SplitWhitespace<'_>) -> Result<[f32; N], String> {
    let mut out = [0.0; N];
    for value in out.iter_mut() {
        let token = parts
            .next()
            .ok_or_else(|| format!("Expected {} components", N))?;
        *value = token
            .parse()
            .map_err(|_| format!("Invalid number '{}'", token))?;
    }
    Ok(out)
}

fn parse_obj(text: &str) -> Result<Mesh, String> {
    let mut builder = ObjBuilder::default();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        let at_line = |message: String| format!("line {}: {}", line_no + 1, message);

        match parts.next() {
            Some("v") => {
                let [x, y, z] = parse_floats(&mut parts).map_err(at_line)?;
                builder.positions.push(Vec3::new(x, y, z));
            }
            Some("vt") => {
                let [u, v] = parse_floats(&mut parts).map_err(at_line)?;
                builder.texcoords.push(Vec2::new(u, v));
            }
            Some("vn") => {
                let [x, y, z] = parse_floats(&mut parts).map_err(at_line)?;
                builder.normals.push(Vec3::new(x, y, z));
            }
            Some("f") => {
                let corners = parts
                    .map(|token| builder.corner(token))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(at_line)?;
                if corners.len() < 3 {
                    return Err(at_line(format!("Face has {} corners", corners.len())));
                }
                for i in 1..corners.len() - 1 {
                    builder.indices.extend([corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if builder.indices.is_empty() {
        return Err("Mesh has no faces".to_string());
    }
    Ok(Mesh::new(builder.vertices, builder.indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices()[2].texcoord, Vec2::new(1.0, 1.0));
        assert_eq!(mesh.vertices()[0].normal, Vec3::Z);
        assert_eq!(mesh.vertex_bytes().len(), 4 * std::mem::size_of::<Vertex>());
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.starts_with("line 2"), "{}", err);
    }

    #[test]
    fn test_no_faces_is_rejected() {
        assert!(parse_obj("v 0 0 0\n").is_err());
    }
}
