//! The closed set of asset kinds and the type-erased payload.

use std::fmt;

use crate::handle::AssetRef;
use crate::kinds::{Font, Material, Mesh, Script, Shader, Texture};

/// The kinds of asset the pipeline knows how to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Mesh,
    Shader,
    Material,
    Texture,
    Font,
    Script,
}

impl AssetKind {
    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Mesh => "Mesh",
            AssetKind::Shader => "Shader",
            AssetKind::Material => "Material",
            AssetKind::Texture => "Texture",
            AssetKind::Font => "Font",
            AssetKind::Script => "Script",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A payload type stored in the asset cache.
///
/// Implemented for exactly the kinds in [`AssetKind`]. Importers for new file
/// formats produce one of these types; new kinds are not pluggable.
pub trait Asset: sealed::Sealed + Default + Send + Sync + 'static {
    /// The kind tag of this payload type.
    const KIND: AssetKind;

    /// Human-readable type name.
    fn type_name() -> &'static str {
        Self::KIND.name()
    }

    /// Wrap a typed reference into the erased payload.
    fn into_payload(asset: AssetRef<Self>) -> AssetPayload;

    /// Narrow an erased payload, returning `None` on a kind mismatch.
    fn from_payload(payload: &AssetPayload) -> Option<&AssetRef<Self>>;
}

/// A cached payload of any kind.
#[derive(Debug, Clone)]
pub enum AssetPayload {
    Mesh(AssetRef<Mesh>),
    Shader(AssetRef<Shader>),
    Material(AssetRef<Material>),
    Texture(AssetRef<Texture>),
    Font(AssetRef<Font>),
    Script(AssetRef<Script>),
}

macro_rules! impl_asset {
    ($($kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $kind {}

            impl Asset for $kind {
                const KIND: AssetKind = AssetKind::$kind;

                fn into_payload(asset: AssetRef<Self>) -> AssetPayload {
                    AssetPayload::$kind(asset)
                }

                fn from_payload(payload: &AssetPayload) -> Option<&AssetRef<Self>> {
                    match payload {
                        AssetPayload::$kind(asset) => Some(asset),
                        _ => None,
                    }
                }
            }
        )*

        impl AssetPayload {
            /// The kind tag of this payload.
            pub fn kind(&self) -> AssetKind {
                match self {
                    $(AssetPayload::$kind(_) => AssetKind::$kind,)*
                }
            }

            /// Version of the payload content.
            pub fn version(&self) -> u32 {
                match self {
                    $(AssetPayload::$kind(asset) => asset.version(),)*
                }
            }

            /// Whether both payloads point at the same allocation.
            pub fn ptr_eq(&self, other: &AssetPayload) -> bool {
                match (self, other) {
                    $((AssetPayload::$kind(a), AssetPayload::$kind(b)) => a.ptr_eq(b),)*
                    _ => false,
                }
            }

            /// Move the content of `other` into this payload's allocation.
            ///
            /// Returns `false` without touching anything when the kinds differ.
            pub(crate) fn overwrite_from(&self, other: &AssetPayload) -> bool {
                match (self, other) {
                    $((AssetPayload::$kind(a), AssetPayload::$kind(b)) => {
                        a.take_from(b);
                        true
                    })*
                    _ => false,
                }
            }
        }
    };
}

impl_asset!(Mesh, Shader, Material, Texture, Font, Script);

impl AssetPayload {
    /// Narrow to a typed reference, `None` on a kind mismatch.
    pub fn downcast<T: Asset>(&self) -> Option<&AssetRef<T>> {
        T::from_payload(self)
    }

    /// Default-constructed payload of the given kind.
    pub fn empty(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Mesh => Mesh::into_payload(AssetRef::new(Mesh::default())),
            AssetKind::Shader => Shader::into_payload(AssetRef::new(Shader::default())),
            AssetKind::Material => Material::into_payload(AssetRef::new(Material::default())),
            AssetKind::Texture => Texture::into_payload(AssetRef::new(Texture::default())),
            AssetKind::Font => Font::into_payload(AssetRef::new(Font::default())),
            AssetKind::Script => Script::into_payload(AssetRef::new(Script::default())),
        }
    }
}
